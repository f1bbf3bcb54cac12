//! Shared search primitives: chance expansion of an action into weighted
//! outcomes, and action pruning.

use log::trace;

use crate::board::number_probability;
use crate::features::{production_features, value_production};
use crate::game::action::{ActionKind, GameAction, decode_maritime_trade};
use crate::game::freqdeck::DevDeck;
use crate::game::game::Game;
use crate::types::{ActionPrompt, Color, Resource};

/// Applies `outcome` to a copy of `game`. An outcome the real state cannot
/// produce (a card not in the pile, a resource the victim lacks) leaves the
/// copy untouched, so every branch still carries its probability.
fn branch(game: &Game, outcome: GameAction) -> Game {
    let mut next = game.copy();
    if let Err(err) = next.execute(outcome, false) {
        trace!("flattened impossible branch: {err}");
        next = game.copy();
    }
    next
}

fn execute_deterministic(game: &Game, action: &GameAction) -> Vec<(Game, f64)> {
    vec![(branch(game, action.clone()), 1.0)]
}

/// Eleven outcomes, one per dice sum.
fn execute_roll(game: &Game, color: Color) -> Vec<(Game, f64)> {
    (2u8..=12)
        .map(|sum| {
            let dice = (sum / 2, sum.div_ceil(2));
            let action = GameAction::new(color, ActionKind::Roll(Some(dice)));
            (branch(game, action), number_probability(sum))
        })
        .collect()
}

/// Cards the buyer cannot see: the pile plus opponents' unplayed cards.
fn hidden_development_cards(game: &Game, color: Color) -> DevDeck {
    let mut hidden = game.state.bank.remaining_development_cards();
    for player in game.state.players.iter().filter(|p| p.color != color) {
        hidden.add(&player.dev_cards_in_hand());
    }
    hidden
}

fn execute_buy_development(game: &Game, action: &GameAction) -> Vec<(Game, f64)> {
    let hidden = hidden_development_cards(game, action.color);
    let total = f64::from(hidden.total());
    if total == 0.0 {
        return execute_deterministic(game, action);
    }
    hidden
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(card, count)| {
            let outcome = GameAction::new(action.color, ActionKind::BuyDevelopmentCard(Some(card)));
            (branch(game, outcome), f64::from(count) / total)
        })
        .collect()
}

/// Stealing is treated as uniform over the five kinds.
fn execute_move_robber(game: &Game, action: &GameAction) -> Vec<(Game, f64)> {
    let ActionKind::MoveRobber {
        coordinate,
        victim: Some(victim),
        ..
    } = action.kind
    else {
        return execute_deterministic(game, action);
    };
    let probability = 1.0 / Resource::ALL.len() as f64;
    Resource::ALL
        .into_iter()
        .map(|resource| {
            let outcome = GameAction::new(
                action.color,
                ActionKind::MoveRobber {
                    coordinate,
                    victim: Some(victim),
                    resource: Some(resource),
                },
            );
            (branch(game, outcome), probability)
        })
        .collect()
}

/// Expands `action` into `(resulting game, probability)` pairs whose
/// probabilities sum to 1.
pub fn execute_spectrum(game: &Game, action: &GameAction) -> Vec<(Game, f64)> {
    match &action.kind {
        ActionKind::Roll(None) => execute_roll(game, action.color),
        ActionKind::BuyDevelopmentCard(None) => execute_buy_development(game, action),
        ActionKind::MoveRobber { resource: None, .. } => execute_move_robber(game, action),
        _ => execute_deterministic(game, action),
    }
}

/// Legal actions minus the ones a search can safely skip: initial
/// settlements touching a single tile, 4:1 trades when a 3:1 port is owned,
/// and every robber move but the one hurting the first opponent most.
pub fn list_pruned_actions(game: &Game) -> Vec<GameAction> {
    let state = &game.state;
    let mut actions = state.legal_actions().to_vec();
    if actions.is_empty() {
        return actions;
    }
    let color = state.current_color();

    if state.current_prompt == ActionPrompt::BuildInitialSettlement {
        actions.retain(|action| match action.kind {
            ActionKind::BuildSettlement(node) => state.board.map.adjacent_tiles(node).count() != 1,
            _ => true,
        });
    }

    if state.board.player_port_resources(color).contains(&None) {
        actions.retain(|action| match &action.kind {
            ActionKind::MaritimeTrade(value) => {
                decode_maritime_trade(value).is_none_or(|(_, count, _)| count != 4)
            }
            _ => true,
        });
    }

    if state.current_prompt == ActionPrompt::MoveRobber {
        actions = prune_robber_actions(game, color, actions);
    }
    actions
}

fn prune_robber_actions(game: &Game, color: Color, actions: Vec<GameAction>) -> Vec<GameAction> {
    let state = &game.state;
    let Some(enemy) = state.colors.iter().copied().find(|c| *c != color) else {
        return actions;
    };
    let Some(enemy_player) = state.player(enemy) else {
        return actions;
    };
    let enemy_tiles: Vec<_> = enemy_player
        .settlements
        .iter()
        .chain(&enemy_player.cities)
        .flat_map(|node| state.board.map.adjacent_tiles(*node).map(|t| t.coordinate))
        .collect();

    let impact = |action: &GameAction| {
        let mut copy = game.copy();
        if copy.execute(action.clone(), false).is_err() {
            return f64::NEG_INFINITY;
        }
        let ours = value_production(&production_features(&copy.state, color, true), true);
        let theirs = value_production(&production_features(&copy.state, enemy, true), true);
        ours - theirs
    };

    let mut best: Option<(f64, &GameAction)> = None;
    for action in &actions {
        let ActionKind::MoveRobber { coordinate, .. } = action.kind else {
            continue;
        };
        if !enemy_tiles.contains(&coordinate) {
            continue;
        }
        let score = impact(action);
        if best.is_none_or(|(best_score, _)| score > best_score) {
            best = Some((score, action));
        }
    }
    match best {
        Some((_, action)) => vec![action.clone()],
        None => actions,
    }
}

/// Plays `game` out with uniformly random moves.
pub fn random_playout(game: &Game) -> Option<Color> {
    let mut game = game.copy();
    let players = vec![crate::players::RandomPlayer; game.roster.len()];
    match game.play(&players) {
        Ok(winner) => winner,
        Err(err) => {
            trace!("playout aborted: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::GameConfig;

    fn placed_game() -> Game {
        let mut game = Game::new(GameConfig {
            num_players: 2,
            ..GameConfig::default()
        })
        .unwrap();
        while game.state.is_initial_build_phase {
            let action = game.state.legal_actions()[0].clone();
            game.execute(action, false).unwrap();
        }
        game
    }

    fn total(outcomes: &[(Game, f64)]) -> f64 {
        outcomes.iter().map(|(_, p)| p).sum()
    }

    #[test]
    fn roll_spectrum_covers_every_sum() {
        let game = placed_game();
        let roll = game.state.legal_actions()[0].clone();
        let outcomes = execute_spectrum(&game, &roll);
        assert_eq!(outcomes.len(), 11);
        assert!((total(&outcomes) - 1.0).abs() < 1e-9);
        let seven = &outcomes[5].0;
        assert_eq!(
            seven.state.actions.last().map(|a| a.kind.clone()),
            Some(ActionKind::Roll(Some((3, 4))))
        );
    }

    #[test]
    fn dev_card_spectrum_follows_hidden_cards() {
        let mut game = placed_game();
        game.state.players[0].hand.add(&crate::game::COST_DEVELOPMENT);
        game.state.players[0].has_rolled = true;
        game.state.refresh_playable_actions();
        let buy = GameAction::new(
            game.state.current_color(),
            ActionKind::BuyDevelopmentCard(None),
        );
        let outcomes = execute_spectrum(&game, &buy);
        assert_eq!(outcomes.len(), 5);
        assert!((total(&outcomes) - 1.0).abs() < 1e-9);
        assert!((outcomes[0].1 - 14.0 / 25.0).abs() < 1e-9);
    }

    #[test]
    fn robber_spectrum_is_uniform_and_flattens_impossible_steals() {
        let mut game = placed_game();
        for player in game.state.players.iter_mut() {
            player.hand = crate::game::Freqdeck::zero();
        }
        game.state.players[1].hand = crate::game::Freqdeck::single(Resource::Ore, 1);
        let victim = game.state.colors[1];
        let node = game.state.players[1].settlements[0];
        let coordinate = game
            .state
            .board
            .map
            .adjacent_tiles(node)
            .find(|t| t.coordinate != game.state.board.robber_coordinate)
            .unwrap()
            .coordinate;
        let action = GameAction::new(
            game.state.current_color(),
            ActionKind::MoveRobber {
                coordinate,
                victim: Some(victim),
                resource: None,
            },
        );
        let outcomes = execute_spectrum(&game, &action);
        assert_eq!(outcomes.len(), 5);
        assert!((total(&outcomes) - 1.0).abs() < 1e-9);
        let stolen: Vec<_> = outcomes
            .iter()
            .filter(|(g, _)| g.state.players[0].hand.get(Resource::Ore) == 1)
            .collect();
        assert_eq!(stolen.len(), 1);
    }

    #[test]
    fn pruning_drops_single_tile_settlements() {
        let game = Game::new(GameConfig::default()).unwrap();
        let pruned = list_pruned_actions(&game);
        assert!(pruned.len() < game.state.legal_actions().len());
        assert!(pruned.iter().all(|a| match a.kind {
            ActionKind::BuildSettlement(node) =>
                game.state.board.map.adjacent_tiles(node).count() > 1,
            _ => true,
        }));
    }

    #[test]
    fn playouts_finish() {
        let game = placed_game();
        let _ = random_playout(&game);
    }
}
