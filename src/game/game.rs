use log::debug;
use uuid::Uuid;

use crate::game::action::GameAction;
use crate::game::apply::{apply_action, validate_then_apply};
use crate::game::state::{GameConfig, GameError, GameState};
use crate::players::BasePlayer;
use crate::types::Color;

/// Games still undecided after this many turns end without a winner.
pub const TURNS_LIMIT: u32 = 1000;

/// Driver around a [`GameState`]: owns the id and drives players until a
/// winner emerges or the turn limit is hit.
#[derive(Debug, Clone)]
pub struct Game {
    pub seed: u64,
    pub id: Uuid,
    pub vps_to_win: u8,
    /// Color controlled by each entry of the `players` slice handed to
    /// [`Game::play`]. Seating order lives in `state.colors`.
    pub roster: Vec<Color>,
    pub state: GameState,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let roster = match &config.colors {
            Some(colors) => colors.clone(),
            None => Color::ORDERED
                .iter()
                .copied()
                .take(config.num_players)
                .collect(),
        };
        Ok(Self {
            seed: config.seed,
            id: Uuid::new_v4(),
            vps_to_win: config.vps_to_win,
            roster,
            state: GameState::new(config)?,
        })
    }

    /// Plays to completion. `players[i]` controls `roster[i]`.
    pub fn play<P: BasePlayer>(&mut self, players: &[P]) -> Result<Option<Color>, GameError> {
        while self.winning_color().is_none() && self.state.num_turns < TURNS_LIMIT {
            if self.play_tick(players)?.is_none() {
                break;
            }
        }
        let winner = self.winning_color();
        debug!(
            "game {} finished after {} turns, {} actions: winner {:?}",
            self.id,
            self.state.num_turns,
            self.state.actions.len(),
            winner
        );
        Ok(winner)
    }

    /// Asks the player to move for the current seat and applies its choice.
    /// Returns `None` when nobody can act.
    pub fn play_tick<P: BasePlayer>(
        &mut self,
        players: &[P],
    ) -> Result<Option<GameAction>, GameError> {
        let color = self.state.current_color();
        let Some(player) = self
            .roster
            .iter()
            .position(|c| *c == color)
            .and_then(|index| players.get(index))
        else {
            return Ok(None);
        };

        let legal_actions = self.state.legal_actions();
        if legal_actions.is_empty() {
            return Ok(None);
        }
        let Some(action) = player.decide(self, legal_actions) else {
            return Ok(None);
        };
        self.execute(action, false).map(Some)
    }

    /// Applies `action`, checking it first when `validate` is set.
    pub fn execute(&mut self, action: GameAction, validate: bool) -> Result<GameAction, GameError> {
        if validate {
            validate_then_apply(&mut self.state, action)
        } else {
            apply_action(&mut self.state, action)
        }
    }

    pub fn winning_color(&self) -> Option<Color> {
        self.state.winner()
    }

    /// Search copy; the map topology stays shared.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::RandomPlayer;

    #[test]
    fn roster_follows_config() {
        let game = Game::new(GameConfig {
            num_players: 3,
            ..GameConfig::default()
        })
        .unwrap();
        assert_eq!(game.roster, vec![Color::Red, Color::Blue, Color::Orange]);
        let mut seating = game.state.colors.clone();
        seating.sort();
        assert_eq!(seating, game.roster);
    }

    #[test]
    fn random_game_terminates() {
        let mut game = Game::new(GameConfig {
            num_players: 2,
            seed: 3,
            ..GameConfig::default()
        })
        .unwrap();
        let players = [RandomPlayer, RandomPlayer];
        let winner = game.play(&players).unwrap();
        assert!(winner.is_some() || game.state.num_turns >= TURNS_LIMIT);
        assert_eq!(game.state.resource_totals(), [19; 5]);
        if let Some(winner) = winner {
            let points = game.state.player(winner).unwrap().total_points();
            assert!(points >= game.vps_to_win);
        }
    }

    #[test]
    fn copies_are_independent() {
        let game = Game::new(GameConfig::default()).unwrap();
        let mut copy = game.copy();
        let action = copy.state.legal_actions()[0].clone();
        copy.execute(action, true).unwrap();
        assert_eq!(game.state.actions.len(), 0);
        assert_eq!(copy.state.actions.len(), 1);
        assert!(std::sync::Arc::ptr_eq(&game.state.board.map, &copy.state.board.map));
    }
}
