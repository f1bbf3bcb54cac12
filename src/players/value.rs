use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::features::{
    hand_synergy, owned_tiles, production_features, reachability_features, value_production,
};
use crate::game::action::GameAction;
use crate::game::game::Game;
use crate::game::state::GameState;
use crate::players::BasePlayer;
use crate::types::Color;

/// Weights of the linear heuristic used by the greedy and alpha-beta players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueFunctionParams {
    pub public_vps: f64,
    pub production: f64,
    pub enemy_production: f64,
    pub num_tiles: f64,
    pub reachable_production_0: f64,
    pub reachable_production_1: f64,
    pub buildable_nodes: f64,
    pub longest_road: f64,
    pub hand_synergy: f64,
    pub hand_resources: f64,
    pub discard_penalty: f64,
    pub hand_devs: f64,
    pub army_size: f64,
}

impl Default for ValueFunctionParams {
    fn default() -> Self {
        Self {
            public_vps: 3e14,
            production: 1e8,
            enemy_production: -1e8,
            num_tiles: 1.0,
            reachable_production_0: 0.0,
            reachable_production_1: 1e4,
            buildable_nodes: 1e3,
            longest_road: 10.0,
            hand_synergy: 1e2,
            hand_resources: 1.0,
            discard_penalty: -5.0,
            hand_devs: 10.0,
            army_size: 10.1,
        }
    }
}

/// Scores `state` for `color`; higher is better.
pub fn base_value(state: &GameState, color: Color, params: &ValueFunctionParams) -> f64 {
    let Some(player) = state.player(color) else {
        return f64::NEG_INFINITY;
    };

    let production = value_production(&production_features(state, color, true), true);
    let enemy = state.next_color(color);
    let enemy_production = value_production(&production_features(state, enemy, true), false);

    let reachable = reachability_features(state, color, 2);
    let reachable_at = |level: usize| reachable.get(level).map_or(0.0, |p| p.iter().sum::<f64>());

    let num_in_hand = f64::from(player.hand.total());
    let discard_penalty = if player.hand.total() > state.discard_limit() {
        params.discard_penalty
    } else {
        0.0
    };

    let num_buildable_nodes = state.board.buildable_node_ids(color, false).len() as f64;
    let longest_road_factor = if num_buildable_nodes == 0.0 {
        params.longest_road
    } else {
        0.1
    };
    let longest_road_length = state.board.road_length_of(color) as f64;

    f64::from(player.public_points()) * params.public_vps
        + production * params.production
        + enemy_production * params.enemy_production
        + reachable_at(0) * params.reachable_production_0
        + reachable_at(1) * params.reachable_production_1
        + hand_synergy(&player.hand) * params.hand_synergy
        + num_buildable_nodes * params.buildable_nodes
        + owned_tiles(state, color).len() as f64 * params.num_tiles
        + num_in_hand * params.hand_resources
        + discard_penalty
        + longest_road_length * longest_road_factor
        + f64::from(player.dev_cards_in_hand().total()) * params.hand_devs
        + f64::from(player.knights_played()) * params.army_size
}

/// Greedy one-ply player: applies each action to a copy and keeps the best
/// scoring ones, breaking ties at random.
#[derive(Debug, Clone)]
pub struct ValueFunctionPlayer {
    pub color: Color,
    pub params: ValueFunctionParams,
    pub epsilon: Option<f64>,
}

impl ValueFunctionPlayer {
    pub fn new(color: Color, params: Option<ValueFunctionParams>, epsilon: Option<f64>) -> Self {
        Self {
            color,
            params: params.unwrap_or_default(),
            epsilon,
        }
    }
}

impl BasePlayer for ValueFunctionPlayer {
    fn decide(&self, game: &Game, actions: &[GameAction]) -> Option<GameAction> {
        if actions.len() == 1 {
            return actions.first().cloned();
        }

        let mut rng = rand::thread_rng();
        if let Some(epsilon) = self.epsilon {
            if rng.gen_bool(epsilon.clamp(0.0, 1.0)) {
                return actions.choose(&mut rng).cloned();
            }
        }

        let mut best_value = f64::NEG_INFINITY;
        let mut best_actions: Vec<&GameAction> = Vec::new();
        for action in actions {
            let mut game_copy = game.copy();
            if game_copy.execute(action.clone(), false).is_err() {
                continue;
            }
            let value = base_value(&game_copy.state, self.color, &self.params);
            if value > best_value {
                best_value = value;
                best_actions.clear();
            }
            if value == best_value {
                best_actions.push(action);
            }
        }

        best_actions
            .choose(&mut rng)
            .map(|action| (*action).clone())
            .or_else(|| actions.first().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::GameConfig;

    #[test]
    fn default_weights_favor_points() {
        let params = ValueFunctionParams::default();
        assert!(params.public_vps > params.production);
        assert!(params.enemy_production < 0.0);
        let json = r#"{"army_size": 1.0}"#;
        let parsed: ValueFunctionParams = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.army_size, 1.0);
        assert_eq!(parsed.public_vps, params.public_vps);
    }

    #[test]
    fn settling_raises_value() {
        let mut state = GameState::new(GameConfig {
            num_players: 2,
            ..GameConfig::default()
        })
        .unwrap();
        let color = state.colors[0];
        let params = ValueFunctionParams::default();
        let before = base_value(&state, color, &params);
        state.board.build_settlement(color, 0, true).unwrap();
        state.players[0].settlements.push(0);
        assert!(base_value(&state, color, &params) > before);
    }

    #[test]
    fn greedy_player_picks_a_legal_action() {
        let game = Game::new(GameConfig::default()).unwrap();
        let color = game.state.current_color();
        let player = ValueFunctionPlayer::new(color, None, None);
        let choice = player.decide(&game, game.state.legal_actions()).unwrap();
        assert!(game.state.legal_actions().contains(&choice));
    }
}
