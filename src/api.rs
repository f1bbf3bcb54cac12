//! The narrow surface external collaborators (web layer, trainers, drivers)
//! consume: create, enumerate, apply, copy, query the winner.

use crate::board::MapType;
use crate::game::{GameAction, GameConfig, GameError, GameState, apply_action, validate_then_apply};
use crate::types::{ActionType, Color};

/// New game over `colors`, seated in a shuffle seeded by `seed`.
pub fn create_game(
    colors: &[Color],
    map_type: MapType,
    discard_limit: u32,
    vps_to_win: u8,
    seed: u64,
) -> Result<GameState, GameError> {
    GameState::new(GameConfig {
        num_players: colors.len(),
        colors: Some(colors.to_vec()),
        map_type,
        discard_limit,
        vps_to_win,
        seed,
    })
}

pub fn legal_actions(state: &GameState) -> &[GameAction] {
    state.legal_actions()
}

/// Checks `action` against the current state and applies it. Illegal
/// actions fail without touching the state.
pub fn apply(state: &mut GameState, action: GameAction) -> Result<GameAction, GameError> {
    validate_then_apply(state, action)
}

/// Skips validation. Only for actions taken from [`legal_actions`].
pub fn apply_trusted(state: &mut GameState, action: GameAction) -> Result<GameAction, GameError> {
    apply_action(state, action)
}

/// Parses a wire name such as `BUILD_CITY`.
pub fn parse_action_type(name: &str) -> Result<ActionType, GameError> {
    name.parse::<ActionType>()
        .map_err(|_| GameError::UnknownActionType(name.to_string()))
}

pub fn copy(state: &GameState) -> GameState {
    state.clone()
}

pub fn winner(state: &GameState) -> Option<Color> {
    state.winner()
}
