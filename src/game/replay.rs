//! JSON action logs. A log holds the config a game was created with and
//! every fully-specified action it applied; re-applying them on a fresh
//! state reproduces the game.

use serde::{Deserialize, Serialize};

use crate::game::action::GameAction;
use crate::game::apply::validate_then_apply;
use crate::game::state::{GameConfig, GameError, GameState};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("malformed replay log: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot create game: {0}")]
    Config(#[source] GameError),
    #[error("action {index} ({action}) failed: {source}")]
    Action {
        index: usize,
        action: Box<GameAction>,
        #[source]
        source: GameError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub config: GameConfig,
    pub actions: Vec<GameAction>,
}

impl ReplayLog {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            config: state.config.as_ref().clone(),
            actions: state.actions.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Rebuilds the final state of a logged game, validating every action.
pub fn replay(log: &ReplayLog) -> Result<GameState, ReplayError> {
    let mut state = GameState::new(log.config.clone()).map_err(ReplayError::Config)?;
    for (index, action) in log.actions.iter().enumerate() {
        validate_then_apply(&mut state, action.clone()).map_err(|source| ReplayError::Action {
            index,
            action: Box::new(action.clone()),
            source,
        })?;
    }
    Ok(state)
}
