pub mod action;
pub mod apply;
pub mod bank;
pub mod freqdeck;
pub mod game;
pub mod move_generation;
pub mod players;
pub mod replay;
pub mod state;

pub use action::{ActionKind, GameAction, TradeOffer};
pub use apply::{apply_action, validate_then_apply};
pub use bank::Bank;
pub use freqdeck::{
    COST_CITY, COST_DEVELOPMENT, COST_ROAD, COST_SETTLEMENT, DevDeck, Freqdeck, FreqdeckError,
};
pub use game::{Game, TURNS_LIMIT};
pub use players::PlayerState;
pub use replay::{ReplayError, ReplayLog, replay};
pub use state::{GameConfig, GameError, GameState};
