use crate::game::{action::GameAction, game::Game};

/// A decision policy. `actions` is the current legal set; returning `None`
/// stops the driver loop.
pub trait BasePlayer {
    fn decide(&self, game: &Game, actions: &[GameAction]) -> Option<GameAction>;
}
