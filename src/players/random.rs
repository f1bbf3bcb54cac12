use rand::seq::SliceRandom;

use crate::game::action::GameAction;
use crate::game::game::Game;
use crate::players::BasePlayer;
use crate::types::ActionType;

/// Uniform choice over the legal actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPlayer;

impl BasePlayer for RandomPlayer {
    fn decide(&self, _game: &Game, actions: &[GameAction]) -> Option<GameAction> {
        actions.choose(&mut rand::thread_rng()).cloned()
    }
}

/// Random choice skewed towards cities, then settlements, then dev cards.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRandomPlayer;

impl WeightedRandomPlayer {
    pub fn weight(action_type: ActionType) -> u32 {
        match action_type {
            ActionType::BuildCity => 10_000,
            ActionType::BuildSettlement => 1_000,
            ActionType::BuyDevelopmentCard => 100,
            _ => 1,
        }
    }
}

impl BasePlayer for WeightedRandomPlayer {
    fn decide(&self, _game: &Game, actions: &[GameAction]) -> Option<GameAction> {
        actions
            .choose_weighted(&mut rand::thread_rng(), |action| {
                Self::weight(action.action_type())
            })
            .ok()
            .cloned()
    }
}
