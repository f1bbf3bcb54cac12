pub mod base;
pub mod mcts;
pub mod minimax;
pub mod random;
pub mod tree_search;
pub mod value;

pub use base::BasePlayer;
pub use mcts::MCTSPlayer;
pub use minimax::{AlphaBetaConfig, AlphaBetaPlayer, SearchStats};
pub use random::{RandomPlayer, WeightedRandomPlayer};
pub use value::{ValueFunctionParams, ValueFunctionPlayer, base_value};
