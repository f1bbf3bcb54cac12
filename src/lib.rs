#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod board;
pub mod cli;
pub mod coords;
pub mod features;
pub mod game;
pub mod players;
pub mod types;

pub use board::{Board, CatanMap, MapType, Tile};
pub use game::{Game, GameAction, GameConfig, GameError, GameState};
pub use types::Color;
