pub mod players;
pub mod stats;

pub use players::{
    CLI_PLAYERS, CliPlayer, PlayerInstance, create_player, parse_players, print_player_help,
};
pub use stats::GameStats;
