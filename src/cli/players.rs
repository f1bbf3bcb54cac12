use crate::game::action::GameAction;
use crate::game::game::Game;
use crate::players::{
    AlphaBetaConfig, AlphaBetaPlayer, BasePlayer, MCTSPlayer, RandomPlayer, ValueFunctionPlayer,
    WeightedRandomPlayer,
};
use crate::types::Color;

pub struct CliPlayer {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const CLI_PLAYERS: &[CliPlayer] = &[
    CliPlayer {
        code: "R",
        name: "RandomPlayer",
        description: "Chooses actions at random.",
    },
    CliPlayer {
        code: "W",
        name: "WeightedRandomPlayer",
        description: "Like RandomPlayer, but favors cities, then settlements, then development cards.",
    },
    CliPlayer {
        code: "F",
        name: "ValueFunctionPlayer",
        description: "Chooses the action that leads to the most immediate reward, based on a hand-crafted value function. Param is EPSILON.",
    },
    CliPlayer {
        code: "AB",
        name: "AlphaBetaPlayer",
        description: "Expectimax with alpha-beta pruning. Params are DEPTH and PRUNNING (e.g. AB:2:True).",
    },
    CliPlayer {
        code: "M",
        name: "MCTSPlayer",
        description: "Decides according to the MCTS algorithm. Params are NUM_SIMULATIONS and PRUNNING.",
    },
];

#[derive(Debug, Clone)]
pub enum PlayerInstance {
    Random(Color, RandomPlayer),
    WeightedRandom(Color, WeightedRandomPlayer),
    ValueFunction(ValueFunctionPlayer),
    AlphaBeta(AlphaBetaPlayer),
    MCTS(MCTSPlayer),
}

impl PlayerInstance {
    pub fn color(&self) -> Color {
        match self {
            PlayerInstance::Random(color, _) | PlayerInstance::WeightedRandom(color, _) => *color,
            PlayerInstance::ValueFunction(p) => p.color,
            PlayerInstance::AlphaBeta(p) => p.color,
            PlayerInstance::MCTS(p) => p.color,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlayerInstance::Random(..) => "Random",
            PlayerInstance::WeightedRandom(..) => "WeightedRandom",
            PlayerInstance::ValueFunction(_) => "ValueFunction",
            PlayerInstance::AlphaBeta(_) => "AlphaBeta",
            PlayerInstance::MCTS(_) => "MCTS",
        }
    }
}

impl BasePlayer for PlayerInstance {
    fn decide(&self, game: &Game, actions: &[GameAction]) -> Option<GameAction> {
        match self {
            PlayerInstance::Random(_, p) => p.decide(game, actions),
            PlayerInstance::WeightedRandom(_, p) => p.decide(game, actions),
            PlayerInstance::ValueFunction(p) => p.decide(game, actions),
            PlayerInstance::AlphaBeta(p) => p.decide(game, actions),
            PlayerInstance::MCTS(p) => p.decide(game, actions),
        }
    }
}

/// Any value other than an explicit "false" turns the flag on.
fn parse_flag(param: Option<&&str>) -> Option<bool> {
    param.map(|s| !s.eq_ignore_ascii_case("false"))
}

/// Builds a player from a code such as `AB:2:True`, already split on `:`.
pub fn create_player(code: &str, color: Color, params: &[&str]) -> Option<PlayerInstance> {
    match code {
        "R" => Some(PlayerInstance::Random(color, RandomPlayer)),
        "W" => Some(PlayerInstance::WeightedRandom(color, WeightedRandomPlayer)),
        "F" => {
            let epsilon = params.first().and_then(|s| s.parse::<f64>().ok());
            Some(PlayerInstance::ValueFunction(ValueFunctionPlayer::new(
                color, None, epsilon,
            )))
        }
        "AB" => {
            let defaults = AlphaBetaConfig::default();
            let config = AlphaBetaConfig {
                depth: params
                    .first()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(defaults.depth),
                prunning: parse_flag(params.get(1)).unwrap_or(defaults.prunning),
                ..defaults
            };
            Some(PlayerInstance::AlphaBeta(AlphaBetaPlayer::new(color, config)))
        }
        "M" => {
            let num_sims = params.first().and_then(|s| s.parse::<usize>().ok());
            let prunning = parse_flag(params.get(1));
            Some(PlayerInstance::MCTS(MCTSPlayer::new(color, num_sims, prunning)))
        }
        _ => None,
    }
}

/// Parses a comma-separated roster like `R,F,AB:2:True`. Entry `i` plays
/// `colors[i]`, defaulting to `Color::ORDERED`.
pub fn parse_players(roster: &str, colors: Option<&[Color]>) -> Result<Vec<PlayerInstance>, String> {
    let keys: Vec<&str> = roster.split(',').map(str::trim).collect();
    if keys.len() < 2 || keys.len() > Color::ORDERED.len() {
        return Err(format!("expected 2 to 4 players, got {}", keys.len()));
    }
    let colors = colors.unwrap_or(&Color::ORDERED);
    if colors.len() < keys.len() {
        return Err(format!(
            "{} players but only {} colors configured",
            keys.len(),
            colors.len()
        ));
    }
    keys.iter()
        .zip(colors)
        .map(|(key, color)| {
            let mut parts = key.split(':');
            let code = parts.next().unwrap_or_default();
            let params: Vec<&str> = parts.collect();
            create_player(code, *color, &params)
                .ok_or_else(|| format!("unknown player code '{code}'"))
        })
        .collect()
}

pub fn print_player_help() {
    println!("Player Legend:");
    println!("{:<5} {:<25} DESCRIPTION", "CODE", "PLAYER");
    println!("{}", "-".repeat(80));
    for player in CLI_PLAYERS {
        println!("{:<5} {:<25} {}", player.code, player.name, player.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_with_params() {
        let players = parse_players("R,F:0.1,AB:3:True,M:5:false", None).unwrap();
        assert_eq!(players.len(), 4);
        assert_eq!(players[0].color(), Color::Red);
        match &players[2] {
            PlayerInstance::AlphaBeta(p) => {
                assert_eq!(p.config.depth, 3);
                assert!(p.config.prunning);
                assert_eq!(p.color, Color::Orange);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &players[3] {
            PlayerInstance::MCTS(p) => {
                assert_eq!(p.num_simulations, 5);
                assert!(!p.prunning);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &players[1] {
            PlayerInstance::ValueFunction(p) => assert_eq!(p.epsilon, Some(0.1)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn defaults_apply() {
        let players = parse_players("AB,M", Some(&[Color::White, Color::Blue])).unwrap();
        match &players[0] {
            PlayerInstance::AlphaBeta(p) => {
                assert_eq!(p.config.depth, 2);
                assert_eq!(p.color, Color::White);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &players[1] {
            PlayerInstance::MCTS(p) => assert_eq!(p.num_simulations, 10),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_rosters() {
        assert!(parse_players("R", None).is_err());
        assert!(parse_players("R,R,R,R,R", None).is_err());
        assert!(parse_players("R,X", None).is_err());
        assert!(matches!(
            parse_players("W,R", None).unwrap()[0],
            PlayerInstance::WeightedRandom(Color::Red, _)
        ));
        assert!(parse_players("R,R,R", Some(&[Color::Red, Color::Blue])).is_err());
    }
}
