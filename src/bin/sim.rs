use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use catan_engine::MapType;
use catan_engine::cli::{GameStats, PlayerInstance, parse_players, print_player_help};
use catan_engine::game::{Game, GameConfig, ReplayLog};
use clap::Parser;
use log::{LevelFilter, info};
use rayon::prelude::*;

#[derive(Debug, Parser, Clone)]
#[command(name = "catan-sim")]
#[command(about = "Catan Bot Simulator - Simulate games between different player strategies")]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 5)]
    num: u32,

    /// Comma-separated player codes (e.g., R,R,R,R or F,F,AB:2:True,M:20)
    /// Use ':' to set player-specific params
    #[arg(long, default_value = "R,R,R,R")]
    players: String,

    /// JSON file with a game config; explicit flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility; game i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Map type: BASE, MINI, or TOURNAMENT
    #[arg(long)]
    map: Option<MapType>,

    /// Victory points needed to win
    #[arg(long)]
    vps_to_win: Option<u8>,

    /// Hand size above which a seven forces a discard
    #[arg(long)]
    discard_limit: Option<u32>,

    /// Show player codes and exit
    #[arg(long)]
    help_players: bool,

    /// Silence console output
    #[arg(long)]
    quiet: bool,

    /// Number of worker threads for parallel execution
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Write the last game's action log to this file as JSON
    #[arg(long)]
    replay_out: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
}

fn base_config(args: &Args) -> Result<GameConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(map) = args.map {
        config.map_type = map;
    }
    if let Some(vps) = args.vps_to_win {
        config.vps_to_win = vps;
    }
    if let Some(limit) = args.discard_limit {
        config.discard_limit = limit;
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if args.help_players {
        print_player_help();
        return Ok(());
    }
    init_logging(args.log_level)?;

    let mut config = base_config(&args)?;
    let players = parse_players(&args.players, config.colors.as_deref())?;
    config.num_players = players.len();
    if let Some(colors) = config.colors.as_mut() {
        colors.truncate(players.len());
    }

    let started = Instant::now();
    let (stats, last_log) = if args.workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build()?;
        pool.install(|| run_parallel(&args, &config, &players))?
    } else {
        run_sequential(&args, &config, &players)?
    };
    info!("simulated {} games in {:?}", stats.games, started.elapsed());

    if let (Some(path), Some(log)) = (&args.replay_out, last_log) {
        std::fs::write(path, log.to_json()?)?;
        info!("wrote replay log to {}", path.display());
    }

    if !args.quiet {
        print_summary(&stats, &players);
    }
    Ok(())
}

fn play_one(
    config: &GameConfig,
    players: &[PlayerInstance],
    game_idx: u32,
) -> Result<(Game, std::time::Duration), Box<dyn Error + Send + Sync>> {
    let config = GameConfig {
        seed: config.seed + u64::from(game_idx),
        ..config.clone()
    };
    let start = Instant::now();
    let mut game = Game::new(config)?;
    game.play(players)?;
    Ok((game, start.elapsed()))
}

fn run_sequential(
    args: &Args,
    config: &GameConfig,
    players: &[PlayerInstance],
) -> Result<(GameStats, Option<ReplayLog>), Box<dyn Error>> {
    let mut stats = GameStats::new();
    let mut last_log = None;
    for game_idx in 0..args.num {
        let (game, duration) = play_one(config, players, game_idx).map_err(|e| e.to_string())?;
        stats.record_game(&game, duration);

        if !args.quiet {
            let last_n = 10;
            if game_idx < last_n || game_idx >= args.num.saturating_sub(last_n) {
                let winner = game
                    .winning_color()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "None".to_string());
                let seating: Vec<String> =
                    game.state.colors.iter().map(ToString::to_string).collect();
                println!(
                    "Game {:>4}: Seating=[{}], Winner={:>6}, Turns={:>4}, Duration={:?}",
                    game_idx + 1,
                    seating.join(","),
                    winner,
                    game.state.num_turns,
                    duration
                );
            } else if (game_idx + 1) % 100 == 0 {
                print!(".");
                io::stdout().flush()?;
            }
        }
        if game_idx + 1 == args.num {
            last_log = Some(ReplayLog::from_state(&game.state));
        }
    }
    Ok((stats, last_log))
}

fn run_parallel(
    args: &Args,
    config: &GameConfig,
    players: &[PlayerInstance],
) -> Result<(GameStats, Option<ReplayLog>), String> {
    let results: Vec<(GameStats, Option<ReplayLog>)> = (0..args.num)
        .into_par_iter()
        .map(|game_idx| {
            let (game, duration) = play_one(config, players, game_idx)?;
            let mut stats = GameStats::new();
            stats.record_game(&game, duration);
            let log = (game_idx + 1 == args.num).then(|| ReplayLog::from_state(&game.state));
            Ok((stats, log))
        })
        .collect::<Result<_, Box<dyn Error + Send + Sync>>>()
        .map_err(|e| e.to_string())?;

    let mut stats = GameStats::new();
    let mut last_log = None;
    for (game_stats, log) in results {
        stats.merge(game_stats);
        if log.is_some() {
            last_log = log;
        }
    }
    Ok((stats, last_log))
}

fn print_summary(stats: &GameStats, players: &[PlayerInstance]) {
    println!("\n{}", "=".repeat(80));
    println!("SIMULATION SUMMARY");
    println!("{}", "=".repeat(80));

    println!("\nPlayer Summary:");
    println!(
        "{:<22} {:<10} {:<12} {:<12}",
        "Player", "Wins", "Win Rate", "Avg VP"
    );
    println!("{}", "-".repeat(58));

    for player in players {
        let color = player.color();
        println!(
            "{:<22} {:<10} {:<11.1}% {:<12.2}",
            format!("{} ({})", player.name(), color),
            stats.wins_of(color),
            stats.win_rate(color) * 100.0,
            stats.avg_vps(color)
        );
    }

    println!("\nGame Summary:");
    println!("  Total Games: {}", stats.games);
    println!("  Avg Turns: {:.2}", stats.get_avg_turns());
    println!("  Avg Ticks: {:.2}", stats.get_avg_ticks());
    println!("  Avg Duration: {:.2?}", stats.get_avg_duration());
}
