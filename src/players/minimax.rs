use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use log::{debug, warn};
use rand::{Rng, seq::SliceRandom};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::action::GameAction;
use crate::game::game::Game;
use crate::game::state::GameError;
use crate::players::BasePlayer;
use crate::players::tree_search::{execute_spectrum, list_pruned_actions};
use crate::players::value::{ValueFunctionParams, base_value};
use crate::types::Color;

pub const DEFAULT_DEPTH: usize = 2;
pub const MAX_SEARCH_TIME: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaBetaConfig {
    pub depth: usize,
    pub prunning: bool,
    /// Chance of playing a random move instead of searching.
    pub epsilon: Option<f64>,
    #[serde(with = "duration_secs")]
    pub max_search_time: Duration,
    /// Score root candidates on the rayon pool.
    pub parallel_root: bool,
    pub params: ValueFunctionParams,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            prunning: false,
            epsilon: None,
            max_search_time: MAX_SEARCH_TIME,
            parallel_root: false,
            params: ValueFunctionParams::default(),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Counters for one search. Shared across rayon workers.
#[derive(Debug, Default)]
pub struct SearchStats {
    pub nodes: AtomicUsize,
    pub leaves: AtomicUsize,
    pub timeouts: AtomicUsize,
}

impl SearchStats {
    fn node(&self) {
        self.nodes.fetch_add(1, Ordering::Relaxed);
    }

    fn leaf(&self, timed_out: bool) {
        self.leaves.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn timed_out(&self) -> bool {
        self.timeouts.load(Ordering::Relaxed) > 0
    }
}

/// Depth-limited expectimax with alpha-beta cutoffs. Our plies maximize,
/// opponent plies minimize, chance outcomes are averaged by probability.
#[derive(Debug, Clone)]
pub struct AlphaBetaPlayer {
    pub color: Color,
    pub config: AlphaBetaConfig,
}

struct Search<'a> {
    color: Color,
    config: &'a AlphaBetaConfig,
    deadline: Instant,
    stats: &'a SearchStats,
}

impl AlphaBetaPlayer {
    pub fn new(color: Color, config: AlphaBetaConfig) -> Self {
        Self { color, config }
    }

    fn candidate_actions(&self, game: &Game) -> Vec<GameAction> {
        if self.config.prunning {
            list_pruned_actions(game)
        } else {
            game.state.legal_actions().to_vec()
        }
    }

    /// Runs one search from `game` and returns the chosen action, its value
    /// and the search counters.
    pub fn search(&self, game: &Game) -> (Option<GameAction>, f64, SearchStats) {
        let stats = SearchStats::default();
        let search = Search {
            color: self.color,
            config: &self.config,
            deadline: Instant::now() + self.config.max_search_time,
            stats: &stats,
        };
        let (action, value) = if self.config.parallel_root {
            search.parallel_root(game)
        } else {
            search.alphabeta(game, self.config.depth, f64::NEG_INFINITY, f64::INFINITY)
        };
        (action, value, stats)
    }
}

impl Search<'_> {
    fn actions(&self, game: &Game) -> Vec<GameAction> {
        if self.config.prunning {
            list_pruned_actions(game)
        } else {
            game.state.legal_actions().to_vec()
        }
    }

    fn evaluate(&self, game: &Game, timed_out: bool) -> f64 {
        self.stats.leaf(timed_out);
        base_value(&game.state, self.color, &self.config.params)
    }

    fn expected_value(&self, game: &Game, action: &GameAction, depth: usize, alpha: f64, beta: f64) -> f64 {
        execute_spectrum(game, action)
            .iter()
            .map(|(outcome, proba)| proba * self.alphabeta(outcome, depth - 1, alpha, beta).1)
            .sum()
    }

    fn alphabeta(
        &self,
        game: &Game,
        depth: usize,
        mut alpha: f64,
        mut beta: f64,
    ) -> (Option<GameAction>, f64) {
        let timed_out = Instant::now() >= self.deadline;
        if depth == 0 || timed_out || game.winning_color().is_some() {
            return (None, self.evaluate(game, timed_out));
        }
        let actions = self.actions(game);
        if actions.is_empty() {
            return (None, self.evaluate(game, false));
        }
        self.stats.node();

        let maximizing = game.state.current_color() == self.color;
        let mut best_action = None;
        let mut best_value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        for action in actions {
            let value = self.expected_value(game, &action, depth, alpha, beta);
            if maximizing {
                if value > best_value || best_action.is_none() {
                    best_value = value;
                    best_action = Some(action);
                }
                alpha = alpha.max(best_value);
            } else {
                if value < best_value || best_action.is_none() {
                    best_value = value;
                    best_action = Some(action);
                }
                beta = beta.min(best_value);
            }
            if alpha >= beta {
                break;
            }
        }
        (best_action, best_value)
    }

    /// Root candidates scored independently on the rayon pool. Gives up
    /// root cutoffs in exchange for parallelism.
    fn parallel_root(&self, game: &Game) -> (Option<GameAction>, f64) {
        let actions = self.actions(game);
        let depth = self.config.depth.max(1);
        let scored: Vec<(GameAction, f64)> = actions
            .into_par_iter()
            .map(|action| {
                let value =
                    self.expected_value(game, &action, depth, f64::NEG_INFINITY, f64::INFINITY);
                (action, value)
            })
            .collect();
        self.stats.node();

        let maximizing = game.state.current_color() == self.color;
        let mut best: Option<(GameAction, f64)> = None;
        for (action, value) in scored {
            let better = match &best {
                None => true,
                Some((_, best_value)) if maximizing => value > *best_value,
                Some((_, best_value)) => value < *best_value,
            };
            if better {
                best = Some((action, value));
            }
        }
        match best {
            Some((action, value)) => (Some(action), value),
            None => (None, self.evaluate(game, false)),
        }
    }
}

impl BasePlayer for AlphaBetaPlayer {
    fn decide(&self, game: &Game, actions: &[GameAction]) -> Option<GameAction> {
        let candidates = self.candidate_actions(game);
        if actions.len() == 1 || candidates.len() == 1 {
            return candidates.first().or(actions.first()).cloned();
        }

        let mut rng = rand::thread_rng();
        if let Some(epsilon) = self.config.epsilon {
            if rng.gen_bool(epsilon.clamp(0.0, 1.0)) {
                return actions.choose(&mut rng).cloned();
            }
        }

        let started = Instant::now();
        let (action, value, stats) = self.search(game);
        if stats.timed_out() {
            warn!(
                "{}: {} after {:?}, {} leaves cut short",
                self.color,
                GameError::SearchTimeout,
                started.elapsed(),
                stats.timeouts.load(Ordering::Relaxed)
            );
        }
        debug!(
            "{} chose {:?} (value {value:.3e}) after {} nodes in {:?}",
            self.color,
            action.as_ref().map(ToString::to_string),
            stats.nodes.load(Ordering::Relaxed),
            started.elapsed()
        );
        action.or_else(|| actions.first().cloned())
    }
}
