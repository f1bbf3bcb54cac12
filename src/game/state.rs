use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardError, CatanMap, MapType};
use crate::types::{ActionPrompt, Color};

use super::action::{GameAction, TradeOffer};
use super::bank::Bank;
use super::freqdeck::FreqdeckError;
use super::move_generation::generate_playable_actions;
use super::players::PlayerState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub num_players: usize,
    /// Colors in play, defaulting to the first `num_players` of
    /// `Color::ORDERED`. Seating is a seeded shuffle either way.
    pub colors: Option<Vec<Color>>,
    pub map_type: MapType,
    pub discard_limit: u32,
    pub vps_to_win: u8,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: 4,
            colors: None,
            map_type: MapType::Base,
            discard_limit: 7,
            vps_to_win: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("game already completed")]
    GameFinished,
    #[error("illegal action: {0}")]
    IllegalAction(Box<GameAction>),
    #[error("{0} cannot afford this action")]
    InsufficientResources(Color),
    #[error("invalid trade: {0}")]
    InvalidTrade(&'static str),
    #[error("unknown action type {0}")]
    UnknownActionType(String),
    #[error("search deadline exceeded")]
    SearchTimeout,
    #[error("invalid game config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Ledger(#[from] FreqdeckError),
}

impl GameError {
    pub fn illegal(action: &GameAction) -> Self {
        GameError::IllegalAction(Box::new(action.clone()))
    }
}

/// Snake order of the two placement rounds: seats `0..n`, then `n-1..=0`,
/// each placing a settlement then a road.
#[derive(Debug, Clone)]
pub struct SetupState {
    steps: Vec<SetupStep>,
    cursor: usize,
}

#[derive(Debug, Clone, Copy)]
struct SetupStep {
    seat: usize,
    prompt: ActionPrompt,
    second_round: bool,
}

impl SetupState {
    fn new(num_players: usize) -> Self {
        let forward = (0..num_players).map(|seat| (seat, false));
        let backward = (0..num_players).rev().map(|seat| (seat, true));
        let steps = forward
            .chain(backward)
            .flat_map(|(seat, second_round)| {
                [
                    ActionPrompt::BuildInitialSettlement,
                    ActionPrompt::BuildInitialRoad,
                ]
                .map(|prompt| SetupStep {
                    seat,
                    prompt,
                    second_round,
                })
            })
            .collect();
        Self { steps, cursor: 0 }
    }

    fn current(&self) -> Option<SetupStep> {
        self.steps.get(self.cursor).copied()
    }

    pub fn is_second_round(&self) -> bool {
        self.current().is_some_and(|step| step.second_round)
    }

    /// Moves to the next step; returns its seat, or `None` once complete.
    fn advance(&mut self) -> Option<(usize, ActionPrompt)> {
        self.cursor = (self.cursor + 1).min(self.steps.len());
        self.current().map(|step| (step.seat, step.prompt))
    }
}

/// Source of truth for one game. `Clone` is the search `copy`: the map is
/// shared through its `Arc`, everything else is duplicated.
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: Arc<GameConfig>,
    /// Seating order.
    pub colors: Vec<Color>,
    pub board: Board,
    pub players: Vec<PlayerState>,
    pub bank: Bank,
    pub actions: Vec<GameAction>,
    pub num_turns: u32,
    pub current_player_index: usize,
    pub current_turn_index: usize,
    pub current_prompt: ActionPrompt,
    pub is_initial_build_phase: bool,
    pub is_discarding: bool,
    pub is_moving_knight: bool,
    pub is_road_building: bool,
    pub free_roads_available: u8,
    pub current_trade: Option<TradeOffer>,
    pub acceptees: Vec<bool>,
    pub(crate) setup: SetupState,
    pub(crate) playable_actions: Vec<GameAction>,
    pub(crate) rng: StdRng,
}

impl GameState {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut colors = match &config.colors {
            Some(colors) => {
                let mut unique = colors.clone();
                unique.sort();
                unique.dedup();
                if unique.len() != colors.len() {
                    return Err(GameError::InvalidConfig("duplicate colors".into()));
                }
                colors.clone()
            }
            None => Color::ORDERED
                .get(..config.num_players)
                .ok_or_else(|| {
                    GameError::InvalidConfig(format!(
                        "{} players requested, at most 4 supported",
                        config.num_players
                    ))
                })?
                .to_vec(),
        };
        colors.shuffle(&mut rng);
        if !(2..=4).contains(&colors.len()) {
            return Err(GameError::InvalidConfig(format!(
                "Catan supports 2 to 4 players, got {}",
                colors.len()
            )));
        }

        let map = Arc::new(CatanMap::build_with_rng(config.map_type, &mut rng));
        let bank = Bank::standard(&mut rng);
        let players = colors.iter().map(|color| PlayerState::new(*color)).collect();
        let num_players = colors.len();

        let mut state = Self {
            config: Arc::new(config),
            board: Board::new(map),
            players,
            bank,
            actions: Vec::new(),
            num_turns: 0,
            current_player_index: 0,
            current_turn_index: 0,
            current_prompt: ActionPrompt::BuildInitialSettlement,
            is_initial_build_phase: true,
            is_discarding: false,
            is_moving_knight: false,
            is_road_building: false,
            free_roads_available: 0,
            current_trade: None,
            acceptees: vec![false; num_players],
            setup: SetupState::new(num_players),
            playable_actions: Vec::new(),
            rng,
            colors,
        };
        state.refresh_playable_actions();
        Ok(state)
    }

    pub fn current_color(&self) -> Color {
        self.colors[self.current_player_index]
    }

    pub fn current_player(&self) -> &PlayerState {
        &self.players[self.current_player_index]
    }

    pub fn seat_of(&self, color: Color) -> Option<usize> {
        self.colors.iter().position(|c| *c == color)
    }

    pub fn player(&self, color: Color) -> Option<&PlayerState> {
        self.seat_of(color).map(|seat| &self.players[seat])
    }

    pub fn next_color(&self, color: Color) -> Color {
        let seat = self.seat_of(color).unwrap_or(0);
        self.colors[(seat + 1) % self.colors.len()]
    }

    /// Memoized legal actions for the seat that must act now.
    pub fn legal_actions(&self) -> &[GameAction] {
        &self.playable_actions
    }

    pub fn action_log(&self) -> &[GameAction] {
        &self.actions
    }

    /// First seat (in seating order) whose actual points reach the target.
    pub fn winner(&self) -> Option<Color> {
        self.players
            .iter()
            .find(|player| player.total_points() >= self.config.vps_to_win)
            .map(|player| player.color)
    }

    pub fn is_finished(&self) -> bool {
        self.winner().is_some()
    }

    pub fn discard_limit(&self) -> u32 {
        self.config.discard_limit
    }

    pub(crate) fn refresh_playable_actions(&mut self) {
        self.playable_actions = generate_playable_actions(self);
    }

    /// Passes the turn to the next seat (or previous, in the second
    /// placement round) and counts it.
    pub(crate) fn advance_turn(&mut self, forward: bool) {
        let n = self.colors.len();
        let next = if forward {
            (self.current_player_index + 1) % n
        } else {
            (self.current_player_index + n - 1) % n
        };
        self.current_player_index = next;
        self.current_turn_index = next;
        self.num_turns += 1;
    }

    /// Steps the placement snake after an initial build. Returns `true` when
    /// the placement phase just ended.
    pub(crate) fn advance_setup(&mut self) -> bool {
        match self.setup.advance() {
            Some((seat, prompt)) => {
                if seat != self.current_player_index {
                    self.advance_turn(seat > self.current_player_index);
                }
                self.current_prompt = prompt;
                false
            }
            None => {
                self.is_initial_build_phase = false;
                self.current_player_index = 0;
                self.current_turn_index = 0;
                self.current_prompt = ActionPrompt::PlayTurn;
                true
            }
        }
    }

    pub(crate) fn reset_trading_state(&mut self) {
        self.current_trade = None;
        self.acceptees.iter_mut().for_each(|accepted| *accepted = false);
        self.current_player_index = self.current_turn_index;
        self.current_prompt = ActionPrompt::PlayTurn;
    }

    /// Total of every resource held by the bank and all hands.
    pub fn resource_totals(&self) -> [u32; 5] {
        let mut totals = self.bank.resources().counts().map(u32::from);
        for player in &self.players {
            for (slot, count) in totals.iter_mut().zip(player.hand.counts()) {
                *slot += u32::from(count);
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(num_players: usize) -> GameConfig {
        GameConfig {
            num_players,
            ..GameConfig::default()
        }
    }

    #[test]
    fn seating_is_seeded_shuffle() {
        let a = GameState::new(config(4)).unwrap();
        let b = GameState::new(config(4)).unwrap();
        assert_eq!(a.colors, b.colors);
        let mut sorted = a.colors.clone();
        sorted.sort();
        assert_eq!(sorted, Color::ORDERED.to_vec());
    }

    #[test]
    fn explicit_colors_are_shuffled_too() {
        let seatings: std::collections::BTreeSet<Vec<Color>> = (0..20)
            .map(|seed| {
                GameState::new(GameConfig {
                    colors: Some(vec![Color::White, Color::Red, Color::Blue]),
                    seed,
                    ..GameConfig::default()
                })
                .unwrap()
                .colors
            })
            .collect();
        assert!(seatings.len() > 1);
        for seating in &seatings {
            let mut sorted = seating.clone();
            sorted.sort();
            assert_eq!(sorted, vec![Color::Red, Color::Blue, Color::White]);
        }
    }

    #[test]
    fn rejects_bad_player_counts() {
        assert!(matches!(
            GameState::new(config(1)),
            Err(GameError::InvalidConfig(_))
        ));
        assert!(matches!(
            GameState::new(config(5)),
            Err(GameError::InvalidConfig(_))
        ));
        assert!(matches!(
            GameState::new(GameConfig {
                colors: Some(vec![Color::Red, Color::Red]),
                ..GameConfig::default()
            }),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn starts_in_placement_with_full_bank() {
        let state = GameState::new(config(3)).unwrap();
        assert!(state.is_initial_build_phase);
        assert_eq!(state.current_prompt, ActionPrompt::BuildInitialSettlement);
        assert_eq!(state.legal_actions().len(), 54);
        assert_eq!(state.resource_totals(), [19; 5]);
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn setup_snake_order() {
        let mut setup = SetupState::new(3);
        let mut seats = vec![0];
        while let Some((seat, _)) = setup.advance() {
            seats.push(seat);
        }
        assert_eq!(seats, vec![0, 0, 1, 1, 2, 2, 2, 2, 1, 1, 0, 0]);
    }

    #[test]
    fn config_round_trips_through_json() {
        let json = r#"{"num_players": 3, "map_type": "MINI", "vps_to_win": 8}"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.num_players, 3);
        assert_eq!(config.map_type, MapType::Mini);
        assert_eq!(config.discard_limit, 7);
        assert_eq!(config.seed, 42);
    }
}
