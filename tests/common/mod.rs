//! Helpers shared by the integration tests.

#![allow(dead_code)]

use catan_engine::game::{
    ActionKind, Freqdeck, Game, GameAction, GameConfig, GameError, GameState, apply_action,
    validate_then_apply,
};
use catan_engine::players::RandomPlayer;
use catan_engine::types::ActionType;

pub fn new_state(num_players: usize, seed: u64) -> GameState {
    GameState::new(GameConfig {
        num_players,
        seed,
        ..GameConfig::default()
    })
    .unwrap()
}

/// Runs the placement phase taking the first legal action each time.
pub fn placed_state(num_players: usize, seed: u64) -> GameState {
    let mut state = new_state(num_players, seed);
    while state.is_initial_build_phase {
        let action = state.legal_actions()[0].clone();
        apply_action(&mut state, action).unwrap();
    }
    state
}

pub fn act(state: &mut GameState, kind: ActionKind) -> Result<GameAction, GameError> {
    let action = GameAction::new(state.current_color(), kind);
    validate_then_apply(state, action)
}

/// Moves cards from the bank into a seat's hand.
pub fn give(state: &mut GameState, seat: usize, counts: [u8; 5]) {
    let bundle = Freqdeck::from_counts(counts);
    state.bank.dispense(&bundle).unwrap();
    state.players[seat].hand.add(&bundle);
}

pub fn clear_hands(state: &mut GameState) {
    for seat in 0..state.players.len() {
        let hand = state.players[seat].hand;
        state.bank.receive(&hand);
        state.players[seat].hand = Freqdeck::zero();
    }
}

/// A roll that never produces a seven.
pub fn roll_three(state: &mut GameState) {
    act(state, ActionKind::Roll(Some((1, 2)))).unwrap();
}

pub fn play_random_game(num_players: usize, seed: u64) -> Game {
    let mut game = Game::new(GameConfig {
        num_players,
        seed,
        ..GameConfig::default()
    })
    .unwrap();
    let players = vec![RandomPlayer; num_players];
    game.play(&players).unwrap();
    game
}

/// Builds roads for the current seat until its longest road reaches
/// `target`, picking each road by a two-road lookahead on length.
pub fn extend_road_to(state: &mut GameState, target: usize) {
    fn roads(state: &GameState) -> Vec<GameAction> {
        state
            .legal_actions()
            .iter()
            .filter(|a| a.action_type() == ActionType::BuildRoad)
            .cloned()
            .collect()
    }

    let color = state.current_color();
    while state.board.road_length_of(color) < target {
        let mut best: Option<(usize, GameAction)> = None;
        for action in roads(state) {
            let mut trial = state.clone();
            apply_action(&mut trial, action.clone()).unwrap();
            let mut score = trial.board.road_length_of(color);
            for follow_up in roads(&trial) {
                let mut deeper = trial.clone();
                apply_action(&mut deeper, follow_up).unwrap();
                score = score.max(deeper.board.road_length_of(color));
            }
            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, action));
            }
        }
        let Some((_, action)) = best else {
            panic!("ran out of roads before reaching length {target}");
        };
        validate_then_apply(state, action).unwrap();
    }
}

