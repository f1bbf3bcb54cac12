//! Placement, dice, robber and trade flow driven through the public
//! game surface.

mod common;

use catan_engine::game::move_generation::maritime_rates;
use catan_engine::game::{
    ActionKind, Freqdeck, GameAction, GameError, TradeOffer, apply_action, validate_then_apply,
};
use catan_engine::types::{ActionPrompt, ActionType, Resource};
use common::{act, clear_hands, give, new_state, placed_state, play_random_game, roll_three};

// =============================================================================
// Placement and turn flow
// =============================================================================

#[test]
fn two_player_placement_then_single_roll() {
    let mut state = new_state(2, 42);
    let mut placements = 0;
    while state.is_initial_build_phase {
        assert!(matches!(
            state.current_prompt,
            ActionPrompt::BuildInitialSettlement | ActionPrompt::BuildInitialRoad
        ));
        let action = state.legal_actions()[0].clone();
        apply_action(&mut state, action).unwrap();
        placements += 1;
    }
    assert_eq!(placements, 8);
    assert_eq!(state.current_prompt, ActionPrompt::PlayTurn);
    assert_eq!(state.current_player_index, 0);
    assert_eq!(
        state.legal_actions(),
        &[GameAction::new(state.colors[0], ActionKind::Roll(None))]
    );
}

#[test]
fn placement_snake_order() {
    let mut state = new_state(3, 7);
    let mut seats = Vec::new();
    while state.is_initial_build_phase {
        if state.current_prompt == ActionPrompt::BuildInitialSettlement {
            seats.push(state.current_player_index);
        }
        let action = state.legal_actions()[0].clone();
        apply_action(&mut state, action).unwrap();
    }
    assert_eq!(seats, vec![0, 1, 2, 2, 1, 0]);
}

#[test]
fn offer_trade_is_never_enumerated() {
    let game = play_random_game(3, 11);
    let mut state = new_state(3, 11);
    for action in &game.state.actions {
        assert!(
            state
                .legal_actions()
                .iter()
                .all(|a| a.action_type() != ActionType::OfferTrade)
        );
        validate_then_apply(&mut state, action.clone()).unwrap();
    }
}

// =============================================================================
// Sevens, discards and the robber
// =============================================================================

#[test]
fn nine_card_hand_discards_four_on_seven() {
    let mut state = placed_state(2, 42);
    clear_hands(&mut state);
    give(&mut state, 1, [2, 2, 2, 2, 1]);

    act(&mut state, ActionKind::Roll(Some((3, 4)))).unwrap();
    assert_eq!(state.current_prompt, ActionPrompt::Discard);
    assert_eq!(state.current_player_index, 1);

    let applied = act(&mut state, ActionKind::Discard(None)).unwrap();
    let ActionKind::Discard(Some(cards)) = &applied.kind else {
        panic!("discard outcome missing: {applied:?}");
    };
    assert_eq!(cards.len(), 4);
    assert_eq!(state.players[1].hand.total(), 5);
    assert_eq!(state.current_prompt, ActionPrompt::MoveRobber);
    assert_eq!(state.current_player_index, 0);
    assert_eq!(state.resource_totals(), [19; 5]);
}

#[test]
fn hand_at_the_limit_keeps_its_cards() {
    let mut state = placed_state(2, 42);
    clear_hands(&mut state);
    give(&mut state, 1, [2, 2, 2, 1, 0]);

    act(&mut state, ActionKind::Roll(Some((3, 4)))).unwrap();
    assert_eq!(state.current_prompt, ActionPrompt::MoveRobber);
    assert_eq!(state.players[1].hand.total(), 7);
}

#[test]
fn robber_cannot_stay_in_place() {
    let mut state = placed_state(2, 42);
    act(&mut state, ActionKind::Roll(Some((3, 4)))).unwrap();
    while state.current_prompt == ActionPrompt::Discard {
        act(&mut state, ActionKind::Discard(None)).unwrap();
    }
    let robber = state.board.robber_coordinate;
    assert!(state.legal_actions().iter().all(|a| !matches!(
        a.kind,
        ActionKind::MoveRobber { coordinate, .. } if coordinate == robber
    )));
    let stay = ActionKind::MoveRobber {
        coordinate: robber,
        victim: None,
        resource: None,
    };
    assert!(matches!(
        act(&mut state, stay),
        Err(GameError::IllegalAction(_))
    ));
}

// =============================================================================
// Trading
// =============================================================================

#[test]
fn maritime_trade_balances_against_the_bank() {
    let mut state = placed_state(2, 42);
    clear_hands(&mut state);
    let color = state.current_color();
    let give_kind = Resource::Ore;
    let rate = maritime_rates(&state, color)[give_kind.index()];
    let mut counts = [0; 5];
    counts[give_kind.index()] = rate;
    give(&mut state, 0, counts);
    roll_three(&mut state);

    let before_hand = state.players[0].hand;
    let before_bank = *state.bank.resources();
    let trade = GameAction::maritime_trade(color, give_kind, rate, Resource::Wheat);
    assert!(state.legal_actions().contains(&trade));
    validate_then_apply(&mut state, trade).unwrap();

    let hand = &state.players[0].hand;
    assert_eq!(hand.get(give_kind), before_hand.get(give_kind) - rate);
    assert_eq!(
        hand.get(Resource::Wheat),
        before_hand.get(Resource::Wheat) + 1
    );
    assert_eq!(
        state.bank.available(give_kind),
        before_bank.get(give_kind) + rate
    );
    assert_eq!(
        state.bank.available(Resource::Wheat),
        before_bank.get(Resource::Wheat) - 1
    );
    assert_eq!(state.resource_totals(), [19; 5]);
}

#[test]
fn malformed_offers_are_rejected() {
    let mut state = placed_state(2, 42);
    clear_hands(&mut state);
    give(&mut state, 0, [1, 1, 0, 0, 0]);
    roll_three(&mut state);

    let overlapping = ActionKind::OfferTrade(TradeOffer::new(
        Freqdeck::from_counts([1, 0, 0, 0, 0]),
        Freqdeck::from_counts([1, 0, 0, 0, 0]),
    ));
    assert!(act(&mut state, overlapping).is_err());

    let unaffordable = ActionKind::OfferTrade(TradeOffer::new(
        Freqdeck::from_counts([0, 0, 0, 0, 5]),
        Freqdeck::from_counts([1, 0, 0, 0, 0]),
    ));
    assert!(act(&mut state, unaffordable).is_err());
    assert_eq!(state.current_prompt, ActionPrompt::PlayTurn);
}

