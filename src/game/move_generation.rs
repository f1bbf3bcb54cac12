//! Legal-action enumeration. Every list comes out in a fixed order (ids
//! ascending, resources in enum order) so that seeded games replay.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::types::{ActionPrompt, Color, DevelopmentCard, Resource};

use super::action::{ActionKind, GameAction};
use super::freqdeck::{COST_CITY, COST_DEVELOPMENT, COST_ROAD, COST_SETTLEMENT, Freqdeck};
use super::state::GameState;

pub fn generate_playable_actions(state: &GameState) -> Vec<GameAction> {
    if state.is_finished() {
        return Vec::new();
    }
    let color = state.current_color();
    match state.current_prompt {
        ActionPrompt::BuildInitialSettlement => settlement_possibilities(state, color, true),
        ActionPrompt::BuildInitialRoad => initial_road_possibilities(state, color),
        ActionPrompt::MoveRobber => robber_possibilities(state, color),
        ActionPrompt::PlayTurn => play_turn_possibilities(state, color),
        ActionPrompt::Discard => vec![GameAction::new(color, ActionKind::Discard(None))],
        ActionPrompt::DecideTrade => decide_trade_possibilities(state, color),
        ActionPrompt::DecideAcceptees => decide_acceptees_possibilities(state, color),
    }
}

fn play_turn_possibilities(state: &GameState, color: Color) -> Vec<GameAction> {
    let player = state.current_player();
    if state.is_road_building {
        return road_building_possibilities(state, color, false);
    }
    if !player.has_rolled {
        let mut actions = vec![GameAction::new(color, ActionKind::Roll(None))];
        if player.can_play_dev_card(DevelopmentCard::Knight) {
            actions.push(GameAction::new(color, ActionKind::PlayKnightCard));
        }
        return actions;
    }

    let mut actions = vec![GameAction::new(color, ActionKind::EndTurn)];
    actions.extend(road_building_possibilities(state, color, true));
    actions.extend(settlement_possibilities(state, color, false));
    actions.extend(city_possibilities(state, color));

    if player.hand.contains(&COST_DEVELOPMENT) && state.bank.development_deck_len() > 0 {
        actions.push(GameAction::new(color, ActionKind::BuyDevelopmentCard(None)));
    }

    if player.can_play_dev_card(DevelopmentCard::YearOfPlenty) {
        actions.extend(year_of_plenty_possibilities(color, state.bank.resources()));
    }
    if player.can_play_dev_card(DevelopmentCard::Monopoly) {
        actions.extend(
            Resource::ALL
                .into_iter()
                .map(|resource| GameAction::new(color, ActionKind::PlayMonopoly(resource))),
        );
    }
    if player.can_play_dev_card(DevelopmentCard::Knight) {
        actions.push(GameAction::new(color, ActionKind::PlayKnightCard));
    }
    if player.can_play_dev_card(DevelopmentCard::RoadBuilding)
        && !road_building_possibilities(state, color, false).is_empty()
    {
        actions.push(GameAction::new(color, ActionKind::PlayRoadBuilding));
    }

    actions.extend(maritime_trade_possibilities(state, color));
    actions
}

/// BUILD_ROAD over every buildable edge; `check_money` is off for free roads.
pub fn road_building_possibilities(
    state: &GameState,
    color: Color,
    check_money: bool,
) -> Vec<GameAction> {
    let Some(player) = state.player(color) else {
        return Vec::new();
    };
    let has_money = !check_money || player.hand.contains(&COST_ROAD);
    if !has_money || player.roads_available() == 0 {
        return Vec::new();
    }
    state
        .board
        .buildable_edges(color)
        .iter()
        .map(|edge| GameAction::new(color, ActionKind::BuildRoad(*edge)))
        .collect()
}

pub fn settlement_possibilities(
    state: &GameState,
    color: Color,
    initial_build_phase: bool,
) -> Vec<GameAction> {
    if !initial_build_phase {
        let Some(player) = state.player(color) else {
            return Vec::new();
        };
        if !player.hand.contains(&COST_SETTLEMENT) || player.settlements_available() == 0 {
            return Vec::new();
        }
    }
    state
        .board
        .buildable_node_ids(color, initial_build_phase)
        .into_iter()
        .map(|node| GameAction::new(color, ActionKind::BuildSettlement(node)))
        .collect()
}

pub fn city_possibilities(state: &GameState, color: Color) -> Vec<GameAction> {
    let Some(player) = state.player(color) else {
        return Vec::new();
    };
    if !player.hand.contains(&COST_CITY) || player.cities_available() == 0 {
        return Vec::new();
    }
    let mut nodes = player.settlements.clone();
    nodes.sort_unstable();
    nodes
        .into_iter()
        .map(|node| GameAction::new(color, ActionKind::BuildCity(node)))
        .collect()
}

/// The initial road must touch the settlement just placed.
fn initial_road_possibilities(state: &GameState, color: Color) -> Vec<GameAction> {
    let Some(last) = state
        .player(color)
        .and_then(|player| player.settlements.last().copied())
    else {
        return Vec::new();
    };
    state
        .board
        .buildable_edges(color)
        .iter()
        .filter(|(a, b)| *a == last || *b == last)
        .map(|edge| GameAction::new(color, ActionKind::BuildRoad(*edge)))
        .collect()
}

/// One action per (tile, victim); a single no-steal action for tiles with no
/// one to rob.
pub fn robber_possibilities(state: &GameState, color: Color) -> Vec<GameAction> {
    let mut actions = Vec::new();
    for tile in &state.board.map.land_tiles {
        if tile.coordinate == state.board.robber_coordinate {
            continue;
        }
        let victims: BTreeSet<Color> = tile
            .nodes
            .iter()
            .filter_map(|node| state.board.get_node_color(*node))
            .filter(|owner| *owner != color)
            .filter(|owner| state.player(*owner).is_some_and(|p| p.hand.total() >= 1))
            .collect();

        if victims.is_empty() {
            actions.push(GameAction::new(
                color,
                ActionKind::MoveRobber {
                    coordinate: tile.coordinate,
                    victim: None,
                    resource: None,
                },
            ));
        }
        for victim in victims {
            actions.push(GameAction::new(
                color,
                ActionKind::MoveRobber {
                    coordinate: tile.coordinate,
                    victim: Some(victim),
                    resource: None,
                },
            ));
        }
    }
    actions
}

/// Every pair the bank can supply; single cards where a pair is not
/// available.
pub fn year_of_plenty_possibilities(color: Color, bank: &Freqdeck) -> Vec<GameAction> {
    let mut options: BTreeSet<(Resource, Option<Resource>)> = BTreeSet::new();
    for pair in Resource::ALL.into_iter().combinations_with_replacement(2) {
        let (first, second) = (pair[0], pair[1]);
        if bank.contains(&Freqdeck::from_listdeck([first, second])) {
            options.insert((first, Some(second)));
        } else {
            if bank.can_draw(1, first) {
                options.insert((first, None));
            }
            if bank.can_draw(1, second) {
                options.insert((second, None));
            }
        }
    }
    options
        .into_iter()
        .map(|(first, second)| GameAction::new(color, ActionKind::PlayYearOfPlenty(first, second)))
        .collect()
}

/// Best rate per offered kind: 2 with a matching port, else 3 with a 3:1
/// port, else 4.
pub fn maritime_rates(state: &GameState, color: Color) -> [u8; 5] {
    let ports = state.board.player_port_resources(color);
    let base = if ports.contains(&None) { 3 } else { 4 };
    let mut rates = [base; 5];
    for resource in ports.into_iter().flatten() {
        rates[resource.index()] = 2;
    }
    rates
}

pub fn maritime_trade_possibilities(state: &GameState, color: Color) -> Vec<GameAction> {
    let Some(player) = state.player(color) else {
        return Vec::new();
    };
    let rates = maritime_rates(state, color);
    let bank = state.bank.resources();
    let mut actions = Vec::new();
    for give in Resource::ALL {
        let rate = rates[give.index()];
        if player.hand.get(give) < rate {
            continue;
        }
        for ask in Resource::ALL {
            if ask != give && bank.get(ask) > 0 {
                actions.push(GameAction::maritime_trade(color, give, rate, ask));
            }
        }
    }
    actions
}

fn decide_trade_possibilities(state: &GameState, color: Color) -> Vec<GameAction> {
    let Some(offer) = state.current_trade else {
        return Vec::new();
    };
    let mut actions = vec![GameAction::new(color, ActionKind::RejectTrade(offer))];
    if state
        .player(color)
        .is_some_and(|player| player.hand.contains(&offer.asking))
    {
        actions.push(GameAction::new(color, ActionKind::AcceptTrade(offer)));
    }
    actions
}

fn decide_acceptees_possibilities(state: &GameState, color: Color) -> Vec<GameAction> {
    let Some(offer) = state.current_trade else {
        return Vec::new();
    };
    let mut actions = vec![GameAction::new(color, ActionKind::CancelTrade)];
    for (partner, accepted) in state.colors.iter().zip(&state.acceptees) {
        if *accepted {
            actions.push(GameAction::new(
                color,
                ActionKind::ConfirmTrade {
                    offer,
                    partner: *partner,
                },
            ));
        }
    }
    actions
}
