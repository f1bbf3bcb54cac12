//! Heuristic features of a game state, seen from one color. The value
//! function reads the typed helpers directly; [`collect_features`] flattens
//! them into named columns for inspection and offline analysis.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::{NodeId, TileId, number_probability};
use crate::game::freqdeck::Freqdeck;
use crate::game::players::PlayerState;
use crate::game::state::GameState;
use crate::types::{ActionPrompt, Color, DevelopmentCard, Resource};

/// Road distances explored by [`reachability_features`] by default.
pub const REACHABLE_FEATURES_MAX: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureCollection {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| self.values[index])
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub fn collect_features(state: &GameState, color: Color) -> FeatureCollection {
    let mut features = BTreeMap::new();
    let order = iter_players(state, color);

    gather_player_features(state, &order, &mut features);
    gather_hand_features(&order, &mut features);
    gather_production_features(state, &order, &mut features);
    gather_reachability_features(state, &order, &mut features);
    gather_game_features(state, &mut features);

    let (names, values) = features.into_iter().unzip();
    FeatureCollection { names, values }
}

/// Seats starting at `color`, in seating order; index 0 is `color` itself.
pub fn iter_players(state: &GameState, color: Color) -> Vec<&PlayerState> {
    let n = state.players.len();
    let start = state.seat_of(color).unwrap_or(0);
    (0..n).map(|offset| &state.players[(start + offset) % n]).collect()
}

/// Expected cards per roll of each resource from `color`'s buildings, cities
/// counted twice. With `consider_robber` the robbed tile yields nothing.
pub fn production_features(state: &GameState, color: Color, consider_robber: bool) -> [f64; 5] {
    let mut production = [0.0; 5];
    let Some(player) = state.player(color) else {
        return production;
    };
    let robbed = state.board.robber_coordinate;
    let buildings = player
        .settlements
        .iter()
        .map(|node| (*node, 1.0))
        .chain(player.cities.iter().map(|node| (*node, 2.0)));
    for (node, multiplier) in buildings {
        for tile in state.board.map.adjacent_tiles(node) {
            if consider_robber && tile.coordinate == robbed {
                continue;
            }
            if let (Some(resource), Some(number)) = (tile.resource, tile.number) {
                production[resource.index()] += multiplier * number_probability(number);
            }
        }
    }
    production
}

/// Sum of production plus a bonus per produced kind.
pub fn value_production(production: &[f64; 5], include_variety: bool) -> f64 {
    const PROBA_POINT: f64 = 2.778 / 100.0;
    let sum: f64 = production.iter().sum();
    if !include_variety {
        return sum;
    }
    let variety = production.iter().filter(|p| **p != 0.0).count() as f64 * 4.0 * PROBA_POINT;
    sum + variety
}

/// Production of the nodes `color` could occupy within `level` more roads,
/// one entry per level starting at 0 (nodes already on the network).
/// Candidate nodes are owned buildings plus nodes open under the distance
/// rule; roads cannot pass enemy buildings or enemy roads.
pub fn reachability_features(state: &GameState, color: Color, levels: usize) -> Vec<[f64; 5]> {
    let board = &state.board;
    let mut candidates: BTreeSet<NodeId> = board.buildable_node_ids(color, true).into_iter().collect();
    if let Some(player) = state.player(color) {
        candidates.extend(player.settlements.iter().chain(&player.cities));
    }

    let mut reached: BTreeSet<NodeId> = board
        .connected_components(color)
        .iter()
        .flatten()
        .copied()
        .collect();
    let mut result = Vec::with_capacity(levels);
    for level in 0..levels {
        if level > 0 {
            let mut next = reached.clone();
            for node in &reached {
                if board.is_enemy_node(*node, color) {
                    continue;
                }
                for neighbor in board.map.neighbors(*node) {
                    if board.get_edge_color((*node, *neighbor)).is_none() {
                        next.insert(*neighbor);
                    }
                }
            }
            reached = next;
        }
        result.push(count_production(state, reached.intersection(&candidates)));
    }
    result
}

fn count_production<'a>(state: &GameState, nodes: impl Iterator<Item = &'a NodeId>) -> [f64; 5] {
    let mut production = [0.0; 5];
    for node in nodes {
        for (total, value) in production
            .iter_mut()
            .zip(state.board.map.node_production(*node))
        {
            *total += value;
        }
    }
    production
}

/// 1.0 when the hand covers both a settlement and a city, lower the further
/// it is from either.
pub fn hand_synergy(hand: &Freqdeck) -> f64 {
    let short = |resource: Resource, need: f64| (need - f64::from(hand.get(resource))).max(0.0);
    let distance_to_city = (short(Resource::Wheat, 2.0) + short(Resource::Ore, 3.0)) / 5.0;
    let distance_to_settlement = (short(Resource::Wheat, 1.0)
        + short(Resource::Sheep, 1.0)
        + short(Resource::Brick, 1.0)
        + short(Resource::Wood, 1.0))
        / 4.0;
    (2.0 - distance_to_city - distance_to_settlement) / 2.0
}

/// Distinct land tiles touched by `color`'s buildings.
pub fn owned_tiles(state: &GameState, color: Color) -> BTreeSet<TileId> {
    let Some(player) = state.player(color) else {
        return BTreeSet::new();
    };
    player
        .settlements
        .iter()
        .chain(&player.cities)
        .flat_map(|node| state.board.map.adjacent_tiles(*node).map(|tile| tile.id))
        .collect()
}

fn gather_player_features(
    state: &GameState,
    order: &[&PlayerState],
    features: &mut BTreeMap<String, f64>,
) {
    for (i, player) in order.iter().enumerate() {
        if i == 0 {
            features.insert("P0_ACTUAL_VPS".into(), f64::from(player.total_points()));
        }
        features.insert(format!("P{i}_PUBLIC_VPS"), f64::from(player.public_points()));
        features.insert(format!("P{i}_HAS_ARMY"), flag(player.has_largest_army));
        features.insert(format!("P{i}_HAS_ROAD"), flag(player.has_longest_road));
        features.insert(format!("P{i}_ROADS_LEFT"), player.roads_available() as f64);
        features.insert(
            format!("P{i}_SETTLEMENTS_LEFT"),
            player.settlements_available() as f64,
        );
        features.insert(format!("P{i}_CITIES_LEFT"), player.cities_available() as f64);
        features.insert(format!("P{i}_HAS_ROLLED"), flag(player.has_rolled));
        features.insert(
            format!("P{i}_LONGEST_ROAD_LENGTH"),
            state.board.road_length_of(player.color) as f64,
        );
    }
}

fn gather_hand_features(order: &[&PlayerState], features: &mut BTreeMap<String, f64>) {
    let Some(perspective) = order.first() else {
        return;
    };
    for (resource, count) in perspective.hand.iter() {
        features.insert(format!("P0_{resource}_IN_HAND"), f64::from(count));
    }
    for (card, count) in perspective.dev_cards_in_hand().iter() {
        features.insert(format!("P0_{card}_IN_HAND"), f64::from(count));
    }
    features.insert(
        "P0_HAS_PLAYED_DEVELOPMENT_CARD_IN_TURN".into(),
        flag(perspective.has_played_dev_card_this_turn),
    );
    for (i, player) in order.iter().enumerate() {
        for (card, count) in player.played_dev_cards.iter() {
            if card != DevelopmentCard::VictoryPoint {
                features.insert(format!("P{i}_{card}_PLAYED"), f64::from(count));
            }
        }
        features.insert(
            format!("P{i}_NUM_RESOURCES_IN_HAND"),
            f64::from(player.hand.total()),
        );
        features.insert(
            format!("P{i}_NUM_DEVS_IN_HAND"),
            f64::from(player.dev_cards_in_hand().total()),
        );
    }
}

fn gather_production_features(
    state: &GameState,
    order: &[&PlayerState],
    features: &mut BTreeMap<String, f64>,
) {
    for (i, player) in order.iter().enumerate() {
        let effective = production_features(state, player.color, true);
        let total = production_features(state, player.color, false);
        for resource in Resource::ALL {
            features.insert(
                format!("EFFECTIVE_P{i}_{resource}_PRODUCTION"),
                effective[resource.index()],
            );
            features.insert(
                format!("TOTAL_P{i}_{resource}_PRODUCTION"),
                total[resource.index()],
            );
        }
    }
}

fn gather_reachability_features(
    state: &GameState,
    order: &[&PlayerState],
    features: &mut BTreeMap<String, f64>,
) {
    for (i, player) in order.iter().enumerate() {
        let levels = reachability_features(state, player.color, REACHABLE_FEATURES_MAX);
        for (level, production) in levels.iter().enumerate() {
            for resource in Resource::ALL {
                features.insert(
                    format!("P{i}_{level}_ROAD_REACHABLE_{resource}"),
                    production[resource.index()],
                );
            }
        }
    }
}

fn gather_game_features(state: &GameState, features: &mut BTreeMap<String, f64>) {
    features.insert(
        "BANK_DEV_CARDS".into(),
        state.bank.development_deck_len() as f64,
    );
    features.insert(
        "IS_MOVING_ROBBER".into(),
        flag(state.current_prompt == ActionPrompt::MoveRobber),
    );
    features.insert(
        "IS_DISCARDING".into(),
        flag(state.current_prompt == ActionPrompt::Discard),
    );
    for (resource, count) in state.bank.resources().iter() {
        features.insert(format!("BANK_{resource}"), f64::from(count));
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
