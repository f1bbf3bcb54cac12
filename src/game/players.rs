use serde::{Deserialize, Serialize};

use crate::board::{EdgeId, NodeId};
use crate::game::freqdeck::{DevDeck, Freqdeck, FreqdeckError};
use crate::types::{Color, DevelopmentCard};

pub const MAX_ROADS: usize = 15;
pub const MAX_SETTLEMENTS: usize = 5;
pub const MAX_CITIES: usize = 4;
/// Fewest knights that qualify for the largest-army title.
pub const MIN_LARGEST_ARMY: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub color: Color,
    pub hand: Freqdeck,
    /// Playable development cards.
    pub dev_cards: DevDeck,
    /// Bought this turn; playable from the next one.
    pub fresh_dev_cards: DevDeck,
    pub played_dev_cards: DevDeck,
    /// In build order; the last one anchors the initial road.
    pub settlements: Vec<NodeId>,
    pub cities: Vec<NodeId>,
    pub roads: Vec<EdgeId>,
    pub longest_road_length: usize,
    pub has_longest_road: bool,
    pub has_largest_army: bool,
    pub has_rolled: bool,
    pub has_played_dev_card_this_turn: bool,
}

impl PlayerState {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            hand: Freqdeck::zero(),
            dev_cards: DevDeck::zero(),
            fresh_dev_cards: DevDeck::zero(),
            played_dev_cards: DevDeck::zero(),
            settlements: Vec::new(),
            cities: Vec::new(),
            roads: Vec::new(),
            longest_road_length: 0,
            has_longest_road: false,
            has_largest_army: false,
            has_rolled: false,
            has_played_dev_card_this_turn: false,
        }
    }

    pub fn reset_for_new_turn(&mut self) {
        let fresh = std::mem::take(&mut self.fresh_dev_cards);
        self.dev_cards.add(&fresh);
        self.has_rolled = false;
        self.has_played_dev_card_this_turn = false;
    }

    pub fn buy_dev_card(&mut self, card: DevelopmentCard) {
        self.fresh_dev_cards.replenish(1, card);
    }

    pub fn can_play_dev_card(&self, card: DevelopmentCard) -> bool {
        card != DevelopmentCard::VictoryPoint
            && !self.has_played_dev_card_this_turn
            && self.dev_cards.get(card) > 0
    }

    /// Moves a playable card to the played pile and spends this turn's play.
    pub fn play_dev_card(&mut self, card: DevelopmentCard) -> Result<(), FreqdeckError> {
        self.dev_cards.draw(1, card)?;
        self.played_dev_cards.replenish(1, card);
        self.has_played_dev_card_this_turn = true;
        Ok(())
    }

    pub fn knights_played(&self) -> u8 {
        self.played_dev_cards.get(DevelopmentCard::Knight)
    }

    /// Unplayed cards in hand, fresh ones included.
    pub fn dev_cards_in_hand(&self) -> DevDeck {
        let mut all = self.dev_cards;
        all.add(&self.fresh_dev_cards);
        all
    }

    pub fn upgrade_to_city(&mut self, node: NodeId) -> bool {
        match self.settlements.iter().position(|n| *n == node) {
            Some(position) => {
                self.settlements.remove(position);
                self.cities.push(node);
                true
            }
            None => false,
        }
    }

    pub fn roads_available(&self) -> usize {
        MAX_ROADS.saturating_sub(self.roads.len())
    }

    pub fn settlements_available(&self) -> usize {
        MAX_SETTLEMENTS.saturating_sub(self.settlements.len())
    }

    pub fn cities_available(&self) -> usize {
        MAX_CITIES.saturating_sub(self.cities.len())
    }

    /// Settlements, cities and titles; what every seat can see.
    pub fn public_points(&self) -> u8 {
        let settlement_points = self.settlements.len() as u8;
        let city_points = (self.cities.len() as u8) * 2;
        settlement_points + city_points + self.bonus_points()
    }

    /// Public points plus hidden victory-point cards.
    pub fn total_points(&self) -> u8 {
        self.public_points() + self.dev_cards_in_hand().get(DevelopmentCard::VictoryPoint)
    }

    pub fn bonus_points(&self) -> u8 {
        let mut bonus = 0;
        if self.has_longest_road {
            bonus += 2;
        }
        if self.has_largest_army {
            bonus += 2;
        }
        bonus
    }
}
