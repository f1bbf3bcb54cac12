use rand::seq::SliceRandom;

use crate::game::freqdeck::{DevDeck, Freqdeck, FreqdeckError, STARTING_BANK};
use crate::types::{DevelopmentCard, Resource};

/// Resource supply plus the face-down development pile. The pile is shuffled
/// once and drawn from the back.
#[derive(Debug, Clone)]
pub struct Bank {
    resources: Freqdeck,
    development_deck: Vec<DevelopmentCard>,
}

impl Bank {
    pub fn standard(rng: &mut impl rand::Rng) -> Self {
        let mut deck = DEVELOPMENT_DECK.to_listdeck();
        deck.shuffle(rng);
        Self {
            resources: STARTING_BANK,
            development_deck: deck,
        }
    }

    pub fn resources(&self) -> &Freqdeck {
        &self.resources
    }

    pub fn receive(&mut self, bundle: &Freqdeck) {
        self.resources.add(bundle);
    }

    pub fn dispense(&mut self, bundle: &Freqdeck) -> Result<(), FreqdeckError> {
        self.resources.subtract(bundle)
    }

    pub fn available(&self, resource: Resource) -> u8 {
        self.resources.get(resource)
    }

    pub fn draw_development_card(&mut self) -> Option<DevelopmentCard> {
        self.development_deck.pop()
    }

    /// Takes a specific card out of the pile, as recorded in a replayed
    /// action. Returns `None` if no such card remains.
    pub fn take_development_card(&mut self, card: DevelopmentCard) -> Option<DevelopmentCard> {
        let position = self.development_deck.iter().rposition(|c| *c == card)?;
        Some(self.development_deck.remove(position))
    }

    pub fn development_deck_len(&self) -> usize {
        self.development_deck.len()
    }

    /// Counts of cards still face down in the pile.
    pub fn remaining_development_cards(&self) -> DevDeck {
        DevDeck::from_listdeck(self.development_deck.iter().copied())
    }
}

/// 14 knights, 2 year-of-plenty, 2 monopoly, 2 road building, 5 victory points.
pub const DEVELOPMENT_DECK: DevDeck = DevDeck::from_counts([14, 2, 2, 2, 5]);

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn standard_bank_is_full() {
        let mut rng = StdRng::seed_from_u64(0);
        let bank = Bank::standard(&mut rng);
        assert_eq!(bank.resources().total(), 95);
        assert_eq!(bank.development_deck_len(), 25);
        assert_eq!(bank.remaining_development_cards(), DEVELOPMENT_DECK);
    }

    #[test]
    fn same_seed_same_pile() {
        let mut a = Bank::standard(&mut StdRng::seed_from_u64(11));
        let mut b = Bank::standard(&mut StdRng::seed_from_u64(11));
        for _ in 0..25 {
            assert_eq!(a.draw_development_card(), b.draw_development_card());
        }
        assert_eq!(a.draw_development_card(), None);
    }

    #[test]
    fn take_specific_card() {
        let mut bank = Bank::standard(&mut StdRng::seed_from_u64(3));
        for _ in 0..2 {
            assert_eq!(
                bank.take_development_card(DevelopmentCard::Monopoly),
                Some(DevelopmentCard::Monopoly)
            );
        }
        assert_eq!(bank.take_development_card(DevelopmentCard::Monopoly), None);
        assert_eq!(bank.development_deck_len(), 23);
    }

    #[test]
    fn dispense_fails_without_mutation() {
        let mut bank = Bank::standard(&mut StdRng::seed_from_u64(0));
        let too_much = Freqdeck::single(Resource::Ore, 20);
        assert!(bank.dispense(&too_much).is_err());
        assert_eq!(bank.available(Resource::Ore), 19);
    }
}
