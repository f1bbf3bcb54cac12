use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::types::{DevelopmentCard, Resource};

/// Closed five-element card enumeration a freqdeck can count.
pub trait CardKind: Copy + Eq + fmt::Display + 'static {
    const KINDS: [Self; 5];

    fn slot(self) -> usize;
}

impl CardKind for Resource {
    const KINDS: [Self; 5] = Resource::ALL;

    fn slot(self) -> usize {
        self.index()
    }
}

impl CardKind for DevelopmentCard {
    const KINDS: [Self; 5] = DevelopmentCard::ALL;

    fn slot(self) -> usize {
        self.index()
    }
}

/// Fixed-size counter vector over one card enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Freqdeck<K = Resource> {
    counts: [u8; 5],
    #[serde(skip)]
    kind: PhantomData<K>,
}

pub type DevDeck = Freqdeck<DevelopmentCard>;

impl<K> Default for Freqdeck<K> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<K> Freqdeck<K> {
    pub const fn from_counts(counts: [u8; 5]) -> Self {
        Self {
            counts,
            kind: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::from_counts([0; 5])
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&v| v as u32).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&value| value == 0)
    }

    pub fn counts(&self) -> [u8; 5] {
        self.counts
    }

    /// Pairwise `>=`.
    pub fn contains(&self, other: &Freqdeck<K>) -> bool {
        self.counts
            .iter()
            .zip(other.counts.iter())
            .all(|(have, need)| have >= need)
    }

    pub fn add(&mut self, other: &Freqdeck<K>) {
        for (slot, value) in self.counts.iter_mut().zip(other.counts) {
            *slot = slot.saturating_add(value);
        }
    }

    pub fn subtract(&mut self, other: &Freqdeck<K>) -> Result<(), FreqdeckError> {
        if !self.contains(other) {
            return Err(FreqdeckError::InsufficientBundle);
        }
        for (slot, value) in self.counts.iter_mut().zip(other.counts) {
            *slot -= value;
        }
        Ok(())
    }

    /// True when no slot is positive in both decks.
    pub fn is_disjoint(&self, other: &Freqdeck<K>) -> bool {
        self.counts
            .iter()
            .zip(other.counts.iter())
            .all(|(a, b)| *a == 0 || *b == 0)
    }
}

impl<K: CardKind> Freqdeck<K> {
    pub fn get(&self, kind: K) -> u8 {
        self.counts[kind.slot()]
    }

    pub fn can_draw(&self, amount: u8, kind: K) -> bool {
        self.get(kind) >= amount
    }

    pub fn replenish(&mut self, amount: u8, kind: K) {
        let slot = &mut self.counts[kind.slot()];
        *slot = slot.saturating_add(amount);
    }

    pub fn draw(&mut self, amount: u8, kind: K) -> Result<(), FreqdeckError> {
        let slot = &mut self.counts[kind.slot()];
        if *slot < amount {
            return Err(FreqdeckError::InsufficientSupply {
                kind: kind.to_string(),
                available: *slot,
                requested: amount,
            });
        }
        *slot -= amount;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, u8)> + '_ {
        K::KINDS.into_iter().zip(self.counts.iter().copied())
    }

    pub fn from_listdeck<I: IntoIterator<Item = K>>(cards: I) -> Self {
        let mut deck = Self::zero();
        for card in cards {
            deck.replenish(1, card);
        }
        deck
    }

    /// Expands the counts into a card list in kind order.
    pub fn to_listdeck(&self) -> Vec<K> {
        self.iter()
            .flat_map(|(kind, amount)| std::iter::repeat(kind).take(amount as usize))
            .collect()
    }

    pub fn single(kind: K, amount: u8) -> Self {
        let mut deck = Self::zero();
        deck.replenish(amount, kind);
        deck
    }
}

impl<K: CardKind> fmt::Display for Freqdeck<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .filter(|(_, amount)| *amount > 0)
            .map(|(kind, amount)| format!("{amount}x{kind}"))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FreqdeckError {
    #[error("insufficient {kind}: have {available}, need {requested}")]
    InsufficientSupply {
        kind: String,
        available: u8,
        requested: u8,
    },
    #[error("insufficient cards to cover bundle")]
    InsufficientBundle,
}

pub const STARTING_BANK: Freqdeck = Freqdeck::from_counts([19, 19, 19, 19, 19]);
pub const COST_ROAD: Freqdeck = Freqdeck::from_counts([1, 1, 0, 0, 0]);
pub const COST_SETTLEMENT: Freqdeck = Freqdeck::from_counts([1, 1, 1, 1, 0]);
pub const COST_CITY: Freqdeck = Freqdeck::from_counts([0, 0, 0, 2, 3]);
pub const COST_DEVELOPMENT: Freqdeck = Freqdeck::from_counts([0, 0, 1, 1, 1]);
