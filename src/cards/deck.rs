//! The undealt card pile.
//!
//! A `Deck` keeps the variant's fixed card set alongside the cards still
//! waiting to be dealt. The top of the deck is index 0. Both sequences are
//! `im` vectors, so cloning a deck for a snapshot is O(1).

use im::Vector;
use serde::{Deserialize, Serialize};

use super::card::LogicalCard;
use super::definition::DeckSpec;
use crate::core::{GameError, GameRng, Result};

/// Ordered pile of logical cards not yet dealt.
///
/// ```
/// use digital_deck::cards::{Deck, DeckSpec};
///
/// let mut deck = Deck::build(&DeckSpec::spanish()).unwrap();
/// deck.shuffle(Some(42));
/// let hand = deck.draw(3).unwrap();
/// assert_eq!(hand.len(), 3);
/// assert_eq!(deck.remaining(), 37);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    name: String,
    cards: Vector<LogicalCard>,
    full_set: Vector<LogicalCard>,
    shuffle_seed: Option<u64>,
}

impl Deck {
    /// Build the fixed card set for a deck definition, in canonical order.
    pub fn build(spec: &DeckSpec) -> Result<Self> {
        let full_set: Vector<LogicalCard> = spec.cards()?.into_iter().collect();
        Ok(Self {
            name: spec.name.clone(),
            cards: full_set.clone(),
            full_set,
            shuffle_seed: None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shuffle the remaining cards.
    ///
    /// Deterministic for a given seed and starting order. Returns the seed
    /// actually used, which is random when `seed` is `None`.
    pub fn shuffle(&mut self, seed: Option<u64>) -> u64 {
        let mut rng = match seed {
            Some(seed) => GameRng::new(seed),
            None => GameRng::from_entropy(),
        };
        let mut cards: Vec<LogicalCard> = self.cards.iter().cloned().collect();
        rng.shuffle(&mut cards);
        self.cards = cards.into_iter().collect();
        self.shuffle_seed = Some(rng.seed());
        rng.seed()
    }

    /// Remove and return the top `n` cards.
    ///
    /// On `EmptyDeck` the deck is left untouched.
    pub fn draw(&mut self, n: usize) -> Result<Vec<LogicalCard>> {
        if n > self.cards.len() {
            return Err(GameError::EmptyDeck {
                requested: n,
                remaining: self.cards.len(),
            });
        }
        let rest = self.cards.split_off(n);
        let drawn = std::mem::replace(&mut self.cards, rest);
        Ok(drawn.into_iter().collect())
    }

    /// Cards left to draw.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The bottom card, which some games turn up as trump.
    #[must_use]
    pub fn peek_bottom(&self) -> Option<&LogicalCard> {
        self.cards.back()
    }

    /// Return cards to the bottom of the deck, in the given order.
    pub fn put_bottom(&mut self, cards: impl IntoIterator<Item = LogicalCard>) {
        self.cards.extend(cards);
    }

    /// Restore the full set in canonical order and forget the shuffle seed.
    pub fn reset(&mut self) {
        self.cards = self.full_set.clone();
        self.shuffle_seed = None;
    }

    /// Remaining cards, top first.
    pub fn cards(&self) -> impl Iterator<Item = &LogicalCard> {
        self.cards.iter()
    }

    /// The fixed card set this deck was built from.
    pub fn full_set(&self) -> impl Iterator<Item = &LogicalCard> {
        self.full_set.iter()
    }

    /// Size of the fixed card set.
    #[must_use]
    pub fn size(&self) -> usize {
        self.full_set.len()
    }

    /// Seed of the most recent shuffle.
    #[must_use]
    pub fn shuffle_seed(&self) -> Option<u64> {
        self.shuffle_seed
    }
}
