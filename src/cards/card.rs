//! Logical card values.
//!
//! A `LogicalCard` is the abstract playing-card value that game rules see,
//! independent of whichever physical card currently carries it. Suits and
//! ranks are names taken from the deck configuration, so the same type covers
//! French (`"Hearts"`, `"K"`) and Spanish (`"Oros"`, `"12"`) decks.
//!
//! Equality and hashing use only (suit, rank). The metadata (color, rank
//! strength, points) is derived from the deck configuration and carried along
//! for the variants.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Suit name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Suit(pub String);

impl Suit {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Suit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rank name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rank(pub String);

impl Rank {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Game-facing metadata attached to a card when its deck is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMeta {
    /// Display color, e.g. `"Red"`.
    pub color: Option<String>,

    /// Rank strength; higher beats lower.
    pub strength: u8,

    /// Point value used by scoring variants.
    pub points: i64,
}

/// An immutable playing-card value.
///
/// ```
/// use digital_deck::cards::{CardMeta, LogicalCard};
///
/// let ace = LogicalCard::new("Hearts", "A");
/// let same = LogicalCard::with_meta("Hearts", "A", CardMeta { strength: 12, ..CardMeta::default() });
/// assert_eq!(ace, same);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogicalCard {
    suit: Suit,
    rank: Rank,
    meta: CardMeta,
}

impl LogicalCard {
    /// A card with default metadata.
    pub fn new(suit: impl Into<String>, rank: impl Into<String>) -> Self {
        Self::with_meta(suit, rank, CardMeta::default())
    }

    pub fn with_meta(suit: impl Into<String>, rank: impl Into<String>, meta: CardMeta) -> Self {
        Self {
            suit: Suit(suit.into()),
            rank: Rank(rank.into()),
            meta,
        }
    }

    #[must_use]
    pub fn suit(&self) -> &Suit {
        &self.suit
    }

    #[must_use]
    pub fn rank(&self) -> &Rank {
        &self.rank
    }

    #[must_use]
    pub fn meta(&self) -> &CardMeta {
        &self.meta
    }

    #[must_use]
    pub fn strength(&self) -> u8 {
        self.meta.strength
    }

    #[must_use]
    pub fn points(&self) -> i64 {
        self.meta.points
    }

    /// Text sent to the e-paper controller, e.g. `"Red A Hearts"`.
    #[must_use]
    pub fn face_text(&self) -> String {
        match &self.meta.color {
            Some(color) => format!("{} {} {}", color, self.rank, self.suit),
            None => format!("{} {}", self.rank, self.suit),
        }
    }
}

impl PartialEq for LogicalCard {
    fn eq(&self, other: &Self) -> bool {
        self.suit == other.suit && self.rank == other.rank
    }
}

impl Eq for LogicalCard {}

impl Hash for LogicalCard {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.suit.hash(state);
        self.rank.hash(state);
    }
}

impl std::fmt::Display for LogicalCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {}", self.rank, self.suit)
    }
}
