//! Declarative deck definitions.
//!
//! A `DeckSpec` describes a card set the way the deck files under `decks/`
//! do: suits grouped by display color, a `value_list` of ranks, and optional
//! rank strength and point tables. The full set is suits × ranks plus any
//! `custom` cards (jokers and the like).
//!
//! ```
//! use digital_deck::cards::DeckSpec;
//!
//! let spec = DeckSpec::standard();
//! let cards = spec.cards().unwrap();
//! assert_eq!(cards.len(), 52);
//! assert_eq!(cards[0].face_text(), "Red A Hearts");
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::card::{CardMeta, LogicalCard};
use crate::core::{GameError, Result};

const STANDARD_DECK: &str = include_str!("../../decks/standard.json");
const SPANISH_DECK: &str = include_str!("../../decks/spanish.json");

/// Suits sharing a display color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitGroup {
    #[serde(default)]
    pub color: Option<String>,
    pub suits: Vec<String>,
}

/// A card outside the suits × ranks grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCard {
    pub suit: String,
    pub rank: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub points: i64,
}

/// Deck composition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSpec {
    pub name: String,

    /// Expected card count; checked against the built set when present.
    #[serde(default)]
    pub size: Option<usize>,

    #[serde(default)]
    pub suits: Vec<SuitGroup>,

    /// Ranks in build order.
    #[serde(rename = "value_list", alias = "ranks", default)]
    pub ranks: Vec<String>,

    /// Ranks from weakest to strongest. Defaults to `value_list` order.
    #[serde(default)]
    pub strength: Option<Vec<String>>,

    /// Points per rank; unlisted ranks score zero.
    #[serde(default)]
    pub points: BTreeMap<String, i64>,

    #[serde(default)]
    pub custom: Vec<CustomCard>,
}

impl DeckSpec {
    /// The 52-card French deck.
    #[must_use]
    pub fn standard() -> Self {
        Self::builtin("standard").expect("bundled standard deck is valid JSON")
    }

    /// The 40-card Spanish deck.
    #[must_use]
    pub fn spanish() -> Self {
        Self::builtin("spanish").expect("bundled spanish deck is valid JSON")
    }

    /// Look up a bundled deck by name.
    pub fn builtin(name: &str) -> Result<Self> {
        match name {
            "standard" => Self::from_json(STANDARD_DECK),
            "spanish" => Self::from_json(SPANISH_DECK),
            other => Err(GameError::config(format!("unknown deck '{other}'"))),
        }
    }

    /// Parse a deck definition.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GameError::config(format!("deck definition: {e}")))
    }

    /// Strength index per rank.
    fn strength_table(&self) -> Result<FxHashMap<&str, u8>> {
        let order = self.strength.as_ref().unwrap_or(&self.ranks);

        if self.strength.is_some() {
            let listed: FxHashSet<&str> = order.iter().map(String::as_str).collect();
            let ranks: FxHashSet<&str> = self.ranks.iter().map(String::as_str).collect();
            if listed != ranks || order.len() != self.ranks.len() {
                return Err(GameError::config(format!(
                    "deck '{}': strength must list each rank exactly once",
                    self.name
                )));
            }
        }
        if order.len() > usize::from(u8::MAX) {
            return Err(GameError::config(format!("deck '{}': too many ranks", self.name)));
        }

        Ok(order
            .iter()
            .enumerate()
            .map(|(i, rank)| (rank.as_str(), i as u8))
            .collect())
    }

    /// Build the full card set, validating the definition.
    ///
    /// Fails with `Config` when the definition yields no cards, repeats a
    /// (suit, rank) pair, has an inconsistent strength table, or disagrees
    /// with its declared `size`.
    pub fn cards(&self) -> Result<Vec<LogicalCard>> {
        let strength = self.strength_table()?;
        let grid_suits: usize = self.suits.iter().map(|g| g.suits.len()).sum();
        let mut cards = Vec::with_capacity(grid_suits * self.ranks.len() + self.custom.len());

        for group in &self.suits {
            for suit in &group.suits {
                for rank in &self.ranks {
                    let meta = CardMeta {
                        color: group.color.clone(),
                        strength: strength.get(rank.as_str()).copied().unwrap_or(0),
                        points: self.points.get(rank).copied().unwrap_or(0),
                    };
                    cards.push(LogicalCard::with_meta(suit.clone(), rank.clone(), meta));
                }
            }
        }

        for custom in &self.custom {
            let meta = CardMeta {
                color: custom.color.clone(),
                strength: strength.get(custom.rank.as_str()).copied().unwrap_or(0),
                points: custom.points,
            };
            cards.push(LogicalCard::with_meta(custom.suit.clone(), custom.rank.clone(), meta));
        }

        if cards.is_empty() {
            return Err(GameError::config(format!("deck '{}' has no cards", self.name)));
        }

        let mut seen = FxHashSet::default();
        for card in &cards {
            if !seen.insert(card) {
                return Err(GameError::config(format!(
                    "deck '{}' repeats {}",
                    self.name, card
                )));
            }
        }

        if let Some(size) = self.size {
            if size != cards.len() {
                return Err(GameError::config(format!(
                    "deck '{}' declares {} cards but defines {}",
                    self.name,
                    size,
                    cards.len()
                )));
            }
        }

        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sizes() {
        assert_eq!(DeckSpec::standard().cards().unwrap().len(), 52);
        assert_eq!(DeckSpec::spanish().cards().unwrap().len(), 40);
        assert!(DeckSpec::builtin("tarot").is_err());
    }

    #[test]
    fn test_standard_strength_ace_high() {
        let cards = DeckSpec::standard().cards().unwrap();
        let ace = cards.iter().find(|c| c.rank().as_str() == "A").unwrap();
        let king = cards.iter().find(|c| c.rank().as_str() == "K").unwrap();
        let two = cards.iter().find(|c| c.rank().as_str() == "2").unwrap();
        assert!(ace.strength() > king.strength());
        assert!(king.strength() > two.strength());
    }

    #[test]
    fn test_spanish_points() {
        let cards = DeckSpec::spanish().cards().unwrap();
        let total: i64 = cards.iter().map(LogicalCard::points).sum();
        assert_eq!(total, 120);
    }

    #[test]
    fn test_empty_deck_rejected() {
        let spec = DeckSpec::from_json(r#"{ "name": "empty" }"#).unwrap();
        assert!(matches!(spec.cards(), Err(GameError::Config(_))));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut spec = DeckSpec::standard();
        spec.size = Some(54);
        assert!(matches!(spec.cards(), Err(GameError::Config(_))));
    }

    #[test]
    fn test_duplicate_suit_rejected() {
        let mut spec = DeckSpec::standard();
        spec.size = None;
        spec.suits[0].suits.push("Hearts".into());
        assert!(matches!(spec.cards(), Err(GameError::Config(_))));
    }

    #[test]
    fn test_bad_strength_rejected() {
        let mut spec = DeckSpec::standard();
        spec.strength = Some(vec!["A".into(), "K".into()]);
        assert!(matches!(spec.cards(), Err(GameError::Config(_))));
    }

    #[test]
    fn test_custom_cards() {
        let json = r#"{
            "name": "jokers",
            "suits": [ { "suits": ["Stars"] } ],
            "ranks": ["1", "2"],
            "custom": [ { "suit": "Joker", "rank": "Big", "points": 50 } ]
        }"#;
        let cards = DeckSpec::from_json(json).unwrap().cards().unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[2].points(), 50);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(DeckSpec::from_json("{ nope"), Err(GameError::Config(_))));
    }
}
