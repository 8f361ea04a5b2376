//! Data-driven variant configuration.
//!
//! A `VariantConfig` carries everything that differs between games short of
//! the resolution logic itself: deck, seats, hand size, plays per turn,
//! capture rule, refill, trump, target score and round cap. `rules` picks
//! the resolution logic. Configs load from JSON:
//!
//! ```
//! use digital_deck::rules::VariantConfig;
//!
//! let json = r#"{
//!     "id": "quick-war",
//!     "name": "Quick War",
//!     "rules": "war",
//!     "deck": "standard",
//!     "hand_size": "split_deck",
//!     "capture": "hand_bottom",
//!     "max_rounds": 50
//! }"#;
//! let config = VariantConfig::from_json(json).unwrap();
//! assert_eq!(config.max_rounds, Some(50));
//! assert_eq!(config.plays_per_turn, 1);
//! ```
//!
//! A `VariantCatalog` maps ids to configs and ships the five built-ins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::blackjack::Blackjack;
use super::brisca::Brisca;
use super::go_fish::GoFish;
use super::poker::Poker;
use super::variant::GameVariant;
use super::war::War;
use crate::cards::{Deck, DeckSpec};
use crate::core::{GameError, Result, MAX_PLAYERS, MIN_PLAYERS};

/// Which resolution logic a variant uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    War,
    Brisca,
    Poker,
    Blackjack,
    GoFish,
}

/// How many cards each seat is dealt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSize {
    /// The same count for every table size.
    Fixed(usize),
    /// The whole deck split evenly; the remainder stays undealt.
    SplitDeck,
    /// One count for two seats, another for three or more.
    ByPlayers { two: usize, more: usize },
}

impl HandSize {
    #[must_use]
    pub fn resolve(self, player_count: usize, deck_size: usize) -> usize {
        match self {
            HandSize::Fixed(n) => n,
            HandSize::SplitDeck => deck_size / player_count.max(1),
            HandSize::ByPlayers { two, more } => {
                if player_count <= 2 {
                    two
                } else {
                    more
                }
            }
        }
    }
}

/// Where a round winner's captured cards go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureRule {
    /// Bottom of the winner's hand, to be played again.
    HandBottom,
    /// The winner's won pile, out of play.
    WonPile,
    /// The discard pile; winning only scores.
    Discard,
}

/// Deck reference: a bundled deck name or an inline definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeckSource {
    Builtin(String),
    Inline(DeckSpec),
}

fn default_min_players() -> usize {
    MIN_PLAYERS
}

fn default_max_players() -> usize {
    MAX_PLAYERS
}

fn default_plays_per_turn() -> usize {
    1
}

/// Configuration for one game variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub id: String,

    pub name: String,

    pub rules: RuleSet,

    pub deck: DeckSource,

    #[serde(default = "default_min_players")]
    pub min_players: usize,

    #[serde(default = "default_max_players")]
    pub max_players: usize,

    pub hand_size: HandSize,

    #[serde(default = "default_plays_per_turn")]
    pub plays_per_turn: usize,

    pub capture: CaptureRule,

    /// After each round, top hands back up to this size while the deck lasts.
    #[serde(default)]
    pub refill_to: Option<usize>,

    /// Turn up the deck's bottom card and use its suit as trump.
    #[serde(default)]
    pub trump_from_bottom: bool,

    /// First seat to reach this score ends the game.
    #[serde(default)]
    pub target_score: Option<i64>,

    /// Game ends after this many rounds.
    #[serde(default)]
    pub max_rounds: Option<u32>,

    /// Per-rank point overrides applied on top of the deck's table.
    #[serde(default)]
    pub points: BTreeMap<String, i64>,

    /// Rank strength override, weakest first.
    #[serde(default)]
    pub strength: Option<Vec<String>>,
}

impl VariantConfig {
    /// Parse and validate a variant definition.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GameError::config(format!("variant definition: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Deck definition with this variant's overrides applied.
    pub fn deck_spec(&self) -> Result<DeckSpec> {
        let mut spec = match &self.deck {
            DeckSource::Builtin(name) => DeckSpec::builtin(name)?,
            DeckSource::Inline(spec) => spec.clone(),
        };
        spec.points.extend(self.points.iter().map(|(k, v)| (k.clone(), *v)));
        if let Some(strength) = &self.strength {
            spec.strength = Some(strength.clone());
        }
        Ok(spec)
    }

    /// Build this variant's fixed card set.
    pub fn build_deck(&self) -> Result<Deck> {
        Deck::build(&self.deck_spec()?)
    }

    /// Check the configuration on its own.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(GameError::config("variant id must not be empty"));
        }
        if self.min_players < MIN_PLAYERS
            || self.max_players > MAX_PLAYERS
            || self.min_players > self.max_players
        {
            return Err(GameError::config(format!(
                "variant '{}': seats must lie within {MIN_PLAYERS}..={MAX_PLAYERS}",
                self.id
            )));
        }
        if self.plays_per_turn == 0 {
            return Err(GameError::config(format!(
                "variant '{}': plays_per_turn must be at least 1",
                self.id
            )));
        }
        if let Some(refill) = self.refill_to {
            if refill < self.plays_per_turn {
                return Err(GameError::config(format!(
                    "variant '{}': refill_to is smaller than plays_per_turn",
                    self.id
                )));
            }
        }
        self.build_deck().map(|_| ())
    }

    /// Check that this variant can be dealt to `player_count` seats from a
    /// `deck_size` card set.
    pub fn check_table(&self, player_count: usize, deck_size: usize) -> Result<()> {
        if player_count < self.min_players || player_count > self.max_players {
            return Err(GameError::config(format!(
                "{} needs {}-{} players, got {player_count}",
                self.name, self.min_players, self.max_players
            )));
        }
        let hand = self.hand_size.resolve(player_count, deck_size);
        if hand < self.plays_per_turn {
            return Err(GameError::config(format!(
                "{}: a hand of {hand} cannot make a turn of {}",
                self.name, self.plays_per_turn
            )));
        }
        if hand * player_count > deck_size {
            return Err(GameError::config(format!(
                "{}: dealing {hand} to {player_count} seats needs more than {deck_size} cards",
                self.name
            )));
        }
        Ok(())
    }

    /// The rules object for this configuration.
    #[must_use]
    pub fn into_variant(self) -> Box<dyn GameVariant> {
        match self.rules {
            RuleSet::War => Box::new(War::new(self)),
            RuleSet::Brisca => Box::new(Brisca::new(self)),
            RuleSet::Poker => Box::new(Poker::new(self)),
            RuleSet::Blackjack => Box::new(Blackjack::new(self)),
            RuleSet::GoFish => Box::new(GoFish::new(self)),
        }
    }

    fn base(id: &str, name: &str, rules: RuleSet, deck: &str, hand_size: HandSize, capture: CaptureRule) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            rules,
            deck: DeckSource::Builtin(deck.to_string()),
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
            hand_size,
            plays_per_turn: 1,
            capture,
            refill_to: None,
            trump_from_bottom: false,
            target_score: None,
            max_rounds: None,
            points: BTreeMap::new(),
            strength: None,
        }
    }

    /// War: split the deck, higher card takes both to the bottom of its stack.
    #[must_use]
    pub fn war() -> Self {
        Self {
            max_rounds: Some(5000),
            ..Self::base("war", "War", RuleSet::War, "standard", HandSize::SplitDeck, CaptureRule::HandBottom)
        }
    }

    /// Brisca on the Spanish deck: three cards, trump from the bottom card.
    #[must_use]
    pub fn brisca() -> Self {
        Self {
            refill_to: Some(3),
            trump_from_bottom: true,
            ..Self::base("brisca", "Brisca", RuleSet::Brisca, "spanish", HandSize::Fixed(3), CaptureRule::WonPile)
        }
    }

    /// Showdown poker: five cards each, best hand takes a point.
    #[must_use]
    pub fn poker() -> Self {
        Self {
            plays_per_turn: 5,
            refill_to: Some(5),
            target_score: Some(3),
            ..Self::base("poker", "Poker", RuleSet::Poker, "standard", HandSize::Fixed(5), CaptureRule::Discard)
        }
    }

    /// Blackjack showdown: two cards each, closest to 21 takes a point.
    #[must_use]
    pub fn blackjack() -> Self {
        let mut points = BTreeMap::new();
        points.insert("A".to_string(), 11);
        Self {
            plays_per_turn: 2,
            refill_to: Some(2),
            target_score: Some(5),
            points,
            ..Self::base(
                "blackjack",
                "Blackjack",
                RuleSet::Blackjack,
                "standard",
                HandSize::Fixed(2),
                CaptureRule::Discard,
            )
        }
    }

    /// Go Fish: ask for a rank, collect books of four.
    #[must_use]
    pub fn go_fish() -> Self {
        Self {
            // An emptied hand draws one card while the deck lasts.
            refill_to: Some(1),
            ..Self::base(
                "go_fish",
                "Go Fish",
                RuleSet::GoFish,
                "standard",
                HandSize::ByPlayers { two: 7, more: 5 },
                CaptureRule::HandBottom,
            )
        }
    }
}

/// Variant configs by id.
#[derive(Clone, Debug, Default)]
pub struct VariantCatalog {
    configs: BTreeMap<String, VariantConfig>,
}

impl VariantCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with War, Brisca, Poker, Blackjack and Go Fish.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for config in [
            VariantConfig::war(),
            VariantConfig::brisca(),
            VariantConfig::poker(),
            VariantConfig::blackjack(),
            VariantConfig::go_fish(),
        ] {
            catalog.configs.insert(config.id.clone(), config);
        }
        catalog
    }

    /// Add or replace a variant after validating it.
    pub fn register(&mut self, config: VariantConfig) -> Result<()> {
        config.validate()?;
        self.configs.insert(config.id.clone(), config);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&VariantConfig> {
        self.configs
            .get(id)
            .ok_or_else(|| GameError::config(format!("unknown variant '{id}'")))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
