//! Game variants.
//!
//! Variants implement `GameVariant` to define:
//! - Deal size and play legality
//! - Round resolution and scoring
//! - When the game ends
//!
//! The engine calls into `GameVariant` but never interprets game-specific
//! concepts directly. Which variant runs, and with which deck and table
//! rules, is data: a `VariantConfig` looked up in a `VariantCatalog`.

pub mod variant;
pub mod config;
pub mod war;
pub mod brisca;
pub mod poker;
pub mod blackjack;
pub mod go_fish;

pub use variant::{GameResult, GameVariant, RoundOutcome, TableDisposition, Transfer};
pub use config::{CaptureRule, DeckSource, HandSize, RuleSet, VariantCatalog, VariantConfig};
pub use war::War;
pub use brisca::Brisca;
pub use poker::Poker;
pub use blackjack::Blackjack;
pub use go_fish::GoFish;
