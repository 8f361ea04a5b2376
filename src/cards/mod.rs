//! Card system: logical values, deck definitions, decks, and the registry.
//!
//! ## Key Types
//!
//! - `LogicalCard`: Suit/rank value the rules see
//! - `DeckSpec`: Declarative card set (suits by color, ranks, points)
//! - `Deck`: Undealt cards for the active game
//! - `CardRegistry`: Physical card → logical card bindings

pub mod card;
pub mod definition;
pub mod deck;
pub mod registry;

pub use card::{CardMeta, LogicalCard, Rank, Suit};
pub use definition::{CustomCard, DeckSpec, SuitGroup};
pub use deck::Deck;
pub use registry::{CardBinding, CardRegistry};
