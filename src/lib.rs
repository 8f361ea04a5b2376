//! # digital-deck
//!
//! Game engine and card synchronization for a tabletop system whose playing
//! cards are RFID-tagged e-paper displays.
//!
//! ## Design Principles
//!
//! 1. **Logical vs physical**: Rules only ever see `LogicalCard`s. A small
//!    set of physical cards per seat ("carriers") is re-rendered to show
//!    whatever the hand holds.
//!
//! 2. **Game-agnostic engine**: Turn order, card movement, scoring and
//!    synchronization live in the engine. Variants plug in through the
//!    `GameVariant` hooks and a data-driven `VariantConfig`.
//!
//! 3. **Never block the table**: Card ports are non-blocking state machines
//!    ticked from one control loop. Renders are submitted and polled, so a
//!    slow card on one port never stalls another.
//!
//! ## Architecture
//!
//! - **One ordered event queue**: Ports push `PortEvent`s into a single FIFO
//!   drained by the engine, preserving per-port order.
//!
//! - **Per-card exclusion**: The registry holds a lock per physical card for
//!   the whole render sequence; the engine never reassigns a card mid-render.
//!
//! - **Persistent data structures**: O(1) state clones via `im` for saves.
//!
//! ## Modules
//!
//! - `core`: Identifiers, seats, errors, RNG, clock, settings
//! - `cards`: Logical cards, deck definitions, decks, registry
//! - `port`: Hardware traits, port state machine, events, simulators
//! - `rules`: Variant hooks, configs, and the built-in games
//! - `engine`: Game state, engine, saved games

pub mod core;
pub mod cards;
pub mod port;
pub mod rules;
pub mod engine;

// Re-export commonly used types
pub use crate::core::{
    Clock, EngineSettings, GameError, GameRng, ManualClock, PhysicalCardId, PlayerId, PlayerMap, PortId,
    PortTimings, Result, SystemClock,
};

pub use crate::cards::{CardRegistry, Deck, DeckSpec, LogicalCard, Rank, Suit};

pub use crate::port::{
    EpaperDisplay, PortController, PortEvent, PortState, RenderStatus, RfidReader, SimulatedDisplay,
    SimulatedRfid,
};

pub use crate::rules::{GameResult, GameVariant, RoundOutcome, VariantCatalog, VariantConfig};

pub use crate::engine::{
    DealReport, EngineEvent, GameEngine, GameState, Phase, PlayOutcome, RoundSummary, Snapshot,
};
