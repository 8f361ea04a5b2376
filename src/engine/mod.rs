//! Game session: state, engine and saved games.
//!
//! ## Key Types
//!
//! - `GameState`: Authoritative, serializable game state
//! - `GameEngine`: Phases, plays, rounds and the port control loop
//! - `Snapshot`: Versioned save format

pub mod state;
pub mod game;
pub mod persist;

pub use state::{GameState, Hand, Phase, Play, Player};
pub use game::{DealReport, EngineEvent, GameEngine, PlayOutcome, RoundSummary};
pub use persist::{Snapshot, SNAPSHOT_FORMAT};
