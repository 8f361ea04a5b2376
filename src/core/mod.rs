//! Core types: identifiers, seats, errors, RNG, clock, configuration.
//!
//! Nothing here knows about specific games or hardware; the other modules
//! build on these.

pub mod ids;
pub mod player;
pub mod rng;
pub mod clock;
pub mod config;
pub mod error;

pub use ids::{PhysicalCardId, PortId};
pub use player::{PlayerId, PlayerMap, MAX_PLAYERS, MIN_PLAYERS};
pub use rng::GameRng;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineSettings, PortTimings};
pub use error::{GameError, Result};
