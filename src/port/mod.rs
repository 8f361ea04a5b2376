//! Card ports: hardware interfaces, per-port state machines, and events.
//!
//! ## Key Types
//!
//! - `RfidReader` / `EpaperDisplay`: Collaborator traits for the devices
//! - `PortController`: Empty → Detected → Identified → Rendering → Settled
//! - `PortEvent` / `EventQueue`: Ordered events consumed by the engine
//! - `SimulatedRfid` / `SimulatedDisplay`: Scriptable devices on virtual time

pub mod hardware;
pub mod event;
pub mod controller;
pub mod sim;

pub use hardware::{CardRenderer, EpaperDisplay, HardwareFault, Immediate, RenderStatus, RfidReader};
pub use event::{EventQueue, PortEvent};
pub use controller::{PortController, PortState};
pub use sim::{SimulatedDisplay, SimulatedRfid};
