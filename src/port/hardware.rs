//! Hardware collaborator interfaces.
//!
//! The engine talks to two devices per card port:
//!
//! - an RFID reader, polled on a fixed cadence, that is the only source of
//!   physical card identity;
//! - an e-paper writer, whose renders are slow and may fail.
//!
//! Renders are split into submit and poll so a port controller never blocks
//! the control loop. Devices that can only render synchronously implement
//! [`CardRenderer`] and are wrapped in [`Immediate`].

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::cards::LogicalCard;
use crate::core::{PhysicalCardId, PortId};

/// Low-level device failure. Port controllers retry these.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HardwareFault {
    #[error("device timed out")]
    Timeout,

    #[error("bus error: {0}")]
    Bus(String),

    #[error("no render in flight for {0}")]
    NoRender(PhysicalCardId),
}

/// RFID reader behind the card ports.
pub trait RfidReader {
    /// Non-blocking read of the tag in `port`, if any.
    fn poll(&mut self, port: PortId) -> Result<Option<PhysicalCardId>, HardwareFault>;
}

/// Progress of a submitted render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    InFlight,
    Done,
    Failed(HardwareFault),
}

/// E-paper writer behind the card ports.
pub trait EpaperDisplay {
    /// Start writing `card` onto the physical card sitting in `port`.
    fn begin_render(
        &mut self,
        port: PortId,
        id: PhysicalCardId,
        card: &LogicalCard,
    ) -> Result<(), HardwareFault>;

    /// Check on a render started with `begin_render`.
    fn poll_render(&mut self, port: PortId, id: PhysicalCardId) -> RenderStatus;

    /// Discard an in-flight render; its result must never be reported.
    fn abort_render(&mut self, port: PortId, id: PhysicalCardId);

    /// Blank the card's face.
    fn clear(&mut self, port: PortId, id: PhysicalCardId) -> Result<(), HardwareFault>;
}

/// A display that renders synchronously.
pub trait CardRenderer {
    fn render(&mut self, id: PhysicalCardId, card: &LogicalCard) -> Result<(), HardwareFault>;

    fn clear(&mut self, id: PhysicalCardId) -> Result<(), HardwareFault>;
}

/// Adapts a blocking [`CardRenderer`] to [`EpaperDisplay`].
///
/// The render runs inside `begin_render`; its outcome is reported by the next
/// `poll_render`.
#[derive(Debug, Default)]
pub struct Immediate<R> {
    renderer: R,
    outcomes: FxHashMap<PhysicalCardId, Result<(), HardwareFault>>,
}

impl<R: CardRenderer> Immediate<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            outcomes: FxHashMap::default(),
        }
    }

    pub fn inner(&self) -> &R {
        &self.renderer
    }
}

impl<R: CardRenderer> EpaperDisplay for Immediate<R> {
    fn begin_render(
        &mut self,
        _port: PortId,
        id: PhysicalCardId,
        card: &LogicalCard,
    ) -> Result<(), HardwareFault> {
        let outcome = self.renderer.render(id, card);
        self.outcomes.insert(id, outcome);
        Ok(())
    }

    fn poll_render(&mut self, _port: PortId, id: PhysicalCardId) -> RenderStatus {
        match self.outcomes.remove(&id) {
            Some(Ok(())) => RenderStatus::Done,
            Some(Err(fault)) => RenderStatus::Failed(fault),
            None => RenderStatus::Failed(HardwareFault::NoRender(id)),
        }
    }

    fn abort_render(&mut self, _port: PortId, id: PhysicalCardId) {
        self.outcomes.remove(&id);
    }

    fn clear(&mut self, _port: PortId, id: PhysicalCardId) -> Result<(), HardwareFault> {
        self.renderer.clear(id)
    }
}
