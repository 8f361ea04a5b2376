//! Port events and the ordered queue feeding the engine.
//!
//! Every port controller pushes into one FIFO queue, so events from the same
//! port reach the engine in the order they happened. Events from different
//! ports interleave in tick order and carry no ordering promise.

use std::collections::VecDeque;

use crate::cards::LogicalCard;
use crate::core::{GameError, PhysicalCardId, PortId};

/// Something a card port observed or finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortEvent {
    /// A tag passed the debounce window.
    CardIdentified { port: PortId, id: PhysicalCardId },

    /// The card shows its assigned value.
    CardReady {
        port: PortId,
        id: PhysicalCardId,
        card: LogicalCard,
    },

    /// A render was cancelled because the card left the port.
    RenderAborted { port: PortId, id: PhysicalCardId },

    /// Every render attempt failed; the card keeps a stale face.
    RenderFailed {
        port: PortId,
        id: PhysicalCardId,
        card: LogicalCard,
        attempts: u32,
    },

    /// An identified card left the port.
    CardRemoved { port: PortId, id: PhysicalCardId },

    /// The RFID reader kept failing on this port.
    IdentifyFailed { port: PortId },
}

impl PortEvent {
    /// The port that produced the event.
    #[must_use]
    pub fn port(&self) -> PortId {
        match self {
            PortEvent::CardIdentified { port, .. }
            | PortEvent::CardReady { port, .. }
            | PortEvent::RenderAborted { port, .. }
            | PortEvent::RenderFailed { port, .. }
            | PortEvent::CardRemoved { port, .. }
            | PortEvent::IdentifyFailed { port } => *port,
        }
    }

    /// The physical card involved, if any.
    #[must_use]
    pub fn card_id(&self) -> Option<PhysicalCardId> {
        match self {
            PortEvent::CardIdentified { id, .. }
            | PortEvent::CardReady { id, .. }
            | PortEvent::RenderAborted { id, .. }
            | PortEvent::RenderFailed { id, .. }
            | PortEvent::CardRemoved { id, .. } => Some(*id),
            PortEvent::IdentifyFailed { .. } => None,
        }
    }

    /// The hardware error behind an exhausted render, if this is one.
    #[must_use]
    pub fn fault(&self) -> Option<GameError> {
        match self {
            PortEvent::RenderFailed { port, attempts, .. } => Some(GameError::HardwareTimeout {
                port: *port,
                attempts: *attempts,
            }),
            _ => None,
        }
    }
}

/// FIFO of port events.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: VecDeque<PortEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PortEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<PortEvent> {
        self.events.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = PortEvent> + '_ {
        self.events.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortEvent> {
        self.events.iter()
    }
}
