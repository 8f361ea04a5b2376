//! Hardware-facing identifiers.
//!
//! ## PhysicalCardId
//!
//! The RFID tag UID of an e-paper card. Software never chooses these; they are
//! discovered by polling a card port. The engine treats them as opaque keys.
//!
//! ## PortId
//!
//! Index of a card port. Seat ports are numbered like players (port 0 is
//! player 0's slot); a shared dealer port, when present, comes after them.

use serde::{Deserialize, Serialize};

/// RFID tag identifier of a physical card.
///
/// ```
/// use digital_deck::core::PhysicalCardId;
///
/// let tag = PhysicalCardId::new(0x04A2_1B3C);
/// assert_eq!(tag.raw(), 0x04A2_1B3C);
/// assert_eq!(format!("{}", tag), "tag:0000000004a21b3c");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicalCardId(pub u64);

impl PhysicalCardId {
    /// Wrap a raw tag UID.
    #[must_use]
    pub const fn new(uid: u64) -> Self {
        Self(uid)
    }

    /// Get the raw tag UID.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PhysicalCardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tag:{:016x}", self.0)
    }
}

/// Card port identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortId(pub u8);

impl PortId {
    /// Create a port ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw port index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Port {}", self.0)
    }
}
