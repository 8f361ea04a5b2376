//! Saved games.
//!
//! A `Snapshot` is the game state plus the seat carrier lists, tagged with a
//! format number. The binary form is bincode; JSON is offered for
//! inspection and fixtures.

use serde::{Deserialize, Serialize};

use super::state::GameState;
use crate::core::{GameError, PhysicalCardId, PlayerMap, Result};

/// Snapshot layout version written by this build.
pub const SNAPSHOT_FORMAT: u32 = 1;

/// Everything needed to resume a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: u32,
    pub state: GameState,
    pub carriers: PlayerMap<Vec<PhysicalCardId>>,
}

impl Snapshot {
    #[must_use]
    pub fn new(state: GameState, carriers: PlayerMap<Vec<PhysicalCardId>>) -> Self {
        Self {
            format: SNAPSHOT_FORMAT,
            state,
            carriers,
        }
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Snapshot(e.to_string()))
    }

    /// Decode bytes written by [`Snapshot::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = bincode::deserialize(bytes).map_err(|e| GameError::Snapshot(e.to_string()))?;
        snapshot.check_format()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GameError::Snapshot(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json).map_err(|e| GameError::Snapshot(e.to_string()))?;
        snapshot.check_format()?;
        Ok(snapshot)
    }

    fn check_format(&self) -> Result<()> {
        if self.format != SNAPSHOT_FORMAT {
            return Err(GameError::config(format!(
                "unsupported snapshot format {} (expected {SNAPSHOT_FORMAT})",
                self.format
            )));
        }
        Ok(())
    }
}
