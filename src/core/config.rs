//! Engine and port configuration.
//!
//! Both types deserialize from JSON so a deployment can tune hardware timing
//! without rebuilding. Missing fields fall back to the defaults below.
//!
//! ```
//! use digital_deck::core::EngineSettings;
//!
//! let settings = EngineSettings::from_json(r#"{ "players": 3, "dealer_port": true }"#).unwrap();
//! assert_eq!(settings.players, 3);
//! assert_eq!(settings.port_count(), 4);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{GameError, Result};
use super::player::{MAX_PLAYERS, MIN_PLAYERS};

/// Timing and retry policy for a card port.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortTimings {
    /// Continuous presence required before a tag is acted on.
    pub debounce: Duration,

    /// Longest a single e-paper write may take before it counts as failed.
    pub render_timeout: Duration,

    /// Render attempts (first try included) before `render_failed`.
    pub max_render_attempts: u32,

    /// Base delay between render attempts; doubles per failure.
    pub render_backoff: Duration,

    /// Consecutive RFID faults before `identify_failed`.
    pub max_poll_failures: u32,
}

impl Default for PortTimings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            render_timeout: Duration::from_secs(20),
            max_render_attempts: 3,
            render_backoff: Duration::from_millis(500),
            max_poll_failures: 5,
        }
    }
}

impl PortTimings {
    /// Delay before retry number `attempt` (1-based count of failures so far).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.render_backoff.saturating_mul(1u32 << shift)
    }
}

/// Session-wide engine settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Number of seats (2–4).
    pub players: usize,

    /// Physical cards each seat needs before a deal is complete.
    pub carriers_per_seat: usize,

    /// Add a shared dealer port after the seat ports.
    pub dealer_port: bool,

    /// How long `deal` waits for every carrier to report ready.
    pub deal_timeout: Duration,

    /// Control-loop cadence while waiting on hardware.
    pub poll_interval: Duration,

    /// Fixed shuffle seed; random per deal when `None`.
    pub shuffle_seed: Option<u64>,

    pub timings: PortTimings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            players: 2,
            carriers_per_seat: 1,
            dealer_port: false,
            deal_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(50),
            shuffle_seed: None,
            timings: PortTimings::default(),
        }
    }
}

impl EngineSettings {
    /// Settings for `players` seats, everything else default.
    #[must_use]
    pub fn for_players(players: usize) -> Self {
        Self {
            players,
            ..Self::default()
        }
    }

    /// Set a fixed shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| GameError::config(format!("settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check seat count and timing sanity.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players) {
            return Err(GameError::config(format!(
                "player count {} outside {MIN_PLAYERS}-{MAX_PLAYERS}",
                self.players
            )));
        }
        if self.carriers_per_seat == 0 {
            return Err(GameError::config("carriers_per_seat must be at least 1"));
        }
        if self.poll_interval.is_zero() {
            return Err(GameError::config("poll_interval must be non-zero"));
        }
        if self.timings.max_render_attempts == 0 {
            return Err(GameError::config("max_render_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Seat ports plus the dealer port, if any.
    #[must_use]
    pub fn port_count(&self) -> usize {
        self.players + usize::from(self.dealer_port)
    }
}
