//! Per-port card synchronization state machine.
//!
//! ```text
//! Empty ─tag─▶ Detected ─debounce─▶ Identified ─assigned─▶ Rendering ─ok─▶ Settled
//!   ▲              │                    │                     │  ▲           │
//!   └──removed─────┴────────────────────┴──────removed────────┤  └─retry─ Error
//!                                                             └──fail/timeout──▶
//! ```
//!
//! Each call to [`PortController::tick`] polls the reader once and advances
//! at most one step, so a slow render on one port never holds up the others.
//! The controller takes the registry's per-id lock for the whole render
//! sequence (first attempt through success, abort, or final failure).

use std::time::Duration;
use tracing::{debug, info, warn};

use super::event::{EventQueue, PortEvent};
use super::hardware::{EpaperDisplay, HardwareFault, RenderStatus, RfidReader};
use crate::cards::{CardRegistry, LogicalCard};
use crate::core::{PhysicalCardId, PortId, PortTimings};

/// Where a port is in the synchronization cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortState {
    /// No tag in the port.
    Empty,

    /// A tag is present but has not been stable for the debounce window.
    Detected { id: PhysicalCardId, since: Duration },

    /// Tag resolved; waiting for an assignment or deciding to render.
    Identified { id: PhysicalCardId },

    /// An e-paper write is in flight.
    Rendering {
        id: PhysicalCardId,
        card: LogicalCard,
        started: Duration,
        attempt: u32,
    },

    /// The card shows its assigned value.
    Settled { id: PhysicalCardId },

    /// The last render attempt failed.
    ///
    /// With `exhausted` unset the render is retried at `retry_at`; once set,
    /// the card keeps its stale face until it is removed.
    Error {
        id: PhysicalCardId,
        card: LogicalCard,
        attempt: u32,
        retry_at: Duration,
        exhausted: bool,
    },
}

impl PortState {
    /// The physical card the state refers to.
    #[must_use]
    pub fn card(&self) -> Option<PhysicalCardId> {
        match self {
            PortState::Empty => None,
            PortState::Detected { id, .. }
            | PortState::Identified { id }
            | PortState::Rendering { id, .. }
            | PortState::Settled { id }
            | PortState::Error { id, .. } => Some(*id),
        }
    }

    /// Short state name for logs and assertions.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PortState::Empty => "empty",
            PortState::Detected { .. } => "detected",
            PortState::Identified { .. } => "identified",
            PortState::Rendering { .. } => "rendering",
            PortState::Settled { .. } => "settled",
            PortState::Error { .. } => "error",
        }
    }
}

/// Drives one card port.
#[derive(Clone, Debug)]
pub struct PortController {
    port: PortId,
    state: PortState,
    timings: PortTimings,
    poll_failures: u32,
}

impl PortController {
    #[must_use]
    pub fn new(port: PortId, timings: PortTimings) -> Self {
        Self {
            port,
            state: PortState::Empty,
            timings,
            poll_failures: 0,
        }
    }

    #[must_use]
    pub fn port(&self) -> PortId {
        self.port
    }

    #[must_use]
    pub fn state(&self) -> &PortState {
        &self.state
    }

    /// Physical card currently in the port (debounced or not).
    #[must_use]
    pub fn current_card(&self) -> Option<PhysicalCardId> {
        self.state.card()
    }

    /// Advance the state machine by one poll.
    pub fn tick<R, D>(
        &mut self,
        now: Duration,
        rfid: &mut R,
        display: &mut D,
        registry: &mut CardRegistry,
        events: &mut EventQueue,
    ) where
        R: RfidReader + ?Sized,
        D: EpaperDisplay + ?Sized,
    {
        let seen = match rfid.poll(self.port) {
            Ok(seen) => {
                self.poll_failures = 0;
                seen
            }
            Err(fault) => {
                self.on_poll_fault(fault, display, registry, events);
                return;
            }
        };

        if let Some(current) = self.state.card() {
            if seen != Some(current) {
                self.drop_card(display, registry, events);
                self.state = match seen {
                    Some(id) => PortState::Detected { id, since: now },
                    None => PortState::Empty,
                };
                return;
            }
        }

        match self.state.clone() {
            PortState::Empty => {
                if let Some(id) = seen {
                    debug!(port = %self.port, %id, "tag detected");
                    self.state = PortState::Detected { id, since: now };
                }
            }
            PortState::Detected { id, since } => {
                if now.saturating_sub(since) >= self.timings.debounce {
                    debug!(port = %self.port, %id, "tag identified");
                    self.state = PortState::Identified { id };
                    events.push(PortEvent::CardIdentified { port: self.port, id });
                    self.sync(id, now, display, registry, events);
                }
            }
            PortState::Identified { id } | PortState::Settled { id } => {
                self.sync(id, now, display, registry, events);
            }
            PortState::Rendering {
                id,
                card,
                started,
                attempt,
            } => self.check_render(id, card, started, attempt, now, display, registry, events),
            PortState::Error {
                id,
                card,
                attempt,
                retry_at,
                exhausted,
            } => {
                if !exhausted && now >= retry_at {
                    debug!(port = %self.port, %id, attempt = attempt + 1, "retrying render");
                    self.start_render(id, card, attempt + 1, now, display, registry, events);
                }
            }
        }
    }

    /// Reconcile a present, identified card with its registry binding.
    fn sync<D: EpaperDisplay + ?Sized>(
        &mut self,
        id: PhysicalCardId,
        now: Duration,
        display: &mut D,
        registry: &mut CardRegistry,
        events: &mut EventQueue,
    ) {
        let binding = registry.binding(id).cloned().unwrap_or_default();
        match binding.assigned {
            None => {
                if binding.displayed.is_some() && registry.try_lock(id, self.port) {
                    match display.clear(self.port, id) {
                        Ok(()) => registry.clear_displayed(id),
                        Err(fault) => warn!(port = %self.port, %id, %fault, "clear failed"),
                    }
                    registry.release(id);
                }
                self.state = PortState::Identified { id };
            }
            Some(card) if binding.displayed.as_ref() == Some(&card) => {
                if !matches!(self.state, PortState::Settled { .. }) {
                    self.state = PortState::Settled { id };
                    events.push(PortEvent::CardReady {
                        port: self.port,
                        id,
                        card,
                    });
                }
            }
            Some(card) => self.start_render(id, card, 1, now, display, registry, events),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn start_render<D: EpaperDisplay + ?Sized>(
        &mut self,
        id: PhysicalCardId,
        card: LogicalCard,
        attempt: u32,
        now: Duration,
        display: &mut D,
        registry: &mut CardRegistry,
        events: &mut EventQueue,
    ) {
        if !registry.try_lock(id, self.port) {
            debug!(port = %self.port, %id, "render deferred, card locked");
            return;
        }
        match display.begin_render(self.port, id, &card) {
            Ok(()) => {
                debug!(port = %self.port, %id, %card, attempt, "render started");
                self.state = PortState::Rendering {
                    id,
                    card,
                    started: now,
                    attempt,
                };
            }
            Err(fault) => self.render_attempt_failed(id, card, attempt, now, fault, registry, events),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_render<D: EpaperDisplay + ?Sized>(
        &mut self,
        id: PhysicalCardId,
        card: LogicalCard,
        started: Duration,
        attempt: u32,
        now: Duration,
        display: &mut D,
        registry: &mut CardRegistry,
        events: &mut EventQueue,
    ) {
        match display.poll_render(self.port, id) {
            RenderStatus::InFlight => {
                if now.saturating_sub(started) >= self.timings.render_timeout {
                    display.abort_render(self.port, id);
                    self.render_attempt_failed(
                        id,
                        card,
                        attempt,
                        now,
                        HardwareFault::Timeout,
                        registry,
                        events,
                    );
                }
            }
            RenderStatus::Done => {
                registry.mark_displayed(id, card.clone());
                registry.release(id);
                info!(port = %self.port, %id, %card, "card ready");
                self.state = PortState::Settled { id };
                events.push(PortEvent::CardReady {
                    port: self.port,
                    id,
                    card,
                });
            }
            RenderStatus::Failed(fault) => {
                self.render_attempt_failed(id, card, attempt, now, fault, registry, events);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_attempt_failed(
        &mut self,
        id: PhysicalCardId,
        card: LogicalCard,
        attempt: u32,
        now: Duration,
        fault: HardwareFault,
        registry: &mut CardRegistry,
        events: &mut EventQueue,
    ) {
        if attempt >= self.timings.max_render_attempts {
            warn!(port = %self.port, %id, %card, %fault, attempt, "render failed, giving up");
            registry.release(id);
            events.push(PortEvent::RenderFailed {
                port: self.port,
                id,
                card: card.clone(),
                attempts: attempt,
            });
            self.state = PortState::Error {
                id,
                card,
                attempt,
                retry_at: now,
                exhausted: true,
            };
        } else {
            let retry_at = now + self.timings.backoff_for(attempt);
            warn!(port = %self.port, %id, %fault, attempt, "render attempt failed");
            self.state = PortState::Error {
                id,
                card,
                attempt,
                retry_at,
                exhausted: false,
            };
        }
    }

    /// The card in the port is gone (or replaced): wind down its work.
    fn drop_card<D: EpaperDisplay + ?Sized>(
        &mut self,
        display: &mut D,
        registry: &mut CardRegistry,
        events: &mut EventQueue,
    ) {
        let port = self.port;
        match &self.state {
            PortState::Empty | PortState::Detected { .. } => {}
            PortState::Rendering { id, .. } => {
                info!(%port, id = %id, "card removed mid-render, aborting");
                display.abort_render(port, *id);
                registry.release(*id);
                events.push(PortEvent::RenderAborted { port, id: *id });
                events.push(PortEvent::CardRemoved { port, id: *id });
            }
            PortState::Error { id, exhausted, .. } => {
                if !exhausted {
                    registry.release(*id);
                    events.push(PortEvent::RenderAborted { port, id: *id });
                }
                events.push(PortEvent::CardRemoved { port, id: *id });
            }
            PortState::Identified { id } | PortState::Settled { id } => {
                debug!(%port, id = %id, "card removed");
                events.push(PortEvent::CardRemoved { port, id: *id });
            }
        }
    }

    fn on_poll_fault<D: EpaperDisplay + ?Sized>(
        &mut self,
        fault: HardwareFault,
        display: &mut D,
        registry: &mut CardRegistry,
        events: &mut EventQueue,
    ) {
        self.poll_failures += 1;
        warn!(port = %self.port, %fault, failures = self.poll_failures, "rfid poll failed");
        if self.poll_failures >= self.timings.max_poll_failures {
            self.poll_failures = 0;
            self.drop_card(display, registry, events);
            self.state = PortState::Empty;
            events.push(PortEvent::IdentifyFailed { port: self.port });
        }
    }
}
