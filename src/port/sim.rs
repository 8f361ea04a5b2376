//! Simulated card-port hardware.
//!
//! Both devices read a shared [`ManualClock`], so scripted insertions,
//! removals and render latencies line up with the engine's view of time.
//! Used by the tests and the `digital-deck-sim` binary.

use rustc_hash::{FxHashMap, FxHashSet};
use std::time::Duration;

use super::hardware::{EpaperDisplay, HardwareFault, RenderStatus, RfidReader};
use crate::cards::LogicalCard;
use crate::core::{Clock, ManualClock, PhysicalCardId, PortId};

#[derive(Clone, Debug)]
struct Presence {
    port: PortId,
    id: PhysicalCardId,
    from: Duration,
    until: Option<Duration>,
}

impl Presence {
    fn active_at(&self, now: Duration) -> bool {
        self.from <= now && self.until.map_or(true, |until| now < until)
    }
}

/// Scripted RFID reader.
///
/// ```
/// use std::time::Duration;
/// use digital_deck::core::{ManualClock, PhysicalCardId, PortId};
/// use digital_deck::port::{RfidReader, SimulatedRfid};
///
/// let clock = ManualClock::new();
/// let mut rfid = SimulatedRfid::new(clock.clone());
/// rfid.place(PortId::new(0), PhysicalCardId::new(9), Duration::from_millis(100), None);
///
/// assert_eq!(rfid.poll(PortId::new(0)).unwrap(), None);
/// clock.advance(Duration::from_millis(100));
/// assert_eq!(rfid.poll(PortId::new(0)).unwrap(), Some(PhysicalCardId::new(9)));
/// ```
#[derive(Clone, Debug)]
pub struct SimulatedRfid {
    clock: ManualClock,
    presences: Vec<Presence>,
    pending_faults: FxHashMap<PortId, u32>,
}

impl SimulatedRfid {
    #[must_use]
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            presences: Vec::new(),
            pending_faults: FxHashMap::default(),
        }
    }

    /// Schedule a card in `port` from `from`, for `duration` (or forever).
    pub fn place(
        &mut self,
        port: PortId,
        id: PhysicalCardId,
        from: Duration,
        duration: Option<Duration>,
    ) {
        self.presences.push(Presence {
            port,
            id,
            from,
            until: duration.map(|d| from + d),
        });
    }

    /// Put a card in `port` now, until removed.
    pub fn insert(&mut self, port: PortId, id: PhysicalCardId) {
        let now = self.clock.now();
        self.place(port, id, now, None);
    }

    /// Take whatever card is in `port` out now.
    pub fn remove(&mut self, port: PortId) {
        let now = self.clock.now();
        for presence in &mut self.presences {
            if presence.port == port && presence.active_at(now) {
                presence.until = Some(now);
            }
        }
    }

    /// Make the next `count` polls of `port` fail.
    pub fn fail_next_polls(&mut self, port: PortId, count: u32) {
        *self.pending_faults.entry(port).or_default() += count;
    }
}

impl RfidReader for SimulatedRfid {
    fn poll(&mut self, port: PortId) -> Result<Option<PhysicalCardId>, HardwareFault> {
        if let Some(remaining) = self.pending_faults.get_mut(&port) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(HardwareFault::Bus("simulated read error".to_string()));
            }
        }
        let now = self.clock.now();
        Ok(self
            .presences
            .iter()
            .rev()
            .find(|p| p.port == port && p.active_at(now))
            .map(|p| p.id))
    }
}

#[derive(Clone, Debug)]
struct RenderJob {
    card: LogicalCard,
    ready_at: Duration,
}

/// E-paper writer with fixed latency and injectable failures.
#[derive(Clone, Debug)]
pub struct SimulatedDisplay {
    clock: ManualClock,
    latency: Duration,
    jobs: FxHashMap<PhysicalCardId, RenderJob>,
    faces: FxHashMap<PhysicalCardId, String>,
    pending_failures: FxHashMap<PhysicalCardId, u32>,
    stalled: FxHashSet<PhysicalCardId>,
    started: FxHashMap<PhysicalCardId, u32>,
}

impl SimulatedDisplay {
    #[must_use]
    pub fn new(clock: ManualClock, latency: Duration) -> Self {
        Self {
            clock,
            latency,
            jobs: FxHashMap::default(),
            faces: FxHashMap::default(),
            pending_failures: FxHashMap::default(),
            stalled: FxHashSet::default(),
            started: FxHashMap::default(),
        }
    }

    /// Make the next `count` renders of `id` fail on completion.
    pub fn fail_next(&mut self, id: PhysicalCardId, count: u32) {
        *self.pending_failures.entry(id).or_default() += count;
    }

    /// Renders of `id` never complete.
    pub fn stall(&mut self, id: PhysicalCardId) {
        self.stalled.insert(id);
    }

    /// Text the card currently shows.
    #[must_use]
    pub fn face(&self, id: PhysicalCardId) -> Option<String> {
        self.faces.get(&id).cloned()
    }

    /// How many renders were submitted for `id`.
    #[must_use]
    pub fn renders_started(&self, id: PhysicalCardId) -> u32 {
        self.started.get(&id).copied().unwrap_or(0)
    }

    /// Whether a render for `id` is in flight.
    #[must_use]
    pub fn is_rendering(&self, id: PhysicalCardId) -> bool {
        self.jobs.contains_key(&id)
    }
}

impl EpaperDisplay for SimulatedDisplay {
    fn begin_render(
        &mut self,
        _port: PortId,
        id: PhysicalCardId,
        card: &LogicalCard,
    ) -> Result<(), HardwareFault> {
        *self.started.entry(id).or_default() += 1;
        self.jobs.insert(
            id,
            RenderJob {
                card: card.clone(),
                ready_at: self.clock.now() + self.latency,
            },
        );
        Ok(())
    }

    fn poll_render(&mut self, _port: PortId, id: PhysicalCardId) -> RenderStatus {
        let Some(job) = self.jobs.get(&id) else {
            return RenderStatus::Failed(HardwareFault::NoRender(id));
        };
        if self.stalled.contains(&id) || self.clock.now() < job.ready_at {
            return RenderStatus::InFlight;
        }
        let Some(job) = self.jobs.remove(&id) else {
            return RenderStatus::Failed(HardwareFault::NoRender(id));
        };
        if let Some(remaining) = self.pending_failures.get_mut(&id) {
            if *remaining > 0 {
                *remaining -= 1;
                return RenderStatus::Failed(HardwareFault::Bus("simulated write error".to_string()));
            }
        }
        self.faces.insert(id, job.card.face_text());
        RenderStatus::Done
    }

    fn abort_render(&mut self, _port: PortId, id: PhysicalCardId) {
        self.jobs.remove(&id);
    }

    fn clear(&mut self, _port: PortId, id: PhysicalCardId) -> Result<(), HardwareFault> {
        self.faces.remove(&id);
        Ok(())
    }
}
