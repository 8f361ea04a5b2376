//! The game engine.
//!
//! `GameEngine` owns the session: the selected variant, the authoritative
//! `GameState`, the card registry and one `PortController` per port. A
//! single control loop ([`GameEngine::pump`]) ticks every port, drains the
//! port event queue in order, and turns identifications into plays.
//!
//! ## Phases
//!
//! ```text
//! Setup ─deal─▶ Dealing ─carriers ready─▶ InProgress ─round─▶ RoundEnd ─▶ InProgress | GameEnd
//!                                              ▲  │
//!                                       resume │  │ pause
//!                                              │  ▼
//!                                             Paused
//! ```
//!
//! ## Carriers
//!
//! Each seat owns a short list of physical cards ("carriers") that display
//! cards from its hand. After every change to the hands the engine
//! reconciles: carriers whose logical card left the hand are unassigned,
//! then free carriers take hand cards not yet on display, top of the hand
//! first. Carriers locked by an in-flight render are left alone and picked
//! up again once the port reports back.

use rustc_hash::FxHashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::state::{GameState, Phase, Play};
use crate::cards::{CardRegistry, LogicalCard, Rank};
use crate::core::{
    Clock, EngineSettings, GameError, PhysicalCardId, PlayerId, PlayerMap, PortId, Result,
};
use crate::port::{EpaperDisplay, EventQueue, PortController, PortEvent, PortState, RfidReader};
use crate::rules::{
    CaptureRule, GameResult, GameVariant, RoundOutcome, TableDisposition, VariantCatalog, VariantConfig,
};

use super::persist::Snapshot;

/// Result of a deal, or of waiting on one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DealReport {
    /// Seed the deck was shuffled with.
    pub seed: Option<u64>,

    /// Physical cards holding an assignment.
    pub assigned: usize,

    /// Seats whose carriers are not all showing their cards yet.
    pub missing: Vec<PlayerId>,
}

impl DealReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// What a resolved round did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    /// Round number that was resolved.
    pub round: u32,

    pub winner: Option<PlayerId>,

    /// Cards on the table and in the pot when the round was decided.
    pub stake: usize,

    pub deltas: PlayerMap<i64>,

    /// Scores after the deltas.
    pub scores: PlayerMap<i64>,
}

/// Result of presenting a card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Not a playable carrier: unknown or unassigned.
    Ignored,

    /// The card went on the table; the round is still open.
    Accepted { player: PlayerId, card: LogicalCard },

    /// The card completed the round, which was resolved.
    RoundResolved(RoundSummary),
}

/// Notification for the front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    CardReady {
        port: PortId,
        id: PhysicalCardId,
        card: LogicalCard,
    },
    RenderFailed {
        port: PortId,
        id: PhysicalCardId,
        card: LogicalCard,
        attempts: u32,
    },
    IdentifyFailed {
        port: PortId,
    },
    PlayRejected {
        port: PortId,
        id: PhysicalCardId,
        reason: String,
    },
    RoundResolved(RoundSummary),
    GameOver(GameResult),
}

/// Game session driving real or simulated card ports.
pub struct GameEngine<R, D, C> {
    settings: EngineSettings,
    catalog: VariantCatalog,
    variant: Option<Box<dyn GameVariant>>,
    state: Option<GameState>,
    carriers: PlayerMap<Vec<PhysicalCardId>>,
    registry: CardRegistry,
    ports: Vec<PortController>,
    queue: EventQueue,
    outbox: Vec<EngineEvent>,
    rfid: R,
    display: D,
    clock: C,
    reconcile_pending: bool,
    halted: Option<GameError>,
}

impl<R, D, C> GameEngine<R, D, C>
where
    R: RfidReader,
    D: EpaperDisplay,
    C: Clock,
{
    /// Engine with the built-in variant catalog.
    pub fn new(settings: EngineSettings, rfid: R, display: D, clock: C) -> Result<Self> {
        Self::with_catalog(settings, VariantCatalog::builtin(), rfid, display, clock)
    }

    pub fn with_catalog(
        settings: EngineSettings,
        catalog: VariantCatalog,
        rfid: R,
        display: D,
        clock: C,
    ) -> Result<Self> {
        settings.validate()?;
        let ports = (0..settings.port_count())
            .map(|i| PortController::new(PortId::new(i as u8), settings.timings.clone()))
            .collect();
        info!(
            players = settings.players,
            ports = settings.port_count(),
            "engine started"
        );
        Ok(Self {
            carriers: PlayerMap::with_default(settings.players),
            settings,
            catalog,
            variant: None,
            state: None,
            registry: CardRegistry::new(),
            ports,
            queue: EventQueue::new(),
            outbox: Vec::new(),
            rfid,
            display,
            clock,
            reconcile_pending: false,
            halted: None,
        })
    }

    // === Accessors ===

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut VariantCatalog {
        &mut self.catalog
    }

    /// Current phase; `Setup` until a variant is selected.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.as_ref().map_or(Phase::Setup, |s| s.phase)
    }

    #[must_use]
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    #[must_use]
    pub fn variant(&self) -> Option<&dyn GameVariant> {
        self.variant.as_deref()
    }

    #[must_use]
    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    #[must_use]
    pub fn port_state(&self, port: PortId) -> Option<&PortState> {
        self.ports.get(port.index()).map(PortController::state)
    }

    /// Carriers registered to a seat.
    #[must_use]
    pub fn carriers(&self, seat: PlayerId) -> &[PhysicalCardId] {
        &self.carriers[seat]
    }

    /// The error that halted the session, if any.
    #[must_use]
    pub fn halted(&self) -> Option<&GameError> {
        self.halted.as_ref()
    }

    pub fn rfid(&self) -> &R {
        &self.rfid
    }

    pub fn rfid_mut(&mut self) -> &mut R {
        &mut self.rfid
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Take the notifications queued since the last call.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.outbox)
    }

    // === Setup ===

    /// Choose the variant for the next game.
    pub fn select_variant(&mut self, id: &str) -> Result<()> {
        self.ensure_running()?;
        let phase = self.phase();
        if phase != Phase::Setup {
            return Err(GameError::WrongPhase {
                operation: "select_variant",
                phase,
            });
        }

        let config = self.catalog.get(id)?.clone();
        let deck = config.build_deck()?;
        config.check_table(self.settings.players, deck.size())?;

        info!(variant = %config.id, players = self.settings.players, cards = deck.size(), "variant selected");
        self.state = Some(GameState::new(config.id.clone(), self.settings.players, deck));
        self.variant = Some(config.into_variant());
        Ok(())
    }

    /// Register a physical card as one of `seat`'s carriers.
    pub fn register_carrier(&mut self, seat: PlayerId, id: PhysicalCardId) -> Result<()> {
        self.ensure_running()?;
        if seat.index() >= self.settings.players {
            return Err(GameError::config(format!(
                "{seat} does not exist in a {}-seat session",
                self.settings.players
            )));
        }
        match self.registry.owner(id) {
            Some(owner) if owner == seat => return Ok(()),
            Some(owner) => {
                return Err(GameError::config(format!("{id} is already registered to {owner}")));
            }
            None => {}
        }

        info!(%seat, %id, "carrier registered");
        self.carriers[seat].push(id);
        self.registry.set_owner(id, Some(seat));
        self.reconcile_pending = true;
        Ok(())
    }

    /// Shuffle, deal hands, assign carriers and wait for them to show their
    /// cards.
    ///
    /// Returns once every seat is ready (phase becomes `InProgress`) or the
    /// deal timeout passes (phase stays `Dealing`; see
    /// [`GameEngine::await_deal`]).
    pub fn deal(&mut self) -> Result<DealReport> {
        self.ensure_running()?;
        let phase = self.phase();
        if self.state.is_none() {
            return Err(GameError::config("select a variant before dealing"));
        }
        let shuffle_seed = self.settings.shuffle_seed;
        let (state, variant) = self.game_mut("deal")?;
        if phase != Phase::Setup {
            return Err(GameError::WrongPhase { operation: "deal", phase });
        }

        let seed = state.deck.shuffle(shuffle_seed);
        state.trump = if variant.config().trump_from_bottom {
            state.deck.peek_bottom().map(|card| card.suit().clone())
        } else {
            None
        };

        let players = state.player_count();
        let per_seat = variant.initial_hand_size(players, state.deck.remaining());
        if per_seat * players > state.deck.remaining() {
            return Err(GameError::config(format!(
                "cannot deal {per_seat} cards to {players} seats from {}",
                state.deck.remaining()
            )));
        }
        for _ in 0..per_seat {
            for seat in PlayerId::all(players) {
                for card in state.deck.draw(1)? {
                    state.players[seat].hand.push_bottom(card);
                }
            }
        }

        state.phase = Phase::Dealing;
        state.round = 1;
        state.leader = PlayerId::new(0);
        state.turn = state.leader;
        info!(seed, per_seat, trump = ?state.trump, "hands dealt");

        self.reconcile_carriers()?;
        self.await_deal()
    }

    /// Keep pumping until every seat's carriers are ready or the deal
    /// timeout passes.
    pub fn await_deal(&mut self) -> Result<DealReport> {
        self.ensure_running()?;
        let phase = self.phase();
        if phase != Phase::Dealing {
            return Err(GameError::WrongPhase {
                operation: "await_deal",
                phase,
            });
        }

        let deadline = self.clock.now() + self.settings.deal_timeout;
        loop {
            self.pump()?;
            let missing = self.missing_seats();
            if missing.is_empty() {
                if let Some(state) = self.state.as_mut() {
                    state.phase = Phase::InProgress;
                }
                info!("all carriers ready, game in progress");
                return Ok(self.deal_report(missing));
            }
            if self.clock.now() >= deadline {
                warn!(?missing, "deal timed out waiting for carriers");
                return Ok(self.deal_report(missing));
            }
            self.clock.sleep(self.settings.poll_interval);
        }
    }

    fn deal_report(&self, missing: Vec<PlayerId>) -> DealReport {
        DealReport {
            seed: self.state.as_ref().and_then(|s| s.deck.shuffle_seed()),
            assigned: self.registry.assigned_count(),
            missing,
        }
    }

    /// Seats with fewer settled carriers than they need.
    fn missing_seats(&self) -> Vec<PlayerId> {
        let Some(state) = &self.state else {
            return Vec::new();
        };
        state
            .players
            .iter()
            .filter(|(seat, player)| {
                let carriers = &self.carriers[*seat];
                let wanted = self
                    .settings
                    .carriers_per_seat
                    .max(carriers.len())
                    .min(player.hand.len());
                let ready = carriers
                    .iter()
                    .filter(|id| self.registry.binding(**id).is_some_and(|b| b.is_settled()))
                    .count();
                ready < wanted
            })
            .map(|(seat, _)| seat)
            .collect()
    }

    // === Play ===

    /// Record the rank the active seat asks for.
    pub fn call_rank(&mut self, rank: Rank) -> Result<()> {
        self.ensure_running()?;
        let phase = self.phase();
        let state = match self.state.as_mut() {
            Some(state) if phase == Phase::InProgress => state,
            _ => {
                return Err(GameError::WrongPhase {
                    operation: "call_rank",
                    phase,
                })
            }
        };
        let player = state.turn;
        if state.hand(player).count_rank(&rank) == 0 {
            return Err(GameError::illegal(player, format!("you hold no {rank} to ask for")));
        }
        info!(%player, %rank, "rank called");
        state.called = Some(rank);
        Ok(())
    }

    /// Handle a carrier presented as a play.
    ///
    /// Rejected plays leave hands, table and turn untouched.
    pub fn on_card_presented(&mut self, id: PhysicalCardId) -> Result<PlayOutcome> {
        self.ensure_running()?;
        let phase = self.phase();
        if phase != Phase::InProgress {
            return Err(GameError::WrongPhase {
                operation: "on_card_presented",
                phase,
            });
        }

        let (Some(owner), Some(card)) = (self.registry.owner(id), self.registry.lookup(id).cloned()) else {
            debug!(%id, "ignoring card with no assignment");
            return Ok(PlayOutcome::Ignored);
        };

        let round_complete = {
            let (state, variant) = self.game_mut("on_card_presented")?;
            if owner != state.turn {
                return Err(GameError::illegal(owner, "it's not your turn"));
            }
            if !state.hand(owner).contains(&card) {
                return Err(GameError::illegal(owner, format!("{card} is not in your hand")));
            }
            variant.validate_play(state, owner, &card)?;

            state.players[owner].hand.remove(&card);
            state.table.push(Play {
                player: owner,
                card: card.clone(),
            });
            info!(player = %owner, %card, round = state.round, "card played");

            let complete = state.table.len() >= variant.plays_per_round(state);
            if !complete && state.plays_by(owner) >= variant.config().plays_per_turn {
                state.turn = owner.next(state.player_count());
            }
            complete
        };

        self.reconcile_carriers()?;
        if round_complete {
            return self.resolve_round().map(PlayOutcome::RoundResolved);
        }
        Ok(PlayOutcome::Accepted { player: owner, card })
    }

    /// Resolve the round on the table.
    ///
    /// A card-conservation failure halts the session.
    pub fn resolve_round(&mut self) -> Result<RoundSummary> {
        self.ensure_running()?;
        let phase = self.phase();
        if phase != Phase::InProgress {
            return Err(GameError::WrongPhase {
                operation: "resolve_round",
                phase,
            });
        }

        let resolved = {
            let (state, variant) = self.game_mut("resolve_round")?;
            let required = variant.plays_per_round(state);
            if state.table.len() < required {
                return Err(GameError::RoundIncomplete {
                    played: state.table.len(),
                    required,
                });
            }

            let outcome = variant.resolve_round(state);
            let deltas = variant.score_update(state, &outcome);
            let stake = state.table.len() + state.pot.len();
            state.phase = Phase::RoundEnd;

            apply_outcome(state, variant.config(), &outcome)
                .and_then(|()| state.check_conservation())
                .map(|()| {
                    for (seat, delta) in deltas.iter() {
                        state.players[seat].score += delta;
                    }
                    let summary = RoundSummary {
                        round: state.round,
                        winner: outcome.winner,
                        stake,
                        scores: PlayerMap::new(state.player_count(), |p| state.score(p)),
                        deltas,
                    };
                    state.round += 1;

                    let result = variant.is_game_over(state);
                    state.phase = if result.is_some() {
                        Phase::GameEnd
                    } else {
                        Phase::InProgress
                    };
                    (summary, result)
                })
        };

        let (summary, result) = resolved.map_err(|err| self.halt(err))?;
        info!(
            round = summary.round,
            winner = ?summary.winner,
            stake = summary.stake,
            "round resolved"
        );
        self.outbox.push(EngineEvent::RoundResolved(summary.clone()));
        if let Some(result) = result {
            info!(?result, "game over");
            self.outbox.push(EngineEvent::GameOver(result));
        }
        self.reconcile_carriers()?;
        Ok(summary)
    }

    // === Control loop ===

    /// One control-loop iteration: tick every port, then handle their
    /// events in order.
    pub fn pump(&mut self) -> Result<()> {
        self.ensure_running()?;
        let now = self.clock.now();
        for port in &mut self.ports {
            port.tick(now, &mut self.rfid, &mut self.display, &mut self.registry, &mut self.queue);
        }

        while let Some(event) = self.queue.pop() {
            let handled = self.handle_port_event(event);
            self.check(handled)?;
        }

        if self.reconcile_pending {
            let reconciled = self.reconcile_carriers();
            self.check(reconciled)?;
        }
        Ok(())
    }

    /// Pump for `duration`, sleeping the poll interval between iterations.
    pub fn run_for(&mut self, duration: Duration) -> Result<()> {
        let until = self.clock.now() + duration;
        loop {
            self.pump()?;
            if self.clock.now() >= until {
                return Ok(());
            }
            self.clock.sleep(self.settings.poll_interval);
        }
    }

    fn handle_port_event(&mut self, event: PortEvent) -> Result<()> {
        if let Some(fault) = event.fault() {
            warn!(error = %fault, id = ?event.card_id(), "carrier could not be rendered");
        }
        match event {
            PortEvent::CardIdentified { port, id } => self.on_identified(port, id),
            PortEvent::CardReady { port, id, card } => {
                self.reconcile_pending = true;
                self.outbox.push(EngineEvent::CardReady { port, id, card });
                Ok(())
            }
            PortEvent::RenderFailed {
                port,
                id,
                card,
                attempts,
            } => {
                self.reconcile_pending = true;
                self.outbox.push(EngineEvent::RenderFailed {
                    port,
                    id,
                    card,
                    attempts,
                });
                Ok(())
            }
            PortEvent::RenderAborted { port, id } => {
                debug!(%port, %id, "render aborted");
                self.reconcile_pending = true;
                Ok(())
            }
            PortEvent::CardRemoved { port, id } => {
                debug!(%port, %id, "card removed");
                Ok(())
            }
            PortEvent::IdentifyFailed { port } => {
                warn!(%port, "reader failing");
                self.outbox.push(EngineEvent::IdentifyFailed { port });
                Ok(())
            }
        }
    }

    fn on_identified(&mut self, port: PortId, id: PhysicalCardId) -> Result<()> {
        let seat = (port.index() < self.settings.players).then(|| PlayerId::new(port.0));
        match self.phase() {
            Phase::Setup | Phase::Dealing => {
                let Some(seat) = seat else {
                    return Ok(());
                };
                if self.registry.owner(id).is_none()
                    && self.carriers[seat].len() < self.settings.carriers_per_seat
                {
                    self.register_carrier(seat, id)?;
                    self.reconcile_carriers()?;
                }
                Ok(())
            }
            Phase::InProgress => {
                if seat.is_none() {
                    debug!(%port, %id, "card at the dealer port");
                    return Ok(());
                }
                match self.on_card_presented(id) {
                    Ok(outcome) => {
                        debug!(%port, %id, ?outcome, "presentation handled");
                        Ok(())
                    }
                    Err(err) if err.is_recoverable() => {
                        info!(%port, %id, %err, "play rejected");
                        self.outbox.push(EngineEvent::PlayRejected {
                            port,
                            id,
                            reason: err.to_string(),
                        });
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            Phase::Paused => {
                debug!(%port, %id, "presentation ignored while paused");
                Ok(())
            }
            Phase::RoundEnd | Phase::GameEnd => Ok(()),
        }
    }

    /// Bring carrier assignments in line with the hands.
    fn reconcile_carriers(&mut self) -> Result<()> {
        self.reconcile_pending = false;
        let Some(state) = self.state.as_ref() else {
            return Ok(());
        };
        if state.phase == Phase::Setup {
            return Ok(());
        }

        let mut deferred = false;
        for (seat, carriers) in self.carriers.iter() {
            let hand = state.hand(seat);
            for &id in carriers {
                let stale = self.registry.lookup(id).is_some_and(|card| !hand.contains(card));
                if !stale {
                    continue;
                }
                match self.registry.unassign(id) {
                    Ok(_) => {}
                    Err(GameError::Busy(_)) => deferred = true,
                    Err(err) => return Err(err),
                }
            }
        }

        for (seat, carriers) in self.carriers.iter() {
            let mut free = state
                .hand(seat)
                .cards()
                .filter(|card| self.registry.reverse_lookup(card).is_none())
                .cloned()
                .collect::<Vec<_>>()
                .into_iter();
            for &id in carriers {
                if self.registry.lookup(id).is_some() {
                    continue;
                }
                if self.registry.is_locked(id) {
                    deferred = true;
                    continue;
                }
                let Some(card) = free.next() else {
                    break;
                };
                debug!(%seat, %id, %card, "carrier assigned");
                self.registry.assign(id, card)?;
            }
        }

        self.reconcile_pending = deferred;
        Ok(())
    }

    // === Session ===

    pub fn pause(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.transition("pause", Phase::InProgress, Phase::Paused)
    }

    pub fn resume(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.transition("resume", Phase::Paused, Phase::InProgress)
    }

    /// Encode the current game.
    pub fn save(&self) -> Result<Vec<u8>> {
        self.ensure_running()?;
        let state = self.state.as_ref().ok_or(GameError::WrongPhase {
            operation: "save",
            phase: Phase::Setup,
        })?;
        Snapshot::new(state.clone(), self.carriers.clone()).encode()
    }

    /// Replace the session with a saved game.
    ///
    /// A game saved while paused comes back in progress. Loading also clears
    /// a halted session.
    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        let snapshot = Snapshot::decode(bytes)?;
        self.restore(snapshot)
    }

    /// Replace the session with a decoded snapshot.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        let config: VariantConfig = self.catalog.get(&snapshot.state.variant)?.clone();
        let players = self.settings.players;
        if snapshot.state.player_count() != players || snapshot.carriers.player_count() != players {
            return Err(GameError::config(format!(
                "snapshot has {} seats, session has {players}",
                snapshot.state.player_count()
            )));
        }

        let mut state = snapshot.state;
        state
            .check_conservation()
            .map_err(|err| GameError::Snapshot(err.to_string()))?;
        for (role, seat) in [("turn", state.turn), ("leader", state.leader)] {
            if seat.index() >= players {
                return Err(GameError::Snapshot(format!(
                    "{role} {seat} is not seated at a {players}-player table"
                )));
            }
        }
        let mut seen = FxHashSet::default();
        for id in snapshot.carriers.values().flatten() {
            if !seen.insert(*id) {
                return Err(GameError::Snapshot(format!("carrier {id} is listed more than once")));
            }
        }
        if state.phase == Phase::Paused {
            state.phase = Phase::InProgress;
        }

        for id in self.carriers.values().flatten() {
            self.registry.set_owner(*id, None);
        }
        self.registry.clear_assignments();
        for (seat, ids) in snapshot.carriers.iter() {
            for id in ids {
                self.registry.set_owner(*id, Some(seat));
            }
        }

        info!(variant = %state.variant, phase = ?state.phase, round = state.round, "game loaded");
        self.carriers = snapshot.carriers;
        self.state = Some(state);
        self.variant = Some(config.into_variant());
        self.halted = None;
        self.reconcile_carriers()
    }

    /// Drop the current game and return to `Setup`. Carriers stay registered.
    pub fn reset(&mut self) {
        info!("session reset");
        self.state = None;
        self.variant = None;
        self.registry.clear_assignments();
        self.reconcile_pending = false;
        self.halted = None;
    }

    // === Helpers ===

    fn ensure_running(&self) -> Result<()> {
        match &self.halted {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Halt the session on a consistency failure.
    fn halt(&mut self, err: GameError) -> GameError {
        if matches!(err, GameError::Consistency(_)) {
            error!(%err, "session halted");
            self.halted = Some(err.clone());
        }
        err
    }

    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|err| self.halt(err))
    }

    fn transition(&mut self, operation: &'static str, from: Phase, to: Phase) -> Result<()> {
        let phase = self.phase();
        match self.state.as_mut() {
            Some(state) if state.phase == from => {
                info!(?from, ?to, "phase change");
                state.phase = to;
                Ok(())
            }
            _ => Err(GameError::WrongPhase { operation, phase }),
        }
    }

    fn game_mut(&mut self, operation: &'static str) -> Result<(&mut GameState, &dyn GameVariant)> {
        match (self.state.as_mut(), self.variant.as_deref()) {
            (Some(state), Some(variant)) => Ok((state, variant)),
            _ => Err(GameError::WrongPhase {
                operation,
                phase: Phase::Setup,
            }),
        }
    }
}

/// Move cards as a round outcome says.
fn apply_outcome(state: &mut GameState, config: &VariantConfig, outcome: &RoundOutcome) -> Result<()> {
    let table: Vec<Play> = state.table.drain(..).collect();
    let pot: Vec<LogicalCard> = std::mem::take(&mut state.pot).into_iter().collect();
    let played = table.into_iter().map(|play| (play.player, play.card));

    match (outcome.table, outcome.winner) {
        (TableDisposition::Capture, Some(winner)) => {
            let spoils = pot.into_iter().chain(played.map(|(_, card)| card));
            let hand = &mut state.players[winner].hand;
            match config.capture {
                CaptureRule::HandBottom => spoils.for_each(|card| hand.push_bottom(card)),
                CaptureRule::WonPile => spoils.for_each(|card| hand.add_won(card)),
                CaptureRule::Discard => state.discard.extend(spoils),
            }
        }
        (TableDisposition::Capture, None) | (TableDisposition::Pot, _) => {
            state.pot = pot.into_iter().chain(played.map(|(_, card)| card)).collect();
        }
        (TableDisposition::ReturnToOwners, _) => {
            state.pot = pot.into_iter().collect();
            for (player, card) in played {
                state.players[player].hand.push_bottom(card);
            }
        }
        (TableDisposition::Discard, _) => {
            state.discard.extend(pot);
            state.discard.extend(played.map(|(_, card)| card));
        }
    }

    for &(seat, count) in &outcome.stakes {
        for _ in 0..count {
            let Some(card) = state.players[seat].hand.pop_top() else {
                break;
            };
            state.pot.push_back(card);
        }
    }

    for transfer in &outcome.transfers {
        if !state.players[transfer.from].hand.remove(&transfer.card) {
            return Err(GameError::Consistency(format!(
                "{} cannot hand over {}: not in hand",
                transfer.from, transfer.card
            )));
        }
        state.players[transfer.to].hand.push_bottom(transfer.card.clone());
    }

    for &(seat, count) in &outcome.draws {
        let count = count.min(state.deck.remaining());
        for card in state.deck.draw(count)? {
            state.players[seat].hand.push_bottom(card);
        }
    }

    for (seat, rank) in &outcome.books {
        let book = state.players[*seat].hand.take_rank(rank);
        debug!(%seat, %rank, cards = book.len(), "book laid down");
        state.discard.extend(book);
    }

    if let Some(target) = config.refill_to {
        let players = state.player_count();
        let mut seat = outcome.winner.unwrap_or(state.leader);
        'refill: loop {
            let mut drew = false;
            for _ in 0..players {
                if state.deck.is_empty() {
                    break 'refill;
                }
                if state.players[seat].hand.len() < target {
                    for card in state.deck.draw(1)? {
                        state.players[seat].hand.push_bottom(card);
                    }
                    drew = true;
                }
                seat = seat.next(players);
            }
            if !drew {
                break;
            }
        }
    }

    let players = state.player_count();
    state.leader = outcome.next_leader.unwrap_or_else(|| state.leader.next(players));
    state.turn = state.leader;
    state.called = None;
    Ok(())
}
