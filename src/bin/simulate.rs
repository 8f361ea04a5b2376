//! Play a whole game on simulated card ports.
//!
//! ```text
//! digital-deck-sim [VARIANT] [--players N] [--seed N] [--settings FILE]
//! ```
//!
//! Every seat gets one carrier. A play is simulated the way a person makes
//! it: the carrier is lifted out of its port and put back, and the engine
//! picks it up through the normal port state machine. Set `RUST_LOG` to see
//! the engine's own logging.

use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use digital_deck::core::{EngineSettings, GameError, ManualClock, PhysicalCardId, PlayerId, Result};
use digital_deck::engine::{EngineEvent, GameEngine, Phase};
use digital_deck::port::{SimulatedDisplay, SimulatedRfid};

/// Virtual time a simulated player keeps a card out of its port.
const LIFT: Duration = Duration::from_millis(200);

/// Virtual time allowed for the re-render after a play.
const SETTLE: Duration = Duration::from_secs(1);

const RENDER_LATENCY: Duration = Duration::from_millis(300);

/// Upper bound on simulated presentations.
const MAX_PLAYS: usize = 20_000;

struct Options {
    variant: String,
    settings: EngineSettings,
}

fn parse_args() -> Result<Options> {
    let mut variant = "war".to_string();
    let mut settings = EngineSettings::default();
    let mut players = None;
    let mut seed = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| GameError::config(format!("{flag} needs a value")))
        };
        match arg.as_str() {
            "--players" => {
                let raw = value("--players")?;
                players = Some(
                    raw.parse()
                        .map_err(|_| GameError::config(format!("bad player count {raw:?}")))?,
                );
            }
            "--seed" => {
                let raw = value("--seed")?;
                seed = Some(
                    raw.parse()
                        .map_err(|_| GameError::config(format!("bad seed {raw:?}")))?,
                );
            }
            "--settings" => {
                let path = value("--settings")?;
                let json = std::fs::read_to_string(&path)
                    .map_err(|e| GameError::config(format!("{path}: {e}")))?;
                settings = EngineSettings::from_json(&json)?;
            }
            other if other.starts_with("--") => {
                return Err(GameError::config(format!("unknown option {other}")));
            }
            other => variant = other.to_string(),
        }
    }

    if let Some(players) = players {
        settings.players = players;
    }
    if seed.is_some() {
        settings.shuffle_seed = seed;
    }
    settings.carriers_per_seat = 1;
    settings.validate()?;
    Ok(Options { variant, settings })
}

fn carrier_for(seat: PlayerId) -> PhysicalCardId {
    PhysicalCardId::new(0x1000 + seat.index() as u64)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let Options { variant, settings } = parse_args()?;
    let players = settings.players;

    let clock = ManualClock::new();
    let rfid = SimulatedRfid::new(clock.clone());
    let display = SimulatedDisplay::new(clock.clone(), RENDER_LATENCY);
    let mut engine = GameEngine::new(settings, rfid, display, clock)?;

    // Carriers announce themselves by being placed in their seat's port.
    for seat in PlayerId::all(players) {
        engine.rfid_mut().insert(seat.port(), carrier_for(seat));
    }
    engine.run_for(Duration::from_secs(1))?;

    engine.select_variant(&variant)?;
    let report = engine.deal()?;
    if !report.is_complete() {
        return Err(GameError::config(format!("deal incomplete, waiting on {:?}", report.missing)));
    }
    println!("{variant}: {players} players, seed {:?}", report.seed);

    let mut result = None;
    for _ in 0..MAX_PLAYS {
        if engine.phase() != Phase::InProgress {
            break;
        }
        let Some(state) = engine.state() else { break };
        let seat = state.turn;
        let id = carrier_for(seat);

        if engine.variant().is_some_and(|v| v.config().id == "go_fish") {
            if let Some(rank) = engine.registry().lookup(id).map(|card| card.rank().clone()) {
                engine.call_rank(rank)?;
            }
        }

        engine.rfid_mut().remove(seat.port());
        engine.run_for(LIFT)?;
        engine.rfid_mut().insert(seat.port(), id);
        engine.run_for(SETTLE)?;

        for event in engine.take_events() {
            match event {
                EngineEvent::RoundResolved(summary) => {
                    info!(round = summary.round, winner = ?summary.winner, "round");
                }
                EngineEvent::PlayRejected { reason, .. } => warn!(%seat, %reason, "play rejected"),
                EngineEvent::GameOver(game_result) => result = Some(game_result),
                _ => {}
            }
        }
    }

    let Some(state) = engine.state() else {
        return Ok(());
    };
    println!("rounds played: {}", state.round.saturating_sub(1));
    for seat in PlayerId::all(players) {
        println!("  {seat}: score {:>4}, cards {:>3}", state.score(seat), state.cards_held(seat));
    }
    match result {
        Some(result) => println!("result: {result:?}"),
        None => println!("stopped after {MAX_PLAYS} presentations without a result"),
    }
    Ok(())
}
