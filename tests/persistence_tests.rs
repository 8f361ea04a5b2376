//! Save and load across the life of a game.
//!
//! A loaded game must be indistinguishable from the one saved, apart from a
//! paused game coming back in progress.

use std::time::Duration;

use digital_deck::core::{EngineSettings, GameError, ManualClock, PhysicalCardId, PlayerId, PortId};
use digital_deck::engine::{GameEngine, Phase, Snapshot};
use digital_deck::port::{SimulatedDisplay, SimulatedRfid};

type SimEngine = GameEngine<SimulatedRfid, SimulatedDisplay, ManualClock>;

fn carrier(seat: PlayerId) -> PhysicalCardId {
    PhysicalCardId::new(0x300 + seat.index() as u64)
}

fn engine(players: usize) -> SimEngine {
    let clock = ManualClock::new();
    let settings = EngineSettings {
        deal_timeout: Duration::from_secs(3),
        ..EngineSettings::for_players(players).with_seed(99)
    };
    let rfid = SimulatedRfid::new(clock.clone());
    let display = SimulatedDisplay::new(clock.clone(), Duration::from_millis(250));
    let mut engine = GameEngine::new(settings, rfid, display, clock).unwrap();
    for seat in PlayerId::all(players) {
        engine.register_carrier(seat, carrier(seat)).unwrap();
    }
    engine
}

fn seat_all(engine: &mut SimEngine, players: usize) {
    for seat in PlayerId::all(players) {
        engine.rfid_mut().insert(seat.port(), carrier(seat));
    }
}

fn play_turn(engine: &mut SimEngine) {
    let seat = engine.state().unwrap().turn;
    engine.on_card_presented(carrier(seat)).unwrap();
}

/// Save, reset, load, and compare.
fn round_trip(engine: &mut SimEngine) {
    let saved = engine.state().unwrap().clone();
    let bytes = engine.save().unwrap();
    engine.reset();
    assert_eq!(engine.phase(), Phase::Setup);
    assert!(engine.state().is_none());

    engine.load(&bytes).unwrap();
    assert_eq!(engine.state().unwrap(), &saved);
}

/// Test the round trip while the deal is still waiting on a carrier.
#[test]
fn test_round_trip_while_dealing() {
    let mut engine = engine(2);
    engine.rfid_mut().insert(PortId::new(0), carrier(PlayerId::new(0)));
    engine.select_variant("war").unwrap();
    assert!(!engine.deal().unwrap().is_complete());

    round_trip(&mut engine);
    assert_eq!(engine.phase(), Phase::Dealing);

    // The loaded deal finishes once the missing carrier shows up.
    engine.rfid_mut().insert(PortId::new(1), carrier(PlayerId::new(1)));
    assert!(engine.await_deal().unwrap().is_complete());
}

/// Test the round trip in the middle of a round and between rounds.
#[test]
fn test_round_trip_in_progress() {
    for variant in ["war", "brisca", "poker", "blackjack"] {
        let mut engine = engine(2);
        seat_all(&mut engine, 2);
        engine.select_variant(variant).unwrap();
        engine.deal().unwrap();

        play_turn(&mut engine);
        round_trip(&mut engine);
        assert_eq!(engine.phase(), Phase::InProgress);

        // Play on past a round boundary and save again.
        while engine.state().unwrap().round < 3 && engine.phase() == Phase::InProgress {
            play_turn(&mut engine);
        }
        round_trip(&mut engine);

        let state = engine.state().unwrap();
        state.check_conservation().unwrap();
        for seat in PlayerId::all(2) {
            assert_eq!(engine.carriers(seat), &[carrier(seat)]);
            if let Some(shown) = engine.registry().lookup(carrier(seat)) {
                assert!(state.hand(seat).contains(shown), "{variant}: stale carrier after load");
            }
        }
    }
}

/// Test that a paused game loads in progress and otherwise unchanged.
#[test]
fn test_paused_game_resumes_on_load() {
    let mut engine = engine(2);
    seat_all(&mut engine, 2);
    engine.select_variant("brisca").unwrap();
    engine.deal().unwrap();
    play_turn(&mut engine);
    engine.pause().unwrap();

    let paused = engine.state().unwrap().clone();
    let bytes = engine.save().unwrap();
    engine.reset();
    engine.load(&bytes).unwrap();

    let loaded = engine.state().unwrap();
    assert_eq!(loaded.phase, Phase::InProgress);
    let mut expected = paused;
    expected.phase = Phase::InProgress;
    assert_eq!(loaded, &expected);
}

/// Test the round trip after the game is over.
#[test]
fn test_round_trip_game_over() {
    let mut engine = engine(2);
    seat_all(&mut engine, 2);
    engine.select_variant("blackjack").unwrap();
    engine.deal().unwrap();
    while engine.phase() == Phase::InProgress {
        play_turn(&mut engine);
    }
    assert_eq!(engine.phase(), Phase::GameEnd);

    round_trip(&mut engine);
    assert_eq!(engine.phase(), Phase::GameEnd);
    assert!(engine.on_card_presented(carrier(PlayerId::new(0))).is_err());
}

/// Test that the JSON form of a save loads into a fresh engine.
#[test]
fn test_json_snapshot_into_fresh_engine() {
    let mut first = engine(3);
    seat_all(&mut first, 3);
    first.select_variant("go_fish").unwrap();
    first.deal().unwrap();

    let seat = first.state().unwrap().turn;
    let rank = first.registry().lookup(carrier(seat)).unwrap().rank().clone();
    first.call_rank(rank).unwrap();
    play_turn(&mut first);

    let snapshot = Snapshot::decode(&first.save().unwrap()).unwrap();
    let json = snapshot.to_json().unwrap();

    let mut second = engine(3);
    second.restore(Snapshot::from_json(&json).unwrap()).unwrap();
    assert_eq!(second.state(), first.state());
}

/// Test that a save for a different table size is refused.
#[test]
fn test_load_rejects_other_table_size() {
    let mut two = engine(2);
    seat_all(&mut two, 2);
    two.select_variant("war").unwrap();
    two.deal().unwrap();
    let bytes = two.save().unwrap();

    let mut three = engine(3);
    assert!(matches!(three.load(&bytes), Err(GameError::Config(_))));
    assert_eq!(three.phase(), Phase::Setup);
}

/// Test that a save whose cards do not add up is refused.
#[test]
fn test_load_rejects_inconsistent_snapshot() {
    let mut engine = engine(2);
    seat_all(&mut engine, 2);
    engine.select_variant("war").unwrap();
    engine.deal().unwrap();

    let mut snapshot = Snapshot::decode(&engine.save().unwrap()).unwrap();
    let card = snapshot.state.hand(PlayerId::new(0)).top().cloned().unwrap();
    snapshot.state.players[PlayerId::new(1)].hand.push_bottom(card);

    assert!(matches!(engine.restore(snapshot), Err(GameError::Snapshot(_))));
}

/// Test that nothing can be saved before a variant is chosen.
#[test]
fn test_save_needs_a_game() {
    let engine = engine(2);
    assert!(matches!(engine.save(), Err(GameError::WrongPhase { .. })));
}

/// Test that a save whose turn or leader is off the table is refused.
#[test]
fn test_load_rejects_unseated_turn() {
    let mut engine = engine(2);
    seat_all(&mut engine, 2);
    engine.select_variant("war").unwrap();
    engine.deal().unwrap();
    let before = engine.state().unwrap().clone();
    let bytes = engine.save().unwrap();

    let mut snapshot = Snapshot::decode(&bytes).unwrap();
    snapshot.state.turn = PlayerId::new(7);
    assert!(matches!(engine.restore(snapshot), Err(GameError::Snapshot(_))));

    let mut snapshot = Snapshot::decode(&bytes).unwrap();
    snapshot.state.leader = PlayerId::new(2);
    assert!(matches!(engine.restore(snapshot), Err(GameError::Snapshot(_))));

    assert_eq!(engine.state().unwrap(), &before);
    assert!(engine.on_card_presented(carrier(before.turn)).is_ok());
}

/// Test that a carrier claimed by two seats is refused and ownership kept.
#[test]
fn test_load_rejects_shared_carrier() {
    let mut engine = engine(2);
    seat_all(&mut engine, 2);
    engine.select_variant("war").unwrap();
    engine.deal().unwrap();

    let mut snapshot = Snapshot::decode(&engine.save().unwrap()).unwrap();
    let first = PlayerId::new(0);
    snapshot.carriers[PlayerId::new(1)] = vec![carrier(first)];
    assert!(matches!(engine.restore(snapshot), Err(GameError::Snapshot(_))));

    assert_eq!(engine.registry().owner(carrier(first)), Some(first));
    assert_eq!(engine.carriers(PlayerId::new(1)), &[carrier(PlayerId::new(1))]);
}

/// Test that a save for a variant this catalog lacks is refused.
#[test]
fn test_load_rejects_unknown_variant() {
    let mut engine = engine(2);
    seat_all(&mut engine, 2);
    engine.select_variant("war").unwrap();
    engine.deal().unwrap();
    let phase = engine.phase();

    let mut snapshot = Snapshot::decode(&engine.save().unwrap()).unwrap();
    snapshot.state.variant = "canasta".to_string();
    let bytes = snapshot.encode().unwrap();

    assert!(matches!(engine.load(&bytes), Err(GameError::Config(_))));
    assert_eq!(engine.phase(), phase);
    assert_eq!(engine.state().unwrap().variant, "war");
}
