//! Variant hooks.
//!
//! Each game implements `GameVariant` to supply its rules:
//! - How many cards a seat is dealt
//! - Whether a presented card may be played
//! - Who takes a completed round and where the cards go
//! - Score changes and when the game ends
//!
//! The engine owns turn order, card movement and the carrier
//! synchronization. Variants only inspect state and describe what should
//! happen; they never mutate it.

use crate::cards::{LogicalCard, Rank};
use crate::core::{PlayerId, PlayerMap, Result};
use crate::engine::GameState;

use super::config::VariantConfig;

/// Result of a completed game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Draw (no winner).
    Draw,
    /// Several seats share the best score.
    Winners(Vec<PlayerId>),
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        match self {
            GameResult::Winner(p) => *p == player,
            GameResult::Winners(ps) => ps.contains(&player),
            GameResult::Draw => false,
        }
    }

    /// Result for the seats ranked highest by `key`.
    ///
    /// One best seat wins outright; a tie among some seats shares the win; a
    /// tie among all seats is a draw.
    pub fn best_by(players: impl Iterator<Item = PlayerId>, key: impl Fn(PlayerId) -> i64) -> Self {
        let scored: Vec<(PlayerId, i64)> = players.map(|p| (p, key(p))).collect();
        let Some(best) = scored.iter().map(|(_, s)| *s).max() else {
            return GameResult::Draw;
        };
        let top: Vec<PlayerId> = scored
            .iter()
            .filter(|(_, s)| *s == best)
            .map(|(p, _)| *p)
            .collect();
        match top.len() {
            1 => GameResult::Winner(top[0]),
            n if n == scored.len() => GameResult::Draw,
            _ => GameResult::Winners(top),
        }
    }
}

/// Where the cards on the table go once a round is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TableDisposition {
    /// The round winner captures table and pot, as the capture rule says.
    /// With no winner the table joins the pot.
    #[default]
    Capture,
    /// Table joins the pot for a later round.
    Pot,
    /// Every card goes back to the bottom of the hand that played it.
    ReturnToOwners,
    /// Table and pot go to the discard pile.
    Discard,
}

/// A single card moving from one hand to another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: PlayerId,
    pub to: PlayerId,
    pub card: LogicalCard,
}

/// A variant's verdict on a completed round.
///
/// The engine applies it as: table disposition, stakes, transfers, draws,
/// books, then the configured refill.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    pub winner: Option<PlayerId>,

    pub table: TableDisposition,

    /// Cards a seat moves face down from the top of its stack into the pot.
    pub stakes: Vec<(PlayerId, usize)>,

    pub transfers: Vec<Transfer>,

    /// Every card of the rank leaves the seat's hand for the discard pile.
    pub books: Vec<(PlayerId, Rank)>,

    /// Extra cards a seat draws from the deck (capped at what remains).
    pub draws: Vec<(PlayerId, usize)>,

    /// Seat that opens the next round. Defaults to the seat after the
    /// current leader.
    pub next_leader: Option<PlayerId>,
}

impl RoundOutcome {
    /// Winner captures the table.
    #[must_use]
    pub fn won_by(winner: Option<PlayerId>) -> Self {
        Self {
            winner,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn led_by(mut self, leader: PlayerId) -> Self {
        self.next_leader = Some(leader);
        self
    }
}

/// Game rules plugged into the engine.
///
/// ## Implementation Notes
///
/// - `validate_play` runs after the engine has checked turn order and that
///   the card is in the seat's hand
/// - `resolve_round` sees the table complete and the hands without the
///   played cards
/// - `score_update` returns per-seat deltas, computed before the outcome is
///   applied
/// - `is_game_over` runs after the outcome is applied; `None` continues
pub trait GameVariant {
    /// The configuration this variant was built from.
    fn config(&self) -> &VariantConfig;

    /// Cards dealt to each seat.
    fn initial_hand_size(&self, player_count: usize, deck_size: usize) -> usize;

    /// Check a play, returning `IllegalPlay` when it breaks the rules.
    fn validate_play(&self, state: &GameState, player: PlayerId, card: &LogicalCard) -> Result<()>;

    /// Decide a completed round.
    fn resolve_round(&self, state: &GameState) -> RoundOutcome;

    /// Check if the game is over.
    fn is_game_over(&self, state: &GameState) -> Option<GameResult>;

    /// Score change per seat for a resolved round.
    fn score_update(&self, state: &GameState, outcome: &RoundOutcome) -> PlayerMap<i64>;

    // === Provided ===

    /// Seats that play in one round.
    fn players_per_round(&self, state: &GameState) -> usize {
        state.player_count()
    }

    /// Plays needed on the table before the round can be resolved.
    fn plays_per_round(&self, state: &GameState) -> usize {
        self.config().plays_per_turn * self.players_per_round(state)
    }
}

/// Cards on the table plus the pot.
pub(crate) fn cards_at_stake(state: &GameState) -> usize {
    state.table.len() + state.pot.len()
}

/// Points of every card on the table plus the pot.
pub(crate) fn points_at_stake(state: &GameState) -> i64 {
    state
        .table
        .iter()
        .map(|play| play.card.points())
        .chain(state.pot.iter().map(LogicalCard::points))
        .sum()
}

/// Delta map crediting `amount` to the round winner.
pub(crate) fn credit_winner(state: &GameState, outcome: &RoundOutcome, amount: i64) -> PlayerMap<i64> {
    let mut deltas = PlayerMap::with_value(state.player_count(), 0);
    if let Some(winner) = outcome.winner {
        deltas[winner] = amount;
    }
    deltas
}

/// Game over once the target score is reached, if the variant has one.
pub(crate) fn target_reached(config: &VariantConfig, state: &GameState) -> Option<GameResult> {
    let target = config.target_score?;
    let reached = state.players.values().any(|p| p.score >= target);
    reached.then(|| GameResult::best_by(state.players.player_ids(), |p| state.score(p)))
}

/// Game over once the round cap is passed, if the variant has one.
pub(crate) fn round_cap_reached(config: &VariantConfig, state: &GameState) -> bool {
    config.max_rounds.is_some_and(|cap| state.round > cap)
}

/// Some seat cannot make a full turn from its hand.
pub(crate) fn hand_exhausted(config: &VariantConfig, state: &GameState) -> bool {
    state
        .players
        .values()
        .any(|p| p.hand.len() < config.plays_per_turn)
}
