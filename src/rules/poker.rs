//! Showdown poker.
//!
//! Five cards each. Every seat lays its whole hand on the table; the best
//! five-card hand scores a point, ties score nothing. Played cards are
//! discarded and hands refill to five. First to the target score wins, or
//! the best score once the deck can no longer refill every hand.

use rustc_hash::FxHashMap;

use crate::cards::LogicalCard;
use crate::core::{PlayerId, PlayerMap, Result};
use crate::engine::GameState;

use super::config::VariantConfig;
use super::variant::{
    credit_winner, hand_exhausted, target_reached, GameResult, GameVariant, RoundOutcome, TableDisposition,
};

/// Strength of an ace in a deck ordered 2 → A.
const ACE: u8 = 12;

/// Category of a five-card hand, ordered weakest to strongest.
///
/// Values are rank strengths, so comparing two `HandRank`s compares hands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandRank {
    HighCard(u8, u8, u8, u8, u8),
    OnePair(u8, u8, u8, u8),
    TwoPair(u8, u8, u8),
    ThreeOfAKind(u8, u8, u8),
    Straight(u8),
    Flush(u8, u8, u8, u8, u8),
    FullHouse(u8, u8),
    FourOfAKind(u8, u8),
    StraightFlush(u8),
}

/// Rank a hand of exactly five cards.
///
/// ```
/// use digital_deck::cards::DeckSpec;
/// use digital_deck::rules::poker::{evaluate_hand, HandRank};
///
/// let cards = DeckSpec::standard().cards().unwrap();
/// let hearts: Vec<_> = cards.iter().filter(|c| c.suit().as_str() == "Hearts").cloned().collect();
/// // 10, J, Q, K, A of hearts
/// let royal = [&hearts[9..13], &hearts[0..1]].concat();
/// assert_eq!(evaluate_hand(&royal), Some(HandRank::StraightFlush(12)));
/// ```
#[must_use]
pub fn evaluate_hand(hand: &[LogicalCard]) -> Option<HandRank> {
    if hand.len() != 5 {
        return None;
    }

    let mut strengths: Vec<u8> = hand.iter().map(LogicalCard::strength).collect();
    strengths.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = hand.windows(2).all(|w| w[0].suit() == w[1].suit());
    let straight_high = straight_high(&strengths);

    if let Some(high) = straight_high {
        if is_flush {
            return Some(HandRank::StraightFlush(high));
        }
    }

    // (count, strength), most copies first, then strongest.
    let mut counts: FxHashMap<u8, u8> = FxHashMap::default();
    for s in &strengths {
        *counts.entry(*s).or_insert(0) += 1;
    }
    let mut groups: Vec<(u8, u8)> = counts.into_iter().map(|(s, n)| (n, s)).collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let [a, b, c, d, e] = [strengths[0], strengths[1], strengths[2], strengths[3], strengths[4]];
    let rank = match groups.as_slice() {
        [(4, quad), (1, kicker)] => HandRank::FourOfAKind(*quad, *kicker),
        [(3, trips), (2, pair)] => HandRank::FullHouse(*trips, *pair),
        _ if is_flush => HandRank::Flush(a, b, c, d, e),
        _ if straight_high.is_some() => HandRank::Straight(straight_high.unwrap_or_default()),
        [(3, trips), (1, k1), (1, k2)] => HandRank::ThreeOfAKind(*trips, *k1, *k2),
        [(2, high), (2, low), (1, kicker)] => HandRank::TwoPair(*high, *low, *kicker),
        [(2, pair), (1, k1), (1, k2), (1, k3)] => HandRank::OnePair(*pair, *k1, *k2, *k3),
        _ => HandRank::HighCard(a, b, c, d, e),
    };
    Some(rank)
}

/// High card of a straight in descending `strengths`, if it is one.
fn straight_high(strengths: &[u8]) -> Option<u8> {
    // A-2-3-4-5 plays the ace low.
    if strengths == [ACE, 3, 2, 1, 0] {
        return Some(3);
    }
    strengths
        .windows(2)
        .all(|w| w[0] == w[1] + 1)
        .then_some(strengths[0])
}

/// Showdown poker rules.
#[derive(Clone, Debug)]
pub struct Poker {
    config: VariantConfig,
}

impl Poker {
    #[must_use]
    pub fn new(config: VariantConfig) -> Self {
        Self { config }
    }
}

impl GameVariant for Poker {
    fn config(&self) -> &VariantConfig {
        &self.config
    }

    fn initial_hand_size(&self, player_count: usize, deck_size: usize) -> usize {
        self.config.hand_size.resolve(player_count, deck_size)
    }

    fn validate_play(&self, _state: &GameState, _player: PlayerId, _card: &LogicalCard) -> Result<()> {
        Ok(())
    }

    fn resolve_round(&self, state: &GameState) -> RoundOutcome {
        let ranked: Vec<(PlayerId, Option<HandRank>)> = state
            .players
            .player_ids()
            .map(|player| {
                let shown: Vec<LogicalCard> = state
                    .table
                    .iter()
                    .filter(|play| play.player == player)
                    .map(|play| play.card.clone())
                    .collect();
                (player, evaluate_hand(&shown))
            })
            .collect();

        let best = ranked.iter().filter_map(|(_, rank)| *rank).max();
        let mut winners = ranked.iter().filter(|(_, rank)| rank.is_some() && *rank == best);
        let winner = match (winners.next(), winners.next()) {
            (Some((player, _)), None) => Some(*player),
            _ => None,
        };

        RoundOutcome {
            table: TableDisposition::Discard,
            ..RoundOutcome::won_by(winner)
        }
    }

    fn is_game_over(&self, state: &GameState) -> Option<GameResult> {
        target_reached(&self.config, state).or_else(|| {
            hand_exhausted(&self.config, state)
                .then(|| GameResult::best_by(state.players.player_ids(), |p| state.score(p)))
        })
    }

    fn score_update(&self, state: &GameState, outcome: &RoundOutcome) -> PlayerMap<i64> {
        credit_winner(state, outcome, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardMeta;

    fn cards(spec: &[(&str, u8)]) -> Vec<LogicalCard> {
        spec.iter()
            .enumerate()
            .map(|(i, (suit, strength))| {
                LogicalCard::with_meta(*suit, format!("r{i}"), CardMeta { strength: *strength, ..CardMeta::default() })
            })
            .collect()
    }

    #[test]
    fn test_categories() {
        let quads = cards(&[("H", 9), ("S", 9), ("D", 9), ("C", 9), ("H", 2)]);
        assert_eq!(evaluate_hand(&quads), Some(HandRank::FourOfAKind(9, 2)));

        let full = cards(&[("H", 4), ("S", 4), ("D", 4), ("C", 7), ("H", 7)]);
        assert_eq!(evaluate_hand(&full), Some(HandRank::FullHouse(4, 7)));

        let flush = cards(&[("H", 1), ("H", 5), ("H", 7), ("H", 9), ("H", 11)]);
        assert_eq!(evaluate_hand(&flush), Some(HandRank::Flush(11, 9, 7, 5, 1)));

        let straight = cards(&[("H", 4), ("S", 5), ("D", 6), ("C", 7), ("H", 8)]);
        assert_eq!(evaluate_hand(&straight), Some(HandRank::Straight(8)));

        let two_pair = cards(&[("H", 4), ("S", 4), ("D", 6), ("C", 6), ("H", 8)]);
        assert_eq!(evaluate_hand(&two_pair), Some(HandRank::TwoPair(6, 4, 8)));
    }

    #[test]
    fn test_wheel_is_lowest_straight() {
        let wheel = cards(&[("H", ACE), ("S", 0), ("D", 1), ("C", 2), ("H", 3)]);
        let six_high = cards(&[("H", 0), ("S", 1), ("D", 2), ("C", 3), ("H", 4)]);
        assert_eq!(evaluate_hand(&wheel), Some(HandRank::Straight(3)));
        assert!(evaluate_hand(&six_high) > evaluate_hand(&wheel));
    }

    #[test]
    fn test_kickers_break_ties() {
        let high = cards(&[("H", 10), ("S", 10), ("D", 8), ("C", 3), ("H", 2)]);
        let low = cards(&[("C", 10), ("D", 10), ("S", 7), ("H", 3), ("S", 2)]);
        assert!(evaluate_hand(&high) > evaluate_hand(&low));
    }

    #[test]
    fn test_wrong_size_is_unranked() {
        assert_eq!(evaluate_hand(&cards(&[("H", 1)])), None);
    }
}
