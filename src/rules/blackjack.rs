//! Blackjack showdown.
//!
//! Two cards each, no dealer. Both cards go on the table and the total
//! closest to 21 without busting scores a point; ties and all-bust rounds
//! score nothing. Aces count 11 unless that busts the hand, then 1.

use crate::cards::LogicalCard;
use crate::core::{PlayerId, PlayerMap, Result};
use crate::engine::GameState;

use super::config::VariantConfig;
use super::variant::{
    credit_winner, hand_exhausted, target_reached, GameResult, GameVariant, RoundOutcome, TableDisposition,
};

const BLACKJACK: i64 = 21;

fn is_ace(card: &LogicalCard) -> bool {
    card.rank().as_str() == "A"
}

/// Best total for a set of cards.
///
/// Aces start at 1 and are raised to 11 while the total stays at or under 21.
pub fn hand_value<'a>(cards: impl IntoIterator<Item = &'a LogicalCard>) -> i64 {
    let (mut total, mut aces) = (0, 0);
    for card in cards {
        if is_ace(card) {
            total += 1;
            aces += 1;
        } else {
            total += card.points();
        }
    }
    while aces > 0 && total + 10 <= BLACKJACK {
        total += 10;
        aces -= 1;
    }
    total
}

/// Blackjack showdown rules.
#[derive(Clone, Debug)]
pub struct Blackjack {
    config: VariantConfig,
}

impl Blackjack {
    #[must_use]
    pub fn new(config: VariantConfig) -> Self {
        Self { config }
    }
}

impl GameVariant for Blackjack {
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
        let totals: Vec<(PlayerId, i64)> = state
            .players
            .player_ids()
            .map(|player| {
                let shown = state.table.iter().filter(|play| play.player == player);
                (player, hand_value(shown.map(|play| &play.card)))
            })
            .filter(|(_, total)| *total <= BLACKJACK)
            .collect();

        let best = totals.iter().map(|(_, total)| *total).max();
        let mut leaders = totals.iter().filter(|(_, total)| Some(*total) == best);
        let winner = match (leaders.next(), leaders.next()) {
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
    use crate::cards::{CardMeta, Deck};
    use crate::engine::Play;

    fn card(rank: &str, points: i64) -> LogicalCard {
        LogicalCard::with_meta("Spades", rank, CardMeta { points, ..CardMeta::default() })
    }

    #[test]
    fn test_soft_and_hard_aces() {
        assert_eq!(hand_value([&card("A", 11), &card("K", 10)]), 21);
        assert_eq!(hand_value([&card("A", 11), &card("A", 11)]), 12);
        assert_eq!(hand_value([&card("A", 11), &card("9", 9), &card("5", 5)]), 15);
    }

    #[test]
    fn test_closest_to_21_wins() {
        let blackjack = Blackjack::new(VariantConfig::blackjack());
        let deck: Deck = VariantConfig::blackjack().build_deck().unwrap();
        let mut state = GameState::new("blackjack", 3, deck);
        let plays = [
            (0, card("10", 10)),
            (0, card("9", 9)),
            (1, card("A", 11)),
            (1, card("Q", 10)),
            (2, card("K", 10)),
            (2, card("J", 10)),
        ];
        for (player, card) in plays {
            state.table.push(Play {
                player: PlayerId::new(player),
                card,
            });
        }

        let outcome = blackjack.resolve_round(&state);
        assert_eq!(outcome.winner, Some(PlayerId::new(1)));
        assert_eq!(outcome.table, TableDisposition::Discard);
        assert_eq!(blackjack.score_update(&state, &outcome)[PlayerId::new(1)], 1);
    }

    #[test]
    fn test_tie_scores_nothing() {
        let blackjack = Blackjack::new(VariantConfig::blackjack());
        let deck: Deck = VariantConfig::blackjack().build_deck().unwrap();
        let mut state = GameState::new("blackjack", 2, deck);
        for player in 0..2 {
            state.table.push(Play {
                player: PlayerId::new(player),
                card: card("K", 10),
            });
        }
        assert_eq!(blackjack.resolve_round(&state).winner, None);
    }
}
