//! Brisca.
//!
//! Three cards each; the deck's bottom card sets trump. The strongest trump
//! on the table takes the trick, otherwise the strongest card of the suit
//! led. Tricks go to the winner's won pile and score their card points (the
//! Spanish deck holds 120). Hands refill to three starting with the winner,
//! who leads next. The game ends when every card has been played.

use crate::cards::{LogicalCard, Suit};
use crate::core::{PlayerId, PlayerMap, Result};
use crate::engine::{GameState, Play};

use super::config::VariantConfig;
use super::variant::{credit_winner, points_at_stake, GameResult, GameVariant, RoundOutcome};

/// Brisca rules.
#[derive(Clone, Debug)]
pub struct Brisca {
    config: VariantConfig,
}

impl Brisca {
    #[must_use]
    pub fn new(config: VariantConfig) -> Self {
        Self { config }
    }

    fn trick_winner(state: &GameState) -> Option<&Play> {
        let lead = state.table.first()?;
        state
            .trump
            .as_ref()
            .and_then(|trump| strongest_of(&state.table, trump))
            .or_else(|| strongest_of(&state.table, lead.card.suit()))
    }
}

fn strongest_of<'a>(table: &'a [Play], suit: &Suit) -> Option<&'a Play> {
    table
        .iter()
        .filter(|play| play.card.suit() == suit)
        .max_by_key(|play| play.card.strength())
}

impl GameVariant for Brisca {
    fn config(&self) -> &VariantConfig {
        &self.config
    }

    fn initial_hand_size(&self, player_count: usize, deck_size: usize) -> usize {
        self.config.hand_size.resolve(player_count, deck_size)
    }

    fn validate_play(&self, _state: &GameState, _player: PlayerId, _card: &LogicalCard) -> Result<()> {
        // Any card in hand may be played.
        Ok(())
    }

    fn resolve_round(&self, state: &GameState) -> RoundOutcome {
        match Self::trick_winner(state) {
            Some(play) => RoundOutcome::won_by(Some(play.player)).led_by(play.player),
            None => RoundOutcome::default(),
        }
    }

    fn is_game_over(&self, state: &GameState) -> Option<GameResult> {
        let exhausted = state.deck.is_empty() && state.players.values().all(|p| p.hand.is_empty());
        exhausted.then(|| GameResult::best_by(state.players.player_ids(), |p| state.score(p)))
    }

    fn score_update(&self, state: &GameState, outcome: &RoundOutcome) -> PlayerMap<i64> {
        credit_winner(state, outcome, points_at_stake(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardMeta, Deck};

    fn card(suit: &str, rank: &str, strength: u8, points: i64) -> LogicalCard {
        LogicalCard::with_meta(suit, rank, CardMeta { color: None, strength, points })
    }

    fn state(trump: &str, plays: &[(u8, LogicalCard)]) -> GameState {
        let brisca = VariantConfig::brisca();
        let deck: Deck = brisca.build_deck().unwrap();
        let mut state = GameState::new("brisca", 2, deck);
        state.trump = Some(Suit::new(trump));
        for (player, card) in plays {
            state.table.push(Play {
                player: PlayerId::new(*player),
                card: card.clone(),
            });
        }
        state
    }

    #[test]
    fn test_lead_suit_wins_without_trump() {
        let brisca = Brisca::new(VariantConfig::brisca());
        let state = state(
            "Oros",
            &[(0, card("Copas", "7", 4, 0)), (1, card("Espadas", "1", 9, 11))],
        );

        let outcome = brisca.resolve_round(&state);
        assert_eq!(outcome.winner, Some(PlayerId::new(0)));
        assert_eq!(outcome.next_leader, Some(PlayerId::new(0)));
        assert_eq!(brisca.score_update(&state, &outcome)[PlayerId::new(0)], 11);
    }

    #[test]
    fn test_trump_beats_lead_suit() {
        let brisca = Brisca::new(VariantConfig::brisca());
        let state = state(
            "Oros",
            &[(0, card("Copas", "3", 8, 10)), (1, card("Oros", "2", 0, 0))],
        );
        assert_eq!(brisca.resolve_round(&state).winner, Some(PlayerId::new(1)));
    }

    #[test]
    fn test_higher_trump_wins() {
        let brisca = Brisca::new(VariantConfig::brisca());
        let state = state(
            "Bastos",
            &[(0, card("Bastos", "12", 7, 4)), (1, card("Bastos", "10", 5, 2))],
        );
        assert_eq!(brisca.resolve_round(&state).winner, Some(PlayerId::new(0)));
    }

    #[test]
    fn test_game_continues_while_cards_remain() {
        let brisca = Brisca::new(VariantConfig::brisca());
        let state = state("Oros", &[]);
        assert_eq!(brisca.is_game_over(&state), None);
    }
}
