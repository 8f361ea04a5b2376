//! War.
//!
//! The deck is split evenly. Each round every seat plays the top card of
//! its stack; the strongest card takes the table (and any pot) to the bottom
//! of its owner's stack. A tied round declares war: the table goes to the pot
//! and every seat adds one card face down from its stack, keeping at least
//! one card to turn up. The next winner takes the lot. Turns alternate
//! between rounds. The game ends when a seat runs
//! out of cards or the round cap is passed; the seat holding the most cards
//! wins.

use crate::cards::LogicalCard;
use crate::core::{GameError, PlayerId, PlayerMap, Result};
use crate::engine::GameState;

use super::config::VariantConfig;
use super::variant::{
    cards_at_stake, credit_winner, round_cap_reached, GameResult, GameVariant, RoundOutcome,
};

/// Cards each seat lays face down when a round is tied.
const FACE_DOWN: usize = 1;

/// War rules.
#[derive(Clone, Debug)]
pub struct War {
    config: VariantConfig,
}

impl War {
    #[must_use]
    pub fn new(config: VariantConfig) -> Self {
        Self { config }
    }
}

impl GameVariant for War {
    fn config(&self) -> &VariantConfig {
        &self.config
    }

    fn initial_hand_size(&self, player_count: usize, deck_size: usize) -> usize {
        self.config.hand_size.resolve(player_count, deck_size)
    }

    fn validate_play(&self, state: &GameState, player: PlayerId, card: &LogicalCard) -> Result<()> {
        match state.hand(player).top() {
            Some(top) if top == card => Ok(()),
            _ => Err(GameError::illegal(player, "only the top card of your stack can be played")),
        }
    }

    fn resolve_round(&self, state: &GameState) -> RoundOutcome {
        let best = state.table.iter().map(|play| play.card.strength()).max();
        let mut leaders = state
            .table
            .iter()
            .filter(|play| Some(play.card.strength()) == best);

        let winner = match (leaders.next(), leaders.next()) {
            (Some(play), None) => Some(play.player),
            _ => None,
        };
        let mut outcome = RoundOutcome::won_by(winner);
        if winner.is_none() {
            outcome.stakes = state
                .players
                .iter()
                .filter(|(_, p)| p.hand.len() > FACE_DOWN)
                .map(|(seat, _)| (seat, FACE_DOWN))
                .collect();
        }
        outcome
    }

    fn is_game_over(&self, state: &GameState) -> Option<GameResult> {
        let out_of_cards = state.players.values().any(|p| p.hand.is_empty());
        if out_of_cards || round_cap_reached(&self.config, state) {
            let held = |p: PlayerId| state.cards_held(p) as i64;
            return Some(GameResult::best_by(state.players.player_ids(), held));
        }
        None
    }

    fn score_update(&self, state: &GameState, outcome: &RoundOutcome) -> PlayerMap<i64> {
        credit_winner(state, outcome, cards_at_stake(state) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardMeta, Deck, DeckSpec};
    use crate::engine::Play;

    fn card(rank: &str, strength: u8) -> LogicalCard {
        LogicalCard::with_meta("Hearts", rank, CardMeta { strength, ..CardMeta::default() })
    }

    fn state_with_table(plays: &[(u8, LogicalCard)]) -> GameState {
        let deck = Deck::build(&DeckSpec::standard()).unwrap();
        let mut state = GameState::new("war", 2, deck);
        for (player, card) in plays {
            state.table.push(Play {
                player: PlayerId::new(*player),
                card: card.clone(),
            });
        }
        state
    }

    #[test]
    fn test_higher_card_wins() {
        let war = War::new(VariantConfig::war());
        let state = state_with_table(&[(0, card("5", 3)), (1, card("A", 12))]);

        let outcome = war.resolve_round(&state);
        assert_eq!(outcome.winner, Some(PlayerId::new(1)));

        let deltas = war.score_update(&state, &outcome);
        assert_eq!(deltas[PlayerId::new(1)], 2);
        assert_eq!(deltas[PlayerId::new(0)], 0);
    }

    #[test]
    fn test_tie_has_no_winner() {
        let war = War::new(VariantConfig::war());
        let state = state_with_table(&[(0, card("9", 7)), (1, card("9", 7))]);

        let outcome = war.resolve_round(&state);
        assert_eq!(outcome.winner, None);
        assert!(war.score_update(&state, &outcome).values().all(|d| *d == 0));
    }

    #[test]
    fn test_tie_stakes_a_face_down_card() {
        let war = War::new(VariantConfig::war());
        let mut state = state_with_table(&[(0, card("9", 7)), (1, card("9", 7))]);
        state.players[PlayerId::new(0)].hand.push_bottom(card("2", 0));
        state.players[PlayerId::new(0)].hand.push_bottom(card("3", 1));
        state.players[PlayerId::new(1)].hand.push_bottom(card("4", 2));

        let outcome = war.resolve_round(&state);
        // Seat 1 keeps its last card to turn up.
        assert_eq!(outcome.stakes, vec![(PlayerId::new(0), 1)]);

        let decided = war.resolve_round(&state_with_table(&[(0, card("5", 3)), (1, card("A", 12))]));
        assert!(decided.stakes.is_empty());
    }

    #[test]
    fn test_only_top_card_playable() {
        let war = War::new(VariantConfig::war());
        let mut state = state_with_table(&[]);
        let p0 = PlayerId::new(0);
        state.players[p0].hand.push_bottom(card("2", 0));
        state.players[p0].hand.push_bottom(card("K", 11));

        assert!(war.validate_play(&state, p0, &card("2", 0)).is_ok());
        let err = war.validate_play(&state, p0, &card("K", 11)).unwrap_err();
        assert!(matches!(err, GameError::IllegalPlay { .. }));
    }

    #[test]
    fn test_game_over_when_stack_empty() {
        let war = War::new(VariantConfig::war());
        let mut state = state_with_table(&[]);
        state.players[PlayerId::new(0)].hand.push_bottom(card("2", 0));
        assert_eq!(war.is_game_over(&state), Some(GameResult::Winner(PlayerId::new(0))));

        state.players[PlayerId::new(1)].hand.push_bottom(card("3", 1));
        assert_eq!(war.is_game_over(&state), None);
    }
}
