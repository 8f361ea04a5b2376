//! Go Fish.
//!
//! The active seat calls a rank it holds and presents a card of that rank.
//! Every opponent hands over all their cards of the rank; if nobody has one
//! the asker draws. The asker keeps the turn after a catch (or after drawing
//! the rank it asked for), otherwise the turn passes. A complete set of a
//! rank, one per suit, is a book: it leaves the hand and scores a point.
//! The game ends when every rank is booked, or the deck is empty and a seat
//! has no cards left.

use rustc_hash::FxHashSet;

use crate::cards::LogicalCard;
use crate::core::{GameError, PlayerId, PlayerMap, Result};
use crate::engine::GameState;

use super::config::VariantConfig;
use super::variant::{GameResult, GameVariant, RoundOutcome, TableDisposition, Transfer};

/// Go Fish rules.
#[derive(Clone, Debug)]
pub struct GoFish {
    config: VariantConfig,
}

impl GoFish {
    #[must_use]
    pub fn new(config: VariantConfig) -> Self {
        Self { config }
    }

    fn book_size(state: &GameState) -> usize {
        state
            .deck
            .full_set()
            .map(LogicalCard::suit)
            .collect::<FxHashSet<_>>()
            .len()
    }
}

impl GameVariant for GoFish {
    fn config(&self) -> &VariantConfig {
        &self.config
    }

    fn initial_hand_size(&self, player_count: usize, deck_size: usize) -> usize {
        self.config.hand_size.resolve(player_count, deck_size)
    }

    fn validate_play(&self, state: &GameState, player: PlayerId, card: &LogicalCard) -> Result<()> {
        match &state.called {
            None => Err(GameError::illegal(player, "call a rank before presenting a card")),
            Some(called) if called != card.rank() => Err(GameError::illegal(
                player,
                format!("{} does not match the called rank {called}", card),
            )),
            Some(_) => Ok(()),
        }
    }

    fn players_per_round(&self, _state: &GameState) -> usize {
        1
    }

    fn resolve_round(&self, state: &GameState) -> RoundOutcome {
        let Some(ask) = state.table.first() else {
            return RoundOutcome::default();
        };
        let (asker, rank) = (ask.player, ask.card.rank());
        let players = state.player_count();
        let book = Self::book_size(state);

        let transfers: Vec<Transfer> = state
            .players
            .iter()
            .filter(|(id, _)| *id != asker)
            .flat_map(|(from, player)| {
                player
                    .hand
                    .cards()
                    .filter(move |c| c.rank() == rank)
                    .map(move |card| Transfer {
                        from,
                        to: asker,
                        card: card.clone(),
                    })
            })
            .collect();

        // The asked card goes back to the asker's hand.
        let held = state.hand(asker).count_rank(rank) + 1;
        let mut outcome = RoundOutcome {
            table: TableDisposition::ReturnToOwners,
            ..RoundOutcome::default()
        };

        if !transfers.is_empty() {
            if held + transfers.len() >= book {
                outcome.books.push((asker, rank.clone()));
            }
            outcome.winner = Some(asker);
            outcome.transfers = transfers;
            outcome.next_leader = Some(asker);
            return outcome;
        }

        outcome.next_leader = Some(asker.next(players));
        if held >= book {
            // Nobody else had any: the asker already holds the whole rank.
            outcome.books.push((asker, rank.clone()));
        } else if let Some(drawn) = state.deck.cards().next() {
            outcome.draws.push((asker, 1));
            let same = drawn.rank() == rank;
            let count = state.hand(asker).count_rank(drawn.rank()) + usize::from(same) + 1;
            if count >= book {
                outcome.books.push((asker, drawn.rank().clone()));
            }
            if same {
                outcome.next_leader = Some(asker);
            }
        }
        outcome
    }

    fn is_game_over(&self, state: &GameState) -> Option<GameResult> {
        let all_booked = state.discard.len() == state.deck.size();
        let stuck = state.deck.is_empty() && state.players.values().any(|p| p.hand.is_empty());
        (all_booked || stuck).then(|| GameResult::best_by(state.players.player_ids(), |p| state.score(p)))
    }

    fn score_update(&self, state: &GameState, outcome: &RoundOutcome) -> PlayerMap<i64> {
        let mut deltas = PlayerMap::with_value(state.player_count(), 0);
        for (player, _) in &outcome.books {
            deltas[*player] += 1;
        }
        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Deck, DeckSpec, Rank};
    use crate::engine::Play;

    fn state() -> GameState {
        let deck = Deck::build(&DeckSpec::standard()).unwrap();
        GameState::new("go_fish", 2, deck)
    }

    fn give(state: &mut GameState, player: u8, cards: &[(&str, &str)]) {
        for (suit, rank) in cards {
            let card = LogicalCard::new(*suit, *rank);
            let rest: Vec<LogicalCard> = state.deck.cards().filter(|c| **c != card).cloned().collect();
            state.deck.draw(state.deck.remaining()).unwrap();
            state.deck.put_bottom(rest);
            state.players[PlayerId::new(player)].hand.push_bottom(card);
        }
    }

    fn ask(state: &mut GameState, player: u8, suit: &str, rank: &str) {
        let card = LogicalCard::new(suit, rank);
        state.players[PlayerId::new(player)].hand.remove(&card);
        state.table.push(Play {
            player: PlayerId::new(player),
            card,
        });
    }

    #[test]
    fn test_called_rank_required() {
        let go_fish = GoFish::new(VariantConfig::go_fish());
        let mut state = state();
        let p0 = PlayerId::new(0);
        let seven = LogicalCard::new("Hearts", "7");

        assert!(go_fish.validate_play(&state, p0, &seven).is_err());
        state.called = Some(Rank::new("8"));
        assert!(go_fish.validate_play(&state, p0, &seven).is_err());
        state.called = Some(Rank::new("7"));
        assert!(go_fish.validate_play(&state, p0, &seven).is_ok());
    }

    #[test]
    fn test_catch_transfers_and_keeps_turn() {
        let go_fish = GoFish::new(VariantConfig::go_fish());
        let mut state = state();
        give(&mut state, 0, &[("Hearts", "7"), ("Spades", "2")]);
        give(&mut state, 1, &[("Clubs", "7"), ("Diamonds", "7"), ("Clubs", "3")]);
        ask(&mut state, 0, "Hearts", "7");

        let outcome = go_fish.resolve_round(&state);
        assert_eq!(outcome.transfers.len(), 2);
        assert!(outcome.transfers.iter().all(|t| t.to == PlayerId::new(0)));
        assert_eq!(outcome.next_leader, Some(PlayerId::new(0)));
        assert_eq!(outcome.table, TableDisposition::ReturnToOwners);
        assert!(outcome.books.is_empty());
        assert!(outcome.draws.is_empty());
    }

    #[test]
    fn test_fourth_card_makes_book() {
        let go_fish = GoFish::new(VariantConfig::go_fish());
        let mut state = state();
        give(&mut state, 0, &[("Hearts", "Q"), ("Spades", "Q"), ("Diamonds", "Q")]);
        give(&mut state, 1, &[("Clubs", "Q")]);
        ask(&mut state, 0, "Hearts", "Q");

        let outcome = go_fish.resolve_round(&state);
        assert_eq!(outcome.books, vec![(PlayerId::new(0), Rank::new("Q"))]);
        assert_eq!(go_fish.score_update(&state, &outcome)[PlayerId::new(0)], 1);
    }

    #[test]
    fn test_miss_draws_and_passes_turn() {
        let go_fish = GoFish::new(VariantConfig::go_fish());
        let mut state = state();
        give(&mut state, 0, &[("Hearts", "9")]);
        give(&mut state, 1, &[("Clubs", "3")]);
        ask(&mut state, 0, "Hearts", "9");

        let outcome = go_fish.resolve_round(&state);
        assert!(outcome.transfers.is_empty());
        assert_eq!(outcome.draws, vec![(PlayerId::new(0), 1)]);
        let drawn_nine = state.deck.cards().next().map(|c| c.rank().as_str() == "9").unwrap();
        let expected = if drawn_nine { PlayerId::new(0) } else { PlayerId::new(1) };
        assert_eq!(outcome.next_leader, Some(expected));
    }

    #[test]
    fn test_whole_rank_in_hand_books_on_miss() {
        let go_fish = GoFish::new(VariantConfig::go_fish());
        let mut state = state();
        give(
            &mut state,
            0,
            &[("Hearts", "5"), ("Spades", "5"), ("Clubs", "5"), ("Diamonds", "5")],
        );
        give(&mut state, 1, &[("Clubs", "3")]);
        ask(&mut state, 0, "Hearts", "5");

        let outcome = go_fish.resolve_round(&state);
        assert_eq!(outcome.books, vec![(PlayerId::new(0), Rank::new("5"))]);
        assert!(outcome.draws.is_empty());
        assert_eq!(outcome.next_leader, Some(PlayerId::new(1)));
    }
}
