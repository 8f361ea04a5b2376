//! Authoritative game state.
//!
//! `GameState` is everything needed to resume a game exactly: the undealt
//! deck in order, every hand and won pile, the cards on the table, scores,
//! turn and phase. It derives deep equality so a save/load round trip can be
//! checked directly.
//!
//! ## Card conservation
//!
//! Deck + hands + won piles + table + pot + discard always equals the
//! variant's fixed card set. [`GameState::check_conservation`] verifies this
//! after every round.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::{Deck, LogicalCard, Rank, Suit};
use crate::core::{GameError, PlayerId, PlayerMap, Result};

/// Engine lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    Dealing,
    InProgress,
    RoundEnd,
    GameEnd,
    Paused,
}

/// A player's cards: the ordered stack in hand and the pile of won cards.
///
/// Index 0 of `cards` is the top of the hand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vector<LogicalCard>,
    won: Vector<LogicalCard>,
}

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> impl Iterator<Item = &LogicalCard> {
        self.cards.iter()
    }

    #[must_use]
    pub fn top(&self) -> Option<&LogicalCard> {
        self.cards.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn contains(&self, card: &LogicalCard) -> bool {
        self.cards.contains(card)
    }

    /// Number of cards of `rank` in hand.
    #[must_use]
    pub fn count_rank(&self, rank: &Rank) -> usize {
        self.cards.iter().filter(|c| c.rank() == rank).count()
    }

    /// Remove one card. Returns false if it was not in hand.
    pub fn remove(&mut self, card: &LogicalCard) -> bool {
        match self.cards.index_of(card) {
            Some(index) => {
                self.cards.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every card of `rank`, in hand order.
    pub fn take_rank(&mut self, rank: &Rank) -> Vec<LogicalCard> {
        let (taken, kept): (Vec<_>, Vec<_>) =
            self.cards.iter().cloned().partition(|c| c.rank() == rank);
        self.cards = kept.into_iter().collect();
        taken
    }

    /// Take the top card.
    pub fn pop_top(&mut self) -> Option<LogicalCard> {
        self.cards.pop_front()
    }

    /// Add a card at the bottom of the hand.
    pub fn push_bottom(&mut self, card: LogicalCard) {
        self.cards.push_back(card);
    }

    /// Cards captured in earlier rounds.
    pub fn won(&self) -> impl Iterator<Item = &LogicalCard> {
        self.won.iter()
    }

    #[must_use]
    pub fn won_count(&self) -> usize {
        self.won.len()
    }

    pub fn add_won(&mut self, card: LogicalCard) {
        self.won.push_back(card);
    }
}

/// One seat's state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub hand: Hand,
    pub score: i64,
}

/// A card put on the table this round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub player: PlayerId,
    pub card: LogicalCard,
}

/// Complete state of one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Catalog id of the active variant.
    pub variant: String,

    pub phase: Phase,

    pub players: PlayerMap<Player>,

    pub deck: Deck,

    pub discard: Vector<LogicalCard>,

    /// Plays of the current round, in order.
    pub table: SmallVec<[Play; 8]>,

    /// Cards carried over from tied rounds.
    pub pot: Vector<LogicalCard>,

    /// Seat expected to present the next card.
    pub turn: PlayerId,

    /// Seat that opened the current round.
    pub leader: PlayerId,

    /// Current round, starting at 1 once dealt.
    pub round: u32,

    /// Trump suit, for variants that turn one up.
    pub trump: Option<Suit>,

    /// Rank called by the active seat, for variants that ask for one.
    pub called: Option<Rank>,
}

impl GameState {
    /// Fresh state for a selected variant, before dealing.
    #[must_use]
    pub fn new(variant: impl Into<String>, player_count: usize, deck: Deck) -> Self {
        Self {
            variant: variant.into(),
            phase: Phase::Setup,
            players: PlayerMap::new(player_count, |id| Player {
                id,
                hand: Hand::new(),
                score: 0,
            }),
            deck,
            discard: Vector::new(),
            table: SmallVec::new(),
            pot: Vector::new(),
            turn: PlayerId::new(0),
            leader: PlayerId::new(0),
            round: 0,
            trump: None,
            called: None,
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.player_count()
    }

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> &Hand {
        &self.players[player].hand
    }

    #[must_use]
    pub fn score(&self, player: PlayerId) -> i64 {
        self.players[player].score
    }

    /// Cards `player` has put on the table this round.
    #[must_use]
    pub fn plays_by(&self, player: PlayerId) -> usize {
        self.table.iter().filter(|p| p.player == player).count()
    }

    /// Cards `player` holds in hand plus their won pile.
    #[must_use]
    pub fn cards_held(&self, player: PlayerId) -> usize {
        let hand = self.hand(player);
        hand.len() + hand.won_count()
    }

    /// Every card the game currently tracks, wherever it is.
    pub fn all_cards(&self) -> impl Iterator<Item = &LogicalCard> {
        self.deck
            .cards()
            .chain(self.players.values().flat_map(|p| p.hand.cards().chain(p.hand.won())))
            .chain(self.table.iter().map(|play| &play.card))
            .chain(self.pot.iter())
            .chain(self.discard.iter())
    }

    /// Verify that the tracked cards are exactly the deck's fixed set.
    pub fn check_conservation(&self) -> Result<()> {
        let mut counts: FxHashMap<&LogicalCard, i64> = FxHashMap::default();
        for card in self.deck.full_set() {
            *counts.entry(card).or_default() += 1;
        }
        for card in self.all_cards() {
            *counts.entry(card).or_default() -= 1;
        }
        if let Some((card, diff)) = counts.into_iter().find(|(_, diff)| *diff != 0) {
            let problem = if diff > 0 { "missing" } else { "duplicated" };
            return Err(GameError::Consistency(format!(
                "{card} is {problem} in {} (expected {} cards)",
                self.variant,
                self.deck.size()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::DeckSpec;

    fn state() -> GameState {
        let deck = Deck::build(&DeckSpec::standard()).unwrap();
        GameState::new("war", 2, deck)
    }

    #[test]
    fn test_new_state_conserves() {
        let state = state();
        assert_eq!(state.phase, Phase::Setup);
        assert_eq!(state.all_cards().count(), 52);
        assert!(state.check_conservation().is_ok());
    }

    #[test]
    fn test_moving_cards_conserves() {
        let mut state = state();
        let drawn = state.deck.draw(3).unwrap();
        state.players[PlayerId::new(0)].hand.push_bottom(drawn[0].clone());
        state.players[PlayerId::new(1)].hand.add_won(drawn[1].clone());
        state.table.push(Play {
            player: PlayerId::new(1),
            card: drawn[2].clone(),
        });
        assert!(state.check_conservation().is_ok());
    }

    #[test]
    fn test_lost_card_detected() {
        let mut state = state();
        state.deck.draw(1).unwrap();
        assert!(matches!(state.check_conservation(), Err(GameError::Consistency(_))));
    }

    #[test]
    fn test_duplicate_card_detected() {
        let mut state = state();
        let card = state.deck.cards().next().cloned().unwrap();
        state.discard.push_back(card);
        assert!(matches!(state.check_conservation(), Err(GameError::Consistency(_))));
    }

    #[test]
    fn test_hand_operations() {
        let mut hand = Hand::new();
        hand.push_bottom(LogicalCard::new("Hearts", "5"));
        hand.push_bottom(LogicalCard::new("Spades", "5"));
        hand.push_bottom(LogicalCard::new("Spades", "K"));

        assert_eq!(hand.top(), Some(&LogicalCard::new("Hearts", "5")));
        assert_eq!(hand.count_rank(&Rank::new("5")), 2);

        let fives = hand.take_rank(&Rank::new("5"));
        assert_eq!(fives.len(), 2);
        assert_eq!(hand.len(), 1);

        assert!(hand.remove(&LogicalCard::new("Spades", "K")));
        assert!(!hand.remove(&LogicalCard::new("Spades", "K")));
        assert!(hand.is_empty());
    }
}
