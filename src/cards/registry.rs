//! Physical-to-logical card bindings.
//!
//! The `CardRegistry` records which logical card each physical card currently
//! represents, what its e-paper actually shows, and which seat owns it. It
//! never owns the physical cards themselves; bindings are rebuilt as tags are
//! re-detected.
//!
//! Two invariants hold at all times:
//! - at most one physical card is bound to any logical card;
//! - at most one render is in flight per physical card, enforced by the
//!   per-id lock that port controllers take for the whole render sequence.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error};

use super::card::LogicalCard;
use crate::core::{GameError, PhysicalCardId, PlayerId, PortId, Result};

/// What a physical card represents and shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardBinding {
    /// Logical card the game currently assigns.
    pub assigned: Option<LogicalCard>,

    /// Logical card the e-paper last finished rendering.
    pub displayed: Option<LogicalCard>,

    /// Seat whose hand this physical card serves.
    pub owner: Option<PlayerId>,
}

impl CardBinding {
    /// Whether the display matches the assignment.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.assigned.is_some() && self.assigned == self.displayed
    }
}

/// Shared table of card bindings.
///
/// ```
/// use digital_deck::cards::{CardRegistry, LogicalCard};
/// use digital_deck::core::PhysicalCardId;
///
/// let mut registry = CardRegistry::new();
/// let tag = PhysicalCardId::new(0xA1);
/// let ace = LogicalCard::new("Spades", "A");
///
/// registry.assign(tag, ace.clone()).unwrap();
/// assert_eq!(registry.lookup(tag), Some(&ace));
/// assert_eq!(registry.reverse_lookup(&ace), Some(tag));
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    bindings: FxHashMap<PhysicalCardId, CardBinding>,
    by_logical: FxHashMap<LogicalCard, PhysicalCardId>,
    locks: FxHashMap<PhysicalCardId, PortId>,
}

impl CardRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a physical card to a logical card.
    ///
    /// Replaces any earlier assignment of `id`; the old face stays displayed
    /// until the next render. Returns the superseded assignment.
    ///
    /// Fails with `Consistency` if `card` is already bound to another
    /// physical card, and with `Busy` if `id` is mid-render. The registry is
    /// unchanged on failure.
    pub fn assign(&mut self, id: PhysicalCardId, card: LogicalCard) -> Result<Option<LogicalCard>> {
        if let Some(&holder) = self.by_logical.get(&card) {
            if holder != id {
                error!(%id, %holder, %card, "rejected double binding");
                return Err(GameError::Consistency(format!(
                    "{card} is already bound to {holder}, refusing to bind {id}"
                )));
            }
        }
        if self.is_locked(id) {
            return Err(GameError::Busy(id));
        }

        let binding = self.bindings.entry(id).or_default();
        let previous = binding.assigned.replace(card.clone());
        if let Some(old) = &previous {
            self.by_logical.remove(old);
        }
        self.by_logical.insert(card, id);
        debug!(%id, "assigned");
        Ok(previous)
    }

    /// Mark a physical card as representing nothing.
    pub fn unassign(&mut self, id: PhysicalCardId) -> Result<Option<LogicalCard>> {
        if self.is_locked(id) {
            return Err(GameError::Busy(id));
        }
        let previous = self
            .bindings
            .get_mut(&id)
            .and_then(|binding| binding.assigned.take());
        if let Some(old) = &previous {
            self.by_logical.remove(old);
            debug!(%id, card = %old, "unassigned");
        }
        Ok(previous)
    }

    /// Logical card assigned to `id`.
    #[must_use]
    pub fn lookup(&self, id: PhysicalCardId) -> Option<&LogicalCard> {
        self.bindings.get(&id).and_then(|b| b.assigned.as_ref())
    }

    /// Physical card currently bound to `card`.
    #[must_use]
    pub fn reverse_lookup(&self, card: &LogicalCard) -> Option<PhysicalCardId> {
        self.by_logical.get(card).copied()
    }

    #[must_use]
    pub fn binding(&self, id: PhysicalCardId) -> Option<&CardBinding> {
        self.bindings.get(&id)
    }

    /// Whether the registry has ever seen `id`.
    #[must_use]
    pub fn contains(&self, id: PhysicalCardId) -> bool {
        self.bindings.contains_key(&id)
    }

    /// Record which seat a physical card belongs to.
    pub fn set_owner(&mut self, id: PhysicalCardId, owner: Option<PlayerId>) {
        self.bindings.entry(id).or_default().owner = owner;
    }

    #[must_use]
    pub fn owner(&self, id: PhysicalCardId) -> Option<PlayerId> {
        self.bindings.get(&id).and_then(|b| b.owner)
    }

    /// Take the per-id lock for a port. Returns false if another port holds it.
    pub fn try_lock(&mut self, id: PhysicalCardId, holder: PortId) -> bool {
        match self.locks.get(&id) {
            Some(&current) => current == holder,
            None => {
                self.locks.insert(id, holder);
                true
            }
        }
    }

    /// Release the per-id lock.
    pub fn release(&mut self, id: PhysicalCardId) {
        self.locks.remove(&id);
    }

    #[must_use]
    pub fn is_locked(&self, id: PhysicalCardId) -> bool {
        self.locks.contains_key(&id)
    }

    /// Record a finished render.
    pub fn mark_displayed(&mut self, id: PhysicalCardId, card: LogicalCard) {
        self.bindings.entry(id).or_default().displayed = Some(card);
    }

    /// Forget what a card shows (after a clear, or when the face is unknown).
    pub fn clear_displayed(&mut self, id: PhysicalCardId) {
        if let Some(binding) = self.bindings.get_mut(&id) {
            binding.displayed = None;
        }
    }

    /// Drop every assignment and display record, keeping owners.
    ///
    /// Locks survive: a render in flight still owns its card.
    pub fn clear_assignments(&mut self) {
        for binding in self.bindings.values_mut() {
            binding.assigned = None;
            binding.displayed = None;
        }
        self.by_logical.clear();
    }

    /// Iterate over all known physical cards and their bindings.
    pub fn iter(&self) -> impl Iterator<Item = (PhysicalCardId, &CardBinding)> {
        self.bindings.iter().map(|(&id, binding)| (id, binding))
    }

    /// Number of physical cards currently assigned.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.by_logical.len()
    }

    /// Verify the reverse index is a bijection with the assignments.
    pub fn check_consistency(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for (&id, binding) in &self.bindings {
            let Some(card) = &binding.assigned else {
                continue;
            };
            if !seen.insert(card) {
                return Err(GameError::Consistency(format!("{card} bound twice")));
            }
            if self.by_logical.get(card) != Some(&id) {
                return Err(GameError::Consistency(format!(
                    "reverse index for {card} does not point at {id}"
                )));
            }
        }
        if seen.len() != self.by_logical.len() {
            return Err(GameError::Consistency(
                "reverse index holds stale entries".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(n: u64) -> PhysicalCardId {
        PhysicalCardId::new(n)
    }

    #[test]
    fn test_assign_overwrites() {
        let mut registry = CardRegistry::new();
        let two = LogicalCard::new("Hearts", "2");
        let three = LogicalCard::new("Hearts", "3");

        assert_eq!(registry.assign(tag(1), two.clone()).unwrap(), None);
        assert_eq!(registry.assign(tag(1), three.clone()).unwrap(), Some(two.clone()));

        assert_eq!(registry.lookup(tag(1)), Some(&three));
        assert_eq!(registry.reverse_lookup(&two), None);
        assert_eq!(registry.reverse_lookup(&three), Some(tag(1)));
        assert!(registry.check_consistency().is_ok());
    }

    #[test]
    fn test_double_binding_rejected() {
        let mut registry = CardRegistry::new();
        let ace = LogicalCard::new("Spades", "A");

        registry.assign(tag(1), ace.clone()).unwrap();
        let err = registry.assign(tag(2), ace.clone()).unwrap_err();

        assert!(matches!(err, GameError::Consistency(_)));
        assert_eq!(registry.reverse_lookup(&ace), Some(tag(1)));
        assert_eq!(registry.lookup(tag(2)), None);
    }

    #[test]
    fn test_reassign_same_card_same_id_is_fine() {
        let mut registry = CardRegistry::new();
        let ace = LogicalCard::new("Spades", "A");
        registry.assign(tag(1), ace.clone()).unwrap();
        assert_eq!(registry.assign(tag(1), ace.clone()).unwrap(), Some(ace));
        assert_eq!(registry.assigned_count(), 1);
    }

    #[test]
    fn test_unassign() {
        let mut registry = CardRegistry::new();
        let ace = LogicalCard::new("Spades", "A");
        registry.assign(tag(1), ace.clone()).unwrap();

        assert_eq!(registry.unassign(tag(1)).unwrap(), Some(ace.clone()));
        assert_eq!(registry.lookup(tag(1)), None);
        assert_eq!(registry.reverse_lookup(&ace), None);
        assert_eq!(registry.unassign(tag(9)).unwrap(), None);
    }

    #[test]
    fn test_lock_blocks_assignment() {
        let mut registry = CardRegistry::new();
        let port = PortId::new(0);

        assert!(registry.try_lock(tag(1), port));
        assert!(registry.try_lock(tag(1), port));
        assert!(!registry.try_lock(tag(1), PortId::new(1)));

        let err = registry.assign(tag(1), LogicalCard::new("Clubs", "5")).unwrap_err();
        assert_eq!(err, GameError::Busy(tag(1)));
        assert_eq!(registry.unassign(tag(1)).unwrap_err(), GameError::Busy(tag(1)));

        registry.release(tag(1));
        assert!(registry.assign(tag(1), LogicalCard::new("Clubs", "5")).is_ok());
    }

    #[test]
    fn test_display_tracking() {
        let mut registry = CardRegistry::new();
        let five = LogicalCard::new("Clubs", "5");
        registry.assign(tag(1), five.clone()).unwrap();
        assert!(!registry.binding(tag(1)).unwrap().is_settled());

        registry.mark_displayed(tag(1), five);
        assert!(registry.binding(tag(1)).unwrap().is_settled());

        registry.assign(tag(1), LogicalCard::new("Clubs", "6")).unwrap();
        let binding = registry.binding(tag(1)).unwrap();
        assert!(!binding.is_settled());
        assert_eq!(binding.displayed, Some(LogicalCard::new("Clubs", "5")));
    }

    #[test]
    fn test_owner_survives_clear() {
        let mut registry = CardRegistry::new();
        registry.set_owner(tag(4), Some(PlayerId::new(1)));
        registry.assign(tag(4), LogicalCard::new("Oros", "1")).unwrap();
        registry.clear_assignments();

        assert_eq!(registry.owner(tag(4)), Some(PlayerId::new(1)));
        assert_eq!(registry.lookup(tag(4)), None);
        assert_eq!(registry.assigned_count(), 0);
    }
}
