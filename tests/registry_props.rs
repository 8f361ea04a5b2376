//! Property tests for the card registry.
//!
//! Whatever sequence of assignments, unassignments and locks is applied,
//! no logical card is ever bound to two physical cards and the reverse
//! index stays in step with the bindings.

use proptest::prelude::*;

use digital_deck::cards::{CardRegistry, LogicalCard};
use digital_deck::core::{GameError, PhysicalCardId, PortId};

#[derive(Clone, Debug)]
enum Op {
    Assign(u64, usize),
    Unassign(u64),
    Lock(u64),
    Release(u64),
    MarkDisplayed(u64),
    Clear,
}

fn card(index: usize) -> LogicalCard {
    const SUITS: [&str; 2] = ["Hearts", "Spades"];
    const RANKS: [&str; 4] = ["A", "K", "Q", "J"];
    LogicalCard::new(SUITS[index % 2], RANKS[(index / 2) % 4])
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u64..6, 0usize..8).prop_map(|(id, c)| Op::Assign(id, c)),
        2 => (0u64..6).prop_map(Op::Unassign),
        1 => (0u64..6).prop_map(Op::Lock),
        1 => (0u64..6).prop_map(Op::Release),
        1 => (0u64..6).prop_map(Op::MarkDisplayed),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    /// Test that no operation sequence double-binds a logical card.
    #[test]
    fn test_registry_never_double_binds(ops in prop::collection::vec(op(), 1..200)) {
        let mut registry = CardRegistry::new();
        for op in ops {
            match op {
                Op::Assign(id, c) => {
                    let id = PhysicalCardId::new(id);
                    let wanted = card(c);
                    let holder = registry.reverse_lookup(&wanted);
                    let locked = registry.is_locked(id);
                    let before = registry.lookup(id).cloned();
                    match registry.assign(id, wanted.clone()) {
                        Ok(previous) => {
                            prop_assert_eq!(previous, before);
                            prop_assert_eq!(registry.lookup(id), Some(&wanted));
                        }
                        Err(GameError::Consistency(_)) => {
                            prop_assert!(holder.is_some() && holder != Some(id));
                            prop_assert_eq!(registry.lookup(id).cloned(), before);
                        }
                        Err(GameError::Busy(busy)) => {
                            prop_assert!(locked);
                            prop_assert_eq!(busy, id);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                Op::Unassign(id) => {
                    let id = PhysicalCardId::new(id);
                    if registry.unassign(id).is_ok() {
                        prop_assert_eq!(registry.lookup(id), None);
                    } else {
                        prop_assert!(registry.is_locked(id));
                    }
                }
                Op::Lock(id) => {
                    let id = PhysicalCardId::new(id);
                    let was_locked = registry.is_locked(id);
                    let got = registry.try_lock(id, PortId::new(0));
                    prop_assert!(got || was_locked);
                    prop_assert!(registry.is_locked(id));
                }
                Op::Release(id) => {
                    let id = PhysicalCardId::new(id);
                    registry.release(id);
                    prop_assert!(!registry.is_locked(id));
                }
                Op::MarkDisplayed(id) => {
                    let id = PhysicalCardId::new(id);
                    if let Some(assigned) = registry.lookup(id).cloned() {
                        registry.mark_displayed(id, assigned);
                        prop_assert!(registry.binding(id).unwrap().is_settled());
                    }
                }
                Op::Clear => {
                    registry.clear_assignments();
                    prop_assert_eq!(registry.assigned_count(), 0);
                }
            }

            prop_assert!(registry.check_consistency().is_ok());
            for index in 0..8 {
                let logical = card(index);
                if let Some(id) = registry.reverse_lookup(&logical) {
                    prop_assert_eq!(registry.lookup(id), Some(&logical));
                }
            }
        }
    }
}
