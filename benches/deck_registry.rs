//! Benchmarks for the hot paths of a table session.
//!
//! Shuffle and deal a fresh deck, and churn carrier assignments the way the
//! engine does after every play.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use digital_deck::cards::{CardRegistry, Deck, DeckSpec, LogicalCard};
use digital_deck::core::PhysicalCardId;
use digital_deck::rules::poker::evaluate_hand;

fn benchmark_shuffle_and_deal(c: &mut Criterion) {
    let template = Deck::build(&DeckSpec::standard()).expect("standard deck");

    c.bench_function("deck_shuffle_deal_52", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            let mut deck = template.clone();
            deck.reset();
            deck.shuffle(Some(seed));
            seed += 1;
            let hands = deck.draw(52).expect("full deck");
            black_box(hands)
        })
    });
}

fn benchmark_registry_churn(c: &mut Criterion) {
    let cards: Vec<LogicalCard> = DeckSpec::standard().cards().expect("standard deck");
    let carriers: Vec<PhysicalCardId> = (0..8).map(PhysicalCardId::new).collect();

    c.bench_function("registry_reassign_8_carriers", |b| {
        let mut registry = CardRegistry::new();
        let mut offset = 0usize;
        b.iter(|| {
            for (slot, &id) in carriers.iter().enumerate() {
                registry.unassign(id).expect("unlocked");
                let card = cards[(offset + slot * 6) % cards.len()].clone();
                registry.assign(id, card).expect("free card");
            }
            offset += 1;
            black_box(registry.assigned_count())
        })
    });

    c.bench_function("registry_lookup", |b| {
        let mut registry = CardRegistry::new();
        for (id, card) in carriers.iter().zip(&cards) {
            registry.assign(*id, card.clone()).expect("free card");
        }
        b.iter(|| {
            let mut found = 0;
            for &id in &carriers {
                if let Some(card) = registry.lookup(black_box(id)) {
                    found += usize::from(registry.reverse_lookup(card) == Some(id));
                }
            }
            black_box(found)
        })
    });
}

fn benchmark_poker_evaluation(c: &mut Criterion) {
    let cards: Vec<LogicalCard> = DeckSpec::standard().cards().expect("standard deck");
    let hands: Vec<&[LogicalCard]> = cards.chunks_exact(5).collect();

    c.bench_function("poker_evaluate_10_hands", |b| {
        b.iter(|| {
            let best = hands.iter().filter_map(|hand| evaluate_hand(hand)).max();
            black_box(best)
        })
    });
}

criterion_group!(
    benches,
    benchmark_shuffle_and_deal,
    benchmark_registry_churn,
    benchmark_poker_evaluation
);
criterion_main!(benches);
