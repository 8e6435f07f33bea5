use boxq_contract_examples::OrderBook;
use boxq_storage::AppState;
use boxq_types::Address;
use boxq_vm::Unmetered;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_book");
    let buyer = Address::from_bytes([1u8; 32]);
    let seller = Address::from_bytes([2u8; 32]);

    group.bench_function("place_and_match_256", |b| {
        b.iter_batched(
            || {
                let book = OrderBook::new(256).unwrap();
                let mut state = AppState::new();
                book.create(&mut state, &mut Unmetered::new()).unwrap();
                (book, state)
            },
            |(book, mut state)| {
                let budget = &mut Unmetered::new();
                for i in 0..256u64 {
                    book.place_bid(&mut state, budget, buyer, 1_000 + i % 17, 3).unwrap();
                    book.place_ask(&mut state, budget, seller, 1_000 - i % 13, 2).unwrap();
                }
                while let Some(fill) = book.match_top(&mut state, budget).unwrap() {
                    black_box(fill);
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);
