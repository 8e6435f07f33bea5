use boxq_heap::{Entry, PriorityQueue, SortOrder};
use boxq_storage::{AppState, Database};
use boxq_vm::{BudgetMeter, Unmetered};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;

const ELEMENT_SIZE: usize = 32;
const CAPACITY: usize = 1024;

fn queue(order: SortOrder) -> PriorityQueue {
    PriorityQueue::with_element_size(
        b"bench".to_vec(),
        CAPACITY * ELEMENT_SIZE,
        order,
        ELEMENT_SIZE,
    )
    .unwrap()
}

fn element(key: u64, sequence: u64) -> Vec<u8> {
    Entry::new(key, sequence).encode(ELEMENT_SIZE).unwrap()
}

/// Pseudo-random keys, fixed across runs.
fn keys(n: usize) -> Vec<u64> {
    let mut x = 0x9e37_79b9_7f4a_7c15u64;
    (0..n)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x % 10_000
        })
        .collect()
}

fn filled(order: SortOrder, n: usize) -> (PriorityQueue, AppState) {
    let q = queue(order);
    let mut state = AppState::new();
    {
        let mut budget = Unmetered::new();
        let mut heap = q.bind(&mut state, &mut budget);
        heap.initialize().unwrap();
        for (seq, key) in keys(n).into_iter().enumerate() {
            heap.insert(&element(key, seq as u64)).unwrap();
        }
    }
    (q, state)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_insert");

    for order in [SortOrder::Ascending, SortOrder::Descending] {
        group.bench_function(format!("fill_1k_{order}"), |b| {
            b.iter_batched(
                || {
                    let q = queue(order);
                    let mut state = AppState::new();
                    q.bind(&mut state, &mut Unmetered::new()).initialize().unwrap();
                    (q, state, keys(CAPACITY))
                },
                |(q, mut state, keys)| {
                    let mut budget = Unmetered::new();
                    let mut heap = q.bind(&mut state, &mut budget);
                    for (seq, key) in keys.into_iter().enumerate() {
                        heap.insert(&element(key, seq as u64)).unwrap();
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.bench_function("metered_fill_256", |b| {
        b.iter_batched(
            || {
                let q = queue(SortOrder::Ascending);
                let mut state = AppState::new();
                q.bind(&mut state, &mut Unmetered::new()).initialize().unwrap();
                (q, state, keys(256))
            },
            |(q, mut state, keys)| {
                let mut budget = BudgetMeter::with_default_schedule();
                let mut heap = q.bind(&mut state, &mut budget);
                for (seq, key) in keys.into_iter().enumerate() {
                    heap.insert(&element(key, seq as u64)).unwrap();
                }
                drop(heap);
                black_box(budget.inner_calls())
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_pop");

    group.bench_function("drain_1k", |b| {
        b.iter_batched(
            || filled(SortOrder::Ascending, CAPACITY),
            |(q, mut state)| {
                let mut budget = Unmetered::new();
                let mut heap = q.bind(&mut state, &mut budget);
                while let Ok(top) = heap.pop() {
                    black_box(top);
                }
            },
            BatchSize::SmallInput,
        )
    });

    let (q, mut state) = filled(SortOrder::Ascending, CAPACITY);
    group.bench_function("peek", |b| {
        b.iter(|| {
            let mut budget = Unmetered::new();
            black_box(q.bind(&mut state, &mut budget).peek().unwrap())
        })
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_search");
    let (q, mut state) = filled(SortOrder::Descending, CAPACITY);
    let missing = element(u64::MAX, u64::MAX);

    group.bench_function("miss_1k", |b| {
        b.iter(|| {
            let mut budget = Unmetered::new();
            black_box(q.bind(&mut state, &mut budget).search(&missing).unwrap())
        })
    });

    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_persistence");
    let (_, state) = filled(SortOrder::Ascending, CAPACITY);

    group.bench_function("save_load_1k", |b| {
        b.iter_batched(
            || TempDir::new().unwrap(),
            |dir| {
                let db = Database::open(dir.path()).unwrap();
                db.save(&state).unwrap();
                black_box(db.load().unwrap())
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_pop, bench_search, bench_persistence);
criterion_main!(benches);
