use super::*;

use boxq_storage::AppState;
use boxq_vm::Unmetered;
use proptest::prelude::*;

const ELEMENT_SIZE: usize = 24;
const CAPACITY: usize = 48;

#[derive(Clone, Debug)]
enum Op {
    Insert(u64),
    Pop,
    Peek,
    RemoveAt(usize),
    RemoveValue(usize),
    Update(usize, u64),
}

fn key_strategy() -> impl Strategy<Value = u64> + Clone {
    // Mostly a handful of keys so ties are common
    prop_oneof![
        8 => 0u64..6,
        1 => Just(u64::MAX),
        1 => any::<u64>(),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        40 => key.clone().prop_map(Op::Insert),
        20 => Just(Op::Pop),
        5 => Just(Op::Peek),
        10 => any::<usize>().prop_map(Op::RemoveAt),
        10 => any::<usize>().prop_map(Op::RemoveValue),
        10 => (any::<usize>(), key).prop_map(|(i, k)| Op::Update(i, k)),
    ];
    prop::collection::vec(op, 0..=300)
}

fn encode(key: u64, sequence: u64) -> Vec<u8> {
    Entry::new(key, sequence)
        .with_payload(sequence.to_le_bytes().to_vec())
        .encode(ELEMENT_SIZE)
        .unwrap()
}

/// Index of the model element that should come out first.
fn model_top(model: &[SortKey], order: SortOrder) -> Option<usize> {
    (0..model.len()).min_by(|a, b| model[*a].priority_cmp(&model[*b], order))
}

fn run(ops: Vec<Op>, order: SortOrder) -> Result<(), TestCaseError> {
    let queue = PriorityQueue::with_element_size(
        b"prop".to_vec(),
        CAPACITY * ELEMENT_SIZE,
        order,
        ELEMENT_SIZE,
    )
    .unwrap();
    let mut state = AppState::new();
    let mut budget = Unmetered::new();
    let mut heap = queue.bind(&mut state, &mut budget);
    heap.initialize().unwrap();

    let mut model: Vec<SortKey> = Vec::new();
    let mut next_sequence = 0u64;

    for op in ops {
        match op {
            Op::Insert(key) => {
                let sequence = next_sequence;
                next_sequence += 1;
                let result = heap.insert(&encode(key, sequence));
                if model.len() == CAPACITY {
                    prop_assert_eq!(
                        result,
                        Err(HeapError::CapacityExceeded { capacity: CAPACITY as u64 })
                    );
                } else {
                    prop_assert!(result.is_ok());
                    model.push(SortKey::new(key, sequence));
                }
            }
            Op::Pop => match model_top(&model, order) {
                None => prop_assert_eq!(heap.pop(), Err(HeapError::EmptyHeap)),
                Some(i) => {
                    let expected = model.swap_remove(i);
                    let got = heap.pop().unwrap();
                    prop_assert_eq!(SortKey::from_element(&got), Some(expected));
                }
            },
            Op::Peek => match model_top(&model, order) {
                None => prop_assert_eq!(heap.peek(), Err(HeapError::EmptyHeap)),
                Some(i) => {
                    let got = heap.peek().unwrap();
                    prop_assert_eq!(SortKey::from_element(&got), Some(model[i]));
                }
            },
            Op::RemoveAt(i) => {
                if model.is_empty() {
                    continue;
                }
                let idx = (i % model.len()) as u64;
                let removed = heap.remove_at(idx).unwrap();
                let removed = SortKey::from_element(&removed).unwrap();
                let pos = model.iter().position(|k| *k == removed);
                prop_assert!(pos.is_some(), "removed element not in model");
                if let Some(pos) = pos {
                    model.swap_remove(pos);
                }
            }
            Op::RemoveValue(i) => {
                if model.is_empty() {
                    prop_assert_eq!(
                        heap.remove(&encode(0, u64::MAX)),
                        Err(HeapError::ElementNotFound)
                    );
                    continue;
                }
                let target = model.swap_remove(i % model.len());
                heap.remove(&encode(target.key, target.sequence)).unwrap();
                prop_assert_eq!(heap.search(&encode(target.key, target.sequence)).unwrap(), None);
            }
            Op::Update(i, key) => {
                if model.is_empty() {
                    continue;
                }
                let idx = (i % model.len()) as u64;
                let old = SortKey::from_element(&heap.get(idx).unwrap()).unwrap();
                let sequence = next_sequence;
                next_sequence += 1;
                heap.update(idx, &encode(key, sequence)).unwrap();
                if let Some(pos) = model.iter().position(|k| *k == old) {
                    model[pos] = SortKey::new(key, sequence);
                }
            }
        }

        prop_assert_eq!(heap.count().unwrap(), model.len() as u64);
        prop_assert_eq!(heap.verify(), Ok(()));
    }

    // Draining yields the model in priority order
    model.sort_by(|a, b| a.priority_cmp(b, order));
    for expected in model {
        let got = heap.pop().unwrap();
        prop_assert_eq!(SortKey::from_element(&got), Some(expected));
    }
    prop_assert_eq!(heap.pop(), Err(HeapError::EmptyHeap));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_matches_model_ascending(ops in ops_strategy()) {
        run(ops, SortOrder::Ascending)?;
    }

    #[test]
    fn prop_matches_model_descending(ops in ops_strategy()) {
        run(ops, SortOrder::Descending)?;
    }

    #[test]
    fn prop_search_finds_every_live_element(
        keys in prop::collection::vec(key_strategy(), 1..CAPACITY)
    ) {
        let queue = PriorityQueue::with_element_size(
            b"prop".to_vec(),
            CAPACITY * ELEMENT_SIZE,
            SortOrder::Ascending,
            ELEMENT_SIZE,
        )
        .unwrap();
        let mut state = AppState::new();
        let mut budget = Unmetered::new();
        let mut heap = queue.bind(&mut state, &mut budget);
        heap.initialize().unwrap();

        for (seq, key) in keys.iter().enumerate() {
            heap.insert(&encode(*key, seq as u64)).unwrap();
        }
        for (seq, key) in keys.iter().enumerate() {
            let element = encode(*key, seq as u64);
            let idx = heap.search(&element).unwrap();
            prop_assert!(idx.is_some());
            if let Some(idx) = idx {
                prop_assert_eq!(heap.get(idx).unwrap(), element);
            }
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(
        items: &[T],
        used: &mut [bool],
        out: &mut Vec<T>,
        f: &mut impl FnMut(Vec<T>),
    ) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    // Duplicated keys exercise the sequence tie-break in every position
    let keys = [3u64, 1, 3, 0, 2, 1];
    for order in [SortOrder::Ascending, SortOrder::Descending] {
        for_each_permutation(&keys, |perm| {
            let queue = PriorityQueue::with_element_size(
                b"perm".to_vec(),
                keys.len() * ELEMENT_SIZE,
                order,
                ELEMENT_SIZE,
            )
            .unwrap();
            let mut state = AppState::new();
            let mut budget = Unmetered::new();
            let mut heap = queue.bind(&mut state, &mut budget);
            heap.initialize().unwrap();

            let mut expected: Vec<SortKey> = Vec::new();
            for (seq, key) in perm.iter().enumerate() {
                heap.insert(&encode(*key, seq as u64)).unwrap();
                expected.push(SortKey::new(*key, seq as u64));
            }
            expected.sort_by(|a, b| a.priority_cmp(b, order));

            for want in expected {
                let got = heap.pop().unwrap();
                assert_eq!(SortKey::from_element(&got), Some(want));
            }
            heap.verify().unwrap();
        });
    }
}
