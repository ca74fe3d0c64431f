use cordyceps_avl::{
    inspect::{Inspect, NodeView},
    Error, Operation, Sequence,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use test_case::test_case;

fn contents<V: Clone>(seq: &Sequence<V>) -> Vec<V> {
    (0..seq.len())
        .map(|index| seq.get(index).unwrap().clone())
        .collect()
}

// Returns the depth of the subtree under `node`, appending its elements in order to `out`.
fn check_node<'a>(
    node: NodeView<'a, u32>,
    parent: Option<NodeView<'a, u32>>,
    out: &mut Vec<u32>,
) -> i32 {
    assert!(node.parent() == parent, "parent mismatch");

    if let Some(parent) = parent {
        assert!(parent.left() == Some(node) || parent.right() == Some(node));
    }

    let left = node.left().map_or(-1, |left| check_node(left, Some(node), out));
    out.push(*node.value());
    let right = node.right().map_or(-1, |right| check_node(right, Some(node), out));

    assert!(
        (left - right).abs() <= 1,
        "not balanced: left depth {left}, right depth {right}"
    );

    left.max(right) + 1
}

fn check_tree(seq: &Sequence<u32>) {
    let mut in_order = Vec::new();

    if let Some(root) = seq.root() {
        assert!(root.parent().is_none(), "root has a parent");
        check_node(root, None, &mut in_order);
    }

    assert_eq!(in_order, contents(seq));
    assert_eq!(in_order.len(), seq.len());
}

fn sequence_of(len: u32) -> Sequence<u32> {
    let mut seq = Sequence::new();
    for value in 0..len {
        seq.push_back(value);
    }
    seq
}

#[test]
fn append_by_index() {
    let mut seq = Sequence::new();
    for i in 0..10 {
        seq.insert(i as usize, i).unwrap();
        check_tree(&seq);
    }

    assert_eq!(contents(&seq), (0..10).collect::<Vec<_>>());
}

#[test]
fn insert_at_front_shifts() {
    let mut seq = Sequence::new();
    seq.insert(0, 5).unwrap();
    seq.insert(0, 3).unwrap();

    assert_eq!(contents(&seq), [3, 5]);
    check_tree(&seq);
}

#[test]
fn erase_same_index_repeatedly() {
    let mut seq = sequence_of(20);

    for expected in 3..8 {
        assert_eq!(seq.erase(3), Ok(expected));
        check_tree(&seq);
    }

    let mut expected = vec![0, 1, 2];
    expected.extend(8..20);
    assert_eq!(contents(&seq), expected);
}

#[test_case(0 ; "empty")]
#[test_case(1 ; "single")]
#[test_case(7 ; "perfect")]
#[test_case(100 ; "larger")]
fn append_then_erase_round_trip(n: u32) {
    let mut seq = sequence_of(n);
    let len = seq.len();

    seq.insert(len, 999).unwrap();
    assert_eq!(seq.erase(len), Ok(999));

    assert_eq!(seq.len(), len);
    assert_eq!(contents(&seq), (0..n).collect::<Vec<_>>());
    check_tree(&seq);
}

#[test_case(Operation::Get, 5 ; "get at len")]
#[test_case(Operation::Set, 5 ; "set at len")]
#[test_case(Operation::Erase, 5 ; "erase at len")]
#[test_case(Operation::Insert, 6 ; "insert past len")]
#[test_case(Operation::Get, usize::MAX ; "get at max")]
fn out_of_range_leaves_sequence_untouched(op: Operation, index: usize) {
    let mut seq = sequence_of(5);

    let err = match op {
        Operation::Get => seq.get(index).err(),
        Operation::Set => seq.set(index, 42).err(),
        Operation::Insert => seq.insert(index, 42).err(),
        Operation::Erase => seq.erase(index).err(),
    };

    assert_eq!(err, Some(Error::OutOfRange { op, index, len: 5 }));
    assert_eq!(contents(&seq), [0, 1, 2, 3, 4]);
    check_tree(&seq);
}

#[test]
fn empty_sequence_rejects_everything_but_insert_at_zero() {
    let mut seq: Sequence<u32> = Sequence::default();
    assert!(seq.is_empty());

    assert!(seq.get(0).is_err());
    assert!(seq.set(0, 1).is_err());
    assert!(seq.erase(0).is_err());
    assert!(seq.insert(1, 1).is_err());
    assert_eq!(seq.pop_back(), None);
    assert!(seq.root().is_none());

    seq.insert(0, 1).unwrap();
    assert!(!seq.is_empty());
    check_tree(&seq);
}

#[test]
fn set_replaces_and_returns_previous() {
    let mut seq = sequence_of(4);

    assert_eq!(seq.set(2, 20), Ok(2));
    *seq.get_mut(3).unwrap() = 30;
    seq[0] = 10;

    assert_eq!(contents(&seq), [10, 1, 20, 30]);
    assert_eq!(seq[2], 20);
}

#[test]
#[should_panic(expected = "get index 3 out of range for sequence of length 3")]
fn index_out_of_range_panics() {
    let seq = sequence_of(3);
    let _value = seq[3];
}

#[test]
fn clear_then_reuse() {
    let mut seq = sequence_of(50);
    seq.clear();

    assert!(seq.is_empty());
    assert!(seq.root().is_none());

    seq.push_back(1);
    seq.push_back(2);
    assert_eq!(seq.pop_back(), Some(2));
    assert_eq!(contents(&seq), [1]);
    check_tree(&seq);
}

#[test]
fn owned_values_are_dropped_once() {
    use std::rc::Rc;

    let tracker = Rc::new(());
    let mut seq = Sequence::new();
    for _ in 0..64 {
        seq.insert(seq.len() / 2, Rc::clone(&tracker)).unwrap();
    }

    // Removing interior elements exercises the two-child case.
    for _ in 0..16 {
        drop(seq.erase(seq.len() / 2).unwrap());
    }
    assert_eq!(Rc::strong_count(&tracker), 1 + 48);

    drop(seq);
    assert_eq!(Rc::strong_count(&tracker), 1);
}

proptest! {
    #[test]
    fn insert_then_get_shifts_tail(len in 0u32..200, at in any::<prop::sample::Index>(), value in any::<u32>()) {
        let mut seq = sequence_of(len);
        let index = at.index(len as usize + 1);

        seq.insert(index, value).unwrap();

        prop_assert_eq!(seq.get(index), Ok(&value));
        for i in 0..len as usize {
            let expected = i as u32;
            let shifted = if i < index { i } else { i + 1 };
            prop_assert_eq!(seq.get(shifted), Ok(&expected));
        }

        // Reads do not disturb anything.
        prop_assert_eq!(seq.get(index), seq.get(index));

        prop_assert_eq!(seq.erase(index), Ok(value));
        prop_assert_eq!(contents(&seq), (0..len).collect::<Vec<_>>());
        check_tree(&seq);
    }

    #[test]
    fn invariants_hold_after_every_step(steps in prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 0..300)) {
        let mut seq = Sequence::new();
        let mut reference = Vec::new();

        for (value, (insert, at)) in (0u32..).zip(steps) {
            if insert || reference.is_empty() {
                let index = at.index(reference.len() + 1);
                seq.insert(index, value).unwrap();
                reference.insert(index, value);
            } else {
                let index = at.index(reference.len());
                prop_assert_eq!(seq.erase(index), Ok(reference.remove(index)));
            }

            check_tree(&seq);
            prop_assert_eq!(contents(&seq), reference.clone());
        }
    }
}
