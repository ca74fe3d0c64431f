extern crate std;

use std::{fmt, mem, prelude::v1::*, slice};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{
    inspect::{Inspect, NodeView},
    Error, Operation, Sequence,
};

/// Switches for the structural checks made by [`Harness::check_tree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CheckConfig {
    /// Check that every node's parent link points at the node it hangs from.
    pub parent_pointers: bool,
    /// Check that sibling subtrees differ in depth by at most one.
    pub check_depth: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            parent_pointers: true,
            check_depth: true,
        }
    }
}

/// Drives a [`Sequence`] and a [`Vec`] in lockstep, panicking as soon as they disagree.
pub struct Harness<V> {
    tested: Sequence<V>,
    reference: Vec<V>,
    config: CheckConfig,
}

impl<V> Harness<V>
where
    V: Clone + PartialEq + fmt::Debug,
{
    pub fn new() -> Self {
        Self::with_config(CheckConfig::default())
    }

    pub fn with_config(config: CheckConfig) -> Self {
        Harness {
            tested: Sequence::new(),
            reference: Vec::new(),
            config,
        }
    }

    pub fn tested(&self) -> &Sequence<V> {
        &self.tested
    }

    pub fn len(&self) -> usize {
        let empty = self.tested.is_empty();
        let len = self.tested.len();

        assert_eq!(empty, len == 0, "size: len is {len} but is_empty is {empty}");
        assert_eq!(len, self.reference.len(), "size mismatch");

        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> &V {
        let expected = &self.reference[index];
        let actual = self.tested.get(index).expect("get rejected a valid index");

        assert_eq!(expected, actual, "get({index}) mismatch");
        actual
    }

    pub fn assign(&mut self, index: usize, value: V) {
        let expected = mem::replace(&mut self.reference[index], value.clone());
        let actual = self
            .tested
            .set(index, value)
            .expect("set rejected a valid index");

        assert_eq!(expected, actual, "set({index}) returned the wrong element");
        self.get(index);
    }

    pub fn insert(&mut self, index: usize, value: V, check_tree: bool) {
        self.reference.insert(index, value.clone());
        self.tested
            .insert(index, value)
            .expect("insert rejected a valid index");

        self.len();
        if check_tree {
            self.check_tree();
        }
    }

    pub fn erase(&mut self, index: usize, check_tree: bool) -> V {
        let expected = self.reference.remove(index);
        let actual = self
            .tested
            .erase(index)
            .expect("erase rejected a valid index");

        assert_eq!(expected, actual, "erase({index}) mismatch");

        self.len();
        if check_tree {
            self.check_tree();
        }

        actual
    }

    /// Asserts that `op` at `index` is rejected and leaves the sequence unchanged.
    ///
    /// `value` is used by the operations that take one.
    pub fn reject(&mut self, op: Operation, index: usize, value: V) {
        let len = self.len();

        let err = match op {
            Operation::Get => self.tested.get(index).err(),
            Operation::Set => self.tested.set(index, value).err(),
            Operation::Insert => self.tested.insert(index, value).err(),
            Operation::Erase => self.tested.erase(index).err(),
        };

        assert_eq!(err, Some(Error::OutOfRange { op, index, len }));
        self.check_contents();
    }

    /// Asserts that every element matches the reference.
    pub fn check_contents(&self) {
        for index in 0..self.len() {
            self.get(index);
        }
    }

    /// Walks the tree through [`Inspect`] and checks its shape and contents against the
    /// reference.
    pub fn check_tree(&self) {
        self.len();

        let mut expected = self.reference.iter();

        if let Some(root) = self.tested.root() {
            self.check_node(root, None, &mut expected);
        }

        assert!(expected.next().is_none(), "check tree: element mismatch");

        self.tested.assert_invariants();
    }

    // Returns the depth of the subtree rooted at `node`.
    fn check_node<'a>(
        &'a self,
        node: NodeView<'a, V>,
        parent: Option<NodeView<'a, V>>,
        expected: &mut slice::Iter<'a, V>,
    ) -> i32 {
        if self.config.parent_pointers {
            assert!(node.parent() == parent, "parent mismatch at {node:?}");
        }

        let left_depth = node
            .left()
            .map_or(-1, |left| self.check_node(left, Some(node), expected));

        assert_eq!(
            expected.next(),
            Some(node.value()),
            "check tree: element mismatch"
        );

        let right_depth = node
            .right()
            .map_or(-1, |right| self.check_node(right, Some(node), expected));

        if self.config.check_depth {
            assert!(
                (left_depth - right_depth).abs() <= 1,
                "tree is not avl balanced: left depth {left_depth} and right depth {right_depth}"
            );
        }

        left_depth.max(right_depth) + 1
    }
}

impl<V> Default for Harness<V>
where
    V: Clone + PartialEq + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Position {
    Index(usize),
    Front,
    Back,
}

impl Position {
    // Maps the position onto `0..bound`. `bound` must not be zero.
    fn resolve(self, bound: usize) -> usize {
        match self {
            Position::Index(index) => index % bound,
            Position::Front => 0,
            Position::Back => bound - 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(Position, u32),
    Erase(Position),
    Assign(Position, u32),
    Get(Position),
    /// Every operation at a position `n` past the last valid one.
    Overrun(u8),
}

impl Op {
    // Resolves the operation against a sequence of length `len`. Operations that need an element
    // are dropped while the sequence is empty.
    fn finalize(self, len: usize) -> Option<FinalOp> {
        let nonempty = len > 0;

        match self {
            Op::Insert(pos, value) => Some(FinalOp::Insert(pos.resolve(len + 1), value)),
            Op::Erase(pos) => nonempty.then(|| FinalOp::Erase(pos.resolve(len))),
            Op::Assign(pos, value) => nonempty.then(|| FinalOp::Assign(pos.resolve(len), value)),
            Op::Get(pos) => nonempty.then(|| FinalOp::Get(pos.resolve(len))),
            Op::Overrun(extra) => Some(FinalOp::Overrun(len + usize::from(extra))),
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(usize, u32),
    Erase(usize),
    Assign(usize, u32),
    Get(usize),
    Overrun(usize),
}

fn position_strategy() -> impl Strategy<Value = Position> {
    proptest::prop_oneof![
        (0usize..1000).prop_map(Position::Index),
        Just(Position::Front),
        Just(Position::Back),
    ]
}

fn value_strategy() -> impl Strategy<Value = u32> {
    0u32..1_000_000
}

/// Any operation at any position.
pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        3 => (position_strategy(), value_strategy()).prop_map(|(pos, v)| Op::Insert(pos, v)),
        2 => position_strategy().prop_map(Op::Erase),
        1 => (position_strategy(), value_strategy()).prop_map(|(pos, v)| Op::Assign(pos, v)),
        2 => position_strategy().prop_map(Op::Get),
        1 => (0u8..4).prop_map(Op::Overrun),
    ]
}

/// Insertions and removals at the front only, which keeps hitting the same spine of the tree.
pub fn front_op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        3 => value_strategy().prop_map(|v| Op::Insert(Position::Front, v)),
        2 => Just(Op::Erase(Position::Front)),
        2 => position_strategy().prop_map(Op::Get),
    ]
}

/// Operations that never remove an element.
pub fn grow_op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        3 => (position_strategy(), value_strategy()).prop_map(|(pos, v)| Op::Insert(pos, v)),
        1 => (position_strategy(), value_strategy()).prop_map(|(pos, v)| Op::Assign(pos, v)),
        2 => position_strategy().prop_map(Op::Get),
    ]
}

pub fn run_vec_equivalence(ops: Vec<Op>) {
    let mut harness = Harness::new();

    for op in ops {
        let Some(final_op) = op.finalize(harness.len()) else {
            continue;
        };

        match final_op {
            FinalOp::Insert(index, value) => harness.insert(index, value, true),

            FinalOp::Erase(index) => {
                harness.erase(index, true);
            }

            FinalOp::Assign(index, value) => harness.assign(index, value),

            FinalOp::Get(index) => {
                harness.get(index);
            }

            FinalOp::Overrun(index) => {
                for op in [Operation::Get, Operation::Set, Operation::Erase] {
                    harness.reject(op, index, 0);
                }
                harness.reject(Operation::Insert, index + 1, 0);
            }
        }
    }

    harness.check_tree();
}
