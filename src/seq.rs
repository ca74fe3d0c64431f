extern crate alloc;

use alloc::boxed::Box;
use core::{
    fmt,
    marker::PhantomPinned,
    mem,
    ops::{Index, IndexMut},
    pin::Pin,
    ptr::NonNull,
};

use cordyceps::Linked;
use tracing::debug;

use crate::{
    inspect::{Inspect, NodeView},
    Error, Links, Operation, RankTree, Result, TreeNode,
};

/// A sequence addressed by position, based on an [AVL tree].
///
/// Indexed reads and writes, as well as insertion and removal at any position, complete in
/// _O(log(n))_ time.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct Sequence<V> {
    tree: RankTree<SeqNode<V>>,
}

pub(crate) struct SeqNode<V> {
    links: Links<SeqNode<V>>,
    pub(crate) value: V,
    _unpin: PhantomPinned,
}

impl<V> SeqNode<V> {
    fn new(value: V) -> Box<Self> {
        Box::new(SeqNode {
            links: Links::new(),
            value,
            _unpin: PhantomPinned,
        })
    }
}

unsafe impl<V> Linked<Links<SeqNode<V>>> for SeqNode<V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<SeqNode<V>>> {
        let ptr = ptr.as_ptr();
        NonNull::new(core::ptr::addr_of_mut!((*ptr).links)).unwrap()
    }
}

impl<V> TreeNode<Links<SeqNode<V>>> for SeqNode<V> {
    fn swap_payload(&mut self, other: &mut Self) {
        mem::swap(&mut self.value, &mut other.value);
    }
}

impl<V> Sequence<V> {
    /// Creates a new, empty `Sequence`.
    pub const fn new() -> Self {
        Self {
            tree: RankTree::new(),
        }
    }

    /// Returns `true` if the sequence contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the sequence.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns a reference to the element at position `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&V> {
        let len = self.len();

        self.tree
            .get(index)
            .map(|node| &Pin::get_ref(node).value)
            .ok_or_else(|| out_of_range(Operation::Get, index, len))
    }

    /// Returns a mutable reference to the element at position `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Result<&mut V> {
        self.value_mut(Operation::Get, index)
    }

    /// Replaces the element at position `index`, returning the previous element.
    #[inline]
    pub fn set(&mut self, index: usize, value: V) -> Result<V> {
        let slot = self.value_mut(Operation::Set, index)?;
        Ok(mem::replace(slot, value))
    }

    /// Inserts an element at position `index`, shifting all elements after it up by one.
    ///
    /// `index` may equal [`len`](Self::len), in which case the element is appended.
    pub fn insert(&mut self, index: usize, value: V) -> Result<()> {
        if !Operation::Insert.accepts(index, self.len()) {
            return Err(out_of_range(Operation::Insert, index, self.len()));
        }

        self.tree.insert_at(index, SeqNode::new(value));
        Ok(())
    }

    /// Removes and returns the element at position `index`, shifting all elements after it down
    /// by one.
    pub fn erase(&mut self, index: usize) -> Result<V> {
        let len = self.len();

        self.tree
            .remove_at(index)
            .map(|node| {
                let SeqNode { value, .. } = *node;
                value
            })
            .ok_or_else(|| out_of_range(Operation::Erase, index, len))
    }

    /// Appends an element to the back of the sequence.
    #[inline]
    pub fn push_back(&mut self, value: V) {
        self.tree.insert_at(self.len(), SeqNode::new(value));
    }

    /// Removes the last element and returns it, or `None` if the sequence is empty.
    #[inline]
    pub fn pop_back(&mut self) -> Option<V> {
        let last = self.len().checked_sub(1)?;
        self.erase(last).ok()
    }

    /// Clears the sequence, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }

    fn value_mut(&mut self, op: Operation, index: usize) -> Result<&mut V> {
        let len = self.len();

        self.tree
            .get_mut(index)
            // SAFETY: Pinning is not structural for `node.value`.
            .map(|node| unsafe { &mut node.get_unchecked_mut().value })
            .ok_or_else(|| out_of_range(op, index, len))
    }
}

fn out_of_range(op: Operation, index: usize, len: usize) -> Error {
    debug!(%op, index, len, "rejected out-of-range index");

    Error::OutOfRange { op, index, len }
}

impl<V> Inspect for Sequence<V> {
    type Value = V;

    fn root(&self) -> Option<NodeView<'_, V>> {
        // SAFETY: the view borrows `self`, so the tree cannot change while it exists.
        self.tree.root.map(|root| unsafe { NodeView::new(root) })
    }
}

impl<V> Default for Sequence<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Index<usize> for Sequence<V> {
    type Output = V;

    fn index(&self, index: usize) -> &V {
        match self.get(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<V> IndexMut<usize> for Sequence<V> {
    fn index_mut(&mut self, index: usize) -> &mut V {
        match self.get_mut(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Sequence<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries((0..self.len()).filter_map(|index| self.get(index).ok()))
            .finish()
    }
}
