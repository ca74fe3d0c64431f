//! An intrusive AVL tree ordered by position rather than by key.
//!
//! Every node caches the height and the number of nodes of its subtree. The counts let the tree
//! find, insert and remove elements by their rank in the in-order sequence, so [`Sequence`] can
//! offer array-like indexing with _O(log(n))_ insertion and removal anywhere.

// Conventions used in comments:
// - The height of a node `x` is denoted `h(x)`. A missing child has height -1, so leaves have
//   height 0.
// - The count of a node `x` is denoted `c(x)`. A missing child has count 0.
// - The balance of a node `x` is `h(right(x)) - h(left(x))`.
//
// The invariants of the tree are:
// 1. `h(x) = 1 + max(h(left(x)), h(right(x)))`.
// 2. `c(x) = 1 + c(left(x)) + c(right(x))`.
// 3. All balances are -1, 0 or 1.
//
// Corollary:
// 4. The position of `x` within its own subtree is `c(left(x))`. Positions are never stored; they
//    are recovered on the way down by subtracting the counts of skipped subtrees.

use core::{cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not, pin::Pin, ptr::NonNull};

use cordyceps::Linked;
use tracing::trace;

mod debug;
mod error;
pub mod inspect;
#[cfg(any(test, feature = "model"))]
pub mod model;
mod seq;


pub use error::{Error, Operation, Result};
pub use seq::Sequence;

pub trait TreeNode<L>: Linked<L> {
    /// Exchanges the payloads of `self` and `other`, leaving the links of both nodes untouched.
    fn swap_payload(&mut self, other: &mut Self);
}

/// An intrusive AVL tree indexed by position.
///
/// Each node owns its two children; the parent link is a plain back-reference used only to keep
/// the structure inspectable.
pub struct RankTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The sign a balance takes when the subtree leans toward `self`.
    #[inline]
    fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    height: i8,
    count: usize,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

impl<T> RankTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> RankTree<T> {
        RankTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let count = match self.root {
            Some(root) => unsafe {
                assert_eq!(self.links(root).parent(), None, "root must not have a parent");
                self.assert_invariants_at(root).1
            },
            None => 0,
        };

        assert_eq!(count, self.len, "tracked length disagrees with root count");
    }

    // Returns the height and count of the subtree rooted at `node`, as recomputed from scratch.
    unsafe fn assert_invariants_at(&self, node: NonNull<T>) -> (i8, usize) {
        unsafe {
            let mut heights = [-1; 2];
            let mut counts = [0; 2];

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = self.links(node).child(dir) {
                    // Ensure child's parent link points to this node.
                    let parent = self
                        .links(child)
                        .parent()
                        .expect("child parent pointer not set");
                    assert_eq!(node, parent);

                    (heights[dir as usize], counts[dir as usize]) = self.assert_invariants_at(child);
                }
            }

            let links = self.links(node);

            // Ensure the cached totals match the subtrees.
            assert_eq!(links.height(), 1 + heights[0].max(heights[1]));
            assert_eq!(links.count(), 1 + counts[0] + counts[1]);

            // Ensure the node is balanced.
            let balance = heights[1] - heights[0];
            assert!(balance.abs() <= 1, "node out of balance: {balance}");

            (links.height(), links.count())
        }
    }

    /// Returns a reference to the element at position `index`.
    ///
    /// Returns `None` if `index >= self.len()`.
    pub fn get(&self, index: usize) -> Option<Pin<&T>> {
        let ptr = self.get_raw(index)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the element at position `index`.
    ///
    /// Returns `None` if `index >= self.len()`.
    pub fn get_mut(&mut self, index: usize) -> Option<Pin<&mut T>> {
        let mut ptr = self.get_raw(index)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    fn get_raw(&self, mut index: usize) -> Link<T> {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                let links = self.links(cur);
                let left_count = self.count(links.left());

                match index.cmp(&left_count) {
                    Ordering::Less => opt_cur = links.left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => {
                        index -= left_count + 1;
                        opt_cur = links.right();
                    }
                }
            }
        }
    }

    /// Inserts an item at position `index`, shifting every element after it one position up.
    ///
    /// This operation completes in _O(log(n))_ time.
    ///
    /// # Panics
    ///
    /// Panics if `index > self.len()`.
    pub fn insert_at(&mut self, index: usize, item: T::Handle) {
        assert!(
            index <= self.len,
            "insertion index (is {index}) should be <= len (is {})",
            self.len
        );

        let ptr = T::into_ptr(item);

        unsafe {
            let root = self.insert_in(self.root, index, ptr, None);
            self.root = Some(root);
        }

        self.len += 1;
    }

    // Inserts `new` at position `index` of the subtree rooted at `opt_node`, whose parent is
    // `parent`.
    //
    // Returns the root of the subtree after rebalancing.
    unsafe fn insert_in(
        &mut self,
        opt_node: Link<T>,
        index: usize,
        new: NonNull<T>,
        parent: Link<T>,
    ) -> NonNull<T> {
        unsafe {
            let Some(node) = opt_node else {
                // Found the empty slot. Link `new` in as a leaf.
                let links = self.links_mut(new);
                links.clear();
                links.set_parent(parent);
                return new;
            };

            let left_count = self.count(self.links(node).left());
            let (dir, index) = if index <= left_count {
                (Dir::Left, index)
            } else {
                (Dir::Right, index - left_count - 1)
            };

            let child = self.insert_in(self.links(node).child(dir), index, new, Some(node));
            self.links_mut(node).set_child(dir, Some(child));

            self.update(node);
            self.rebalance(node)
        }
    }

    /// Removes the element at position `index`, shifting every element after it one position
    /// down.
    ///
    /// Returns `None` if `index >= self.len()`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove_at(&mut self, index: usize) -> Option<T::Handle> {
        if index >= self.len {
            return None;
        }

        let root = self.root?;

        unsafe {
            let (root, removed) = self.remove_in(root, index);
            debug_assert!(root.map_or(true, |r| self.links(r).parent().is_none()));
            self.root = root;
            self.len -= 1;

            self.links_mut(removed).clear();
            Some(T::from_ptr(removed))
        }
    }

    // Removes the node at position `index` of the subtree rooted at `node`.
    //
    // Returns the root of the subtree after rebalancing (`None` if the subtree became empty) and
    // the unlinked node.
    //
    // When the target has two children, its payload is swapped with that of its in-order
    // successor and the successor's node is unlinked instead. The unlinked node therefore always
    // carries the payload that was at `index`.
    unsafe fn remove_in(&mut self, node: NonNull<T>, index: usize) -> (Link<T>, NonNull<T>) {
        unsafe {
            let left = self.links(node).left();
            let right = self.links(node).right();
            let left_count = self.count(left);

            let (dir, child, index) = match index.cmp(&left_count) {
                Ordering::Less => (Dir::Left, left, index),
                Ordering::Greater => (Dir::Right, right, index - left_count - 1),
                Ordering::Equal => match (left, right) {
                    (Some(_), Some(right)) => {
                        let successor = self.min_in_subtree(right);
                        T::swap_payload(&mut *node.as_ptr(), &mut *successor.as_ptr());

                        (Dir::Right, Some(right), 0)
                    }

                    (Some(child), None) | (None, Some(child)) => {
                        // Elevate the sole child into the removed node's place.
                        let parent = self.links(node).parent();
                        self.links_mut(child).set_parent(parent);
                        return (Some(child), node);
                    }

                    (None, None) => return (None, node),
                },
            };

            let child = child.expect("index must lie within the subtree");
            let (new_child, removed) = self.remove_in(child, index);
            self.links_mut(node).set_child(dir, new_child);
            self.maybe_set_parent(new_child, Some(node));

            self.update(node);
            (Some(self.rebalance(node)), removed)
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            unsafe { self.drop_subtree(root) };
        }

        self.len = 0;
    }

    unsafe fn drop_subtree(&mut self, node: NonNull<T>) {
        unsafe {
            let links = self.links(node);
            let (left, right) = (links.left(), links.right());

            for child in [left, right].into_iter().flatten() {
                self.drop_subtree(child);
            }

            self.links_mut(node).clear();
            drop(T::from_ptr(node));
        }
    }

    // Balancing ==============================================================

    // Restores the balance of `node` after one of its subtrees changed height by at most one.
    //
    // Returns the root of the subtree afterwards, which is `node` itself if no rotation was
    // needed. The caller must link the returned node into `node`'s former slot.
    unsafe fn rebalance(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe {
            let balance = self.balance(node);
            let heavy = if balance > 1 {
                Dir::Right
            } else if balance < -1 {
                Dir::Left
            } else {
                return node;
            };

            let child = self
                .links(node)
                .child(heavy)
                .expect("heavy side must not be empty");

            // A heavy child leaning the other way is straightened out first.
            let double = self.balance(child) * heavy.sign() < 0;
            if double {
                let raised = self.rotate(child, heavy);
                self.links_mut(node).set_child(heavy, Some(raised));
            }

            trace!(?heavy, double, "rebalancing");
            self.rotate(node, !heavy)
        }
    }

    // Performs a rotation, moving `down` toward `dir` and raising its `!dir` child in its place.
    //
    // The raised node takes over `down`'s parent pointer, but `down`'s former parent (or the root)
    // is not updated. Totals are recomputed for both nodes.
    unsafe fn rotate(&mut self, down: NonNull<T>, dir: Dir) -> NonNull<T> {
        unsafe {
            let up = self
                .links(down)
                .child(!dir)
                .expect("rotation requires a child to raise");

            // `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
            let across = self.links(up).child(dir);
            self.links_mut(down).set_child(!dir, across);
            self.maybe_set_parent(across, Some(down));

            self.links_mut(up).set_child(dir, Some(down));
            let parent = self.links_mut(down).set_parent(Some(up));
            self.links_mut(up).set_parent(parent);

            // `down` is now a child of `up`, so it goes first.
            self.update(down);
            self.update(up);

            up
        }
    }

    // Support methods ========================================================

    #[inline]
    unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    unsafe fn links_mut<'a>(&mut self, node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { self.links_mut(node).set_parent(parent) };
    }

    #[inline]
    unsafe fn min_in_subtree(&self, root: NonNull<T>) -> NonNull<T> {
        let mut cur = root;

        while let Some(left) = unsafe { self.links(cur).left() } {
            cur = left;
        }

        cur
    }

    // Recomputes the cached height and count of `node` from its children.
    #[inline]
    unsafe fn update(&mut self, node: NonNull<T>) {
        unsafe {
            let links = self.links(node);
            let (left, right) = (links.left(), links.right());

            let height = 1 + self.height(left).max(self.height(right));
            let count = 1 + self.count(left) + self.count(right);

            let inner = self.links_mut(node).inner.get_mut();
            inner.height = height;
            inner.count = count;
        }
    }

    /// Returns the height of the pointed-to subtree.
    #[inline]
    unsafe fn height(&self, node: Link<T>) -> i8 {
        node.map(|n| unsafe { self.links(n).height() }).unwrap_or(-1)
    }

    /// Returns the number of nodes in the pointed-to subtree.
    #[inline]
    unsafe fn count(&self, node: Link<T>) -> usize {
        node.map(|n| unsafe { self.links(n).count() }).unwrap_or(0)
    }

    #[inline]
    unsafe fn balance(&self, node: NonNull<T>) -> i8 {
        unsafe {
            let links = self.links(node);
            self.height(links.right()) - self.height(links.left())
        }
    }
}

impl<T> Default for RankTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RankTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                height: 0,
                count: 1,
                _unpin: PhantomPinned,
            }),
        }
    }

    // Resets the links to those of a detached leaf.
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.height = 0;
        inner.count = 1;
    }

    #[inline]
    fn height(&self) -> i8 {
        unsafe { (*self.inner.get()).height }
    }

    #[inline]
    fn count(&self) -> usize {
        unsafe { (*self.inner.get()).count }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("height", &self.height())
            .field("count", &self.count())
            .finish()
    }
}
