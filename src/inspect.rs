//! Read-only access to the shape of a [`Sequence`](crate::Sequence)'s tree.
//!
//! This lets a checker confirm the balance and linkage of the tree independently of the
//! sequence's own bookkeeping. Nothing reachable from here can modify the tree.

use core::{fmt, marker::PhantomData, ptr::NonNull};

use cordyceps::Linked;

use crate::{seq::SeqNode, Links};

/// Structural introspection of a tree-backed container.
pub trait Inspect {
    type Value;

    /// Returns the root node, or `None` if the container is empty.
    fn root(&self) -> Option<NodeView<'_, Self::Value>>;
}

/// A shared view of one node of a tree.
///
/// Two views compare equal when they refer to the same node.
pub struct NodeView<'tree, V> {
    node: NonNull<SeqNode<V>>,
    _tree: PhantomData<&'tree ()>,
}

impl<'tree, V: 'tree> NodeView<'tree, V> {
    /// # Safety
    ///
    /// `node` must belong to a tree that stays borrowed, and thus unmodified, for `'tree`.
    pub(crate) unsafe fn new(node: NonNull<SeqNode<V>>) -> Self {
        NodeView {
            node,
            _tree: PhantomData,
        }
    }

    fn links(&self) -> &'tree Links<SeqNode<V>> {
        unsafe { SeqNode::links(self.node).as_ref() }
    }

    fn wrap(node: Option<NonNull<SeqNode<V>>>) -> Option<Self> {
        // SAFETY: `node` is linked into the same tree as `self`.
        node.map(|node| unsafe { Self::new(node) })
    }

    /// Returns the node's parent, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        Self::wrap(self.links().parent())
    }

    /// Returns the node's left child.
    pub fn left(&self) -> Option<Self> {
        Self::wrap(self.links().left())
    }

    /// Returns the node's right child.
    pub fn right(&self) -> Option<Self> {
        Self::wrap(self.links().right())
    }

    /// Returns the element stored in the node.
    pub fn value(&self) -> &'tree V {
        unsafe { &self.node.as_ref().value }
    }
}

impl<V> Clone for NodeView<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for NodeView<'_, V> {}

impl<V> PartialEq for NodeView<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<V> Eq for NodeView<'_, V> {}

impl<'tree, V: fmt::Debug + 'tree> fmt::Debug for NodeView<'tree, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("node", &self.node)
            .field("value", self.value())
            .finish()
    }
}
