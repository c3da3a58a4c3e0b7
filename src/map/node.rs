use std::ptr;
use std::fmt;

use crate::slab::{Ptr, Slab};

use super::InnerNode;

/// Returns the node with the smallest key in the subtree at `ptr` (null if `ptr` is null)
pub(super) fn first<K, V>(nodes: &Slab<InnerNode<K, V>>, mut ptr: Ptr) -> Ptr {
    while let Some(node) = nodes.get(ptr) {
        if node.left.is_null() {
            break;
        }
        ptr = node.left;
    }

    ptr
}

/// Returns the node with the largest key in the subtree at `ptr` (null if `ptr` is null)
pub(super) fn last<K, V>(nodes: &Slab<InnerNode<K, V>>, mut ptr: Ptr) -> Ptr {
    while let Some(node) = nodes.get(ptr) {
        if node.right.is_null() {
            break;
        }
        ptr = node.right;
    }

    ptr
}

/// Returns the in-order successor of `ptr`, or null if `ptr` holds the largest key
pub(super) fn successor<K, V>(nodes: &Slab<InnerNode<K, V>>, ptr: Ptr) -> Ptr {
    let node = match nodes.get(ptr) {
        Some(node) => node,
        None => return Ptr::null(),
    };

    if !node.right.is_null() {
        return first(nodes, node.right);
    }

    // Climb until we arrive from a left child. Falling off the top means there is no successor.
    let mut child = ptr;
    let mut parent = node.parent;
    while let Some(parent_node) = nodes.get(parent) {
        if parent_node.right != child {
            break;
        }
        child = parent;
        parent = parent_node.parent;
    }

    parent
}

/// Returns the in-order predecessor of `ptr`, or null if `ptr` holds the smallest key
pub(super) fn predecessor<K, V>(nodes: &Slab<InnerNode<K, V>>, ptr: Ptr) -> Ptr {
    let node = match nodes.get(ptr) {
        Some(node) => node,
        None => return Ptr::null(),
    };

    if !node.left.is_null() {
        return last(nodes, node.left);
    }

    let mut child = ptr;
    let mut parent = node.parent;
    while let Some(parent_node) = nodes.get(parent) {
        if parent_node.left != child {
            break;
        }
        child = parent;
        parent = parent_node.parent;
    }

    parent
}

/// A single node of the binary search tree
///
/// This is a read-only view. Values can be modified through a [`CursorMut`](super::CursorMut) or
/// [`BSTMap::get_mut`](super::BSTMap::get_mut). Keys can never be modified, since that could
/// invalidate the ordering properties.
pub struct Node<'a, K, V> {
    nodes: &'a Slab<InnerNode<K, V>>,
    ptr: Ptr,
    node: &'a InnerNode<K, V>,
}

impl<'a, K, V> fmt::Debug for Node<'a, K, V>
    where K: fmt::Debug,
          V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", self.key())
            .field("value", self.value())
            .field("height", &self.height())
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}

impl<'a, K, V> Clone for Node<'a, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V> Copy for Node<'a, K, V> {}

impl<'a, K: PartialEq, V: PartialEq> PartialEq for Node<'a, K, V> {
    fn eq(&self, other: &Self) -> bool {
        // If the pointers are the same, the values are guaranteed to be equal (similar to `Arc`
        // using `ptr_eq` to optimize its `PartialEq` impl)
        let ptr_eq = ptr::eq(self.nodes, other.nodes) && self.ptr == other.ptr;
        ptr_eq || (self.key().eq(other.key()) && self.value().eq(other.value()))
    }
}

impl<'a, K: Eq, V: Eq> Eq for Node<'a, K, V> {}

impl<'a, K, V> Node<'a, K, V> {
    /// Creates a new `Node`, or returns `None` if `ptr` does not refer to a node in `nodes`
    pub(super) fn new(nodes: &'a Slab<InnerNode<K, V>>, ptr: Ptr) -> Option<Self> {
        let node = nodes.get(ptr)?;
        Some(Self {nodes, ptr, node})
    }

    /// Returns the key of this node
    pub fn key(&self) -> &'a K {
        &self.node.key
    }

    /// Returns the value of this node
    pub fn value(&self) -> &'a V {
        &self.node.value
    }

    /// Returns the height of the subtree rooted at this node
    ///
    /// A leaf has height 0 and an absent subtree counts as -1.
    pub fn height(&self) -> isize {
        self.node.height
    }

    /// Returns the height of the left subtree minus the height of the right subtree
    pub fn balance(&self) -> isize {
        self.node.balance
    }

    /// Returns true if this node has a left subtree
    pub fn has_left(&self) -> bool {
        !self.node.left.is_null()
    }

    /// Returns true if this node has a right subtree
    pub fn has_right(&self) -> bool {
        !self.node.right.is_null()
    }

    /// Returns the left child node (subtree) of this node, if any
    pub fn left(&self) -> Option<Self> {
        Self::new(self.nodes, self.node.left)
    }

    /// Returns the right child node (subtree) of this node, if any
    pub fn right(&self) -> Option<Self> {
        Self::new(self.nodes, self.node.right)
    }

    /// Returns the parent of this node, or `None` for the root
    pub fn parent(&self) -> Option<Self> {
        Self::new(self.nodes, self.node.parent)
    }

    /// Returns the node with the smallest key in this subtree
    pub fn first(&self) -> Self {
        self.at(first(self.nodes, self.ptr))
    }

    /// Returns the node with the largest key in this subtree
    pub fn last(&self) -> Self {
        self.at(last(self.nodes, self.ptr))
    }

    /// Returns the node with the next larger key in the whole tree, or `None` if this node has the
    /// largest key
    pub fn increment(&self) -> Option<Self> {
        Self::new(self.nodes, successor(self.nodes, self.ptr))
    }

    /// Returns the node with the next smaller key in the whole tree, or `None` if this node has the
    /// smallest key
    pub fn decrement(&self) -> Option<Self> {
        Self::new(self.nodes, predecessor(self.nodes, self.ptr))
    }

    /// Writes the entries of this subtree to `sink` in ascending key order, separated by single
    /// spaces
    ///
    /// Each entry is written as `key`, or as `key:value` if `show_values` is true.
    pub fn print<W>(&self, sink: &mut W, show_values: bool) -> fmt::Result
        where W: fmt::Write + ?Sized,
              K: fmt::Display,
              V: fmt::Display,
    {
        let end = self.last().ptr;
        let mut current = self.first();
        loop {
            write!(sink, "{}", current.key())?;
            if show_values {
                write!(sink, ":{}", current.value())?;
            }

            if current.ptr == end {
                return Ok(());
            }

            match current.increment() {
                Some(next) => current = next,
                None => return Ok(()),
            }
            sink.write_char(' ')?;
        }
    }

    /// Returns a node that is known to exist in the same tree
    fn at(&self, ptr: Ptr) -> Self {
        Self {nodes: self.nodes, ptr, node: &self.nodes[ptr]}
    }
}
