mod node;
mod cursor;
mod iter;
mod sanity;

pub use node::Node;
pub use cursor::{Cursor, CursorMut};
pub use iter::{Iter, IterMut, IntoIter, Keys, Values, ValuesMut};
pub use sanity::SanityError;

use std::fmt;
use std::mem;
use std::ops::Index;
use std::cmp::Ordering;
use std::borrow::Borrow;
use std::iter::FromIterator;

use crate::slab::{Ptr, Slab};

#[derive(Debug, Clone, PartialEq, Eq)]
struct InnerNode<K, V> {
    key: K,
    value: V,
    parent: Ptr,
    left: Ptr,
    right: Ptr,
    /// Height of the subtree rooted at this node (a leaf has height 0)
    height: isize,
    /// Height of the left subtree minus the height of the right subtree
    balance: isize,
}

impl<K, V> InnerNode<K, V> {
    fn new(key: K, value: V, parent: Ptr) -> Self {
        Self {
            key,
            value,
            parent,
            left: Ptr::null(),
            right: Ptr::null(),
            height: 0,
            balance: 0,
        }
    }
}

/// Which child slot of a parent a new node is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// The outcome of walking down the tree looking for a key
enum Search {
    Found(Ptr),
    /// The key is absent. A node holding it would be attached to `parent` on `side`, or become the
    /// root if `parent` is null.
    Vacant {parent: Ptr, side: Side},
}

/// A binary search tree (BST) map
///
/// BST properties: For each node with key `k`:
/// - The key of each node in the left subtree is less than `k`
/// - The key of each node in the right subtree is greater than `k`
///
/// Keys are unique. Every node keeps a link to its parent, so cursors and iterators can move to
/// the next or previous key without any auxiliary stack.
///
/// The tree is never rebalanced: its shape depends only on the order of insertions and removals,
/// and a sorted insertion order degenerates it into a list. Each node still records the height of
/// its subtree and its balance factor so that they can be inspected and checked (see
/// [`BSTMap::validate`]).
///
/// Nodes are allocated in a slab, so dropping the map never recurses, no matter how deep the tree
/// is.
pub struct BSTMap<K, V> {
    nodes: Slab<InnerNode<K, V>>,
    root: Ptr,
}

impl<K, V> Default for BSTMap<K, V> {
    fn default() -> Self {
        Self {
            nodes: Default::default(),
            root: Ptr::null(),
        }
    }
}

impl<K: Clone, V: Clone> Clone for BSTMap<K, V> {
    /// Returns a deep copy of the map. The copy shares no nodes with `self`.
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
        }
    }

    /// Releases every node of `self`, then copies `source` into it, reusing the existing
    /// allocation where possible
    fn clone_from(&mut self, source: &Self) {
        self.nodes.clone_from(&source.nodes);
        self.root = source.root;
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BSTMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for BSTMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f, true)
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for BSTMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        // We can't just compare the binary trees structurally, since they may be structured
        // differently while still having all the same elements (e.g. if insertion order is
        // different). Instead, we use in-order traversal since we know that that is guaranteed to
        // produce the elements in sorted order. If their sorted orders are equal, the maps are
        // equal.

        if self.len() != other.len() {
            return false;
        }

        self.iter().zip(other.iter()).all(|((k1, v1), (k2, v2))| {
            k1.eq(k2) && v1.eq(v2)
        })
    }
}

impl<K: Eq, V: Eq> Eq for BSTMap<K, V> {}

impl<K, V> BSTMap<K, V> {
    /// Creates an empty `BSTMap`
    ///
    /// The map is initially created with a capacity of 0, so it will not allocate until it is
    /// first inserted into.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_map::BSTMap;
    /// let mut map: BSTMap<&str, i32> = BSTMap::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with the specified capacity.
    ///
    /// The map will be able to hold at least `capacity` entries without reallocating. If
    /// `capacity` is 0, the map will not allocate.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Slab::with_capacity(capacity),
            root: Ptr::null(),
        }
    }

    /// Returns the number of entries in the map (i.e. the number of nodes in the binary search
    /// tree)
    ///
    /// Time complexity: `O(1)`
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_map::BSTMap;
    ///
    /// let mut map = BSTMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the map is empty
    ///
    /// Time complexity: `O(1)`
    pub fn is_empty(&self) -> bool {
        debug_assert!(self.nodes.is_empty() == self.root.is_null());
        self.nodes.is_empty()
    }

    /// Returns the number of entries the map can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Reserves capacity for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional)
    }

    /// Shrinks the capacity of the map as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit()
    }

    /// Clears the map, removing all entries
    ///
    /// The allocated capacity is kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = Ptr::null();
    }

    /// Returns the root node of the tree, or `None` if the tree is empty
    ///
    /// Note that the root can be **any** node inserted into the tree. For a guaranteed ordering,
    /// use the iteration methods or a cursor.
    ///
    /// This is a low-level API meant to be used for inspecting the shape of the tree.
    pub fn root(&self) -> Option<Node<'_, K, V>> {
        Node::new(&self.nodes, self.root)
    }

    /// Returns a cursor at the entry with the smallest key, or at the end if the map is empty
    pub fn begin(&self) -> Cursor<'_, K, V> {
        Cursor::new(self, node::first(&self.nodes, self.root))
    }

    /// Returns the past-the-end cursor
    pub fn end(&self) -> Cursor<'_, K, V> {
        Cursor::new(self, Ptr::null())
    }

    /// Returns a mutable cursor at the entry with the smallest key, or at the end if the map is
    /// empty
    pub fn begin_mut(&mut self) -> CursorMut<'_, K, V> {
        let first = node::first(&self.nodes, self.root);
        CursorMut::new(self, first)
    }

    /// Returns the past-the-end mutable cursor
    pub fn end_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut::new(self, Ptr::null())
    }

    /// Returns the entry with the smallest key
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.begin().entry()
    }

    /// Returns the entry with the largest key
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let last = node::last(&self.nodes, self.root);
        self.nodes.get(last).map(|node| (&node.key, &node.value))
    }

    /// Removes and returns the entry with the smallest key
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.begin_mut().remove_current()
    }

    /// Removes and returns the entry with the largest key
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let last = node::last(&self.nodes, self.root);
        CursorMut::new(self, last).remove_current()
    }

    /// Iterates over the entries of the map in ascending key order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Iterates over the entries of the map in ascending key order, with mutable access to the
    /// values
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self)
    }

    /// Iterates over the keys of the map in ascending order
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {iter: self.iter()}
    }

    /// Iterates over the values of the map in ascending key order
    pub fn values(&self) -> Values<'_, K, V> {
        Values {iter: self.iter()}
    }

    /// Iterates mutably over the values of the map in ascending key order
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {iter: self.iter_mut()}
    }

    /// Writes the entries of the map to `sink` in ascending key order, separated by single spaces
    ///
    /// Each entry is written as `key`, or as `key:value` if `show_values` is true. An empty map
    /// writes nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_map::bstmap;
    ///
    /// let map = bstmap! {2 => 'b', 1 => 'a'};
    ///
    /// let mut keys = String::new();
    /// map.print(&mut keys, false).unwrap();
    /// assert_eq!(keys, "1 2");
    ///
    /// let mut entries = String::new();
    /// map.print(&mut entries, true).unwrap();
    /// assert_eq!(entries, "1:a 2:b");
    /// ```
    pub fn print<W>(&self, sink: &mut W, show_values: bool) -> fmt::Result
        where W: fmt::Write + ?Sized,
              K: fmt::Display,
              V: fmt::Display,
    {
        match self.root() {
            Some(root) => root.print(sink, show_values),
            None => Ok(()),
        }
    }

    /// Height of the subtree at `ptr`, where a missing subtree has height -1
    fn height_of(&self, ptr: Ptr) -> isize {
        self.nodes.get(ptr).map_or(-1, |node| node.height)
    }

    /// Recomputes `height` and `balance` from `ptr` up towards the root
    ///
    /// Stops as soon as a node's height is unchanged, since nothing above it can change either.
    fn update_heights(&mut self, mut ptr: Ptr) {
        while let Some(&InnerNode {left, right, ..}) = self.nodes.get(ptr) {
            let left_height = self.height_of(left);
            let right_height = self.height_of(right);

            let node = &mut self.nodes[ptr];
            let height = 1 + left_height.max(right_height);
            node.balance = left_height - right_height;

            if node.height == height {
                break;
            }
            node.height = height;
            ptr = node.parent;
        }
    }

    /// Creates a new node and links it into the tree as the `side` child of `parent` (or as the
    /// root if `parent` is null)
    fn attach(&mut self, parent: Ptr, side: Side, key: K, value: V) -> Ptr {
        let ptr = self.nodes.push(InnerNode::new(key, value, parent));

        match self.nodes.get_mut(parent) {
            Some(parent_node) => match side {
                Side::Left => parent_node.left = ptr,
                Side::Right => parent_node.right = ptr,
            },

            None => {
                debug_assert!(self.root.is_null());
                self.root = ptr;
            },
        }

        self.update_heights(parent);

        ptr
    }

    /// Makes `new` take the place of `old` as a child of `parent` (or as the root)
    fn replace_child(&mut self, parent: Ptr, old: Ptr, new: Ptr) {
        match self.nodes.get_mut(parent) {
            Some(parent_node) if parent_node.left == old => parent_node.left = new,
            Some(parent_node) => {
                debug_assert_eq!(parent_node.right, old);
                parent_node.right = new;
            },
            None => self.root = new,
        }
    }

    /// Removes the node at `ptr`, which must have at most one child, splicing that child into its
    /// place
    fn unlink(&mut self, ptr: Ptr) -> (K, V) {
        let InnerNode {parent, left, right, ..} = self.nodes[ptr];
        debug_assert!(left.is_null() || right.is_null());

        let child = if left.is_null() { right } else { left };
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = parent;
        }
        self.replace_child(parent, ptr, child);
        self.update_heights(parent);

        let InnerNode {key, value, ..} = self.nodes.remove(ptr);
        (key, value)
    }

    /// Removes the entry stored at `ptr` from the tree
    ///
    /// Returns the removed entry along with the position of the entry that followed it in key
    /// order (null if it was the last one).
    fn remove_at(&mut self, ptr: Ptr) -> ((K, V), Ptr) {
        let InnerNode {left, right, ..} = self.nodes[ptr];

        if left.is_null() || right.is_null() {
            let next = node::successor(&self.nodes, ptr);
            return (self.unlink(ptr), next);
        }

        // Two children: the successor is the minimum of the right subtree, so it has no left
        // child. Move its entry into this node and remove the successor's node instead.
        let successor = node::first(&self.nodes, right);
        if let Some((node, successor_node)) = self.nodes.get_pair_mut(ptr, successor) {
            mem::swap(&mut node.key, &mut successor_node.key);
            mem::swap(&mut node.value, &mut successor_node.value);
        }

        let entry = self.unlink(successor);
        // The entry that followed the removed one now lives at `ptr`
        (entry, ptr)
    }
}

impl<K: Ord, V> BSTMap<K, V> {
    fn search<Q>(&self, key: &Q) -> Search
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        let mut parent = Ptr::null();
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(node) = self.nodes.get(current) {
            match key.cmp(node.key.borrow()) {
                Ordering::Less => side = Side::Left,
                Ordering::Greater => side = Side::Right,
                Ordering::Equal => return Search::Found(current),
            }

            parent = current;
            current = match side {
                Side::Left => node.left,
                Side::Right => node.right,
            };
        }

        Search::Vacant {parent, side}
    }

    fn find_ptr<Q>(&self, key: &Q) -> Ptr
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(ptr) => ptr,
            Search::Vacant {..} => Ptr::null(),
        }
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering on the borrowed
    /// form must match the ordering on the key type.
    ///
    /// Time complexity: `O(height)`
    pub fn contains_key<Q>(&self, key: &Q) -> bool
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        !self.find_ptr(key).is_null()
    }

    /// Returns a reference to the value corresponding to the given key, or `None` if no such key
    /// exists in the map
    ///
    /// Time complexity: `O(height)`
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_map::BSTMap;
    ///
    /// let mut map = BSTMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        self.nodes.get(self.find_ptr(key)).map(|node| &node.value)
    }

    /// Returns a mutable reference to the value corresponding to the given key, or `None` if no
    /// such key exists in the map
    ///
    /// Time complexity: `O(height)`
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        let ptr = self.find_ptr(key);
        self.nodes.get_mut(ptr).map(|node| &mut node.value)
    }

    /// Returns the key-value pair corresponding to the given key
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        self.nodes.get(self.find_ptr(key)).map(|node| (&node.key, &node.value))
    }

    /// Returns a cursor at the entry with the given key, or the end cursor if no such key exists
    ///
    /// This never modifies the map.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V>
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        Cursor::new(self, self.find_ptr(key))
    }

    /// Returns a mutable cursor at the entry with the given key, or the end cursor if no such key
    /// exists
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V>
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        let ptr = self.find_ptr(key);
        CursorMut::new(self, ptr)
    }

    /// Returns a mutable reference to the value for `key`, inserting the value returned by
    /// `default` first if the key is absent
    ///
    /// Time complexity: `O(height)`
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
        where F: FnOnce() -> V,
    {
        let ptr = match self.search(&key) {
            Search::Found(ptr) => ptr,
            Search::Vacant {parent, side} => self.attach(parent, side, key, default()),
        };

        &mut self.nodes[ptr].value
    }

    /// Returns a mutable reference to the value for `key`, inserting `V::default()` first if the
    /// key is absent
    ///
    /// **Looking up an absent key with this method inserts it.** Use [`BSTMap::get`] or
    /// [`BSTMap::find`] to check for a key without modifying the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_map::BSTMap;
    ///
    /// let mut counts = BSTMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.get_or_insert_default(word) += 1;
    /// }
    /// assert_eq!(counts.get(&"a"), Some(&2));
    ///
    /// // Reading a missing key materializes it
    /// assert_eq!(*counts.get_or_insert_default("z"), 0);
    /// assert_eq!(counts.len(), 3);
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
        where V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Inserts a new value into the map
    ///
    /// Returns the previous value if the key was already present in an existing node or `None` if
    /// a new node was inserted. The key itself is not updated.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_map::BSTMap;
    ///
    /// let mut map = BSTMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.search(&key) {
            Search::Found(ptr) => Some(mem::replace(&mut self.nodes[ptr].value, value)),
            Search::Vacant {parent, side} => {
                self.attach(parent, side, key, value);
                None
            },
        }
    }

    /// Removes a key from the map, returning the value at the key if the key was previously in the
    /// map.
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_map::BSTMap;
    ///
    /// let mut map = BSTMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map, returning the stored key and value if the key was previously in
    /// the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
        where K: Borrow<Q>,
              Q: Ord + ?Sized,
    {
        self.find_mut(key).remove_current()
    }
}

impl<K, Q, V> Index<&Q> for BSTMap<K, V>
    where K: Borrow<Q> + Ord,
          Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry found for key"),
        }
    }
}

impl<K: Ord, V> Extend<(K, V)> for BSTMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BSTMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use rand::prelude::*;

    fn keys<K: Copy, V>(map: &BSTMap<K, V>) -> Vec<K> {
        map.keys().copied().collect()
    }

    /// Builds the map used by most tests:
    ///
    /// ```text
    ///        5
    ///     3     8
    ///    1 4   7 9
    /// ```
    fn sample() -> BSTMap<i32, i32> {
        let mut map = BSTMap::new();
        for &key in &[5, 3, 8, 1, 4, 7, 9] {
            *map.get_or_insert_default(key) = key * 10;
        }
        map
    }

    #[test]
    fn insert_then_erase_two_children() {
        let mut map = sample();
        assert_eq!(map.len(), 7);
        assert_eq!(keys(&map), &[1, 3, 4, 5, 7, 8, 9]);
        assert!(map.sanity_check());

        let mut cursor = map.find_mut(&5);
        assert_eq!(cursor.remove_current(), Some((5, 50)));
        // The cursor moves on to the successor
        assert_eq!(cursor.key(), Some(&7));

        assert!(map.find(&5).is_end());
        assert_eq!(map.find(&5), map.end());
        assert_eq!(keys(&map), &[1, 3, 4, 7, 8, 9]);
        assert_eq!(map.len(), 6);
        assert!(map.sanity_check());
        // The successor's entry took the root's place
        assert_eq!(map.root().map(|root| *root.key()), Some(7));
        assert_eq!(map.get(&7), Some(&70));
    }

    #[test]
    fn erase_leaf() {
        let mut map = sample();
        assert_eq!(map.remove(&4), Some(40));
        assert_eq!(map.len(), 6);
        assert!(map.find(&4).is_end());
        assert_eq!(keys(&map), &[1, 3, 5, 7, 8, 9]);
        assert_eq!(map.validate(), Ok(()));

        let three = map.find(&3).node().unwrap();
        assert!(!three.has_right());
        assert_eq!(three.height(), 1);
        assert_eq!(three.balance(), 1);
    }

    #[test]
    fn erase_one_child() {
        let mut map = sample();
        map.remove(&4);
        // 3 now has a single (left) child
        assert_eq!(map.remove(&3), Some(30));
        assert_eq!(map.len(), 5);
        assert_eq!(keys(&map), &[1, 5, 7, 8, 9]);
        assert_eq!(map.validate(), Ok(()));

        let one = map.find(&1).node().unwrap();
        assert_eq!(one.parent().map(|node| *node.key()), Some(5));
        assert_eq!(map.root().unwrap().balance(), -1);
    }

    #[test]
    fn erase_root_until_empty() {
        let mut map = sample();
        while let Some(root) = map.root().map(|root| *root.key()) {
            let len = map.len();
            assert_eq!(map.remove(&root), Some(root * 10));
            assert_eq!(map.len(), len - 1);
            assert!(!map.contains_key(&root));
            assert_eq!(map.validate(), Ok(()));
        }

        assert!(map.is_empty());
        assert!(map.begin().is_end());
        assert_eq!(map.begin(), map.end());
    }

    #[test]
    fn erase_two_children_distant_successor() {
        let mut map = BSTMap::new();
        // 10's successor (12) sits at the bottom of the right subtree and has a right child
        for &key in &[10, 5, 20, 15, 25, 12, 13] {
            map.insert(key, ());
        }

        assert_eq!(map.remove(&10), Some(()));
        assert_eq!(map.root().map(|root| *root.key()), Some(12));
        assert_eq!(keys(&map), &[5, 12, 13, 15, 20, 25]);
        assert_eq!(map.validate(), Ok(()));

        let thirteen = map.find(&13).node().unwrap();
        assert_eq!(thirteen.parent().map(|node| *node.key()), Some(15));
    }

    #[test]
    fn get_or_insert_default_materializes() {
        let mut map: BSTMap<&str, Vec<i32>> = BSTMap::new();

        assert!(map.find("x").is_end());
        assert_eq!(map.len(), 0);

        assert!(map.get_or_insert_default("x").is_empty());
        assert_eq!(map.len(), 1);

        map.get_or_insert_default("x").push(3);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x"), Some(&vec![3]));

        let value = map.get_or_insert_with("y", || vec![1, 2]);
        value.push(9);
        assert_eq!(map["y"], vec![1, 2, 9]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn insert_replace() {
        let mut map = BSTMap::new();

        assert_eq!(map.insert(3, 1), None);
        assert_eq!(map.insert(4, -2), None);
        assert_eq!(map.insert(3, 933), Some(1));
        assert_eq!(map.get(&3), Some(&933));
        assert_eq!(map.get(&4), Some(&-2));
        assert_eq!(map.len(), 2);

        *map.get_mut(&4).unwrap() = 8;
        assert_eq!(map.get_key_value(&4), Some((&4, &8)));
    }

    #[test]
    fn insert_get_borrow() {
        let mut map: BSTMap<String, _> = BSTMap::new();

        assert_eq!(map.get("abc"), None);
        assert_eq!(map.insert("abc".to_string(), 1), None);
        assert_eq!(map.insert("COOL".to_string(), 3), None);
        assert_eq!(map.insert("".to_string(), 898989), None);

        assert_eq!(map.get("abc"), Some(&1));
        assert_eq!(map.get("COOL"), Some(&3));
        assert_eq!(map.get(""), Some(&898989));
        assert_eq!(map.find("COOL").value(), Some(&3));
        assert_eq!(map.remove("abc"), Some(1));
        assert!(!map.contains_key("abc"));
    }

    #[test]
    fn heights_track_shape() {
        let map = sample();
        let root = map.root().unwrap();
        assert_eq!(root.height(), 2);
        assert_eq!(root.balance(), 0);

        // Sorted insertions degenerate into a list; nothing rebalances it
        let list: BSTMap<_, _> = (0..5).map(|key| (key, key)).collect();
        let root = list.root().unwrap();
        assert_eq!(*root.key(), 0);
        assert_eq!(root.height(), 4);
        assert_eq!(root.balance(), -4);
        assert_eq!(list.find(&4).node().unwrap().height(), 0);
        assert!(list.sanity_check());
    }

    #[test]
    fn deep_clone_is_independent() {
        let mut a = sample();
        let mut b = a.clone();
        assert_eq!(a, b);

        *b.get_mut(&3).unwrap() = -1;
        assert_eq!(a.get(&3), Some(&30));
        b.remove(&8);
        assert!(a.contains_key(&8));

        a.insert(100, 1000);
        drop(a);

        assert_eq!(keys(&b), &[1, 3, 4, 5, 7, 9]);
        assert!(b.sanity_check());
    }

    #[test]
    fn clone_from_replaces_contents() {
        let source = sample();
        let mut target: BSTMap<_, _> = (100..200).map(|key| (key, key)).collect();

        target.clone_from(&source);
        assert_eq!(target, source);
        assert_eq!(target.len(), 7);
        assert!(target.sanity_check());

        target.insert(2, 20);
        assert!(!source.contains_key(&2));
    }

    #[test]
    fn eq_ignores_shape() {
        let map1: BSTMap<_, _> = (0..10).map(|i| (i, i)).collect();
        let map2: BSTMap<_, _> = (0..10).rev().map(|i| (i, i)).collect();
        let map3: BSTMap<_, _> = (0..10).map(|i| (i, i * 10)).collect();

        assert_eq!(map1, map2);
        assert_ne!(map1, map3);
        assert_ne!(map1, BSTMap::new());
        assert_eq!(BSTMap::<i32, i32>::new(), BSTMap::default());
    }

    #[test]
    fn first_last_pop() {
        let mut map = sample();

        assert_eq!(map.first_key_value(), Some((&1, &10)));
        assert_eq!(map.last_key_value(), Some((&9, &90)));

        assert_eq!(map.pop_first(), Some((1, 10)));
        assert_eq!(map.pop_last(), Some((9, 90)));
        assert_eq!(keys(&map), &[3, 4, 5, 7, 8]);
        assert!(map.sanity_check());

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.pop_first(), None);
        assert_eq!(map.pop_last(), None);
        assert_eq!(map.first_key_value(), None);
    }

    #[test]
    fn print_and_format() {
        let map = sample();

        let mut out = String::new();
        map.print(&mut out, false).unwrap();
        assert_eq!(out, "1 3 4 5 7 8 9");

        assert_eq!(map.to_string(), "1:10 3:30 4:40 5:50 7:70 8:80 9:90");
        assert_eq!(format!("{:?}", map), "{1: 10, 3: 30, 4: 40, 5: 50, 7: 70, 8: 80, 9: 90}");

        let empty: BSTMap<i32, i32> = BSTMap::new();
        assert_eq!(empty.to_string(), "");
    }

    #[test]
    #[should_panic(expected = "no entry found for key")]
    fn index_missing_key() {
        let map = sample();
        let _value = map[&2];
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut map = sample();
        let capacity = map.capacity();

        for round in 0..10 {
            map.remove(&4);
            map.insert(4, round);
            assert_eq!(map.capacity(), capacity);
        }
        assert_eq!(map.get(&4), Some(&9));
        assert!(map.sanity_check());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn deep_degenerate_tree() {
        // Would overflow the stack if dropping, cloning or checking recursed
        let mut map: BSTMap<_, _> = (0..10_000).map(|key| (key, key)).collect();
        assert_eq!(map.root().unwrap().height(), 9_999);
        assert!(map.sanity_check());

        let copy = map.clone();
        map.remove(&0);
        assert_eq!(map.root().unwrap().height(), 9_998);
        assert_eq!(copy.len(), 10_000);
        assert_eq!(map.iter().rev().next(), Some((&9_999, &9_999)));
    }

    #[test]
    fn test_random_operations() {
        cfg_if::cfg_if! {
            if #[cfg(miri)] {
                const TEST_CASES: usize = 16;
                const OPERATIONS: usize = 24;

                (0..TEST_CASES).into_iter().for_each(|_| test_case());

            } else {
                use rayon::prelude::*;

                const TEST_CASES: usize = 1024;
                const OPERATIONS: usize = 128;

                (0..TEST_CASES).into_par_iter().for_each(|_| test_case());
            }
        }

        fn test_case() {
            let mut map = BSTMap::new();
            // Compare against the standard library's ordered map
            let mut expected = BTreeMap::new();

            let mut rng = rand::thread_rng();
            for _ in 0..rng.gen_range(OPERATIONS..=OPERATIONS*2) {
                assert_eq!(map.len(), expected.len());

                match rng.gen_range(1..=100) {
                    // Check for a key that hasn't been inserted
                    1..=10 => {
                        // Not inserting any negative numbers
                        let key = -rng.gen_range(1..=64);
                        assert_eq!(map.get(&key), expected.get(&key));
                        assert!(map.find(&key).is_end());
                    },

                    // Modify or read a key, inserting it if absent
                    11..=30 => {
                        let key = rng.gen_range(0..=64);
                        let value = rng.gen_range(100..=200);
                        *map.get_or_insert_default(key) += value;
                        *expected.entry(key).or_default() += value;
                        assert_eq!(map.get(&key), expected.get(&key));
                    },

                    // Remove a key that may or may not exist
                    31..=55 => {
                        let key = rng.gen_range(0..=64);
                        assert_eq!(map.remove(&key), expected.remove(&key));
                        assert!(map.find(&key).is_end());
                    },

                    // Insert a key
                    56..=100 => {
                        let key = rng.gen_range(0..=64);
                        let value = rng.gen_range(100..=200);
                        assert_eq!(map.insert(key, value), expected.insert(key, value));
                        assert_eq!(map.find(&key).value(), Some(&value));
                    },

                    _ => unreachable!(),
                }

                assert_eq!(map.validate(), Ok(()));
            }

            assert!(map.iter().eq(expected.iter()));
            assert!(map.iter().rev().eq(expected.iter().rev()));

            map.clear();
            assert!(map.is_empty());
            assert_eq!(map.validate(), Ok(()));
        }
    }
}
