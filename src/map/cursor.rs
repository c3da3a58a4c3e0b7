use std::ptr;
use std::fmt;

use crate::slab::Ptr;

use super::{node, BSTMap, Node};

/// A position in a [`BSTMap`]: either at one of its entries, or at the end (one past the entry
/// with the largest key)
///
/// Cursors move through the map in key order by following parent links, so moving is `O(height)`
/// and needs no extra memory. A cursor that moves past either end of the map arrives at the end
/// position and stays there; use [`BSTMap::begin`] or [`BSTMap::find`] to get a new cursor.
///
/// Two cursors are equal if they are at the same entry of the same map, or both at its end.
///
/// # Examples
///
/// ```
/// use bst_map::bstmap;
///
/// let map = bstmap! {3 => "c", 1 => "a", 2 => "b"};
///
/// let mut cursor = map.begin();
/// let mut keys = Vec::new();
/// while cursor != map.end() {
///     keys.push(*cursor.key().unwrap());
///     cursor.move_next();
/// }
/// assert_eq!(keys, &[1, 2, 3]);
/// ```
pub struct Cursor<'a, K, V> {
    map: &'a BSTMap<K, V>,
    current: Ptr,
}

impl<'a, K, V> Clone for Cursor<'a, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V> Copy for Cursor<'a, K, V> {}

impl<'a, K, V> PartialEq for Cursor<'a, K, V> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.map, other.map) && self.current == other.current
    }
}

impl<'a, K, V> Eq for Cursor<'a, K, V> {}

impl<'a, K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor")
            .field(&self.entry())
            .finish()
    }
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(super) fn new(map: &'a BSTMap<K, V>, current: Ptr) -> Self {
        Self {map, current}
    }

    /// Returns true if the cursor is at the end of the map
    pub fn is_end(&self) -> bool {
        self.current.is_null()
    }

    /// Returns the node the cursor is at, or `None` at the end
    pub fn node(&self) -> Option<Node<'a, K, V>> {
        Node::new(&self.map.nodes, self.current)
    }

    /// Returns the key of the current entry, or `None` at the end
    pub fn key(&self) -> Option<&'a K> {
        self.map.nodes.get(self.current).map(|node| &node.key)
    }

    /// Returns the value of the current entry, or `None` at the end
    pub fn value(&self) -> Option<&'a V> {
        self.map.nodes.get(self.current).map(|node| &node.value)
    }

    /// Returns the current entry, or `None` at the end
    pub fn entry(&self) -> Option<(&'a K, &'a V)> {
        self.map.nodes.get(self.current).map(|node| (&node.key, &node.value))
    }

    /// Moves to the entry with the next larger key, or to the end if this was the last entry
    ///
    /// Does nothing at the end.
    pub fn move_next(&mut self) {
        self.current = node::successor(&self.map.nodes, self.current);
    }

    /// Moves to the entry with the next smaller key, or to the end if this was the first entry
    ///
    /// Does nothing at the end.
    pub fn move_prev(&mut self) {
        self.current = node::predecessor(&self.map.nodes, self.current);
    }
}

/// A position in a [`BSTMap`] that allows the map to be modified
///
/// Behaves like [`Cursor`], but can also change the value of the current entry or remove the
/// current entry. While the cursor exists, it is the only way to access the map.
///
/// # Examples
///
/// ```
/// use bst_map::BSTMap;
///
/// let mut map: BSTMap<_, _> = (1..=6).map(|key| (key, key * 10)).collect();
///
/// // Remove every even key and bump the rest
/// let mut cursor = map.begin_mut();
/// while !cursor.is_end() {
///     if cursor.key().unwrap() % 2 == 0 {
///         // Moves the cursor on to the next entry
///         cursor.remove_current();
///     } else {
///         *cursor.value_mut().unwrap() += 1;
///         cursor.move_next();
///     }
/// }
///
/// assert_eq!(map.iter().collect::<Vec<_>>(), &[(&1, &11), (&3, &31), (&5, &51)]);
/// ```
pub struct CursorMut<'a, K, V> {
    map: &'a mut BSTMap<K, V>,
    current: Ptr,
}

impl<'a, K: fmt::Debug, V: fmt::Debug> fmt::Debug for CursorMut<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut")
            .field(&self.entry())
            .finish()
    }
}

impl<'a, K, V> From<CursorMut<'a, K, V>> for Cursor<'a, K, V> {
    fn from(cursor: CursorMut<'a, K, V>) -> Self {
        Cursor::new(cursor.map, cursor.current)
    }
}

impl<'a, K, V> CursorMut<'a, K, V> {
    pub(super) fn new(map: &'a mut BSTMap<K, V>, current: Ptr) -> Self {
        Self {map, current}
    }

    /// Returns a read-only cursor at the same position
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor::new(&*self.map, self.current)
    }

    /// Returns true if the cursor is at the end of the map
    pub fn is_end(&self) -> bool {
        self.current.is_null()
    }

    /// Returns the node the cursor is at, or `None` at the end
    pub fn node(&self) -> Option<Node<'_, K, V>> {
        Node::new(&self.map.nodes, self.current)
    }

    /// Returns the key of the current entry, or `None` at the end
    pub fn key(&self) -> Option<&K> {
        self.map.nodes.get(self.current).map(|node| &node.key)
    }

    /// Returns the value of the current entry, or `None` at the end
    pub fn value(&self) -> Option<&V> {
        self.map.nodes.get(self.current).map(|node| &node.value)
    }

    /// Returns the current entry, or `None` at the end
    pub fn entry(&self) -> Option<(&K, &V)> {
        self.map.nodes.get(self.current).map(|node| (&node.key, &node.value))
    }

    /// Returns a mutable reference to the value of the current entry, or `None` at the end
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.map.nodes.get_mut(self.current).map(|node| &mut node.value)
    }

    /// Returns a mutable reference to the value of the current entry that outlives the cursor, or
    /// `None` at the end
    pub fn into_value_mut(self) -> Option<&'a mut V> {
        let Self {map, current} = self;
        map.nodes.get_mut(current).map(|node| &mut node.value)
    }

    /// Moves to the entry with the next larger key, or to the end if this was the last entry
    ///
    /// Does nothing at the end.
    pub fn move_next(&mut self) {
        self.current = node::successor(&self.map.nodes, self.current);
    }

    /// Moves to the entry with the next smaller key, or to the end if this was the first entry
    ///
    /// Does nothing at the end.
    pub fn move_prev(&mut self) {
        self.current = node::predecessor(&self.map.nodes, self.current);
    }

    /// Removes the current entry from the map and returns it
    ///
    /// The cursor moves on to the entry that followed the removed one, or to the end if the
    /// removed entry had the largest key. Returns `None` and does nothing at the end.
    ///
    /// Time complexity: `O(height)`
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        if self.current.is_null() {
            return None;
        }

        let (entry, next) = self.map.remove_at(self.current);
        self.current = next;

        Some(entry)
    }
}
