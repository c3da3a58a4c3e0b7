use std::vec;
use std::iter::FusedIterator;

use crate::slab::{Ptr, Slab};

use super::{node, BSTMap, InnerNode};

/// An iterator over the entries of a [`BSTMap`] in ascending key order
///
/// Created by [`BSTMap::iter`]. Moves from node to node through parent links, so it holds no
/// stack.
pub struct Iter<'a, K, V> {
    nodes: &'a Slab<InnerNode<K, V>>,
    front: Ptr,
    back: Ptr,
    /// Number of entries not yet yielded from either end
    len: usize,
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {..*self}
    }
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(map: &'a BSTMap<K, V>) -> Self {
        Self {
            nodes: &map.nodes,
            front: node::first(&map.nodes, map.root),
            back: node::last(&map.nodes, map.root),
            len: map.len(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let nodes = self.nodes;
        let node = nodes.get(self.front)?;
        self.front = node::successor(nodes, self.front);
        self.len -= 1;

        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let nodes = self.nodes;
        let node = nodes.get(self.back)?;
        self.back = node::predecessor(nodes, self.back);
        self.len -= 1;

        Some((&node.key, &node.value))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

/// A mutable iterator over the entries of a [`BSTMap`] in ascending key order
///
/// Created by [`BSTMap::iter_mut`]. Unlike [`Iter`], this does not walk the tree lazily. Creating
/// it takes `O(n)` time and allocates two buffers: the positions of the entries in key order, and
/// a table with one slot per node the map has ever allocated (including freed ones) that holds the
/// disjoint `(&K, &mut V)` borrows. After that each step is `O(1)`.
pub struct IterMut<'a, K, V> {
    order: vec::IntoIter<Ptr>,
    /// Every entry of the map, indexed by slot
    slots: Vec<Option<(&'a K, &'a mut V)>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(super) fn new(map: &'a mut BSTMap<K, V>) -> Self {
        let mut order = Vec::with_capacity(map.len());
        let mut current = node::first(&map.nodes, map.root);
        while !current.is_null() {
            order.push(current);
            current = node::successor(&map.nodes, current);
        }

        let mut slots = Vec::new();
        slots.resize_with(map.nodes.slots(), || None);
        for (ptr, node) in map.nodes.iter_mut() {
            if let Some(index) = ptr.into_index() {
                let InnerNode {key, value, ..} = node;
                slots[index] = Some((&*key, value));
            }
        }

        Self {order: order.into_iter(), slots}
    }

    fn take(&mut self, ptr: Ptr) -> Option<(&'a K, &'a mut V)> {
        self.slots.get_mut(ptr.into_index()?)?.take()
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let ptr = self.order.next()?;
        self.take(ptr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let ptr = self.order.next_back()?;
        self.take(ptr)
    }
}

impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V> {}

impl<'a, K, V> FusedIterator for IterMut<'a, K, V> {}

/// An owning iterator over the entries of a [`BSTMap`] in ascending key order
///
/// Created by [`BSTMap::into_iter`]. Each step removes the smallest (or largest) remaining entry.
pub struct IntoIter<K, V> {
    map: BSTMap<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.map.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.map.len(), Some(self.map.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.map.pop_last()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

/// An iterator over the keys of a [`BSTMap`] in ascending order
pub struct Keys<'a, K, V> {
    pub(super) iter: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(key, _)| key)
    }
}

impl<'a, K, V> ExactSizeIterator for Keys<'a, K, V> {}

impl<'a, K, V> FusedIterator for Keys<'a, K, V> {}

/// An iterator over the values of a [`BSTMap`] in ascending key order
pub struct Values<'a, K, V> {
    pub(super) iter: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(_, value)| value)
    }
}

impl<'a, K, V> ExactSizeIterator for Values<'a, K, V> {}

impl<'a, K, V> FusedIterator for Values<'a, K, V> {}

/// A mutable iterator over the values of a [`BSTMap`] in ascending key order
pub struct ValuesMut<'a, K, V> {
    pub(super) iter: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for ValuesMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(_, value)| value)
    }
}

impl<'a, K, V> ExactSizeIterator for ValuesMut<'a, K, V> {}

impl<'a, K, V> FusedIterator for ValuesMut<'a, K, V> {}

impl<K, V> IntoIterator for BSTMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {map: self}
    }
}

impl<'a, K, V> IntoIterator for &'a BSTMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut BSTMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
