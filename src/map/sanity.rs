use std::fmt;
use std::error::Error;

use super::{node, BSTMap};

/// The first problem found by [`BSTMap::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SanityError {
    /// The root node has a parent
    RootHasParent,
    /// A link points at a node that does not exist
    DanglingLink,
    /// A child's parent link does not point back at the node that owns it
    BrokenParentLink,
    /// Some node can be reached more than once from the root
    Cycle,
    /// The keys are not in strictly ascending order from left to right
    OutOfOrder,
    /// A node's stored height does not match the heights of its children
    HeightMismatch {stored: isize, expected: isize},
    /// A node's stored balance does not match the heights of its children
    BalanceMismatch {stored: isize, expected: isize},
    /// The number of nodes reachable from the root is not the length of the map
    LengthMismatch {reachable: usize, len: usize},
}

impl fmt::Display for SanityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SanityError::*;
        match self {
            RootHasParent => write!(f, "root node has a parent"),
            DanglingLink => write!(f, "link to a node that does not exist"),
            BrokenParentLink => write!(f, "child does not link back to its parent"),
            Cycle => write!(f, "node reachable more than once from the root"),
            OutOfOrder => write!(f, "keys are not in ascending order"),
            HeightMismatch {stored, expected} => {
                write!(f, "stored height {} should be {}", stored, expected)
            },
            BalanceMismatch {stored, expected} => {
                write!(f, "stored balance {} should be {}", stored, expected)
            },
            LengthMismatch {reachable, len} => {
                write!(f, "{} nodes reachable from the root but map has length {}", reachable, len)
            },
        }
    }
}

impl Error for SanityError {}

impl<K: Ord, V> BSTMap<K, V> {
    /// Checks every structural invariant of the tree
    ///
    /// Verifies that the parent and child links agree, that every key in a left subtree is less
    /// than its node's key and every key in a right subtree is greater, that each node's height
    /// and balance match its children, and that the length of the map is the number of nodes in
    /// the tree. Returns the first violation found.
    ///
    /// None of the map's operations can break these invariants; this is meant for tests.
    ///
    /// Time complexity: `O(n)`
    pub fn validate(&self) -> Result<(), SanityError> {
        let root = match self.nodes.get(self.root) {
            Some(root) => root,
            None if self.root.is_null() => {
                return match self.len() {
                    0 => Ok(()),
                    len => Err(SanityError::LengthMismatch {reachable: 0, len}),
                };
            },
            None => return Err(SanityError::DanglingLink),
        };

        if !root.parent.is_null() {
            return Err(SanityError::RootHasParent);
        }

        // Explicit stack so that degenerate trees do not overflow the call stack
        let mut reachable = 0;
        let mut stack = vec![self.root];
        while let Some(ptr) = stack.pop() {
            let node = self.nodes.get(ptr).ok_or(SanityError::DanglingLink)?;

            reachable += 1;
            if reachable > self.len() {
                return Err(SanityError::Cycle);
            }

            for &child in &[node.left, node.right] {
                if child.is_null() {
                    continue;
                }

                let child_node = self.nodes.get(child).ok_or(SanityError::DanglingLink)?;
                if child_node.parent != ptr {
                    return Err(SanityError::BrokenParentLink);
                }
                stack.push(child);
            }

            let left_height = self.height_of(node.left);
            let right_height = self.height_of(node.right);

            let expected = 1 + left_height.max(right_height);
            if node.height != expected {
                return Err(SanityError::HeightMismatch {stored: node.height, expected});
            }

            let expected = left_height - right_height;
            if node.balance != expected {
                return Err(SanityError::BalanceMismatch {stored: node.balance, expected});
            }
        }

        if reachable != self.len() {
            return Err(SanityError::LengthMismatch {reachable, len: self.len()});
        }

        // With the links known to be consistent, a binary tree is a search tree exactly when its
        // in-order walk is strictly ascending
        let mut current = node::first(&self.nodes, self.root);
        while let Some(node) = self.nodes.get(current) {
            let next = node::successor(&self.nodes, current);
            if let Some(next_node) = self.nodes.get(next) {
                if next_node.key <= node.key {
                    return Err(SanityError::OutOfOrder);
                }
            }
            current = next;
        }

        Ok(())
    }

    /// Returns true if [`BSTMap::validate`] finds no problems
    ///
    /// # Examples
    ///
    /// ```
    /// use bst_map::BSTMap;
    ///
    /// let mut map: BSTMap<_, _> = (0..20).map(|key| (key * 7 % 20, key)).collect();
    /// map.remove(&7);
    /// assert!(map.sanity_check());
    /// ```
    pub fn sanity_check(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::slab::Ptr;

    fn sample() -> BSTMap<i32, ()> {
        [5, 3, 8, 1, 4, 7, 9].iter().map(|&key| (key, ())).collect()
    }

    fn ptr_of(map: &BSTMap<i32, ()>, key: i32) -> Ptr {
        map.find_ptr(&key)
    }

    #[test]
    fn valid_trees() {
        assert_eq!(BSTMap::<i32, ()>::new().validate(), Ok(()));
        assert_eq!(sample().validate(), Ok(()));

        let mut map = sample();
        for key in 0..10 {
            map.remove(&key);
            assert_eq!(map.validate(), Ok(()));
        }
        assert!(map.is_empty());
        assert!(map.sanity_check());
    }

    #[test]
    fn detects_out_of_order_keys() {
        let mut map = sample();
        let one = ptr_of(&map, 1);
        map.nodes[one].key = 10;
        assert_eq!(map.validate(), Err(SanityError::OutOfOrder));
        assert!(!map.sanity_check());

        // A key that only violates an ancestor further up, not its own parent
        let mut map = sample();
        let four = ptr_of(&map, 4);
        map.nodes[four].key = 6;
        assert_eq!(map.validate(), Err(SanityError::OutOfOrder));

        let mut map = sample();
        let nine = ptr_of(&map, 9);
        map.nodes[nine].key = 8;
        assert_eq!(map.validate(), Err(SanityError::OutOfOrder));
    }

    #[test]
    fn detects_bad_heights() {
        let mut map = sample();
        let root = map.root;
        map.nodes[root].height = 7;
        assert_eq!(map.validate(), Err(SanityError::HeightMismatch {stored: 7, expected: 2}));

        let mut map = sample();
        let three = ptr_of(&map, 3);
        map.nodes[three].balance = 1;
        assert_eq!(map.validate(), Err(SanityError::BalanceMismatch {stored: 1, expected: 0}));
    }

    #[test]
    fn detects_broken_links() {
        let mut map = sample();
        let (three, eight) = (ptr_of(&map, 3), ptr_of(&map, 8));
        map.nodes[three].parent = eight;
        assert_eq!(map.validate(), Err(SanityError::BrokenParentLink));

        let mut map = sample();
        let (root, one) = (map.root, ptr_of(&map, 1));
        map.nodes[root].parent = one;
        assert_eq!(map.validate(), Err(SanityError::RootHasParent));

        let mut map = sample();
        let seven = ptr_of(&map, 7);
        map.nodes[seven].left = Ptr::new(1000).unwrap();
        assert_eq!(map.validate(), Err(SanityError::DanglingLink));

        // A leaf pointing back at the root
        let mut map = sample();
        let (root, nine) = (map.root, ptr_of(&map, 9));
        map.nodes[nine].right = root;
        map.nodes[root].parent = nine;
        let result = map.validate();
        assert!(matches!(result, Err(SanityError::RootHasParent)), "{:?}", result);
    }

    #[test]
    fn detects_unreachable_nodes() {
        let mut map = sample();
        let (eight, nine) = (ptr_of(&map, 8), ptr_of(&map, 9));
        // Detach 9 without removing it from the slab
        map.nodes[eight].right = Ptr::null();
        map.nodes[eight].balance = 1;
        map.nodes[nine].parent = Ptr::null();
        assert_eq!(map.validate(), Err(SanityError::LengthMismatch {reachable: 6, len: 7}));
    }

    #[test]
    fn error_messages() {
        let err = SanityError::HeightMismatch {stored: 3, expected: 1};
        assert_eq!(err.to_string(), "stored height 3 should be 1");

        let err: Box<dyn Error> = Box::new(SanityError::OutOfOrder);
        assert_eq!(err.to_string(), "keys are not in ascending order");
    }
}
