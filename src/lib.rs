//! An ordered map backed by a plain (unbalanced) binary search tree
//!
//! Nodes are stored in a slab and linked to their parent and children by index. Every node keeps
//! the height and balance of its subtree, which are kept up to date by every insertion and
//! removal. The tree is never rebalanced.

#![allow(clippy::upper_case_acronyms)]

pub mod map;
mod slab;

pub use map::{BSTMap, Cursor, CursorMut, Node, SanityError};

/// Creates a [`BSTMap`] from a list of `key => value` pairs
///
/// Later pairs replace the values of earlier pairs with the same key.
///
/// ```
/// use bst_map::bstmap;
///
/// let map = bstmap! {
///     "b" => 2,
///     "a" => 1,
/// };
/// assert_eq!(map.to_string(), "a:1 b:2");
/// ```
#[macro_export(local_inner_macros)]
macro_rules! bstmap {
    // trailing comma case
    ($($key:expr => $value:expr,)+) => (bstmap!($($key => $value),+));

    ( $($key:expr => $value:expr),* ) => {
        {
            let mut _map = $crate::BSTMap::new();
            $(
                let _ = _map.insert($key, $value);
            )*
            _map
        }
    };
}
