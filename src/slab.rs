use std::mem;
use std::ops::{Index, IndexMut};

#[cfg(test)]
use static_assertions::const_assert_eq;

/// An index into a slab, or "null"
///
/// This type is essentially `Option<usize>`. The value usize::MAX is
/// reserved to represent `None` or "null".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Ptr(usize);

// Every node stores three of these, so `Ptr` must stay the size of a plain index
#[cfg(test)]
const_assert_eq!(mem::size_of::<Ptr>(), mem::size_of::<usize>());
// Using `Option<usize>` directly would use more space.
#[cfg(test)]
const_assert_eq!(mem::size_of::<Option<usize>>(), 2 * mem::size_of::<usize>());

impl Default for Ptr {
    #[inline(always)]
    fn default() -> Self {
        Self::null()
    }
}

impl Ptr {
    #[cfg(test)]
    #[inline(always)]
    pub fn new(index: usize) -> Option<Self> {
        if index == usize::MAX {
            None
        } else {
            Some(Ptr(index))
        }
    }

    #[inline(always)]
    pub fn null() -> Self {
        Ptr(usize::MAX)
    }

    // Methods on this type must be `#[inline]` to help the compiler see that the `Option` values
    // are only intermediate values used to make writing code easier. Instead of checking for `None`
    // and then `usize::MAX`, we want the compiler to just check the latter.
    #[inline(always)]
    pub fn into_index(self) -> Option<usize> {
        let Ptr(index) = self;
        if index == usize::MAX {
            None
        } else {
            Some(index)
        }
    }

    #[inline(always)]
    pub fn is_null(self) -> bool {
        self.0 == usize::MAX
    }
}

#[derive(Debug, Clone)]
enum Entry<T> {
    Occupied(T),
    Vacant(FreeEntry),
}

/// An item in the free list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FreeEntry {
    /// The index of the next entry in the free list or `Ptr::null()` if this is the last entry in
    /// the free list
    next: Ptr,
}

/// An allocation primitive similar to `Vec`, but implemented to reuse space from removed entries.
///
/// Items are kept contiguously in memory, but indexes are not shifted when an individual item is
/// removed. Instead of always pushing items after the previously pushed item, this data structure
/// will reuse space from previously removed entries when possible. A `Ptr` returned from `push`
/// stays valid until that same entry is removed.
#[derive(Debug)]
pub struct Slab<T> {
    items: Vec<Entry<T>>,
    /// The index of the first entry in the free list or Ptr::null() if the free list is empty
    ///
    /// The free list is a linked list stored in `items` that is used as a stack to track which
    /// entries have space that can be reused in calls to `push`.
    free_list_head: Ptr,
    /// The length of the free list
    free_len: usize,
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self {
            items: Vec::default(),
            free_list_head: Ptr::null(),
            free_len: 0,
        }
    }
}

// Cloning preserves every index, so pointers stored inside the values stay meaningful in the copy
impl<T: Clone> Clone for Slab<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            free_list_head: self.free_list_head,
            free_len: self.free_len,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.items.clone_from(&source.items);
        self.free_list_head = source.free_list_head;
        self.free_len = source.free_len;
    }
}

impl<T> Slab<T> {
    /// Creates an empty slab with the specified capacity.
    ///
    /// The slab will be able to hold at least `capacity` elements without reallocating. If
    /// `capacity` is 0, the slab will not allocate.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Returns the number of entries in the slab that contain values
    ///
    /// This is the number of items pushed minus the number of items removed
    pub fn len(&self) -> usize {
        self.items.len() - self.free_len
    }

    /// Returns true if the slab is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of slots in use or on the free list. Every valid `Ptr` has an index
    /// below this bound.
    pub fn slots(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of elements the slab can hold without reallocating.
    ///
    /// This number is a lower bound; the slab might be able to hold more, but is guaranteed to be
    /// able to hold at least this many.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Returns a reference to the value at `ptr`, or `None` if `ptr` is null, out of bounds, or
    /// refers to a removed entry
    pub fn get(&self, ptr: Ptr) -> Option<&T> {
        match self.items.get(ptr.into_index()?)? {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant(_) => None,
        }
    }

    /// Returns a mutable reference to the value at `ptr`, or `None` if `ptr` is null, out of
    /// bounds, or refers to a removed entry
    pub fn get_mut(&mut self, ptr: Ptr) -> Option<&mut T> {
        match self.items.get_mut(ptr.into_index()?)? {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant(_) => None,
        }
    }

    /// Returns mutable references to two distinct values at the same time
    ///
    /// Returns `None` if `a == b` or if either pointer does not refer to a value.
    pub fn get_pair_mut(&mut self, a: Ptr, b: Ptr) -> Option<(&mut T, &mut T)> {
        let (index_a, index_b) = (a.into_index()?, b.into_index()?);
        if index_a == index_b {
            return None;
        }

        let (low, high) = (index_a.min(index_b), index_a.max(index_b));
        if high >= self.items.len() {
            return None;
        }

        let (head, tail) = self.items.split_at_mut(high);
        let low_value = match &mut head[low] {
            Entry::Occupied(value) => value,
            Entry::Vacant(_) => return None,
        };
        let high_value = match &mut tail[0] {
            Entry::Occupied(value) => value,
            Entry::Vacant(_) => return None,
        };

        if index_a < index_b {
            Some((low_value, high_value))
        } else {
            Some((high_value, low_value))
        }
    }

    /// Iterates over every value in the slab along with its pointer, in index order
    pub fn iter_mut(&mut self) -> impl Iterator<Item=(Ptr, &mut T)> {
        self.items.iter_mut().enumerate().filter_map(|(index, entry)| match entry {
            Entry::Occupied(value) => Some((Ptr(index), value)),
            Entry::Vacant(_) => None,
        })
    }

    /// Pushes a value into the slab and returns the pointer at which it was inserted.
    ///
    /// The item may be inserted at the end of the list, or in the space from an item was previously
    /// removed.
    pub fn push(&mut self, value: T) -> Ptr {
        // Check if we can reuse some space from the free list
        if let Some(free_list_head) = self.free_list_head.into_index() {
            let entry = &mut self.items[free_list_head];

            match mem::replace(entry, Entry::Occupied(value)) {
                Entry::Vacant(free) => {
                    // Update the free list to point to the next free list entry
                    self.free_list_head = free.next;
                    self.free_len -= 1;
                },

                Entry::Occupied(_) => unreachable!("bug: free list pointed at an occupied entry"),
            }

            return Ptr(free_list_head);
        }

        let index = self.items.len();
        // Since we store `Ptr` internally, we can't have usize::MAX as a valid index into the slab
        if index >= usize::MAX {
            panic!("cannot have more than usize::MAX - 1 entries in slab");
        }

        self.items.push(Entry::Occupied(value));

        Ptr(index)
    }

    /// Removes an item from the slab, returning its value.
    ///
    /// The space for the item will be reused in future calls to `push`. This does not move or
    /// modify any other entries in the slab. Their pointers remain the same and can still be used.
    ///
    /// Removing the last remaining value resets the slab (without changing its capacity), which
    /// invalidates every pointer previously returned from `push`.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` does not refer to a value in the slab.
    pub fn remove(&mut self, ptr: Ptr) -> T {
        let index = match ptr.into_index() {
            Some(index) if index < self.items.len() => index,
            _ => panic!("invalid slab pointer: {:?}", ptr),
        };

        let free = Entry::Vacant(FreeEntry {next: self.free_list_head});
        let value = match mem::replace(&mut self.items[index], free) {
            Entry::Occupied(value) => value,
            Entry::Vacant(prev) => {
                self.items[index] = Entry::Vacant(prev);
                panic!("invalid slab pointer: {:?}", ptr);
            },
        };

        self.free_list_head = ptr;
        self.free_len += 1;

        if self.is_empty() {
            self.reset_internal_state();
        }

        value
    }

    /// Clears the slab, removing all values.
    ///
    /// Note that this method has no effect on the allocated capacity of the slab.
    ///
    /// This invalidates all previous pointers returned from `push`.
    pub fn clear(&mut self) {
        self.reset_internal_state();
    }

    /// Reset internal state while maintaining the same capacity
    #[inline(always)]
    fn reset_internal_state(&mut self) {
        let Self {items, free_list_head, free_len} = self;
        // Clearing `items` drops every value without affecting the allocated capacity.
        items.clear();
        // Need to clear the free list so we don't end up indexing out of bounds into `items` now
        // that has been cleared
        *free_list_head = Ptr::null();
        *free_len = 0;
    }

    /// Reserves capacity for at least `additional` more elements to be inserted in the slab.
    ///
    /// The collection may reserve more space to avoid frequent reallocations. After calling
    /// reserve, capacity will be greater than or equal to `self.len() + additional`. Does nothing
    /// if capacity is already sufficient.
    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional)
    }

    /// Shrinks the capacity of the vector as much as possible.
    ///
    /// It will drop down as close as possible to the length but may still be greater.
    pub fn shrink_to_fit(&mut self) {
        self.items.shrink_to_fit()
    }
}

impl<T> Index<Ptr> for Slab<T> {
    type Output = T;

    fn index(&self, ptr: Ptr) -> &T {
        match self.get(ptr) {
            Some(value) => value,
            None => panic!("invalid slab pointer: {:?}", ptr),
        }
    }
}

impl<T> IndexMut<Ptr> for Slab<T> {
    fn index_mut(&mut self, ptr: Ptr) -> &mut T {
        match self.get_mut(ptr) {
            Some(value) => value,
            None => panic!("invalid slab pointer: {:?}", ptr),
        }
    }
}
