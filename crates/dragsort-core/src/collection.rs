#![forbid(unsafe_code)]

//! The ordered collection being reordered.
//!
//! # Invariants
//!
//! 1. No two items share an id. Construction and replacement reject
//!    duplicates.
//! 2. [`move_relative`](OrderedCollection::move_relative) only ever removes
//!    and re-inserts one item, so membership is unchanged by any sequence
//!    of moves.
//! 3. Inserting after the last item lands *before* it rather than past the
//!    end: `[A, B, C]` with `A` moved after `C` yields `[B, A, C]`.

use std::fmt::Debug;
use std::hash::Hash;

use ahash::AHashSet;

use crate::error::ReorderError;

/// Stable identity for an item, independent of where it sits in memory.
pub trait Identify {
    /// The identity key. Two items with equal ids are the same logical item.
    type Id: Clone + Eq + Hash + Debug;

    /// This item's id.
    fn id(&self) -> Self::Id;
}

macro_rules! identify_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identify for $ty {
                type Id = $ty;

                #[inline]
                fn id(&self) -> Self::Id {
                    self.clone()
                }
            }
        )*
    };
}

identify_by_value!(u8, u16, u32, u64, usize, i32, i64, char, String, &'static str);

/// Which side of a target item an insertion refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Insert the moved item in front of the target.
    Before,
    /// Insert the moved item behind the target.
    After,
}

impl Slot {
    /// `true` for [`Slot::Before`].
    #[inline]
    #[must_use]
    pub const fn is_before(self) -> bool {
        matches!(self, Self::Before)
    }

    /// Build from an `insert_before` flag.
    #[inline]
    #[must_use]
    pub const fn from_before(insert_before: bool) -> Self {
        if insert_before {
            Self::Before
        } else {
            Self::After
        }
    }
}

/// A sequence of uniquely identified items in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedCollection<T> {
    items: Vec<T>,
}

impl<T> Default for OrderedCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Identify> OrderedCollection<T> {
    /// Wrap `items`, rejecting duplicate ids.
    pub fn new(items: Vec<T>) -> Result<Self, ReorderError> {
        let mut seen = AHashSet::with_capacity(items.len());
        for item in &items {
            let id = item.id();
            if !seen.insert(id.clone()) {
                return Err(ReorderError::duplicate_item(&id));
            }
        }
        Ok(Self { items })
    }

    /// Number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an item with `id` is present.
    pub fn contains(&self, id: &T::Id) -> bool {
        self.index_of(id).is_some()
    }

    /// Current position of the item with `id`.
    pub fn index_of(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == *id)
    }

    /// Item by id.
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == *id)
    }

    /// Items in display order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Ids in display order.
    pub fn ids(&self) -> Vec<T::Id> {
        self.items.iter().map(Identify::id).collect()
    }

    /// Give back the underlying vector.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Move `moved` next to `target`.
    ///
    /// `moved` is removed first and the target's index is taken in the
    /// remaining sequence. The item is re-inserted at that index
    /// ([`Slot::Before`]) or one past it ([`Slot::After`]). An after-insert
    /// behind the last item falls back to the target's index instead of
    /// appending. Returns `false` without touching the collection if either
    /// item is missing or `moved == target`.
    pub fn move_relative(&mut self, moved: &T::Id, target: &T::Id, slot: Slot) -> bool {
        if moved == target || !self.contains(target) {
            return false;
        }
        let Some(from) = self.index_of(moved) else {
            return false;
        };

        let item = self.items.remove(from);
        let Some(index) = self.index_of(target) else {
            // Unreachable given the check above; restore rather than lose the item.
            self.items.insert(from, item);
            return false;
        };
        let at = match slot {
            Slot::Before => index,
            Slot::After if index + 1 >= self.items.len() => index,
            Slot::After => index + 1,
        };
        self.items.insert(at, item);
        true
    }
}

impl<'a, T> IntoIterator for &'a OrderedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
