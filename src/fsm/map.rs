//! Free-space map implementation
//!
//! Binary min-heap over page handles, ordered by remaining slots.

use std::ops::{Deref, DerefMut};

/// One tracked page
#[derive(Debug)]
struct Entry<P> {
    page: P,
    free: u32,
}

/// Min-heap of pages keyed by remaining capacity
///
/// ## Invariants:
/// - Every entry has `free > 0`; an entry leaves the heap exactly when its
///   last slot is reserved
/// - `entries[i].free <= entries[child].free` for both children of `i`
#[derive(Debug)]
pub struct FreeSpaceMap<P> {
    entries: Vec<Entry<P>>,
}

/// A slot reserved by [`FreeSpaceMap::pop`]
///
/// Derefs to the page the caller must write into.
#[derive(Debug)]
pub enum Reservation<'a, P> {
    /// The page still has free slots and stays in the map
    Partial(&'a mut P),

    /// The reserved slot was the page's last one; the map gave the page up
    Last(P),
}

impl<P> Reservation<'_, P> {
    /// Whether this reservation filled the page
    pub fn is_last(&self) -> bool {
        matches!(self, Reservation::Last(_))
    }
}

impl<P> Deref for Reservation<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        match self {
            Reservation::Partial(page) => page,
            Reservation::Last(page) => page,
        }
    }
}

impl<P> DerefMut for Reservation<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        match self {
            Reservation::Partial(page) => page,
            Reservation::Last(page) => page,
        }
    }
}

impl<P> FreeSpaceMap<P> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Track `page` with `free` remaining slots
    pub fn push(&mut self, page: P, free: u32) {
        self.entries.push(Entry { page, free });
        self.sift_up(self.entries.len() - 1);
    }

    /// Reserve one slot in the page closest to full
    ///
    /// Returns `None` if no page has room.
    ///
    /// # Panics
    ///
    /// Panics if the root entry has no free slots. That can only happen when
    /// the caller's bookkeeping has diverged from the map.
    pub fn pop(&mut self) -> Option<Reservation<'_, P>> {
        let root = self.entries.first_mut()?;

        if root.free == 0 {
            panic!("free space map corrupted: root page has no free slots");
        }

        root.free -= 1;

        if root.free > 0 {
            return Some(Reservation::Partial(&mut self.entries[0].page));
        }

        let entry = self.entries.swap_remove(0);
        self.sift_down(0);
        Some(Reservation::Last(entry.page))
    }

    /// Remove the first entry whose page matches `pred`
    ///
    /// Returns the page with the slots it still had.
    pub fn remove<F>(&mut self, mut pred: F) -> Option<(P, u32)>
    where
        F: FnMut(&P) -> bool,
    {
        let index = self.entries.iter().position(|e| pred(&e.page))?;
        let entry = self.entries.swap_remove(index);

        // The former last element now sits at `index` and may be out of
        // place in either direction
        if index < self.entries.len() {
            self.sift_down(index);
            self.sift_up(index);
        }

        Some((entry.page, entry.free))
    }

    /// Set the free slot count of the first page matching `pred`
    ///
    /// Returns `false` if no page matches.
    ///
    /// # Panics
    ///
    /// Panics if `free` is zero. A page with no room must be removed instead.
    pub fn update<F>(&mut self, mut pred: F, free: u32) -> bool
    where
        F: FnMut(&P) -> bool,
    {
        assert!(free > 0, "free space map entries must have free slots");

        let index = match self.entries.iter().position(|e| pred(&e.page)) {
            Some(index) => index,
            None => return false,
        };

        self.entries[index].free = free;
        self.sift_down(index);
        self.sift_up(index);
        true
    }

    /// Number of tracked pages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of remaining slots across all tracked pages
    pub fn total_free(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.free)).sum()
    }

    /// Iterate `(page, free)` in heap array order (root first)
    pub fn iter(&self) -> impl Iterator<Item = (&P, u32)> {
        self.entries.iter().map(|e| (&e.page, e.free))
    }

    /// Consume the map, yielding every tracked page with its free slots
    pub fn into_pages(self) -> impl Iterator<Item = (P, u32)> {
        self.entries.into_iter().map(|e| (e.page, e.free))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;

            if self.entries[index].free >= self.entries[parent].free {
                break;
            }

            self.entries.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let n = self.entries.len();

        loop {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            let mut smallest = index;

            if left < n && self.entries[left].free < self.entries[smallest].free {
                smallest = left;
            }

            if right < n && self.entries[right].free < self.entries[smallest].free {
                smallest = right;
            }

            if smallest == index {
                break;
            }

            self.entries.swap(index, smallest);
            index = smallest;
        }
    }
}

impl<P> Default for FreeSpaceMap<P> {
    fn default() -> Self {
        Self::new()
    }
}
