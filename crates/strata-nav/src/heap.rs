//! Indexed binary min-heap over dense integer item ids.

/// Sentinel slot value meaning "item not on the heap".
const ABSENT: u32 = u32::MAX;

/// A binary min-heap keyed by `f32` cost, over dense `usize` item ids.
///
/// A reverse index array gives O(1) membership tests and O(log n)
/// decrease-key, which `BinaryHeap` cannot offer without stale-entry
/// bookkeeping. Item ids index arena arrays elsewhere (grid cells, search
/// nodes), so storage grows geometrically with the largest id seen.
///
/// `update` re-sorts **upward only**: callers may only ever decrease an
/// item's key (all searches in this crate relax costs monotonically). A key
/// increase would silently leave the heap invariant violated; this asymmetry
/// is deliberate and relied upon nowhere.
pub struct IndexedMinHeap {
    /// Heap order: `heap[i]` is an item id.
    heap: Vec<u32>,
    /// Reverse index: `slot[item]` is the heap position of `item`, or
    /// [`ABSENT`].
    slot: Vec<u32>,
    /// `key[item]` is only meaningful while the item is on the heap.
    key: Vec<f32>,
}

impl Default for IndexedMinHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexedMinHeap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self {
            heap: Vec::new(),
            slot: Vec::new(),
            key: Vec::new(),
        }
    }

    /// Create an empty heap with room for items `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            slot: vec![ABSENT; capacity],
            key: vec![0.0; capacity],
        }
    }

    /// Number of items currently on the heap.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the heap holds no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether `item` is currently on the heap.
    #[inline]
    pub fn contains(&self, item: usize) -> bool {
        self.slot.get(item).is_some_and(|&s| s != ABSENT)
    }

    /// Current key of `item`, if it is on the heap.
    #[inline]
    pub fn key_of(&self, item: usize) -> Option<f32> {
        if self.contains(item) {
            Some(self.key[item])
        } else {
            None
        }
    }

    /// Remove all items. O(capacity): the reverse index is wiped in place.
    pub fn clear(&mut self) {
        self.heap.clear();
        for s in self.slot.iter_mut() {
            *s = ABSENT;
        }
    }

    fn grow_to(&mut self, item: usize) {
        if item < self.slot.len() {
            return;
        }
        // Geometric growth keeps insert amortized O(log n).
        let new_len = (item + 1).next_power_of_two().max(16);
        self.slot.resize(new_len, ABSENT);
        self.key.resize(new_len, 0.0);
    }

    /// Insert `item` with the given key. Must not already be on the heap.
    pub fn insert(&mut self, item: usize, key: f32) {
        debug_assert!(!self.contains(item), "item {item} inserted twice");
        self.grow_to(item);
        self.key[item] = key;
        let pos = self.heap.len() as u32;
        self.heap.push(item as u32);
        self.slot[item] = pos;
        self.sift_up(pos as usize);
    }

    /// Lower `item`'s key. The heap is re-sorted upward only; passing a key
    /// larger than the current one corrupts the heap order.
    pub fn update(&mut self, item: usize, key: f32) {
        debug_assert!(self.contains(item), "update of absent item {item}");
        debug_assert!(
            key <= self.key[item],
            "update may only decrease keys ({key} > {})",
            self.key[item]
        );
        self.key[item] = key;
        let pos = self.slot[item] as usize;
        self.sift_up(pos);
    }

    /// Pop the item with the smallest key.
    pub fn remove_min(&mut self) -> Option<usize> {
        let min = *self.heap.first()? as usize;
        let last = self.heap.pop().expect("non-empty heap");
        self.slot[min] = ABSENT;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.slot[last as usize] = 0;
            self.sift_down(0);
        }
        Some(min)
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.key_at(parent) <= self.key_at(pos) {
                break;
            }
            self.swap(parent, pos);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < len && self.key_at(right) < self.key_at(left) {
                smallest = right;
            }
            if self.key_at(pos) <= self.key_at(smallest) {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    #[inline]
    fn key_at(&self, pos: usize) -> f32 {
        self.key[self.heap[pos] as usize]
    }

    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slot[self.heap[a] as usize] = a as u32;
        self.slot[self.heap[b] as usize] = b as u32;
    }
}
