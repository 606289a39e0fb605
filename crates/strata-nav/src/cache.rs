//! Memoization of solver results, keyed by stable surface handles.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use crate::path::Path;

/// Memoizes point-to-point paths keyed by an unordered surface pair.
///
/// Keys are chunk-local [`SurfaceId`](crate::surface::SurfaceId)s (or
/// [`SurfaceRef`](crate::surface::SurfaceRef)s for the facade-level cache) —
/// never live references, which would dangle across the wholesale rebuilds
/// chunks go through.
///
/// Insertion is always symmetric: `insert(a, b, path)` registers `(b, a)`
/// against the *same* shared path, not a reversed copy. A reversed-key hit
/// therefore yields the route stored in the other orientation; callers
/// detect the direction from the path's endpoints. Invalid paths are cached
/// too (negative caching).
pub struct SubPathCache<K> {
    entries: HashMap<(K, K), Rc<Path>>,
    hits: u64,
    misses: u64,
}

impl<K: Copy + Eq + Hash> Default for SubPathCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> SubPathCache<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached path between `a` and `b`, counting the hit or miss.
    pub fn lookup(&mut self, a: K, b: K) -> Option<Rc<Path>> {
        match self.entries.get(&(a, b)) {
            Some(p) => {
                self.hits += 1;
                Some(Rc::clone(p))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Non-counting read, for tests and diagnostics.
    pub fn peek(&self, a: K, b: K) -> Option<&Rc<Path>> {
        self.entries.get(&(a, b))
    }

    /// Register `path` under `(a, b)` and `(b, a)`, sharing one allocation.
    pub fn insert(&mut self, a: K, b: K, path: Path) -> Rc<Path> {
        let shared = Rc::new(path);
        self.entries.insert((a, b), Rc::clone(&shared));
        self.entries.insert((b, a), Rc::clone(&shared));
        shared
    }

    /// Drop every entry. Must run whenever the topology the paths were
    /// computed against changes; counters survive for diagnostics.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
