//! # Exclusion Set
//!
//! Bounded record of recently shown loading words.
//!
//! Terms are stored lowercased in insertion order. When the set grows past
//! its capacity the oldest insertion is evicted. Selection code clears the
//! whole set once every candidate has been shown.

use std::collections::{BTreeSet, VecDeque};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Default number of remembered terms.
pub const DEFAULT_EXCLUSION_CAPACITY: usize = 50;

// =============================================================================
// EXCLUSION SET
// =============================================================================

/// Insertion-ordered, capacity-bounded set of lowercase terms.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    /// Terms in insertion order (front = oldest).
    order: VecDeque<String>,

    /// Membership index.
    members: BTreeSet<String>,

    /// Maximum number of remembered terms.
    capacity: usize,

    /// Statistics: total evictions.
    evictions: u64,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSION_CAPACITY)
    }
}

impl ExclusionSet {
    /// Create an empty set holding at most `capacity` terms.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            members: BTreeSet::new(),
            capacity: capacity.max(1), // At least 1
            evictions: 0,
        }
    }

    /// Record a term as shown.
    ///
    /// Re-recording a present term keeps its original position.
    pub fn insert(&mut self, term: &str) {
        let key = term.to_lowercase();
        if !self.members.insert(key.clone()) {
            return;
        }
        self.order.push_back(key);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
                self.evictions = self.evictions.saturating_add(1);
            }
        }
    }

    /// Whether a term (compared case-insensitively) was shown recently.
    #[must_use]
    pub fn contains(&self, term: &str) -> bool {
        self.members.contains(&term.to_lowercase())
    }

    /// Forget every term.
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
        // Eviction count survives a reset
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total terms dropped because the set was full.
    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Terms oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

// =============================================================================
// TESTS
// =============================================================================
