//! The per-file symbol-reference index value.
//!
//! An [`IndexValue`] maps each referenced [`SymbolKey`] to the locations
//! that reference it, with an exact occurrence count per location. It is
//! produced per class file by the extractor; merging values across files
//! is the host storage layer's job.

mod key;

pub use key::{RefKind, SymbolKey};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Occurrence counts keyed by referencing location.
pub type LocationCounts = BTreeMap<String, u32>;

/// Mapping from referenced symbol to per-location occurrence counts.
///
/// Invariants: every stored count is at least 1; a (key, location) pair
/// exists only if that location references the key at least once.
/// Backed by ordered maps so iteration (and therefore the encoded byte
/// stream) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexValue {
    entries: BTreeMap<SymbolKey, LocationCounts>,
}

impl IndexValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reference to `key` at `location`.
    ///
    /// This is the aggregation fold: counts commute under addition, so
    /// recording the same observation multiset in any order yields an
    /// identical value.
    pub fn record(&mut self, key: SymbolKey, location: &str) {
        self.record_n(key, location, 1);
    }

    /// Record `n` references to `key` at `location`. `n == 0` is a no-op
    /// so the count-presence invariant holds.
    pub fn record_n(&mut self, key: SymbolKey, location: &str, n: u32) {
        if n == 0 {
            return;
        }
        let counts = self.entries.entry(key).or_default();
        match counts.get_mut(location) {
            Some(count) => *count += n,
            None => {
                counts.insert(location.to_string(), n);
            }
        }
    }

    /// Insert a fully built location map for `key`, used by the decoder.
    pub(crate) fn insert(&mut self, key: SymbolKey, counts: LocationCounts) {
        self.entries.insert(key, counts);
    }

    /// Locations referencing `key`, if any.
    pub fn get(&self, key: &SymbolKey) -> Option<&LocationCounts> {
        self.entries.get(key)
    }

    /// Occurrence count for a specific (key, location) pair.
    pub fn count(&self, key: &SymbolKey, location: &str) -> u32 {
        self.entries
            .get(key)
            .and_then(|counts| counts.get(location).copied())
            .unwrap_or(0)
    }

    /// Number of distinct referenced symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SymbolKey, &LocationCounts)> {
        self.entries.iter()
    }

    /// All referenced symbol keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &SymbolKey> {
        self.entries.keys()
    }

    /// Total number of reference sites recorded across all keys.
    pub fn total_sites(&self) -> u64 {
        self.entries
            .values()
            .flat_map(|counts| counts.values())
            .map(|&count| u64::from(count))
            .sum()
    }
}
