//! Memo table of difference scores computed during one offset search.

use std::collections::HashMap;

use glam::IVec2;

/// A previously computed score.
///
/// `precision` is the sampling stride the score was computed with: `1` means
/// every overlapping sample was compared, larger values skip rows and columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetCacheEntry {
    pub offset: IVec2,
    pub error: f64,
    pub precision: u32,
}

/// Scores keyed by integer offset.
///
/// An entry answers a query only when it was sampled at least as densely as
/// requested (`entry.precision <= query precision`). Only the densest entry per
/// offset is kept.
#[derive(Debug, Default)]
pub struct OffsetCache {
    entries: HashMap<IVec2, OffsetCacheEntry>,
}

impl OffsetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, offset: IVec2, precision: u32) -> Option<f64> {
        self.entries
            .get(&offset)
            .filter(|entry| entry.precision <= precision)
            .map(|entry| entry.error)
    }

    pub fn insert(&mut self, offset: IVec2, error: f64, precision: u32) {
        let entry = OffsetCacheEntry {
            offset,
            error,
            precision,
        };
        self.entries
            .entry(offset)
            .and_modify(|existing| {
                if precision < existing.precision {
                    *existing = entry;
                }
            })
            .or_insert(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
