// Fri Oct 16 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryRange {
    base: usize,
    size: usize,
}

impl MemoryRange {
    pub fn new(base: usize, size: usize) -> Self {
        Self { base, size }
    }

    pub fn from_bounds(start: usize, end: usize) -> Option<Self> {
        end.checked_sub(start).map(|size| Self::new(start, size))
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn end(&self) -> usize {
        self.base.saturating_add(self.size)
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.base && addr < self.end()
    }

    pub fn is_adjacent_to(&self, next: &Self) -> bool {
        self.base.checked_add(self.size) == Some(next.base)
    }

    pub fn clip(&self, min: usize, max: usize) -> Option<Self> {
        let start = self.base.max(min);
        let end = self.end().min(max);
        if start < end {
            Self::from_bounds(start, end)
        } else {
            None
        }
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:x}, 0x{:x})", self.base, self.end())
    }
}

/// Coalesces ranges where one ends exactly at the next one's base.
///
/// The input is ordered by base first. Empty ranges are dropped. Merging an
/// already merged list returns it unchanged.
pub fn merge_adjacent(mut ranges: Vec<MemoryRange>) -> Vec<MemoryRange> {
    ranges.retain(|r| !r.is_empty());
    ranges.sort_unstable_by_key(|r| r.base);

    let mut merged: Vec<MemoryRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(current) if current.is_adjacent_to(&range) => {
                current.size = current.size.saturating_add(range.size)
            }
            _ => merged.push(range),
        }
    }
    merged
}
