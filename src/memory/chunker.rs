// Fri Oct 16 2026 - Alex

use crate::memory::MemoryRange;
use crate::orchestrator::ScanError;

pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

pub type ScanChunk = MemoryRange;

/// Splits regions into chunks of at most `chunk_size` bytes.
///
/// Consecutive chunks of one region overlap by `pattern_len - 1` bytes, so
/// every pattern-length window inside a region lies wholly inside some chunk.
/// Regions shorter than the pattern produce nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionChunker {
    chunk_size: usize,
    pattern_len: usize,
}

impl RegionChunker {
    pub fn new(pattern_len: usize, chunk_size: usize) -> Result<Self, ScanError> {
        let pattern_len = pattern_len.max(1);
        if pattern_len >= chunk_size {
            return Err(ScanError::PatternTooLarge {
                length: pattern_len,
                chunk_size,
            });
        }
        Ok(Self {
            chunk_size,
            pattern_len,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.pattern_len - 1
    }

    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap()
    }

    pub fn chunks_of(&self, region: MemoryRange) -> impl Iterator<Item = ScanChunk> {
        let base = region.base();
        let size = region.size();
        let chunk_size = self.chunk_size;
        let pattern_len = self.pattern_len;
        let step = self.step();
        let mut offset = 0usize;

        std::iter::from_fn(move || {
            let remaining = size - offset;
            if remaining < pattern_len {
                return None;
            }

            let len = remaining.min(chunk_size);
            let chunk = MemoryRange::new(base + offset, len);
            if len == remaining {
                offset = size;
            } else {
                offset += step;
            }
            Some(chunk)
        })
    }

    pub fn chunk(&self, regions: &[MemoryRange]) -> Vec<ScanChunk> {
        regions.iter().flat_map(|&region| self.chunks_of(region)).collect()
    }
}

pub fn chunk_regions(
    regions: &[MemoryRange],
    pattern_len: usize,
    chunk_size: usize,
) -> Result<Vec<ScanChunk>, ScanError> {
    Ok(RegionChunker::new(pattern_len, chunk_size)?.chunk(regions))
}
