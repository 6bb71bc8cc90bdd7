// Fri Oct 16 2026 - Alex

use crate::memory::range::merge_adjacent;
use crate::memory::{MemoryAccess, MemoryError, MemoryRange, MemoryReader};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

enum RegionData {
    Owned(Vec<u8>),
    Mapped(Arc<Mmap>),
}

impl RegionData {
    fn as_slice(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Mapped(mmap) => mmap.as_ref(),
        }
    }
}

struct SnapshotRegion {
    base: usize,
    data: RegionData,
    access: MemoryAccess,
    readable: bool,
}

impl SnapshotRegion {
    fn range(&self) -> MemoryRange {
        MemoryRange::new(self.base, self.data.as_slice().len())
    }
}

/// A fabricated address space made of byte buffers or mapped dump files.
///
/// Regions must not overlap. A read never continues into the next region, so
/// a read that runs past a region's end comes back short. Regions added with
/// [`with_unreadable`](Self::with_unreadable) are listed by `get_regions` but
/// every read from them fails.
#[derive(Default)]
pub struct SnapshotReader {
    regions: Vec<SnapshotRegion>,
}

impl SnapshotReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P, base: usize) -> Result<Self, MemoryError> {
        let mut reader = Self::new();
        reader.add_mapped_file(path, base, MemoryAccess::read_write())?;
        Ok(reader)
    }

    pub fn with_region(mut self, base: usize, bytes: Vec<u8>, access: MemoryAccess) -> Self {
        self.add_region(base, bytes, access);
        self
    }

    pub fn with_unreadable(mut self, base: usize, size: usize, access: MemoryAccess) -> Self {
        self.add_unreadable(base, size, access);
        self
    }

    pub fn add_region(&mut self, base: usize, bytes: Vec<u8>, access: MemoryAccess) {
        self.insert(SnapshotRegion {
            base,
            data: RegionData::Owned(bytes),
            access,
            readable: true,
        });
    }

    pub fn add_unreadable(&mut self, base: usize, size: usize, access: MemoryAccess) {
        self.insert(SnapshotRegion {
            base,
            data: RegionData::Owned(vec![0u8; size]),
            access,
            readable: false,
        });
    }

    pub fn add_mapped_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        base: usize,
        access: MemoryAccess,
    ) -> Result<(), MemoryError> {
        let file = File::open(path)?;
        let data = if file.metadata()?.len() == 0 {
            RegionData::Owned(Vec::new())
        } else {
            // SAFETY: the mapping is read-only; a dump modified underneath us only yields stale bytes.
            let mmap = unsafe { Mmap::map(&file) }?;
            RegionData::Mapped(Arc::new(mmap))
        };
        self.insert(SnapshotRegion {
            base,
            data,
            access,
            readable: true,
        });
        Ok(())
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn insert(&mut self, region: SnapshotRegion) {
        let at = self.regions.partition_point(|r| r.base < region.base);
        self.regions.insert(at, region);
    }

    fn region_at(&self, address: usize) -> Option<&SnapshotRegion> {
        let idx = self.regions.partition_point(|r| r.base <= address);
        let region = self.regions.get(idx.checked_sub(1)?)?;
        region.range().contains(address).then_some(region)
    }
}

impl MemoryReader for SnapshotReader {
    fn get_regions(
        &self,
        min_address: usize,
        max_address: usize,
        access: MemoryAccess,
    ) -> Result<Vec<MemoryRange>, MemoryError> {
        let regions = self
            .regions
            .iter()
            .filter(|r| {
                access.admits(
                    r.access.contains(MemoryAccess::READABLE),
                    r.access.contains(MemoryAccess::WRITABLE),
                    r.access.contains(MemoryAccess::EXECUTABLE),
                )
            })
            .filter_map(|r| r.range().clip(min_address, max_address))
            .collect();
        Ok(merge_adjacent(regions))
    }

    fn read(&self, address: usize, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        let size = buffer.len();
        let failed = || MemoryError::ReadFailed { address, size };

        let region = self.region_at(address).ok_or_else(failed)?;
        if !region.readable {
            return Err(failed());
        }

        let bytes = &region.data.as_slice()[address - region.base..];
        let count = bytes.len().min(buffer.len());
        buffer[..count].copy_from_slice(&bytes[..count]);
        Ok(count)
    }
}
