// Fri Oct 16 2026 - Alex

use crate::memory::{MemoryAccess, MemoryError, MemoryRange};
use std::sync::Arc;

/// Access to a target address space.
///
/// Implementations borrow whatever handle identifies the target and never
/// close it.
pub trait MemoryReader: Send + Sync {
    /// Regions in `[min_address, max_address)` granting every flag in
    /// `access`, clipped to those bounds and with adjacent ranges merged.
    fn get_regions(
        &self,
        min_address: usize,
        max_address: usize,
        access: MemoryAccess,
    ) -> Result<Vec<MemoryRange>, MemoryError>;

    /// Copies memory starting at `address` into `buffer` and returns how many
    /// bytes were copied. A short count is not an error at this level.
    fn read(&self, address: usize, buffer: &mut [u8]) -> Result<usize, MemoryError>;

    /// Like [`read`](Self::read), but a short read is a
    /// [`MemoryError::PartialRead`].
    fn read_exact(&self, address: usize, buffer: &mut [u8]) -> Result<(), MemoryError> {
        let read = self.read(address, buffer)?;
        if read != buffer.len() {
            return Err(MemoryError::PartialRead {
                address,
                expected: buffer.len(),
                read,
            });
        }
        Ok(())
    }

    fn read_bytes(&self, address: usize, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut buffer = vec![0u8; len];
        self.read_exact(address, &mut buffer)?;
        Ok(buffer)
    }
}

impl<T: MemoryReader + ?Sized> MemoryReader for &T {
    fn get_regions(
        &self,
        min_address: usize,
        max_address: usize,
        access: MemoryAccess,
    ) -> Result<Vec<MemoryRange>, MemoryError> {
        (**self).get_regions(min_address, max_address, access)
    }

    fn read(&self, address: usize, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        (**self).read(address, buffer)
    }
}

impl<T: MemoryReader + ?Sized> MemoryReader for Box<T> {
    fn get_regions(
        &self,
        min_address: usize,
        max_address: usize,
        access: MemoryAccess,
    ) -> Result<Vec<MemoryRange>, MemoryError> {
        (**self).get_regions(min_address, max_address, access)
    }

    fn read(&self, address: usize, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        (**self).read(address, buffer)
    }
}

impl<T: MemoryReader + ?Sized> MemoryReader for Arc<T> {
    fn get_regions(
        &self,
        min_address: usize,
        max_address: usize,
        access: MemoryAccess,
    ) -> Result<Vec<MemoryRange>, MemoryError> {
        (**self).get_regions(min_address, max_address, access)
    }

    fn read(&self, address: usize, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        (**self).read(address, buffer)
    }
}
