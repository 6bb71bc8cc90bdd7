// Fri Oct 16 2026 - Alex

use crate::memory::protection::{region_qualifies, PageProtection};
use crate::memory::range::merge_adjacent;
use crate::memory::{MemoryAccess, MemoryError, MemoryRange, MemoryReader};
use std::io;
use std::sync::Arc;
use ::windows::Win32::Foundation::{CloseHandle, HANDLE};
use ::windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use ::windows::Win32::System::Memory::{VirtualQueryEx, MEMORY_BASIC_INFORMATION};
use ::windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

const STILL_ACTIVE: u32 = 259;

fn os_error(err: &::windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(err.code().0 & 0xFFFF)
}

pub struct ProcessHandle {
    pid: u32,
    handle: HANDLE,
}

// SAFETY: a process handle is a kernel object reference; the calls made through
// it here are thread-safe.
unsafe impl Send for ProcessHandle {}
unsafe impl Sync for ProcessHandle {}

impl ProcessHandle {
    pub fn open(pid: u32) -> Result<Self, MemoryError> {
        // SAFETY: plain FFI call; the returned handle is owned by `Self` from here on.
        let handle = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid) }.map_err(|e| {
            let err = os_error(&e);
            match err.kind() {
                io::ErrorKind::PermissionDenied => MemoryError::Io(err),
                _ => MemoryError::ProcessUnavailable { pid },
            }
        })?;

        if handle.is_invalid() {
            return Err(MemoryError::ProcessUnavailable { pid });
        }
        Ok(Self { pid, handle })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn raw(&self) -> HANDLE {
        self.handle
    }

    pub fn is_alive(&self) -> bool {
        let mut code = 0u32;
        // SAFETY: `code` is a valid out-pointer for the duration of the call.
        match unsafe { GetExitCodeProcess(self.handle, &mut code) } {
            Ok(()) => code == STILL_ACTIVE,
            Err(_) => false,
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from OpenProcess and is closed exactly once.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

/// Reads a process through `VirtualQueryEx` and `ReadProcessMemory`.
///
/// The handle is shared, never closed here.
#[derive(Clone)]
pub struct WindowsMemoryReader {
    handle: Arc<ProcessHandle>,
}

impl WindowsMemoryReader {
    pub fn new(handle: Arc<ProcessHandle>) -> Self {
        Self { handle }
    }

    pub fn open(pid: u32) -> Result<Self, MemoryError> {
        Ok(Self::new(Arc::new(ProcessHandle::open(pid)?)))
    }

    pub fn pid(&self) -> u32 {
        self.handle.pid()
    }

    fn unavailable(&self) -> MemoryError {
        MemoryError::ProcessUnavailable { pid: self.handle.pid() }
    }
}

impl MemoryReader for WindowsMemoryReader {
    fn get_regions(
        &self,
        min_address: usize,
        max_address: usize,
        access: MemoryAccess,
    ) -> Result<Vec<MemoryRange>, MemoryError> {
        if !self.handle.is_alive() {
            return Err(self.unavailable());
        }

        let mut regions = Vec::new();
        let mut address = min_address;

        while address < max_address {
            let mut mbi = MEMORY_BASIC_INFORMATION::default();
            // SAFETY: `mbi` is a valid out-buffer of the size passed; the address is only a query hint.
            let written = unsafe {
                VirtualQueryEx(
                    self.handle.raw(),
                    Some(address as *const _),
                    &mut mbi,
                    std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if written == 0 {
                // past the last user-mode region, or the process went away
                if !self.handle.is_alive() {
                    return Err(self.unavailable());
                }
                break;
            }

            let base = mbi.BaseAddress as usize;
            let next = base.saturating_add(mbi.RegionSize);
            if mbi.RegionSize == 0 || next <= address {
                log::warn!(
                    "VirtualQueryEx made no progress at 0x{:x} (pid {}); stopping enumeration",
                    address,
                    self.handle.pid()
                );
                break;
            }

            let protection = PageProtection::from_flags(mbi.Protect.0);
            if region_qualifies(mbi.State.0, protection, access) {
                if let Some(range) = MemoryRange::new(base, mbi.RegionSize).clip(min_address, max_address) {
                    regions.push(range);
                }
            }

            address = next;
        }

        Ok(merge_adjacent(regions))
    }

    fn read(&self, address: usize, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        if buffer.is_empty() {
            return Ok(0);
        }

        let mut read = 0usize;
        // SAFETY: at most `buffer.len()` bytes are written into `buffer`; `read` is a valid out-pointer.
        let result = unsafe {
            ReadProcessMemory(
                self.handle.raw(),
                address as *const _,
                buffer.as_mut_ptr() as *mut _,
                buffer.len(),
                Some(&mut read),
            )
        };

        match result {
            Ok(()) => Ok(read),
            // ERROR_PARTIAL_COPY still reports what was copied
            Err(_) if read > 0 => Ok(read),
            Err(_) if !self.handle.is_alive() => Err(self.unavailable()),
            Err(_) => Err(MemoryError::ReadFailed {
                address,
                size: buffer.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_process() {
        let data: Vec<u8> = (0..64u8).map(|i| i.wrapping_mul(29) ^ 0x5C).collect();
        let address = data.as_ptr() as usize;
        let reader = WindowsMemoryReader::open(std::process::id()).unwrap();

        let regions = reader.get_regions(0, usize::MAX, MemoryAccess::read_write()).unwrap();
        assert!(regions.iter().any(|r| r.contains(address)));
        assert_eq!(reader.read_bytes(address, data.len()).unwrap(), data);

        let clipped = reader
            .get_regions(address, address + 16, MemoryAccess::read_write())
            .unwrap();
        assert_eq!(clipped, vec![MemoryRange::new(address, 16)]);
    }

    #[test]
    fn test_unmapped_address() {
        let reader = WindowsMemoryReader::open(std::process::id()).unwrap();
        let mut buf = [0u8; 8];
        assert!(matches!(reader.read(0x10, &mut buf), Err(MemoryError::ReadFailed { .. })));
    }
}
