// Fri Oct 16 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Process {pid} is not available")]
    ProcessUnavailable { pid: u32 },
    #[error("Read of {size} bytes failed at address 0x{address:x}")]
    ReadFailed { address: usize, size: usize },
    #[error("Partial read at address 0x{address:x}: {read} of {expected} bytes")]
    PartialRead {
        address: usize,
        expected: usize,
        read: usize,
    },
    #[error("Not supported: {0}")]
    Unsupported(String),
}

impl MemoryError {
    pub fn is_process_unavailable(&self) -> bool {
        matches!(self, Self::ProcessUnavailable { .. })
    }
}
