// Fri Oct 16 2026 - Alex

use crate::memory::MemoryError;
use crate::pattern::PatternError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    #[error("Pattern of {length} bytes does not fit a {chunk_size}-byte scan chunk")]
    PatternTooLarge { length: usize, chunk_size: usize },
    #[error("Invalid address range: min 0x{min:x} is not below max 0x{max:x}")]
    InvalidAddressRange { min: usize, max: usize },
    #[error("Process {pid} is not available")]
    ProcessUnavailable { pid: u32 },
    #[error("Scan cancelled after {} matches", .partial.len())]
    Cancelled { partial: Vec<usize> },
    #[error("Memory error: {0}")]
    Memory(MemoryError),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<MemoryError> for ScanError {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::ProcessUnavailable { pid } => ScanError::ProcessUnavailable { pid },
            other => ScanError::Memory(other),
        }
    }
}

impl ScanError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Matches collected before cancellation, if this is a cancellation.
    pub fn partial_matches(&self) -> Option<&[usize]> {
        match self {
            Self::Cancelled { partial } => Some(partial),
            _ => None,
        }
    }
}
