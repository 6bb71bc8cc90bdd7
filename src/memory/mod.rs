// Fri Oct 16 2026 - Alex

pub mod access;
pub mod chunker;
pub mod error;
pub mod maps;
pub mod protection;
pub mod range;
pub mod snapshot;
pub mod traits;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod linux;
#[cfg(windows)]
pub mod windows;

pub use access::MemoryAccess;
pub use chunker::{chunk_regions, RegionChunker, ScanChunk, DEFAULT_CHUNK_SIZE};
pub use error::MemoryError;
pub use range::{merge_adjacent, MemoryRange};
pub use snapshot::SnapshotReader;
pub use traits::MemoryReader;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use self::linux::ProcMemoryReader;
#[cfg(windows)]
pub use self::windows::{ProcessHandle, WindowsMemoryReader};

#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn open_process(pid: u32, include_shared: bool) -> Result<Box<dyn MemoryReader>, MemoryError> {
    Ok(Box::new(ProcMemoryReader::open(pid)?.include_shared(include_shared)))
}

#[cfg(windows)]
pub fn open_process(pid: u32, _include_shared: bool) -> Result<Box<dyn MemoryReader>, MemoryError> {
    Ok(Box::new(WindowsMemoryReader::open(pid)?))
}

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
pub fn open_process(pid: u32, _include_shared: bool) -> Result<Box<dyn MemoryReader>, MemoryError> {
    Err(MemoryError::Unsupported(format!(
        "reading process {} is not supported on this platform",
        pid
    )))
}
