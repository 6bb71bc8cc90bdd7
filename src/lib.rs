// Fri Oct 16 2026 - Alex

pub mod config;
pub mod memory;
pub mod orchestrator;
pub mod pattern;
pub mod utils;

pub use config::{ResolvedScanOptions, ScanOptions, ScannerConfig};
pub use memory::{MemoryAccess, MemoryError, MemoryRange, MemoryReader, SnapshotReader};
pub use orchestrator::{spawn_pattern_scan, spawn_scan, AobScanner, CancellationToken, ScanError, ScanHandle, ScanReport};
pub use pattern::{Pattern, PatternError};
