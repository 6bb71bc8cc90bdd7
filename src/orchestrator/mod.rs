// Fri Oct 16 2026 - Alex

pub mod cancel;
pub mod error;
pub mod runner;
pub mod scanner;

pub use cancel::CancellationToken;
pub use error::ScanError;
pub use runner::{spawn_pattern_scan, spawn_scan, spawn_scan_with_token, ScanHandle};
pub use scanner::{AobScanner, ScanReport};
