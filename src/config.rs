// Fri Oct 16 2026 - Alex

use crate::memory::{MemoryAccess, DEFAULT_CHUNK_SIZE};
use crate::orchestrator::ScanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Caller-facing scan filter. Unset fields fall back to defaults in
/// [`ScanOptions::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    pub min_address: Option<usize>,
    pub max_address: Option<usize>,
    pub access: Option<MemoryAccess>,
}

/// [`ScanOptions`] with every default applied. `max_address` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedScanOptions {
    pub min_address: usize,
    pub max_address: usize,
    pub access: MemoryAccess,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_address(mut self, address: usize) -> Self {
        self.min_address = Some(address);
        self
    }

    pub fn with_max_address(mut self, address: usize) -> Self {
        self.max_address = Some(address);
        self
    }

    pub fn with_access(mut self, access: MemoryAccess) -> Self {
        self.access = Some(access);
        self
    }

    pub fn resolve(&self) -> Result<ResolvedScanOptions, ScanError> {
        let min_address = self.min_address.unwrap_or(0);
        let max_address = self.max_address.unwrap_or(usize::MAX);
        if min_address >= max_address {
            return Err(ScanError::InvalidAddressRange {
                min: min_address,
                max: max_address,
            });
        }

        let access = match self.access {
            Some(access) if !access.is_empty() => access,
            _ => MemoryAccess::read_write(),
        };

        Ok(ResolvedScanOptions {
            min_address,
            max_address,
            access,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Worker threads. `0` runs on the global rayon pool.
    pub max_threads: usize,
    pub chunk_size: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_threads: num_cpus::get(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ScannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.chunk_size < 2 {
            return Err(ScanError::Config(format!(
                "chunk_size must be at least 2, got {}",
                self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ScanError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScanError> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self).map_err(|e| ScanError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ScanError::Config(e.to_string()))?;
            }
        }

        fs::write(path, contents).map_err(|e| ScanError::Config(e.to_string()))
    }
}
