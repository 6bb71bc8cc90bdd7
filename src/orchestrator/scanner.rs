// Fri Oct 16 2026 - Alex

use crate::config::{ScanOptions, ScannerConfig};
use crate::memory::{MemoryError, MemoryReader, RegionChunker, ScanChunk};
use crate::orchestrator::{CancellationToken, ScanError};
use crate::pattern::{ChunkScanner, Pattern};
use log::{debug, trace};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Outcome of one completed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Match addresses. Ascending within each chunk.
    pub matches: Vec<usize>,
    pub regions: usize,
    pub chunks: usize,
    /// Chunks whose read failed or came back short. They contribute nothing.
    pub failed_chunks: usize,
    pub bytes_scanned: u64,
}

#[derive(Default)]
struct WorkerState {
    buffer: Vec<u8>,
    matches: Vec<usize>,
    failed_chunks: usize,
    skipped_chunks: usize,
    bytes_scanned: u64,
}

impl WorkerState {
    fn merge(mut self, other: WorkerState) -> WorkerState {
        self.matches.extend(other.matches);
        self.failed_chunks += other.failed_chunks;
        self.skipped_chunks += other.skipped_chunks;
        self.bytes_scanned += other.bytes_scanned;
        if self.buffer.capacity() < other.buffer.capacity() {
            self.buffer = other.buffer;
        }
        self
    }
}

/// Parallel array-of-bytes scanner over one target address space.
///
/// The reader and options are only read during a scan, so one scanner can
/// serve several scans at once.
pub struct AobScanner<R> {
    reader: R,
    config: ScannerConfig,
    pool: Option<rayon::ThreadPool>,
}

impl<R: MemoryReader> AobScanner<R> {
    /// Scanner on the global rayon pool with the default chunk size.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            config: ScannerConfig::default().with_max_threads(0),
            pool: None,
        }
    }

    pub fn with_config(reader: R, config: ScannerConfig) -> Result<Self, ScanError> {
        config.validate()?;

        let pool = if config.max_threads == 0 {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.max_threads)
                .thread_name(|i| format!("aob-scan-{}", i))
                .build()
                .map_err(|e| ScanError::ThreadPool(e.to_string()))?;
            Some(pool)
        };

        Ok(Self { reader, config, pool })
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn scan(&self, pattern: &str, options: &ScanOptions) -> Result<Vec<usize>, ScanError> {
        self.scan_with_cancel(pattern, options, &CancellationToken::new())
    }

    pub fn scan_with_cancel(
        &self,
        pattern: &str,
        options: &ScanOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<usize>, ScanError> {
        Ok(self.scan_report(pattern, options, cancel)?.matches)
    }

    pub fn scan_report(
        &self,
        pattern: &str,
        options: &ScanOptions,
        cancel: &CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        let pattern = Pattern::compile(pattern)?;
        self.scan_pattern(&pattern, options, cancel)
    }

    /// Scans for an already compiled pattern.
    ///
    /// Cancellation is checked before each chunk. If any chunk was skipped
    /// because of it the result is [`ScanError::Cancelled`], carrying the
    /// matches of every chunk that did complete.
    pub fn scan_pattern(
        &self,
        pattern: &Pattern,
        options: &ScanOptions,
        cancel: &CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        let started = Instant::now();
        let resolved = options.resolve()?;
        let chunker = RegionChunker::new(pattern.len(), self.config.chunk_size)?;

        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled { partial: Vec::new() });
        }

        let regions = self
            .reader
            .get_regions(resolved.min_address, resolved.max_address, resolved.access)?;
        let chunks = chunker.chunk(&regions);

        debug!(
            "Scanning for '{}' in [0x{:x}, 0x{:x}) {}: {} regions, {} chunks",
            pattern,
            resolved.min_address,
            resolved.max_address,
            resolved.access,
            regions.len(),
            chunks.len()
        );

        let scanner = ChunkScanner::new(pattern);
        let aborted = AtomicBool::new(false);
        let abort_reason: Mutex<Option<MemoryError>> = Mutex::new(None);

        let run = || {
            chunks
                .par_iter()
                .fold(WorkerState::default, |state, chunk| {
                    self.scan_chunk(state, chunk, &scanner, cancel, &aborted, &abort_reason)
                })
                .reduce(WorkerState::default, WorkerState::merge)
        };

        let state = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        if let Some(err) = abort_reason.into_inner() {
            debug!("Scan aborted after {:?}: {}", started.elapsed(), err);
            return Err(err.into());
        }

        debug!(
            "Scan finished in {:?}: {} matches, {} of {} chunks failed, {} skipped, {} bytes read",
            started.elapsed(),
            state.matches.len(),
            state.failed_chunks,
            chunks.len(),
            state.skipped_chunks,
            state.bytes_scanned
        );

        if state.skipped_chunks > 0 {
            return Err(ScanError::Cancelled {
                partial: state.matches,
            });
        }

        Ok(ScanReport {
            matches: state.matches,
            regions: regions.len(),
            chunks: chunks.len(),
            failed_chunks: state.failed_chunks,
            bytes_scanned: state.bytes_scanned,
        })
    }

    fn scan_chunk(
        &self,
        mut state: WorkerState,
        chunk: &ScanChunk,
        scanner: &ChunkScanner<'_>,
        cancel: &CancellationToken,
        aborted: &AtomicBool,
        abort_reason: &Mutex<Option<MemoryError>>,
    ) -> WorkerState {
        if cancel.is_cancelled() || aborted.load(Ordering::Relaxed) {
            state.skipped_chunks += 1;
            return state;
        }

        let size = chunk.size();
        if state.buffer.len() < size {
            state.buffer.resize(size, 0);
        }
        let buffer = &mut state.buffer[..size];

        match self.reader.read(chunk.base(), buffer) {
            Ok(read) if read == size => {
                scanner.scan_into(buffer, chunk.base(), &mut state.matches);
                state.bytes_scanned += size as u64;
            }
            Ok(read) => {
                trace!("Short read of chunk {}: {} of {} bytes", chunk, read, size);
                state.failed_chunks += 1;
            }
            Err(e) if e.is_process_unavailable() => {
                aborted.store(true, Ordering::Relaxed);
                abort_reason.lock().get_or_insert(e);
            }
            Err(e) => {
                trace!("Read of chunk {} failed: {}", chunk, e);
                state.failed_chunks += 1;
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryAccess, MemoryRange, SnapshotReader};
    use crate::pattern::PatternError;

    const BASE: usize = 0x10000;

    fn rw() -> MemoryAccess {
        MemoryAccess::read_write()
    }

    fn scanner(reader: SnapshotReader, threads: usize, chunk_size: usize) -> AobScanner<SnapshotReader> {
        let config = ScannerConfig::new().with_max_threads(threads).with_chunk_size(chunk_size);
        AobScanner::with_config(reader, config).unwrap()
    }

    /// Fails every read as if the target had exited.
    struct ExitedProcess;

    impl MemoryReader for ExitedProcess {
        fn get_regions(&self, _: usize, _: usize, _: MemoryAccess) -> Result<Vec<MemoryRange>, MemoryError> {
            Ok(vec![MemoryRange::new(0x1000, 0x4000)])
        }

        fn read(&self, _: usize, _: &mut [u8]) -> Result<usize, MemoryError> {
            Err(MemoryError::ProcessUnavailable { pid: 4242 })
        }
    }

    /// Cancels the scan from inside the first read.
    struct CancelOnRead {
        inner: SnapshotReader,
        token: CancellationToken,
    }

    impl MemoryReader for CancelOnRead {
        fn get_regions(&self, min: usize, max: usize, access: MemoryAccess) -> Result<Vec<MemoryRange>, MemoryError> {
            self.inner.get_regions(min, max, access)
        }

        fn read(&self, address: usize, buffer: &mut [u8]) -> Result<usize, MemoryError> {
            self.token.cancel();
            self.inner.read(address, buffer)
        }
    }

    #[test]
    fn test_two_matches_in_one_mib() {
        let mut data = vec![0u8; 1024 * 1024];
        data[100..102].copy_from_slice(&[0xDE, 0xAD]);
        data[300_000..300_002].copy_from_slice(&[0xDE, 0xAD]);
        let reader = SnapshotReader::new().with_region(BASE, data, rw());

        let matches = AobScanner::new(reader).scan("DE AD", &ScanOptions::new()).unwrap();
        assert_eq!(matches, vec![BASE + 100, BASE + 300_000]);
    }

    #[test]
    fn test_match_straddling_chunk_seam_reported_once() {
        let needle = [0x11, 0x22, 0x33, 0x44];
        for offset in 0..=252 {
            let mut data = vec![0u8; 256];
            data[offset..offset + 4].copy_from_slice(&needle);
            let reader = SnapshotReader::new().with_region(BASE, data, rw());

            let matches = scanner(reader, 2, 64).scan("11 22 33 44", &ScanOptions::new()).unwrap();
            assert_eq!(matches, vec![BASE + offset], "offset {}", offset);
        }
    }

    #[test]
    fn test_parallel_matches_brute_force() {
        let data: Vec<u8> = (0..256 * 1024u32).map(|i| (i.wrapping_mul(2654435761) >> 29) as u8).collect();
        let pattern = Pattern::compile("03 ?? 05").unwrap();
        let expected: Vec<usize> = (0..=data.len() - 3)
            .filter(|&i| data[i] == 0x03 && data[i + 2] == 0x05)
            .map(|i| BASE + i)
            .collect();
        assert!(!expected.is_empty());

        let reader = SnapshotReader::new().with_region(BASE, data, rw());
        let scanner = scanner(reader, 4, 4096);
        let report = scanner
            .scan_pattern(&pattern, &ScanOptions::new(), &CancellationToken::new())
            .unwrap();

        let mut matches = report.matches.clone();
        matches.sort_unstable();
        matches.dedup();
        assert_eq!(matches.len(), report.matches.len(), "duplicate addresses");
        assert_eq!(matches, expected);
        assert_eq!(report.regions, 1);
        assert_eq!(report.failed_chunks, 0);
    }

    #[test]
    fn test_no_regions_is_empty_success() {
        let reader = SnapshotReader::new();
        assert!(AobScanner::new(reader).scan("AA BB", &ScanOptions::new()).unwrap().is_empty());

        let reader = SnapshotReader::new().with_region(BASE, vec![0xAA; 64], MemoryAccess::READABLE);
        let options = ScanOptions::new().with_access(rw());
        assert!(AobScanner::new(reader).scan("AA", &options).unwrap().is_empty());
    }

    #[test]
    fn test_bounds_and_access_filter() {
        let mut data = vec![0u8; 0x1000];
        data[0x10] = 0x90;
        data[0x800] = 0x90;
        let reader = SnapshotReader::new()
            .with_region(BASE, data, rw())
            .with_region(0x40000, vec![0x90; 4], MemoryAccess::READABLE | MemoryAccess::EXECUTABLE);
        let scanner = AobScanner::new(reader);

        let options = ScanOptions::new().with_min_address(BASE + 0x100).with_max_address(BASE + 0x1000);
        assert_eq!(scanner.scan("90", &options).unwrap(), vec![BASE + 0x800]);

        let options = ScanOptions::new().with_access(MemoryAccess::EXECUTABLE);
        assert_eq!(scanner.scan("90 90", &options).unwrap(), vec![0x40000, 0x40001, 0x40002]);
    }

    #[test]
    fn test_unreadable_chunk_skipped() {
        let mut data = vec![0u8; 4096];
        data[8..10].copy_from_slice(&[0xCA, 0xFE]);
        let reader = SnapshotReader::new()
            .with_region(BASE, data, rw())
            .with_unreadable(0x80000, 4096, rw());

        let report = AobScanner::new(reader)
            .scan_report("CA FE", &ScanOptions::new(), &CancellationToken::new())
            .unwrap();
        assert_eq!(report.matches, vec![BASE + 8]);
        assert_eq!(report.chunks, 2);
        assert_eq!(report.failed_chunks, 1);
        assert_eq!(report.bytes_scanned, 4096);
    }

    #[test]
    fn test_cancel_before_start() {
        let reader = SnapshotReader::new().with_region(BASE, vec![0xAA; 4096], rw());
        let token = CancellationToken::new();
        token.cancel();

        let err = AobScanner::new(reader)
            .scan_with_cancel("AA", &ScanOptions::new(), &token)
            .unwrap_err();
        assert_eq!(err.partial_matches(), Some(&[][..]));
    }

    #[test]
    fn test_cancel_mid_scan_keeps_finished_chunks() {
        let mut data = vec![0u8; 64 * 1024];
        data[5] = 0xEE;
        data[40_000] = 0xEE;
        let token = CancellationToken::new();
        let reader = CancelOnRead {
            inner: SnapshotReader::new().with_region(BASE, data, rw()),
            token: token.clone(),
        };
        let config = ScannerConfig::new().with_max_threads(1).with_chunk_size(1024);
        let scanner = AobScanner::with_config(reader, config).unwrap();

        let err = scanner.scan_with_cancel("EE", &ScanOptions::new(), &token).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.partial_matches(), Some(&[BASE + 5][..]));
    }

    #[test]
    fn test_process_exit_aborts_scan() {
        let scanner = AobScanner::new(ExitedProcess);
        assert!(matches!(
            scanner.scan("01 02", &ScanOptions::new()),
            Err(ScanError::ProcessUnavailable { pid: 4242 })
        ));
    }

    #[test]
    fn test_input_errors() {
        let scanner = scanner(SnapshotReader::new(), 1, 4);
        assert!(matches!(
            scanner.scan("?? ??", &ScanOptions::new()),
            Err(ScanError::InvalidPattern(PatternError::MaskOnly))
        ));
        assert!(matches!(
            scanner.scan("", &ScanOptions::new()),
            Err(ScanError::InvalidPattern(PatternError::Empty))
        ));
        assert!(matches!(
            scanner.scan("01 02 03 04", &ScanOptions::new()),
            Err(ScanError::PatternTooLarge { length: 4, chunk_size: 4 })
        ));
        assert!(matches!(
            scanner.scan("01", &ScanOptions::new().with_min_address(10).with_max_address(5)),
            Err(ScanError::InvalidAddressRange { min: 10, max: 5 })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScannerConfig::new().with_chunk_size(1);
        assert!(matches!(
            AobScanner::with_config(SnapshotReader::new(), config),
            Err(ScanError::Config(_))
        ));
    }
}
