// Fri Oct 16 2026 - Alex

use crate::config::ScanOptions;
use crate::memory::MemoryReader;
use crate::orchestrator::{AobScanner, CancellationToken, ScanError, ScanReport};
use crate::pattern::Pattern;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

/// Starts a scan on a background thread.
pub fn spawn_scan<R>(scanner: AobScanner<R>, pattern: &str, options: ScanOptions) -> ScanHandle
where
    R: MemoryReader + 'static,
{
    spawn_scan_with_token(scanner, pattern, options, CancellationToken::new())
}

/// Like [`spawn_scan`], observing an existing token.
pub fn spawn_scan_with_token<R>(
    scanner: AobScanner<R>,
    pattern: &str,
    options: ScanOptions,
    cancel: CancellationToken,
) -> ScanHandle
where
    R: MemoryReader + 'static,
{
    match Pattern::compile(pattern) {
        Ok(pattern) => spawn_pattern_scan(scanner, pattern, options, cancel),
        Err(e) => ScanHandle::finished(Err(e.into()), cancel),
    }
}

/// Starts a scan for an already compiled pattern.
pub fn spawn_pattern_scan<R>(
    scanner: AobScanner<R>,
    pattern: Pattern,
    options: ScanOptions,
    cancel: CancellationToken,
) -> ScanHandle
where
    R: MemoryReader + 'static,
{
    let token = cancel.clone();
    let (tx, rx) = mpsc::channel();

    let thread = thread::Builder::new()
        .name("aob-scan-driver".to_string())
        .spawn(move || {
            let result = scanner.scan_pattern(&pattern, &options, &token);
            let _ = tx.send(result);
        });

    match thread {
        Ok(handle) => ScanHandle {
            thread: Some(handle),
            receiver: rx,
            cancel,
        },
        Err(e) => ScanHandle::finished(Err(ScanError::ThreadPool(e.to_string())), cancel),
    }
}

/// A scan running in the background. The result is handed out once.
pub struct ScanHandle {
    thread: Option<thread::JoinHandle<()>>,
    receiver: Receiver<Result<ScanReport, ScanError>>,
    cancel: CancellationToken,
}

impl ScanHandle {
    fn finished(result: Result<ScanReport, ScanError>, cancel: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(result);
        Self {
            thread: None,
            receiver: rx,
            cancel,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// The result if the scan is done, without blocking.
    pub fn try_result(&mut self) -> Option<Result<ScanReport, ScanError>> {
        let result = self.receiver.try_recv().ok()?;
        self.join();
        Some(result)
    }

    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<Result<ScanReport, ScanError>> {
        let result = self.receiver.recv_timeout(timeout).ok()?;
        self.join();
        Some(result)
    }

    pub fn wait(mut self) -> Result<ScanReport, ScanError> {
        self.join();
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(ScanError::ThreadPool("scan thread exited without a result".to_string())))
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.cancel.cancel();
            self.join();
        }
    }
}
