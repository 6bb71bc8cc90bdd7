// Fri Oct 16 2026 - Alex

use crate::memory::maps::{collect_regions, MapsLines, RegionFilter};
use crate::memory::{MemoryAccess, MemoryError, MemoryRange, MemoryReader};
use log::debug;
use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Reads another process through procfs and `process_vm_readv`.
///
/// Regions come from `/proc/<pid>/maps`. Only private mappings qualify unless
/// [`include_shared`](Self::include_shared) is set.
#[derive(Debug, Clone)]
pub struct ProcMemoryReader {
    pid: u32,
    include_shared: bool,
    // set once process_vm_readv has been denied
    proc_mem: Arc<OnceLock<File>>,
}

impl ProcMemoryReader {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            include_shared: false,
            proc_mem: Arc::new(OnceLock::new()),
        }
    }

    /// Like [`new`](Self::new), but fails when the process does not exist or
    /// has already exited.
    pub fn open(pid: u32) -> Result<Self, MemoryError> {
        let reader = Self::new(pid);
        if !reader.is_alive()? {
            return Err(MemoryError::ProcessUnavailable { pid });
        }
        Ok(reader)
    }

    pub fn current() -> Self {
        Self::new(std::process::id())
    }

    pub fn include_shared(mut self, include: bool) -> Self {
        self.include_shared = include;
        self
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// False for zombie and dead processes, whose procfs entry outlives them.
    pub fn is_alive(&self) -> Result<bool, MemoryError> {
        let stat = std::fs::read_to_string(self.proc_path("stat")).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MemoryError::ProcessUnavailable { pid: self.pid },
            _ => MemoryError::Io(e),
        })?;
        Ok(!matches!(process_state(&stat), Some('Z') | Some('X') | Some('x') | None))
    }

    fn proc_path(&self, file: &str) -> PathBuf {
        Path::new("/proc").join(self.pid.to_string()).join(file)
    }

    fn open_proc_file(&self, file: &str) -> Result<File, MemoryError> {
        File::open(self.proc_path(file)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MemoryError::ProcessUnavailable { pid: self.pid },
            _ => MemoryError::Io(e),
        })
    }

    fn read_vm(&self, address: usize, buffer: &mut [u8]) -> io::Result<usize> {
        let local = libc::iovec {
            iov_base: buffer.as_mut_ptr() as *mut libc::c_void,
            iov_len: buffer.len(),
        };
        let remote = libc::iovec {
            iov_base: address as *mut libc::c_void,
            iov_len: buffer.len(),
        };

        // SAFETY: `local` describes exactly `buffer`, which outlives the call. The
        // remote iovec is only read from by the kernel on the target's side.
        let read = unsafe { libc::process_vm_readv(self.pid as libc::pid_t, &local, 1, &remote, 1, 0) };
        if read < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(read as usize)
        }
    }

    fn read_proc_mem(&self, file: &File, address: usize, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        file.read_at(buffer, address as u64)
            .map_err(|e| self.classify(e, address, buffer.len()))
    }

    fn proc_mem_file(&self) -> Result<&File, MemoryError> {
        if let Some(file) = self.proc_mem.get() {
            return Ok(file);
        }
        let file = self.open_proc_file("mem")?;
        debug!("process_vm_readv denied for pid {}, reading through /proc/{}/mem", self.pid, self.pid);
        Ok(self.proc_mem.get_or_init(|| file))
    }

    fn classify(&self, err: io::Error, address: usize, size: usize) -> MemoryError {
        match err.raw_os_error() {
            Some(libc::ESRCH) => MemoryError::ProcessUnavailable { pid: self.pid },
            _ => MemoryError::ReadFailed { address, size },
        }
    }
}

impl MemoryReader for ProcMemoryReader {
    fn get_regions(
        &self,
        min_address: usize,
        max_address: usize,
        access: MemoryAccess,
    ) -> Result<Vec<MemoryRange>, MemoryError> {
        let file = self.open_proc_file("maps")?;
        let filter = RegionFilter::new(min_address, max_address, access).include_shared(self.include_shared);
        let regions = collect_regions(&mut MapsLines::new(file), &filter)?;

        // an exited but unreaped process still has a maps file, just an empty one
        if regions.is_empty() && !self.is_alive()? {
            return Err(MemoryError::ProcessUnavailable { pid: self.pid });
        }
        Ok(regions)
    }

    fn read(&self, address: usize, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        if buffer.is_empty() {
            return Ok(0);
        }

        if let Some(file) = self.proc_mem.get() {
            return self.read_proc_mem(file, address, buffer);
        }

        match self.read_vm(address, buffer) {
            Ok(read) => Ok(read),
            // seccomp profiles commonly deny the syscall while procfs stays readable
            Err(e) if matches!(e.raw_os_error(), Some(libc::ENOSYS) | Some(libc::EPERM)) => {
                let file = self.proc_mem_file()?;
                self.read_proc_mem(file, address, buffer)
            }
            Err(e) => Err(self.classify(e, address, buffer.len())),
        }
    }
}

/// State letter of a `/proc/<pid>/stat` line. The command name may itself
/// contain spaces and parentheses, so the state is read after the last `)`.
fn process_state(stat: &str) -> Option<char> {
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.trim_start().chars().next()
}
