// Fri Oct 16 2026 - Alex

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Access a region must grant to be scanned.
    ///
    /// Every requested flag must be present. An empty filter accepts nothing;
    /// callers normalize it before it reaches a reader.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MemoryAccess: u32 {
        const READABLE = 1;
        const WRITABLE = 2;
        const EXECUTABLE = 4;
    }
}

impl MemoryAccess {
    pub fn read_write() -> Self {
        Self::READABLE | Self::WRITABLE
    }

    pub fn admits(self, readable: bool, writable: bool, executable: bool) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.contains(Self::READABLE) && !readable {
            return false;
        }
        if self.contains(Self::WRITABLE) && !writable {
            return false;
        }
        if self.contains(Self::EXECUTABLE) && !executable {
            return false;
        }
        true
    }
}

impl Default for MemoryAccess {
    fn default() -> Self {
        Self::read_write()
    }
}

impl fmt::Display for MemoryAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.contains(Self::READABLE) { 'r' } else { '-' };
        let w = if self.contains(Self::WRITABLE) { 'w' } else { '-' };
        let x = if self.contains(Self::EXECUTABLE) { 'x' } else { '-' };
        write!(f, "{}{}{}", r, w, x)
    }
}

impl FromStr for MemoryAccess {
    type Err = String;

    /// Accepts any combination of `r`, `w`, `x` and `-`, e.g. `rw`, `r-x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut access = Self::empty();
        for c in s.chars() {
            match c.to_ascii_lowercase() {
                'r' => access |= Self::READABLE,
                'w' => access |= Self::WRITABLE,
                'x' => access |= Self::EXECUTABLE,
                '-' => {}
                other => return Err(format!("Invalid access flag '{}' in '{}'", other, s)),
            }
        }
        Ok(access)
    }
}
