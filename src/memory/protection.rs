// Fri Oct 16 2026 - Alex

//! Protection decoding for both region sources.
//!
//! Kept free of OS bindings so the qualification rules can be tested on any
//! host.

use crate::memory::MemoryAccess;
use std::fmt;

pub const MEM_COMMIT: u32 = 0x1000;
pub const MEM_RESERVE: u32 = 0x2000;
pub const MEM_FREE: u32 = 0x10000;

pub const PAGE_NOACCESS: u32 = 0x01;
pub const PAGE_READONLY: u32 = 0x02;
pub const PAGE_READWRITE: u32 = 0x04;
pub const PAGE_WRITECOPY: u32 = 0x08;
pub const PAGE_EXECUTE: u32 = 0x10;
pub const PAGE_EXECUTE_READ: u32 = 0x20;
pub const PAGE_EXECUTE_READWRITE: u32 = 0x40;
pub const PAGE_EXECUTE_WRITECOPY: u32 = 0x80;
pub const PAGE_GUARD: u32 = 0x100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageProtection(u32);

impl PageProtection {
    pub fn from_flags(flags: u32) -> Self {
        Self(flags)
    }

    fn any(self, flags: u32) -> bool {
        self.0 & flags != 0
    }

    pub fn can_read(self) -> bool {
        self.any(
            PAGE_READONLY
                | PAGE_READWRITE
                | PAGE_WRITECOPY
                | PAGE_EXECUTE_READ
                | PAGE_EXECUTE_READWRITE
                | PAGE_EXECUTE_WRITECOPY,
        )
    }

    pub fn can_write(self) -> bool {
        self.any(PAGE_READWRITE | PAGE_WRITECOPY | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY)
    }

    pub fn can_execute(self) -> bool {
        self.any(PAGE_EXECUTE | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY)
    }

    pub fn is_guard(self) -> bool {
        self.any(PAGE_GUARD)
    }

    pub fn is_no_access(self) -> bool {
        self.any(PAGE_NOACCESS)
    }
}

impl fmt::Display for PageProtection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.can_read() { 'r' } else { '-' };
        let w = if self.can_write() { 'w' } else { '-' };
        let x = if self.can_execute() { 'x' } else { '-' };
        write!(f, "{}{}{}", r, w, x)?;
        if self.is_guard() {
            write!(f, " guard")?;
        }
        Ok(())
    }
}

/// Committed, neither guard nor no-access, and every requested flag granted.
pub fn region_qualifies(state: u32, protection: PageProtection, access: MemoryAccess) -> bool {
    if state != MEM_COMMIT || protection.is_guard() || protection.is_no_access() {
        return false;
    }
    access.admits(protection.can_read(), protection.can_write(), protection.can_execute())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapsPermissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    pub shared: bool,
}

impl MapsPermissions {
    pub fn parse(field: &[u8]) -> Option<Self> {
        if field.len() < 4 {
            return None;
        }
        let shared = match field[3] {
            b's' => true,
            b'p' => false,
            _ => return None,
        };
        Some(Self {
            read: field[0] == b'r',
            write: field[1] == b'w',
            execute: field[2] == b'x',
            shared,
        })
    }

    pub fn admits(self, access: MemoryAccess, include_shared: bool) -> bool {
        if self.shared && !include_shared {
            return false;
        }
        access.admits(self.read, self.write, self.execute)
    }
}

impl fmt::Display for MapsPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
            if self.shared { 's' } else { 'p' }
        )
    }
}
