// Fri Oct 16 2026 - Alex

//! Streaming parser for the textual process memory map (`/proc/<pid>/maps`).
//!
//! Lines look like `7f3c1a000000-7f3c1a021000 rw-p 00000000 00:00 0  [heap]`.
//! Only the address bounds and the four permission characters are used.

use crate::memory::protection::MapsPermissions;
use crate::memory::range::merge_adjacent;
use crate::memory::{MemoryAccess, MemoryRange};
use memchr::memchr;
use std::io::{self, Read};

pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapsEntry {
    pub range: MemoryRange,
    pub permissions: MapsPermissions,
}

pub fn parse_line(line: &[u8]) -> Option<MapsEntry> {
    let dash = memchr(b'-', line)?;
    let space = dash + 1 + memchr(b' ', &line[dash + 1..])?;

    let start = parse_hex(&line[..dash])?;
    let end = parse_hex(&line[dash + 1..space])?;
    let permissions = MapsPermissions::parse(&line[space + 1..])?;

    Some(MapsEntry {
        range: MemoryRange::from_bounds(start, end)?,
        permissions,
    })
}

fn parse_hex(field: &[u8]) -> Option<usize> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    usize::from_str_radix(std::str::from_utf8(field).ok()?, 16).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionFilter {
    pub min_address: usize,
    pub max_address: usize,
    pub access: MemoryAccess,
    pub include_shared: bool,
}

impl RegionFilter {
    pub fn new(min_address: usize, max_address: usize, access: MemoryAccess) -> Self {
        Self {
            min_address,
            max_address,
            access,
            include_shared: false,
        }
    }

    pub fn include_shared(mut self, include: bool) -> Self {
        self.include_shared = include;
        self
    }

    pub fn apply(&self, entry: &MapsEntry) -> Option<MemoryRange> {
        if !entry.permissions.admits(self.access, self.include_shared) {
            return None;
        }
        entry.range.clip(self.min_address, self.max_address)
    }
}

/// Splits a byte stream into lines while refilling a fixed buffer.
///
/// A line cut in half by a refill is carried over to the front of the
/// buffer. A single line longer than the buffer grows it.
pub struct MapsLines<R> {
    source: R,
    buffer: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
}

impl<R: Read> MapsLines<R> {
    pub fn new(source: R) -> Self {
        Self::with_buffer_size(source, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(source: R, size: usize) -> Self {
        Self {
            source,
            buffer: vec![0u8; size.max(1)],
            start: 0,
            end: 0,
            eof: false,
        }
    }

    /// Next line without its newline. The final line may lack a newline.
    pub fn next_line(&mut self) -> io::Result<Option<&[u8]>> {
        Ok(self.next_line_bounds()?.map(|(start, end)| &self.buffer[start..end]))
    }

    fn next_line_bounds(&mut self) -> io::Result<Option<(usize, usize)>> {
        loop {
            if let Some(pos) = memchr(b'\n', &self.buffer[self.start..self.end]) {
                let line = (self.start, self.start + pos);
                self.start += pos + 1;
                return Ok(Some(line));
            }

            if self.eof {
                if self.start < self.end {
                    let line = (self.start, self.end);
                    self.start = self.end;
                    return Ok(Some(line));
                }
                return Ok(None);
            }

            self.refill()?;
        }
    }

    fn refill(&mut self) -> io::Result<()> {
        if self.start > 0 {
            self.buffer.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }

        if self.end == self.buffer.len() {
            let grown = self.buffer.len() * 2;
            self.buffer.resize(grown, 0);
        }

        let read = loop {
            match self.source.read(&mut self.buffer[self.end..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if read == 0 {
            self.eof = true;
        } else {
            self.end += read;
        }
        Ok(())
    }
}

pub fn collect_regions<R: Read>(lines: &mut MapsLines<R>, filter: &RegionFilter) -> io::Result<Vec<MemoryRange>> {
    let mut regions = Vec::with_capacity(512);
    while let Some(line) = lines.next_line()? {
        if let Some(range) = parse_line(line).and_then(|entry| filter.apply(&entry)) {
            regions.push(range);
        }
    }
    Ok(merge_adjacent(regions))
}

pub fn parse_regions<R: Read>(source: R, filter: &RegionFilter) -> io::Result<Vec<MemoryRange>> {
    collect_regions(&mut MapsLines::new(source), filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
55d0c4a00000-55d0c4a02000 r--p 00000000 08:01 1234   /usr/bin/cat
55d0c4a02000-55d0c4a07000 r-xp 00002000 08:01 1234   /usr/bin/cat
55d0c4a07000-55d0c4a0a000 r--p 00007000 08:01 1234   /usr/bin/cat
55d0c4a0a000-55d0c4a0b000 rw-p 00009000 08:01 1234   /usr/bin/cat
55d0c4a0b000-55d0c4a0c000 rw-p 00000000 00:00 0
55d0c5f1d000-55d0c5f3e000 rw-p 00000000 00:00 0      [heap]
7f1b2c000000-7f1b2c021000 rw-s 00000000 00:05 77     /dev/shm/x
7ffd4a1c7000-7ffd4a1e8000 rw-p 00000000 00:00 0      [stack]
ffffffffff600000-ffffffffff601000 --xp 00000000 00:00 0  [vsyscall]";

    /// Hands out at most `step` bytes per read call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn rw() -> RegionFilter {
        RegionFilter::new(0, usize::MAX, MemoryAccess::read_write())
    }

    fn expected_rw() -> Vec<MemoryRange> {
        vec![
            MemoryRange::from_bounds(0x55d0c4a0a000, 0x55d0c4a0c000).unwrap(),
            MemoryRange::from_bounds(0x55d0c5f1d000, 0x55d0c5f3e000).unwrap(),
            MemoryRange::from_bounds(0x7ffd4a1c7000, 0x7ffd4a1e8000).unwrap(),
        ]
    }

    #[test]
    fn test_parse_line() {
        let entry = parse_line(b"7ffd4a1c7000-7ffd4a1e8000 rw-p 00000000 00:00 0 [stack]").unwrap();
        assert_eq!(entry.range.base(), 0x7ffd4a1c7000);
        assert_eq!(entry.range.size(), 0x21000);
        assert!(entry.permissions.read && entry.permissions.write && !entry.permissions.shared);
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(parse_line(b"").is_none());
        assert!(parse_line(b"hello world").is_none());
        assert!(parse_line(b"1000-2000").is_none());
        assert!(parse_line(b"1000-2000 rw").is_none());
        assert!(parse_line(b"zz00-2000 rw-p").is_none());
        assert!(parse_line(b"2000-1000 rw-p").is_none());
    }

    #[test]
    fn test_collect_rw_private_regions() {
        let regions = parse_regions(SAMPLE.as_bytes(), &rw()).unwrap();
        assert_eq!(regions, expected_rw());
    }

    #[test]
    fn test_shared_mappings_opt_in() {
        let regions = parse_regions(SAMPLE.as_bytes(), &rw().include_shared(true)).unwrap();
        assert!(regions.contains(&MemoryRange::from_bounds(0x7f1b2c000000, 0x7f1b2c021000).unwrap()));
        assert_eq!(regions.len(), 4);
    }

    #[test]
    fn test_executable_filter() {
        let filter = RegionFilter::new(0, usize::MAX, MemoryAccess::READABLE | MemoryAccess::EXECUTABLE);
        let regions = parse_regions(SAMPLE.as_bytes(), &filter).unwrap();
        assert_eq!(regions, vec![MemoryRange::from_bounds(0x55d0c4a02000, 0x55d0c4a07000).unwrap()]);
    }

    #[test]
    fn test_lines_split_across_reads() {
        for step in [1, 3, 7, 64] {
            for buffer_size in [1, 8, 40, 4096] {
                let source = Trickle { data: SAMPLE.as_bytes(), step };
                let mut lines = MapsLines::with_buffer_size(source, buffer_size);
                let regions = collect_regions(&mut lines, &rw()).unwrap();
                assert_eq!(regions, expected_rw(), "step {} buffer {}", step, buffer_size);
            }
        }
    }

    #[test]
    fn test_line_iteration_keeps_last_unterminated_line() {
        let mut lines = MapsLines::with_buffer_size(Trickle { data: b"a\nbb\n\nccc", step: 2 }, 3);
        let mut seen = Vec::new();
        while let Some(line) = lines.next_line().unwrap() {
            seen.push(line.to_vec());
        }
        assert_eq!(seen, vec![b"a".to_vec(), b"bb".to_vec(), b"".to_vec(), b"ccc".to_vec()]);
    }

    #[test]
    fn test_clipping_to_bounds() {
        let filter = RegionFilter::new(0x55d0c4a0b800, 0x55d0c5f1e000, MemoryAccess::read_write());
        let regions = parse_regions(SAMPLE.as_bytes(), &filter).unwrap();
        assert_eq!(
            regions,
            vec![
                MemoryRange::from_bounds(0x55d0c4a0b800, 0x55d0c4a0c000).unwrap(),
                MemoryRange::from_bounds(0x55d0c5f1d000, 0x55d0c5f1e000).unwrap(),
            ]
        );
    }
}
