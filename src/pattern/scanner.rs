// Fri Oct 16 2026 - Alex

use crate::pattern::{MaskedMatcher, Pattern};
use memchr::memmem;

/// Finds every occurrence of a pattern inside one buffer.
///
/// The anchor is located with `memmem` and the full masked comparison runs
/// only at the candidate start each hit implies. One scanner is built per
/// scan and shared by reference between workers.
pub struct ChunkScanner<'p> {
    matcher: MaskedMatcher<'p>,
    anchor: memmem::Finder<'p>,
}

impl<'p> ChunkScanner<'p> {
    pub fn new(pattern: &'p Pattern) -> Self {
        Self::with_matcher(MaskedMatcher::new(pattern))
    }

    pub fn with_matcher(matcher: MaskedMatcher<'p>) -> Self {
        let pattern = matcher.pattern();
        Self {
            matcher,
            anchor: memmem::Finder::new(pattern.anchor()),
        }
    }

    pub fn pattern(&self) -> &'p Pattern {
        self.matcher.pattern()
    }

    /// Appends `base + offset` for every match in `buffer`, left to right.
    ///
    /// Only starts that leave room for the whole pattern inside `buffer` are
    /// reported, so the overlap a chunk shares with its successor never yields
    /// the same address twice.
    pub fn scan_into(&self, buffer: &[u8], base: usize, out: &mut Vec<usize>) {
        let pattern = self.matcher.pattern();
        let pattern_len = pattern.len();
        if buffer.len() < pattern_len {
            return;
        }

        let anchor_offset = pattern.anchor_offset();
        let anchor_len = pattern.anchor().len();
        let last_start = buffer.len() - pattern_len;
        // anchor hits past this point would imply a start beyond `last_start`
        let search_end = last_start + anchor_offset + anchor_len;

        let mut cursor = anchor_offset;
        while cursor + anchor_len <= search_end {
            let hit = match self.anchor.find(&buffer[cursor..search_end]) {
                Some(hit) => cursor + hit,
                None => break,
            };

            let start = hit - anchor_offset;
            if self.matcher.is_match(&buffer[start..]) {
                out.push(base + start);
            }

            cursor = hit + 1;
        }
    }

    pub fn scan(&self, buffer: &[u8], base: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.scan_into(buffer, base, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::is_match_scalar;

    fn brute_force(pattern: &Pattern, buffer: &[u8], base: usize) -> Vec<usize> {
        if buffer.len() < pattern.len() {
            return Vec::new();
        }
        (0..=buffer.len() - pattern.len())
            .filter(|&i| is_match_scalar(pattern, &buffer[i..]))
            .map(|i| base + i)
            .collect()
    }

    #[test]
    fn test_finds_all_in_order() {
        let p = Pattern::compile("DE AD").unwrap();
        let mut buffer = vec![0u8; 64];
        buffer[3] = 0xDE;
        buffer[4] = 0xAD;
        buffer[40] = 0xDE;
        buffer[41] = 0xAD;
        let scanner = ChunkScanner::new(&p);
        assert_eq!(scanner.scan(&buffer, 0x1000), vec![0x1003, 0x1028]);
    }

    #[test]
    fn test_leading_wildcards_not_reported_before_buffer() {
        let p = Pattern::compile("?? ?? AA").unwrap();
        let buffer = [0xAA, 0xAA, 0xAA, 0x00, 0xAA];
        let scanner = ChunkScanner::new(&p);
        assert_eq!(scanner.scan(&buffer, 0), vec![0, 2]);
    }

    #[test]
    fn test_trailing_wildcards_need_room() {
        let p = Pattern::compile("AA ?? ??").unwrap();
        let buffer = [0x00, 0xAA, 0x01, 0x02, 0xAA, 0x03];
        let scanner = ChunkScanner::new(&p);
        assert_eq!(scanner.scan(&buffer, 0), vec![1]);
    }

    #[test]
    fn test_overlapping_occurrences() {
        let p = Pattern::compile("AA AA").unwrap();
        let buffer = [0xAA; 5];
        let scanner = ChunkScanner::new(&p);
        assert_eq!(scanner.scan(&buffer, 0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_anchor_in_middle_of_pattern() {
        let p = Pattern::compile("11 ?? 22 33 44 ?? 55").unwrap();
        assert_eq!(p.anchor_offset(), 2);
        let mut buffer = vec![0u8; 32];
        buffer[10..17].copy_from_slice(&[0x11, 0x99, 0x22, 0x33, 0x44, 0x98, 0x55]);
        // anchor alone, with a wrong leading byte
        buffer[22..27].copy_from_slice(&[0x10, 0x00, 0x22, 0x33, 0x44]);
        let scanner = ChunkScanner::new(&p);
        assert_eq!(scanner.scan(&buffer, 0), vec![10]);
    }

    #[test]
    fn test_buffer_shorter_than_pattern() {
        let p = Pattern::compile("01 02 03").unwrap();
        let scanner = ChunkScanner::new(&p);
        assert!(scanner.scan(&[0x01, 0x02], 0).is_empty());
        assert!(scanner.scan(&[], 0).is_empty());
    }

    #[test]
    fn test_matches_brute_force() {
        let patterns = ["01", "01 ?? 01", "?? 01 01 ??", "02 01", "01 ?? ?? 02 ?? 01"];
        let buffer: Vec<u8> = (0..500u32).map(|i| ((i * 7 + i / 3) % 3) as u8).collect();
        for text in patterns {
            let p = Pattern::compile(text).unwrap();
            let scanner = ChunkScanner::new(&p);
            assert_eq!(scanner.scan(&buffer, 0x400), brute_force(&p, &buffer, 0x400), "{}", text);
        }
    }
}
