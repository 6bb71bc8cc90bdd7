// Fri Oct 16 2026 - Alex

use crate::pattern::PatternError;
use std::fmt;
use std::str::FromStr;

/// Mask value for a byte that must match.
pub const SIGNIFICANT: u8 = 0xFF;
/// Mask value for a wildcard byte.
pub const WILDCARD: u8 = 0x00;

/// A compiled array-of-bytes signature.
///
/// `bytes` and `mask` always have the same length. Wildcard positions hold
/// `0` in `bytes` and [`WILDCARD`] in `mask`, so `window[i] & mask[i] ==
/// bytes[i]` is the whole matching rule. The anchor is the longest run of
/// significant bytes and is what the chunk scanner searches for first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    bytes: Vec<u8>,
    mask: Vec<u8>,
    anchor_offset: usize,
    anchor_len: usize,
}

impl Pattern {
    /// Parses space-separated tokens: two hex digits, or `?`/`??` for a wildcard.
    pub fn compile(text: &str) -> Result<Self, PatternError> {
        let mut bytes = Vec::new();
        let mut mask = Vec::new();

        for (position, token) in text.split_whitespace().enumerate() {
            match token {
                "?" | "??" => {
                    bytes.push(0);
                    mask.push(WILDCARD);
                }
                _ => {
                    let byte = parse_hex_byte(token).ok_or_else(|| PatternError::InvalidToken {
                        token: token.to_string(),
                        position,
                    })?;
                    bytes.push(byte);
                    mask.push(SIGNIFICANT);
                }
            }
        }

        if bytes.is_empty() {
            return Err(PatternError::Empty);
        }

        let (anchor_offset, anchor_len) = longest_solid_run(&mask).ok_or(PatternError::MaskOnly)?;

        Ok(Self {
            bytes,
            mask,
            anchor_offset,
            anchor_len,
        })
    }

    /// Builds a pattern with every byte significant.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PatternError> {
        if bytes.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self {
            bytes: bytes.to_vec(),
            mask: vec![SIGNIFICANT; bytes.len()],
            anchor_offset: 0,
            anchor_len: bytes.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn anchor(&self) -> &[u8] {
        &self.bytes[self.anchor_offset..self.anchor_offset + self.anchor_len]
    }

    pub fn anchor_offset(&self) -> usize {
        self.anchor_offset
    }

    pub fn significant_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m == SIGNIFICANT).count()
    }

    pub fn wildcard_count(&self) -> usize {
        self.len() - self.significant_count()
    }

    pub fn is_solid(&self) -> bool {
        self.anchor_len == self.bytes.len()
    }

    pub fn to_hex_string(&self) -> String {
        self.bytes
            .iter()
            .zip(self.mask.iter())
            .map(|(b, &m)| {
                if m == SIGNIFICANT {
                    format!("{:02X}", b)
                } else {
                    "??".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Start and length of the first longest run of significant mask bytes.
fn longest_solid_run(mask: &[u8]) -> Option<(usize, usize)> {
    let mut best_start = 0;
    let mut best_len = 0;
    let mut current_start = 0;
    let mut current_len = 0;

    for (i, &m) in mask.iter().enumerate() {
        if m == SIGNIFICANT {
            if current_len == 0 {
                current_start = i;
            }
            current_len += 1;
            if current_len > best_len {
                best_start = current_start;
                best_len = current_len;
            }
        } else {
            current_len = 0;
        }
    }

    if best_len == 0 {
        None
    } else {
        Some((best_start, best_len))
    }
}

fn parse_hex_byte(token: &str) -> Option<u8> {
    let raw = token.as_bytes();
    if raw.len() != 2 {
        return None;
    }
    let hi = (raw[0] as char).to_digit(16)?;
    let lo = (raw[1] as char).to_digit(16)?;
    Some(((hi << 4) | lo) as u8)
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}
