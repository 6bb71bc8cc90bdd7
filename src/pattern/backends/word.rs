// Fri Oct 16 2026 - Alex

//! Portable kernel comparing one machine word at a time.

use super::scalar;

const WORD: usize = std::mem::size_of::<u64>();

pub fn matches(data: &[u8], mask: &[u8], bytes: &[u8]) -> bool {
    let words = data
        .chunks_exact(WORD)
        .zip(mask.chunks_exact(WORD))
        .zip(bytes.chunks_exact(WORD));

    for ((d, m), b) in words {
        if load(d) & load(m) != load(b) {
            return false;
        }
    }

    let tail = bytes.len() - bytes.len() % WORD;
    scalar::matches(&data[tail..], &mask[tail..], &bytes[tail..])
}

#[inline(always)]
fn load(chunk: &[u8]) -> u64 {
    let mut raw = [0u8; WORD];
    raw.copy_from_slice(chunk);
    u64::from_ne_bytes(raw)
}
