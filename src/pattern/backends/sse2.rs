// Fri Oct 16 2026 - Alex

//! SSE2 kernel. SSE2 is part of the x86_64 baseline, so no runtime check is needed.

use super::word;
use std::arch::x86_64::{__m128i, _mm_and_si128, _mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8};

const LANES: usize = 16;
const ALL_EQUAL: i32 = 0xFFFF;

pub fn matches(data: &[u8], mask: &[u8], bytes: &[u8]) -> bool {
    let len = bytes.len();
    let mut i = 0;

    while i + LANES <= len {
        // SAFETY: all three slices hold `len` bytes and `i + LANES <= len`;
        // the loads are unaligned.
        let equal = unsafe {
            let d = _mm_loadu_si128(data.as_ptr().add(i) as *const __m128i);
            let m = _mm_loadu_si128(mask.as_ptr().add(i) as *const __m128i);
            let b = _mm_loadu_si128(bytes.as_ptr().add(i) as *const __m128i);
            _mm_movemask_epi8(_mm_cmpeq_epi8(_mm_and_si128(d, m), b))
        };

        if equal != ALL_EQUAL {
            return false;
        }
        i += LANES;
    }

    word::matches(&data[i..], &mask[i..], &bytes[i..])
}
