// Fri Oct 16 2026 - Alex

//! AVX2 kernel, 32 bytes per step.

use super::sse2;
use std::arch::x86_64::{
    __m256i, _mm256_and_si256, _mm256_cmpeq_epi8, _mm256_loadu_si256, _mm256_movemask_epi8,
};

const LANES: usize = 32;

/// # Safety
///
/// The running CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn matches(data: &[u8], mask: &[u8], bytes: &[u8]) -> bool {
    let len = bytes.len();
    let mut i = 0;

    while i + LANES <= len {
        // SAFETY: all three slices hold `len` bytes and `i + LANES <= len`;
        // the loads are unaligned.
        let equal = unsafe {
            let d = _mm256_loadu_si256(data.as_ptr().add(i) as *const __m256i);
            let m = _mm256_loadu_si256(mask.as_ptr().add(i) as *const __m256i);
            let b = _mm256_loadu_si256(bytes.as_ptr().add(i) as *const __m256i);
            _mm256_movemask_epi8(_mm256_cmpeq_epi8(_mm256_and_si256(d, m), b))
        };

        if equal as u32 != u32::MAX {
            return false;
        }
        i += LANES;
    }

    sse2::matches(&data[i..], &mask[i..], &bytes[i..])
}
