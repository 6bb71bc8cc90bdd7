// Fri Oct 16 2026 - Alex

//! Masked comparison kernels.
//!
//! Every kernel takes three slices of equal length and answers whether
//! `data[i] & mask[i] == bytes[i]` holds for every `i`. Wider kernels handle
//! whole lanes and pass the tail to the next narrower one, ending at the
//! scalar loop.

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx2;
pub(crate) mod scalar;
#[cfg(target_arch = "x86_64")]
pub(crate) mod sse2;
pub(crate) mod word;
