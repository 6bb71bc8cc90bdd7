// Fri Oct 16 2026 - Alex

use crate::pattern::backends;
use crate::pattern::Pattern;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Scalar,
    Word,
    Sse2,
    Avx2,
}

impl Backend {
    pub fn detect() -> Self {
        detect_widest()
    }

    pub fn is_supported(self) -> bool {
        match self {
            Self::Scalar | Self::Word => true,
            #[cfg(target_arch = "x86_64")]
            Self::Sse2 => true,
            #[cfg(target_arch = "x86_64")]
            Self::Avx2 => is_x86_feature_detected!("avx2"),
            #[cfg(not(target_arch = "x86_64"))]
            Self::Sse2 | Self::Avx2 => false,
        }
    }

    pub fn all() -> [Backend; 4] {
        [Self::Scalar, Self::Word, Self::Sse2, Self::Avx2]
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Word => write!(f, "word"),
            Self::Sse2 => write!(f, "sse2"),
            Self::Avx2 => write!(f, "avx2"),
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn detect_widest() -> Backend {
    if is_x86_feature_detected!("avx2") {
        Backend::Avx2
    } else {
        Backend::Sse2
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_widest() -> Backend {
    Backend::Word
}

/// Tests byte windows against a pattern under its mask.
///
/// The backend only changes speed. Every backend gives the same answer as
/// [`is_match_scalar`].
#[derive(Debug, Clone, Copy)]
pub struct MaskedMatcher<'p> {
    pattern: &'p Pattern,
    backend: Backend,
}

impl<'p> MaskedMatcher<'p> {
    pub fn new(pattern: &'p Pattern) -> Self {
        Self {
            pattern,
            backend: Backend::detect(),
        }
    }

    /// Falls back to [`Backend::detect`] when `backend` is not available here.
    pub fn with_backend(pattern: &'p Pattern, backend: Backend) -> Self {
        let backend = if backend.is_supported() {
            backend
        } else {
            Backend::detect()
        };
        Self { pattern, backend }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn pattern(&self) -> &'p Pattern {
        self.pattern
    }

    /// Bytes past the pattern length are ignored. A window shorter than the
    /// pattern never matches.
    #[inline]
    pub fn is_match(&self, window: &[u8]) -> bool {
        let len = self.pattern.len();
        if window.len() < len {
            return false;
        }

        let data = &window[..len];
        let mask = self.pattern.mask();
        let bytes = self.pattern.bytes();

        match self.backend {
            Backend::Scalar => backends::scalar::matches(data, mask, bytes),
            Backend::Word => backends::word::matches(data, mask, bytes),
            #[cfg(target_arch = "x86_64")]
            Backend::Sse2 => backends::sse2::matches(data, mask, bytes),
            // SAFETY: `with_backend` and `detect` only hand out Avx2 after runtime detection.
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2 => unsafe { backends::avx2::matches(data, mask, bytes) },
            #[cfg(not(target_arch = "x86_64"))]
            Backend::Sse2 | Backend::Avx2 => backends::word::matches(data, mask, bytes),
        }
    }
}

pub fn is_match(pattern: &Pattern, window: &[u8]) -> bool {
    MaskedMatcher::new(pattern).is_match(window)
}

/// Byte-by-byte definition of a masked match.
pub fn is_match_scalar(pattern: &Pattern, window: &[u8]) -> bool {
    if window.len() < pattern.len() {
        return false;
    }
    backends::scalar::matches(&window[..pattern.len()], pattern.mask(), pattern.bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    // xorshift keeps the fixtures reproducible without pulling in an rng crate
    fn pseudo_random(seed: &mut u64) -> u8 {
        *seed ^= *seed << 13;
        *seed ^= *seed >> 7;
        *seed ^= *seed << 17;
        (*seed >> 24) as u8
    }

    fn pattern_text(bytes: &[u8], wildcard_every: usize) -> String {
        bytes
            .iter()
            .enumerate()
            .map(|(i, b)| {
                if wildcard_every != 0 && i % wildcard_every == wildcard_every - 1 {
                    "??".to_string()
                } else {
                    format!("{:02X}", b)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_window_never_matches() {
        let p = Pattern::compile("11 22 33").unwrap();
        for backend in Backend::all() {
            let m = MaskedMatcher::with_backend(&p, backend);
            assert!(!m.is_match(&[0x11, 0x22]));
            assert!(!m.is_match(&[]));
        }
    }

    #[test]
    fn test_wildcards_accept_anything() {
        let p = Pattern::compile("11 ?? 33").unwrap();
        for backend in Backend::all() {
            let m = MaskedMatcher::with_backend(&p, backend);
            for middle in 0..=255u8 {
                assert!(m.is_match(&[0x11, middle, 0x33]));
            }
            assert!(!m.is_match(&[0x11, 0x00, 0x34]));
        }
    }

    #[test]
    fn test_extra_window_bytes_ignored() {
        let p = Pattern::compile("DE AD").unwrap();
        assert!(is_match(&p, &[0xDE, 0xAD, 0x00, 0xFF]));
        assert!(!is_match(&p, &[0xDE, 0xAE, 0x00, 0xFF]));
    }

    #[test]
    fn test_backends_agree_with_scalar() {
        let mut seed = 0x9E37_79B9_7F4A_7C15u64;
        let lengths = [1, 2, 7, 8, 9, 15, 16, 17, 31, 32, 33, 47, 63, 64, 65, 100, 129];

        for &len in &lengths {
            for wildcard_every in [0usize, 2, 3, 5] {
                let raw: Vec<u8> = (0..len).map(|_| pseudo_random(&mut seed)).collect();
                let text = pattern_text(&raw, wildcard_every);
                let p = match Pattern::compile(&text) {
                    Ok(p) => p,
                    Err(_) => continue,
                };

                let mut windows = vec![raw.clone()];
                for flip in [0, len / 2, len - 1] {
                    let mut w = raw.clone();
                    w[flip] ^= 0x5A;
                    windows.push(w);
                }
                let mut noisy = raw.clone();
                for (i, b) in noisy.iter_mut().enumerate() {
                    if p.mask()[i] == 0 {
                        *b = pseudo_random(&mut seed);
                    }
                }
                windows.push(noisy);

                for window in &windows {
                    let expected = is_match_scalar(&p, window);
                    for backend in Backend::all() {
                        let m = MaskedMatcher::with_backend(&p, backend);
                        assert_eq!(
                            m.is_match(window),
                            expected,
                            "backend {} disagrees for len {} wildcard_every {}",
                            m.backend(),
                            len,
                            wildcard_every
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_mismatch_in_last_lane_detected() {
        let raw: Vec<u8> = (0..70u8).collect();
        let p = Pattern::from_bytes(&raw).unwrap();
        for backend in Backend::all() {
            let m = MaskedMatcher::with_backend(&p, backend);
            assert!(m.is_match(&raw));
            for i in [0usize, 31, 32, 63, 64, 69] {
                let mut w = raw.clone();
                w[i] = w[i].wrapping_add(1);
                assert!(!m.is_match(&w), "backend {} missed mismatch at {}", m.backend(), i);
            }
        }
    }

    #[test]
    fn test_unsupported_backend_falls_back() {
        let p = Pattern::compile("AA").unwrap();
        for backend in Backend::all() {
            let m = MaskedMatcher::with_backend(&p, backend);
            assert!(m.backend().is_supported());
        }
    }
}
