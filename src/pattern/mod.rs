// Fri Oct 16 2026 - Alex

mod backends;
pub mod error;
pub mod matcher;
pub mod pattern;
pub mod scanner;

pub use error::PatternError;
pub use matcher::{is_match, is_match_scalar, Backend, MaskedMatcher};
pub use pattern::Pattern;
pub use scanner::ChunkScanner;

/// Compiles pattern text such as `"48 8B ?? ?? 05"`.
pub fn compile(text: &str) -> Result<Pattern, PatternError> {
    Pattern::compile(text)
}
