//! Dictionary storage and loaders.
//!
//! `PhonemeDictionary` maps Japanese surface forms to phoneme strings;
//! `WordDictionary` holds word boundaries for segmentation. Both are tries
//! built once at load time and read-only during conversion.

mod binary;
mod phoneme;
mod words;

pub use phoneme::PhonemeDictionary;
pub use words::WordDictionary;

use std::io;

/// Unified error type for dictionary loading.
///
/// Covers the map-file parser and the compiled JPHO binary format.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected JPHO)")]
    InvalidMagic,

    #[error("unsupported version: {0}.{1}")]
    UnsupportedVersion(u16, u16),

    #[error("truncated entry at record {0}")]
    Truncated(u32),

    #[error("parse error: {0}")]
    Parse(String),
}
