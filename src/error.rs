//! Error taxonomy for the foundry.
//!
//! Validation problems are never errors here: they are reported as
//! `ValidationViolation` data inside a `ValidationResult`.

use thiserror::Error;

use crate::allocator::GlyphCategory;

pub type Result<T> = std::result::Result<T, FoundryError>;

#[derive(Debug, Error)]
pub enum FoundryError {
    #[error("Codepoint range exhausted for {category} (U+{start:04X}..U+{end:04X})")]
    RangeExhausted {
        category: GlyphCategory,
        start: u32,
        end: u32,
    },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("Invalid spec: {0}")]
    InvalidSpec(String),

    #[error("Unknown tile category: {0}")]
    UnknownCategory(String),

    #[error("Grammar pack {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),

    #[error("Nothing to compile: batch contains no specs")]
    EmptyBatch,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
