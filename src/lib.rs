//! Glyph Foundry Core - Tile Grammar Compiler
//!
//! # The Five Laws (Non-Negotiable)
//! 1. The Grammar Is Truth
//! 2. Edges Are Contracts
//! 3. Codepoints Never Move
//! 4. Deterministic Output
//! 5. Validation Reports, Never Repairs

pub mod error;
pub mod edges;
pub mod grammar;
pub mod packs;
pub mod edge_system;
pub mod allocator;
pub mod glyph;
pub mod compiler;
pub mod palette;
pub mod raster;
pub mod validator;
pub mod prompt;
pub mod hashing;
pub mod config;

pub use error::{FoundryError, Result};
pub use edges::{Direction, EdgeCode, EdgeSignature};
pub use grammar::{TileGrammar, TileSize, TileSpec, TileStyle};
pub use packs::{GrammarPack, GrammarPackRegistry};
pub use edge_system::{EdgeSystem, MapViolation, Neighbors};
pub use allocator::{Codepoint, CodepointAllocator, GlyphCategory};
pub use glyph::{Glyph, GlyphRegistry};
pub use compiler::{CompilationBatch, GlyphOutput, TileCategory, TileCompiler};
pub use palette::{Palette, PaletteProvider, PaletteRegistry};
pub use raster::{PixelBuffer, Raster};
pub use validator::{TileValidator, ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity};
pub use prompt::GenerationPrompt;
pub use hashing::{canonical_json, compute_registry_hash};
pub use config::FoundryConfig;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
