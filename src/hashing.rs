//! Hashing - SHA-256 digests over canonical JSON
//!
//! Registry digests let a font build or runtime loader confirm it holds
//! exactly the registry a compilation run produced.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::glyph::GlyphRegistry;

pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Canonical JSON: object keys sorted at every depth, no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    serde_json::to_string(&sorted(v))
}

fn sorted(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

pub fn compute_registry_hash(registry: &GlyphRegistry) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(registry)?.as_bytes()))
}

/// Digest of a grammar or tile spec, independent of field order in its source file.
pub fn compute_grammar_hash<T: Serialize>(grammar: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(grammar)?.as_bytes()))
}
