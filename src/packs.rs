//! Grammar Packs - Versioned bundles of tile specs
//!
//! A pack is a JSON file. Packs declare the minimum engine version they
//! need; the engine refuses packs written for a newer engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{FoundryError, Result};
use crate::grammar::{batch_size, TileSpec};
use crate::ENGINE_VERSION;

pub type PackId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarPack {
    pub id: PackId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub pack_version: String,
    #[serde(default = "default_version")]
    pub engine_min_version: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub specs: Vec<TileSpec>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl GrammarPack {
    pub fn new(id: impl Into<String>, name: impl Into<String>, specs: Vec<TileSpec>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            pack_version: default_version(),
            engine_min_version: default_version(),
            deprecated: false,
            specs,
        }
    }

    pub fn tile_count(&self) -> usize {
        batch_size(&self.specs)
    }
}

/// Fails when the pack needs a newer engine than this one.
pub fn check_engine_version(pack: &GrammarPack) -> Result<()> {
    let engine_ver = semver::Version::parse(ENGINE_VERSION)
        .map_err(|_| FoundryError::Config("Invalid engine version".into()))?;
    let min_ver = semver::Version::parse(&pack.engine_min_version).map_err(|_| {
        FoundryError::Config(format!(
            "Pack {} has invalid engine_min_version '{}'",
            pack.id, pack.engine_min_version
        ))
    })?;

    if engine_ver < min_ver {
        return Err(FoundryError::EngineVersionMismatch(
            pack.id.clone(),
            pack.engine_min_version.clone(),
            ENGINE_VERSION.to_string(),
        ));
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct GrammarPackRegistry {
    packs: BTreeMap<PackId, GrammarPack>,
}

impl GrammarPackRegistry {
    pub fn new() -> Self {
        Self { packs: BTreeMap::new() }
    }

    /// Load every `*.json` pack in `dir`. Unreadable or unparseable files
    /// are skipped. A missing directory yields an empty registry.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        if !dir.exists() {
            return Ok(registry);
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(FoundryError::from)
                .and_then(|content| Ok(serde_json::from_str::<GrammarPack>(&content)?));
            match parsed {
                Ok(pack) => registry.register(pack),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping grammar pack"),
            }
        }

        info!(dir = %dir.display(), packs = registry.len(), "loaded grammar packs");
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&GrammarPack> {
        self.packs.get(id)
    }

    /// Packs sorted by id.
    pub fn list(&self) -> Vec<&GrammarPack> {
        self.packs.values().collect()
    }

    pub fn register(&mut self, pack: GrammarPack) {
        self.packs.insert(pack.id.clone(), pack);
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::TileGrammar;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_from_dir_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "dungeon.json",
            r#"{"id": "dungeon", "name": "Dungeon", "specs": [
                {"id": "walls", "grammar": {"category": "wall", "palette": "stone_gray"}, "damage_variants": 4}
            ]}"#,
        );
        write(dir.path(), "broken.json", "{ not json");
        write(dir.path(), "notes.txt", "ignored");
        write(dir.path(), "caves.json", r#"{"id": "caves", "name": "Caves"}"#);

        let registry = GrammarPackRegistry::load_from_dir(dir.path()).unwrap();
        let ids: Vec<&str> = registry.list().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["caves", "dungeon"]);

        let dungeon = registry.get("dungeon").unwrap();
        assert_eq!(dungeon.pack_version, "1.0.0");
        assert_eq!(dungeon.tile_count(), 4);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = GrammarPackRegistry::load_from_dir(&dir.path().join("nope")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_engine_version_gate() {
        let mut pack = GrammarPack::new("p", "P", vec![TileSpec::new("s", TileGrammar::new("wall", "x"))]);
        assert!(check_engine_version(&pack).is_ok());

        pack.engine_min_version = "99.0.0".into();
        assert!(matches!(
            check_engine_version(&pack),
            Err(FoundryError::EngineVersionMismatch(id, req, _)) if id == "p" && req == "99.0.0"
        ));

        pack.engine_min_version = "latest".into();
        assert!(matches!(check_engine_version(&pack), Err(FoundryError::Config(_))));
    }
}
