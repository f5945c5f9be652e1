//! Foundry configuration, loaded from JSON. Every field has a default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{FoundryError, Result};
use crate::glyph::{REGISTRY_DESCRIPTION, REGISTRY_VERSION};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoundryConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub validator: ValidatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default = "default_registry_version")]
    pub registry_version: String,
    #[serde(default = "default_registry_description")]
    pub registry_description: String,
    /// Reject unknown categories instead of compiling them as props.
    #[serde(default)]
    pub strict_categories: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default = "default_true")]
    pub strict: bool,
    #[serde(default)]
    pub color_tolerance: Option<u8>,
    #[serde(default = "default_max_colors")]
    pub default_max_colors: usize,
}

fn default_registry_version() -> String {
    REGISTRY_VERSION.to_string()
}

fn default_registry_description() -> String {
    REGISTRY_DESCRIPTION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_colors() -> usize {
    4
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            registry_version: default_registry_version(),
            registry_description: default_registry_description(),
            strict_categories: false,
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            strict: true,
            color_tolerance: None,
            default_max_colors: default_max_colors(),
        }
    }
}

impl FoundryConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: FoundryConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        semver::Version::parse(&self.compiler.registry_version).map_err(|e| {
            FoundryError::Config(format!(
                "registry_version '{}' is not semver: {}",
                self.compiler.registry_version, e
            ))
        })?;
        if self.validator.default_max_colors == 0 {
            return Err(FoundryError::Config("default_max_colors must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FoundryConfig::load(&dir.path().join("foundry.json")).unwrap();
        assert_eq!(config, FoundryConfig::default());
        assert!(config.validator.strict);
        assert_eq!(config.compiler.registry_version, "1.0.0");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"compiler": {{"strict_categories": true}}, "validator": {{"strict": false}}}}"#).unwrap();

        let config = FoundryConfig::load(file.path()).unwrap();
        assert!(config.compiler.strict_categories);
        assert!(!config.validator.strict);
        assert_eq!(config.validator.default_max_colors, 4);
        assert_eq!(config.compiler.registry_description, REGISTRY_DESCRIPTION);
    }

    #[test]
    fn test_bad_registry_version_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"compiler": {{"registry_version": "one"}}}}"#).unwrap();
        assert!(matches!(FoundryConfig::load(file.path()), Err(FoundryError::Config(_))));
    }
}
