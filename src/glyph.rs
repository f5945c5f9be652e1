//! Glyph Records - Compiled, multi-facet tile definitions
//!
//! A glyph's `id` is stable and independent of its codepoint. Glyphs are
//! never mutated after compilation; biome variants are merged copies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::allocator::{Codepoint, GlyphCategory};
use crate::error::{FoundryError, Result};

/// Rendering layer, serialized as its integer rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum GlyphLayer {
    #[default]
    Background,
    Structure,
    Entity,
    Effect,
    Lighting,
    Ui,
}

impl From<GlyphLayer> for u8 {
    fn from(layer: GlyphLayer) -> Self {
        layer as u8
    }
}

impl TryFrom<u8> for GlyphLayer {
    type Error = FoundryError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(GlyphLayer::Background),
            1 => Ok(GlyphLayer::Structure),
            2 => Ok(GlyphLayer::Entity),
            3 => Ok(GlyphLayer::Effect),
            4 => Ok(GlyphLayer::Lighting),
            5 => Ok(GlyphLayer::Ui),
            other => Err(FoundryError::Format(format!("Unknown glyph layer {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphPhysics {
    pub walkable: bool,
    pub blocks_movement: bool,
    pub blocks_light: bool,
    pub blocks_projectiles: bool,
    pub climbable: bool,
    pub swimmable: bool,
    /// Always within 0.0..=1.0
    pub movement_penalty: f64,
    pub damage_on_enter: u32,
    pub damage_type: Option<String>,
}

impl Default for GlyphPhysics {
    fn default() -> Self {
        Self {
            walkable: true,
            blocks_movement: false,
            blocks_light: false,
            blocks_projectiles: false,
            climbable: false,
            swimmable: false,
            movement_penalty: 0.0,
            damage_on_enter: 0,
            damage_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphVisual {
    pub layer: GlyphLayer,
    /// none, auto, or manual
    pub connectivity: String,
    pub palette: Option<String>,
    pub glow: bool,
    pub glow_radius: u32,
    pub glow_color: Option<String>,
    pub animated: bool,
    pub animation_id: Option<String>,
    pub z_index: i32,
}

impl Default for GlyphVisual {
    fn default() -> Self {
        Self {
            layer: GlyphLayer::Background,
            connectivity: "none".to_string(),
            palette: None,
            glow: false,
            glow_radius: 0,
            glow_color: None,
            animated: false,
            animation_id: None,
            z_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphAudio {
    pub on_step: Option<String>,
    pub on_enter: Option<String>,
    pub on_exit: Option<String>,
    pub on_interact: Option<String>,
    pub on_impact: Option<String>,
    pub ambient: Option<String>,
    pub ambient_volume: f64,
}

impl Default for GlyphAudio {
    fn default() -> Self {
        Self {
            on_step: None,
            on_enter: None,
            on_exit: None,
            on_interact: None,
            on_impact: None,
            ambient: None,
            ambient_volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphNarrative {
    pub description: String,
    pub examine_text: Option<String>,
    pub tone: String,
    pub keywords: Vec<String>,
    pub lore_category: Option<String>,
}

impl Default for GlyphNarrative {
    fn default() -> Self {
        Self {
            description: String::new(),
            examine_text: None,
            tone: "neutral".to_string(),
            keywords: vec![],
            lore_category: None,
        }
    }
}

/// Metadata an AI agent reads to reason about a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphLlm {
    pub summary: String,
    pub threat: f64,
    pub interest: f64,
    pub utility: f64,
    pub rarity: f64,
    pub synonyms: Vec<String>,
    pub contexts: Vec<String>,
}

impl Default for GlyphLlm {
    fn default() -> Self {
        Self {
            summary: String::new(),
            threat: 0.0,
            interest: 0.0,
            utility: 0.0,
            rarity: 0.5,
            synonyms: vec![],
            contexts: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub id: String,
    pub codepoint: Codepoint,
    /// Fallback display character for legacy rendering
    #[serde(rename = "char")]
    pub fallback_char: char,
    pub name: String,
    pub category: GlyphCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub variant: Option<String>,

    #[serde(default)]
    pub physics: GlyphPhysics,
    #[serde(default)]
    pub visual: GlyphVisual,
    #[serde(default)]
    pub audio: GlyphAudio,
    #[serde(default)]
    pub narrative: GlyphNarrative,
    #[serde(default)]
    pub llm: GlyphLlm,

    /// biome -> {field or facet -> override}
    #[serde(default)]
    pub biome_variants: BTreeMap<String, Value>,
}

impl Glyph {
    pub fn codepoint_value(&self) -> u32 {
        self.codepoint.value()
    }

    pub fn unicode_char(&self) -> Option<char> {
        self.codepoint.as_char()
    }

    /// Copy of this glyph with the biome's overrides merged in.
    ///
    /// Facet objects merge one level deep; everything else is replaced.
    pub fn for_biome(&self, biome: &str) -> Result<Glyph> {
        let Some(overrides) = self.biome_variants.get(biome) else {
            return Ok(self.clone());
        };
        let Value::Object(overrides) = overrides else {
            return Err(FoundryError::Format(format!(
                "Biome override for {} on {} must be an object",
                biome, self.id
            )));
        };

        let mut data = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut data {
            for (key, value) in overrides {
                match (fields.get_mut(key), value) {
                    (Some(Value::Object(existing)), Value::Object(patch)) => {
                        for (k, v) in patch {
                            existing.insert(k.clone(), v.clone());
                        }
                    }
                    _ => {
                        fields.insert(key.clone(), value.clone());
                    }
                }
            }
        }

        Ok(serde_json::from_value(data)?)
    }
}

pub const REGISTRY_VERSION: &str = "1.0.0";
pub const REGISTRY_DESCRIPTION: &str = "Auto-generated glyph registry from tile compiler";

/// The exported registry document consumed by font builders and the
/// runtime glyph loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRegistry {
    pub version: String,
    pub description: String,
    pub glyphs: Vec<Glyph>,
}

impl GlyphRegistry {
    pub fn new(version: impl Into<String>, description: impl Into<String>, glyphs: Vec<Glyph>) -> Self {
        Self {
            version: version.into(),
            description: description.into(),
            glyphs,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, id: &str) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.id == id)
    }

    pub fn by_codepoint(&self, codepoint: Codepoint) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.codepoint == codepoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn glyph() -> Glyph {
        Glyph {
            id: "floor.grass".to_string(),
            codepoint: Codepoint::new(0xE100),
            fallback_char: '.',
            name: "Floor (grass)".to_string(),
            category: GlyphCategory::Ground,
            tags: vec!["floor".to_string()],
            variant: Some("grass".to_string()),
            physics: GlyphPhysics::default(),
            visual: GlyphVisual::default(),
            audio: GlyphAudio::default(),
            narrative: GlyphNarrative::default(),
            llm: GlyphLlm::default(),
            biome_variants: BTreeMap::new(),
        }
    }

    #[test]
    fn test_layer_serializes_as_int() {
        assert_eq!(serde_json::to_string(&GlyphLayer::Structure).unwrap(), "1");
        let layer: GlyphLayer = serde_json::from_str("4").unwrap();
        assert_eq!(layer, GlyphLayer::Lighting);
        assert!(serde_json::from_str::<GlyphLayer>("9").is_err());
    }

    #[test]
    fn test_record_field_names() {
        let value = serde_json::to_value(glyph()).unwrap();
        assert_eq!(value["char"], json!("."));
        assert_eq!(value["codepoint"], json!("U+E100"));
        assert_eq!(value["category"], json!("ground"));
        assert!(value["physics"]["movement_penalty"].is_number());
        assert!(value["llm"]["threat"].is_number());
    }

    #[test]
    fn test_biome_variant_merges_copy() {
        let mut base = glyph();
        base.biome_variants.insert(
            "swamp".to_string(),
            json!({"physics": {"movement_penalty": 0.5}, "name": "Swamp Grass"}),
        );

        let swamp = base.for_biome("swamp").unwrap();
        assert_eq!(swamp.physics.movement_penalty, 0.5);
        assert!(swamp.physics.walkable);
        assert_eq!(swamp.name, "Swamp Grass");
        assert_eq!(base.physics.movement_penalty, 0.0);
        assert_eq!(base.name, "Floor (grass)");

        assert_eq!(base.for_biome("desert").unwrap(), base);
    }

    #[test]
    fn test_unicode_char() {
        assert_eq!(glyph().unicode_char(), Some('\u{E100}'));
    }
}
