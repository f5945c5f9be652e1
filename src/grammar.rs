//! Tile Grammar - What a tile IS, not what it looks like
//!
//! A `TileGrammar` is the complete declarative description of one tile
//! variant. A `TileSpec` is a generator over a family of grammars.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::edges::{EdgeCode, EdgeSignature};
use crate::error::{FoundryError, Result};

pub const MAX_DAMAGE: u8 = 3;
pub const MAX_LIGHTING: u8 = 2;
pub const MAX_MOISTURE: u8 = 1;
pub const MAX_AGE: u8 = 2;

pub const DAMAGE_WORDS: [&str; 4] = ["pristine", "scratched", "cracked", "broken"];
pub const LIGHTING_WORDS: [&str; 3] = ["shadowed", "normal", "highlighted"];
pub const AGE_WORDS: [&str; 3] = ["new", "worn", "ancient"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileSize {
    #[serde(rename = "4x4")]
    Tiny,
    #[default]
    #[serde(rename = "8x8")]
    Small,
    #[serde(rename = "16x16")]
    Medium,
    #[serde(rename = "24x24")]
    Large,
    #[serde(rename = "32x32")]
    XLarge,
}

impl TileSize {
    pub fn dimensions(self) -> (u32, u32) {
        let side = match self {
            TileSize::Tiny => 4,
            TileSize::Small => 8,
            TileSize::Medium => 16,
            TileSize::Large => 24,
            TileSize::XLarge => 32,
        };
        (side, side)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStyle {
    /// Hard pixel edges
    Pixel,
    Comic,
    HighContrast,
    Dithered,
    /// Flat colors, no shading
    Flat,
    Textured,
}

impl TileStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            TileStyle::Pixel => "pixel",
            TileStyle::Comic => "comic",
            TileStyle::HighContrast => "high_contrast",
            TileStyle::Dithered => "dithered",
            TileStyle::Flat => "flat",
            TileStyle::Textured => "textured",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            TileStyle::Pixel => "hard pixel edges",
            TileStyle::Comic => "outlined comic style",
            TileStyle::HighContrast => "high contrast light/dark",
            TileStyle::Dithered => "dithered shading",
            TileStyle::Flat => "flat solid colors",
            TileStyle::Textured => "subtle texture variation",
        }
    }
}

/// THE definition of a tile: everything needed to generate,
/// validate and classify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrammar {
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub size: TileSize,
    pub palette: String,
    #[serde(default)]
    pub edges: EdgeSignature,
    #[serde(default = "default_center")]
    pub center: String,
    #[serde(default = "default_styles")]
    pub styles: Vec<TileStyle>,

    #[serde(default)]
    pub damage_state: u8,
    #[serde(default = "default_lighting")]
    pub lighting_state: u8,
    #[serde(default)]
    pub moisture_state: u8,
    #[serde(default)]
    pub age_state: u8,

    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub biome_affinity: Vec<String>,
}

fn default_center() -> String {
    "empty".to_string()
}

fn default_styles() -> Vec<TileStyle> {
    vec![TileStyle::Pixel]
}

fn default_lighting() -> u8 {
    1
}

impl TileGrammar {
    pub fn new(category: impl Into<String>, palette: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: None,
            size: TileSize::default(),
            palette: palette.into(),
            edges: EdgeSignature::default(),
            center: default_center(),
            styles: default_styles(),
            damage_state: 0,
            lighting_state: default_lighting(),
            moisture_state: 0,
            age_state: 0,
            tags: vec![],
            biome_affinity: vec![],
        }
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_edges(mut self, edges: EdgeSignature) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_center(mut self, center: impl Into<String>) -> Self {
        self.center = center.into();
        self
    }

    pub fn with_styles(mut self, styles: Vec<TileStyle>) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_states(mut self, damage: u8, lighting: u8, moisture: u8, age: u8) -> Self {
        self.damage_state = damage;
        self.lighting_state = lighting;
        self.moisture_state = moisture;
        self.age_state = age;
        self
    }

    pub fn with_biomes(mut self, biomes: &[&str]) -> Self {
        self.biome_affinity = biomes.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(FoundryError::InvalidGrammar("category must not be empty".into()));
        }
        if self.palette.trim().is_empty() {
            return Err(FoundryError::InvalidGrammar("palette must not be empty".into()));
        }

        let dials = [
            ("damage_state", self.damage_state, MAX_DAMAGE),
            ("lighting_state", self.lighting_state, MAX_LIGHTING),
            ("moisture_state", self.moisture_state, MAX_MOISTURE),
            ("age_state", self.age_state, MAX_AGE),
        ];
        for (name, value, max) in dials {
            if value > max {
                return Err(FoundryError::InvalidGrammar(format!(
                    "{} = {} out of range 0..={}",
                    name, value, max
                )));
            }
        }

        Ok(())
    }

    /// Number of state combinations up to and including the current dials.
    pub fn variant_count(&self) -> usize {
        (self.damage_state as usize + 1)
            * (self.lighting_state as usize + 1)
            * (self.moisture_state as usize + 1)
            * (self.age_state as usize + 1)
    }

    /// Stable ID derived purely from field values.
    pub fn generation_id(&self) -> String {
        format!(
            "{}.{}.{}.{}.d{}.l{}.m{}.a{}",
            self.category,
            self.subcategory.as_deref().unwrap_or("base"),
            self.center,
            self.edges.to_code(),
            self.damage_state,
            self.lighting_state,
            self.moisture_state,
            self.age_state,
        )
    }
}

/// Batch generation spec: a base grammar plus its variant dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    pub id: String,
    pub grammar: TileGrammar,

    #[serde(default = "one")]
    pub damage_variants: u8,
    #[serde(default = "one")]
    pub lighting_variants: u8,
    #[serde(default = "one")]
    pub moisture_variants: u8,
    #[serde(default = "one")]
    pub age_variants: u8,

    #[serde(default)]
    pub generate_rotations: bool,
    /// Horizontal flip only; vertical flips are covered by rotations.
    #[serde(default)]
    pub generate_flips: bool,
}

fn one() -> u8 {
    1
}

impl TileSpec {
    pub fn new(id: impl Into<String>, grammar: TileGrammar) -> Self {
        Self {
            id: id.into(),
            grammar,
            damage_variants: 1,
            lighting_variants: 1,
            moisture_variants: 1,
            age_variants: 1,
            generate_rotations: false,
            generate_flips: false,
        }
    }

    pub fn with_variants(mut self, damage: u8, lighting: u8, moisture: u8, age: u8) -> Self {
        self.damage_variants = damage;
        self.lighting_variants = lighting;
        self.moisture_variants = moisture;
        self.age_variants = age;
        self
    }

    pub fn with_rotations(mut self) -> Self {
        self.generate_rotations = true;
        self
    }

    pub fn with_flips(mut self) -> Self {
        self.generate_flips = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let dims = [
            ("damage_variants", self.damage_variants, MAX_DAMAGE + 1),
            ("lighting_variants", self.lighting_variants, MAX_LIGHTING + 1),
            ("moisture_variants", self.moisture_variants, MAX_MOISTURE + 1),
            ("age_variants", self.age_variants, MAX_AGE + 1),
        ];
        for (name, value, max) in dims {
            if value == 0 || value > max {
                return Err(FoundryError::InvalidSpec(format!(
                    "{}: {} = {} out of range 1..={}",
                    self.id, name, value, max
                )));
            }
        }
        Ok(())
    }

    pub fn total_variants(&self) -> usize {
        let mut total = self.damage_variants as usize
            * self.lighting_variants as usize
            * self.moisture_variants as usize
            * self.age_variants as usize;
        if self.generate_rotations {
            total *= 4;
        }
        if self.generate_flips {
            total *= 2;
        }
        total
    }

    /// Expand into every concrete grammar, damage outermost, age innermost,
    /// then rotation, then flip.
    pub fn expand(&self) -> Vec<TileGrammar> {
        let rotations = if self.generate_rotations { 4 } else { 1 };
        let mut grammars = Vec::with_capacity(self.total_variants());

        for damage in 0..self.damage_variants {
            for lighting in 0..self.lighting_variants {
                for moisture in 0..self.moisture_variants {
                    for age in 0..self.age_variants {
                        let base = self.grammar.clone().with_states(damage, lighting, moisture, age);

                        for rot in 0..rotations {
                            let mut rotated = base.clone();
                            rotated.edges = base.edges.rotated(rot);

                            if self.generate_flips {
                                let mut flipped = rotated.clone();
                                flipped.edges = rotated.edges.flipped_horizontal();
                                grammars.push(rotated);
                                grammars.push(flipped);
                            } else {
                                grammars.push(rotated);
                            }
                        }
                    }
                }
            }
        }

        grammars
    }
}

/// Total tiles a set of specs will produce.
pub fn batch_size(specs: &[TileSpec]) -> usize {
    specs.iter().map(TileSpec::total_variants).sum()
}

/// How a combinatorial batch scales before anything is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinatorialPlan {
    pub base_tiles: usize,
    pub edge_variants: usize,
    pub damage_states: usize,
    pub lighting_states: usize,
    pub moisture_states: usize,
    pub total_tiles: usize,
    pub formula: String,
}

impl CombinatorialPlan {
    pub fn new(
        bases: &[String],
        edge_variants: usize,
        damage_states: usize,
        lighting_states: usize,
        moisture_states: usize,
    ) -> Self {
        let base_tiles = bases.len();
        Self {
            base_tiles,
            edge_variants,
            damage_states,
            lighting_states,
            moisture_states,
            total_tiles: [edge_variants, damage_states, lighting_states, moisture_states]
                .iter()
                .fold(base_tiles, |acc, n| acc.saturating_mul(*n)),
            formula: format!(
                "{} × {} × {} × {} × {}",
                base_tiles, edge_variants, damage_states, lighting_states, moisture_states
            ),
        }
    }
}

/// Built-in grammars for the common tiles.
pub fn standard_grammars() -> BTreeMap<&'static str, TileGrammar> {
    use EdgeCode::*;

    let mut grammars = BTreeMap::new();
    grammars.insert(
        "wall.solid",
        TileGrammar::new("wall", "stone_gray")
            .with_subcategory("solid")
            .with_edges(EdgeSignature::uniform(Solid))
            .with_center("stone")
            .with_styles(vec![TileStyle::Pixel, TileStyle::Textured]),
    );
    grammars.insert(
        "wall.corner.ne",
        TileGrammar::new("wall", "stone_gray")
            .with_subcategory("corner")
            .with_edges(EdgeSignature::new(Solid, Solid, Empty, Empty))
            .with_center("stone"),
    );
    grammars.insert(
        "floor.stone",
        TileGrammar::new("floor", "stone_gray")
            .with_subcategory("stone")
            .with_edges(EdgeSignature::uniform(Floor))
            .with_center("stone_floor")
            .with_styles(vec![TileStyle::Pixel, TileStyle::Flat]),
    );
    grammars.insert(
        "floor.grass",
        TileGrammar::new("floor", "nature_green")
            .with_subcategory("grass")
            .with_edges(EdgeSignature::uniform(Grass))
            .with_center("grass")
            .with_styles(vec![TileStyle::Pixel, TileStyle::Textured])
            .with_biomes(&["forest", "ruins"]),
    );
    grammars.insert(
        "water.shallow",
        TileGrammar::new("fluid", "water_blue")
            .with_subcategory("water")
            .with_edges(EdgeSignature::uniform(Water))
            .with_center("water")
            .with_styles(vec![TileStyle::Pixel, TileStyle::Dithered]),
    );
    grammars.insert(
        "door.wood",
        TileGrammar::new("door", "wood_brown")
            .with_subcategory("wood")
            .with_edges(EdgeSignature::new(DoorFrame, Solid, DoorFrame, Solid))
            .with_center("door"),
    );
    grammars
}
