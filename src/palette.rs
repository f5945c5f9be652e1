//! Palettes - Locked color sets
//!
//! The foundry does not own palette data; it reads palettes through
//! `PaletteProvider`. `PaletteRegistry` is the stock provider.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{FoundryError, Result};

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
    #[serde(default)]
    pub name: Option<String>,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255, name: None }
    }

    pub fn from_hex(hex: &str, name: Option<&str>) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| FoundryError::Format(format!("Invalid hex color: {}", hex)))
        };

        let a = match digits.len() {
            6 => 255,
            8 => channel(6)?,
            _ => return Err(FoundryError::Format(format!("Invalid hex color: {}", hex))),
        };

        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
            name: name.map(str::to_string),
        })
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_rgba(&self) -> Rgba {
        [self.r, self.g, self.b, self.a]
    }

    pub fn lightened(&self, factor: f64) -> Self {
        let lift = |c: u8| (c as f64 + (255.0 - c as f64) * factor).min(255.0) as u8;
        Self {
            r: lift(self.r),
            g: lift(self.g),
            b: lift(self.b),
            a: self.a,
            name: self.name.as_ref().map(|n| format!("{}_light", n)),
        }
    }

    pub fn darkened(&self, factor: f64) -> Self {
        let drop = |c: u8| (c as f64 * (1.0 - factor)).max(0.0) as u8;
        Self {
            r: drop(self.r),
            g: drop(self.g),
            b: drop(self.b),
            a: self.a,
            name: self.name.as_ref().map(|n| format!("{}_dark", n)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub id: String,
    pub name: String,
    pub colors: Vec<Color>,
    #[serde(default)]
    pub background_index: usize,
    #[serde(default)]
    pub outline_index: Option<usize>,
    #[serde(default)]
    pub highlight_index: Option<usize>,
    #[serde(default)]
    pub shadow_index: Option<usize>,

    #[serde(default = "default_max_colors")]
    pub max_colors: usize,
    #[serde(default = "default_true")]
    pub allow_dithering: bool,
    #[serde(default = "default_true")]
    pub allow_transparency: bool,

    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub biome_affinity: Vec<String>,
}

fn default_max_colors() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Palette {
    pub fn new(id: impl Into<String>, name: impl Into<String>, colors: Vec<Color>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            colors,
            background_index: 0,
            outline_index: None,
            highlight_index: None,
            shadow_index: None,
            max_colors: default_max_colors(),
            allow_dithering: true,
            allow_transparency: true,
            tags: vec![],
            biome_affinity: vec![],
        }
    }

    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    pub fn get_color(&self, index: usize) -> Option<&Color> {
        self.colors.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Color> {
        self.colors.iter().find(|c| c.name.as_deref() == Some(name))
    }

    pub fn to_hex_list(&self) -> Vec<String> {
        self.colors.iter().map(Color::to_hex).collect()
    }

    /// Colors a tile may use, including full transparency when allowed.
    pub fn allowed_rgba(&self) -> Vec<Rgba> {
        let mut allowed: Vec<Rgba> = self.colors.iter().map(Color::to_rgba).collect();
        if self.allow_transparency {
            allowed.push(TRANSPARENT);
        }
        allowed
    }

    fn shifted(&self, suffix: &str, label: &str, shift: impl Fn(&Color) -> Color) -> Palette {
        let mut tags = self.tags.clone();
        tags.push(suffix.to_string());
        Palette {
            id: format!("{}_{}", self.id, suffix),
            name: format!("{} ({})", self.name, label),
            colors: self.colors.iter().map(shift).collect(),
            background_index: self.background_index,
            outline_index: None,
            highlight_index: None,
            shadow_index: None,
            max_colors: self.max_colors,
            allow_dithering: true,
            allow_transparency: true,
            tags,
            biome_affinity: vec![],
        }
    }

    /// dark / normal / bright variants for the lighting dial.
    pub fn derive_lighting_variants(&self) -> BTreeMap<&'static str, Palette> {
        let mut variants = BTreeMap::new();
        variants.insert("dark", self.shifted("dark", "Dark", |c| c.darkened(0.3)));
        variants.insert("normal", self.clone());
        variants.insert("bright", self.shifted("bright", "Bright", |c| c.lightened(0.2)));
        variants
    }

    /// The palette a tile with `lighting_state` is drawn with.
    pub fn for_lighting(&self, lighting_state: u8) -> Palette {
        match lighting_state {
            0 => self.shifted("dark", "Dark", |c| c.darkened(0.3)),
            1 => self.clone(),
            _ => self.shifted("bright", "Bright", |c| c.lightened(0.2)),
        }
    }
}

/// Read-only palette source consumed by the validator and prompt builder.
pub trait PaletteProvider {
    fn palette(&self, id: &str) -> Option<&Palette>;

    /// The palette `id` shifted for a tile's lighting dial.
    fn palette_for(&self, id: &str, lighting_state: u8) -> Option<Palette> {
        self.palette(id).map(|p| p.for_lighting(lighting_state))
    }
}

#[derive(Debug, Deserialize)]
struct PaletteFile {
    palettes: Vec<PaletteEntry>,
}

#[derive(Debug, Deserialize)]
struct PaletteEntry {
    id: String,
    name: String,
    colors: Vec<HexColor>,
    #[serde(default)]
    background_index: usize,
    #[serde(default)]
    outline_index: Option<usize>,
    #[serde(default)]
    highlight_index: Option<usize>,
    #[serde(default)]
    shadow_index: Option<usize>,
    #[serde(default = "default_max_colors")]
    max_colors: usize,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    biome_affinity: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct HexColor {
    hex: String,
    #[serde(default)]
    name: Option<String>,
}

/// Palette registry - built-in palettes plus any loaded from file
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    palettes: BTreeMap<String, Palette>,
}

impl PaletteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in palettes.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for palette in builtin_palettes() {
            registry.register(palette);
        }
        registry
    }

    /// Load palettes from a `{"palettes": [...]}` file. Colors are `#hex`.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let file: PaletteFile = serde_json::from_str(&content)?;

        let mut registry = Self::new();
        for entry in file.palettes {
            let colors = entry
                .colors
                .iter()
                .map(|c| Color::from_hex(&c.hex, c.name.as_deref()))
                .collect::<Result<Vec<_>>>()?;
            let mut palette = Palette::new(entry.id, entry.name, colors);
            palette.background_index = entry.background_index;
            palette.outline_index = entry.outline_index;
            palette.highlight_index = entry.highlight_index;
            palette.shadow_index = entry.shadow_index;
            palette.max_colors = entry.max_colors;
            palette.tags = entry.tags;
            palette.biome_affinity = entry.biome_affinity;
            registry.register(palette);
        }

        info!(path = %path.display(), count = registry.palettes.len(), "loaded palettes");
        Ok(registry)
    }

    pub fn register(&mut self, palette: Palette) {
        self.palettes.insert(palette.id.clone(), palette);
    }

    pub fn get(&self, id: &str) -> Option<&Palette> {
        self.palettes.get(id)
    }

    pub fn get_by_tag(&self, tag: &str) -> Vec<&Palette> {
        self.palettes.values().filter(|p| p.tags.iter().any(|t| t == tag)).collect()
    }

    pub fn get_by_biome(&self, biome: &str) -> Vec<&Palette> {
        self.palettes
            .values()
            .filter(|p| p.biome_affinity.iter().any(|b| b == biome))
            .collect()
    }

    pub fn list(&self) -> Vec<&Palette> {
        self.palettes.values().collect()
    }
}

impl PaletteProvider for PaletteRegistry {
    fn palette(&self, id: &str) -> Option<&Palette> {
        self.get(id)
    }
}

fn builtin(id: &str, name: &str, hexes: [&str; 4], tags: &[&str], biomes: &[&str]) -> Palette {
    const SHADES: [&str; 4] = ["darkest", "dark", "mid", "light"];
    let colors = hexes
        .iter()
        .zip(SHADES)
        .filter_map(|(hex, shade)| Color::from_hex(hex, Some(shade)).ok())
        .collect();
    let mut palette = Palette::new(id, name, colors);
    palette.tags = tags.iter().map(|t| t.to_string()).collect();
    palette.biome_affinity = biomes.iter().map(|b| b.to_string()).collect();
    palette
}

pub fn builtin_palettes() -> Vec<Palette> {
    let mut stone = builtin(
        "stone_gray",
        "Stone Gray",
        ["#1a1a2e", "#4a4a5e", "#8a8a9e", "#cacade"],
        &["stone", "neutral"],
        &["dungeon", "cave", "crypt"],
    );
    stone.outline_index = Some(0);
    stone.highlight_index = Some(3);
    stone.shadow_index = Some(1);

    vec![
        stone,
        builtin("stone_gray_4", "Stone Gray (4 color)", ["#1a1a2e", "#5a5a6e", "#9a9aae", "#dadaee"], &["stone", "minimal"], &[]),
        builtin("wood_brown", "Wood Brown", ["#2d1b0e", "#5c3a1d", "#8b5a2b", "#d4a574"], &["wood", "warm"], &[]),
        builtin("nature_green", "Nature Green", ["#1a2e1a", "#2d5a2d", "#4a8a4a", "#8aca8a"], &["nature", "organic"], &["forest"]),
        builtin("water_blue", "Water Blue", ["#0a1a2e", "#1a4a7e", "#3a7abe", "#7abaee"], &["water", "fluid"], &[]),
        builtin("lava_orange", "Lava Orange", ["#2e0a0a", "#8a1a1a", "#da4a1a", "#faba4a"], &["lava", "hot"], &["volcano"]),
        builtin("bone_white", "Bone White", ["#2e2a1a", "#6e5a4a", "#beaa8a", "#eee8da"], &["bone", "macabre"], &["crypt"]),
        builtin("void_purple", "Void Purple", ["#0a0a1e", "#2a1a4e", "#5a3a8e", "#aa7ace"], &["void", "magic"], &["void"]),
        builtin("sand_yellow", "Sand Yellow", ["#3e2a1a", "#8e6a3a", "#ceaa6a", "#eee8ba"], &["sand", "desert"], &[]),
        builtin("metal_gray", "Metal Gray", ["#1a1a1a", "#4a4a5a", "#8a8a9a", "#dadaea"], &["metal", "industrial"], &[]),
        builtin("blood_red", "Blood Red", ["#1a0a0a", "#4a1a1a", "#8a2a2a", "#ca5a5a"], &["blood", "macabre"], &[]),
        builtin("ice_blue", "Ice Blue", ["#1a2a3e", "#4a6a8e", "#8abaee", "#daeeff"], &["ice", "cold"], &[]),
    ]
}
