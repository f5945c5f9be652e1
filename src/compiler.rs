//! Tile Compiler - Grammar in, glyph out
//!
//! Every compiled tile gets a codepoint from its category band and a full
//! set of derived facets. Batches tolerate per-tile failure: a bad grammar
//! is recorded and the rest of the batch still compiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::allocator::{BandStats, Codepoint, CodepointAllocator, GlyphCategory};
use crate::config::CompilerConfig;
use crate::edge_system::EdgeSystem;
use crate::edges::{EdgeCode, EdgeSignature};
use crate::error::{FoundryError, Result};
use crate::glyph::{
    Glyph, GlyphAudio, GlyphLayer, GlyphLlm, GlyphNarrative, GlyphPhysics, GlyphRegistry, GlyphVisual,
};
use crate::grammar::{TileGrammar, TileSpec, AGE_WORDS, DAMAGE_WORDS};
use crate::hashing::{compute_grammar_hash, compute_registry_hash};
use crate::ENGINE_VERSION;

const GLOWING_CENTERS: [&str; 5] = ["fire", "torch", "crystal", "lava", "magic"];
const INTERESTING_SUBCATEGORIES: [&str; 3] = ["chest", "altar", "crystal"];

/// Grammar categories the compiler knows how to derive facets for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TileCategory {
    Wall,
    Floor,
    Ground,
    Grass,
    Wood,
    Door,
    Window,
    Fluid,
    Water,
    Lava,
    Prop,
    Object,
    Item,
    Entity,
    Creature,
    Effect,
    Particle,
    Ui,
    Overlay,
    Empty,
    Other(String),
}

impl TileCategory {
    pub fn parse(category: &str) -> Self {
        match category.to_lowercase().as_str() {
            "wall" => TileCategory::Wall,
            "floor" => TileCategory::Floor,
            "ground" => TileCategory::Ground,
            "grass" => TileCategory::Grass,
            "wood" => TileCategory::Wood,
            "door" => TileCategory::Door,
            "window" => TileCategory::Window,
            "fluid" => TileCategory::Fluid,
            "water" => TileCategory::Water,
            "lava" => TileCategory::Lava,
            "prop" => TileCategory::Prop,
            "object" => TileCategory::Object,
            "item" => TileCategory::Item,
            "entity" => TileCategory::Entity,
            "creature" => TileCategory::Creature,
            "effect" => TileCategory::Effect,
            "particle" => TileCategory::Particle,
            "ui" => TileCategory::Ui,
            "overlay" => TileCategory::Overlay,
            "empty" => TileCategory::Empty,
            other => TileCategory::Other(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TileCategory::Other(_))
    }

    /// Codepoint band. Anything without a band of its own is a prop.
    pub fn glyph_category(&self) -> GlyphCategory {
        match self {
            TileCategory::Wall => GlyphCategory::Wall,
            TileCategory::Floor | TileCategory::Ground => GlyphCategory::Ground,
            TileCategory::Door | TileCategory::Window => GlyphCategory::Door,
            TileCategory::Fluid | TileCategory::Water | TileCategory::Lava => GlyphCategory::Fluid,
            TileCategory::Item => GlyphCategory::Item,
            TileCategory::Entity | TileCategory::Creature => GlyphCategory::Entity,
            TileCategory::Effect | TileCategory::Particle => GlyphCategory::Effect,
            TileCategory::Ui => GlyphCategory::Ui,
            TileCategory::Overlay => GlyphCategory::Overlay,
            TileCategory::Empty => GlyphCategory::Empty,
            TileCategory::Prop
            | TileCategory::Object
            | TileCategory::Grass
            | TileCategory::Wood
            | TileCategory::Other(_) => GlyphCategory::Prop,
        }
    }

    pub fn fallback_char(&self) -> char {
        match self {
            TileCategory::Wall => '#',
            TileCategory::Floor | TileCategory::Ground => '.',
            TileCategory::Door => '+',
            TileCategory::Fluid => '~',
            TileCategory::Water => '≈',
            TileCategory::Lava => '▓',
            TileCategory::Prop => '■',
            TileCategory::Item => '!',
            TileCategory::Entity => '&',
            TileCategory::Effect => '*',
            TileCategory::Empty => ' ',
            _ => '?',
        }
    }

    pub fn layer(&self) -> GlyphLayer {
        match self {
            TileCategory::Wall | TileCategory::Door | TileCategory::Prop => GlyphLayer::Structure,
            TileCategory::Entity | TileCategory::Item => GlyphLayer::Entity,
            TileCategory::Effect | TileCategory::Particle => GlyphLayer::Effect,
            TileCategory::Overlay => GlyphLayer::Lighting,
            _ => GlyphLayer::Background,
        }
    }

    fn step_sound(&self) -> Option<&'static str> {
        match self {
            TileCategory::Floor => Some("movement.step.stone"),
            TileCategory::Ground => Some("movement.step.dirt"),
            TileCategory::Grass => Some("movement.step.grass"),
            TileCategory::Wood => Some("movement.step.wood"),
            TileCategory::Water | TileCategory::Fluid => Some("movement.splash.light"),
            _ => None,
        }
    }

    fn ambient_sound(&self) -> Option<&'static str> {
        match self {
            TileCategory::Water | TileCategory::Fluid => Some("ambient.water"),
            TileCategory::Lava => Some("ambient.lava.bubble"),
            _ => None,
        }
    }

    fn noun<'a>(&self, raw: &'a str) -> &'a str {
        match self {
            TileCategory::Wall => "stone wall",
            TileCategory::Floor => "stone floor",
            TileCategory::Ground => "ground",
            TileCategory::Door => "door",
            TileCategory::Fluid => "water",
            TileCategory::Prop => "object",
            _ => raw,
        }
    }
}

impl fmt::Display for TileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileCategory::Other(raw) => write!(f, "{}", raw),
            known => write!(f, "{}", format!("{:?}", known).to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphOutput {
    pub glyph: Glyph,
    pub codepoint: Codepoint,
    pub tile_id: String,
    pub image_path: Option<String>,
    pub edges: EdgeSignature,
    /// Digest of the grammar this output was compiled from.
    pub grammar_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationBatch {
    pub batch_id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub outputs: Vec<GlyphOutput>,
    pub errors: Vec<String>,
    pub registry_json: String,
    pub registry_hash: String,
}

impl CompilationBatch {
    pub fn success_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Compiles grammars into glyphs and keeps every result for export.
///
/// Owns its allocator, so one compiler is one compilation session.
pub struct TileCompiler {
    config: CompilerConfig,
    allocator: CodepointAllocator,
    compiled: BTreeMap<String, GlyphOutput>,
}

impl TileCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            allocator: CodepointAllocator::new(),
            compiled: BTreeMap::new(),
        }
    }

    pub fn with_allocator(config: CompilerConfig, allocator: CodepointAllocator) -> Self {
        Self {
            config,
            allocator,
            compiled: BTreeMap::new(),
        }
    }

    pub fn allocator(&self) -> &CodepointAllocator {
        &self.allocator
    }

    /// Compile one grammar. The grammar is validated first.
    pub fn compile_tile(
        &mut self,
        grammar: &TileGrammar,
        image_path: Option<&str>,
        fallback_char: Option<char>,
    ) -> Result<GlyphOutput> {
        grammar.validate()?;

        let category = TileCategory::parse(&grammar.category);
        if self.config.strict_categories && !category.is_known() {
            return Err(FoundryError::UnknownCategory(grammar.category.clone()));
        }

        let tile_id = grammar.generation_id();
        let glyph_category = category.glyph_category();
        let codepoint = self.allocator.allocate(&tile_id, glyph_category)?;

        let glyph = Glyph {
            id: glyph_id(grammar, &category),
            codepoint,
            fallback_char: fallback_char.unwrap_or_else(|| category.fallback_char()),
            name: glyph_name(grammar),
            category: glyph_category,
            tags: glyph_tags(grammar),
            variant: grammar.subcategory.clone(),
            physics: physics(grammar, &category),
            visual: visual(grammar, &category),
            audio: audio(grammar, &category),
            narrative: narrative(grammar, &category),
            llm: llm(grammar, &category),
            biome_variants: BTreeMap::new(),
        };

        let output = GlyphOutput {
            glyph,
            codepoint,
            tile_id: tile_id.clone(),
            image_path: image_path.map(str::to_string),
            edges: grammar.edges,
            grammar_hash: compute_grammar_hash(grammar)?,
        };
        debug!(tile_id = %tile_id, %codepoint, glyph = %output.glyph.id, "compiled tile");

        self.compiled.insert(tile_id, output.clone());
        Ok(output)
    }

    /// Expand and compile every spec. Per-grammar failures are collected
    /// in `errors`; only an empty input is an error.
    pub fn compile_batch(&mut self, specs: &[TileSpec]) -> Result<CompilationBatch> {
        if specs.is_empty() {
            return Err(FoundryError::EmptyBatch);
        }

        let mut outputs = vec![];
        let mut errors = vec![];

        for spec in specs {
            if let Err(e) = spec.validate() {
                warn!(spec = %spec.id, error = %e, "skipping invalid spec");
                errors.push(format!("Invalid spec {}: {}", spec.id, e));
                continue;
            }

            for grammar in spec.expand() {
                match self.compile_tile(&grammar, None, None) {
                    Ok(output) => outputs.push(output),
                    Err(e) => {
                        let message = format!("Failed to compile {}: {}", grammar.generation_id(), e);
                        warn!("{}", message);
                        errors.push(message);
                    }
                }
            }
        }

        let registry = self.export_registry();
        let batch = CompilationBatch {
            batch_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            registry_json: registry.to_json()?,
            registry_hash: compute_registry_hash(&registry)?,
            outputs,
            errors,
        };

        info!(
            batch_id = %batch.batch_id,
            compiled = batch.success_count(),
            failed = batch.error_count(),
            "compiled batch"
        );
        Ok(batch)
    }

    /// Every glyph compiled so far, ordered by tile id.
    pub fn export_registry(&self) -> GlyphRegistry {
        GlyphRegistry::new(
            self.config.registry_version.clone(),
            self.config.registry_description.clone(),
            self.compiled.values().map(|o| o.glyph.clone()).collect(),
        )
    }

    pub fn export_registry_json(&self) -> Result<String> {
        self.export_registry().to_json()
    }

    pub fn allocation_stats(&self) -> BTreeMap<GlyphCategory, BandStats> {
        self.allocator.get_stats()
    }

    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }

    pub fn compiled(&self) -> impl Iterator<Item = &GlyphOutput> {
        self.compiled.values()
    }

    pub fn get_compiled(&self, tile_id: &str) -> Option<&GlyphOutput> {
        self.compiled.get(tile_id)
    }

    /// Register every compiled tile's edge signature under its tile id.
    pub fn register_edges(&self, edges: &mut EdgeSystem) {
        for output in self.compiled.values() {
            edges.register_tile(&output.tile_id, output.edges);
        }
    }
}

impl Default for TileCompiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

fn corner_suffix(edges: &EdgeSignature) -> Option<&'static str> {
    use EdgeCode::{Empty as O, Solid as X};
    match edges.edges() {
        [X, X, O, O] => Some("corner.ne"),
        [O, X, X, O] => Some("corner.se"),
        [O, O, X, X] => Some("corner.sw"),
        [X, O, O, X] => Some("corner.nw"),
        _ => None,
    }
}

fn glyph_id(grammar: &TileGrammar, category: &TileCategory) -> String {
    let mut parts = vec![grammar.category.clone()];
    if let Some(sub) = &grammar.subcategory {
        parts.push(sub.clone());
    }
    if *category == TileCategory::Wall {
        if let Some(corner) = corner_suffix(&grammar.edges) {
            parts.push(corner.to_string());
        }
    }
    if grammar.damage_state > 0 {
        parts.push(DAMAGE_WORDS[grammar.damage_state as usize].to_string());
    }
    if grammar.moisture_state > 0 {
        parts.push("wet".to_string());
    }
    if grammar.age_state > 0 {
        parts.push(AGE_WORDS[grammar.age_state as usize].to_string());
    }
    parts.join(".")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn glyph_name(grammar: &TileGrammar) -> String {
    let mut parts = vec![];
    if grammar.damage_state > 0 {
        parts.push(capitalize(DAMAGE_WORDS[grammar.damage_state as usize]));
    }
    if grammar.moisture_state > 0 {
        parts.push("Wet".to_string());
    }
    if grammar.age_state > 0 {
        parts.push(capitalize(AGE_WORDS[grammar.age_state as usize]));
    }
    parts.extend(grammar.category.split('_').filter(|w| !w.is_empty()).map(capitalize));
    if let Some(sub) = &grammar.subcategory {
        parts.push(format!("({})", sub));
    }
    parts.join(" ")
}

fn glyph_tags(grammar: &TileGrammar) -> Vec<String> {
    let mut tags = grammar.tags.clone();
    tags.push(grammar.category.clone());

    if grammar.edges.all(EdgeCode::Solid) {
        tags.extend(["solid".to_string(), "opaque".to_string()]);
    } else if grammar.edges.all(EdgeCode::Empty) {
        tags.extend(["passable".to_string(), "transparent".to_string()]);
    }

    if grammar.damage_state > 0 {
        tags.push("damaged".to_string());
    }
    if grammar.moisture_state > 0 {
        tags.push("wet".to_string());
    }
    if grammar.age_state > 0 {
        tags.push("aged".to_string());
    }
    tags.extend(grammar.styles.iter().map(|s| s.as_str().to_string()));

    tags.sort();
    tags.dedup();
    tags
}

fn physics(grammar: &TileGrammar, category: &TileCategory) -> GlyphPhysics {
    let all_solid = grammar.edges.all(EdgeCode::Solid);
    let mut physics = GlyphPhysics {
        walkable: !all_solid,
        blocks_movement: all_solid,
        blocks_light: all_solid,
        ..GlyphPhysics::default()
    };

    match category {
        TileCategory::Fluid | TileCategory::Water => {
            physics.walkable = true;
            physics.blocks_movement = false;
        }
        TileCategory::Lava => {
            physics.walkable = false;
            physics.blocks_movement = true;
            physics.damage_on_enter = 50;
            physics.damage_type = Some("fire".to_string());
        }
        _ => {}
    }

    let mut penalty = if *category == TileCategory::Fluid { 0.3 } else { 0.0 };
    if grammar.moisture_state > 0 {
        penalty += 0.1;
    }
    physics.movement_penalty = f64::clamp(penalty, 0.0, 1.0);

    physics
}

fn visual(grammar: &TileGrammar, category: &TileCategory) -> GlyphVisual {
    let glow = GLOWING_CENTERS.contains(&grammar.center.as_str());
    GlyphVisual {
        layer: category.layer(),
        connectivity: if *category == TileCategory::Wall { "auto" } else { "none" }.to_string(),
        palette: Some(grammar.palette.clone()),
        glow,
        glow_radius: if glow { 2 } else { 0 },
        ..GlyphVisual::default()
    }
}

fn audio(grammar: &TileGrammar, category: &TileCategory) -> GlyphAudio {
    let on_step = if grammar.moisture_state > 0 {
        Some("movement.step.wet")
    } else {
        category.step_sound()
    };
    GlyphAudio {
        on_step: on_step.map(str::to_string),
        ambient: category.ambient_sound().map(str::to_string),
        ..GlyphAudio::default()
    }
}

fn narrative(grammar: &TileGrammar, category: &TileCategory) -> GlyphNarrative {
    let mut parts: Vec<&str> = vec![];
    if grammar.age_state > 0 {
        parts.push(AGE_WORDS[grammar.age_state as usize]);
    }
    if grammar.damage_state > 0 {
        parts.push(DAMAGE_WORDS[grammar.damage_state as usize]);
    }
    if grammar.moisture_state > 0 {
        parts.push("damp");
    }
    parts.push(category.noun(&grammar.category));

    let mut tone = "neutral";
    if *category == TileCategory::Lava {
        tone = "dangerous";
    }
    if grammar.age_state > 1 {
        tone = "ancient";
    }
    if grammar.damage_state > 1 {
        tone = "decay";
    }

    let mut keywords = vec![grammar.category.clone()];
    keywords.extend(grammar.subcategory.clone());

    GlyphNarrative {
        description: format!("{}.", capitalize(&parts.join(" "))),
        tone: tone.to_string(),
        keywords,
        ..GlyphNarrative::default()
    }
}

fn llm(grammar: &TileGrammar, category: &TileCategory) -> GlyphLlm {
    let mut summary: Vec<&str> = vec![];
    if grammar.damage_state > 0 {
        summary.push(DAMAGE_WORDS[grammar.damage_state as usize]);
    }
    if grammar.moisture_state > 0 {
        summary.push("wet");
    }
    summary.push(&grammar.category);
    if let Some(sub) = &grammar.subcategory {
        summary.push(sub);
    }

    let threat = match category {
        TileCategory::Lava => 1.0,
        TileCategory::Fluid => 0.2,
        _ if grammar.damage_state > 1 => 0.1,
        _ => 0.0,
    };

    let mut interest = match category {
        TileCategory::Door | TileCategory::Prop => 0.5,
        _ => 0.1,
    };
    if grammar
        .subcategory
        .as_deref()
        .is_some_and(|s| INTERESTING_SUBCATEGORIES.contains(&s))
    {
        interest = 0.8;
    }

    GlyphLlm {
        summary: summary.join(" "),
        threat,
        interest,
        contexts: grammar.biome_affinity.clone(),
        ..GlyphLlm::default()
    }
}
