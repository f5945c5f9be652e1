//! Generation Prompt - The grammar, restated as constraints for an image generator
//!
//! The prompt is derived from the grammar alone and is deterministic.

use serde::{Deserialize, Serialize};

use crate::edges::Direction;
use crate::grammar::{TileGrammar, AGE_WORDS, DAMAGE_WORDS, LIGHTING_WORDS};
use crate::palette::{Palette, PaletteProvider};

const CONSTRAINTS: [&str; 6] = [
    "Exact pixel resolution, no anti-aliasing",
    "Only use specified palette colors",
    "No gradients or smooth shading",
    "No perspective - flat orthographic view",
    "Edge pixels must match declared edge codes",
    "Center texture must be consistent",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPrompt {
    pub generation_id: String,
    pub palette: String,
    pub text: String,
}

impl GenerationPrompt {
    /// Build with the grammar's palette as lit for its lighting state.
    pub fn for_grammar(grammar: &TileGrammar, palettes: &dyn PaletteProvider) -> Self {
        let palette = palettes.palette_for(&grammar.palette, grammar.lighting_state);
        Self::build(grammar, palette.as_ref())
    }

    pub fn build(grammar: &TileGrammar, palette: Option<&Palette>) -> Self {
        let (width, height) = grammar.size.dimensions();
        let palette_desc = palette
            .map(describe_palette)
            .unwrap_or_else(|| "grayscale 4-color".to_string());

        let edges = Direction::ALL
            .iter()
            .map(|d| format!("{}={}", capitalize(d.as_str()), grammar.edges.edge(*d).describe()))
            .collect::<Vec<_>>()
            .join(", ");
        let styles = grammar
            .styles
            .iter()
            .map(|s| s.describe())
            .collect::<Vec<_>>()
            .join(", ");

        let mut lines = vec![
            format!("Generate a {}×{} pixel tile.", width, height),
            format!(
                "Category: {} ({}).",
                grammar.category,
                grammar.subcategory.as_deref().unwrap_or("base")
            ),
            format!("Center content: {}.", grammar.center),
            format!("Palette: {}.", palette_desc),
            format!("Edge requirements: {}.", edges),
            format!("Style: {}.", styles),
        ];

        let states = describe_states(grammar);
        if !states.is_empty() {
            lines.push(format!("State modifiers: {}.", states.join(", ")));
        }

        lines.push("CONSTRAINTS:".to_string());
        lines.extend(CONSTRAINTS.iter().map(|c| format!("- {}", c)));

        if !grammar.tags.is_empty() {
            lines.push(format!("Tags for reference: {}", grammar.tags.join(", ")));
        }

        Self {
            generation_id: grammar.generation_id(),
            palette: grammar.palette.clone(),
            text: lines.join("\n"),
        }
    }
}

fn describe_palette(palette: &Palette) -> String {
    let hexes: Vec<String> = palette.to_hex_list().into_iter().take(4).collect();
    format!("{} ({} colors: {})", palette.name, palette.color_count(), hexes.join(", "))
}

fn describe_states(grammar: &TileGrammar) -> Vec<String> {
    let mut parts = vec![];
    if grammar.damage_state > 0 {
        parts.push(format!("damage={}", DAMAGE_WORDS[grammar.damage_state as usize]));
    }
    if grammar.lighting_state != 1 {
        parts.push(format!("lighting={}", LIGHTING_WORDS[grammar.lighting_state as usize]));
    }
    if grammar.moisture_state > 0 {
        parts.push("wet/damp".to_string());
    }
    if grammar.age_state > 0 {
        parts.push(format!("age={}", AGE_WORDS[grammar.age_state as usize]));
    }
    parts
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
