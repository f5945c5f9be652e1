//! Codepoint Allocation - Stable, band-scoped identifiers
//!
//! Each glyph category owns a contiguous Private Use Area band. Counters
//! only move forward; a full band is a hard failure, never a wraparound.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{FoundryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphCategory {
    Empty,
    Ground,
    Wall,
    Door,
    Fluid,
    Prop,
    Item,
    Entity,
    Effect,
    Ui,
    Overlay,
    Animation,
}

impl GlyphCategory {
    pub const ALL: [GlyphCategory; 12] = [
        GlyphCategory::Empty,
        GlyphCategory::Ground,
        GlyphCategory::Wall,
        GlyphCategory::Door,
        GlyphCategory::Fluid,
        GlyphCategory::Prop,
        GlyphCategory::Item,
        GlyphCategory::Entity,
        GlyphCategory::Effect,
        GlyphCategory::Ui,
        GlyphCategory::Overlay,
        GlyphCategory::Animation,
    ];

    /// Inclusive codepoint band reserved for this category.
    pub fn band(self) -> (u32, u32) {
        match self {
            GlyphCategory::Empty => (0xE000, 0xE0FF),
            GlyphCategory::Ground => (0xE100, 0xE1FF),
            GlyphCategory::Wall => (0xE200, 0xE2FF),
            GlyphCategory::Door => (0xE300, 0xE3FF),
            GlyphCategory::Fluid => (0xE400, 0xE4FF),
            GlyphCategory::Prop => (0xE500, 0xE5FF),
            GlyphCategory::Item => (0xE600, 0xE6FF),
            GlyphCategory::Entity => (0xE700, 0xE7FF),
            GlyphCategory::Effect => (0xE800, 0xE8FF),
            GlyphCategory::Ui => (0xE900, 0xE9FF),
            GlyphCategory::Overlay => (0xEA00, 0xEAFF),
            GlyphCategory::Animation => (0xEB00, 0xEBFF),
        }
    }

    pub fn band_size(self) -> u32 {
        let (start, end) = self.band();
        end - start + 1
    }

    pub fn contains(self, codepoint: Codepoint) -> bool {
        let (start, end) = self.band();
        (start..=end).contains(&codepoint.value())
    }

    /// Which band a codepoint falls in, if any.
    pub fn for_codepoint(codepoint: Codepoint) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.contains(codepoint))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GlyphCategory::Empty => "empty",
            GlyphCategory::Ground => "ground",
            GlyphCategory::Wall => "wall",
            GlyphCategory::Door => "door",
            GlyphCategory::Fluid => "fluid",
            GlyphCategory::Prop => "prop",
            GlyphCategory::Item => "item",
            GlyphCategory::Entity => "entity",
            GlyphCategory::Effect => "effect",
            GlyphCategory::Ui => "ui",
            GlyphCategory::Overlay => "overlay",
            GlyphCategory::Animation => "animation",
        }
    }
}

impl fmt::Display for GlyphCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Unicode codepoint, written `U+XXXX` on every boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Codepoint(u32);

impl Codepoint {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn parse(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix("U+")
            .ok_or_else(|| FoundryError::Format(format!("Codepoint must start with U+: {:?}", s)))?;
        u32::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|_| FoundryError::Format(format!("Invalid codepoint: {:?}", s)))
    }

    pub fn as_char(self) -> Option<char> {
        char::from_u32(self.0)
    }
}

impl fmt::Display for Codepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U+{:04X}", self.0)
    }
}

impl From<Codepoint> for String {
    fn from(cp: Codepoint) -> Self {
        cp.to_string()
    }
}

impl TryFrom<String> for Codepoint {
    type Error = FoundryError;

    fn try_from(s: String) -> Result<Self> {
        Codepoint::parse(&s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandStats {
    pub allocated: u32,
    pub remaining: u32,
    pub total: u32,
}

/// Allocates codepoints per category band.
///
/// Single owner: mutation goes through `&mut self`, so two tile IDs can
/// never race for the same counter value.
#[derive(Debug, Clone)]
pub struct CodepointAllocator {
    counters: BTreeMap<GlyphCategory, u32>,
    allocated: BTreeMap<String, Codepoint>,
}

impl CodepointAllocator {
    pub fn new() -> Self {
        let counters = GlyphCategory::ALL
            .into_iter()
            .map(|c| (c, c.band().0))
            .collect();
        Self {
            counters,
            allocated: BTreeMap::new(),
        }
    }

    /// Allocate a codepoint for `tile_id`.
    ///
    /// Repeat calls return the first allocation, whatever category they pass.
    pub fn allocate(&mut self, tile_id: &str, category: GlyphCategory) -> Result<Codepoint> {
        if let Some(existing) = self.allocated.get(tile_id) {
            return Ok(*existing);
        }

        let (start, end) = category.band();
        let counter = self.counters.entry(category).or_insert(start);
        if *counter > end {
            warn!(%category, tile_id, "codepoint band exhausted");
            return Err(FoundryError::RangeExhausted { category, start, end });
        }

        let codepoint = Codepoint::new(*counter);
        *counter += 1;
        self.allocated.insert(tile_id.to_string(), codepoint);
        debug!(tile_id, %codepoint, %category, "allocated codepoint");

        Ok(codepoint)
    }

    pub fn get_allocated(&self, tile_id: &str) -> Option<Codepoint> {
        self.allocated.get(tile_id).copied()
    }

    /// Allocations whose codepoint lies inside `category`'s band.
    pub fn allocations_in(&self, category: GlyphCategory) -> Vec<(&str, Codepoint)> {
        self.allocated
            .iter()
            .filter(|(_, cp)| category.contains(**cp))
            .map(|(id, cp)| (id.as_str(), *cp))
            .collect()
    }

    pub fn get_stats(&self) -> BTreeMap<GlyphCategory, BandStats> {
        GlyphCategory::ALL
            .into_iter()
            .map(|category| {
                let (start, end) = category.band();
                let current = self.counters.get(&category).copied().unwrap_or(start);
                let stats = BandStats {
                    allocated: current - start,
                    remaining: (end + 1).saturating_sub(current),
                    total: end - start + 1,
                };
                (category, stats)
            })
            .collect()
    }
}

impl Default for CodepointAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codepoint_format() {
        assert_eq!(Codepoint::new(0xE200).to_string(), "U+E200");
        assert_eq!(Codepoint::parse("U+E2A0").unwrap(), Codepoint::new(0xE2A0));
        assert!(Codepoint::parse("E200").is_err());
        assert!(Codepoint::parse("U+ZZZZ").is_err());
    }

    #[test]
    fn test_codepoint_serializes_as_string() {
        let json = serde_json::to_string(&Codepoint::new(0xE101)).unwrap();
        assert_eq!(json, r#""U+E101""#);
        let back: Codepoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Codepoint::new(0xE101));
    }

    #[test]
    fn test_sequential_allocation() {
        let mut alloc = CodepointAllocator::new();
        let a = alloc.allocate("wall.a", GlyphCategory::Wall).unwrap();
        let b = alloc.allocate("wall.b", GlyphCategory::Wall).unwrap();
        assert_eq!(a.to_string(), "U+E200");
        assert_eq!(b.to_string(), "U+E201");
    }

    #[test]
    fn test_first_category_wins() {
        let mut alloc = CodepointAllocator::new();
        let first = alloc.allocate("tile.x", GlyphCategory::Wall).unwrap();
        let second = alloc.allocate("tile.x", GlyphCategory::Fluid).unwrap();
        assert_eq!(first, second);
        assert_eq!(alloc.get_stats()[&GlyphCategory::Fluid].allocated, 0);
    }

    #[test]
    fn test_band_lookup() {
        assert_eq!(
            GlyphCategory::for_codepoint(Codepoint::new(0xE4FF)),
            Some(GlyphCategory::Fluid)
        );
        assert_eq!(GlyphCategory::for_codepoint(Codepoint::new(0x41)), None);
    }

    #[test]
    fn test_stats_initial() {
        let stats = CodepointAllocator::new().get_stats();
        assert_eq!(stats.len(), 12);
        let wall = stats[&GlyphCategory::Wall];
        assert_eq!((wall.allocated, wall.remaining, wall.total), (0, 256, 256));
    }
}
