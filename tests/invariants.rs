//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use proptest::prelude::*;

use glyph_foundry::{
    allocator::{Codepoint, CodepointAllocator, GlyphCategory},
    config::CompilerConfig,
    edges::{Direction, EdgeCode, EdgeSignature},
    grammar::{TileGrammar, TileSpec},
    EdgeSystem, FoundryError, GlyphRegistry, Neighbors, TileCompiler,
};

fn neighbors(entries: &[(Direction, &str)]) -> Neighbors {
    entries.iter().map(|(d, id)| (*d, id.to_string())).collect()
}

fn edge_code() -> impl Strategy<Value = EdgeCode> {
    (0u32..16).prop_map(|i| EdgeCode::from_ordinal(i).unwrap())
}

fn signature() -> impl Strategy<Value = EdgeSignature> {
    (edge_code(), edge_code(), edge_code(), edge_code())
        .prop_map(|(n, e, s, w)| EdgeSignature::new(n, e, s, w))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Any signature survives its edge code string.
    #[test]
    fn prop_code_round_trip(sig in signature()) {
        let code = sig.to_code();
        prop_assert_eq!(code.len(), 4);
        prop_assert_eq!(EdgeSignature::from_code(&code).unwrap(), sig);
        prop_assert_eq!(EdgeSignature::from_code(&code.to_lowercase()).unwrap(), sig);
    }

    /// Four quarter turns are the identity.
    #[test]
    fn prop_rotation_group(sig in signature(), turns in -8i32..8) {
        prop_assert_eq!(sig.rotated(4), sig);
        prop_assert_eq!(sig.rotated(1).rotated(1).rotated(1).rotated(1), sig);
        prop_assert_eq!(sig.rotated(turns).rotated(-turns), sig);
        prop_assert_eq!(sig.flipped_horizontal().flipped_horizontal(), sig);
    }

    /// Expansion always yields exactly the advertised number of grammars.
    #[test]
    fn prop_expand_matches_total(
        d in 1u8..=4, l in 1u8..=3, m in 1u8..=2, a in 1u8..=3,
        rotations in any::<bool>(), flips in any::<bool>(), sig in signature(),
    ) {
        let mut spec = TileSpec::new("p", TileGrammar::new("wall", "stone_gray").with_edges(sig))
            .with_variants(d, l, m, a);
        spec.generate_rotations = rotations;
        spec.generate_flips = flips;
        prop_assert!(spec.validate().is_ok());
        prop_assert_eq!(spec.expand().len(), spec.total_variants());
    }
}

#[test]
fn invariant_allocation_idempotent() {
    let mut allocator = CodepointAllocator::new();
    let first = allocator.allocate("tile.x", GlyphCategory::Wall).unwrap();
    let again = allocator.allocate("tile.x", GlyphCategory::Fluid).unwrap();

    assert_eq!(first, again);
    assert!(GlyphCategory::Wall.contains(again));
    assert_eq!(allocator.get_stats()[&GlyphCategory::Fluid].allocated, 0);
}

#[test]
fn invariant_band_isolation() {
    let mut allocator = CodepointAllocator::new();
    for i in 0..10 {
        allocator.allocate(&format!("wall.{}", i), GlyphCategory::Wall).unwrap();
        allocator.allocate(&format!("floor.{}", i), GlyphCategory::Ground).unwrap();
    }

    let ground = allocator.allocations_in(GlyphCategory::Ground);
    assert_eq!(ground.len(), 10);
    assert!(ground.iter().all(|(id, _)| id.starts_with("floor.")));
    assert!(ground.iter().all(|(_, cp)| !GlyphCategory::Wall.contains(*cp)));
}

#[test]
fn invariant_band_exhaustion_is_hard_failure() {
    let mut allocator = CodepointAllocator::new();
    for i in 0..256 {
        allocator.allocate(&format!("door.{}", i), GlyphCategory::Door).unwrap();
    }

    let stats = allocator.get_stats()[&GlyphCategory::Door];
    assert_eq!((stats.allocated, stats.remaining, stats.total), (256, 0, 256));
    assert_eq!(allocator.get_allocated("door.255"), Some(Codepoint::new(0xE3FF)));

    let err = allocator.allocate("door.256", GlyphCategory::Door).unwrap_err();
    assert!(matches!(err, FoundryError::RangeExhausted { category: GlyphCategory::Door, .. }));

    // Other bands are unaffected, and known ids still resolve.
    assert!(allocator.allocate("wall.0", GlyphCategory::Wall).is_ok());
    assert!(allocator.allocate("door.7", GlyphCategory::Door).is_ok());
}

#[test]
fn invariant_combinatorial_counts() {
    let grammar = TileGrammar::new("floor", "stone_gray");
    let spec = TileSpec::new("floors", grammar.clone()).with_variants(4, 3, 2, 1);
    assert_eq!(spec.total_variants(), 24);
    assert_eq!(spec.expand().len(), 24);

    let rotated = TileSpec::new("single", grammar).with_rotations();
    assert_eq!(rotated.total_variants(), 4);
    assert_eq!(rotated.clone().with_flips().total_variants(), 8);
}

#[test]
fn invariant_unknown_tiles_are_permissive() {
    let mut edges = EdgeSystem::new();
    edges.register_tile("wall.solid", EdgeSignature::uniform(EdgeCode::Solid));

    assert!(edges.can_place("nonexistent_id", &neighbors(&[(Direction::North, "wall.solid")])));
    assert!(edges.can_place("wall.solid", &neighbors(&[(Direction::East, "nonexistent_id")])));
    assert!(edges.can_place("nonexistent_id", &Neighbors::new()));
    assert_eq!(edges.get_compatible_for_direction("nonexistent_id", Direction::South), vec!["wall.solid"]);
}

#[test]
fn invariant_compatibility_follows_table() {
    let mut edges = EdgeSystem::new();
    edges.register_tile("wall.solid", EdgeSignature::uniform(EdgeCode::Solid));
    edges.register_tile("floor.basic", EdgeSignature::uniform(EdgeCode::Floor));
    edges.register_tile("wall.stone", EdgeSignature::uniform(EdgeCode::Stone));

    assert!(edges.can_place("floor.basic", &neighbors(&[(Direction::North, "floor.basic")])));
    assert!(!edges.can_place("wall.solid", &neighbors(&[(Direction::South, "floor.basic")])));
    assert!(edges.can_place("wall.solid", &neighbors(&[(Direction::West, "wall.stone")])));

    let placements = edges.get_valid_placements(&neighbors(&[(Direction::North, "wall.solid")]));
    assert_eq!(placements, vec!["wall.solid", "wall.stone"]);
}

#[test]
fn invariant_map_violations_reported_once() {
    let mut edges = EdgeSystem::new();
    edges.register_tile("wall.solid", EdgeSignature::uniform(EdgeCode::Solid));
    edges.register_tile("floor.basic", EdgeSignature::uniform(EdgeCode::Floor));

    let grid: Vec<Vec<String>> = vec![
        vec!["wall.solid".into(), "floor.basic".into()],
        vec!["floor.basic".into(), "floor.basic".into()],
    ];
    let violations = edges.validate_map(&grid);
    assert_eq!(violations.len(), 2);
}

#[test]
fn invariant_batch_partial_failure() {
    let config = CompilerConfig { strict_categories: true, ..CompilerConfig::default() };
    let mut compiler = TileCompiler::new(config);

    let specs = vec![
        TileSpec::new("walls", TileGrammar::new("wall", "stone_gray")),
        TileSpec::new("statues", TileGrammar::new("statue", "stone_gray")),
        TileSpec::new("floors", TileGrammar::new("floor", "stone_gray")),
    ];
    let batch = compiler.compile_batch(&specs).unwrap();

    assert_eq!(batch.outputs.len(), 2);
    assert_eq!(batch.errors.len(), 1);
    assert!(batch.errors[0].starts_with("Failed to compile statue.base"));

    let registry = GlyphRegistry::from_json(&batch.registry_json).unwrap();
    assert_eq!(registry.glyphs.len(), 2);
}

#[test]
fn invariant_registry_export_contract() {
    let mut compiler = TileCompiler::default();
    let grammar = TileGrammar::new("wall", "stone_gray").with_edges(EdgeSignature::uniform(EdgeCode::Solid));
    compiler.compile_tile(&grammar, None, None).unwrap();

    let json: serde_json::Value = serde_json::from_str(&compiler.export_registry_json().unwrap()).unwrap();
    assert_eq!(json["version"], "1.0.0");
    assert_eq!(json["description"], "Auto-generated glyph registry from tile compiler");

    let glyph = &json["glyphs"][0];
    assert_eq!(glyph["codepoint"], "U+E200");
    assert_eq!(glyph["char"], "#");
    assert_eq!(glyph["category"], "wall");
    assert_eq!(glyph["visual"]["layer"], 1);
    for facet in ["physics", "visual", "audio", "narrative", "llm"] {
        assert!(glyph[facet].is_object(), "missing facet {}", facet);
    }
}

#[test]
fn invariant_shipped_pack_compiles_cleanly() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("packs");
    let packs = glyph_foundry::GrammarPackRegistry::load_from_dir(&dir).unwrap();
    let pack = packs.get("dungeon").unwrap();
    glyph_foundry::packs::check_engine_version(pack).unwrap();
    assert_eq!(pack.tile_count(), 35);

    let mut compiler = TileCompiler::default();
    let batch = compiler.compile_batch(&pack.specs).unwrap();
    assert!(batch.errors.is_empty(), "{:?}", batch.errors);
    assert_eq!(batch.outputs.len(), 35);

    let mut edges = EdgeSystem::new();
    compiler.register_edges(&mut edges);
    let rules = edges.generate_adjacency_rules();
    assert_eq!(rules.len(), compiler.compiled_count());
}
