//! Edge System - Adjacency constraints for WFC-style placement
//!
//! Unknown tile IDs never block anything: a partially specified catalog
//! must still be placeable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::edges::{Direction, EdgeCode, EdgeSignature};

/// direction -> neighbor tile ID
pub type Neighbors = BTreeMap<Direction, String>;

/// tile ID -> direction -> compatible tile IDs
pub type AdjacencyRules = BTreeMap<String, BTreeMap<Direction, Vec<String>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSocket {
    pub direction: Direction,
    pub edge_code: EdgeCode,
    pub compatible_codes: Vec<EdgeCode>,
}

impl TileSocket {
    pub fn new(direction: Direction, edge_code: EdgeCode) -> Self {
        Self {
            direction,
            edge_code,
            compatible_codes: edge_code.compatible_codes().to_vec(),
        }
    }

    pub fn accepts(&self, code: EdgeCode) -> bool {
        self.compatible_codes.contains(&code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCompatibility {
    pub tile_id: String,
    pub signature: EdgeSignature,
    pub sockets: BTreeMap<Direction, TileSocket>,
}

impl EdgeCompatibility {
    pub fn new(tile_id: impl Into<String>, signature: EdgeSignature) -> Self {
        let sockets = Direction::ALL
            .into_iter()
            .map(|d| (d, TileSocket::new(d, signature.edge(d))))
            .collect();
        Self {
            tile_id: tile_id.into(),
            signature,
            sockets,
        }
    }

    pub fn socket(&self, direction: Direction) -> &TileSocket {
        // Every direction is populated in `new`.
        &self.sockets[&direction]
    }

    /// Can `other` sit on the `direction` side of this tile?
    pub fn can_connect(&self, other: &EdgeCompatibility, direction: Direction) -> bool {
        self.socket(direction)
            .accepts(other.signature.edge(direction.opposite()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapViolation {
    pub x: usize,
    pub y: usize,
    pub direction: Direction,
    pub message: String,
}

/// Append-only registry of tile edge contracts.
#[derive(Debug, Clone, Default)]
pub struct EdgeSystem {
    tiles: BTreeMap<String, EdgeCompatibility>,
    by_signature: BTreeMap<String, Vec<String>>,
}

impl EdgeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Register (or re-register) a tile. Re-registering replaces the old
    /// signature and moves the tile in the signature index.
    pub fn register_tile(&mut self, tile_id: &str, signature: EdgeSignature) -> &EdgeCompatibility {
        if let Some(previous) = self.tiles.get(tile_id) {
            let old_code = previous.signature.to_code();
            if let Some(ids) = self.by_signature.get_mut(&old_code) {
                ids.retain(|id| id != tile_id);
                if ids.is_empty() {
                    self.by_signature.remove(&old_code);
                }
            }
        }

        let code = signature.to_code();
        debug!(tile_id, signature = %code, "registered tile edges");
        self.by_signature
            .entry(code)
            .or_default()
            .push(tile_id.to_string());

        self.tiles.insert(tile_id.to_string(), EdgeCompatibility::new(tile_id, signature));
        &self.tiles[tile_id]
    }

    pub fn get_tile(&self, tile_id: &str) -> Option<&EdgeCompatibility> {
        self.tiles.get(tile_id)
    }

    pub fn get_by_signature(&self, signature: &EdgeSignature) -> &[String] {
        self.by_signature
            .get(&signature.to_code())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn tile_ids(&self) -> impl Iterator<Item = &str> {
        self.tiles.keys().map(String::as_str)
    }

    /// False only when the tile is registered and some registered
    /// neighbor's facing edge is outside its socket's compatible set.
    pub fn can_place(&self, tile_id: &str, neighbors: &Neighbors) -> bool {
        let Some(tile) = self.tiles.get(tile_id) else {
            return true;
        };

        neighbors.iter().all(|(direction, neighbor_id)| {
            match self.tiles.get(neighbor_id) {
                Some(neighbor) => tile.can_connect(neighbor, *direction),
                None => true,
            }
        })
    }

    /// Every registered tile that fits between `neighbors`.
    ///
    /// Full scan; pre-index by per-direction edge code if catalogs grow
    /// well past a few thousand tiles.
    pub fn get_valid_placements(&self, neighbors: &Neighbors) -> Vec<String> {
        self.tiles
            .keys()
            .filter(|id| self.can_place(id, neighbors))
            .cloned()
            .collect()
    }

    /// Tiles whose facing edge this tile's `direction` socket accepts.
    /// Unknown tiles accept everything.
    pub fn get_compatible_for_direction(&self, tile_id: &str, direction: Direction) -> Vec<String> {
        let Some(tile) = self.tiles.get(tile_id) else {
            return self.tiles.keys().cloned().collect();
        };

        let socket = tile.socket(direction);
        let opposite = direction.opposite();
        self.tiles
            .values()
            .filter(|other| socket.accepts(other.signature.edge(opposite)))
            .map(|other| other.tile_id.clone())
            .collect()
    }

    /// Full adjacency table for an external WFC solver.
    pub fn generate_adjacency_rules(&self) -> AdjacencyRules {
        self.tiles
            .keys()
            .map(|id| {
                let per_direction = Direction::ALL
                    .into_iter()
                    .map(|d| (d, self.get_compatible_for_direction(id, d)))
                    .collect();
                (id.clone(), per_direction)
            })
            .collect()
    }

    /// Check a grid row by row. Each cell checks only its north and west
    /// neighbors, so every shared edge is reported at most once.
    pub fn validate_map(&self, grid: &[Vec<String>]) -> Vec<MapViolation> {
        let mut violations = vec![];

        for (y, row) in grid.iter().enumerate() {
            for (x, tile_id) in row.iter().enumerate() {
                let Some(tile) = self.tiles.get(tile_id) else {
                    continue;
                };

                let north = y
                    .checked_sub(1)
                    .and_then(|ny| grid[ny].get(x))
                    .map(|id| (Direction::North, id));
                let west = x
                    .checked_sub(1)
                    .and_then(|wx| row.get(wx))
                    .map(|id| (Direction::West, id));

                for (direction, neighbor_id) in north.into_iter().chain(west) {
                    if let Some(neighbor) = self.tiles.get(neighbor_id) {
                        if !tile.can_connect(neighbor, direction) {
                            violations.push(MapViolation {
                                x,
                                y,
                                direction,
                                message: format!("{} incompatible with {}", tile_id, neighbor_id),
                            });
                        }
                    }
                }
            }
        }

        violations
    }

    /// Tiles that would fit at `(x, y)` given whichever neighbors exist.
    pub fn suggest_fix(&self, grid: &[Vec<String>], x: usize, y: usize) -> Vec<String> {
        let cell = |cx: usize, cy: usize| grid.get(cy).and_then(|row| row.get(cx)).cloned();

        let mut neighbors = Neighbors::new();
        if let Some(id) = y.checked_sub(1).and_then(|ny| cell(x, ny)) {
            neighbors.insert(Direction::North, id);
        }
        if let Some(id) = cell(x, y + 1) {
            neighbors.insert(Direction::South, id);
        }
        if let Some(id) = x.checked_sub(1).and_then(|wx| cell(wx, y)) {
            neighbors.insert(Direction::West, id);
        }
        if let Some(id) = cell(x + 1, y) {
            neighbors.insert(Direction::East, id);
        }

        self.get_valid_placements(&neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EdgeCode::*;

    fn system() -> EdgeSystem {
        let mut system = EdgeSystem::new();
        system.register_tile("wall.solid", EdgeSignature::uniform(Solid));
        system.register_tile("floor.basic", EdgeSignature::uniform(Floor));
        system.register_tile("wall.corner.ne", EdgeSignature::new(Solid, Solid, Empty, Empty));
        system
    }

    fn neighbors(pairs: &[(Direction, &str)]) -> Neighbors {
        pairs.iter().map(|(d, id)| (*d, id.to_string())).collect()
    }

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_register_tile() {
        let system = system();
        let tile = system.get_tile("wall.solid").unwrap();
        assert_eq!(tile.tile_id, "wall.solid");
        assert_eq!(tile.socket(Direction::North).edge_code, Solid);
        assert_eq!(system.len(), 3);
    }

    #[test]
    fn test_reregister_moves_signature_index() {
        let mut system = system();
        system.register_tile("floor.basic", EdgeSignature::uniform(Grass));
        assert!(system.get_by_signature(&EdgeSignature::uniform(Floor)).is_empty());
        assert_eq!(system.get_by_signature(&EdgeSignature::uniform(Grass)), ["floor.basic"]);
        assert_eq!(system.len(), 3);
    }

    #[test]
    fn test_can_place() {
        let system = system();
        assert!(system.can_place("floor.basic", &neighbors(&[(Direction::North, "floor.basic")])));
        assert!(!system.can_place("wall.solid", &neighbors(&[(Direction::South, "floor.basic")])));
    }

    #[test]
    fn test_unknown_tiles_never_block() {
        let system = system();
        let n = neighbors(&[(Direction::North, "wall.solid"), (Direction::West, "floor.basic")]);
        assert!(system.can_place("nonexistent", &n));
        assert!(system.can_place("wall.solid", &neighbors(&[(Direction::East, "ghost")])));
    }

    #[test]
    fn test_get_compatible() {
        let system = system();
        let south = system.get_compatible_for_direction("wall.solid", Direction::South);
        assert!(south.contains(&"wall.solid".to_string()));
        assert!(south.contains(&"wall.corner.ne".to_string()));
        assert!(!south.contains(&"floor.basic".to_string()));
        assert_eq!(system.get_compatible_for_direction("ghost", Direction::North).len(), 3);
    }

    #[test]
    fn test_valid_placements() {
        let system = system();
        let valid = system.get_valid_placements(&neighbors(&[(Direction::North, "floor.basic")]));
        assert_eq!(valid, vec!["floor.basic".to_string()]);
    }

    #[test]
    fn test_adjacency_rules_shape() {
        let rules = system().generate_adjacency_rules();
        assert!(rules.contains_key("wall.solid"));
        assert_eq!(rules["wall.solid"].len(), 4);
        let json = serde_json::to_value(&rules).unwrap();
        assert!(json["wall.solid"]["north"].is_array());
    }

    #[test]
    fn test_validate_map_reports_each_edge_once() {
        let system = system();
        let map = grid(&[&["wall.solid", "floor.basic"], &["floor.basic", "floor.basic"]]);
        let violations = system.validate_map(&map);

        assert_eq!(violations.len(), 2);
        assert_eq!((violations[0].x, violations[0].y, violations[0].direction), (1, 0, Direction::West));
        assert_eq!((violations[1].x, violations[1].y, violations[1].direction), (0, 1, Direction::North));
    }

    #[test]
    fn test_validate_map_skips_unknown_and_ragged() {
        let system = system();
        let map = grid(&[&["wall.solid", "wall.solid", "wall.solid"], &["ghost", "floor.basic"]]);
        let violations = system.validate_map(&map);
        assert_eq!(violations.len(), 1);
        assert_eq!((violations[0].x, violations[0].y), (1, 1));
        assert!(system.validate_map(&[]).is_empty());
    }

    #[test]
    fn test_suggest_fix() {
        let system = system();
        let map = grid(&[
            &["floor.basic", "floor.basic", "floor.basic"],
            &["floor.basic", "wall.solid", "floor.basic"],
            &["floor.basic", "floor.basic", "floor.basic"],
        ]);
        assert_eq!(system.suggest_fix(&map, 1, 1), vec!["floor.basic".to_string()]);
        // Corner cell only sees its east and south neighbors.
        assert_eq!(system.suggest_fix(&map, 0, 0), vec!["floor.basic".to_string()]);
    }
}
