//! Edge Vocabulary - What a tile boundary IS
//!
//! Every tile declares one `EdgeCode` per side. Two tiles may touch only
//! when the compatibility table says the facing codes can meet.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FoundryError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCode {
    /// Open space, no content
    #[default]
    Empty,
    /// Impassable wall
    Solid,
    Floor,
    Water,
    /// Elevation change
    Cliff,
    DoorFrame,
    Window,
    Fence,
    Bridge,
    Lava,
    Pit,
    Grass,
    Sand,
    Stone,
    Wood,
    Metal,
}

impl EdgeCode {
    /// All codes in declaration order. The index is the serialized ordinal.
    pub const ALL: [EdgeCode; 16] = [
        EdgeCode::Empty,
        EdgeCode::Solid,
        EdgeCode::Floor,
        EdgeCode::Water,
        EdgeCode::Cliff,
        EdgeCode::DoorFrame,
        EdgeCode::Window,
        EdgeCode::Fence,
        EdgeCode::Bridge,
        EdgeCode::Lava,
        EdgeCode::Pit,
        EdgeCode::Grass,
        EdgeCode::Sand,
        EdgeCode::Stone,
        EdgeCode::Wood,
        EdgeCode::Metal,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Codes that may sit on the far side of an edge carrying `self`.
    ///
    /// The table is read one way only: `a.accepts(b)` says nothing about
    /// `b.accepts(a)`.
    pub fn compatible_codes(self) -> &'static [EdgeCode] {
        use EdgeCode::*;
        match self {
            Empty => &[Empty, Floor, Grass, Sand],
            Solid => &[Solid, Stone, Wood, Metal],
            Floor => &[Floor, Empty, DoorFrame, Grass],
            Water => &[Water, Sand, Bridge],
            Cliff => &[Cliff, Stone, Empty],
            DoorFrame => &[DoorFrame, Floor, Solid],
            Window => &[Window, Solid],
            Fence => &[Fence, Floor, Grass],
            Bridge => &[Bridge, Water, Floor],
            Lava => &[Lava, Stone],
            Pit => &[Pit, Floor, Stone],
            Grass => &[Grass, Floor, Empty, Sand],
            Sand => &[Sand, Water, Grass, Empty],
            Stone => &[Stone, Solid, Cliff, Lava],
            Wood => &[Wood, Solid, Floor],
            Metal => &[Metal, Solid],
        }
    }

    pub fn accepts(self, other: EdgeCode) -> bool {
        self.compatible_codes().contains(&other)
    }

    /// Short human description used in generation prompts.
    pub fn describe(self) -> &'static str {
        match self {
            EdgeCode::Empty => "open/empty",
            EdgeCode::Solid => "solid wall",
            EdgeCode::Floor => "floor level",
            EdgeCode::Water => "water edge",
            EdgeCode::Cliff => "cliff/drop",
            EdgeCode::DoorFrame => "door frame",
            EdgeCode::Window => "window opening",
            EdgeCode::Fence => "fence/railing",
            EdgeCode::Bridge => "bridge connection",
            EdgeCode::Lava => "lava edge",
            EdgeCode::Pit => "pit edge",
            EdgeCode::Grass => "grass edge",
            EdgeCode::Sand => "sand edge",
            EdgeCode::Stone => "stone texture",
            EdgeCode::Wood => "wood texture",
            EdgeCode::Metal => "metal texture",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge codes for the four sides of a tile (NESW).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSignature {
    pub north: EdgeCode,
    pub east: EdgeCode,
    pub south: EdgeCode,
    pub west: EdgeCode,
}

impl EdgeSignature {
    pub fn new(north: EdgeCode, east: EdgeCode, south: EdgeCode, west: EdgeCode) -> Self {
        Self { north, east, south, west }
    }

    pub fn uniform(code: EdgeCode) -> Self {
        Self::new(code, code, code, code)
    }

    pub fn edge(&self, direction: Direction) -> EdgeCode {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }

    pub fn edges(&self) -> [EdgeCode; 4] {
        [self.north, self.east, self.south, self.west]
    }

    pub fn all(&self, code: EdgeCode) -> bool {
        self.edges().iter().all(|&e| e == code)
    }

    /// Rotate clockwise by 90 degrees `times` times. Negative values rotate
    /// counter-clockwise.
    pub fn rotated(&self, times: i32) -> Self {
        let (mut n, mut e, mut s, mut w) = (self.north, self.east, self.south, self.west);
        for _ in 0..times.rem_euclid(4) {
            (n, e, s, w) = (w, n, e, s);
        }
        Self::new(n, e, s, w)
    }

    pub fn flipped_horizontal(&self) -> Self {
        Self::new(self.north, self.west, self.south, self.east)
    }

    pub fn flipped_vertical(&self) -> Self {
        Self::new(self.south, self.east, self.north, self.west)
    }

    /// Can `other` sit on the `direction` side of this tile?
    ///
    /// Checks this tile's edge table against the other tile's facing edge.
    pub fn compatible_with(&self, other: &EdgeSignature, direction: Direction) -> bool {
        let mine = self.edge(direction);
        let theirs = other.edge(direction.opposite());
        mine.accepts(theirs)
    }

    /// Compact code: one uppercase hex digit per side, NESW order.
    pub fn to_code(&self) -> String {
        self.edges()
            .iter()
            .map(|e| format!("{:X}", e.ordinal()))
            .collect()
    }

    pub fn from_code(code: &str) -> Result<Self> {
        let chars: Vec<char> = code.chars().collect();
        if chars.len() != 4 {
            return Err(FoundryError::Format(format!(
                "Edge code must be 4 digits, got {:?}",
                code
            )));
        }

        let mut parsed = [EdgeCode::Empty; 4];
        for (slot, c) in parsed.iter_mut().zip(&chars) {
            *slot = c
                .to_digit(16)
                .and_then(EdgeCode::from_ordinal)
                .ok_or_else(|| {
                    FoundryError::Format(format!("Invalid edge digit {:?} in {:?}", c, code))
                })?;
        }

        Ok(Self::new(parsed[0], parsed[1], parsed[2], parsed[3]))
    }
}

impl fmt::Display for EdgeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EdgeCode::*;

    #[test]
    fn test_to_code_matches_legacy_digits() {
        let sig = EdgeSignature::new(Solid, Empty, Floor, Water);
        assert_eq!(sig.to_code(), "1023");
    }

    #[test]
    fn test_high_codes_use_hex() {
        let sig = EdgeSignature::new(Pit, Grass, Wood, Metal);
        assert_eq!(sig.to_code(), "ABEF");
        assert_eq!(EdgeSignature::from_code("abef").unwrap(), sig);
    }

    #[test]
    fn test_from_code() {
        let sig = EdgeSignature::from_code("1100").unwrap();
        assert_eq!(sig, EdgeSignature::new(Solid, Solid, Empty, Empty));
    }

    #[test]
    fn test_from_code_rejects_bad_input() {
        assert!(matches!(EdgeSignature::from_code("110"), Err(FoundryError::Format(_))));
        assert!(matches!(EdgeSignature::from_code("11000"), Err(FoundryError::Format(_))));
        assert!(matches!(EdgeSignature::from_code("11x0"), Err(FoundryError::Format(_))));
    }

    #[test]
    fn test_rotation() {
        let sig = EdgeSignature::new(Solid, Empty, Floor, Water);
        let rotated = sig.rotated(1);
        assert_eq!(rotated, EdgeSignature::new(Water, Solid, Empty, Floor));
        assert_eq!(sig.rotated(-1), sig.rotated(3));
        assert_eq!(sig.rotated(4), sig);
    }

    #[test]
    fn test_flips() {
        let sig = EdgeSignature::new(Solid, Empty, Floor, Water);
        let h = sig.flipped_horizontal();
        assert_eq!((h.east, h.west), (Water, Empty));
        let v = sig.flipped_vertical();
        assert_eq!((v.north, v.south), (Floor, Solid));
    }

    #[test]
    fn test_wall_connects_to_corner_below() {
        let wall = EdgeSignature::uniform(Solid);
        let corner = EdgeSignature::new(Solid, Solid, Empty, Empty);
        assert!(wall.compatible_with(&corner, Direction::South));
    }

    #[test]
    fn test_compatibility_is_directional() {
        // DOOR_FRAME accepts SOLID, but SOLID does not accept DOOR_FRAME.
        let door = EdgeSignature::uniform(DoorFrame);
        let wall = EdgeSignature::uniform(Solid);
        assert!(door.compatible_with(&wall, Direction::East));
        assert!(!wall.compatible_with(&door, Direction::West));
    }
}
