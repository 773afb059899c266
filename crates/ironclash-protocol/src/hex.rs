use serde::{Deserialize, Serialize};

/// Axial coordinates for a hex grid (q, r). The implicit cube coordinate is `s = -q - r`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    #[inline]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    #[inline]
    pub fn distance(self, other: HexCoord) -> u32 {
        (((self.q - other.q).abs() + (self.r - other.r).abs() + (self.s() - other.s()).abs()) / 2)
            as u32
    }

    pub fn neighbor(self, direction: Direction) -> HexCoord {
        let d = direction.offset();
        HexCoord {
            q: self.q + d.q,
            r: self.r + d.r,
        }
    }
}

/// Hex facing, clockwise from north.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    const fn offset(self) -> HexCoord {
        match self {
            Direction::North => HexCoord { q: 0, r: -1 },
            Direction::NorthEast => HexCoord { q: 1, r: -1 },
            Direction::SouthEast => HexCoord { q: 1, r: 0 },
            Direction::South => HexCoord { q: 0, r: 1 },
            Direction::SouthWest => HexCoord { q: -1, r: 1 },
            Direction::NorthWest => HexCoord { q: -1, r: 0 },
        }
    }

    /// Number of hexside turns between two facings (0..=3).
    pub fn turns_to(self, other: Direction) -> u32 {
        let a = self as i32;
        let b = other as i32;
        let diff = (a - b).rem_euclid(6);
        diff.min(6 - diff) as u32
    }
}

/// A hex plus a facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub coord: HexCoord,
    pub facing: Direction,
}

impl Position {
    pub const fn new(coord: HexCoord, facing: Direction) -> Self {
        Self { coord, facing }
    }
}
