use ironclash_protocol::HexCoord;

/// Battlefield queries the phases need. Pathfinding and line of sight live elsewhere.
pub trait BattleMap: Send + Sync + std::fmt::Debug {
    fn contains(&self, coord: HexCoord) -> bool;

    fn distance(&self, a: HexCoord, b: HexCoord) -> u32 {
        a.distance(b)
    }
}

/// Rectangular map of `width` x `height` hexes, 1-based like printed map sheets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexMap {
    pub width: i32,
    pub height: i32,
}

impl HexMap {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl BattleMap for HexMap {
    fn contains(&self, coord: HexCoord) -> bool {
        (1..=self.width).contains(&coord.q) && (1..=self.height).contains(&coord.r)
    }
}
