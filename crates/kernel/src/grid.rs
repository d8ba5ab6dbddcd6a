use crate::tile::Tile;
use glam::IVec3;
use gq_common::Position;
use std::collections::BTreeMap;

const AXIS_BITS: u32 = 21;
const AXIS_BIAS: i64 = 1 << (AXIS_BITS - 1);
const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;

/// A grid coordinate packed into one integer.
///
/// Layout is `z | y | x`, 21 bits each, so ordering by key is level-major
/// then row-major. Coordinates outside `±2^20` have no key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey(u64);

impl TileKey {
    /// Key for `pos`, or `None` when it lies outside the addressable range.
    pub fn pack(pos: Position) -> Option<Self> {
        let bias = |v: i32| {
            let b = v as i64 + AXIS_BIAS;
            (0..(1i64 << AXIS_BITS)).contains(&b).then_some(b as u64)
        };
        let (x, y, z) = (bias(pos.x)?, bias(pos.y)?, bias(pos.z)?);
        Some(Self((z << (2 * AXIS_BITS)) | (y << AXIS_BITS) | x))
    }

    /// Position this key was packed from.
    pub fn unpack(self) -> Position {
        let axis = |shift: u32| ((self.0 >> shift) & AXIS_MASK) as i64 - AXIS_BIAS;
        IVec3::new(
            axis(0) as i32,
            axis(AXIS_BITS) as i32,
            axis(2 * AXIS_BITS) as i32,
        )
    }
}

/// The four same-level neighbours in N, E, S, W order.
pub fn neighbours4(pos: Position) -> [Position; 4] {
    [
        pos + IVec3::NEG_Y,
        pos + IVec3::X,
        pos + IVec3::Y,
        pos + IVec3::NEG_X,
    ]
}

/// Sparse tile store.
///
/// Uses BTreeMap so iteration order is the same on every client; generation
/// passes that walk the grid depend on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileGrid {
    tiles: BTreeMap<TileKey, Tile>,
}

impl TileGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tile at `pos`, or `None` outside generated space.
    pub fn get(&self, pos: Position) -> Option<&Tile> {
        self.tiles.get(&TileKey::pack(pos)?)
    }

    /// Mutable tile at `pos`.
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.tiles.get_mut(&TileKey::pack(pos)?)
    }

    /// Whether a tile exists at `pos`.
    pub fn contains(&self, pos: Position) -> bool {
        self.get(pos).is_some()
    }

    /// Store a tile at its own position, returning whatever it replaced.
    pub fn insert(&mut self, tile: Tile) -> Option<Tile> {
        match TileKey::pack(tile.position()) {
            Some(key) => self.tiles.insert(key, tile),
            None => {
                tracing::warn!(pos = ?tile.position(), "tile outside addressable space dropped");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in key order: level, then row, then column.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }

    /// All tiles on level `z`.
    pub fn level(&self, z: i32) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values().filter(move |t| t.position().z == z)
    }

    /// Inclusive bounding box of level `z`.
    pub fn level_bounds(&self, z: i32) -> Option<(Position, Position)> {
        self.level(z).fold(None, |acc, t| {
            let p = t.position();
            Some(match acc {
                None => (p, p),
                Some((lo, hi)) => (lo.min(p), hi.max(p)),
            })
        })
    }

    /// Distinct level indices, ascending.
    pub fn levels(&self) -> Vec<i32> {
        let mut levels: Vec<i32> = self.tiles.values().map(|t| t.position().z).collect();
        levels.dedup();
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip_on_edges() {
        for pos in [
            IVec3::ZERO,
            IVec3::new(-1, -1, -1),
            IVec3::new(1_048_575, -1_048_576, 3),
            IVec3::new(17, -42, 2),
        ] {
            assert_eq!(TileKey::pack(pos).unwrap().unpack(), pos);
        }
    }

    #[test]
    fn out_of_range_has_no_key() {
        assert!(TileKey::pack(IVec3::new(i32::MIN, 0, 0)).is_none());
        assert!(TileKey::pack(IVec3::new(0, 1 << 20, 0)).is_none());
    }

    #[test]
    fn keys_order_level_major() {
        let low = TileKey::pack(IVec3::new(500, 500, 0)).unwrap();
        let high = TileKey::pack(IVec3::new(-500, -500, 1)).unwrap();
        assert!(low < high);
    }

    #[test]
    fn absent_lookup_is_none() {
        let grid = TileGrid::new();
        assert!(grid.get(IVec3::new(3, 4, 5)).is_none());
        assert!(grid.get(gq_common::OFF_GRID).is_none());
    }

    #[test]
    fn insert_replaces_and_levels_sorted() {
        let mut grid = TileGrid::new();
        grid.insert(Tile::wall(IVec3::new(0, 0, 1)));
        grid.insert(Tile::floor(IVec3::new(0, 0, 0)));
        let old = grid.insert(Tile::floor(IVec3::new(0, 0, 1)));
        assert!(old.is_some_and(|t| t.glyph() == crate::tile::glyph::WALL));
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.levels(), vec![0, 1]);
    }

    #[test]
    fn level_bounds_cover_tiles() {
        let mut grid = TileGrid::new();
        grid.insert(Tile::floor(IVec3::new(-3, 2, 0)));
        grid.insert(Tile::floor(IVec3::new(4, -1, 0)));
        grid.insert(Tile::floor(IVec3::new(90, 90, 1)));
        assert_eq!(
            grid.level_bounds(0),
            Some((IVec3::new(-3, -1, 0), IVec3::new(4, 2, 0)))
        );
        assert!(grid.level_bounds(5).is_none());
    }

    #[test]
    fn neighbours_are_same_level() {
        let n = neighbours4(IVec3::new(0, 0, 2));
        assert!(n.iter().all(|p| p.z == 2));
        assert_eq!(n[0], IVec3::new(0, -1, 2));
        assert_eq!(n[1], IVec3::new(1, 0, 2));
    }
}
