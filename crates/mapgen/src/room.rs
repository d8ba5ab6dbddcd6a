use crate::config::GeneratorConfig;
use glam::IVec3;
use gq_common::{Position, RandomSource};
use gq_kernel::{Tile, TileGrid, TileTag, World, glyph};

/// A room as placed by the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomPlan {
    pub anchor: Position,
    /// Floor tiles inside the walls, in row-major order.
    pub interior: Vec<Position>,
    pub is_core: bool,
}

impl RoomPlan {
    /// Euclidean distance between anchors.
    pub fn distance_to(&self, other: Position) -> f64 {
        let d = (other - self.anchor).as_dvec3();
        d.length()
    }
}

/// Something that can stamp itself into the tile grid around an anchor.
pub trait RoomBlueprint {
    fn anchor(&self) -> Position;

    /// Write the room's tiles into `world` and return what was built.
    fn instantiate(&self, world: &mut World, rng: &mut dyn RandomSource) -> RoomPlan;
}

/// Walled rectangle of random size, centred on its anchor.
///
/// A border tile that lands on existing floor becomes a door, so rooms
/// stamped over a corridor open onto it.
#[derive(Debug, Clone)]
pub struct RectangleRoom {
    pub anchor: Position,
    pub size: (i32, i32),
}

impl RectangleRoom {
    pub fn new(anchor: Position, config: &GeneratorConfig) -> Self {
        Self {
            anchor,
            size: config.room_size,
        }
    }
}

impl RoomBlueprint for RectangleRoom {
    fn anchor(&self) -> Position {
        self.anchor
    }

    fn instantiate(&self, world: &mut World, rng: &mut dyn RandomSource) -> RoomPlan {
        let (lo, hi) = self.size;
        let width = rng.range_inclusive(lo, hi);
        let height = rng.range_inclusive(lo, hi);
        let offset = IVec3::new((-width).div_euclid(2), (-height).div_euclid(2), 0);
        let tiles = world.tiles_mut();

        let mut interior = Vec::new();
        for y in 0..=height {
            for x in 0..=width {
                let pos = self.anchor + offset + IVec3::new(x, y, 0);
                let border = x == 0 || y == 0 || x == width || y == height;
                let tile = if border {
                    let on_floor = tiles.get(pos).is_some_and(|t| t.glyph() == glyph::FLOOR);
                    if on_floor {
                        Tile::door(pos).with_tags([TileTag::Room])
                    } else {
                        Tile::wall(pos).with_tags([TileTag::Room])
                    }
                } else {
                    interior.push(pos);
                    Tile::floor(pos).with_tags([TileTag::Room])
                };
                tiles.insert(tile);
            }
        }
        tracing::trace!(anchor = ?self.anchor, width, height, "rectangle room");
        RoomPlan {
            anchor: self.anchor,
            interior,
            is_core: false,
        }
    }
}

/// The fixed room at the origin of every level: stairs, the chute, and on
/// the ground floor the garbage room whose tiles are the win condition.
#[derive(Debug, Clone)]
pub struct CoreRoom {
    pub level: i32,
    pub top_level: i32,
}

pub const CORE_HALF: i32 = 4;
pub const STAIR_X: i32 = 2;
pub const CHUTE: IVec3 = IVec3::new(0, 3, 0);
pub const GARBAGE_DOOR: IVec3 = IVec3::new(0, 1, 0);

impl CoreRoom {
    pub fn new(level: i32, config: &GeneratorConfig) -> Self {
        Self {
            level,
            top_level: config.top_level(),
        }
    }

    fn level_pos(&self, x: i32, y: i32) -> Position {
        IVec3::new(x, y, self.level)
    }

    /// Stair positions alternate sides so a staircase always lands on its
    /// counterpart one level over.
    fn stairs(&self) -> (Option<Position>, Option<Position>) {
        let (up_x, down_x) = if self.level % 2 == 0 {
            (STAIR_X, -STAIR_X)
        } else {
            (-STAIR_X, STAIR_X)
        };
        let up = (self.level < self.top_level).then(|| self.level_pos(up_x, 0));
        let down = (self.level > 0).then(|| self.level_pos(down_x, 0));
        (up, down)
    }

    fn in_garbage_room(x: i32, y: i32) -> bool {
        (-1..=1).contains(&x) && (2..=3).contains(&y)
    }

    fn is_garbage_room_wall(x: i32, y: i32) -> bool {
        (y == 1 && (-2..=2).contains(&x)) || (x.abs() == 2 && (1..=3).contains(&y))
    }
}

impl RoomBlueprint for CoreRoom {
    fn anchor(&self) -> Position {
        self.level_pos(0, 0)
    }

    fn instantiate(&self, world: &mut World, _rng: &mut dyn RandomSource) -> RoomPlan {
        let ground = self.level == 0;
        let (up, down) = self.stairs();
        let mut interior = Vec::new();
        let mut goals = Vec::new();

        let tiles: &mut TileGrid = world.tiles_mut();
        for y in -CORE_HALF..=CORE_HALF {
            for x in -CORE_HALF..=CORE_HALF {
                let pos = self.level_pos(x, y);
                let tile = if x.abs() == CORE_HALF || y.abs() == CORE_HALF {
                    Tile::wall(pos).with_tags([TileTag::Core])
                } else if Some(pos) == up {
                    Tile::stairs_up(pos).with_tags([TileTag::Core])
                } else if Some(pos) == down {
                    Tile::stairs_down(pos).with_tags([TileTag::Core])
                } else if ground && pos == GARBAGE_DOOR {
                    Tile::door(pos).with_tags([TileTag::Core])
                } else if ground && Self::is_garbage_room_wall(x, y) {
                    Tile::wall(pos).with_tags([TileTag::Core])
                } else if ground && Self::in_garbage_room(x, y) {
                    goals.push(pos);
                    Tile::floor(pos).with_tags([TileTag::Core, TileTag::Goal])
                } else if !ground && x == CHUTE.x && y == CHUTE.y {
                    Tile::chute(pos).with_tags([TileTag::Core])
                } else {
                    interior.push(pos);
                    Tile::floor(pos).with_tags([TileTag::Core])
                };
                tiles.insert(tile);
            }
        }
        for pos in goals {
            world.designate_win_tile(pos);
        }
        RoomPlan {
            anchor: self.anchor(),
            interior,
            is_core: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gq_common::SeededRandom;

    fn core(level: i32) -> (World, RoomPlan) {
        let mut world = World::new("core", 0);
        let config = GeneratorConfig::default();
        let plan = CoreRoom::new(level, &config).instantiate(&mut world, &mut SeededRandom::new(0));
        (world, plan)
    }

    fn glyph_at(world: &World, x: i32, y: i32, z: i32) -> char {
        world.tile(IVec3::new(x, y, z)).map(|t| t.glyph()).unwrap_or('?')
    }

    #[test]
    fn ground_core_has_garbage_room_and_up_stairs_only() {
        let (world, plan) = core(0);
        assert_eq!(world.tiles().len(), 81);
        assert_eq!(glyph_at(&world, 2, 0, 0), glyph::STAIRS_UP);
        assert_eq!(glyph_at(&world, -2, 0, 0), glyph::FLOOR);
        assert_eq!(glyph_at(&world, 0, 1, 0), glyph::DOOR_CLOSED);
        assert_eq!(world.win_tiles().len(), 6);
        assert!(world.win_tiles().contains(&IVec3::new(0, 3, 0)));
        assert!(plan.is_core);
        assert!(!plan.interior.iter().any(|p| p.y >= 1 && p.x.abs() <= 2));
    }

    #[test]
    fn stairs_alternate_between_levels() {
        let (one, _) = core(1);
        assert_eq!(glyph_at(&one, -2, 0, 1), glyph::STAIRS_UP);
        assert_eq!(glyph_at(&one, 2, 0, 1), glyph::STAIRS_DOWN);
        assert_eq!(glyph_at(&one, 0, 3, 1), glyph::NO_FLOOR);
        assert!(one.win_tiles().is_empty());

        let (top, _) = core(2);
        assert_eq!(glyph_at(&top, -2, 0, 2), glyph::STAIRS_DOWN);
        assert_eq!(glyph_at(&top, 2, 0, 2), glyph::FLOOR);
    }

    #[test]
    fn core_walls_are_replaceable_floor_is_not() {
        let (world, _) = core(1);
        assert!(world.tile(IVec3::new(4, 0, 1)).unwrap().is_replaceable());
        assert!(!world.tile(IVec3::new(0, 0, 1)).unwrap().is_replaceable());
    }

    #[test]
    fn rectangle_room_shape() {
        let mut world = World::new("room", 0);
        let anchor = IVec3::new(20, 0, 0);
        let room = RectangleRoom {
            anchor,
            size: (5, 5),
        };
        let plan = room.instantiate(&mut world, &mut SeededRandom::new(1));
        // 6x6 footprint, 4x4 inside
        assert_eq!(world.tiles().len(), 36);
        assert_eq!(plan.interior.len(), 16);
        assert!(plan.interior.contains(&anchor));
        assert_eq!(glyph_at(&world, 17, -3, 0), glyph::WALL);
        assert!(world.tile(IVec3::new(17, -3, 0)).unwrap().has_tag(TileTag::Room));
    }

    #[test]
    fn rectangle_border_over_floor_becomes_door() {
        let mut world = World::new("room", 0);
        world.tiles_mut().insert(Tile::floor(IVec3::new(17, 0, 0)));
        let room = RectangleRoom {
            anchor: IVec3::new(20, 0, 0),
            size: (5, 5),
        };
        room.instantiate(&mut world, &mut SeededRandom::new(1));
        assert_eq!(glyph_at(&world, 17, 0, 0), glyph::DOOR_CLOSED);
    }

    #[test]
    fn distance_is_euclidean() {
        let plan = RoomPlan {
            anchor: IVec3::ZERO,
            interior: vec![],
            is_core: false,
        };
        assert!((plan.distance_to(IVec3::new(3, 4, 0)) - 5.0).abs() < 1e-9);
    }
}
