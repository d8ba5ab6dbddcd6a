use glam::IVec3;
use gq_common::{Position, RandomSource};
use gq_kernel::{Tile, TileGrid, TileTag, glyph, neighbours4};

enum Carve {
    Floor,
    Wall,
    Door,
    Keep,
}

fn corridor_floor(pos: Position) -> Tile {
    let mut tile = Tile::floor(pos).with_tags([TileTag::Corridor]);
    tile.set_replaceable(true);
    tile
}

fn corridor_wall(pos: Position) -> Tile {
    Tile::wall(pos).with_tags([TileTag::Corridor])
}

/// Carve one cross-section of corridor centred on `centre`.
///
/// Floor goes where the Chebyshev distance is below `radius`, walls where
/// it equals `radius`. Nothing non-replaceable is touched. Breaking into a
/// room or core wall leaves a door; walls are only added where nothing was.
fn carve_band(tiles: &mut TileGrid, centre: Position, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let pos = centre + IVec3::new(dx, dy, 0);
            let dist = dx.abs().max(dy.abs());
            let carve = match tiles.get(pos) {
                None if dist < radius => Carve::Floor,
                None => Carve::Wall,
                Some(_) if dist == radius => Carve::Keep,
                Some(t) if !t.is_replaceable() || t.is_door() || t.glyph() != glyph::WALL => {
                    Carve::Keep
                }
                Some(t) if t.has_tag(TileTag::Room) || t.has_tag(TileTag::Core) => Carve::Door,
                Some(_) => Carve::Floor,
            };
            match carve {
                Carve::Floor => tiles.insert(corridor_floor(pos)),
                Carve::Wall => tiles.insert(corridor_wall(pos)),
                Carve::Door => tiles.insert(Tile::door(pos).with_tags([TileTag::Corridor])),
                Carve::Keep => None,
            };
        }
    }
}

/// Join `from` and `to` (same level) with an elbow-routed corridor.
///
/// Starts on a random axis and turns when the remaining offset along that
/// axis reaches zero. Returns the centre-line tiles in walking order.
pub fn carve_corridor(
    tiles: &mut TileGrid,
    from: Position,
    to: Position,
    radius: i32,
    rng: &mut dyn RandomSource,
) -> Vec<Position> {
    let mut along_x = rng.chance(1, 2);
    let mut cursor = from;
    let mut path = vec![cursor];
    carve_band(tiles, cursor, radius);

    while cursor.x != to.x || cursor.y != to.y {
        let delta = to - cursor;
        if along_x && delta.x == 0 {
            along_x = false;
        } else if !along_x && delta.y == 0 {
            along_x = true;
        }
        let step = if along_x {
            IVec3::new(delta.x.signum(), 0, 0)
        } else {
            IVec3::new(0, delta.y.signum(), 0)
        };
        cursor += step;
        carve_band(tiles, cursor, radius);
        path.push(cursor);
    }
    tracing::trace!(?from, ?to, len = path.len(), "corridor");
    path
}

/// Whether a door at `pos` separates two walls from two floors.
fn door_is_valid(tiles: &TileGrid, pos: Position) -> bool {
    let [n, e, s, w] = neighbours4(pos).map(|p| tiles.get(p));
    let wall = |t: Option<&Tile>| t.is_some_and(|t| t.glyph() == glyph::WALL);
    let floor = |t: Option<&Tile>| t.is_some_and(|t| t.is_passable() && t.has_floor());
    (wall(e) && wall(w) && floor(n) && floor(s)) || (wall(n) && wall(s) && floor(e) && floor(w))
}

/// Demote every door that does not sit in a wall line between two floors.
/// Returns how many were demoted.
pub fn validate_doors(tiles: &mut TileGrid) -> usize {
    let doors: Vec<Position> = tiles
        .iter()
        .filter(|t| t.is_door())
        .map(Tile::position)
        .collect();
    let mut demoted = 0;
    for pos in doors {
        if door_is_valid(tiles, pos) {
            continue;
        }
        if let Some(tile) = tiles.get_mut(pos) {
            tile.demote_to_floor();
            demoted += 1;
        }
    }
    demoted
}
