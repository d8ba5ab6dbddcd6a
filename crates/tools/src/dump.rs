//! Plain-text level dumps.

use glam::IVec3;
use gq_kernel::World;
use std::fmt::Write;

/// Render level `z` one character per tile, top row first. Occupied tiles
/// show their top occupant's kind; empty space is blank. Fog is ignored.
pub fn ascii_level(world: &World, z: i32) -> String {
    let Some((lo, hi)) = world.tiles().level_bounds(z) else {
        return String::new();
    };
    let mut out = String::with_capacity(((hi.x - lo.x + 2) * (hi.y - lo.y + 1)) as usize);
    for y in lo.y..=hi.y {
        let mut row = String::new();
        for x in lo.x..=hi.x {
            let c = match world.tile(IVec3::new(x, y, z)) {
                None => ' ',
                Some(tile) => tile
                    .top_occupant()
                    .and_then(|id| world.actor(id))
                    .and_then(|a| a.kind().default_art().chars().next())
                    .unwrap_or(tile.glyph()),
            };
            row.push(c);
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

/// Every level, highest first, each under a `level z` header.
pub fn ascii_levels(world: &World) -> String {
    let mut out = String::new();
    for z in world.tiles().levels().into_iter().rev() {
        let _ = writeln!(out, "level {z}");
        out.push_str(&ascii_level(world, z));
    }
    out
}
