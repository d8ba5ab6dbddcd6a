use serde::{Deserialize, Serialize};

/// Layout parameters for the dungeon generator.
///
/// Every client must use the same values; they are part of what a seed
/// means. Changing any of them changes the content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of stacked levels. Level 0 is the ground floor.
    pub levels: i32,
    pub rooms_per_level: usize,
    /// Candidate anchors tried per level before giving up on more rooms.
    pub max_attempts: usize,
    /// Anchors closer than this (Euclidean) to an accepted room are rejected.
    pub min_room_distance: f64,
    /// Full corridor width including both walls. Must be odd.
    pub corridor_thickness: i32,
    /// Inclusive bounds for rectangle room width and height.
    pub room_size: (i32, i32),
    /// Inclusive bounds for the number of strides in the anchor random walk.
    pub walk_strides: (i32, i32),
    /// Inclusive bounds for the length of one stride.
    pub stride_length: (i32, i32),
    /// How many earlier rooms each new room is joined to.
    pub connections: usize,
    /// Odds (numerator, denominator) that a room gets a piece of furniture.
    pub furniture_chance: (u32, u32),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            levels: 3,
            rooms_per_level: 6,
            max_attempts: 200,
            min_room_distance: 14.0,
            corridor_thickness: 3,
            room_size: (5, 9),
            walk_strides: (1, 3),
            stride_length: (8, 14),
            connections: 2,
            furniture_chance: (1, 2),
        }
    }
}

impl GeneratorConfig {
    /// Half-width of the corridor band; tiles at exactly this distance from
    /// the centre line are walls.
    pub fn corridor_radius(&self) -> i32 {
        (self.corridor_thickness.max(1) / 2).max(1)
    }

    /// Index of the highest level.
    pub fn top_level(&self) -> i32 {
        self.levels.max(1) - 1
    }
}
