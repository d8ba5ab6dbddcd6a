//! Dungeon generation: a seed in, a fully populated [`World`] out.
//!
//! # Invariants
//! - Same seed and same [`GeneratorConfig`] give the same tiles, the same
//!   content hash, and the same actors under the same ids.
//! - Room placement is bounded by `max_attempts`; generation always ends.
//! - Every door left after generation sits in a wall line between two floors.

pub mod catalog;
pub mod config;
pub mod corridor;
pub mod generator;
pub mod room;

pub use config::GeneratorConfig;
pub use generator::{Dungeon, Generator};
pub use room::{CoreRoom, RectangleRoom, RoomBlueprint, RoomPlan};

use gq_kernel::World;

/// Generate a dungeon with the default layout parameters.
pub fn generate(name: &str, seed: u64) -> World {
    Generator::default().generate(name, seed).world
}
