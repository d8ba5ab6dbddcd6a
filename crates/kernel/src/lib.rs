//! World Kernel: the tile grid, actor registry, movement rules and the
//! logical clock that drives falling and door closing.
//!
//! # Invariants
//! - Every on-grid actor is referenced by exactly one tile, in the slot its
//!   kind dictates. Hidden actors are referenced by none.
//! - A tile holds at most one blocking actor and at most one ground item.
//! - Actor ids are never reused within a world.
//! - All state mutations flow through explicit operations on [`World`] and
//!   are recorded as [`WorldEvent`]s.
//! - Iteration over tiles and actors is ordered, so two worlds built from the
//!   same operations walk their contents identically.

pub mod actor;
pub mod config;
pub mod error;
pub mod grid;
pub mod movement;
pub mod schedule;
pub mod tile;
pub mod world;

pub use actor::{Actor, ActorSpec, InteractHook, VerticalStatus};
pub use config::SimConfig;
pub use error::ActionError;
pub use grid::{TileGrid, TileKey, neighbours4};
pub use movement::Interaction;
pub use schedule::{ScheduledTask, Scheduler, TaskKind};
pub use tile::{Tile, TileTag, glyph};
pub use world::{World, WorldEvent, hash_tiles};
