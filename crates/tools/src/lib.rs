//! Developer Tooling: world inspector and plain-text level dumps.
//!
//! # Invariants
//! - Tools only read; nothing here mutates a world.

pub mod dump;
pub mod inspector;

pub use dump::{ascii_level, ascii_levels};
pub use inspector::{ActorInfo, WorldInspector, WorldSummary};
