//! Shared types for the Garbage Quest simulation core.
//!
//! # Invariants
//! - Everything here is free of world state; the kernel owns the truth.
//! - Deterministic randomness only ever comes from [`SeededRandom`].

pub mod names;
pub mod random;
pub mod types;

pub use random::{EntropyRandom, RandomSource, SeededRandom};
pub use types::{ActorId, ActorKind, OFF_GRID, Occupancy, Position, UnknownKind};
