//! Relay protocol: wire messages and the client session that turns them
//! into world mutations and back.
//!
//! # Invariants
//! - Malformed inbound text never panics; it is logged and dropped.
//! - Every client regenerates the world from the advertised seed. A hash
//!   mismatch is reported and then ignored.
//! - Only changes made by the local client are sent; remote changes are
//!   applied and discarded.
//! - Remote ids win: a local actor whose id collides with a remote one of a
//!   different kind is moved to a fresh id.

pub mod error;
pub mod loopback;
pub mod messages;
pub mod session;

pub use error::ProtocolError;
pub use loopback::{ClientId, LoopbackRelay};
pub use messages::{
    ActorUpdate, EntityDetails, GameId, GameList, GameRequest, GameSummary, Message,
    NameAssignment, RequestDetails, SessionDetails, SpawnDetails, UpdateBundle,
};
pub use session::{Session, SessionEvent, SessionState, coalesce_updates};
