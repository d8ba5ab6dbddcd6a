use gq_common::{ActorId, ActorKind};

/// Misuse of an actor operation. Failed moves are not errors; they return
/// `false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("no actor with id {0}")]
    UnknownActor(ActorId),
    #[error("actor id {0} is already registered")]
    IdInUse(ActorId),
    #[error("{item} ({kind}) cannot be carried")]
    NotCarriable { item: ActorId, kind: ActorKind },
    #[error("{item} is already held by {holder}")]
    AlreadyHeld { item: ActorId, holder: ActorId },
    #[error("{0} cannot pick itself up")]
    SelfGrab(ActorId),
}
