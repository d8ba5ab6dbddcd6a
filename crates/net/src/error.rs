use gq_kernel::ActionError;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("cannot {op} while {state}")]
    InvalidState { op: &'static str, state: &'static str },
    #[error("not in a game")]
    NotPlaying,
    #[error("no game with id {0}")]
    UnknownGame(crate::messages::GameId),
    #[error("relay does not accept {0} messages")]
    Unexpected(&'static str),
    #[error(transparent)]
    Action(#[from] ActionError),
}
