use thiserror::Error;

/// A rejected mutation. The sentence is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("a token cannot be its own head")]
    SelfLoop,

    #[error("invalid target: {0}")]
    InvalidTarget(&'static str),

    #[error("the dependency already exists")]
    DuplicateEdge,

    #[error("no such dependency")]
    NoSuchEdge,

    #[error("tokens are not adjacent")]
    NotAdjacent,

    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

impl GraphError {
    /// Stable short name, suitable for status messages and collaboration payloads.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::SelfLoop => "self-loop",
            GraphError::InvalidTarget(_) => "invalid-target",
            GraphError::DuplicateEdge => "duplicate-edge",
            GraphError::NoSuchEdge => "no-such-edge",
            GraphError::NotAdjacent => "not-adjacent",
            GraphError::InvalidState(_) => "invalid-state",
        }
    }
}
