use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForkError {
    #[error("Fork {fork} does not define capability {capability}")]
    UnknownCapability { fork: String, capability: String },
    #[error("Unknown fork: {0}")]
    UnknownFork(String),
    #[error("Malformed transition {name}: {reason}")]
    MalformedTransition { name: String, reason: String },
    #[error("Fork {0} is already registered")]
    DuplicateFork(String),
    #[error("Transition {0} is already registered with different parameters")]
    DuplicateTransition(String),
    #[error("Invalid fork configuration: {0}")]
    Config(String),
}
