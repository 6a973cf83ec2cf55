// Failure taxonomy of the canvas core. None of these is fatal: each one
// degrades to a status message and a safe state.
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    Validation(String),       // Out-of-bounds cell or illegal color index
    NotAuthenticated,         // No bearer token available
    Transport(String),        // Publish while disconnected, or broker-reported error
    MalformedMessage(String), // Inbound payload failed to parse or validate
}

impl Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasError::Validation(s) => write!(f, "invalid pixel: {s}"),
            CanvasError::NotAuthenticated => write!(f, "not authenticated"),
            CanvasError::Transport(s) => write!(f, "transport error: {s}"),
            CanvasError::MalformedMessage(s) => write!(f, "malformed message: {s}"),
        }
    }
}

impl std::error::Error for CanvasError {}

pub type Result<T> = std::result::Result<T, CanvasError>;
