//! Error taxonomy for engine operations.

use crate::EngineKind;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the process adapter and the session manager.
///
/// Only [`EngineError::Timeout`] is worth retrying; nothing here is retried
/// automatically.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The executable is missing, not executable, or did not finish the UCI handshake.
    #[error("Failed to launch engine {}: {reason}", path.display())]
    Launch { path: PathBuf, reason: String },
    /// The engine rejected an option or answered outside the protocol.
    #[error("Engine protocol error: {0}")]
    Protocol(String),
    /// No answer within the wall-clock ceiling. The engine stays alive.
    #[error("Engine did not complete {operation} within {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    /// The subprocess exited while a request was in flight.
    #[error("Engine process terminated: {0}")]
    Crash(String),
    /// No live engine matches the request.
    #[error("No {0} engine available")]
    NoEngineAvailable(EngineKind),
}

impl EngineError {
    /// Whether the same request may succeed if issued again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Timeout { .. })
    }

    /// Whether the engine that served the request is gone.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineError::Crash(_) | EngineError::NoEngineAvailable(_)
        )
    }
}
