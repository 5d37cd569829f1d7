//! # Troupe Error Types
//!
//! Errors returned synchronously by actors and troupes. None of these are
//! retried by the troupe itself; retry loops belong to the caller.
//!
//! ## Classification
//!
//! - Configuration errors are fatal to the construction attempt.
//! - `ShuttingDown` from a troupe is final: the troupe will never accept work again.
//! - `ShuttingDown` from an actor and `Full` are transient: another actor, or a
//!   later `submit`, may succeed.
//!
//! Errors returned by the work itself never appear here; they are routed to
//! the configured [`ErrorHandler`](crate::ErrorHandler).
//!
//! ## Usage Example
//!
//! ```rust
//! use troupe_api::errors::{ActorError, TroupeError};
//!
//! fn should_retry(error: &TroupeError) -> bool {
//!     match error {
//!         TroupeError::Actor(ActorError::Full { .. }) => true,
//!         other => other.is_retryable(),
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors returned by a single actor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// The actor was constructed with invalid parameters.
    #[error("Invalid actor configuration: {0}")]
    Configuration(String),

    /// The actor has been told to stop and no longer accepts work.
    #[error("Actor is shutting down, no longer accepting work")]
    ShuttingDown,

    /// The actor's mailbox is at capacity.
    #[error("Actor mailbox is full (capacity: {capacity})")]
    Full { capacity: usize },

    /// The OS refused to start the actor's thread.
    #[error("Failed to spawn actor thread: {0}")]
    Spawn(String),
}

impl ActorError {
    /// Whether a later attempt, or an attempt against another actor, may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActorError::ShuttingDown | ActorError::Full { .. })
    }
}

/// Errors returned by a troupe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TroupeError {
    /// The troupe was constructed with invalid bounds.
    #[error("Invalid troupe configuration: {0}")]
    Configuration(String),

    /// The troupe has begun shutting down.
    #[error("Troupe is shutting down")]
    ShuttingDown,

    /// The actor chosen for a submission refused it.
    #[error(transparent)]
    Actor(#[from] ActorError),

    /// Waiting for the actors to finish failed.
    #[error("Failed to join actors: {0}")]
    Join(String),

    /// The troupe's own bookkeeping is inconsistent.
    #[error("Internal troupe error: {0}")]
    Internal(String),
}

impl TroupeError {
    /// Whether resubmitting the same work to this troupe may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TroupeError::Actor(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}

/// A unit of work panicked instead of returning.
///
/// Delivered to the error handler in place of a returned error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Work panicked: {message}")]
pub struct WorkPanic {
    pub message: String,
}

impl WorkPanic {
    /// Build from the payload of a caught panic.
    pub fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "Unknown panic".to_string()
        };
        Self { message }
    }
}
