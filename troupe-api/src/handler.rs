//! # Error Handler
//!
//! An error handler accepts any error returned by a unit of work and decides
//! what to do with it. Work should return an error carrying enough context to
//! be classified by downcasting, e.g. `err.downcast_ref::<MyDomainError>()`.
//!
//! The handler runs synchronously on the actor that executed the work, so a
//! slow handler slows that actor down but no other.

use std::fmt;
use std::sync::Arc;

/// Shared callback invoked with every error returned by a unit of work.
///
/// When a troupe is configured without a handler, work errors are dropped.
#[derive(Clone)]
pub struct ErrorHandler(Arc<dyn Fn(anyhow::Error) + Send + Sync + 'static>);

impl ErrorHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(anyhow::Error) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Hand an error to the callback.
    pub fn handle(&self, err: anyhow::Error) {
        (self.0)(err)
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorHandler(..)")
    }
}
