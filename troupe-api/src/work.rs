//! # Work Units
//!
//! A unit of work is a zero-argument closure returning either success or a
//! domain error. Work is never inspected by the dispatcher; it is owned by
//! whichever actor accepts it and invoked exactly once.

/// Outcome of a single unit of work.
///
/// Errors are never returned to the submitter. They are routed to the
/// troupe's [`ErrorHandler`](crate::ErrorHandler), which can `downcast_ref`
/// to recover a domain-specific error type.
pub type WorkResult = anyhow::Result<()>;

/// A boxed unit of work as stored in an actor's mailbox.
pub type Work = Box<dyn FnOnce() -> WorkResult + Send + 'static>;

