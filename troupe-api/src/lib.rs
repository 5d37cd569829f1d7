//! # Troupe API
//!
//! The caller-facing contract of the troupe actor pool. A troupe is a set of
//! actors, each with its own bounded mailbox, coordinated by a dispatcher that
//! decides which actor receives each submitted unit of work.
//!
//! This crate holds only what callers need to speak to a troupe:
//!
//! - [`work`]: the shape of a unit of work
//! - [`handler`]: the callback that receives errors returned by work
//! - [`errors`]: the error taxonomy returned by actors and troupes
//!
//! The implementation lives in the `troupe` crate.

pub mod errors;
pub mod handler;
pub mod work;

pub use errors::{ActorError, TroupeError, WorkPanic};
pub use handler::ErrorHandler;
pub use work::{Work, WorkResult};
