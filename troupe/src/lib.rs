//! # Troupe
//!
//! A pool of thread-backed actors. Each actor owns a bounded mailbox and runs
//! its work strictly one item at a time; a [`Troupe`] decides which actor
//! receives each submitted unit of work, growing its population on demand up
//! to a bound, and coordinates a draining shutdown.
//!
//! ```rust
//! use troupe::{Troupe, TroupeConfig};
//!
//! let troupe = Troupe::new(TroupeConfig::dynamic(1, 4).with_mailbox_size(16))?;
//! troupe.submit(|| {
//!     println!("hello from an actor");
//!     Ok(())
//! })?;
//! troupe.shutdown()?;
//! troupe.join();
//! # Ok::<(), troupe::TroupeError>(())
//! ```

pub mod actor;
pub mod config;
pub mod error;
pub mod logging;
pub mod mailbox;
pub mod pool;
pub mod roster;

// Re-export key types for easier usage
pub use actor::{Actor, ActorId, ActorStats, ActorStatus};
pub use config::{ActorConfig, TroupeConfig, TroupeMode, DEFAULT_MAILBOX_SIZE};
pub use error::MailboxError;
pub use pool::{Troupe, TroupeMetrics};
pub use troupe_api::errors::{ActorError, TroupeError, WorkPanic};
pub use troupe_api::handler::ErrorHandler;
pub use troupe_api::work::{Work, WorkResult};
