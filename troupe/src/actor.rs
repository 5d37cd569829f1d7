//! # Actor
//!
//! An actor owns one bounded mailbox and one dedicated thread that executes
//! queued work strictly one item at a time, in FIFO order.
//!
//! ## State Machine
//!
//! ```text
//!   Idle ──dequeue──▶ Executing ──return──▶ Idle
//!    │                    ▲  │
//!  stop()             dequeue return
//!    ▼                    │  ▼
//!   Draining ─────────────┘ Draining ──mailbox empty──▶ Terminated
//! ```
//!
//! The state lives in a single atomic cell written only by the actor's own
//! thread. `Executing` is exactly the "busy" state: it is entered right after
//! an item is dequeued and left right after that item (and the error handler,
//! if it ran) returns.
//!
//! ## Shutdown
//!
//! `stop()` latches the shutdown flag and closes the mailbox. Any `accept`
//! that completed before the close is still executed: the loop keeps pulling
//! from the mailbox until it is both closed and empty, and only then
//! terminates. `accept` after `stop()` fails with `ActorError::ShuttingDown`.
//!
//! All observations (`is_busy`, `is_shutdown`, `last_accepted`, ...) are
//! lock-free reads and may be stale by the time the caller acts on them.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};
use troupe_api::errors::{ActorError, WorkPanic};
use troupe_api::handler::ErrorHandler;
use troupe_api::work::{Work, WorkResult};

use crate::config::ActorConfig;
use crate::mailbox::{self, Inbox, Mailbox};
use crate::{log_error, log_lifecycle, logging};

/// Identity of an actor, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution state of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorStatus {
    /// Waiting for work
    Idle = 0,

    /// Running one unit of work
    Executing = 1,

    /// Stopped, still working through queued items
    Draining = 2,

    /// Loop has exited; absorbing
    Terminated = 3,
}

impl ActorStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ActorStatus::Idle,
            1 => ActorStatus::Executing,
            2 => ActorStatus::Draining,
            _ => ActorStatus::Terminated,
        }
    }
}

/// Point-in-time view of an actor
#[derive(Debug, Clone)]
pub struct ActorStats {
    pub id: ActorId,
    pub status: ActorStatus,
    pub queued: usize,
    pub capacity: usize,
    pub last_accepted: Option<Instant>,
    pub last_finished: Option<Instant>,
}

/// Cells shared between the actor handle and its thread.
///
/// `status` and `last_finished` are written only by the thread,
/// `last_accepted` only by `accept`, `shutdown` only by `stop`.
struct Cells {
    status: AtomicU8,
    shutdown: AtomicBool,
    epoch: Instant,
    /// Nanoseconds since `epoch`, plus one; zero means never
    last_accepted: AtomicU64,
    last_finished: AtomicU64,
}

impl Cells {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(ActorStatus::Idle as u8),
            shutdown: AtomicBool::new(false),
            epoch: Instant::now(),
            last_accepted: AtomicU64::new(0),
            last_finished: AtomicU64::new(0),
        }
    }

    fn status(&self) -> ActorStatus {
        ActorStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: ActorStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    fn now(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX - 1) + 1
    }

    fn stamp(&self, cell: &AtomicU64) {
        cell.store(self.now(), Ordering::Release);
    }

    fn read_stamp(&self, cell: &AtomicU64) -> Option<Instant> {
        cell.load(Ordering::Acquire)
            .checked_sub(1)
            .map(|nanos| self.epoch + Duration::from_nanos(nanos))
    }
}

/// A thread-backed actor with a bounded mailbox
pub struct Actor {
    id: ActorId,
    mailbox: Mailbox,
    cells: Arc<Cells>,
    /// Taken by the first `join`; held while joining so concurrent joins wait too
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("shutdown", &self.is_shutdown())
            .field("mailbox", &self.mailbox)
            .finish()
    }
}

impl Actor {
    /// Validate the configuration, create the mailbox and start the actor's thread.
    ///
    /// A mailbox size of zero would mean an unbuffered hand-off, which cannot
    /// be offered without blocking the caller; it is rejected.
    pub fn spawn(config: &ActorConfig) -> Result<Self, ActorError> {
        if config.mailbox_size < 1 {
            return Err(ActorError::Configuration("mailbox must be greater than 0".to_string()));
        }

        let id = ActorId::next();
        let (mailbox, inbox) = mailbox::bounded(config.mailbox_size);
        let cells = Arc::new(Cells::new());

        let thread_cells = Arc::clone(&cells);
        let handler = config.error_handler.clone();
        let dispatch = logging::current_subscriber();

        let thread_handle = std::thread::Builder::new()
            .name(format!("{}-{}", config.thread_name_prefix, id))
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    run_loop(id, inbox, &thread_cells, handler.as_ref());
                });
            })
            .map_err(|e| ActorError::Spawn(format!("actor {}: {}", id, e)))?;

        log_lifecycle!("actor", id, "started", capacity = config.mailbox_size);

        Ok(Self {
            id,
            mailbox,
            cells,
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }

    /// Enqueue work without blocking.
    ///
    /// Fails with `ShuttingDown` once `stop()` has been called and with
    /// `Full` when the mailbox is at capacity.
    pub fn accept(&self, work: Work) -> Result<(), ActorError> {
        if self.is_shutdown() {
            return Err(ActorError::ShuttingDown);
        }
        // Read the clock before the push so the stamp never postdates the work finishing
        let accepted_at = self.cells.now();
        self.mailbox.try_push(work)?;
        self.cells.last_accepted.store(accepted_at, Ordering::Release);
        Ok(())
    }

    /// Signal the actor to stop once its mailbox is drained.
    ///
    /// Idempotent: returns `true` for the call that actually stopped the
    /// actor and `false` for every later call.
    pub fn stop(&self) -> bool {
        if self.cells.shutdown.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.mailbox.close();
        log_lifecycle!("actor", self.id, "stop_requested", queued = self.mailbox.len());
        true
    }

    /// Block until the actor's loop has terminated.
    ///
    /// Only returns after `stop()` has been called and the backlog drained;
    /// concurrent callers all wait for the same termination.
    pub fn join(&self) {
        let mut guard = self.thread_handle.lock();
        if let Some(handle) = guard.take() {
            if let Err(payload) = handle.join() {
                let panic = WorkPanic::from_payload(payload.as_ref());
                log_error!(panic, actor = %self.id);
            }
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn status(&self) -> ActorStatus {
        self.cells.status()
    }

    /// Whether a unit of work is executing right now
    pub fn is_busy(&self) -> bool {
        self.status() == ActorStatus::Executing
    }

    pub fn is_shutdown(&self) -> bool {
        self.cells.shutdown.load(Ordering::Acquire)
    }

    pub fn is_terminated(&self) -> bool {
        self.status() == ActorStatus::Terminated
    }

    /// When work was last accepted, if ever
    pub fn last_accepted(&self) -> Option<Instant> {
        self.cells.read_stamp(&self.cells.last_accepted)
    }

    /// When a unit of work last finished, if ever
    pub fn last_finished(&self) -> Option<Instant> {
        self.cells.read_stamp(&self.cells.last_finished)
    }

    pub fn queued(&self) -> usize {
        self.mailbox.len()
    }

    pub fn capacity(&self) -> usize {
        self.mailbox.capacity()
    }

    pub fn stats(&self) -> ActorStats {
        ActorStats {
            id: self.id,
            status: self.status(),
            queued: self.queued(),
            capacity: self.capacity(),
            last_accepted: self.last_accepted(),
            last_finished: self.last_finished(),
        }
    }
}

/// The actor's thread body.
///
/// Blocks on the inbox, which wakes either for new work or for the close of
/// the mailbox. A closed mailbox keeps yielding queued work, so the loop only
/// ends after the backlog is drained.
fn run_loop(id: ActorId, inbox: Inbox, cells: &Cells, handler: Option<&ErrorHandler>) {
    loop {
        let waiting = if cells.shutdown.load(Ordering::Acquire) {
            ActorStatus::Draining
        } else {
            ActorStatus::Idle
        };
        cells.set_status(waiting);

        let Some(work) = inbox.recv() else { break };

        cells.set_status(ActorStatus::Executing);
        if let Err(err) = execute(work) {
            report(id, err, handler);
        }
        cells.stamp(&cells.last_finished);
    }

    cells.set_status(ActorStatus::Terminated);
    log_lifecycle!("actor", id, "terminated");
}

fn execute(work: Work) -> WorkResult {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::Error::new(WorkPanic::from_payload(payload.as_ref()))),
    }
}

fn report(id: ActorId, err: anyhow::Error, handler: Option<&ErrorHandler>) {
    if err.is::<WorkPanic>() {
        warn!(actor = %id, error = %err, "work panicked");
    }
    let Some(handler) = handler else {
        // No handler configured: the error is dropped
        debug!(actor = %id, error = %err, "work failed, no error handler");
        return;
    };
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(err))) {
        let panic = WorkPanic::from_payload(payload.as_ref());
        log_error!(panic, actor = %id, "error handler panicked");
    }
}
