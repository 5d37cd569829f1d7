//! # Troupe
//!
//! A troupe owns a roster of actors and routes each submitted unit of work to
//! exactly one of them.
//!
//! ## Assignment
//!
//! - `Dynamic`: the first actor that is not busy gets the work and moves to
//!   the tail of the roster. If every actor is busy and the population is
//!   below `max`, a new actor is created for it. Otherwise the head of the
//!   roster (the actor assigned least recently) gets it and moves to the tail.
//! - `Fixed`: `max` actors are created up front and each submission goes to
//!   one of them chosen uniformly at random.
//!
//! The whole decision, including the random draw and any roster mutation,
//! happens under one lock. The lock never extends into an actor: `accept` is
//! non-blocking, so a full mailbox is reported instead of waited on.
//! If the chosen actor refuses the work, that error is returned unmodified;
//! the troupe does not retry.
//!
//! ## Shutdown
//!
//! `shutdown()` takes the same lock, latches the troupe's shutdown flag and
//! stops every actor. A submission either sees the flag and fails, or
//! completes before it and is drained by its actor. `join()` then waits for
//! every actor to finish its backlog.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;
use troupe_api::errors::TroupeError;
use troupe_api::work::{Work, WorkResult};

use crate::actor::{Actor, ActorId, ActorStats};
use crate::config::{ActorConfig, TroupeConfig, TroupeMode};
use crate::roster::{Roster, Selection};
use crate::{log_lifecycle, log_scheduler};

/// Aggregate view of a troupe
#[derive(Debug, Clone)]
pub struct TroupeMetrics {
    /// Number of live actors
    pub population: usize,

    /// Actors executing work right now
    pub busy: usize,

    /// Work queued across all mailboxes
    pub queued: usize,

    /// Whether shutdown has been requested
    pub is_shutting_down: bool,

    pub mode: TroupeMode,
}

/// A pool of actors with load-aware or random dispatch
pub struct Troupe {
    /// Effective configuration after validation
    config: TroupeConfig,

    /// Template for every actor created by this troupe
    actor_config: ActorConfig,

    /// Serialization point for submit and shutdown
    roster: Mutex<Roster<Arc<Actor>>>,

    /// One-way latch
    shutdown: AtomicBool,
}

impl fmt::Debug for Troupe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Troupe")
            .field("mode", &self.config.mode)
            .field("min", &self.config.min)
            .field("max", &self.config.max)
            .field("mailbox_size", &self.config.mailbox_size)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

impl Troupe {
    /// Validate `config` and create the initial actors.
    ///
    /// Fixed mode creates exactly `max` actors; dynamic mode creates `initial`.
    /// Invalid bounds fail before any actor exists.
    pub fn new(config: TroupeConfig) -> Result<Self, TroupeError> {
        let config = config.validate()?;
        let actor_config = config.actor_config();

        let mut roster = Roster::new(config.rng_seed);
        for _ in 0..config.initial {
            // Actors created so far are dropped on failure, which closes their mailboxes
            roster.push(Arc::new(Actor::spawn(&actor_config)?));
        }

        info!(
            mode = ?config.mode,
            initial = config.initial,
            max = config.max,
            mailbox_size = config.mailbox_size,
            "troupe created"
        );

        Ok(Self {
            config,
            actor_config,
            roster: Mutex::new(roster),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Route a closure to one actor.
    pub fn submit<F>(&self, work: F) -> Result<(), TroupeError>
    where
        F: FnOnce() -> WorkResult + Send + 'static,
    {
        self.submit_work(Box::new(work))
    }

    /// Route boxed work to one actor.
    ///
    /// Fails with `ShuttingDown` after `shutdown()`. An error from the chosen
    /// actor (`Full`, or `ShuttingDown` for an actor that is stopping) comes
    /// back as `TroupeError::Actor`.
    pub fn submit_work(&self, work: Work) -> Result<(), TroupeError> {
        let mut roster = self.roster.lock();
        if self.is_shutdown() {
            return Err(TroupeError::ShuttingDown);
        }
        match self.config.mode {
            TroupeMode::Dynamic => self.assign_priority(&mut roster, work),
            TroupeMode::Fixed => Self::assign_random(&mut roster, work),
        }
    }

    fn assign_priority(&self, roster: &mut Roster<Arc<Actor>>, work: Work) -> Result<(), TroupeError> {
        match roster.select(self.config.max) {
            Selection::Idle(index) => {
                let actor = roster.promote(index).ok_or_else(Self::empty_roster)?;
                log_scheduler!("dynamic", "assigned_idle", actor = %actor.id());
                actor.accept(work)?;
            }
            Selection::Grow => {
                let actor = Arc::new(Actor::spawn(&self.actor_config)?);
                let accepted = actor.accept(work);
                roster.push(actor);
                log_scheduler!("dynamic", "grew", population = roster.len());
                accepted?;
            }
            Selection::Oldest => {
                let actor = roster.rotate().ok_or_else(Self::empty_roster)?;
                log_scheduler!("dynamic", "assigned_oldest", actor = %actor.id());
                actor.accept(work)?;
            }
        }
        Ok(())
    }

    fn assign_random(roster: &mut Roster<Arc<Actor>>, work: Work) -> Result<(), TroupeError> {
        let actor = roster.pick_random().ok_or_else(Self::empty_roster)?;
        log_scheduler!("fixed", "assigned_random", actor = %actor.id());
        actor.accept(work)?;
        Ok(())
    }

    // A selection only names existing members, so this is a roster bug
    fn empty_roster() -> TroupeError {
        debug_assert!(false, "roster selection named a missing actor");
        TroupeError::Internal("roster selection named a missing actor".to_string())
    }

    /// Stop accepting work and signal every actor to stop after draining.
    ///
    /// A second call fails with `ShuttingDown` and changes nothing.
    pub fn shutdown(&self) -> Result<(), TroupeError> {
        let roster = self.roster.lock();
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return Err(TroupeError::ShuttingDown);
        }
        for actor in roster.iter() {
            actor.stop();
        }
        log_lifecycle!("troupe", "-", "shutdown_requested", population = roster.len());
        Ok(())
    }

    /// Block until every actor has drained its mailbox and terminated.
    ///
    /// Meant to be called after `shutdown()`; before it, this blocks until
    /// another thread shuts the troupe down.
    pub fn join(&self) {
        for actor in self.snapshot() {
            actor.join();
        }
        log_lifecycle!("troupe", "-", "joined");
    }

    /// `join()` for async callers.
    ///
    /// The blocking joins run on tokio's blocking pool, so this can be raced
    /// against `tokio::time::timeout`.
    pub async fn join_async(&self) -> Result<(), TroupeError> {
        let actors = self.snapshot();
        tokio::task::spawn_blocking(move || {
            for actor in actors {
                actor.join();
            }
        })
        .await
        .map_err(|e| TroupeError::Join(e.to_string()))?;
        log_lifecycle!("troupe", "-", "joined");
        Ok(())
    }

    // Joins happen outside the lock so that a concurrent shutdown can proceed
    fn snapshot(&self) -> Vec<Arc<Actor>> {
        self.roster.lock().iter().cloned().collect()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn mode(&self) -> TroupeMode {
        self.config.mode
    }

    /// The effective configuration.
    pub fn config(&self) -> &TroupeConfig {
        &self.config
    }

    /// Number of live actors
    pub fn population(&self) -> usize {
        self.roster.lock().len()
    }

    /// Actor ids from least to most recently assigned
    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.roster.lock().iter().map(|a| a.id()).collect()
    }

    /// Per-actor snapshot, in roster order
    pub fn actor_stats(&self) -> Vec<ActorStats> {
        self.roster.lock().iter().map(|a| a.stats()).collect()
    }

    pub fn metrics(&self) -> TroupeMetrics {
        let roster = self.roster.lock();
        TroupeMetrics {
            population: roster.len(),
            busy: roster.iter().filter(|a| a.is_busy()).count(),
            queued: roster.iter().map(|a| a.queued()).sum(),
            is_shutting_down: self.is_shutdown(),
            mode: self.config.mode,
        }
    }
}

impl Drop for Troupe {
    // Detached joiners may still hold actors, so mailboxes are closed here
    // rather than left to the last `Arc`.
    fn drop(&mut self) {
        let roster = self.roster.get_mut();
        let stopped = roster.iter().filter(|a| a.stop()).count();
        if stopped > 0 {
            log_lifecycle!("troupe", "-", "dropped", stopped = stopped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    /// Work that signals when it starts and runs until released
    fn gate() -> (impl FnOnce() -> WorkResult + Send + 'static, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let work = move || {
            started_tx.send(()).ok();
            release_rx.recv().ok();
            Ok(())
        };
        (work, started_rx, release_tx)
    }

    #[test]
    fn test_idle_actor_is_reused_and_promoted() {
        let troupe = Troupe::new(TroupeConfig::dynamic(2, 2).with_mailbox_size(4)).unwrap();
        let ids = troupe.actor_ids();

        // both idle: the head gets the work and moves to the tail
        let (work, started, release) = gate();
        troupe.submit(work).unwrap();
        started.recv().unwrap();
        assert_eq!(troupe.actor_ids(), vec![ids[1], ids[0]]);
        assert_eq!(troupe.population(), 2);

        release.send(()).unwrap();
        troupe.shutdown().unwrap();
        troupe.join();
    }

    #[test]
    fn test_grows_by_one_when_all_busy() {
        let troupe = Troupe::new(TroupeConfig::dynamic(0, 3)).unwrap();
        assert_eq!(troupe.population(), 0);

        let mut releases = Vec::new();
        for expected in 1..=3 {
            let (work, started, release) = gate();
            troupe.submit(work).unwrap();
            started.recv().unwrap();
            releases.push(release);
            assert_eq!(troupe.population(), expected);
        }

        let metrics = troupe.metrics();
        assert_eq!(metrics.busy, 3);
        assert_eq!(metrics.population, 3);

        for release in releases {
            release.send(()).unwrap();
        }
        troupe.shutdown().unwrap();
        troupe.join();
    }

    #[test]
    fn test_fixed_population_never_changes() {
        let troupe = Troupe::new(TroupeConfig::fixed(3).with_mailbox_size(64).with_rng_seed(1)).unwrap();
        assert_eq!(troupe.population(), 3);

        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..30 {
            let done = done.clone();
            troupe
                .submit(move || {
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(troupe.population(), 3);

        troupe.shutdown().unwrap();
        troupe.join();
        assert_eq!(done.load(Ordering::SeqCst), 30);
        assert_eq!(troupe.population(), 3);
    }

    #[test]
    fn test_shutdown_stops_actors() {
        let troupe = Troupe::new(TroupeConfig::dynamic(2, 2)).unwrap();
        troupe.shutdown().unwrap();
        troupe.join();

        assert!(troupe.actor_stats().iter().all(|s| s.status == crate::ActorStatus::Terminated));
        assert!(troupe.metrics().is_shutting_down);
    }
}
