//! # Roster
//!
//! The ordered collection of actors owned by a troupe, and the two assignment
//! strategies that pick from it.
//!
//! Order encodes recency of assignment, not creation: the head is the member
//! assigned least recently, the tail the one assigned last. Promoting a
//! member is "remove from its position, append to the tail", an O(n) scan
//! plus O(1) moves on a `VecDeque`.
//!
//! The roster is not synchronized; the troupe keeps it behind its single
//! submission lock, together with the random source.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::actor::Actor;

/// Something a roster can assign work to
pub trait Assignee {
    /// Best-effort: may be stale by the time work is assigned.
    fn is_busy(&self) -> bool;
}

impl Assignee for Actor {
    fn is_busy(&self) -> bool {
        Actor::is_busy(self)
    }
}

impl<T: Assignee + ?Sized> Assignee for Arc<T> {
    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }
}

/// Outcome of a load-aware selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The first member not currently busy, by position
    Idle(usize),
    /// Nobody is idle and the population is below its bound
    Grow,
    /// Nobody is idle and the population is at its bound: take the head
    Oldest,
}

pub struct Roster<A> {
    members: VecDeque<A>,
    rng: StdRng,
}

impl<A> Roster<A> {
    /// An empty roster; `seed` makes random picks reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { members: VecDeque::new(), rng }
    }

    /// Append as the most recently assigned member.
    pub fn push(&mut self, member: A) {
        self.members.push_back(member);
    }

    /// Move the member at `index` to the tail and return it.
    pub fn promote(&mut self, index: usize) -> Option<&A> {
        let member = self.members.remove(index)?;
        self.members.push_back(member);
        self.members.back()
    }

    /// Move the head to the tail and return it. With one member this is a no-op.
    pub fn rotate(&mut self) -> Option<&A> {
        self.promote(0)
    }

    /// A member chosen uniformly at random. Order is left untouched.
    pub fn pick_random(&mut self) -> Option<&A> {
        if self.members.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..self.members.len());
        self.members.get(index)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members from least to most recently assigned.
    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.members.iter()
    }
}

impl<A: Assignee> Roster<A> {
    /// Load-aware selection for a population bounded by `max`.
    pub fn select(&self, max: usize) -> Selection {
        if let Some(index) = self.members.iter().position(|m| !m.is_busy()) {
            Selection::Idle(index)
        } else if self.members.len() < max {
            Selection::Grow
        } else {
            Selection::Oldest
        }
    }
}
