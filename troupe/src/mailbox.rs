//! # Mailbox
//!
//! A bounded FIFO of pending work, shared by one producer path (an actor's
//! `accept`) and one consumer (the actor's own loop).
//!
//! Pushing never blocks: a full mailbox is reported immediately so that the
//! troupe, which pushes while holding its roster lock, is never stalled.
//!
//! Closing the mailbox drops the only sender. The inbox keeps yielding queued
//! work until it is empty and only then reports the end of the stream, which
//! is what lets an actor drain its backlog before terminating.

use flume::{Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use troupe_api::work::Work;

use crate::error::MailboxError;

/// Producer side of an actor's mailbox.
pub struct Mailbox {
    /// `None` once closed
    sender: RwLock<Option<Sender<Work>>>,
    /// Receiver handle kept only to observe the queue length
    observer: Receiver<Work>,
    capacity: usize,
}

/// Consumer side of an actor's mailbox.
pub struct Inbox {
    receiver: Receiver<Work>,
}

/// Create a mailbox holding at most `capacity` pending items.
pub fn bounded(capacity: usize) -> (Mailbox, Inbox) {
    let (sender, receiver) = flume::bounded(capacity);
    let mailbox = Mailbox {
        sender: RwLock::new(Some(sender)),
        observer: receiver.clone(),
        capacity,
    };
    (mailbox, Inbox { receiver })
}

impl Mailbox {
    /// Enqueue without waiting.
    pub fn try_push(&self, work: Work) -> Result<(), MailboxError> {
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(MailboxError::Closed)?;
        sender.try_send(work).map_err(|e| match e {
            TrySendError::Full(_) => MailboxError::Full { capacity: self.capacity },
            TrySendError::Disconnected(_) => MailboxError::Closed,
        })
    }

    /// Stop accepting work. Returns `false` if the mailbox was already closed.
    ///
    /// Takes the write lock, so every push that succeeded is ordered before
    /// the close and will still be delivered by the inbox.
    pub fn close(&self) -> bool {
        self.sender.write().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Number of queued items (snapshot in time).
    pub fn len(&self) -> usize {
        self.observer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Inbox {
    /// Wait for the next item.
    ///
    /// Returns `None` once the mailbox is closed and every queued item has
    /// been handed out.
    pub fn recv(&self) -> Option<Work> {
        self.receiver.recv().ok()
    }

    /// Take the next item only if one is already queued.
    pub fn try_recv(&self) -> Option<Work> {
        self.receiver.try_recv().ok()
    }
}
