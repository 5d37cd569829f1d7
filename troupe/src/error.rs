use thiserror::Error;
use troupe_api::errors::ActorError;

/// Errors related to Mailbox operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    #[error("Mailbox is full (capacity: {capacity})")]
    Full { capacity: usize },
    #[error("Mailbox is closed")]
    Closed,
}

impl From<MailboxError> for ActorError {
    fn from(err: MailboxError) -> Self {
        match err {
            MailboxError::Full { capacity } => ActorError::Full { capacity },
            MailboxError::Closed => ActorError::ShuttingDown,
        }
    }
}
