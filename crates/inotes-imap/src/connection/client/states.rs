//! Type-state markers for the client connection states.
//!
//! `Selected` also carries what the client knows about the selected
//! mailbox, kept current from untagged EXISTS and EXPUNGE data.

use crate::parser::UntaggedResponse;
use crate::types::{Mailbox, MailboxStatus};

/// Marker type for the not-authenticated state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// State for a selected mailbox.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: Mailbox,
    pub(crate) read_only: bool,
    pub(crate) exists: u32,
}

impl Selected {
    /// Creates the selected state from the SELECT/EXAMINE answer.
    #[must_use]
    pub fn new(mailbox: Mailbox, status: &MailboxStatus) -> Self {
        Self {
            mailbox,
            read_only: status.read_only,
            exists: status.exists,
        }
    }

    /// Returns the selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Returns true if the mailbox is open read-only.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the current number of messages in the mailbox.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.exists
    }

    /// Updates the message count from untagged data.
    pub(crate) fn observe(&mut self, untagged: &UntaggedResponse) {
        match untagged {
            UntaggedResponse::Exists(n) => self.exists = *n,
            UntaggedResponse::Expunge(_) => self.exists = self.exists.saturating_sub(1),
            _ => {}
        }
    }
}
