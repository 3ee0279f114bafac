//! IMAP command builder.
//!
//! This module provides types and serialization for the commands the notes
//! client issues.

mod serialize;
mod tag_generator;
mod types;

use chrono::{DateTime, FixedOffset};

use crate::types::{Flag, Mailbox, SequenceSet};

pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, SearchCriteria, StoreAction};

use serialize::{
    Wire, write_date_time, write_fetch_items, write_flag_list, write_mailbox,
    write_search_criteria, write_store_action,
};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any State Commands
    /// LOGOUT command.
    Logout,

    // Not Authenticated State Commands
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },

    // Authenticated State Commands
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
    },
    /// APPEND command.
    ///
    /// Only the command line up to the literal size is serialized; the
    /// message bytes follow once the server sends a continuation.
    Append {
        /// Target mailbox.
        mailbox: Mailbox,
        /// Flags to set.
        flags: Option<Vec<Flag>>,
        /// Internal date to record for the message.
        internal_date: Option<DateTime<FixedOffset>>,
        /// Size of the message literal in bytes.
        size: usize,
    },

    // Selected State Commands
    /// CLOSE command.
    Close,
    /// EXPUNGE command.
    Expunge,
    /// SEARCH command.
    Search {
        /// Search criteria.
        criteria: SearchCriteria,
        /// Charset of string arguments (`None` means US-ASCII).
        charset: Option<String>,
    },
    /// FETCH command.
    Fetch {
        /// Sequence set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: Vec<FetchAttribute>,
    },
    /// STORE command.
    Store {
        /// Sequence set.
        sequence: SequenceSet,
        /// Store action.
        action: StoreAction,
        /// Silent mode (no FETCH response).
        silent: bool,
    },
}

impl Command {
    /// Returns the command keyword, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::Examine { .. } => "EXAMINE",
            Self::Append { .. } => "APPEND",
            Self::Close => "CLOSE",
            Self::Expunge => "EXPUNGE",
            Self::Search { .. } => "SEARCH",
            Self::Fetch { .. } => "FETCH",
            Self::Store { .. } => "STORE",
        }
    }

    /// Serializes the command with the given tag.
    ///
    /// Returns the wire segments. Every segment but the last ends with a
    /// literal announcement (`{n}\r\n`) and must be followed by a
    /// continuation request from the server before the next one is sent.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<Vec<u8>> {
        let mut wire = Wire::new(tag);

        match self {
            Self::Logout | Self::Close | Self::Expunge => {
                wire.put(self.name().as_bytes());
            }

            Self::Login { username, password } => {
                wire.put(b"LOGIN ");
                wire.astring(username);
                wire.push(b' ');
                wire.astring(password);
            }

            Self::Select { mailbox } => {
                wire.put(b"SELECT ");
                write_mailbox(&mut wire, mailbox);
            }

            Self::Examine { mailbox } => {
                wire.put(b"EXAMINE ");
                write_mailbox(&mut wire, mailbox);
            }

            Self::Append {
                mailbox,
                flags,
                internal_date,
                size,
            } => {
                wire.put(b"APPEND ");
                write_mailbox(&mut wire, mailbox);
                if let Some(flags) = flags {
                    wire.push(b' ');
                    write_flag_list(&mut wire, flags);
                }
                if let Some(date) = internal_date {
                    wire.push(b' ');
                    write_date_time(&mut wire, date);
                }
                wire.put(format!(" {{{size}}}").as_bytes());
            }

            Self::Search { criteria, charset } => {
                wire.put(b"SEARCH ");
                if let Some(charset) = charset {
                    wire.put(b"CHARSET ");
                    wire.astring(charset);
                    wire.push(b' ');
                }
                write_search_criteria(&mut wire, criteria);
            }

            Self::Fetch { sequence, items } => {
                wire.put(b"FETCH ");
                wire.put(sequence.to_string().as_bytes());
                wire.push(b' ');
                write_fetch_items(&mut wire, items);
            }

            Self::Store {
                sequence,
                action,
                silent,
            } => {
                wire.put(b"STORE ");
                wire.put(sequence.to_string().as_bytes());
                wire.push(b' ');
                write_store_action(&mut wire, action, *silent);
            }
        }

        wire.finish()
    }
}
