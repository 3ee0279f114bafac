//! # inotes-imap
//!
//! A small async IMAP4rev1 (RFC 3501) client, carrying just the commands
//! needed to keep notes in a single mailbox: LOGIN, SELECT/EXAMINE, SEARCH,
//! FETCH, STORE, EXPUNGE, APPEND, CLOSE and LOGOUT.
//!
//! - **Type-state connections**: invalid command/state combinations do not
//!   compile (`NotAuthenticated` → `Authenticated` → `Selected`)
//! - **TLS via rustls**: implicit TLS with the Mozilla root store
//! - **Sans-I/O parser**: response parsing is separate from network I/O
//!
//! ## Quick Start
//!
//! ```no_run
//! use inotes_imap::{Client, FetchAttribute, SearchCriteria, SequenceSet};
//!
//! # async fn run() -> inotes_imap::Result<()> {
//! let stream = inotes_imap::connection::connect_tls("imap.mail.me.com", 993).await?;
//! let client = Client::from_stream(stream).await?;
//! let client = client.login("jane@icloud.com", "app-specific-password").await?;
//!
//! let (mut notes, status) = client.examine("Notes").await?;
//! println!("{} notes", status.exists);
//!
//! let ids = notes.search(SearchCriteria::All).await?;
//! if let Some(set) = SequenceSet::from_ids(&ids) {
//!     let fetched = notes.fetch(&set, vec![FetchAttribute::Rfc822]).await?;
//!     println!("fetched {}", fetched.len());
//! }
//!
//! let (client, closed) = notes.close().await;
//! closed?;
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌─────────────────────┐
//! │   NotAuthenticated  │ ─── login() ───→ Authenticated
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    Authenticated    │ ─── select()/examine() ───→ Selected
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │      Selected       │ ─── close() ───→ Authenticated
//! └─────────────────────┘
//! ```
//!
//! `logout()` is available in every state.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, SearchCriteria, StoreAction, TagGenerator};
pub use connection::{
    Authenticated, Client, FramedStream, ImapStream, NotAuthenticated, Selected, TransitionError,
};
pub use error::{Error, Result};
pub use parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
pub use types::{
    Capability, Flag, Flags, Mailbox, MailboxStatus, ResponseCode, SeqNum, SequenceSet, Status,
    Tag,
};

/// Default port for IMAP over implicit TLS.
pub const DEFAULT_TLS_PORT: u16 = 993;
