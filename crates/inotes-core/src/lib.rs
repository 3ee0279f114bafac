//! # inotes-core
//!
//! Notes stored as messages in the `Notes` folder of an IMAP account, the
//! way the iCloud Notes app keeps them.
//!
//! This crate provides:
//! - Typed configuration loaded from an INI file
//! - The note message format (encode and decode)
//! - Connection lifecycle with two-step teardown (`CLOSE`, then `LOGOUT`)
//! - A mailbox session whose read-only or read-write mode is part of its type
//! - [`NoteRepository`]: count, list, search, create and delete
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use inotes_core::{Config, NoteFormat, NoteRepository};
//!
//! # async fn example() -> inotes_core::Result<()> {
//! let config = Config::load(Path::new("inotes.conf"))?;
//! let notes = NoteRepository::new(&config);
//!
//! notes
//!     .create_note("Groceries", "milk, eggs\n", NoteFormat::Html)
//!     .await?;
//! println!("{} notes", notes.count_notes().await?);
//!
//! for note in notes.search_notes("eggs", true).await? {
//!     println!("{}\n---\n{}", note.subject, note.body);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod connection;
mod error;
pub mod mailbox;
mod note;
pub mod repository;
pub mod strip;

pub use codec::{ContentTypePolicy, NoteCodec};
pub use config::{Config, ConfigError, Credentials};
pub use connection::{ConnectionManager, ShutdownReport, TlsTransport, Transport};
pub use error::{Error, Result};
pub use mailbox::{MailboxSession, Mode, NOTES_MAILBOX, ReadOnly, ReadWrite};
pub use note::{Note, NoteFormat};
pub use repository::{DeleteReport, NoteRepository, SubjectCursor};
pub use strip::strip_html;

pub use inotes_imap::SeqNum;
