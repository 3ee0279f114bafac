//! IMAP connection handling.
//!
//! - TLS stream setup
//! - Framed I/O for the IMAP wire format
//! - Type-state client wrapper

mod client;
mod framed;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated, Selected, TransitionError};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect_tls, create_tls_connector};
