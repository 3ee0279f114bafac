//! Connection lifecycle: connect, log in, and the two-step teardown.

use std::future::Future;

use inotes_imap::{Authenticated, Client, ImapStream};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::Credentials;
use crate::mailbox::{MailboxSession, Mode};
use crate::{Error, Result};

/// Opens byte streams to an IMAP server.
pub trait Transport {
    /// Stream type produced by this transport.
    type Stream: AsyncRead + AsyncWrite + Unpin;

    /// Connects to `host:port`.
    fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = inotes_imap::Result<Self::Stream>>;
}

/// Implicit TLS over TCP, verified against the Mozilla root store.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsTransport;

impl Transport for TlsTransport {
    type Stream = ImapStream;

    async fn connect(&self, host: &str, port: u16) -> inotes_imap::Result<ImapStream> {
        inotes_imap::connection::connect_tls(host, port).await
    }
}

/// Outcome of tearing down a session.
///
/// `CLOSE` failures are expected when the connection is already broken and
/// are kept only for logging; [`ShutdownReport::into_result`] surfaces the
/// logout outcome.
#[derive(Debug)]
pub struct ShutdownReport {
    /// Result of `CLOSE`.
    pub close: Result<()>,
    /// Result of `LOGOUT`.
    pub logout: Result<()>,
}

impl ShutdownReport {
    /// Returns the logout outcome.
    ///
    /// # Errors
    ///
    /// Returns the error raised by `LOGOUT`, if any.
    pub fn into_result(self) -> Result<()> {
        self.logout
    }
}

/// Opens and releases authenticated connections.
#[derive(Debug, Clone)]
pub struct ConnectionManager<T = TlsTransport> {
    transport: T,
    credentials: Credentials,
}

impl<T: Transport> ConnectionManager<T> {
    /// Creates a manager connecting through `transport`.
    pub const fn new(transport: T, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Connects, reads the greeting and logs in.
    ///
    /// Nothing stays open on failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server rejects the login, or
    /// [`Error::Transport`] for anything else: the connection, the
    /// greeting, or a LOGIN reply that cannot be understood.
    pub async fn open(&self) -> Result<Client<T::Stream, Authenticated>> {
        let Credentials {
            hostname,
            username,
            password,
            port,
        } = &self.credentials;

        tracing::debug!(host = %hostname, port, "connecting to IMAP server");
        let stream = self
            .transport
            .connect(hostname, *port)
            .await
            .map_err(Error::Transport)?;

        let client = Client::from_stream(stream)
            .await
            .map_err(Error::Transport)?;

        tracing::debug!(username = %username, "logging in");
        client.login(username, password).await.map_err(|e| {
            if e.is_rejection() {
                Error::Auth(e.to_string())
            } else {
                Error::Transport(e)
            }
        })
    }

    /// Closes the selected mailbox, then logs out.
    ///
    /// Logout is attempted even when `CLOSE` fails.
    pub async fn close<M: Mode>(&self, session: MailboxSession<T::Stream, M>) -> ShutdownReport {
        let (client, closed) = session.into_client().close().await;
        let close = closed.map_err(Error::from);
        if let Err(error) = &close {
            tracing::debug!(%error, "CLOSE failed");
        }

        let logout = self.logout(client).await;
        ShutdownReport { close, logout }
    }

    /// Logs out a connection that has no mailbox selected.
    ///
    /// # Errors
    ///
    /// Returns an error if `LOGOUT` fails.
    pub async fn logout(&self, client: Client<T::Stream, Authenticated>) -> Result<()> {
        client.logout().await.map_err(Error::from)
    }
}
