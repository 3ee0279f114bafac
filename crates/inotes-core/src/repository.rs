//! Note operations, one connection per call.
//!
//! Every operation connects, selects the Notes mailbox, does its work and
//! releases the connection (`CLOSE`, then `LOGOUT`) on every exit path.
//! When both the work and the logout fail, the work's error is returned.

use chrono::{DateTime, FixedOffset, Local};
use inotes_imap::SeqNum;
use tracing::Dispatch;
use tracing::instrument::WithSubscriber;

use crate::codec::{self, NoteCodec};
use crate::config::Config;
use crate::connection::{ConnectionManager, TlsTransport, Transport};
use crate::mailbox::{MailboxSession, Mode, NOTES_MAILBOX, ReadOnly, ReadWrite};
use crate::note::{Note, NoteFormat};
use crate::strip;
use crate::{Error, Result};

/// Source of the current time for new notes.
pub type Clock = fn() -> DateTime<FixedOffset>;

fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Outcome of [`NoteRepository::delete_notes`].
#[derive(Debug, Default)]
pub struct DeleteReport {
    /// Ids flagged `\Deleted`.
    pub flagged: Vec<SeqNum>,
    /// Ids the server refused to flag, with the reason.
    pub failed: Vec<(SeqNum, Error)>,
    /// Ids reported by `EXPUNGE`, in server order.
    pub expunged: Vec<SeqNum>,
}

impl DeleteReport {
    /// Returns true if every requested id was flagged.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Count, list, search, create and delete notes.
///
/// Logs go to the [`Dispatch`] given with [`NoteRepository::with_dispatch`];
/// by default they are discarded.
#[derive(Debug)]
pub struct NoteRepository<T = TlsTransport> {
    connections: ConnectionManager<T>,
    codec: NoteCodec,
    dispatch: Dispatch,
    clock: Clock,
}

impl NoteRepository<TlsTransport> {
    /// Creates a repository connecting over TLS.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_transport(TlsTransport, config)
    }
}

impl<T: Transport> NoteRepository<T> {
    /// Creates a repository connecting through `transport`.
    pub fn with_transport(transport: T, config: &Config) -> Self {
        Self {
            connections: ConnectionManager::new(transport, config.credentials.clone()),
            codec: NoteCodec::new(config.note_from.clone(), config.content_type),
            dispatch: Dispatch::none(),
            clock: local_now,
        }
    }

    /// Sends this repository's logs to `dispatch`.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Replaces the clock used to date new notes.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the number of notes.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting, logging in or selecting fails.
    pub async fn count_notes(&self) -> Result<u32> {
        async {
            let session = self.open::<ReadOnly>().await?;
            let count = session.count();
            tracing::debug!(count, "notes counted");
            self.release(session, Ok(count)).await
        }
        .with_subscriber(self.dispatch.clone())
        .await
    }

    /// Starts listing note subjects, ascending by id.
    ///
    /// Messages are fetched one at a time as the cursor is advanced. The
    /// cursor holds the connection until [`SubjectCursor::close`].
    ///
    /// # Errors
    ///
    /// Returns an error if connecting, selecting or `SEARCH` fails.
    pub async fn list_notes(&self) -> Result<SubjectCursor<'_, T>> {
        async {
            let mut session = self.open::<ReadOnly>().await?;
            match session.search_all().await {
                Ok(ids) => {
                    tracing::debug!(count = ids.len(), "listing notes");
                    Ok(SubjectCursor {
                        repository: self,
                        session: Some(session),
                        ids: ids.into_iter(),
                    })
                }
                Err(error) => self.release(session, Err(error)).await,
            }
        }
        .with_subscriber(self.dispatch.clone())
        .await
    }

    /// Returns every note subject, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns the first error met while listing; the connection is released
    /// regardless.
    pub async fn list_subjects(&self) -> Result<Vec<String>> {
        let mut cursor = self.list_notes().await?;
        let mut subjects = Vec::new();

        let outcome = loop {
            match cursor.next_subject().await {
                Some(Ok(subject)) => subjects.push(subject),
                Some(Err(error)) => break Err(error),
                None => break Ok(()),
            }
        };

        let closed = cursor.close().await;
        settle(outcome, closed).map(|()| subjects)
    }

    /// Returns the notes whose subject or text contains `query`, in server
    /// order.
    ///
    /// With `strip_html`, HTML bodies are returned as plain text.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting, searching or fetching fails. Messages
    /// that are not notes are skipped.
    pub async fn search_notes(&self, query: &str, strip_html: bool) -> Result<Vec<Note>> {
        async {
            let mut session = self.open::<ReadOnly>().await?;
            let outcome = collect_matches(&mut session, query, strip_html).await;
            self.release(session, outcome).await
        }
        .with_subscriber(self.dispatch.clone())
        .await
    }

    /// Stores a new note, dated now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNote`] for a blank subject, before connecting.
    /// Otherwise returns an error if connecting, selecting or `APPEND` fails.
    pub async fn create_note(&self, subject: &str, body: &str, format: NoteFormat) -> Result<()> {
        let now = (self.clock)();
        let message = self.codec.encode(&Note::new(subject, body, format), now)?;

        async {
            let mut session = self.open::<ReadWrite>().await?;
            let outcome = session.append(message.as_bytes(), now).await;
            if outcome.is_ok() {
                tracing::info!(subject, "note saved");
            }
            self.release(session, outcome).await
        }
        .with_subscriber(self.dispatch.clone())
        .await
    }

    /// Flags each id `\Deleted`, then expunges once.
    ///
    /// Ids the server refuses are collected in the report and the batch
    /// continues. Ids are sequence numbers of the current mailbox state.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting, selecting or `EXPUNGE` fails, or if
    /// the connection breaks.
    pub async fn delete_notes(&self, ids: &[SeqNum]) -> Result<DeleteReport> {
        if ids.is_empty() {
            return Ok(DeleteReport::default());
        }

        async {
            let mut session = self.open::<ReadWrite>().await?;
            let outcome = flag_and_expunge(&mut session, ids).await;
            self.release(session, outcome).await
        }
        .with_subscriber(self.dispatch.clone())
        .await
    }

    async fn open<M: Mode>(&self) -> Result<MailboxSession<T::Stream, M>> {
        let client = self.connections.open().await?;

        match MailboxSession::<_, M>::open(client).await {
            Ok(session) => Ok(session),
            Err(failed) => {
                let error = Error::from(failed.error);
                tracing::debug!(%error, mailbox = NOTES_MAILBOX, "cannot open mailbox");
                let logout = self.connections.logout(failed.client).await;
                settle(Err(error), logout)
            }
        }
    }

    async fn release<M: Mode, R>(
        &self,
        session: MailboxSession<T::Stream, M>,
        outcome: Result<R>,
    ) -> Result<R> {
        let report = self.connections.close(session).await;
        settle(outcome, report.into_result())
    }
}

async fn collect_matches<S, M>(
    session: &mut MailboxSession<S, M>,
    query: &str,
    strip_html: bool,
) -> Result<Vec<Note>>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    M: Mode,
{
    let ids = session.search(query).await?;
    tracing::debug!(query, matches = ids.len(), "search complete");

    let mut notes = Vec::with_capacity(ids.len());
    for id in ids {
        let (header, body) = session.fetch_header_and_body(id).await?;
        let mut note = match codec::decode(&header, &body) {
            Ok(note) => note,
            Err(error) => {
                tracing::warn!(id = id.get(), %error, "skipping message that is not a note");
                continue;
            }
        };

        note.id = Some(id);
        if strip_html && note.is_html() {
            note.body = strip::strip_html(&note.body);
            note.format = NoteFormat::Plain;
        }
        notes.push(note);
    }

    Ok(notes)
}

async fn flag_and_expunge<S>(
    session: &mut MailboxSession<S, ReadWrite>,
    ids: &[SeqNum],
) -> Result<DeleteReport>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut report = DeleteReport::default();

    for &id in ids {
        match session.flag_deleted(id).await {
            Ok(()) => report.flagged.push(id),
            Err(error) if !error.is_transport() => {
                tracing::warn!(id = id.get(), %error, "cannot flag note");
                report.failed.push((id, error));
            }
            Err(error) => return Err(error),
        }
    }

    report.expunged = session.expunge().await?;
    tracing::info!(
        flagged = report.flagged.len(),
        expunged = report.expunged.len(),
        "notes deleted"
    );
    Ok(report)
}

/// Combines an operation outcome with the logout outcome.
fn settle<R>(outcome: Result<R>, logout: Result<()>) -> Result<R> {
    match (outcome, logout) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(error)) | (Err(error), Ok(())) => Err(error),
        (Err(error), Err(logout_error)) => {
            tracing::warn!(error = %logout_error, "logout failed");
            Err(error)
        }
    }
}

/// Lazily fetched note subjects, backed by one live connection.
///
/// Not restartable. Call [`SubjectCursor::close`] when done; dropping the
/// cursor drops the connection without logging out.
pub struct SubjectCursor<'r, T: Transport> {
    repository: &'r NoteRepository<T>,
    session: Option<MailboxSession<T::Stream, ReadOnly>>,
    ids: std::vec::IntoIter<SeqNum>,
}

impl<T: Transport> SubjectCursor<'_, T> {
    /// Number of messages not fetched yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.ids.len()
    }

    /// Fetches the next note subject, or `None` at the end.
    ///
    /// Messages that are not notes are skipped.
    pub async fn next_subject(&mut self) -> Option<Result<String>> {
        let dispatch = self.repository.dispatch.clone();

        async {
            let session = self.session.as_mut()?;
            for id in self.ids.by_ref() {
                let raw = match session.fetch_full(id).await {
                    Ok(raw) => raw,
                    Err(error) => return Some(Err(error)),
                };
                match codec::subject_of(&raw) {
                    Ok(subject) => return Some(Ok(subject)),
                    Err(error) => {
                        tracing::warn!(id = id.get(), %error, "skipping message that is not a note");
                    }
                }
            }
            None
        }
        .with_subscriber(dispatch)
        .await
    }

    /// Releases the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if `LOGOUT` fails.
    pub async fn close(mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let repository = self.repository;

        repository
            .release(session, Ok(()))
            .with_subscriber(repository.dispatch.clone())
            .await
    }
}

impl<T: Transport> Drop for SubjectCursor<'_, T> {
    fn drop(&mut self) {
        if self.session.is_some() {
            tracing::dispatcher::with_default(&self.repository.dispatch, || {
                tracing::warn!("subject cursor dropped without close; connection not logged out");
            });
        }
    }
}

impl<T: Transport> std::fmt::Debug for SubjectCursor<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubjectCursor")
            .field("open", &self.session.is_some())
            .field("remaining", &self.ids.len())
            .finish_non_exhaustive()
    }
}
