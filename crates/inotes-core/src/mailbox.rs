//! The Notes mailbox, opened read-only or read-write.
//!
//! The mode is part of the session type: flagging, expunging and appending
//! only exist on [`MailboxSession<S, ReadWrite>`].

use std::marker::PhantomData;

use chrono::{DateTime, FixedOffset};
use inotes_imap::{
    Authenticated, Client, FetchAttribute, FetchItem, Flag, SearchCriteria, Selected, SeqNum,
    SequenceSet, StoreAction, TransitionError,
};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{Error, Result};

/// Name of the mailbox holding the notes.
pub const NOTES_MAILBOX: &str = "Notes";

const HEADER_SECTION: &str = "HEADER.FIELDS (SUBJECT)";
const TEXT_SECTION: &str = "TEXT";

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ReadOnly {}
    impl Sealed for super::ReadWrite {}
}

/// Access mode of a [`MailboxSession`].
pub trait Mode: sealed::Sealed {
    /// True if the mailbox is opened with `EXAMINE`.
    const READ_ONLY: bool;
}

/// Opened with `EXAMINE`.
#[derive(Debug, Clone, Copy)]
pub struct ReadOnly;

/// Opened with `SELECT`.
#[derive(Debug, Clone, Copy)]
pub struct ReadWrite;

impl Mode for ReadOnly {
    const READ_ONLY: bool = true;
}

impl Mode for ReadWrite {
    const READ_ONLY: bool = false;
}

/// Result of opening the mailbox; on failure the connection is handed back.
pub type OpenResult<S, M> =
    std::result::Result<MailboxSession<S, M>, TransitionError<Client<S, Authenticated>>>;

/// A connection with the Notes mailbox selected.
pub struct MailboxSession<S, M> {
    client: Client<S, Selected>,
    mode: PhantomData<M>,
}

impl<S, M> std::fmt::Debug for MailboxSession<S, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxSession")
            .field("client", &self.client)
            .finish()
    }
}

impl<S, M> MailboxSession<S, M>
where
    S: AsyncRead + AsyncWrite + Unpin,
    M: Mode,
{
    /// Selects the Notes mailbox in mode `M`.
    ///
    /// # Errors
    ///
    /// Fails if the server refuses the selection, or grants only read-only
    /// access to a read-write request. The connection is handed back either
    /// way so it can still be logged out.
    pub async fn open(client: Client<S, Authenticated>) -> OpenResult<S, M> {
        let opened = if M::READ_ONLY {
            client.examine(NOTES_MAILBOX).await
        } else {
            client.select(NOTES_MAILBOX).await
        };
        let (client, _status) = opened?;

        if !M::READ_ONLY && client.is_read_only() {
            let (client, closed) = client.close().await;
            if let Err(error) = closed {
                tracing::debug!(%error, "CLOSE after read-only SELECT failed");
            }
            return Err(TransitionError {
                error: inotes_imap::Error::Protocol(format!(
                    "{NOTES_MAILBOX} mailbox is read-only"
                )),
                client,
            });
        }

        Ok(Self {
            client,
            mode: PhantomData,
        })
    }

    /// Number of messages in the mailbox, kept current across expunges.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.client.exists()
    }

    /// Returns every message id, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if `SEARCH` fails.
    pub async fn search_all(&mut self) -> Result<Vec<SeqNum>> {
        let mut ids = self.client.search(SearchCriteria::All).await?;
        ids.sort_unstable();
        Ok(ids)
    }

    /// Returns the ids of messages whose text or subject contains `query`,
    /// in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if `SEARCH` fails.
    pub async fn search(&mut self, query: &str) -> Result<Vec<SeqNum>> {
        let criteria = SearchCriteria::or(
            SearchCriteria::Text(query.to_string()),
            SearchCriteria::Subject(query.to_string()),
        );
        Ok(self.client.search(criteria).await?)
    }

    /// Fetches the `Subject` header block and the body text of one message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the server has no such message.
    pub async fn fetch_header_and_body(&mut self, id: SeqNum) -> Result<(Vec<u8>, Vec<u8>)> {
        let items = self
            .fetch_one(
                id,
                vec![
                    FetchAttribute::body(HEADER_SECTION),
                    FetchAttribute::body(TEXT_SECTION),
                ],
            )
            .await?;

        let mut header = None;
        let mut text = None;
        for item in items {
            if let FetchItem::Body {
                section: Some(section),
                data,
            } = item
            {
                let data = data.unwrap_or_default();
                if section.to_ascii_uppercase().starts_with("HEADER") {
                    header = Some(data);
                } else if section.eq_ignore_ascii_case(TEXT_SECTION) {
                    text = Some(data);
                }
            }
        }

        match (header, text) {
            (Some(header), Some(text)) => Ok((header, text)),
            _ => Err(Error::Protocol(format!(
                "incomplete FETCH data for message {id}"
            ))),
        }
    }

    /// Fetches a complete message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the server has no such message.
    pub async fn fetch_full(&mut self, id: SeqNum) -> Result<Vec<u8>> {
        self.fetch_one(id, vec![FetchAttribute::Rfc822])
            .await?
            .into_iter()
            .find_map(|item| match item {
                FetchItem::Rfc822(data) => Some(data.unwrap_or_default()),
                _ => None,
            })
            .ok_or_else(|| Error::Protocol(format!("no RFC822 data for message {id}")))
    }

    pub(crate) fn into_client(self) -> Client<S, Selected> {
        self.client
    }

    async fn fetch_one(
        &mut self,
        id: SeqNum,
        items: Vec<FetchAttribute>,
    ) -> Result<Vec<FetchItem>> {
        self.client
            .fetch(&SequenceSet::from(id), items)
            .await?
            .into_iter()
            .find(|(seq, _)| *seq == id)
            .map(|(_, items)| items)
            .ok_or_else(|| Error::Protocol(format!("message {id} does not exist")))
    }
}

impl<S> MailboxSession<S, ReadWrite>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Marks one message `\Deleted`. It stays until [`Self::expunge`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for an id past the end of the mailbox
    /// (some servers answer `STORE` on it with OK), or if `STORE` fails.
    pub async fn flag_deleted(&mut self, id: SeqNum) -> Result<()> {
        if id.get() > self.count() {
            return Err(Error::Protocol(format!("message {id} does not exist")));
        }
        self.client
            .store(&SequenceSet::from(id), StoreAction::AddFlags(vec![Flag::Deleted]))
            .await?;
        tracing::debug!(id = id.get(), "flagged for deletion");
        Ok(())
    }

    /// Permanently removes every flagged message; returns the expunged ids.
    ///
    /// # Errors
    ///
    /// Returns an error if `EXPUNGE` fails.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let removed = self.client.expunge().await?;
        tracing::debug!(removed = removed.len(), "expunged");
        Ok(removed)
    }

    /// Stores a message in the mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if `APPEND` fails.
    pub async fn append(
        &mut self,
        message: &[u8],
        internal_date: DateTime<FixedOffset>,
    ) -> Result<()> {
        self.client.append(message, Some(internal_date)).await?;
        tracing::debug!(size = message.len(), "appended");
        Ok(())
    }
}
