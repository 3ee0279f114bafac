//! Implementation for the selected state.

use chrono::{DateTime, FixedOffset};
use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, Selected};
use super::{Client, Completion};
use crate::command::{Command, FetchAttribute, SearchCriteria, StoreAction};
use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{Flags, Mailbox, SeqNum, SequenceSet};
use crate::Result;

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        self.state.mailbox()
    }

    /// Returns true if the mailbox was opened read-only.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.state.is_read_only()
    }

    /// Returns the current number of messages in the mailbox.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.state.exists()
    }

    /// Searches the mailbox.
    ///
    /// `CHARSET UTF-8` is announced when any search string is non-ASCII.
    pub async fn search(&mut self, criteria: SearchCriteria) -> Result<Vec<SeqNum>> {
        let charset = criteria.needs_charset().then(|| "UTF-8".to_string());
        let completion = self.run(&Command::Search { criteria, charset }).await?;

        Ok(completion
            .untagged
            .into_iter()
            .filter_map(|untagged| match untagged {
                UntaggedResponse::Search(ids) => Some(ids),
                _ => None,
            })
            .flatten()
            .collect())
    }

    /// Fetches data items for a set of messages.
    ///
    /// Returns the FETCH data in the order the server sent it.
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: Vec<FetchAttribute>,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        let completion = self
            .run(&Command::Fetch {
                sequence: sequence.clone(),
                items,
            })
            .await?;

        Ok(collect_fetches(completion))
    }

    /// Modifies message flags.
    ///
    /// Returns the resulting flags for each message the server reported.
    pub async fn store(
        &mut self,
        sequence: &SequenceSet,
        action: StoreAction,
    ) -> Result<Vec<(SeqNum, Flags)>> {
        let completion = self
            .run(&Command::Store {
                sequence: sequence.clone(),
                action,
                silent: false,
            })
            .await?;

        Ok(collect_fetches(completion)
            .into_iter()
            .filter_map(|(seq, items)| {
                items.into_iter().find_map(|item| match item {
                    FetchItem::Flags(flags) => Some((seq, flags)),
                    _ => None,
                })
            })
            .collect())
    }

    /// Permanently removes messages flagged `\Deleted`.
    ///
    /// Returns the sequence numbers the server reported as expunged, in
    /// the order reported (each one relative to the mailbox at that
    /// moment).
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let completion = self.run(&Command::Expunge).await?;

        Ok(completion
            .untagged
            .into_iter()
            .filter_map(|untagged| match untagged {
                UntaggedResponse::Expunge(seq) => Some(seq),
                _ => None,
            })
            .collect())
    }

    /// Appends a message to the selected mailbox.
    ///
    /// Sends the command, waits for the server's continuation request and
    /// then transmits the message as a literal.
    pub async fn append(
        &mut self,
        message: &[u8],
        internal_date: Option<DateTime<FixedOffset>>,
    ) -> Result<()> {
        let tag = self.tag_gen.next();
        let command = Command::Append {
            mailbox: self.state.mailbox.clone(),
            flags: None,
            internal_date,
            size: message.len(),
        };
        tracing::debug!(tag = %tag, size = message.len(), "sending command APPEND");
        self.stream
            .write_command(&command.serialize(&tag).concat())
            .await?;

        let mut early = Vec::new();
        let waited = self.await_continuation(command.name(), &mut early).await;
        for untagged in &early {
            self.state.observe(untagged);
        }
        waited?;

        self.stream.write_literal(message).await?;
        let completion = self.read_until_tagged(&tag).await?;
        self.track(&completion);
        Ok(())
    }

    /// Closes the mailbox (CLOSE) and returns to the authenticated state.
    ///
    /// The client is handed back even when CLOSE fails, so the caller can
    /// still log out.
    pub async fn close(mut self) -> (Client<S, Authenticated>, Result<()>) {
        let result = self.execute(&Command::Close).await.map(drop);
        (self.into_state(Authenticated), result)
    }

    async fn run(&mut self, command: &Command) -> Result<Completion> {
        let completion = self.execute(command).await?;
        self.track(&completion);
        Ok(completion)
    }

    fn track(&mut self, completion: &Completion) {
        for untagged in &completion.untagged {
            self.state.observe(untagged);
        }
    }
}

fn collect_fetches(completion: Completion) -> Vec<(SeqNum, Vec<FetchItem>)> {
    completion
        .untagged
        .into_iter()
        .filter_map(|untagged| match untagged {
            UntaggedResponse::Fetch { seq, items } => Some((seq, items)),
            _ => None,
        })
        .collect()
}
