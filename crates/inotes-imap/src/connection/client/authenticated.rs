//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, Selected};
use super::{Client, Completion, TransitionError};
use crate::command::Command;
use crate::parser::UntaggedResponse;
use crate::types::{Mailbox, MailboxStatus, ResponseCode};

/// Result of SELECT/EXAMINE: the selected client, or the authenticated
/// client handed back with the reason.
pub type SelectResult<S> = std::result::Result<
    (Client<S, Selected>, MailboxStatus),
    TransitionError<Client<S, Authenticated>>,
>;

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Selects a mailbox for read-write access.
    pub async fn select(self, mailbox: &str) -> SelectResult<S> {
        self.open(Mailbox::new(mailbox), false).await
    }

    /// Examines a mailbox (read-only SELECT).
    pub async fn examine(self, mailbox: &str) -> SelectResult<S> {
        self.open(Mailbox::new(mailbox), true).await
    }

    async fn open(mut self, mailbox: Mailbox, examine: bool) -> SelectResult<S> {
        let command = if examine {
            Command::Examine {
                mailbox: mailbox.clone(),
            }
        } else {
            Command::Select {
                mailbox: mailbox.clone(),
            }
        };

        match self.execute(&command).await {
            Ok(completion) => {
                let status = mailbox_status(&completion, examine);
                tracing::debug!(
                    mailbox = %mailbox,
                    exists = status.exists,
                    read_only = status.read_only,
                    "mailbox selected"
                );
                let state = Selected::new(mailbox, &status);
                Ok((self.into_state(state), status))
            }
            Err(error) => {
                tracing::debug!(mailbox = %mailbox, %error, "mailbox selection failed");
                Err(TransitionError {
                    error,
                    client: self,
                })
            }
        }
    }
}

/// Collects the mailbox status from a SELECT/EXAMINE exchange.
fn mailbox_status(completion: &Completion, examine: bool) -> MailboxStatus {
    let mut status = MailboxStatus {
        read_only: examine,
        ..MailboxStatus::default()
    };

    for untagged in &completion.untagged {
        match untagged {
            UntaggedResponse::Exists(n) => status.exists = *n,
            UntaggedResponse::Recent(n) => status.recent = *n,
            UntaggedResponse::Flags(flags) => status.flags = flags.clone(),
            _ => {}
        }
    }

    match completion.code {
        Some(ResponseCode::ReadOnly) => status.read_only = true,
        Some(ResponseCode::ReadWrite) => status.read_only = false,
        _ => {}
    }

    status
}
