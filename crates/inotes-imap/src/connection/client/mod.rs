//! Type-state IMAP client connection.
//!
//! The connection states are encoded in the type so that only valid
//! commands can be issued:
//!
//! - `NotAuthenticated`: after the greeting
//! - `Authenticated`: after a successful LOGIN
//! - `Selected`: after a successful SELECT/EXAMINE
//!
//! Transitions consume the client. A failed transition hands the client
//! back inside [`TransitionError`] so the caller can still log out.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// IMAP client connection with type-state.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.capabilities)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// A state transition the server refused (or that failed in transit),
/// carrying the client in its previous state.
pub struct TransitionError<C> {
    /// Why the transition failed.
    pub error: Error,
    /// The client, still in its previous state.
    pub client: C,
}

impl<C> std::fmt::Debug for TransitionError<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<C> std::fmt::Display for TransitionError<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl<C> From<TransitionError<C>> for Error {
    fn from(failed: TransitionError<C>) -> Self {
        failed.error
    }
}

/// What a completed command left behind: untagged data and the code of
/// the tagged OK.
#[derive(Debug, Default)]
pub(crate) struct Completion {
    pub(crate) untagged: Vec<UntaggedResponse>,
    pub(crate) code: Option<ResponseCode>,
}

/// Shared implementation for all states.
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Checks if the server has a specific capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Ends the session with LOGOUT, from any state.
    ///
    /// The server answers with BYE and then the tagged OK; a server that
    /// hangs up right after its BYE is also treated as a clean logout.
    pub async fn logout(mut self) -> Result<()> {
        match self.execute(&Command::Logout).await {
            Ok(_) | Err(Error::Bye(_)) => {
                tracing::debug!("logged out");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Moves the connection into another state.
    pub(crate) fn into_state<T>(self, state: T) -> Client<S, T> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            state,
        }
    }

    /// Sends a command and collects responses up to its tagged completion.
    ///
    /// Literal arguments are sent only after the server asks for them.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Completion> {
        let tag = self.tag_gen.next();
        tracing::debug!(tag = %tag, command = command.name(), "sending command");

        let mut early = Vec::new();
        let mut segments = command.serialize(&tag).into_iter().peekable();
        while let Some(segment) = segments.next() {
            self.stream.write_command(&segment).await?;
            if segments.peek().is_some() {
                self.await_continuation(command.name(), &mut early).await?;
            }
        }

        let mut completion = self.read_until_tagged(&tag).await?;
        early.append(&mut completion.untagged);
        completion.untagged = early;
        Ok(completion)
    }

    /// Reads responses until the server requests the next literal.
    ///
    /// Untagged data arriving meanwhile is pushed onto `untagged`. A tagged
    /// response here means the command was refused before its literal.
    pub(crate) async fn await_continuation(
        &mut self,
        command: &str,
        untagged: &mut Vec<UntaggedResponse>,
    ) -> Result<()> {
        loop {
            let bytes = self.stream.read_response().await?;
            match ResponseParser::parse(&bytes)? {
                Response::Continuation { .. } => return Ok(()),
                Response::Untagged(response) => untagged.push(response),
                Response::Tagged { status, text, .. } => {
                    return Err(match status {
                        Status::No => Error::No(text),
                        Status::Bad => Error::Bad(text),
                        _ => Error::Protocol(format!(
                            "{command} completed before its literal: {text}"
                        )),
                    });
                }
            }
        }
    }

    /// Reads responses until the tagged completion for `tag` arrives.
    ///
    /// NO/BAD completions become errors. If the server sends BYE and then
    /// closes the connection, the BYE text is reported instead of the
    /// I/O error.
    pub(crate) async fn read_until_tagged(&mut self, tag: &str) -> Result<Completion> {
        let mut completion = Completion::default();
        let mut bye = None;

        loop {
            let bytes = match self.stream.read_response().await {
                Ok(bytes) => bytes,
                Err(e) => return Err(bye.map_or(e, Error::Bye)),
            };

            match ResponseParser::parse(&bytes)? {
                Response::Tagged {
                    tag: resp_tag,
                    status,
                    code,
                    text,
                } if resp_tag.as_str() == tag => {
                    return match status {
                        Status::Ok => {
                            completion.code = code;
                            Ok(completion)
                        }
                        Status::No => Err(Error::No(text)),
                        Status::Bad => Err(Error::Bad(text)),
                        Status::Bye => Err(Error::Bye(text)),
                        Status::PreAuth => Err(Error::Protocol(format!(
                            "unexpected PREAUTH completion for {tag}"
                        ))),
                    };
                }
                Response::Tagged { tag: other, .. } => {
                    tracing::warn!(expected = tag, got = %other, "ignoring response for unknown tag");
                }
                Response::Continuation { .. } => {
                    return Err(Error::Protocol(format!(
                        "unexpected continuation request while waiting for {tag}"
                    )));
                }
                Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                    tracing::info!(text = %text, "BYE");
                    bye = Some(text);
                }
                Response::Untagged(untagged) => {
                    trace_untagged(&untagged);
                    completion.untagged.push(untagged);
                }
            }
        }
    }

    /// Picks up capabilities announced during a command, either as
    /// untagged data or in the tagged response code.
    pub(crate) fn absorb_capabilities(&mut self, completion: &Completion) {
        for untagged in &completion.untagged {
            if let UntaggedResponse::Capability(caps) = untagged {
                self.capabilities.clone_from(caps);
            }
        }
        if let Some(ResponseCode::Capability(caps)) = &completion.code {
            self.capabilities.clone_from(caps);
        }
    }
}

fn trace_untagged(untagged: &UntaggedResponse) {
    match untagged {
        UntaggedResponse::Exists(count) => tracing::debug!(count, "EXISTS"),
        UntaggedResponse::Expunge(seq) => tracing::debug!(seq = seq.get(), "EXPUNGE"),
        UntaggedResponse::Fetch { seq, items } => {
            tracing::trace!(seq = seq.get(), items = items.len(), "FETCH");
        }
        UntaggedResponse::Ok {
            code: Some(ResponseCode::Alert),
            text,
        } => tracing::warn!(text = %text, "ALERT"),
        UntaggedResponse::No { text, .. } => tracing::warn!(text = %text, "NO"),
        UntaggedResponse::Bad { text, .. } => tracing::error!(text = %text, "BAD"),
        other => tracing::trace!(?other, "untagged"),
    }
}
