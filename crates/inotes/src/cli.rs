//! Command-line arguments.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use inotes_core::{NoteFormat, SeqNum};

/// Keep notes in the Notes folder of an IMAP account.
///
/// Without an action flag, creates a note titled by --subject whose body is
/// read from standard input until end of file.
#[derive(Parser, Debug)]
#[command(name = "inotes", author, version, about)]
#[command(group(
    ArgGroup::new("action").args(["count", "list", "query", "subject", "delete"])
))]
pub struct Cli {
    /// Read the configuration from PATH instead of ~/inotes.conf
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the number of notes
    #[arg(long, short = 'C')]
    pub count: bool,

    /// List note subjects
    #[arg(long, short)]
    pub list: bool,

    /// Print the notes whose subject or text contains TEXT
    #[arg(long, short, value_name = "TEXT")]
    pub query: Option<String>,

    /// Create a note with this subject
    #[arg(long, short, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Save the new note as HTML
    #[arg(long, short = 'H')]
    pub html: bool,

    /// Remove HTML tags from displayed notes
    #[arg(long = "striphtml", short = 'S')]
    pub strip_html: bool,

    /// Log debug messages, including the IMAP exchange
    #[arg(long, short)]
    pub debug: bool,

    /// Delete the notes with these ids
    ///
    /// Ids are message sequence numbers in the Notes folder and change
    /// whenever a note is deleted.
    #[arg(long, short = 'x', value_name = "ID", num_args = 1..)]
    pub delete: Vec<SeqNum>,
}

/// The one thing an invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Count,
    List,
    Search { query: String, strip_html: bool },
    Create { subject: String, format: NoteFormat },
    Delete(Vec<SeqNum>),
}

impl Cli {
    /// Resolves the requested action; creating is the default.
    pub fn action(&self) -> Result<Action, clap::Error> {
        if self.count {
            return Ok(Action::Count);
        }
        if self.list {
            return Ok(Action::List);
        }
        if let Some(query) = &self.query {
            return Ok(Action::Search {
                query: query.clone(),
                strip_html: self.strip_html,
            });
        }
        if !self.delete.is_empty() {
            return Ok(Action::Delete(self.delete.clone()));
        }

        match &self.subject {
            Some(subject) if !subject.trim().is_empty() => Ok(Action::Create {
                subject: subject.clone(),
                format: if self.html {
                    NoteFormat::Html
                } else {
                    NoteFormat::Plain
                },
            }),
            Some(_) => Err(Self::command().error(
                ErrorKind::InvalidValue,
                "the note subject must not be empty",
            )),
            None => Err(Self::command().error(
                ErrorKind::MissingRequiredArgument,
                "a subject is required to create a note (use -s/--subject)",
            )),
        }
    }
}
