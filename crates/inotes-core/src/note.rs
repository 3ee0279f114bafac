//! The note model.

use inotes_imap::SeqNum;

use crate::{Error, Result};

/// How a note body is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteFormat {
    /// Plain text.
    #[default]
    Plain,
    /// HTML, as written by the Notes app.
    Html,
}

/// A note stored as a message in the Notes folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Sequence number in the selection it was read from.
    ///
    /// Only meaningful until the connection that produced it is released.
    /// `None` for notes that are not stored yet.
    pub id: Option<SeqNum>,
    /// Note title, stored as the message subject.
    pub subject: String,
    /// Note text.
    pub body: String,
    /// Body format.
    pub format: NoteFormat,
}

impl Note {
    /// Creates a note that has not been stored yet.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>, format: NoteFormat) -> Self {
        Self {
            id: None,
            subject: subject.into(),
            body: body.into(),
            format,
        }
    }

    /// Returns true for HTML notes.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.format == NoteFormat::Html
    }

    /// Checks that the note can be stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNote`] if the subject is blank.
    pub fn validate(&self) -> Result<()> {
        if self.subject.trim().is_empty() {
            return Err(Error::InvalidNote("subject must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_subject_is_rejected() {
        assert!(Note::new("Groceries", "", NoteFormat::Plain).validate().is_ok());
        assert!(matches!(
            Note::new(" \t", "body", NoteFormat::Html).validate(),
            Err(Error::InvalidNote(_))
        ));
    }
}
