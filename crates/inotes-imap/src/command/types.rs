//! Command-related type definitions.

use crate::types::Flag;

/// Individual FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// RFC822 (full message).
    Rfc822,
    /// Body section.
    Body {
        /// Section specifier, e.g. `TEXT` or `HEADER.FIELDS (SUBJECT)`.
        section: Option<String>,
    },
}

impl FetchAttribute {
    /// `BODY[<section>]`, which marks the message as seen.
    #[must_use]
    pub fn body(section: impl Into<String>) -> Self {
        Self::Body {
            section: Some(section.into()),
        }
    }
}

/// STORE action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Add flags.
    AddFlags(Vec<Flag>),
}

/// SEARCH criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Subject contains text.
    Subject(String),
    /// Text in header or body.
    Text(String),
    /// OR of criteria.
    Or(Box<Self>, Box<Self>),
}

impl SearchCriteria {
    /// `OR a b`.
    #[must_use]
    pub fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }

    /// Returns true if any string argument contains non-ASCII characters.
    #[must_use]
    pub fn needs_charset(&self) -> bool {
        match self {
            Self::All => false,
            Self::Subject(s) | Self::Text(s) => !s.is_ascii(),
            Self::Or(a, b) => a.needs_charset() || b.needs_charset(),
        }
    }
}
