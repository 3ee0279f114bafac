//! Core IMAP identifiers: command tags and message sequence numbers.

use std::num::NonZeroU32;
use std::str::FromStr;

/// IMAP command tag.
///
/// Each command sent by the client has a unique tag, and the server's
/// completion response carries the same tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(pub String);

impl Tag {
    /// Creates a new tag from a string.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message sequence number.
///
/// Sequence numbers start at 1 and are only meaningful inside the current
/// mailbox selection: an EXPUNGE renumbers every message after the removed
/// one, so they must never be kept across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeqNum(pub NonZeroU32);

impl SeqNum {
    /// Creates a new sequence number.
    ///
    /// Returns `None` if the value is 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for SeqNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SeqNum {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<NonZeroU32>().map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tag_display() {
        assert_eq!(Tag::new("A0001").to_string(), "A0001");
    }

    #[test]
    fn seq_num_rejects_zero() {
        assert!(SeqNum::new(0).is_none());
        assert!("0".parse::<SeqNum>().is_err());
    }

    #[test]
    fn seq_num_parses_and_orders() {
        let a: SeqNum = " 3".parse().unwrap();
        let b: SeqNum = "12".parse().unwrap();
        assert!(a < b);
        assert_eq!(b.to_string(), "12");
        assert!("x".parse::<SeqNum>().is_err());
    }
}
