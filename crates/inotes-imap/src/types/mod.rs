//! Core IMAP types.
//!
//! The subset of RFC 3501 (`IMAP4rev1`) vocabulary needed to manage a single
//! mailbox of notes: tags, sequence numbers, flags and selection status.

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{SeqNum, Tag};
pub use mailbox::{Mailbox, MailboxStatus};
pub use response_code::ResponseCode;
pub use sequence::SequenceSet;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_num_new() {
        assert!(SeqNum::new(0).is_none());
        assert_eq!(SeqNum::new(42).map(SeqNum::get), Some(42));
    }

    #[test]
    fn test_capability_parse() {
        assert_eq!(Capability::parse("IMAP4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("logindisabled"), Capability::LoginDisabled);
        assert_eq!(
            Capability::parse("AUTH=PLAIN"),
            Capability::Auth("PLAIN".to_string())
        );
        assert_eq!(
            Capability::parse("XAPPLEPUSHSERVICE"),
            Capability::Unknown("XAPPLEPUSHSERVICE".to_string())
        );
    }

    #[test]
    fn test_sequence_set_display() {
        let single = SeqNum::new(7).map(SequenceSet::Single);
        assert_eq!(single.map(|s| s.to_string()).as_deref(), Some("7"));
        assert_eq!(
            SequenceSet::range(2, 9).map(|s| s.to_string()).as_deref(),
            Some("2:9")
        );
    }
}
