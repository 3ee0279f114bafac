//! Parsed response data types.

use crate::types::{Capability, Flags, ResponseCode, SeqNum};

/// One data item of a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// Message flags.
    Flags(Flags),
    /// `BODY[section]` data.
    Body {
        /// Section specifier as echoed by the server, e.g. `TEXT`.
        section: Option<String>,
        /// Section contents, `None` for NIL.
        data: Option<Vec<u8>>,
    },
    /// `RFC822` data (the whole message), `None` for NIL.
    Rfc822(Option<Vec<u8>>),
}

/// Untagged response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// OK status (informational).
    Ok {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// NO status (warning).
    No {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BAD status (protocol error).
    Bad {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// PREAUTH greeting.
    PreAuth {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BYE (server closing connection).
    Bye {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// CAPABILITY data.
    Capability(Vec<Capability>),
    /// FLAGS defined for the selected mailbox.
    Flags(Flags),
    /// Number of messages in the mailbox.
    Exists(u32),
    /// Number of recent messages.
    Recent(u32),
    /// A message was expunged.
    Expunge(SeqNum),
    /// FETCH data for one message.
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Data items.
        items: Vec<FetchItem>,
    },
    /// SEARCH results.
    Search(Vec<SeqNum>),
    /// Any untagged data this client has no use for, kept verbatim.
    Other(String),
}
