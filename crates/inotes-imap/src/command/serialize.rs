//! Command serialization helpers.

use chrono::{DateTime, FixedOffset};

use crate::types::{Flag, Mailbox};

use super::types::{FetchAttribute, SearchCriteria, StoreAction};

/// Command bytes under construction.
///
/// Strings that cannot travel inside a quoted string (CR, LF, NUL or
/// 8-bit bytes) are sent as synchronizing literals. The command is split
/// after each `{n}\r\n` announcement; the server must answer with a
/// continuation request before the next segment is written.
#[derive(Debug, Default)]
pub struct Wire {
    segments: Vec<Vec<u8>>,
    buf: Vec<u8>,
}

impl Wire {
    /// Starts a command line with its tag.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        let mut wire = Self::default();
        wire.put(tag.as_bytes());
        wire.push(b' ');
        wire
    }

    /// Appends raw bytes.
    pub fn put(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends one byte.
    pub fn push(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes an astring: an atom when possible, else a quoted string or
    /// a literal.
    pub fn astring(&mut self, s: &str) {
        if !s.is_empty() && !s.bytes().any(needs_quoting) {
            self.put(s.as_bytes());
        } else {
            self.string(s);
        }
    }

    /// Writes a string argument, quoted when it is plain 7-bit text.
    pub fn string(&mut self, s: &str) {
        if s.bytes().all(is_quotable) {
            self.quoted(s);
        } else {
            self.literal(s.as_bytes());
        }
    }

    fn quoted(&mut self, s: &str) {
        self.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                self.push(b'\\');
            }
            self.push(b);
        }
        self.push(b'"');
    }

    fn literal(&mut self, data: &[u8]) {
        self.put(format!("{{{}}}\r\n", data.len()).as_bytes());
        self.segments.push(std::mem::take(&mut self.buf));
        self.put(data);
    }

    /// Ends the command line and returns its segments.
    #[must_use]
    pub fn finish(mut self) -> Vec<Vec<u8>> {
        self.put(b"\r\n");
        self.segments.push(self.buf);
        self.segments
    }
}

/// Returns true if the byte cannot appear in an atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b >= 0x7F
}

/// Returns true if the byte may appear inside a quoted string.
const fn is_quotable(b: u8) -> bool {
    b != b'\r' && b != b'\n' && b != 0 && b < 0x80
}

/// Writes a mailbox name.
pub fn write_mailbox(wire: &mut Wire, mailbox: &Mailbox) {
    wire.astring(mailbox.as_str());
}

/// Writes a parenthesized flag list.
pub fn write_flag_list(wire: &mut Wire, flags: &[Flag]) {
    wire.push(b'(');
    for (i, flag) in flags.iter().enumerate() {
        if i > 0 {
            wire.push(b' ');
        }
        wire.put(flag.as_str().as_bytes());
    }
    wire.push(b')');
}

/// Writes FETCH items, parenthesized when there is more than one.
pub fn write_fetch_items(wire: &mut Wire, items: &[FetchAttribute]) {
    if let [single] = items {
        write_fetch_attribute(wire, single);
        return;
    }
    wire.push(b'(');
    for (i, attr) in items.iter().enumerate() {
        if i > 0 {
            wire.push(b' ');
        }
        write_fetch_attribute(wire, attr);
    }
    wire.push(b')');
}

fn write_fetch_attribute(wire: &mut Wire, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Rfc822 => wire.put(b"RFC822"),
        FetchAttribute::Body { section } => {
            wire.put(b"BODY[");
            if let Some(s) = section {
                wire.put(s.as_bytes());
            }
            wire.push(b']');
        }
    }
}

/// Writes STORE action.
pub fn write_store_action(wire: &mut Wire, action: &StoreAction, silent: bool) {
    let StoreAction::AddFlags(flags) = action;
    wire.put(b"+FLAGS");
    if silent {
        wire.put(b".SILENT");
    }
    wire.push(b' ');
    write_flag_list(wire, flags);
}

/// Writes SEARCH criteria.
pub fn write_search_criteria(wire: &mut Wire, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => wire.put(b"ALL"),
        SearchCriteria::Subject(s) => {
            wire.put(b"SUBJECT ");
            wire.string(s);
        }
        SearchCriteria::Text(s) => {
            wire.put(b"TEXT ");
            wire.string(s);
        }
        SearchCriteria::Or(a, b) => {
            wire.put(b"OR ");
            write_search_criteria(wire, a);
            wire.push(b' ');
            write_search_criteria(wire, b);
        }
    }
}

/// Writes an APPEND date-time, e.g. `"05-Mar-2024 09:15:00 +0100"`.
pub fn write_date_time(wire: &mut Wire, date: &DateTime<FixedOffset>) {
    let formatted = date.format("%d-%b-%Y %H:%M:%S %z").to_string();
    wire.string(&formatted);
}
