//! Conversion between notes and the messages that store them.
//!
//! A stored note is a plain RFC 822 message:
//!
//! ```text
//! Date: Tue, 5 Mar 2024 09:15:00 +0100
//! From: jane@me.com
//! X-Uniform-Type-Identifier: com.apple.mail-note
//! Content-Type: text/html; charset=utf-8
//! Subject: Groceries
//!
//! <html><head></head><body>milk, eggs
//! <br></body></html>
//! ```
//!
//! Everything here is pure: no I/O, no clock.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset};

use crate::note::{Note, NoteFormat};
use crate::{Error, Result};

/// Header that marks a message as a note.
pub const MARKER_HEADER: &str = "X-Uniform-Type-Identifier";

/// Value of [`MARKER_HEADER`].
pub const MARKER_VALUE: &str = "com.apple.mail-note";

/// Domain of the synthesized `From` address.
pub const FROM_DOMAIN: &str = "me.com";

const HTML_OPEN: &str = "<html><head></head><body>";
const HTML_CLOSE: &str = "</body></html>";
const LINE_BREAK: &str = "<br>";

/// Raw bytes per encoded word, so a folded `Subject` line fits in 78 columns.
const ENCODED_WORD_CHUNK: usize = 39;

/// How the `Content-Type` header of a new note is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentTypePolicy {
    /// Declare what the body actually is.
    #[default]
    PerFormat,
    /// Always declare `text/html;`, even for plain bodies.
    AlwaysHtml,
}

impl ContentTypePolicy {
    /// Returns the header value for a body of the given format.
    #[must_use]
    pub const fn header_value(self, format: NoteFormat) -> &'static str {
        match (self, format) {
            (Self::AlwaysHtml, _) => "text/html;",
            (Self::PerFormat, NoteFormat::Html) => "text/html; charset=utf-8",
            (Self::PerFormat, NoteFormat::Plain) => "text/plain; charset=utf-8",
        }
    }
}

/// Encodes notes for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCodec {
    from_local: String,
    content_type: ContentTypePolicy,
}

impl NoteCodec {
    /// Creates a codec writing `From: <from_local>@me.com`.
    #[must_use]
    pub fn new(from_local: impl Into<String>, content_type: ContentTypePolicy) -> Self {
        Self {
            from_local: from_local.into(),
            content_type,
        }
    }

    /// Returns the synthesized sender address.
    #[must_use]
    pub fn from_address(&self) -> String {
        format!("{}@{FROM_DOMAIN}", self.from_local)
    }

    /// Builds the stored message for `note`, dated `now`.
    ///
    /// Line endings are CRLF throughout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNote`] if the note has a blank subject.
    pub fn encode(&self, note: &Note, now: DateTime<FixedOffset>) -> Result<String> {
        note.validate()?;

        let body = match note.format {
            NoteFormat::Html => wrap_html(&note.body),
            NoteFormat::Plain => note.body.clone(),
        };

        let headers = [
            format!("Date: {}", now.to_rfc2822()),
            format!("From: {}", self.from_address()),
            format!("{MARKER_HEADER}: {MARKER_VALUE}"),
            format!(
                "Content-Type: {}",
                self.content_type.header_value(note.format)
            ),
            format!("Subject: {}", encode_subject(&note.subject)),
        ];

        let mut message = headers.join("\r\n");
        message.push_str("\r\n\r\n");
        message.push_str(&to_crlf(&body));
        Ok(message)
    }
}

/// Wraps a plain body into the HTML layout the Notes app reads.
///
/// Every line keeps its terminator and is followed by `<br>`.
#[must_use]
pub fn wrap_html(body: &str) -> String {
    let mut html = String::with_capacity(body.len() + 64);
    html.push_str(HTML_OPEN);
    for line in body.split_inclusive('\n') {
        html.push_str(line);
        html.push_str(LINE_BREAK);
    }
    html.push_str(HTML_CLOSE);
    html
}

/// Decodes a note from a fetched header block and body.
///
/// The body is returned with LF line endings. The format is HTML when the
/// body starts with an `<html` tag.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the header block has no `Subject` field.
pub fn decode(header_block: &[u8], body: &[u8]) -> Result<Note> {
    let subject = subject_from_headers(&String::from_utf8_lossy(header_block))?;
    let body = to_lf(&String::from_utf8_lossy(body));
    let format = if starts_with_html_tag(&body) {
        NoteFormat::Html
    } else {
        NoteFormat::Plain
    };

    Ok(Note {
        id: None,
        subject,
        body,
        format,
    })
}

/// Decodes a complete message, split at its first blank line.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_message(raw: &[u8]) -> Result<Note> {
    let (headers, body) = split_message(raw);
    decode(headers, body)
}

/// Extracts only the subject of a complete message.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the message has no `Subject` field.
pub fn subject_of(raw: &[u8]) -> Result<String> {
    let (headers, _) = split_message(raw);
    subject_from_headers(&String::from_utf8_lossy(headers))
}

fn subject_from_headers(block: &str) -> Result<String> {
    header_value(block, "Subject")
        .map(|value| decode_words(&value).trim().to_string())
        .ok_or_else(|| Error::Parse("message has no Subject header".to_string()))
}

/// Finds a header field, unfolding continuation lines.
fn header_value(block: &str, name: &str) -> Option<String> {
    let mut value: Option<String> = None;

    for line in block.lines() {
        if line.is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            if let Some(value) = value.as_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if value.is_some() {
            break;
        }
        if let Some((field, rest)) = line.split_once(':') {
            if field.trim().eq_ignore_ascii_case(name) {
                value = Some(rest.trim().to_string());
            }
        }
    }

    value
}

fn split_message(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(at) = find(raw, b"\r\n\r\n") {
        (&raw[..at + 2], &raw[at + 4..])
    } else if let Some(at) = find(raw, b"\n\n") {
        (&raw[..at + 1], &raw[at + 2..])
    } else {
        (raw, &[][..])
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn starts_with_html_tag(body: &str) -> bool {
    body.trim_start()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<html"))
}

fn to_crlf(text: &str) -> String {
    to_lf(text).replace('\n', "\r\n")
}

fn to_lf(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Makes a subject safe for a single header line, encoding it when needed.
fn encode_subject(subject: &str) -> String {
    let clean: String = subject
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let clean = clean.trim();

    if clean.is_ascii() && !clean.contains("=?") {
        return clean.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in clean.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join("\r\n ")
}

fn encoded_word(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(text))
}

/// Decodes RFC 2047 encoded words, leaving other text as is.
///
/// Whitespace between two adjacent encoded words is dropped.
fn decode_words(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        if let Some((text, consumed)) = parse_encoded_word(candidate) {
            if !(after_word && before.chars().all(char::is_whitespace)) {
                out.push_str(before);
            }
            out.push_str(&text);
            rest = &candidate[consumed..];
            after_word = true;
        } else {
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            after_word = false;
        }
    }

    out.push_str(rest);
    out
}

/// Parses `=?charset?encoding?text?=` at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed.
fn parse_encoded_word(s: &str) -> Option<(String, usize)> {
    let inner = s.strip_prefix("=?")?;
    let (charset_field, inner) = inner.split_once('?')?;
    let (encoding, inner) = inner.split_once('?')?;
    let end = inner.find("?=")?;
    let text = &inner[..end];

    if charset_field.is_empty() || text.contains(char::is_whitespace) {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => STANDARD.decode(text).ok()?,
        "Q" | "q" => decode_q(text)?,
        _ => return None,
    };

    // `charset` may carry an RFC 2231 language suffix.
    let charset = charset_field.split('*').next().unwrap_or(charset_field);
    let decoded = if charset.eq_ignore_ascii_case("iso-8859-1") {
        bytes.iter().copied().map(char::from).collect()
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let consumed = 2 + charset_field.len() + 1 + encoding.len() + 1 + end + 2;
    Some((decoded, consumed))
}

fn decode_q(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();

    while let Some(b) = bytes.next() {
        match b {
            b'_' => out.push(b' '),
            b'=' => {
                let hi = hex_value(bytes.next()?)?;
                let lo = hex_value(bytes.next()?)?;
                out.push((hi << 4) | lo);
            }
            other => out.push(other),
        }
    }

    Some(out)
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
