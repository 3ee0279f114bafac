//! Note operations against a scripted IMAP server.
//!
//! Each connection the repository opens takes the next script from the
//! transport; `tokio_test::io::Builder` checks every byte the client sends.

#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset, TimeZone};
use tokio_test::io::{Builder, Mock};

use inotes_core::{
    Config, ConnectionManager, Error, MailboxSession, NoteFormat, NoteRepository, ReadOnly,
    SeqNum, Transport,
};

const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1] iCloud IMAP4 service ready\r\n";

const CONFIG: &str = "\
[icloud]
hostname=imap.mail.me.com
username=jane@icloud.com
password=secret

[server]
username=jane
";

/// Hands out one scripted stream per connection.
struct Scripted {
    sessions: RefCell<VecDeque<Mock>>,
}

impl Scripted {
    fn new(sessions: impl IntoIterator<Item = Mock>) -> Self {
        Self {
            sessions: RefCell::new(sessions.into_iter().collect()),
        }
    }
}

impl Transport for Scripted {
    type Stream = Mock;

    async fn connect(&self, host: &str, port: u16) -> inotes_imap::Result<Mock> {
        assert_eq!(host, "imap.mail.me.com");
        assert_eq!(port, 993);
        self.sessions
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into())
    }
}

fn repository(sessions: impl IntoIterator<Item = Mock>) -> NoteRepository<Scripted> {
    let config = Config::parse(CONFIG).unwrap();
    NoteRepository::with_transport(Scripted::new(sessions), &config).with_clock(march_fifth)
}

/// A repository whose every connection attempt is refused.
fn offline() -> NoteRepository<Scripted> {
    repository(Vec::new())
}

fn march_fifth() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 5, 9, 15, 0)
        .unwrap()
}

fn seq(n: u32) -> SeqNum {
    SeqNum::new(n).unwrap()
}

fn tag(n: u32) -> String {
    format!("A{n:04}")
}

/// Greeting, LOGIN as tag 0, then EXAMINE or SELECT of Notes as tag 1.
fn open_notes<'a>(builder: &'a mut Builder, command: &str, exists: u32) -> &'a mut Builder {
    let access = if command == "EXAMINE" {
        "READ-ONLY"
    } else {
        "READ-WRITE"
    };
    builder
        .read(GREETING)
        .write(b"A0000 LOGIN jane@icloud.com secret\r\n")
        .read(b"A0000 OK LOGIN completed\r\n")
        .write(format!("A0001 {command} Notes\r\n").as_bytes())
        .read(b"* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n")
        .read(format!("* {exists} EXISTS\r\n* 0 RECENT\r\n").as_bytes())
        .read(format!("A0001 OK [{access}] {command} completed\r\n").as_bytes())
}

/// CLOSE as tag `next`, LOGOUT as tag `next + 1`.
fn release(builder: &mut Builder, next: u32) -> &mut Builder {
    let (close, logout) = (tag(next), tag(next + 1));
    builder
        .write(format!("{close} CLOSE\r\n").as_bytes())
        .read(format!("{close} OK CLOSE completed\r\n").as_bytes())
        .write(format!("{logout} LOGOUT\r\n").as_bytes())
        .read(format!("* BYE Logging out\r\n{logout} OK LOGOUT completed\r\n").as_bytes())
}

fn fetch_rfc822<'a>(
    builder: &'a mut Builder,
    tag_number: u32,
    id: u32,
    message: &str,
) -> &'a mut Builder {
    let t = tag(tag_number);
    builder
        .write(format!("{t} FETCH {id} RFC822\r\n").as_bytes())
        .read(format!("* {id} FETCH (RFC822 {{{}}}\r\n{message})\r\n", message.len()).as_bytes())
        .read(format!("{t} OK FETCH completed\r\n").as_bytes())
}

#[tokio::test]
async fn test_count_notes() {
    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 3);
    release(&mut script, 2);

    let notes = repository([script.build()]);
    assert_eq!(notes.count_notes().await.unwrap(), 3);
}

#[tokio::test]
async fn test_count_matches_search_all() {
    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 2);
    script
        .write(b"A0002 SEARCH ALL\r\n")
        .read(b"* SEARCH 2 1\r\nA0002 OK SEARCH completed\r\n");
    release(&mut script, 3);

    let config = Config::parse(CONFIG).unwrap();
    let connections = ConnectionManager::new(Scripted::new([script.build()]), config.credentials);
    let client = connections.open().await.unwrap();
    let mut session = MailboxSession::<_, ReadOnly>::open(client).await.unwrap();

    let ids = session.search_all().await.unwrap();
    assert_eq!(ids, vec![seq(1), seq(2)]);
    assert_eq!(session.count() as usize, ids.len());

    let report = connections.close(session).await;
    assert!(report.close.is_ok());
    report.into_result().unwrap();
}

#[tokio::test]
async fn test_search_finds_groceries_by_body_only() {
    let body = "<html><head></head><body>milk, eggs\r\n<br></body></html>";

    let mut found = Builder::new();
    open_notes(&mut found, "EXAMINE", 2);
    found
        .write(b"A0002 SEARCH OR TEXT \"eggs\" SUBJECT \"eggs\"\r\n")
        .read(b"* SEARCH 2\r\nA0002 OK SEARCH completed\r\n")
        .write(b"A0003 FETCH 2 (BODY[HEADER.FIELDS (SUBJECT)] BODY[TEXT])\r\n")
        .read(
            format!(
                "* 2 FETCH (BODY[HEADER.FIELDS (SUBJECT)] {{22}}\r\nSubject: Groceries\r\n\r\n BODY[TEXT] {{{}}}\r\n{body})\r\n",
                body.len()
            )
            .as_bytes(),
        )
        .read(b"A0003 OK FETCH completed\r\n");
    release(&mut found, 4);

    let mut missing = Builder::new();
    open_notes(&mut missing, "EXAMINE", 2);
    missing
        .write(b"A0002 SEARCH OR TEXT \"bread\" SUBJECT \"bread\"\r\n")
        .read(b"* SEARCH\r\nA0002 OK SEARCH completed\r\n");
    release(&mut missing, 3);

    let notes = repository([found.build(), missing.build()]);

    let results = notes.search_notes("eggs", true).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, Some(seq(2)));
    assert_eq!(results[0].subject, "Groceries");
    assert_eq!(results[0].body, "milk, eggs\n");
    assert_eq!(results[0].format, NoteFormat::Plain);

    assert!(notes.search_notes("bread", true).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_keeps_html_without_strip() {
    let header = "Subject: Café\r\n\r\n";
    let body = "<html><head></head><body>a<br></body></html>";

    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 1);
    script
        .write(b"A0002 SEARCH CHARSET UTF-8 OR TEXT {5}\r\n")
        .read(b"+ Ready for literal data\r\n")
        .write(b"caf\xc3\xa9 SUBJECT {5}\r\n")
        .read(b"+ Ready for literal data\r\n")
        .write(b"caf\xc3\xa9\r\n")
        .read(b"* SEARCH 1\r\nA0002 OK SEARCH completed\r\n")
        .write(b"A0003 FETCH 1 (BODY[HEADER.FIELDS (SUBJECT)] BODY[TEXT])\r\n")
        .read(
            format!(
                "* 1 FETCH (BODY[HEADER.FIELDS (SUBJECT)] {{{}}}\r\n{header} BODY[TEXT] {{{}}}\r\n{body})\r\n",
                header.len(),
                body.len()
            )
            .as_bytes(),
        )
        .read(b"A0003 OK FETCH completed\r\n");
    release(&mut script, 4);

    let notes = repository([script.build()]);
    let results = notes.search_notes("café", false).await.unwrap();
    assert_eq!(results[0].subject, "Café");
    assert_eq!(results[0].body, body);
    assert_eq!(results[0].format, NoteFormat::Html);
}

#[tokio::test]
async fn test_search_skips_messages_without_subject() {
    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 2);
    script
        .write(b"A0002 SEARCH OR TEXT \"milk\" SUBJECT \"milk\"\r\n")
        .read(b"* SEARCH 1 2\r\nA0002 OK SEARCH completed\r\n")
        .write(b"A0003 FETCH 1 (BODY[HEADER.FIELDS (SUBJECT)] BODY[TEXT])\r\n")
        .read(b"* 1 FETCH (BODY[HEADER.FIELDS (SUBJECT)] {2}\r\n\r\n BODY[TEXT] {4}\r\nmilk)\r\n")
        .read(b"A0003 OK FETCH completed\r\n")
        .write(b"A0004 FETCH 2 (BODY[HEADER.FIELDS (SUBJECT)] BODY[TEXT])\r\n")
        .read(b"* 2 FETCH (BODY[HEADER.FIELDS (SUBJECT)] {18}\r\nSubject: Dairy\r\n\r\n BODY[TEXT] {5}\r\nmilk\n)\r\n")
        .read(b"A0004 OK FETCH completed\r\n");
    release(&mut script, 5);

    let notes = repository([script.build()]);
    let results = notes.search_notes("milk", false).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, Some(seq(2)));
    assert_eq!(results[0].subject, "Dairy");
}

#[tokio::test]
async fn test_line_breaks_in_query_stay_inside_the_search() {
    let query = "x\r\nA9999 DELETE Notes";

    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 1);
    script
        .write(b"A0002 SEARCH OR TEXT {21}\r\n")
        .read(b"+ Ready for literal data\r\n")
        .write(b"x\r\nA9999 DELETE Notes SUBJECT {21}\r\n")
        .read(b"+ Ready for literal data\r\n")
        .write(b"x\r\nA9999 DELETE Notes\r\n")
        .read(b"* SEARCH\r\nA0002 OK SEARCH completed\r\n");
    release(&mut script, 3);

    let notes = repository([script.build()]);
    assert!(notes.search_notes(query, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stale_id_is_a_protocol_error_and_still_releases() {
    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 1);
    script
        .write(b"A0002 SEARCH OR TEXT \"x\" SUBJECT \"x\"\r\n")
        .read(b"* SEARCH 5\r\nA0002 OK SEARCH completed\r\n")
        .write(b"A0003 FETCH 5 (BODY[HEADER.FIELDS (SUBJECT)] BODY[TEXT])\r\n")
        .read(b"A0003 OK FETCH completed\r\n");
    release(&mut script, 4);

    let notes = repository([script.build()]);
    let err = notes.search_notes("x", false).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(msg) if msg.contains('5')));
}

#[tokio::test]
async fn test_create_html_note() {
    let message = "Date: Tue, 5 Mar 2024 09:15:00 +0100\r\n\
                   From: jane@me.com\r\n\
                   X-Uniform-Type-Identifier: com.apple.mail-note\r\n\
                   Content-Type: text/html; charset=utf-8\r\n\
                   Subject: Groceries\r\n\
                   \r\n\
                   <html><head></head><body>milk, eggs\r\n<br></body></html>";

    let mut script = Builder::new();
    open_notes(&mut script, "SELECT", 0);
    script
        .write(
            format!(
                "A0002 APPEND Notes \"05-Mar-2024 09:15:00 +0100\" {{{}}}\r\n",
                message.len()
            )
            .as_bytes(),
        )
        .read(b"+ Ready for literal data\r\n")
        .write(message.as_bytes())
        .write(b"\r\n")
        .read(b"* 1 EXISTS\r\nA0002 OK [APPENDUID 1 1] APPEND completed\r\n");
    release(&mut script, 3);

    let notes = repository([script.build()]);
    notes
        .create_note("Groceries", "milk, eggs\n", NoteFormat::Html)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_then_list() {
    let message = "Date: Tue, 5 Mar 2024 09:15:00 +0100\r\n\
                   From: jane@me.com\r\n\
                   X-Uniform-Type-Identifier: com.apple.mail-note\r\n\
                   Content-Type: text/plain; charset=utf-8\r\n\
                   Subject: Test\r\n\
                   \r\n\
                   hello";

    let mut create = Builder::new();
    open_notes(&mut create, "SELECT", 0);
    create
        .write(
            format!(
                "A0002 APPEND Notes \"05-Mar-2024 09:15:00 +0100\" {{{}}}\r\n",
                message.len()
            )
            .as_bytes(),
        )
        .read(b"+ go ahead\r\n")
        .write(message.as_bytes())
        .write(b"\r\n")
        .read(b"A0002 OK APPEND completed\r\n");
    release(&mut create, 3);

    let mut list = Builder::new();
    open_notes(&mut list, "EXAMINE", 1);
    list.write(b"A0002 SEARCH ALL\r\n")
        .read(b"* SEARCH 1\r\nA0002 OK SEARCH completed\r\n");
    fetch_rfc822(&mut list, 3, 1, message);
    release(&mut list, 4);

    let notes = repository([create.build(), list.build()]);
    notes
        .create_note("Test", "hello", NoteFormat::Plain)
        .await
        .unwrap();
    assert_eq!(notes.list_subjects().await.unwrap(), vec!["Test"]);
}

#[tokio::test]
async fn test_blank_subject_is_rejected_before_connecting() {
    let notes = offline();
    let err = notes
        .create_note("   ", "body", NoteFormat::Plain)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidNote(_)));
}

#[tokio::test]
async fn test_cursor_skips_messages_that_are_not_notes() {
    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 2);
    script
        .write(b"A0002 SEARCH ALL\r\n")
        .read(b"* SEARCH 1 2\r\nA0002 OK SEARCH completed\r\n");
    fetch_rfc822(&mut script, 3, 1, "From: someone@example.com\r\n\r\nno subject");
    fetch_rfc822(&mut script, 4, 2, "Subject: Second\r\n\r\nbody");
    release(&mut script, 5);

    let notes = repository([script.build()]);
    let mut cursor = notes.list_notes().await.unwrap();
    assert_eq!(cursor.remaining(), 2);

    assert_eq!(cursor.next_subject().await.unwrap().unwrap(), "Second");
    assert!(cursor.next_subject().await.is_none());
    cursor.close().await.unwrap();
}

#[tokio::test]
async fn test_delete_collects_per_id_failures() {
    let mut script = Builder::new();
    open_notes(&mut script, "SELECT", 3);
    script
        .write(b"A0002 STORE 1 +FLAGS (\\Deleted)\r\n")
        .read(b"* 1 FETCH (FLAGS (\\Deleted))\r\nA0002 OK STORE completed\r\n")
        .write(b"A0003 STORE 2 +FLAGS (\\Deleted)\r\n")
        .read(b"A0003 NO [CANNOT] Flags not permitted\r\n")
        .write(b"A0004 STORE 3 +FLAGS (\\Deleted)\r\n")
        .read(b"* 3 FETCH (FLAGS (\\Seen \\Deleted))\r\nA0004 OK STORE completed\r\n")
        .write(b"A0005 EXPUNGE\r\n")
        .read(b"* 3 EXPUNGE\r\n* 1 EXPUNGE\r\nA0005 OK EXPUNGE completed\r\n");
    release(&mut script, 6);

    let notes = repository([script.build()]);
    let report = notes
        .delete_notes(&[seq(1), seq(2), seq(3), seq(7)])
        .await
        .unwrap();

    assert_eq!(report.flagged, vec![seq(1), seq(3)]);
    assert_eq!(report.expunged, vec![seq(3), seq(1)]);
    assert!(!report.is_complete());
    let failed: Vec<SeqNum> = report.failed.iter().map(|(id, _)| *id).collect();
    assert_eq!(failed, vec![seq(2), seq(7)]);
    assert!(
        report
            .failed
            .iter()
            .all(|(_, error)| matches!(error, Error::Protocol(_)))
    );
}

#[tokio::test]
async fn test_delete_twice_flagged_id_expunges_once() {
    let mut script = Builder::new();
    open_notes(&mut script, "SELECT", 2);
    script
        .write(b"A0002 STORE 2 +FLAGS (\\Deleted)\r\n")
        .read(b"* 2 FETCH (FLAGS (\\Deleted))\r\nA0002 OK STORE completed\r\n")
        .write(b"A0003 STORE 2 +FLAGS (\\Deleted)\r\n")
        .read(b"* 2 FETCH (FLAGS (\\Deleted))\r\nA0003 OK STORE completed\r\n")
        .write(b"A0004 EXPUNGE\r\n")
        .read(b"* 2 EXPUNGE\r\nA0004 OK EXPUNGE completed\r\n");
    release(&mut script, 5);

    let mut after = Builder::new();
    open_notes(&mut after, "EXAMINE", 1);
    after
        .write(b"A0002 SEARCH ALL\r\n")
        .read(b"* SEARCH 1\r\nA0002 OK SEARCH completed\r\n");
    fetch_rfc822(&mut after, 3, 1, "Subject: Kept\r\n\r\n");
    release(&mut after, 4);

    let notes = repository([script.build(), after.build()]);
    let report = notes.delete_notes(&[seq(2), seq(2)]).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.expunged, vec![seq(2)]);

    assert_eq!(notes.list_subjects().await.unwrap(), vec!["Kept"]);
}

#[tokio::test]
async fn test_delete_nothing_does_not_connect() {
    let notes = offline();
    let report = notes.delete_notes(&[]).await.unwrap();
    assert!(report.flagged.is_empty());
}

#[tokio::test]
async fn test_rejected_login_is_auth_error() {
    let script = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN jane@icloud.com secret\r\n")
        .read(b"A0000 NO [AUTHENTICATIONFAILED] Authentication failed.\r\n")
        .build();

    let notes = repository([script]);
    let err = notes.count_notes().await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
}

#[tokio::test]
async fn test_unreadable_login_reply_is_transport_error() {
    let script = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN jane@icloud.com secret\r\n")
        .read(b"A0000 MAYBE come back later\r\n")
        .build();

    let notes = repository([script]);
    let err = notes.count_notes().await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let notes = offline();
    let err = notes.count_notes().await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_missing_mailbox_logs_out() {
    let script = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN jane@icloud.com secret\r\n")
        .read(b"A0000 OK LOGIN completed\r\n")
        .write(b"A0001 EXAMINE Notes\r\n")
        .read(b"A0001 NO [NONEXISTENT] Mailbox doesn't exist: Notes\r\n")
        .write(b"A0002 LOGOUT\r\n")
        .read(b"* BYE Logging out\r\nA0002 OK LOGOUT completed\r\n")
        .build();

    let notes = repository([script]);
    let err = notes.count_notes().await.unwrap_err();
    assert!(matches!(err, Error::Protocol(msg) if msg.contains("doesn't exist")));
}

#[tokio::test]
async fn test_read_only_select_refuses_writes() {
    let script = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN jane@icloud.com secret\r\n")
        .read(b"A0000 OK LOGIN completed\r\n")
        .write(b"A0001 SELECT Notes\r\n")
        .read(b"* 4 EXISTS\r\nA0001 OK [READ-ONLY] SELECT completed\r\n")
        .write(b"A0002 CLOSE\r\n")
        .read(b"A0002 OK CLOSE completed\r\n")
        .write(b"A0003 LOGOUT\r\n")
        .read(b"A0003 OK LOGOUT completed\r\n")
        .build();

    let notes = repository([script]);
    let err = notes.delete_notes(&[seq(1)]).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(msg) if msg.contains("read-only")));
}

#[tokio::test]
async fn test_close_failure_is_suppressed() {
    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 7);
    script
        .write(b"A0002 CLOSE\r\n")
        .read(b"A0002 NO Cannot close\r\n")
        .write(b"A0003 LOGOUT\r\n")
        .read(b"* BYE Logging out\r\nA0003 OK LOGOUT completed\r\n");

    let notes = repository([script.build()]);
    assert_eq!(notes.count_notes().await.unwrap(), 7);
}

#[tokio::test]
async fn test_logout_failure_surfaces() {
    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 7);
    script
        .write(b"A0002 CLOSE\r\n")
        .read(b"A0002 OK CLOSE completed\r\n")
        .write(b"A0003 LOGOUT\r\n")
        .read(b"A0003 BAD Command unknown\r\n");

    let notes = repository([script.build()]);
    let err = notes.count_notes().await.unwrap_err();
    assert!(matches!(err, Error::Protocol(msg) if msg.contains("unknown")));
}

#[tokio::test]
async fn test_operation_error_wins_over_logout_error() {
    let mut script = Builder::new();
    open_notes(&mut script, "EXAMINE", 1);
    script
        .write(b"A0002 SEARCH OR TEXT \"x\" SUBJECT \"x\"\r\n")
        .read(b"A0002 NO Search failed\r\n")
        .write(b"A0003 CLOSE\r\n")
        .read(b"A0003 OK CLOSE completed\r\n")
        .write(b"A0004 LOGOUT\r\n")
        .read(b"A0004 BAD Command unknown\r\n");

    let notes = repository([script.build()]);
    let err = notes.search_notes("x", false).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(msg) if msg.contains("Search failed")));
}
