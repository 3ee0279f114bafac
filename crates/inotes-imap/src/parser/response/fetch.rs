//! FETCH response parsing.

use crate::parser::lexer::{Lexer, Token};
use crate::{Error, Result};

use super::helpers::parse_flag_list;
use super::types::FetchItem;

/// Parses the parenthesized data items of a FETCH response.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => match name.to_ascii_uppercase().as_str() {
                "FLAGS" => {
                    lexer.expect_space()?;
                    items.push(FetchItem::Flags(parse_flag_list(lexer)?));
                }
                "BODY" if lexer.peek() == Some(b'[') => {
                    let section = parse_section(lexer);
                    lexer.expect_space()?;
                    let data = read_nstring_bytes(lexer)?;
                    items.push(FetchItem::Body { section, data });
                }
                "RFC822" => {
                    lexer.expect_space()?;
                    items.push(FetchItem::Rfc822(read_nstring_bytes(lexer)?));
                }
                _ => skip_fetch_value(lexer)?,
            },
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in FETCH data: {token:?}"),
                });
            }
        }
    }

    Ok(items)
}

/// Reads `[section]` and a trailing `<origin>` if present.
///
/// The section is taken verbatim since it may itself contain a
/// parenthesized header list, e.g. `HEADER.FIELDS (SUBJECT)`.
fn parse_section(lexer: &mut Lexer<'_>) -> Option<String> {
    lexer.advance();

    let mut section = Vec::new();
    while let Some(b) = lexer.advance() {
        if b == b']' {
            break;
        }
        section.push(b);
    }

    if lexer.peek() == Some(b'<') {
        while let Some(b) = lexer.advance() {
            if b == b'>' {
                break;
            }
        }
    }

    (!section.is_empty()).then(|| String::from_utf8_lossy(&section).into_owned())
}

/// Reads NIL, a quoted string or a literal as raw bytes.
fn read_nstring_bytes(lexer: &mut Lexer<'_>) -> Result<Option<Vec<u8>>> {
    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::Literal(data) => Ok(Some(data)),
        Token::QuotedString(s) => Ok(Some(s.into_bytes())),
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("Expected nstring, got {token:?}"),
        }),
    }
}

/// Skips the value of a data item this client did not ask for.
fn skip_fetch_value(lexer: &mut Lexer<'_>) -> Result<()> {
    // BODY[...] / BINARY[...] style names carry a section first.
    if lexer.peek() == Some(b'[') {
        let _ = parse_section(lexer);
    }
    lexer.expect_space()?;

    let mut depth = 0usize;
    loop {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen if depth > 0 => depth -= 1,
            Token::Eof | Token::Crlf | Token::RParen => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: "Unterminated FETCH data item".to_string(),
                });
            }
            _ => {}
        }
        if depth == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::types::Flag;

    use super::*;

    #[test]
    fn test_header_and_text_literals() {
        let data = b"(BODY[HEADER.FIELDS (SUBJECT)] {20}\r\nSubject: Groceries\r\n BODY[TEXT] {4}\r\nmilk)";
        let mut lexer = Lexer::new(data);
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert_eq!(
            items,
            vec![
                FetchItem::Body {
                    section: Some("HEADER.FIELDS (SUBJECT)".to_string()),
                    data: Some(b"Subject: Groceries\r\n".to_vec()),
                },
                FetchItem::Body {
                    section: Some("TEXT".to_string()),
                    data: Some(b"milk".to_vec()),
                },
            ]
        );
    }

    #[test]
    fn test_quoted_and_nil_bodies() {
        let mut lexer = Lexer::new(b"(BODY[TEXT] \"\" RFC822 NIL)");
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert_eq!(
            items,
            vec![
                FetchItem::Body {
                    section: Some("TEXT".to_string()),
                    data: Some(Vec::new()),
                },
                FetchItem::Rfc822(None),
            ]
        );
    }

    #[test]
    fn test_unrequested_items_are_skipped() {
        let data = b"(UID 77 INTERNALDATE \"05-Mar-2024 09:15:00 +0100\" ENVELOPE (NIL \"x\" ((NIL NIL \"a\" \"b\")) NIL NIL NIL NIL NIL NIL NIL) FLAGS (\\Seen \\Deleted))";
        let mut lexer = Lexer::new(data);
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert_eq!(items.len(), 1);
        match &items[0] {
            FetchItem::Flags(flags) => {
                assert!(flags.contains(&Flag::Seen));
                assert!(flags.is_deleted());
            }
            other => panic!("Expected FLAGS, got {other:?}"),
        }
    }

    #[test]
    fn test_rfc822_literal() {
        let mut lexer = Lexer::new(b"(RFC822 {11}\r\nSubject: a\n)");
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert_eq!(items, vec![FetchItem::Rfc822(Some(b"Subject: a\n".to_vec()))]);
    }

    #[test]
    fn test_unterminated_is_error() {
        let mut lexer = Lexer::new(b"(FLAGS (\\Seen)");
        assert!(parse_fetch_response(&mut lexer).is_err());
    }
}
