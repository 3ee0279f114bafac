//! IMAP protocol parser.
//!
//! A sans-I/O parser for the server responses the notes client meets. It
//! is split in two:
//!
//! - **Lexer**: tokenizes raw bytes into atoms, strings, numbers and literals
//! - **Response parser**: builds structured responses from tokens
//!
//! # Example
//!
//! ```
//! use inotes_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* 4 EXISTS\r\n").unwrap();
//! assert_eq!(response, Response::Untagged(UntaggedResponse::Exists(4)));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{FetchItem, Response, ResponseParser, UntaggedResponse};
