//! IMAP response parser.
//!
//! Sans-I/O parser for the responses this client consumes: status
//! responses, CAPABILITY, EXISTS, SEARCH and FETCH. Anything else is kept as
//! [`UntaggedResponse::Other`] so unexpected server chatter never fails a
//! command.
//!
//! # Example
//!
//! ```
//! use mailbridge_imap::parser::{ResponseParser, Response, UntaggedResponse};
//!
//! let input = b"* OK IMAP4rev1 server ready\r\n";
//! let response = ResponseParser::parse(input).unwrap();
//!
//! match response {
//!     Response::Untagged(UntaggedResponse::Ok { text, .. }) => {
//!         assert!(text.contains("IMAP4rev1"));
//!     }
//!     _ => panic!("Expected untagged OK"),
//! }
//! ```

mod cursor;

use cursor::Cursor;

use crate::types::{Capability, ResponseCode, SeqNum, Status, Tag};
use crate::{Error, Result};

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Optional text/data.
        text: Option<String>,
    },
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK`
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* NO`
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BAD`
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* PREAUTH`
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BYE`
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n EXPUNGE`
    Expunge(SeqNum),
    /// `* SEARCH n ...`
    Search(Vec<SeqNum>),
    /// `* n FETCH (...)`
    Fetch {
        /// Sequence number of the message.
        seq: SeqNum,
        /// Data items this client understands.
        items: Vec<FetchItem>,
    },
    /// Any other untagged response, kept as text.
    Other(String),
}

/// A FETCH data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// `RFC822` raw message bytes (`None` for `NIL`).
    Rfc822(Option<Vec<u8>>),
    /// `RFC822.SIZE`
    Rfc822Size(u32),
    /// `UID`
    Uid(u32),
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete response, including any literals it carries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the response is malformed.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut cursor = Cursor::new(input);

        match cursor.peek() {
            Some(b'*') => {
                cursor.expect(b'*')?;
                cursor.expect(b' ')?;
                Self::parse_untagged(&mut cursor).map(Response::Untagged)
            }
            Some(b'+') => {
                cursor.expect(b'+')?;
                cursor.eat(b' ');
                let text = cursor.rest_of_line();
                Ok(Response::Continuation {
                    text: (!text.is_empty()).then_some(text),
                })
            }
            Some(_) => Self::parse_tagged(&mut cursor),
            None => Err(Error::Parse {
                position: 0,
                message: "empty response".to_string(),
            }),
        }
    }

    fn parse_tagged(cursor: &mut Cursor<'_>) -> Result<Response> {
        let tag = Tag::new(cursor.atom()?);
        cursor.expect(b' ')?;

        let word = cursor.atom()?;
        let status = Status::parse(word)
            .ok_or_else(|| cursor.error(&format!("unknown status {word}")))?;
        let (code, text) = Self::parse_resp_text(cursor)?;

        Ok(Response::Tagged {
            tag,
            status,
            code,
            text,
        })
    }

    fn parse_untagged(cursor: &mut Cursor<'_>) -> Result<UntaggedResponse> {
        if cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
            let number = cursor.number()?;
            cursor.expect(b' ')?;
            return Self::parse_message_data(cursor, number);
        }

        let word = cursor.atom()?;
        if let Some(status) = Status::parse(word) {
            let (code, text) = Self::parse_resp_text(cursor)?;
            return Ok(match status {
                Status::Ok => UntaggedResponse::Ok { code, text },
                Status::No => UntaggedResponse::No { code, text },
                Status::Bad => UntaggedResponse::Bad { code, text },
                Status::PreAuth => UntaggedResponse::PreAuth { code, text },
                Status::Bye => UntaggedResponse::Bye { code, text },
            });
        }

        match word.to_ascii_uppercase().as_str() {
            "CAPABILITY" => {
                let caps = cursor
                    .rest_of_line()
                    .split_ascii_whitespace()
                    .map(Capability::parse)
                    .collect();
                Ok(UntaggedResponse::Capability(caps))
            }
            "SEARCH" => {
                let mut ids = Vec::new();
                while cursor.eat(b' ') {
                    if !cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
                        // e.g. a trailing `(MODSEQ n)`
                        break;
                    }
                    if let Some(seq) = SeqNum::new(cursor.number()?) {
                        ids.push(seq);
                    }
                }
                Ok(UntaggedResponse::Search(ids))
            }
            _ => Ok(UntaggedResponse::Other(format!(
                "{word}{}",
                cursor.rest_of_line()
            ))),
        }
    }

    fn parse_message_data(cursor: &mut Cursor<'_>, number: u32) -> Result<UntaggedResponse> {
        let word = cursor.atom()?.to_ascii_uppercase();
        match word.as_str() {
            "EXISTS" => Ok(UntaggedResponse::Exists(number)),
            "EXPUNGE" => SeqNum::new(number)
                .map(UntaggedResponse::Expunge)
                .ok_or_else(|| cursor.error("EXPUNGE of message 0")),
            "FETCH" => {
                let seq = SeqNum::new(number).ok_or_else(|| cursor.error("FETCH of message 0"))?;
                cursor.expect(b' ')?;
                let items = Self::parse_fetch_items(cursor)?;
                Ok(UntaggedResponse::Fetch { seq, items })
            }
            _ => Ok(UntaggedResponse::Other(format!(
                "{number} {word}{}",
                cursor.rest_of_line()
            ))),
        }
    }

    fn parse_fetch_items(cursor: &mut Cursor<'_>) -> Result<Vec<FetchItem>> {
        cursor.expect(b'(')?;
        let mut items = Vec::new();

        loop {
            cursor.eat(b' ');
            if cursor.eat(b')') {
                return Ok(items);
            }
            if cursor.at_line_end() {
                return Err(cursor.error("unterminated FETCH item list"));
            }

            let name = cursor.atom()?.to_ascii_uppercase();
            match name.as_str() {
                "RFC822" => {
                    cursor.expect(b' ')?;
                    items.push(FetchItem::Rfc822(cursor.nstring()?));
                }
                "RFC822.SIZE" => {
                    cursor.expect(b' ')?;
                    items.push(FetchItem::Rfc822Size(cursor.number()?));
                }
                "UID" => {
                    cursor.expect(b' ')?;
                    items.push(FetchItem::Uid(cursor.number()?));
                }
                _ => {
                    // BODY[section]<origin> and friends
                    if cursor.peek() == Some(b'[') {
                        cursor.bracketed()?;
                    }
                    if cursor.peek() == Some(b'<') {
                        cursor.atom()?;
                    }
                    cursor.expect(b' ')?;
                    cursor.skip_value()?;
                }
            }
        }
    }

    fn parse_resp_text(cursor: &mut Cursor<'_>) -> Result<(Option<ResponseCode>, String)> {
        cursor.eat(b' ');
        let code = if cursor.peek() == Some(b'[') {
            let raw = cursor.bracketed()?;
            cursor.eat(b' ');
            Some(ResponseCode::parse(raw))
        } else {
            None
        };
        Ok((code, cursor.rest_of_line()))
    }
}
