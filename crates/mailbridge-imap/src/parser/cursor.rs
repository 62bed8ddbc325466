//! Byte cursor over one framed response.

use crate::{Error, Result};

/// Reads IMAP syntax elements from a complete response, literals included.
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Returns true once only the line terminator (or nothing) is left.
    #[must_use]
    pub fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(b'\r' | b'\n'))
    }

    /// Consumes `byte` if it is next.
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes `byte` or fails.
    pub fn expect(&mut self, byte: u8) -> Result<()> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", char::from(byte))))
        }
    }

    /// Reads an atom: a run of bytes up to a space, paren, bracket or CRLF.
    pub fn atom(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'(' | b')' | b'[' | b']' | b'\r' | b'\n') {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected atom"));
        }
        let input = self.input;
        std::str::from_utf8(&input[start..self.pos]).map_err(|_| self.error("non-UTF-8 atom"))
    }

    /// Reads an unsigned 32-bit number.
    pub fn number(&mut self) -> Result<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| self.error("expected number"))
    }

    /// Reads an `nstring`: `NIL`, a quoted string or a literal.
    pub fn nstring(&mut self) -> Result<Option<Vec<u8>>> {
        match self.peek() {
            Some(b'"') => self.quoted().map(Some),
            Some(b'{') => self.literal().map(|bytes| Some(bytes.to_vec())),
            _ => {
                let atom = self.atom()?;
                if atom.eq_ignore_ascii_case("NIL") {
                    Ok(None)
                } else {
                    Err(self.error(&format!("expected string, got {atom}")))
                }
            }
        }
    }

    /// Reads the text between the cursor and the closing `]`.
    pub fn bracketed(&mut self) -> Result<&'a str> {
        self.expect(b'[')?;
        let input = self.input;
        let start = self.pos;
        let len = input[start..]
            .iter()
            .position(|&b| b == b']')
            .ok_or_else(|| self.error("unterminated '['"))?;
        self.pos += len + 1;
        std::str::from_utf8(&input[start..start + len])
            .map_err(|_| self.error("non-UTF-8 response code"))
    }

    /// Returns everything up to the line terminator as lossy text.
    pub fn rest_of_line(&mut self) -> String {
        let start = self.pos;
        while !self.at_line_end() {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// Skips one value of any shape: atom, number, string, literal or list.
    pub fn skip_value(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                loop {
                    self.eat(b' ');
                    if self.eat(b')') {
                        return Ok(());
                    }
                    if self.at_line_end() {
                        return Err(self.error("unterminated list"));
                    }
                    self.skip_value()?;
                }
            }
            Some(b'"') => self.quoted().map(drop),
            Some(b'{') => self.literal().map(drop),
            Some(_) => {
                self.atom()?;
                if self.peek() == Some(b'[') {
                    self.bracketed()?;
                }
                Ok(())
            }
            None => Err(self.error("unexpected end of response")),
        }
    }

    fn quoted(&mut self) -> Result<Vec<u8>> {
        self.expect(b'"')?;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c @ (b'"' | b'\\')) => out.push(c),
                        _ => return Err(self.error("invalid escape in quoted string")),
                    }
                    self.pos += 1;
                }
                Some(b'\r' | b'\n') | None => {
                    return Err(self.error("unterminated quoted string"));
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn literal(&mut self) -> Result<&'a [u8]> {
        self.expect(b'{')?;
        let len = usize::try_from(self.number()?).map_err(|_| self.error("literal too large"))?;
        self.eat(b'+');
        self.expect(b'}')?;
        self.expect(b'\r')?;
        self.expect(b'\n')?;

        let input = self.input;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= input.len())
            .ok_or_else(|| self.error("literal exceeds response"))?;
        let bytes = &input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Builds a parse error at the current position.
    #[must_use]
    pub fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }
}
