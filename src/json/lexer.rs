//! JSON lexer/tokenizer.
//!
//! Converts raw JSON input bytes into a stream of tokens for the parser.
//! Input must be valid UTF-8; callers that want lossy handling convert
//! before constructing the lexer.

use super::limits::Limits;
use crate::error::{ErrorCode, JsonResult};

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Left brace `{`
    LeftBrace,
    /// Right brace `}`
    RightBrace,
    /// Left bracket `[`
    LeftBracket,
    /// Right bracket `]`
    RightBracket,
    /// Colon `:`
    Colon,
    /// Comma `,`
    Comma,
    /// Null literal
    Null,
    /// True literal
    True,
    /// False literal
    False,
    /// String value (unescaped)
    String(String),
    /// Number value as written in the input
    Number(String),
    /// End of input
    Eof,
}

/// JSON lexer that tokenizes input.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    limits: Limits,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a [u8], limits: Limits) -> JsonResult<Self> {
        if input.len() as u64 > limits.max_input_size {
            return Err(ErrorCode::InputTooLarge(
                input.len() as u64,
                limits.max_input_size,
            ));
        }

        if std::str::from_utf8(input).is_err() {
            return Err(ErrorCode::InvalidUtf8);
        }

        Ok(Self {
            input,
            pos: 0,
            limits,
        })
    }

    /// Get the current position in the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn invalid(&self) -> ErrorCode {
        ErrorCode::InvalidJson(self.pos as u64)
    }

    /// Peek at the current byte without consuming it.
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consume and return the current byte.
    fn advance(&mut self) -> Option<u8> {
        let b = self.input.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    /// Skip whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Read the next token from the input.
    pub fn next_token(&mut self) -> JsonResult<Token> {
        self.skip_whitespace();

        let token = match self.peek() {
            None => return Ok(Token::Eof),
            Some(b'{') => Token::LeftBrace,
            Some(b'}') => Token::RightBrace,
            Some(b'[') => Token::LeftBracket,
            Some(b']') => Token::RightBracket,
            Some(b':') => Token::Colon,
            Some(b',') => Token::Comma,
            Some(b'"') => return self.read_string(),
            Some(b'-' | b'0'..=b'9') => return self.read_number(),
            Some(b't') => return self.read_literal(b"true", Token::True),
            Some(b'f') => return self.read_literal(b"false", Token::False),
            Some(b'n') => return self.read_literal(b"null", Token::Null),
            Some(_) => return Err(self.invalid()),
        };
        self.pos += 1;
        Ok(token)
    }

    /// Read a string token, handling escape sequences.
    fn read_string(&mut self) -> JsonResult<Token> {
        // Consume opening quote
        self.advance();

        let mut result = String::new();

        loop {
            match self.advance() {
                None => return Err(self.invalid()),
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = self.read_escape_sequence()?;
                    result.push(escaped);
                }
                Some(b) if b < 0x20 => {
                    // Control characters must be escaped
                    return Err(ErrorCode::InvalidJson(self.pos as u64 - 1));
                }
                Some(b) if b <= 0x7F => result.push(b as char),
                Some(_) => {
                    // Back up and read the full UTF-8 character
                    self.pos -= 1;
                    let ch = self.read_utf8_char()?;
                    result.push(ch);
                }
            }

            if result.len() as u64 > self.limits.max_string_length {
                return Err(ErrorCode::StringTooLong(
                    result.len() as u64,
                    self.limits.max_string_length,
                ));
            }
        }

        Ok(Token::String(result))
    }

    /// Read a multi-byte UTF-8 character from the current position.
    fn read_utf8_char(&mut self) -> JsonResult<char> {
        let b0 = self.advance().ok_or(ErrorCode::InvalidUtf8)?;

        let (len, mut codepoint) = if b0 & 0xE0 == 0xC0 {
            (2, (b0 & 0x1F) as u32)
        } else if b0 & 0xF0 == 0xE0 {
            (3, (b0 & 0x0F) as u32)
        } else if b0 & 0xF8 == 0xF0 {
            (4, (b0 & 0x07) as u32)
        } else {
            return Err(ErrorCode::InvalidUtf8);
        };

        for _ in 1..len {
            let b = self.advance().ok_or(ErrorCode::InvalidUtf8)?;
            if b & 0xC0 != 0x80 {
                return Err(ErrorCode::InvalidUtf8);
            }
            codepoint = (codepoint << 6) | ((b & 0x3F) as u32);
        }

        char::from_u32(codepoint).ok_or(ErrorCode::InvalidUtf8)
    }

    /// Read an escape sequence after a backslash.
    fn read_escape_sequence(&mut self) -> JsonResult<char> {
        match self.advance() {
            Some(b'"') => Ok('"'),
            Some(b'\\') => Ok('\\'),
            Some(b'/') => Ok('/'),
            Some(b'b') => Ok('\x08'),
            Some(b'f') => Ok('\x0C'),
            Some(b'n') => Ok('\n'),
            Some(b'r') => Ok('\r'),
            Some(b't') => Ok('\t'),
            Some(b'u') => self.read_unicode_escape(),
            _ => Err(self.invalid()),
        }
    }

    /// Read a \uXXXX unicode escape sequence, combining surrogate pairs.
    fn read_unicode_escape(&mut self) -> JsonResult<char> {
        let codepoint = self.read_hex4()?;

        if (0xD800..=0xDBFF).contains(&codepoint) {
            // Must be followed by a \uXXXX low surrogate
            if self.advance() != Some(b'\\') || self.advance() != Some(b'u') {
                return Err(ErrorCode::InvalidUtf8);
            }
            let low = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(ErrorCode::InvalidUtf8);
            }
            let combined = 0x10000 + ((codepoint as u32 - 0xD800) << 10) + (low as u32 - 0xDC00);
            return char::from_u32(combined).ok_or(ErrorCode::InvalidUtf8);
        }

        // Unpaired low surrogate
        if (0xDC00..=0xDFFF).contains(&codepoint) {
            return Err(ErrorCode::InvalidUtf8);
        }

        char::from_u32(codepoint as u32).ok_or(ErrorCode::InvalidUtf8)
    }

    /// Read 4 hex digits and return the value.
    fn read_hex4(&mut self) -> JsonResult<u16> {
        let mut value: u16 = 0;
        for _ in 0..4 {
            let b = self.advance().ok_or_else(|| self.invalid())?;
            let digit = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(self.invalid()),
            };
            value = (value << 4) | (digit as u16);
        }
        Ok(value)
    }

    /// Consume one or more ASCII digits.
    fn read_digits(&mut self) -> JsonResult<()> {
        if !matches!(self.peek(), Some(b'0'..=b'9')) {
            return Err(self.invalid());
        }
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
        Ok(())
    }

    /// Read a number token, keeping its original spelling.
    fn read_number(&mut self) -> JsonResult<Token> {
        let start = self.pos;

        if self.peek() == Some(b'-') {
            self.advance();
        }

        match self.peek() {
            Some(b'0') => {
                self.advance();
                // No leading zeros
                if let Some(b'0'..=b'9') = self.peek() {
                    return Err(self.invalid());
                }
            }
            Some(b'1'..=b'9') => self.read_digits()?,
            _ => return Err(self.invalid()),
        }

        if self.peek() == Some(b'.') {
            self.advance();
            self.read_digits()?;
        }

        if let Some(b'e' | b'E') = self.peek() {
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            self.read_digits()?;
        }

        let num_str =
            std::str::from_utf8(&self.input[start..self.pos]).map_err(|_| self.invalid())?;

        Ok(Token::Number(num_str.to_string()))
    }

    /// Read a literal such as `true`.
    fn read_literal(&mut self, expected: &[u8], token: Token) -> JsonResult<Token> {
        for &b in expected {
            if self.advance() != Some(b) {
                return Err(self.invalid());
            }
        }
        Ok(token)
    }
}
