//! Recursive descent JSON parser with configurable policies.
//!
//! The same grammar serves three codecs. What differs between them is
//! captured by [`ParseOptions`]: how invalid UTF-8 is treated, what happens
//! to a repeated member name, and how much of a document survives a syntax
//! error.

use std::borrow::Cow;
use std::collections::BTreeMap;

use super::lexer::{Lexer, Token};
use super::limits::Limits;
use super::types::JsonValue;
use crate::error::{ErrorCode, JsonResult};

/// Treatment of input bytes that are not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Mode {
    /// Fail with [`ErrorCode::InvalidUtf8`]
    Reject,
    /// Substitute U+FFFD for each maximal invalid subsequence
    Replace,
}

/// Treatment of an object member name that already appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duplicates {
    /// Fail with [`ErrorCode::DuplicateKey`]
    Reject,
    /// Keep the first value
    FirstWins,
    /// Keep the last value
    LastWins,
}

/// What survives when parsing stops at an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Salvage {
    /// Nothing
    Nothing,
    /// Object members and array elements that were fully parsed
    Completed,
    /// Completed values plus the well-formed prefix of the value being parsed
    Prefix,
}

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Resource limits
    pub limits: Limits,
    /// Invalid UTF-8 handling
    pub utf8: Utf8Mode,
    /// Repeated member name handling
    pub duplicates: Duplicates,
    /// Partial results on error
    pub salvage: Salvage,
}

impl ParseOptions {
    /// I-JSON (RFC 7493): valid UTF-8, unique names, nothing kept on error.
    pub const fn strict() -> Self {
        Self {
            limits: Limits::standard(),
            utf8: Utf8Mode::Reject,
            duplicates: Duplicates::Reject,
            salvage: Salvage::Nothing,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::strict()
    }
}

/// A parse that stopped at an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Interrupted {
    /// Why parsing stopped
    pub error: ErrorCode,
    /// Whatever [`Salvage`] allowed to be kept
    pub partial: Option<JsonValue>,
}

impl Interrupted {
    fn bare(error: ErrorCode) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

impl From<ErrorCode> for Interrupted {
    fn from(error: ErrorCode) -> Self {
        Self::bare(error)
    }
}

type ParseResult<T> = Result<T, Interrupted>;

/// JSON parser with strict validation.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    options: ParseOptions,
    depth: u64,
}

impl<'a> Parser<'a> {
    /// Create a new parser for input that is already valid UTF-8.
    pub fn new(input: &'a [u8], options: ParseOptions) -> JsonResult<Self> {
        let mut lexer = Lexer::new(input, options.limits)?;
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            options,
            depth: 0,
        })
    }

    /// Parse the input and return a JsonValue.
    pub fn parse(&mut self) -> ParseResult<JsonValue> {
        let value = self.parse_value()?;

        if self.current != Token::Eof {
            return Err(Interrupted {
                error: self.invalid(),
                partial: self.keep(value),
            });
        }

        Ok(value)
    }

    fn invalid(&self) -> ErrorCode {
        ErrorCode::InvalidJson(self.lexer.position() as u64)
    }

    /// What an interrupted container hands back. Whether a parent keeps
    /// the interrupted child itself depends on [`Salvage::Prefix`].
    fn keep(&self, value: JsonValue) -> Option<JsonValue> {
        match self.options.salvage {
            Salvage::Nothing => None,
            Salvage::Completed | Salvage::Prefix => Some(value),
        }
    }

    /// Advance to the next token.
    fn advance(&mut self) -> JsonResult<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    /// Parse a single JSON value.
    fn parse_value(&mut self) -> ParseResult<JsonValue> {
        let value = match &self.current {
            Token::Null => JsonValue::Null,
            Token::True => JsonValue::Bool(true),
            Token::False => JsonValue::Bool(false),
            Token::String(s) => JsonValue::String(s.clone()),
            Token::Number(s) => self.parse_number(s)?,
            Token::LeftBrace => return self.parse_object(),
            Token::LeftBracket => return self.parse_array(),
            _ => return Err(self.invalid().into()),
        };
        self.advance()?;
        Ok(value)
    }

    /// Parse a number token into a JsonValue.
    fn parse_number(&self, s: &str) -> JsonResult<JsonValue> {
        let integral = !s.contains(['.', 'e', 'E']);
        if integral {
            if let Ok(n) = s.parse::<i64>() {
                return Ok(JsonValue::Integer(n));
            }
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(JsonValue::Float(f)),
            _ => Err(ErrorCode::NumberOutOfRange(self.lexer.position() as u64)),
        }
    }

    fn enter(&mut self) -> JsonResult<()> {
        self.depth += 1;
        if self.depth > self.options.limits.max_nesting_depth {
            return Err(ErrorCode::NestingTooDeep(
                self.depth,
                self.options.limits.max_nesting_depth,
            ));
        }
        Ok(())
    }

    /// Parse a JSON object.
    fn parse_object(&mut self) -> ParseResult<JsonValue> {
        self.enter()?;
        let mut map = BTreeMap::new();
        match self.object_members(&mut map) {
            Ok(()) => {
                self.depth -= 1;
                Ok(JsonValue::Object(map))
            }
            Err((error, pending)) => {
                if let Some((key, value)) = pending {
                    if self.options.salvage == Salvage::Prefix {
                        self.insert(&mut map, key, value).ok();
                    }
                }
                Err(Interrupted {
                    error,
                    partial: self.keep(JsonValue::Object(map)),
                })
            }
        }
    }

    /// Fill `map` with members. On error, also return the member that was
    /// being parsed if it left a salvageable prefix.
    fn object_members(
        &mut self,
        map: &mut BTreeMap<String, JsonValue>,
    ) -> Result<(), (ErrorCode, Option<(String, JsonValue)>)> {
        let bare = |e: ErrorCode| (e, None);

        // Consume opening brace
        self.advance().map_err(bare)?;

        if self.current == Token::RightBrace {
            return self.advance().map_err(bare);
        }

        loop {
            let key = match &self.current {
                Token::String(s) => s.clone(),
                _ => return Err(bare(self.invalid())),
            };
            self.advance().map_err(bare)?;

            if self.current != Token::Colon {
                return Err(bare(self.invalid()));
            }
            self.advance().map_err(bare)?;

            let value = match self.parse_value() {
                Ok(value) => value,
                Err(Interrupted { error, partial }) => {
                    return Err((error, partial.map(|p| (key, p))));
                }
            };
            self.insert(map, key, value).map_err(bare)?;

            if map.len() as u64 > self.options.limits.max_object_fields {
                return Err(bare(ErrorCode::TooManyFields(
                    map.len() as u64,
                    self.options.limits.max_object_fields,
                )));
            }

            match &self.current {
                Token::Comma => {
                    self.advance().map_err(bare)?;
                    // Trailing comma is not allowed in JSON
                    if self.current == Token::RightBrace {
                        return Err(bare(self.invalid()));
                    }
                }
                Token::RightBrace => return self.advance().map_err(bare),
                _ => return Err(bare(self.invalid())),
            }
        }
    }

    fn insert(
        &self,
        map: &mut BTreeMap<String, JsonValue>,
        key: String,
        value: JsonValue,
    ) -> JsonResult<()> {
        if map.contains_key(&key) {
            match self.options.duplicates {
                Duplicates::Reject => return Err(ErrorCode::DuplicateKey(key)),
                Duplicates::FirstWins => return Ok(()),
                Duplicates::LastWins => {}
            }
        }
        map.insert(key, value);
        Ok(())
    }

    /// Parse a JSON array.
    fn parse_array(&mut self) -> ParseResult<JsonValue> {
        self.enter()?;
        let mut arr = Vec::new();
        match self.array_elements(&mut arr) {
            Ok(()) => {
                self.depth -= 1;
                Ok(JsonValue::Array(arr))
            }
            Err(error) => Err(Interrupted {
                error,
                partial: self.keep(JsonValue::Array(arr)),
            }),
        }
    }

    fn array_elements(&mut self, arr: &mut Vec<JsonValue>) -> JsonResult<()> {
        // Consume opening bracket
        self.advance()?;

        if self.current == Token::RightBracket {
            return self.advance();
        }

        loop {
            match self.parse_value() {
                Ok(value) => arr.push(value),
                Err(Interrupted { error, partial }) => {
                    if let Some(p) = partial.filter(|_| self.options.salvage == Salvage::Prefix) {
                        arr.push(p);
                    }
                    return Err(error);
                }
            }

            if arr.len() as u64 > self.options.limits.max_array_length {
                return Err(ErrorCode::ArrayTooLong(
                    arr.len() as u64,
                    self.options.limits.max_array_length,
                ));
            }

            match &self.current {
                Token::Comma => {
                    self.advance()?;
                    if self.current == Token::RightBracket {
                        return Err(self.invalid());
                    }
                }
                Token::RightBracket => return self.advance(),
                _ => return Err(self.invalid()),
            }
        }
    }
}

/// Parse strict I-JSON.
pub fn parse(input: &[u8]) -> JsonResult<JsonValue> {
    parse_with(input, ParseOptions::strict()).map_err(|i| i.error)
}

/// Parse with explicit policies.
pub fn parse_with(input: &[u8], options: ParseOptions) -> Result<JsonValue, Interrupted> {
    let text: Cow<'_, str> = match options.utf8 {
        Utf8Mode::Replace => String::from_utf8_lossy(input),
        Utf8Mode::Reject => Cow::Borrowed(std::str::from_utf8(input).map_err(|_| ErrorCode::InvalidUtf8)?),
    };
    let mut parser = Parser::new(text.as_bytes(), options)?;
    parser.parse()
}
