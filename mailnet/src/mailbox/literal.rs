//! Decoder for the JavaScript literal subset used in inline page data.
//!
//! Accepts arrays (with holes), objects (identifier, string or number
//! keys), strings with JS escapes, numbers, `true`, `false`, `null`,
//! `undefined` and comments. Anything executable is an error: the input is
//! data, never code.

use crate::base::neterror::NetError;
use serde_json::{Map, Number, Value};
use thiserror::Error;

const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub reason: String,
}

impl From<LiteralError> for NetError {
    fn from(err: LiteralError) -> Self {
        NetError::malformed(err.to_string())
    }
}

/// Decode the literal at the start of `input`.
///
/// Returns the value and the number of bytes consumed, so callers can
/// decode `x = [...]; more code` without caring what follows.
pub fn parse_prefix(input: &str) -> Result<(Value, usize), LiteralError> {
    let mut parser = Parser::new(input);
    parser.skip_trivia()?;
    let value = parser.value()?.unwrap_or(Value::Null);
    Ok((value, parser.pos))
}

/// Decode `input`, which must hold one literal and nothing else except
/// whitespace, comments and a trailing `;`.
pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(input);
    parser.skip_trivia()?;
    let value = parser.value()?.unwrap_or(Value::Null);
    parser.skip_trivia()?;
    if parser.peek() == Some(';') {
        parser.bump();
        parser.skip_trivia()?;
    }
    if parser.pos != input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, want: char) -> Result<(), LiteralError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(self.error(format!("expected {want:?}, found {c:?}"))),
            None => Err(self.error(format!("expected {want:?}, found end of input"))),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), LiteralError> {
        loop {
            let rest = self.rest();
            if let Some(c) = self.peek().filter(|c| c.is_whitespace() || *c == '\u{feff}') {
                self.pos += c.len_utf8();
            } else if rest.starts_with("//") {
                let end = rest.find(['\n', '\r', '\u{2028}', '\u{2029}']).unwrap_or(rest.len());
                self.pos += end;
            } else if rest.starts_with("/*") {
                let end = rest[2..]
                    .find("*/")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                self.pos += end + 4;
            } else {
                return Ok(());
            }
        }
    }

    /// `None` stands for `undefined`.
    fn value(&mut self) -> Result<Option<Value>, LiteralError> {
        match self.peek() {
            Some('[') => self.nested(Self::array).map(Some),
            Some('{') => self.nested(Self::object).map(Some),
            Some(q @ ('"' | '\'')) => self.string(q).map(|s| Some(Value::String(s))),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                self.number().map(|n| Some(Value::Number(n)))
            }
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                let ident = self.identifier();
                match ident {
                    "true" => Ok(Some(Value::Bool(true))),
                    "false" => Ok(Some(Value::Bool(false))),
                    "null" => Ok(Some(Value::Null)),
                    "undefined" => Ok(None),
                    other => Err(LiteralError {
                        offset: start,
                        reason: format!("identifier {other:?} is not a literal"),
                    }),
                }
            }
            Some(c) => Err(self.error(format!("unexpected {c:?}"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn nested(
        &mut self,
        f: fn(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn array(&mut self) -> Result<Value, LiteralError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                Some(',') => {
                    // hole
                    self.bump();
                    items.push(Value::Null);
                    continue;
                }
                _ => {}
            }
            items.push(self.value()?.unwrap_or(Value::Null));
            self.skip_trivia()?;
            match self.bump() {
                Some(',') => {}
                Some(']') => return Ok(Value::Array(items)),
                Some(c) => return Err(self.error(format!("expected ',' or ']', found {c:?}"))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn object(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            let key = match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                Some(q @ ('"' | '\'')) => self.string(q)?,
                Some(c) if c.is_ascii_digit() || c == '.' => self.number()?.to_string(),
                Some(c) if is_ident_start(c) => self.identifier().to_string(),
                Some(c) => return Err(self.error(format!("unexpected {c:?} in object key"))),
                None => return Err(self.error("unterminated object")),
            };
            self.skip_trivia()?;
            self.expect(':')?;
            self.skip_trivia()?;
            if let Some(value) = self.value()? {
                map.insert(key, value);
            }
            self.skip_trivia()?;
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(Value::Object(map)),
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found {c:?}"))),
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_ident_part(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        self.expect(quote)?;
        let mut out = String::new();
        loop {
            let c = self.bump().ok_or_else(|| self.error("unterminated string"))?;
            match c {
                c if c == quote => return Ok(out),
                '\\' => self.escape(&mut out)?,
                '\n' | '\r' => return Err(self.error("newline in string")),
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.hex_digits(2)?;
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'u' => {
                let code = self.unicode_escape()?;
                out.push(code);
            }
            // line continuation
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn unicode_escape(&mut self) -> Result<char, LiteralError> {
        if self.peek() == Some('{') {
            self.bump();
            let end = self
                .rest()
                .find('}')
                .ok_or_else(|| self.error("unterminated \\u{...} escape"))?;
            let digits = &self.rest()[..end];
            let code = u32::from_str_radix(digits, 16)
                .map_err(|_| self.error("invalid \\u{...} escape"))?;
            self.pos += end + 1;
            return char::from_u32(code).ok_or_else(|| self.error("invalid code point"));
        }

        let high = self.hex_digits(4)?;
        if (0xD800..0xDC00).contains(&high) && self.rest().starts_with("\\u") {
            let save = self.pos;
            self.pos += 2;
            let low = self.hex_digits(4)?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            self.pos = save;
        }
        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, LiteralError> {
        let digits = self
            .rest()
            .get(..count)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("invalid hex escape"))?;
        let code = u32::from_str_radix(digits, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos += count;
        Ok(code)
    }

    fn number(&mut self) -> Result<Number, LiteralError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };

        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let magnitude = i64::from_str_radix(&self.src[digits_start..self.pos], 16)
                .map_err(|_| self.error("invalid hex number"))?;
            return Ok(Number::from(if negative { -magnitude } else { magnitude }));
        }

        let digits_start = self.pos;
        let mut integral = true;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' => integral = false,
                'e' | 'E' => {
                    integral = false;
                    self.bump();
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }
        let text = &self.src[digits_start..self.pos];
        if text.is_empty() || text == "." {
            self.pos = start;
            return Err(self.error("invalid number"));
        }

        if integral {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Number::from(if negative { -n } else { n }));
            }
        }
        let value: f64 = text.parse().map_err(|_| LiteralError {
            offset: start,
            reason: format!("invalid number {text:?}"),
        })?;
        let value = if negative { -value } else { value };
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            return Ok(Number::from(value as i64));
        }
        Number::from_f64(value).ok_or_else(|| LiteralError {
            offset: start,
            reason: "number is not finite".to_string(),
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
