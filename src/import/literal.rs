//! Parser for mapping literals embedded in activity exports.
//!
//! Older exports store the nested activity type as a dictionary literal, e.g.
//! `{'typeId': 1, 'typeKey': 'running', 'isHidden': False}`. JSON objects
//! are accepted as well. Values are converted to `serde_json::Value`.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LiteralError {
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("expected a mapping literal")]
    NotAMapping,
    #[error("nesting deeper than 64 levels")]
    TooDeep,
}

/// Deepest nesting of mappings and sequences accepted
pub const MAX_DEPTH: usize = 64;

/// Parse a complete mapping literal
pub fn parse_mapping(input: &str) -> Result<Map<String, Value>, LiteralError> {
    let mut parser = Parser::new(input);
    let value = parser.value()?;
    parser.skip_whitespace();
    if let Some(&(offset, found)) = parser.peek() {
        return Err(LiteralError::UnexpectedChar { found, offset });
    }
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(LiteralError::NotAMapping),
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Parser {
            chars: input.char_indices().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&(usize, char)> {
        self.chars.get(self.pos)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.get(self.pos).copied();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.bump() {
            Some((_, c)) if c == expected => Ok(()),
            Some((offset, found)) => Err(LiteralError::UnexpectedChar { found, offset }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        let &(offset, c) = self.peek().ok_or(LiteralError::UnexpectedEnd)?;
        match c {
            '{' => self.nested(|p| p.mapping()),
            '[' => self.nested(|p| p.sequence('[', ']')),
            '(' => self.nested(|p| p.sequence('(', ')')),
            '\'' | '"' => self.string().map(Value::String),
            '-' | '+' | '.' | '0'..='9' => self.number(),
            c if c.is_alphabetic() => self.word(),
            found => Err(LiteralError::UnexpectedChar { found, offset }),
        }
    }

    fn nested<F>(&mut self, parse: F) -> Result<Value, LiteralError>
    where
        F: FnOnce(&mut Self) -> Result<Value, LiteralError>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep);
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn mapping(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if matches!(self.peek(), Some((_, '}'))) {
                self.pos += 1;
                return Ok(Value::Object(map));
            }

            let key = match self.value()? {
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.bump() {
                Some((_, ',')) => continue,
                Some((_, '}')) => return Ok(Value::Object(map)),
                Some((offset, found)) => return Err(LiteralError::UnexpectedChar { found, offset }),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if matches!(self.peek(), Some(&(_, c)) if c == close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }

            items.push(self.value()?);

            self.skip_whitespace();
            match self.bump() {
                Some((_, ',')) => continue,
                Some((_, c)) if c == close => return Ok(Value::Array(items)),
                Some((offset, found)) => return Err(LiteralError::UnexpectedChar { found, offset }),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let (_, quote) = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some((_, '\\')) => match self.bump() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, c)) => out.push(c),
                    None => return Err(LiteralError::UnexpectedEnd),
                },
                Some((_, c)) if c == quote => return Ok(out),
                Some((_, c)) => out.push(c),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some((_, c)) if c.is_ascii_digit() || matches!(*c, '-' | '+' | '.' | 'e' | 'E')
        ) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().map(|(_, c)| c).collect();

        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or(LiteralError::InvalidNumber(text))
    }

    fn word(&mut self) -> Result<Value, LiteralError> {
        let (offset, first) = *self.peek().ok_or(LiteralError::UnexpectedEnd)?;
        let start = self.pos;
        while matches!(self.peek(), Some((_, c)) if c.is_alphanumeric() || *c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().map(|(_, c)| c).collect();
        match word.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" | "nan" | "NaN" => Ok(Value::Null),
            _ => Err(LiteralError::UnexpectedChar {
                found: first,
                offset,
            }),
        }
    }
}
