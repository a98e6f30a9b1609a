//! Structural parsing of literal expressions
//!
//! Accepts the literal subset used to store structured values in a single
//! environment variable: strings (`'..'`, `".."`, `b'..'`), integers, floats,
//! `True`/`False`/`None`, lists, tuples and dicts. Nothing is evaluated.

use crate::value::Value;
use indexmap::IndexMap;
use std::iter::Peekable;
use std::str::Chars;

/// Containers nested deeper than this are rejected
pub const MAX_DEPTH: usize = 128;

/// Parse a literal expression into a [`Value`]
///
/// # Example
/// ```rust
/// use envwrap::{literal, Value};
///
/// let value = literal::parse("[1, 'two', 3.0]").unwrap();
/// assert_eq!(
///     value,
///     Value::List(vec![Value::Int(1), Value::from("two"), Value::Float(3.0)])
/// );
/// ```
pub fn parse(input: &str) -> Result<Value, String> {
    let mut parser = Parser {
        chars: input.chars().peekable(),
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    match parser.chars.next() {
        None => Ok(value),
        Some(c) => Err(format!("unexpected trailing character '{}'", c)),
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        self.skip_whitespace();
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected '{}', found '{}'", expected, c)),
            None => Err(format!("expected '{}', found end of input", expected)),
        }
    }

    fn value(&mut self) -> Result<Value, String> {
        self.skip_whitespace();
        match self.chars.peek().copied() {
            None => Err("unexpected end of input".to_string()),
            Some('[') => {
                self.chars.next();
                let (items, _) = self.nested(|p| p.sequence(']'))?;
                Ok(Value::List(items))
            }
            Some('(') => {
                self.chars.next();
                let (mut items, trailing_comma) = self.nested(|p| p.sequence(')'))?;
                // A parenthesized single value without a comma is not a tuple
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Value::Tuple(items))
                }
            }
            Some('{') => {
                self.chars.next();
                self.nested(|p| p.dict())
            }
            Some(quote @ ('\'' | '"')) => {
                self.chars.next();
                Ok(Value::Str(self.string(quote)?))
            }
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.word(),
            Some(c) => Err(format!("unexpected character '{}'", c)),
        }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, String>,
    ) -> Result<T, String> {
        if self.depth >= MAX_DEPTH {
            return Err("literal nested too deeply".to_string());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Comma separated values up to `close`; reports whether a trailing comma was seen
    fn sequence(&mut self, close: char) -> Result<(Vec<Value>, bool), String> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.chars.next_if_eq(&close).is_some() {
                return Ok((items, trailing_comma));
            }
            items.push(self.value()?);
            self.skip_whitespace();
            match self.chars.next() {
                Some(',') => trailing_comma = true,
                Some(c) if c == close => return Ok((items, false)),
                Some(c) => return Err(format!("expected ',' or '{}', found '{}'", close, c)),
                None => return Err(format!("unterminated sequence, expected '{}'", close)),
            }
        }
    }

    fn dict(&mut self) -> Result<Value, String> {
        let mut map = IndexMap::new();
        loop {
            self.skip_whitespace();
            if self.chars.next_if_eq(&'}').is_some() {
                return Ok(Value::Map(map));
            }
            let key = self.value()?;
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key.into_key(), value);
            self.skip_whitespace();
            match self.chars.next() {
                Some(',') => {}
                Some('}') => return Ok(Value::Map(map)),
                Some(c) => return Err(format!("expected ',' or '}}', found '{}'", c)),
                None => return Err("unterminated dict, expected '}'".to_string()),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, String> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err("unterminated string literal".to_string()),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err("unterminated string literal".to_string()),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Value, String> {
        let mut text = String::new();
        while let Some(c) = self
            .chars
            .next_if(|c| c.is_ascii_alphanumeric() || matches!(*c, '.' | '-' | '+' | '_'))
        {
            text.push(c);
        }
        let cleaned = text.replace('_', "");
        let (negative, unsigned) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
        };

        let radix = match unsigned.get(..2) {
            Some("0x" | "0X") => Some(16),
            Some("0o" | "0O") => Some(8),
            Some("0b" | "0B") => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            let digits = &unsigned[2..];
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return Err(format!("malformed number '{}'", text));
            }
            let magnitude = i128::from_str_radix(digits, radix)
                .map_err(|_| format!("integer literal '{}' out of range", text))?;
            let signed = if negative { -magnitude } else { magnitude };
            return i64::try_from(signed)
                .map(Value::Int)
                .map_err(|_| format!("integer literal '{}' out of range", text));
        }

        if !unsigned.is_empty() && unsigned.chars().all(|c| c.is_ascii_digit()) {
            return cleaned
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("integer literal '{}' out of range", text));
        }
        let is_float_like = cleaned
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
        match cleaned.parse::<f64>() {
            Ok(f) if is_float_like => Ok(Value::Float(f)),
            _ => Err(format!("malformed number '{}'", text)),
        }
    }

    fn word(&mut self) -> Result<Value, String> {
        let mut word = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_alphanumeric() || *c == '_') {
            word.push(c);
        }
        match word.as_str() {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::None),
            "b" | "B" => match self.chars.next() {
                Some(quote @ ('\'' | '"')) => Ok(Value::Bytes(self.string(quote)?.into_bytes())),
                _ => Err(format!("'{}' is not a literal", word)),
            },
            _ => Err(format!("'{}' is not a literal", word)),
        }
    }
}
