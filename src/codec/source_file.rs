//! Flat `NAME=value` files, one assignment per line.
//!
//! The same [`SourceFormat`] drives both directions, so a file written with a
//! given format reads back with it: `export NAME='value';` with the shell
//! preset, plain `NAME=value` by default.

use super::{BoolTokens, Decoder};
use crate::error::EnvError;
use crate::wrapper::Wrapper;
use regex::Regex;
use std::io::{BufRead, Write};

const IDENTIFIER_CHARS: &str = "[A-Za-z0-9_]";

/// Line layout of a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFormat {
    /// Between name and value
    pub delimiter: String,
    /// Quote around the value; quoted values are kept verbatim
    pub value_delimiter: Option<char>,
    /// Token before the name, e.g. `export`
    pub inline_prefix: String,
    /// Token after the value, e.g. `;`
    pub inline_suffix: String,
    /// Write ` = ` instead of `=`
    pub space_around_delimiters: bool,
    /// Write lines sorted by key instead of declaration order
    pub sort_keys: bool,
    /// Tokens recognised as booleans when reading
    pub bool_tokens: BoolTokens,
}

impl Default for SourceFormat {
    fn default() -> Self {
        Self {
            delimiter: "=".to_string(),
            value_delimiter: None,
            inline_prefix: String::new(),
            inline_suffix: String::new(),
            space_around_delimiters: false,
            sort_keys: false,
            bool_tokens: BoolTokens::default(),
        }
    }
}

impl SourceFormat {
    /// `export NAME='value';`
    pub fn shell() -> Self {
        Self {
            value_delimiter: Some('\''),
            inline_prefix: "export".to_string(),
            inline_suffix: ";".to_string(),
            ..Self::default()
        }
    }

    /// Render one assignment, without the line ending
    pub fn expression(&self, name: &str, value: &str) -> String {
        let operator = if self.space_around_delimiters {
            format!(" {} ", self.delimiter)
        } else {
            self.delimiter.clone()
        };
        let quote = self.value_delimiter.map(String::from).unwrap_or_default();

        let mut expr = if self.inline_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{} {}", self.inline_prefix, name)
        };
        expr.push_str(&operator);
        expr.push_str(&quote);
        expr.push_str(value);
        expr.push_str(&quote);
        expr.push_str(&self.inline_suffix);
        expr
    }

    /// Regular expression matching one line of this format
    pub fn pattern(&self) -> String {
        let (quote, value_chars) = match self.value_delimiter {
            Some(q) => {
                let q = regex::escape(&q.to_string());
                (format!("{}?", q), format!("[^{}]", q))
            }
            None => (String::new(), ".".to_string()),
        };
        format!(
            r"^\s*{prefix}\s*(?P<name>{ident}+)\s*{delimiter}\s*{quote}(?P<value>{value_chars}*){quote}\s*{suffix}\s*$",
            prefix = regex::escape(&self.inline_prefix),
            ident = IDENTIFIER_CHARS,
            delimiter = regex::escape(&self.delimiter),
            quote = quote,
            value_chars = value_chars,
            suffix = regex::escape(&self.inline_suffix),
        )
    }

    pub fn parser(&self) -> Result<LineParser, EnvError> {
        let regex = Regex::new(&self.pattern()).map_err(|e| EnvError::Parse {
            line: None,
            message: format!("invalid source format: {}", e),
        })?;
        Ok(LineParser {
            regex,
            quoted: self.value_delimiter.is_some(),
        })
    }
}

/// Extracts `(name, value)` pairs from lines of a source file
#[derive(Debug, Clone)]
pub struct LineParser {
    regex: Regex,
    quoted: bool,
}

impl LineParser {
    /// `None` for lines that do not match, which are skipped rather than rejected
    pub fn parse_line(&self, line: &str) -> Option<(String, String)> {
        let line = line.trim_matches(|c: char| c == '\n' || c == '\r');
        let captures = self.regex.captures(line)?;
        let name = &captures["name"];
        let value = &captures["value"];
        if self.quoted {
            Some((name.to_string(), value.to_string()))
        } else {
            Some((name.trim().to_string(), value.trim().to_string()))
        }
    }

    pub fn parse<R: BufRead>(&self, reader: R) -> Result<Vec<(String, String)>, EnvError> {
        let mut pairs = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            match self.parse_line(&line) {
                Some(pair) => pairs.push(pair),
                None => tracing::trace!(line = number + 1, "skipping unmatched source line"),
            }
        }
        Ok(pairs)
    }
}

impl Wrapper {
    /// Write every declared variable as one assignment per line
    ///
    /// Keys and values come from [`Wrapper::collect`].
    pub fn write_to_source_file<W: Write>(
        &self,
        mut out: W,
        format: &SourceFormat,
    ) -> Result<(), EnvError> {
        let mut items = self.collect()?;
        if format.sort_keys {
            items.sort_by(|a, b| a.0.cmp(&b.0));
        }
        for (name, value) in &items {
            writeln!(out, "{}", format.expression(name, value))?;
        }
        tracing::debug!(lines = items.len(), "wrote source file");
        Ok(())
    }

    /// Decode a source file; unmatched lines are ignored
    pub fn read_from_source_file<R: BufRead>(
        reader: R,
        format: &SourceFormat,
    ) -> Result<Wrapper, EnvError> {
        let pairs = format.parser()?.parse(reader)?;
        Decoder::new(format.bool_tokens.clone()).decode(pairs, Vec::new())
    }
}
