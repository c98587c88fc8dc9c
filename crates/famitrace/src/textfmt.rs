//! Line tokenizer shared by the textual transcriptions.
//!
//! Every format is line oriented: whitespace separated fields, `#` starts a
//! comment, blank lines are ignored. Fields remember their 1-based column
//! so parse failures point at the offending token.
use std::str::FromStr;

use crate::chip::TICK_RATE;
use crate::error::{Error, Result};

/// Longest track a transcription header may declare: one hour of ticks.
pub(crate) const MAX_TRACK_TICKS: u64 = 3600 * TICK_RATE as u64;

/// One whitespace separated token.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Field<'a> {
    pub text: &'a str,
    pub column: usize,
}

/// One non-empty line split into fields.
#[derive(Debug)]
pub(crate) struct Line<'a> {
    pub number: usize,
    fields: Vec<Field<'a>>,
    /// Column just past the last field, for "missing field" errors.
    end_column: usize,
}

impl<'a> Line<'a> {
    pub fn keyword(&self) -> &'a str {
        self.fields[0].text
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, index: usize) -> Result<Field<'a>> {
        self.fields.get(index).copied().ok_or_else(|| {
            Error::syntax(self.number, self.end_column, format!("missing field {index}"))
        })
    }

    /// Parse field `index` with `FromStr`.
    pub fn parse<T: FromStr>(&self, index: usize, what: &str) -> Result<T> {
        let field = self.field(index)?;
        field
            .text
            .parse()
            .map_err(|_| self.error_at(field, format!("invalid {what} {:?}", field.text)))
    }

    /// Parse a hexadecimal field, with or without a `0x`/`$` prefix.
    pub fn parse_hex(&self, index: usize, what: &str) -> Result<u32> {
        let field = self.field(index)?;
        let digits = field
            .text
            .trim_start_matches("0x")
            .trim_start_matches('$');
        u32::from_str_radix(digits, 16)
            .map_err(|_| self.error_at(field, format!("invalid {what} {:?}", field.text)))
    }

    /// Hex field narrowed to `T`.
    pub fn parse_hex_as<T: TryFrom<u32>>(&self, index: usize, what: &str) -> Result<T> {
        let field = self.field(index)?;
        let value = self.parse_hex(index, what)?;
        T::try_from(value)
            .map_err(|_| self.error_at(field, format!("{what} {:?} out of range", field.text)))
    }

    /// Value of a `key=value` field.
    pub fn parse_keyed<T: FromStr>(&self, index: usize, key: &str) -> Result<T> {
        let field = self.field(index)?;
        let value = field
            .text
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| self.error_at(field, format!("expected {key}=")))?;
        value
            .parse()
            .map_err(|_| self.error_at(field, format!("invalid {key} {value:?}")))
    }

    /// The `clock=` field of a header. A zero clock has no cycles to
    /// convert ticks into.
    pub fn parse_clock(&self, index: usize) -> Result<u32> {
        let clock: u32 = self.parse_keyed(index, "clock")?;
        if clock == 0 {
            return Err(self.error_at(self.field(index)?, "clock must be non-zero"));
        }
        Ok(clock)
    }

    /// The `length=` field of a header, in ticks.
    pub fn parse_length(&self, index: usize) -> Result<u64> {
        let length: u64 = self.parse_keyed(index, "length")?;
        if length > MAX_TRACK_TICKS {
            return Err(self.error_at(
                self.field(index)?,
                format!("length {length} exceeds {MAX_TRACK_TICKS} ticks"),
            ));
        }
        Ok(length)
    }

    /// Fail unless the line has exactly `count` fields.
    pub fn expect_len(&self, count: usize) -> Result<()> {
        match self.fields.get(count) {
            Some(extra) => Err(self.error_at(*extra, "unexpected trailing field")),
            None if self.fields.len() < count => Err(Error::syntax(
                self.number,
                self.end_column,
                format!("expected {count} fields, found {}", self.fields.len()),
            )),
            None => Ok(()),
        }
    }

    pub fn error_at(&self, field: Field<'_>, reason: impl Into<String>) -> Error {
        Error::syntax(self.number, field.column, reason)
    }
}

/// Split `text` into non-empty, comment-stripped lines.
pub(crate) fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    text.lines().enumerate().filter_map(|(i, raw)| {
        let content = raw.split('#').next().unwrap_or("");
        let mut fields = Vec::new();
        let mut start = None;
        for (pos, ch) in content.char_indices() {
            match (ch.is_whitespace(), start) {
                (false, None) => start = Some(pos),
                (true, Some(s)) => {
                    fields.push(Field {
                        text: &content[s..pos],
                        column: s + 1,
                    });
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            fields.push(Field {
                text: &content[s..],
                column: s + 1,
            });
        }
        (!fields.is_empty()).then(|| Line {
            number: i + 1,
            fields,
            end_column: content.trim_end().len() + 1,
        })
    })
}

/// Bytes as contiguous lowercase hex.
pub(crate) fn hex_bytes(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

/// Inverse of `hex_bytes` for field `index` of `line`.
pub(crate) fn parse_hex_bytes(line: &Line<'_>, index: usize) -> Result<Vec<u8>> {
    let field = line.field(index)?;
    let text = field.text;
    if text.len() % 2 != 0 {
        return Err(line.error_at(field, "odd number of hex digits"));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| Error::syntax(line.number, field.column + i, "invalid hex byte"))
        })
        .collect()
}
