//! Record tokenizer.
//!
//! Quoting follows RFC 4180: a field that starts with the quote char runs
//! until a lone closing quote, doubled quotes inside it stand for one quote,
//! and delimiters or line breaks inside it are data. Quote chars in the
//! middle of an unquoted field are kept as-is.

use std::io::BufRead;

use super::Dialect;
use crate::config::RecordSeparator;
use crate::error::{ReadError, ReadResult};

/// Outcome of splitting a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Split {
    /// The text is a whole record.
    Complete(Vec<String>),
    /// The text ends inside a quoted field; more input is needed.
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    FieldStart,
    Unquoted,
    Quoted,
    /// Just saw a quote inside a quoted field: closing, or first half of `""`.
    QuoteInQuoted,
}

/// Fields of a record that is still being tokenized.
#[derive(Debug, Default)]
struct Pending {
    fields: Vec<String>,
    field: String,
    state: State,
}

/// Splits one logical record into raw field strings.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    delimiter: char,
    quote: char,
}

impl Tokenizer {
    pub fn new(dialect: &Dialect) -> Self {
        Self {
            delimiter: dialect.delimiter(),
            quote: dialect.quote(),
        }
    }

    /// Split `record` into fields.
    ///
    /// Returns the reason as `Err` when a closing quote is followed by
    /// anything other than the delimiter or the end of the record.
    pub fn split(&self, record: &str) -> Result<Split, String> {
        let mut pending = Pending::default();
        self.feed(&mut pending, record)?;
        Ok(self.finish(pending))
    }

    /// Run the state machine over `text`, continuing from `pending`.
    fn feed(&self, pending: &mut Pending, text: &str) -> Result<(), String> {
        let Pending {
            fields,
            field,
            state,
        } = pending;

        for c in text.chars() {
            *state = match *state {
                State::FieldStart if c == self.quote => State::Quoted,
                State::FieldStart | State::Unquoted if c == self.delimiter => {
                    fields.push(std::mem::take(field));
                    State::FieldStart
                }
                State::FieldStart | State::Unquoted => {
                    field.push(c);
                    State::Unquoted
                }
                State::Quoted if c == self.quote => State::QuoteInQuoted,
                State::Quoted => {
                    field.push(c);
                    State::Quoted
                }
                State::QuoteInQuoted if c == self.quote => {
                    field.push(self.quote);
                    State::Quoted
                }
                State::QuoteInQuoted if c == self.delimiter => {
                    fields.push(std::mem::take(field));
                    State::FieldStart
                }
                State::QuoteInQuoted => {
                    return Err(format!(
                        "unexpected '{}' after closing quote in field {}",
                        c.escape_default(),
                        fields.len() + 1
                    ));
                }
            };
        }
        Ok(())
    }

    fn finish(&self, mut pending: Pending) -> Split {
        if pending.state == State::Quoted {
            return Split::Open;
        }
        pending.fields.push(pending.field);
        Split::Complete(pending.fields)
    }
}

// =============================================================================
// Record Source
// =============================================================================

/// A tokenized logical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub fields: Vec<String>,
    /// 1-based line the record starts on.
    pub line: usize,
    /// The record text was empty.
    pub blank: bool,
}

/// Reads logical records from a buffered source.
///
/// Segments are split on the record separator and joined back together
/// while a quoted field is still open.
pub struct RecordSource<R> {
    source: R,
    tokenizer: Tokenizer,
    separator: RecordSeparator,
    /// Physical segments consumed so far.
    line: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> RecordSource<R> {
    pub fn new(source: R, dialect: &Dialect) -> Self {
        Self {
            source,
            tokenizer: Tokenizer::new(dialect),
            separator: dialect.record_separator(),
            line: 0,
            buf: Vec::new(),
        }
    }

    /// Line number of the last segment read.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Next physical segment and the terminator that ended it.
    fn next_segment(&mut self) -> ReadResult<Option<(String, &'static str)>> {
        let terminator = match self.separator {
            RecordSeparator::Newline | RecordSeparator::CrLf => b'\n',
            // Dialect guarantees ASCII.
            RecordSeparator::Custom(c) => c as u8,
        };

        self.buf.clear();
        if self.source.read_until(terminator, &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;

        let mut ending: &'static str = "";
        if self.buf.last() == Some(&terminator) {
            self.buf.pop();
            ending = match self.separator {
                RecordSeparator::Custom(_) => "",
                _ if self.buf.last() == Some(&b'\r') => {
                    self.buf.pop();
                    "\r\n"
                }
                _ => "\n",
            };
        }
        if self.line == 1 && self.buf.starts_with(b"\xEF\xBB\xBF") {
            self.buf.drain(..3);
        }

        let text = String::from_utf8(std::mem::take(&mut self.buf)).map_err(|e| {
            ReadError::Encoding(format!("line {}: invalid UTF-8: {}", self.line, e))
        })?;
        Ok(Some((text, ending)))
    }

    /// Next logical record, or `None` at end of input.
    ///
    /// Each segment is tokenized once; an open quoted field carries its
    /// state over to the next segment.
    pub fn next_record(&mut self) -> ReadResult<Option<RawRecord>> {
        let Some((text, mut ending)) = self.next_segment()? else {
            return Ok(None);
        };
        let start = self.line;
        let blank = text.is_empty();
        let custom = match self.separator {
            RecordSeparator::Custom(c) => Some(c),
            _ => None,
        };
        let malformed = |reason| ReadError::Malformed {
            line: start,
            reason,
        };

        let mut pending = Pending::default();
        self.tokenizer.feed(&mut pending, &text).map_err(malformed)?;
        while pending.state == State::Quoted {
            let Some((more, next_ending)) = self.next_segment()? else {
                return Err(malformed("unterminated quoted field".to_string()));
            };
            match custom {
                Some(c) => pending.field.push(c),
                None => pending.field.push_str(ending),
            }
            self.tokenizer.feed(&mut pending, &more).map_err(malformed)?;
            ending = next_ending;
        }

        match self.tokenizer.finish(pending) {
            Split::Complete(fields) => Ok(Some(RawRecord {
                blank,
                fields,
                line: start,
            })),
            Split::Open => Err(malformed("unterminated quoted field".to_string())),
        }
    }
}
