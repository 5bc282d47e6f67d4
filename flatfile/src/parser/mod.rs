//! Text layer: dialects, tokenizing, formatting, and source decoding.
//!
//! - [`Tokenizer`] splits one logical record into raw fields
//! - [`RecordSource`] pulls logical records (possibly spanning lines) from a `BufRead`
//! - [`Formatter`] joins fields back into one record of text
//!
//! The helpers at the bottom detect the encoding and delimiter of unknown
//! input before a reader is built over it.

pub mod formatter;
pub mod tokenizer;

pub use formatter::Formatter;
pub use tokenizer::{RawRecord, RecordSource, Split, Tokenizer};

use crate::config::{QuoteStyle, RecordSeparator};
use crate::error::{ConfigError, ConfigResult, ReadError, ReadResult};

// =============================================================================
// Dialect
// =============================================================================

/// Validated delimiter / quote / separator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    delimiter: char,
    quote: char,
    record_separator: RecordSeparator,
    quote_style: QuoteStyle,
}

impl Dialect {
    pub fn new(
        delimiter: char,
        quote: char,
        record_separator: RecordSeparator,
        quote_style: QuoteStyle,
    ) -> ConfigResult<Self> {
        if delimiter == quote {
            return Err(ConfigError::ConflictingDialect(format!(
                "delimiter and quote are both '{}'",
                delimiter
            )));
        }
        for (what, c) in [("delimiter", delimiter), ("quote", quote)] {
            if c == '\r' || c == '\n' {
                return Err(ConfigError::ConflictingDialect(format!(
                    "{} cannot be a line break",
                    what
                )));
            }
        }
        if let RecordSeparator::Custom(sep) = record_separator {
            if !sep.is_ascii() {
                return Err(ConfigError::ConflictingDialect(format!(
                    "record separator '{}' must be ASCII",
                    sep
                )));
            }
            if sep == delimiter || sep == quote {
                return Err(ConfigError::ConflictingDialect(format!(
                    "record separator '{}' is also the delimiter or quote",
                    sep
                )));
            }
        }
        Ok(Self {
            delimiter,
            quote,
            record_separator,
            quote_style,
        })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    pub fn record_separator(&self) -> RecordSeparator {
        self.record_separator
    }

    pub fn quote_style(&self) -> QuoteStyle {
        self.quote_style
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            record_separator: RecordSeparator::Newline,
            quote_style: QuoteStyle::Necessary,
        }
    }
}

// =============================================================================
// Source Detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding.
///
/// UTF-8 input must be valid; single-byte encodings always decode.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ReadResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|e| ReadError::Encoding(format!("invalid UTF-8: {}", e))),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.into_owned())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()),
        other => encoding_rs::Encoding::for_label(other.as_bytes())
            .map(|enc| enc.decode(bytes).0.into_owned())
            .ok_or_else(|| ReadError::Encoding(format!("unsupported encoding '{}'", other))),
    }
}

/// Detect the delimiter by counting unquoted occurrences in the first line
pub fn detect_delimiter(content: &str, quote: char) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut counts = [0usize; 4];
    let mut in_quotes = false;

    for c in first_line.chars() {
        if c == quote {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = separators.iter().position(|&s| s == c) {
            counts[i] += 1;
        }
    }

    let mut best_sep = ',';
    let mut best_count = 0;
    for (&sep, &count) in separators.iter().zip(counts.iter()) {
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}
