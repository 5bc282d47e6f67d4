//! Reader/writer options.
//!
//! Options are plain data: built in code, loaded from a JSON document, or
//! overridden by `FLATFILE_*` environment variables. Every reader and writer
//! takes its own copy at construction.

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::parser::Dialect;
use crate::schema::Culture;

/// Environment variables recognized by [`Options::from_env`].
pub const ENV_DELIMITER: &str = "FLATFILE_DELIMITER";
pub const ENV_QUOTE: &str = "FLATFILE_QUOTE";
pub const ENV_HEADER: &str = "FLATFILE_HEADER";
pub const ENV_RECORD_SEPARATOR: &str = "FLATFILE_RECORD_SEPARATOR";

/// What ends a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSeparator {
    /// `\n` on output; `\n` or `\r\n` on input.
    #[default]
    Newline,
    /// `\r\n` on output; `\n` or `\r\n` on input.
    CrLf,
    /// A single ASCII character.
    Custom(char),
}

impl RecordSeparator {
    pub fn as_output(&self) -> String {
        match self {
            RecordSeparator::Newline => "\n".to_string(),
            RecordSeparator::CrLf => "\r\n".to_string(),
            RecordSeparator::Custom(c) => c.to_string(),
        }
    }
}

/// When the formatter wraps fields in quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Only fields that would otherwise be ambiguous.
    #[default]
    Necessary,
    /// Every field.
    Always,
}

/// Options shared by [`Reader`](crate::Reader) and [`Writer`](crate::Writer).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// First record holds column names (read: header, write: emit header).
    pub is_first_record_schema: bool,
    pub delimiter: char,
    pub quote: char,
    pub record_separator: RecordSeparator,
    pub quote_style: QuoteStyle,
    /// Ignore records that are entirely empty when reading.
    pub skip_blank_lines: bool,
    pub culture: Culture,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            is_first_record_schema: false,
            delimiter: ',',
            quote: '"',
            record_separator: RecordSeparator::Newline,
            quote_style: QuoteStyle::Necessary,
            skip_blank_lines: true,
            culture: Culture::invariant(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, is_first_record_schema: bool) -> Self {
        self.is_first_record_schema = is_first_record_schema;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_record_separator(mut self, separator: RecordSeparator) -> Self {
        self.record_separator = separator;
        self
    }

    pub fn with_quote_style(mut self, style: QuoteStyle) -> Self {
        self.quote_style = style;
        self
    }

    pub fn with_skip_blank_lines(mut self, skip: bool) -> Self {
        self.skip_blank_lines = skip;
        self
    }

    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = culture;
        self
    }

    /// Validated tokenizer/formatter settings.
    pub fn dialect(&self) -> ConfigResult<Dialect> {
        Dialect::new(
            self.delimiter,
            self.quote,
            self.record_separator,
            self.quote_style,
        )
    }

    /// Parse an options document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let options: Options = serde_json::from_str(json)?;
        options.dialect()?;
        Ok(options)
    }

    /// Defaults overridden by `FLATFILE_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().apply_vars(|var| std::env::var(var).ok())
    }

    /// Override fields from a variable lookup (the environment, or a map in tests).
    pub fn apply_vars<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DELIMITER) {
            self.delimiter = parse_char(ENV_DELIMITER, &value)?;
        }
        if let Some(value) = lookup(ENV_QUOTE) {
            self.quote = parse_char(ENV_QUOTE, &value)?;
        }
        if let Some(value) = lookup(ENV_HEADER) {
            self.is_first_record_schema = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(invalid(ENV_HEADER, &value)),
            };
        }
        if let Some(value) = lookup(ENV_RECORD_SEPARATOR) {
            self.record_separator = match value.to_lowercase().as_str() {
                "newline" | "lf" | "\n" => RecordSeparator::Newline,
                "crlf" | "\r\n" => RecordSeparator::CrLf,
                _ => RecordSeparator::Custom(parse_char(ENV_RECORD_SEPARATOR, &value)?),
            };
        }
        self.dialect()?;
        Ok(self)
    }
}

/// Single character, with `tab` / `\t` spelled out.
pub fn parse_char(var: &str, value: &str) -> ConfigResult<char> {
    match value {
        "tab" | "\\t" => return Ok('\t'),
        "space" => return Ok(' '),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(invalid(var, value)),
    }
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    }
}
