//! Culture: the explicit locale parameter for parsing and formatting.
//!
//! Every [`ColumnType::parse`](super::ColumnType::parse) and
//! [`ColumnType::format`](super::ColumnType::format) call takes a `&Culture`.
//! Nothing in the engine reads process-wide locale settings.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use serde::Deserialize;

use super::format::DatePattern;
use crate::error::{ConfigError, ConfigResult};

static INVARIANT: Lazy<Culture> = Lazy::new(|| Culture {
    decimal_separator: '.',
    group_separator: ',',
    true_literal: "true".to_string(),
    false_literal: "false".to_string(),
    input_patterns: vec![
        DatePattern::trusted("MM/dd/yyyy HH:mm:ss.FFFFFFF", "%m/%d/%Y %H:%M:%S%.f", true),
        DatePattern::trusted("MM/dd/yyyy", "%m/%d/%Y", false),
        DatePattern::trusted("yyyy-MM-ddTHH:mm:ss.FFFFFFF", "%Y-%m-%dT%H:%M:%S%.f", true),
        DatePattern::trusted("yyyy-MM-dd HH:mm:ss.FFFFFFF", "%Y-%m-%d %H:%M:%S%.f", true),
        DatePattern::trusted("yyyy-MM-dd", "%Y-%m-%d", false),
    ],
    output_pattern: DatePattern::trusted(
        "MM/dd/yyyy HH:mm:ss.FFFFFFF",
        "%m/%d/%Y %H:%M:%S%.f",
        true,
    ),
});

/// Separators, boolean literals and default date patterns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CultureConfig")]
pub struct Culture {
    decimal_separator: char,
    group_separator: char,
    true_literal: String,
    false_literal: String,
    input_patterns: Vec<DatePattern>,
    output_pattern: DatePattern,
}

impl Culture {
    /// The invariant culture: `.` decimals, `,` groups, US-style dates.
    pub fn invariant() -> Self {
        INVARIANT.clone()
    }

    pub fn builder() -> CultureConfig {
        CultureConfig::default()
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn group_separator(&self) -> char {
        self.group_separator
    }

    pub fn true_literal(&self) -> &str {
        &self.true_literal
    }

    pub fn false_literal(&self) -> &str {
        &self.false_literal
    }

    /// Default patterns tried in order when a column has no input format.
    pub fn datetime_input_patterns(&self) -> &[DatePattern] {
        &self.input_patterns
    }

    pub fn datetime_output_pattern(&self) -> &DatePattern {
        &self.output_pattern
    }

    pub fn parse_datetime(&self, text: &str) -> Option<NaiveDateTime> {
        self.input_patterns.iter().find_map(|p| p.parse(text))
    }

    pub fn parse_bool(&self, text: &str) -> Option<bool> {
        if text.eq_ignore_ascii_case(&self.true_literal) {
            Some(true)
        } else if text.eq_ignore_ascii_case(&self.false_literal) {
            Some(false)
        } else {
            None
        }
    }

    pub fn format_bool(&self, value: bool) -> &str {
        if value {
            &self.true_literal
        } else {
            &self.false_literal
        }
    }
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}

/// Uncompiled culture settings, as found in an options document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CultureConfig {
    pub decimal_separator: char,
    pub group_separator: char,
    pub true_literal: String,
    pub false_literal: String,
    pub datetime_input_patterns: Vec<String>,
    pub datetime_output_pattern: String,
}

impl Default for CultureConfig {
    fn default() -> Self {
        Self {
            decimal_separator: INVARIANT.decimal_separator,
            group_separator: INVARIANT.group_separator,
            true_literal: INVARIANT.true_literal.clone(),
            false_literal: INVARIANT.false_literal.clone(),
            datetime_input_patterns: INVARIANT
                .input_patterns
                .iter()
                .map(|p| p.source().to_string())
                .collect(),
            datetime_output_pattern: INVARIANT.output_pattern.source().to_string(),
        }
    }
}

impl CultureConfig {
    pub fn decimal_separator(mut self, c: char) -> Self {
        self.decimal_separator = c;
        self
    }

    pub fn group_separator(mut self, c: char) -> Self {
        self.group_separator = c;
        self
    }

    pub fn bool_literals(mut self, true_literal: &str, false_literal: &str) -> Self {
        self.true_literal = true_literal.to_string();
        self.false_literal = false_literal.to_string();
        self
    }

    pub fn datetime_input_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.datetime_input_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn datetime_output_pattern(mut self, pattern: &str) -> Self {
        self.datetime_output_pattern = pattern.to_string();
        self
    }

    pub fn build(self) -> ConfigResult<Culture> {
        Culture::try_from(self)
    }
}

impl TryFrom<CultureConfig> for Culture {
    type Error = ConfigError;

    fn try_from(config: CultureConfig) -> Result<Self, Self::Error> {
        if config.decimal_separator == config.group_separator {
            return Err(ConfigError::ConflictingDialect(format!(
                "decimal and group separator are both '{}'",
                config.decimal_separator
            )));
        }
        if config.datetime_input_patterns.is_empty() {
            return Err(ConfigError::InvalidPattern {
                pattern: String::new(),
                message: "at least one datetime input pattern is required".to_string(),
            });
        }
        if config.true_literal.is_empty()
            || config.false_literal.is_empty()
            || config.true_literal.eq_ignore_ascii_case(&config.false_literal)
        {
            return Err(ConfigError::ConflictingDialect(
                "boolean literals must be distinct and non-empty".to_string(),
            ));
        }

        let compile = |pattern: &str| {
            DatePattern::compile(pattern).map_err(|message| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                message,
            })
        };
        let input_patterns = config
            .datetime_input_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<ConfigResult<Vec<_>>>()?;
        let output_pattern = compile(&config.datetime_output_pattern)?;

        Ok(Culture {
            decimal_separator: config.decimal_separator,
            group_separator: config.group_separator,
            true_literal: config.true_literal,
            false_literal: config.false_literal,
            input_patterns,
            output_pattern,
        })
    }
}
