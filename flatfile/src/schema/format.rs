//! Column format strings.
//!
//! Date patterns are written in the custom pattern language common to
//! flat-file tooling (`MM/dd/yyyy HH:mm:ss`) and translated once, at column
//! build time, into chrono strftime items. Numeric formats cover the
//! standard `G`/`F<n>`/`N<n>` specifiers and simple `#,##0.00` masks.

use chrono::format::{self, Item, Parsed, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write;

use super::culture::Culture;
use super::ColumnKind;

/// Splits a date pattern into specifier runs, quoted literals and single chars.
static PATTERN_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)'[^']*'|\\.|\.F+|y+|M+|d+|H+|h+|m+|s+|f+|F+|t+|z+|K|g+|.")
        .expect("pattern token regex is valid")
});

// =============================================================================
// Date Patterns
// =============================================================================

/// Date given to values parsed with a time-only pattern.
const TIME_ONLY_DATE: (i32, u32, u32) = (1, 1, 1);

/// A compiled date/time pattern.
///
/// Fields the pattern leaves out are filled in on parse: month and day
/// default to 1, minutes and seconds to 0, and a time-only pattern lands on
/// 0001-01-01.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    strftime: String,
    has_date: bool,
    has_time: bool,
}

impl DatePattern {
    /// Translate a custom date pattern into its strftime form.
    pub fn compile(pattern: &str) -> Result<Self, String> {
        if pattern.is_empty() {
            return Err("empty date pattern".to_string());
        }

        let mut strftime = String::with_capacity(pattern.len() * 2);
        let mut has_date = false;
        let mut has_time = false;

        for token in PATTERN_TOKEN.find_iter(pattern) {
            let tok = token.as_str();
            let mut chars = tok.chars();
            let first = chars.next().unwrap_or_default();
            let run = tok.chars().count();

            let item: &str = match first {
                '\'' => {
                    push_literal(&mut strftime, tok.trim_matches('\''));
                    continue;
                }
                '\\' => {
                    push_literal(&mut strftime, chars.as_str());
                    continue;
                }
                '.' if run > 1 => {
                    has_time = true;
                    "%.f"
                }
                'y' => {
                    has_date = true;
                    match run {
                        1 | 2 => "%y",
                        _ => "%Y",
                    }
                }
                'M' => {
                    has_date = true;
                    match run {
                        1 => "%-m",
                        2 => "%m",
                        3 => "%b",
                        4 => "%B",
                        _ => return Err(format!("'{}' is not a month specifier", tok)),
                    }
                }
                'd' => match run {
                    1 | 2 => {
                        has_date = true;
                        if run == 1 {
                            "%-d"
                        } else {
                            "%d"
                        }
                    }
                    3 => "%a",
                    4 => "%A",
                    _ => return Err(format!("'{}' is not a day specifier", tok)),
                },
                'H' | 'h' | 'm' | 's' => {
                    has_time = true;
                    match (first, run) {
                        ('H', 1) => "%-H",
                        ('H', 2) => "%H",
                        ('h', 1) => "%-I",
                        ('h', 2) => "%I",
                        ('m', 1) => "%-M",
                        ('m', 2) => "%M",
                        ('s', 1) => "%-S",
                        ('s', 2) => "%S",
                        _ => return Err(format!("'{}' is too long", tok)),
                    }
                }
                'f' => {
                    has_time = true;
                    match run {
                        3 => "%3f",
                        6 => "%6f",
                        9 => "%9f",
                        _ => return Err(format!("'{}' must have 3, 6 or 9 digits", tok)),
                    }
                }
                't' if run <= 2 => "%p",
                'F' | 'z' | 'K' | 'g' | 't' => {
                    return Err(format!("unsupported specifier '{}'", tok));
                }
                _ => {
                    push_literal(&mut strftime, tok);
                    continue;
                }
            };
            strftime.push_str(item);
        }

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(format!("cannot translate '{}'", pattern));
        }

        Ok(Self {
            source: pattern.to_string(),
            strftime,
            has_date,
            has_time,
        })
    }

    /// Build a pattern whose translation is already known.
    pub(crate) fn trusted(source: &str, strftime: &str, has_time: bool) -> Self {
        Self {
            source: source.to_string(),
            strftime: strftime.to_string(),
            has_date: true,
            has_time,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, text, StrftimeItems::new(&self.strftime)).ok()?;

        // Setters keep an already-parsed value, so these only fill gaps.
        let date = if self.has_date {
            let _ = parsed.set_month(1);
            let _ = parsed.set_day(1);
            parsed.to_naive_date().ok()?
        } else {
            let (y, m, d) = TIME_ONLY_DATE;
            NaiveDate::from_ymd_opt(y, m, d)?
        };
        let time = if self.has_time {
            let _ = parsed.set_minute(0);
            let _ = parsed.set_second(0);
            parsed.to_naive_time().ok()?
        } else {
            NaiveTime::MIN
        };
        Some(date.and_time(time))
    }

    pub fn format(&self, value: &NaiveDateTime) -> Option<String> {
        let mut out = String::new();
        write!(out, "{}", value.format(&self.strftime)).ok()?;
        Some(out)
    }
}

fn push_literal(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '%' => out.push_str("%%"),
            '\t' => out.push_str("%t"),
            '\n' => out.push_str("%n"),
            c => out.push(c),
        }
    }
}

// =============================================================================
// Number Formats
// =============================================================================

/// A compiled numeric format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumberFormat {
    /// Fixed number of fractional digits; `None` is the shortest exact form.
    decimals: Option<usize>,
    /// Insert group separators in the integer part.
    grouped: bool,
}

impl NumberFormat {
    pub fn compile(spec: &str) -> Result<Self, String> {
        let mut chars = spec.chars();
        let Some(head) = chars.next() else {
            return Ok(Self::default());
        };
        let tail = chars.as_str();

        match head {
            'G' | 'g' | 'R' | 'r' if tail.is_empty() => Ok(Self::default()),
            'F' | 'f' | 'N' | 'n' => {
                let decimals = if tail.is_empty() {
                    2
                } else {
                    tail.parse::<usize>()
                        .map_err(|_| format!("bad precision in '{}'", spec))?
                };
                if decimals > 28 {
                    return Err(format!("precision {} is too large", decimals));
                }
                Ok(Self {
                    decimals: Some(decimals),
                    grouped: matches!(head, 'N' | 'n'),
                })
            }
            _ if spec.chars().all(|c| matches!(c, '0' | '#' | ',' | '.')) => {
                let (int_part, frac_part) = spec.split_once('.').unwrap_or((spec, ""));
                if frac_part.contains(['.', ',']) {
                    return Err(format!("misplaced separator in '{}'", spec));
                }
                Ok(Self {
                    decimals: Some(frac_part.len()),
                    grouped: int_part.contains(','),
                })
            }
            _ => Err(format!("unsupported numeric format '{}'", spec)),
        }
    }

    pub fn decimals(&self) -> Option<usize> {
        self.decimals
    }

    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub fn format_decimal(&self, value: &Decimal, culture: &Culture) -> String {
        let text = match self.decimals {
            Some(n) => {
                let rounded =
                    value.round_dp_with_strategy(n as u32, RoundingStrategy::MidpointAwayFromZero);
                format!("{:.*}", n, rounded)
            }
            None => value.to_string(),
        };
        self.localize(&text, culture)
    }

    pub fn format_double(&self, value: f64, culture: &Culture) -> String {
        let text = match self.decimals {
            Some(n) if value.is_finite() => format!("{:.*}", n, value),
            _ => value.to_string(),
        };
        self.localize(&text, culture)
    }

    pub fn format_integer(&self, value: i64, culture: &Culture) -> String {
        self.localize(&value.to_string(), culture)
    }

    /// Turn culture-formatted text back into the invariant form Rust parses.
    ///
    /// `None` when the text holds a group separator the format does not allow,
    /// or a `.` that is not the culture's decimal separator.
    pub fn normalize(&self, text: &str, culture: &Culture) -> Option<String> {
        let text = text.trim();
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c == culture.decimal_separator() {
                out.push('.');
            } else if c == culture.group_separator() {
                if !self.grouped {
                    return None;
                }
            } else if c == '.' {
                return None;
            } else {
                out.push(c);
            }
        }
        Some(out)
    }

    /// Swap in culture separators and insert grouping.
    fn localize(&self, invariant: &str, culture: &Culture) -> String {
        let (sign, digits) = match invariant.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", invariant),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (digits, None),
        };

        let mut out = String::with_capacity(invariant.len() + int_part.len() / 3);
        out.push_str(sign);
        if self.grouped && int_part.bytes().all(|b| b.is_ascii_digit()) {
            for (i, c) in int_part.chars().enumerate() {
                if i > 0 && (int_part.len() - i) % 3 == 0 {
                    out.push(culture.group_separator());
                }
                out.push(c);
            }
        } else {
            out.push_str(int_part);
        }
        if let Some(frac) = frac_part {
            out.push(culture.decimal_separator());
            out.push_str(frac);
        }
        out
    }
}

// =============================================================================
// Column Formats
// =============================================================================

/// A format string compiled for a particular column kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFormat {
    Date { source: String, pattern: DatePattern },
    Number { source: String, format: NumberFormat },
}

impl ColumnFormat {
    pub fn compile(kind: ColumnKind, spec: &str) -> Result<Self, String> {
        match kind {
            ColumnKind::DateTime => Ok(ColumnFormat::Date {
                source: spec.to_string(),
                pattern: DatePattern::compile(spec)?,
            }),
            ColumnKind::Int32 | ColumnKind::Int64 => {
                let format = NumberFormat::compile(spec)?;
                if format.decimals.unwrap_or(0) > 0 {
                    return Err("integer columns cannot have fractional digits".to_string());
                }
                Ok(ColumnFormat::Number {
                    source: spec.to_string(),
                    format,
                })
            }
            ColumnKind::Decimal | ColumnKind::Double => Ok(ColumnFormat::Number {
                source: spec.to_string(),
                format: NumberFormat::compile(spec)?,
            }),
            ColumnKind::String | ColumnKind::Boolean => {
                Err("this kind does not take a format".to_string())
            }
        }
    }

    pub fn source(&self) -> &str {
        match self {
            ColumnFormat::Date { source, .. } | ColumnFormat::Number { source, .. } => source,
        }
    }

    pub fn date_pattern(&self) -> Option<&DatePattern> {
        match self {
            ColumnFormat::Date { pattern, .. } => Some(pattern),
            ColumnFormat::Number { .. } => None,
        }
    }

    pub fn number_format(&self) -> Option<&NumberFormat> {
        match self {
            ColumnFormat::Number { format, .. } => Some(format),
            ColumnFormat::Date { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_translate_us_date() {
        let p = DatePattern::compile("MM/dd/yyyy").unwrap();
        assert_eq!(p.strftime(), "%m/%d/%Y");
        assert_eq!(p.parse("12/31/2012"), Some(ymd_hms(2012, 12, 31, 0, 0, 0)));
        assert_eq!(p.format(&ymd_hms(2012, 12, 31, 0, 0, 0)).unwrap(), "12/31/2012");
    }

    #[test]
    fn test_translate_iso_with_literal_t() {
        let p = DatePattern::compile("yyyy-MM-ddTHH:mm:ss").unwrap();
        assert_eq!(p.strftime(), "%Y-%m-%dT%H:%M:%S");
        assert_eq!(
            p.parse("2020-02-29T13:05:09"),
            Some(ymd_hms(2020, 2, 29, 13, 5, 9))
        );
    }

    #[test]
    fn test_quoted_and_escaped_literals() {
        let p = DatePattern::compile("dd 'de' MMMM \\h HH").unwrap();
        assert_eq!(p.strftime(), "%d de %B h %H");
    }

    #[test]
    fn test_optional_fraction() {
        let p = DatePattern::compile("yyyy-MM-dd HH:mm:ss.FFFFFFF").unwrap();
        let whole = ymd_hms(2021, 1, 2, 3, 4, 5);
        assert_eq!(p.format(&whole).unwrap(), "2021-01-02 03:04:05");
        let fractional = whole + chrono::Duration::milliseconds(250);
        let text = p.format(&fractional).unwrap();
        assert_eq!(text, "2021-01-02 03:04:05.250");
        assert_eq!(p.parse(&text), Some(fractional));
    }

    #[test]
    fn test_twelve_hour_clock() {
        let p = DatePattern::compile("M/d/yyyy h:mm tt").unwrap();
        let value = ymd_hms(2012, 3, 4, 15, 30, 0);
        let text = p.format(&value).unwrap();
        assert_eq!(text, "3/4/2012 3:30 PM");
        assert_eq!(p.parse(&text), Some(value));
    }

    #[test]
    fn test_month_year_defaults_day() {
        let p = DatePattern::compile("MM/yyyy").unwrap();
        let value = ymd_hms(2012, 12, 1, 0, 0, 0);
        assert_eq!(p.parse("12/2012"), Some(value));
        assert_eq!(p.format(&value).unwrap(), "12/2012");
        assert_eq!(p.parse(&p.format(&value).unwrap()), Some(value));

        let p = DatePattern::compile("yyyy").unwrap();
        assert_eq!(p.parse("1999"), Some(ymd_hms(1999, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_time_only_pattern() {
        let p = DatePattern::compile("HH:mm:ss").unwrap();
        let value = ymd_hms(1, 1, 1, 10, 0, 0);
        assert_eq!(p.parse("10:00:00"), Some(value));
        assert_eq!(p.format(&value).unwrap(), "10:00:00");
        assert_eq!(p.parse("25:00:00"), None);
    }

    #[test]
    fn test_hour_only_defaults_minutes() {
        let p = DatePattern::compile("yyyy-MM-dd HH").unwrap();
        assert_eq!(p.parse("2012-12-31 10"), Some(ymd_hms(2012, 12, 31, 10, 0, 0)));
        assert_eq!(p.parse("2012-02-30 10"), None);
    }

    #[test]
    fn test_unsupported_specifiers() {
        assert!(DatePattern::compile("yyyy-MM-dd zzz").is_err());
        assert!(DatePattern::compile("HH:mm:ss.ff").is_err());
        assert!(DatePattern::compile("").is_err());
        assert!(DatePattern::compile("MMMMM").is_err());
    }

    #[test]
    fn test_percent_is_literal() {
        let p = DatePattern::compile("yyyy%MM").unwrap();
        assert_eq!(p.strftime(), "%Y%%%m");
        assert_eq!(p.parse("2012%12"), Some(ymd_hms(2012, 12, 1, 0, 0, 0)));
    }

    #[test]
    fn test_number_format_specs() {
        assert_eq!(NumberFormat::compile("G").unwrap(), NumberFormat::default());
        let f2 = NumberFormat::compile("F2").unwrap();
        assert_eq!(f2.decimals(), Some(2));
        assert!(!f2.is_grouped());
        let n = NumberFormat::compile("N").unwrap();
        assert_eq!(n.decimals(), Some(2));
        assert!(n.is_grouped());
        let mask = NumberFormat::compile("#,##0.000").unwrap();
        assert_eq!(mask.decimals(), Some(3));
        assert!(mask.is_grouped());
        assert!(NumberFormat::compile("X4").is_err());
        assert!(NumberFormat::compile("0.0.0").is_err());
    }

    #[test]
    fn test_number_formatting_with_culture() {
        let invariant = Culture::invariant();
        let n2 = NumberFormat::compile("N2").unwrap();
        let d = Decimal::from_str("-1234567.125").unwrap();
        assert_eq!(n2.format_decimal(&d, &invariant), "-1,234,567.13");
        assert_eq!(n2.format_double(1234.5, &invariant), "1,234.50");
        assert_eq!(n2.normalize("1,234.50", &invariant).as_deref(), Some("1234.50"));

        let comma = Culture::builder()
            .decimal_separator(',')
            .group_separator('.')
            .build()
            .unwrap();
        assert_eq!(n2.format_decimal(&d, &comma), "-1.234.567,13");
        assert_eq!(
            n2.normalize("-1.234.567,13", &comma).as_deref(),
            Some("-1234567.13")
        );
        assert_eq!(NumberFormat::default().format_double(3.5, &comma), "3,5");
    }

    #[test]
    fn test_normalize_rejects_foreign_separators() {
        let comma = Culture::builder()
            .decimal_separator(',')
            .group_separator('.')
            .build()
            .unwrap();
        let general = NumberFormat::default();
        assert_eq!(general.normalize("1.234", &comma), None);
        assert_eq!(general.normalize("1234,5", &comma).as_deref(), Some("1234.5"));

        let n2 = NumberFormat::compile("N2").unwrap();
        assert_eq!(n2.normalize("1.234,5", &comma).as_deref(), Some("1234.5"));

        let invariant = Culture::invariant();
        assert_eq!(general.normalize("1,234.5", &invariant), None);
        assert_eq!(general.normalize(" -12.5 ", &invariant).as_deref(), Some("-12.5"));
    }

    #[test]
    fn test_integer_kinds_reject_fraction_formats() {
        assert!(ColumnFormat::compile(ColumnKind::Int32, "F2").is_err());
        assert!(ColumnFormat::compile(ColumnKind::Int64, "N0").is_ok());
        assert!(ColumnFormat::compile(ColumnKind::String, "G").is_err());
        let date = ColumnFormat::compile(ColumnKind::DateTime, "yyyyMMdd").unwrap();
        assert_eq!(date.source(), "yyyyMMdd");
        assert!(date.date_pattern().is_some());
        assert!(date.number_format().is_none());
    }
}
