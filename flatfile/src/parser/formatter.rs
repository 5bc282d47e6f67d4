//! Record formatter: the inverse of the tokenizer.

use super::Dialect;
use crate::config::{QuoteStyle, RecordSeparator};

/// Joins field strings into one record of text.
#[derive(Debug, Clone)]
pub struct Formatter {
    delimiter: char,
    quote: char,
    quote_style: QuoteStyle,
    custom_separator: Option<char>,
    terminator: String,
}

impl Formatter {
    pub fn new(dialect: &Dialect) -> Self {
        let custom_separator = match dialect.record_separator() {
            RecordSeparator::Custom(c) => Some(c),
            _ => None,
        };
        Self {
            delimiter: dialect.delimiter(),
            quote: dialect.quote(),
            quote_style: dialect.quote_style(),
            custom_separator,
            terminator: dialect.record_separator().as_output(),
        }
    }

    /// Whether `field` must be quoted to survive tokenizing.
    ///
    /// `sole` marks a record with a single field, where an empty field would
    /// otherwise read back as a blank line.
    pub fn needs_quotes(&self, field: &str, sole: bool) -> bool {
        if self.quote_style == QuoteStyle::Always || (sole && field.is_empty()) {
            return true;
        }
        field.chars().any(|c| {
            c == self.delimiter
                || c == self.quote
                || c == '\r'
                || c == '\n'
                || Some(c) == self.custom_separator
        })
    }

    /// Append one record, terminator included, to `out`.
    pub fn write_record<S: AsRef<str>>(&self, fields: &[S], out: &mut String) {
        let sole = fields.len() == 1;
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(self.delimiter);
            }
            let field = field.as_ref();
            if self.needs_quotes(field, sole) {
                out.push(self.quote);
                for c in field.chars() {
                    if c == self.quote {
                        out.push(self.quote);
                    }
                    out.push(c);
                }
                out.push(self.quote);
            } else {
                out.push_str(field);
            }
        }
        out.push_str(&self.terminator);
    }

    pub fn format_record<S: AsRef<str>>(&self, fields: &[S]) -> String {
        let mut out = String::new();
        self.write_record(fields, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{RecordSource, Split, Tokenizer};

    fn formatter() -> Formatter {
        Formatter::new(&Dialect::default())
    }

    #[test]
    fn test_plain_fields() {
        assert_eq!(
            formatter().format_record(&["123", "Bob", "12/31/2012", "3.14159"]),
            "123,Bob,12/31/2012,3.14159\n"
        );
    }

    #[test]
    fn test_quotes_when_needed() {
        assert_eq!(
            formatter().format_record(&["a,b", "say \"hi\"", "two\nlines", "plain"]),
            "\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\",plain\n"
        );
    }

    #[test]
    fn test_sole_empty_field_is_quoted() {
        assert_eq!(formatter().format_record(&[""]), "\"\"\n");
        assert_eq!(formatter().format_record(&["", ""]), ",\n");
    }

    #[test]
    fn test_always_quote_and_crlf() {
        let dialect = Dialect::new(';', '"', RecordSeparator::CrLf, QuoteStyle::Always).unwrap();
        let f = Formatter::new(&dialect);
        assert_eq!(f.format_record(&["1", "x"]), "\"1\";\"x\"\r\n");
    }

    #[test]
    fn test_custom_separator_is_quoted() {
        let dialect =
            Dialect::new(',', '"', RecordSeparator::Custom('|'), QuoteStyle::Necessary).unwrap();
        let f = Formatter::new(&dialect);
        assert_eq!(f.format_record(&["a|b", "c"]), "\"a|b\",c|");
    }

    #[test]
    fn test_tokenizer_inverts_formatter() {
        let fields = vec![
            "".to_string(),
            "comma, inside".to_string(),
            "\"quoted\"".to_string(),
            "multi\r\nline".to_string(),
            "trailing ".to_string(),
        ];
        let text = formatter().format_record(&fields);
        let line = text.trim_end_matches('\n');
        assert_eq!(
            Tokenizer::new(&Dialect::default()).split(line).unwrap(),
            Split::Complete(fields.clone())
        );

        let mut source = RecordSource::new(text.as_bytes(), &Dialect::default());
        assert_eq!(source.next_record().unwrap().unwrap().fields, fields);
    }

    #[test]
    fn test_csv_crate_reads_our_output() {
        let rows = vec![vec!["id", "note"], vec!["1", "he said \"no, thanks\""]];
        let mut text = String::new();
        for row in &rows {
            formatter().write_record(row, &mut text);
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes());
        let parsed: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        assert_eq!(parsed[1][1], "he said \"no, thanks\"");
        assert_eq!(parsed.len(), 2);
    }
}
