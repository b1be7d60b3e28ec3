use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Line {line}: expected {expected} values, found {found}")]
    WrongValueCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },
    #[error("Unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("Line {line}: unexpected trailing data")]
    TrailingData { line: usize },
    #[error("Line {line}: {message}")]
    Invalid { line: usize, message: String },
    #[error("IO error: {0}")]
    Io(String),
}

/// Line-oriented reader over whitespace-delimited instance text.
///
/// Blank lines are section separators in the instance formats and are
/// skipped; every consumed line keeps its 1-based number for error reporting.
pub struct Reader<'a> {
    lines: std::str::Lines<'a>,
    line: usize,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            line: 0,
        }
    }

    fn next_nonblank(&mut self) -> Option<(usize, &'a str)> {
        for text in self.lines.by_ref() {
            self.line += 1;
            if !text.trim().is_empty() {
                return Some((self.line, text));
            }
        }
        None
    }

    /// Next non-blank line split into whitespace tokens.
    pub fn tokens(&mut self, expected: &str) -> Result<(usize, Vec<&'a str>), ParseError> {
        let (line, text) = self
            .next_nonblank()
            .ok_or_else(|| ParseError::UnexpectedEof {
                expected: expected.to_string(),
            })?;
        Ok((line, text.split_whitespace().collect()))
    }

    /// Next non-blank line as exactly `expected_len` numbers.
    pub fn row(&mut self, expected_len: usize, what: &str) -> Result<Vec<f64>, ParseError> {
        let (line, tokens) = self.tokens(what)?;
        if tokens.len() != expected_len {
            return Err(ParseError::WrongValueCount {
                line,
                expected: expected_len,
                found: tokens.len(),
            });
        }
        tokens.iter().map(|t| parse_number(line, t)).collect()
    }

    /// Fails if any non-blank content remains.
    pub fn finish(&mut self) -> Result<(), ParseError> {
        match self.next_nonblank() {
            Some((line, _)) => Err(ParseError::TrailingData { line }),
            None => Ok(()),
        }
    }
}

pub fn parse_number(line: usize, token: &str) -> Result<f64, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

pub fn parse_count(line: usize, token: &str) -> Result<usize, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_blank_lines_and_tracks_numbers() {
        let mut reader = Reader::new("1 2\n\n\n3 4\n");
        assert_eq!(reader.row(2, "first").unwrap(), vec![1.0, 2.0]);
        assert_eq!(reader.row(2, "second").unwrap(), vec![3.0, 4.0]);
        assert_eq!(reader.finish(), Ok(()));
    }

    #[test]
    fn test_wrong_value_count_reports_line() {
        let mut reader = Reader::new("1 2\n3\n");
        reader.row(2, "first").unwrap();
        assert_eq!(
            reader.row(2, "second"),
            Err(ParseError::WrongValueCount {
                line: 2,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_invalid_number() {
        let mut reader = Reader::new("1 abc\n");
        assert_eq!(
            reader.row(2, "row"),
            Err(ParseError::InvalidNumber {
                line: 1,
                token: "abc".to_string()
            })
        );
    }

    #[test]
    fn test_eof() {
        let mut reader = Reader::new("\n  \n");
        assert!(matches!(
            reader.row(1, "size"),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_trailing_data() {
        let mut reader = Reader::new("1\nextra\n");
        reader.row(1, "size").unwrap();
        assert_eq!(reader.finish(), Err(ParseError::TrailingData { line: 2 }));
    }
}
