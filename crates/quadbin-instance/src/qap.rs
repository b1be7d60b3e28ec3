use std::path::Path;

use crate::reader::{ParseError, Reader, parse_count, parse_number};

/// A Quadratic Assignment Problem instance: assign `size` facilities to
/// `size` locations minimizing total flow x distance cost.
///
/// Read once from a whitespace-delimited text file and never mutated:
///
/// ```text
/// S [optimal]
/// S rows of the S x S flow matrix
/// (blank separator)
/// S rows of the S x S distance matrix
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct QapInstance {
    pub size: usize,
    /// Best known objective value, when the header carries one
    pub optimal: Option<f64>,
    pub flow: Vec<Vec<f64>>,
    pub distance: Vec<Vec<f64>>,
}

impl QapInstance {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::new(source);

        let (line, header) = reader.tokens("problem size")?;
        let (size, optimal) = match header.as_slice() {
            [size] => (parse_count(line, size)?, None),
            [size, optimal] => (
                parse_count(line, size)?,
                Some(parse_number(line, optimal)?),
            ),
            _ => {
                return Err(ParseError::Invalid {
                    line,
                    message: format!(
                        "expected size and optional optimal value, found {} tokens",
                        header.len()
                    ),
                });
            }
        };

        let mut flow = Vec::with_capacity(size);
        for _ in 0..size {
            flow.push(reader.row(size, "flow matrix row")?);
        }
        let mut distance = Vec::with_capacity(size);
        for _ in 0..size {
            distance.push(reader.row(size, "distance matrix row")?);
        }
        reader.finish()?;

        Ok(Self {
            size,
            optimal,
            flow,
            distance,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ParseError::Io(format!("{}: {}", path.display(), e)))?;
        Self::parse(&source)
    }
}
