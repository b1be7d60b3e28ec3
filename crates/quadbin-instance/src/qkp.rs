use std::path::Path;

use quadbin_model::{pair_count, pair_index};

use crate::reader::{ParseError, Reader, parse_count};

/// A Quadratic Knapsack Problem instance: choose a subset of `size` items
/// maximizing a quadratic value function subject to a linear weight bound.
///
/// File layout (the format the original QKP benchmark sets use):
///
/// ```text
/// name
/// N
/// N diagonal values v_i
/// N-1 upper-triangle rows of cross values vv_ij (row i holds j = i+1..N)
/// (blank separator)
/// 0            <- constraint type, 0 = knapsack
/// capacity
/// N weights
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct QkpInstance {
    pub name: String,
    pub size: usize,
    /// Diagonal value coefficients, one per item
    pub values: Vec<f64>,
    /// Upper-triangle cross values, densely packed in `pair_index` order
    pub cross: Vec<f64>,
    pub weights: Vec<f64>,
    pub capacity: f64,
}

impl QkpInstance {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::new(source);

        let (_, name_tokens) = reader.tokens("instance name")?;
        let name = name_tokens[0].to_string();

        let (line, size_tokens) = reader.tokens("item count")?;
        if size_tokens.len() != 1 {
            return Err(ParseError::WrongValueCount {
                line,
                expected: 1,
                found: size_tokens.len(),
            });
        }
        let size = parse_count(line, size_tokens[0])?;

        let values = reader.row(size, "diagonal value row")?;

        let mut cross = Vec::with_capacity(pair_count(size));
        for i in 0..size.saturating_sub(1) {
            cross.extend(reader.row(size - 1 - i, "cross value row")?);
        }

        let (line, kind_tokens) = reader.tokens("constraint type")?;
        if kind_tokens.len() != 1 {
            return Err(ParseError::WrongValueCount {
                line,
                expected: 1,
                found: kind_tokens.len(),
            });
        }
        let kind = parse_count(line, kind_tokens[0])?;
        if kind != 0 {
            return Err(ParseError::Invalid {
                line,
                message: format!("unsupported constraint type {kind}, expected 0 (knapsack)"),
            });
        }

        let capacity = reader.row(1, "capacity")?[0];
        let weights = reader.row(size, "weight row")?;
        reader.finish()?;

        Ok(Self {
            name,
            size,
            values,
            cross,
            weights,
            capacity,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ParseError::Io(format!("{}: {}", path.display(), e)))?;
        Self::parse(&source)
    }

    /// Cross value of the unordered item pair (i, j), i != j.
    pub fn cross_value(&self, i: usize, j: usize) -> f64 {
        self.cross[pair_index(i, j, self.size)]
    }
}
