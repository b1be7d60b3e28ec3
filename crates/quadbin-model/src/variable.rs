/// A binary decision variable in a quadratic model.
///
/// Assignment problems index variables by a (facility, location) pair,
/// knapsack problems by a single item index. Slack variables are created
/// internally when an inequality constraint is folded into the model.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    /// "facility assigned to location", written `x_{facility+1}_{location+1}`
    Assign { facility: usize, location: usize },
    /// "item selected", written `x_{item+1}`
    Item(usize),
    /// Slack bit introduced by inequality folding
    Slack { constraint: usize, bit: usize },
}

impl Variable {
    pub fn assign(facility: usize, location: usize) -> Self {
        Self::Assign { facility, location }
    }

    pub fn item(index: usize) -> Self {
        Self::Item(index)
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 1-based names, matching the instance file conventions
        match self {
            Variable::Assign { facility, location } => {
                write!(f, "x_{}_{}", facility + 1, location + 1)
            }
            Variable::Item(index) => write!(f, "x_{}", index + 1),
            Variable::Slack { constraint, bit } => {
                write!(f, "slack_{}_{}", constraint + 1, bit + 1)
            }
        }
    }
}

/// Maps an unordered pair (i, j) with i != j onto a dense index in
/// `[0, pair_count(n))`, enumerating the upper triangle row by row:
/// (0,1), (0,2), ..., (0,n-1), (1,2), ...
///
/// Symmetric in its arguments: `pair_index(i, j, n) == pair_index(j, i, n)`.
/// Calling with i == j is a precondition violation.
pub fn pair_index(i: usize, j: usize, n: usize) -> usize {
    debug_assert!(i != j, "pair_index is undefined for i == j");
    debug_assert!(i < n && j < n);
    let (a, b) = if i < j { (i, j) } else { (j, i) };
    a * n - a * (a + 1) / 2 + (b - a - 1)
}

/// Total number of unordered pairs over n items: n*(n-1)/2.
pub fn pair_count(n: usize) -> usize {
    n * (n - 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pair_index_symmetry() {
        for n in 2..10 {
            for i in 0..n {
                for j in 0..n {
                    if i != j {
                        assert_eq!(pair_index(i, j, n), pair_index(j, i, n));
                    }
                }
            }
        }
    }

    #[test]
    fn test_pair_index_is_dense_bijection() {
        for n in 2..10 {
            let mut seen = HashSet::new();
            for i in 0..n {
                for j in (i + 1)..n {
                    let k = pair_index(i, j, n);
                    assert!(k < pair_count(n), "index {} out of range for n={}", k, n);
                    assert!(seen.insert(k), "collision at ({}, {}) for n={}", i, j, n);
                }
            }
            assert_eq!(seen.len(), pair_count(n));
        }
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_count(2), 1);
        assert_eq!(pair_count(5), 10);
        assert_eq!(pair_count(10), 45);
    }

    #[test]
    fn test_variable_names() {
        assert_eq!(Variable::assign(0, 1).to_string(), "x_1_2");
        assert_eq!(Variable::item(3).to_string(), "x_4");
        assert_eq!(
            Variable::Slack { constraint: 0, bit: 2 }.to_string(),
            "slack_1_3"
        );
    }

    #[test]
    fn test_variable_ordering_groups_assignments_row_major() {
        let mut vars = vec![
            Variable::assign(1, 0),
            Variable::item(0),
            Variable::assign(0, 1),
            Variable::assign(0, 0),
        ];
        vars.sort();
        assert_eq!(
            vars,
            vec![
                Variable::assign(0, 0),
                Variable::assign(0, 1),
                Variable::assign(1, 0),
                Variable::item(0),
            ]
        );
    }
}
