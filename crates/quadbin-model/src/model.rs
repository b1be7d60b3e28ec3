use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::variable::Variable;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Quadratic term between {0} and itself")]
    SelfPair(Variable),
    #[error("Inequality bound must be non-negative, got {0}")]
    NegativeBound(f64),
    #[error("Inequality bound {0} is too large to expand into slack variables")]
    BoundTooLarge(f64),
}

/// Largest inequality bound the slack expansion accepts (2^53, the limit of
/// exact integer representation in f64). Keeps the slack coefficient
/// doubling far away from u64 overflow.
const MAX_INEQUALITY_BOUND: f64 = 9_007_199_254_740_992.0;

/// A constraint recorded on the model.
///
/// Both kinds are already folded into the objective as penalty terms when
/// added; the record is kept for feasibility checks and diagnostics.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// sum of weighted variables + constant == 0, enforced with a squared
    /// penalty of strength `lagrange`
    Equality {
        label: String,
        terms: Vec<(Variable, f64)>,
        constant: f64,
        lagrange: f64,
    },
    /// sum of weighted variables <= bound, enforced through binary-expanded
    /// slack variables
    Inequality {
        label: String,
        terms: Vec<(Variable, f64)>,
        bound: f64,
    },
}

impl Constraint {
    pub fn label(&self) -> &str {
        match self {
            Constraint::Equality { label, .. } => label,
            Constraint::Inequality { label, .. } => label,
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, Constraint::Equality { .. })
    }
}

/// An unconstrained quadratic objective over binary variables.
///
/// Linear terms map a variable to a coefficient, quadratic terms map an
/// unordered variable pair to a coefficient. Inserting a coefficient for a
/// pair that already exists accumulates rather than overwrites. No pair may
/// reference the same variable twice.
#[derive(Debug, Clone, Default)]
pub struct QuadraticModel {
    linear: BTreeMap<Variable, f64>,
    quadratic: BTreeMap<(Variable, Variable), f64>,
    offset: f64,
    constraints: Vec<Constraint>,
    variables: BTreeSet<Variable>,
}

impl QuadraticModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `coefficient` to the linear term of `variable`.
    pub fn add_linear(&mut self, variable: Variable, coefficient: f64) {
        self.variables.insert(variable);
        *self.linear.entry(variable).or_insert(0.0) += coefficient;
    }

    /// Add `coefficient` to the quadratic term between `u` and `v`.
    ///
    /// The pair is unordered: (u, v) and (v, u) address the same term.
    pub fn add_quadratic(
        &mut self,
        u: Variable,
        v: Variable,
        coefficient: f64,
    ) -> Result<(), ModelError> {
        if u == v {
            return Err(ModelError::SelfPair(u));
        }
        self.variables.insert(u);
        self.variables.insert(v);
        let key = if u < v { (u, v) } else { (v, u) };
        *self.quadratic.entry(key).or_insert(0.0) += coefficient;
        Ok(())
    }

    pub fn add_offset(&mut self, offset: f64) {
        self.offset += offset;
    }

    /// Fold `lagrange * (sum(a_t * v_t) + constant)^2` into the model and
    /// record the equality constraint.
    ///
    /// Expansion over binary variables (v^2 == v):
    ///   linear   += lagrange * (a_t^2 + 2 * constant * a_t)   per term
    ///   quadratic += 2 * lagrange * a_s * a_t                 per pair s < t
    ///   offset   += lagrange * constant^2
    ///
    /// Terms must reference distinct variables.
    pub fn add_linear_equality_constraint(
        &mut self,
        label: impl Into<String>,
        terms: Vec<(Variable, f64)>,
        constant: f64,
        lagrange: f64,
    ) -> Result<(), ModelError> {
        self.fold_squared_penalty(&terms, constant, lagrange)?;
        self.constraints.push(Constraint::Equality {
            label: label.into(),
            terms,
            constant,
            lagrange,
        });
        Ok(())
    }

    /// Fold `sum(a_t * v_t) <= bound` into the model and record the
    /// inequality constraint.
    ///
    /// Slack variables with coefficients 1, 2, 4, ... plus a remainder are
    /// added so their subset sums cover [0, bound]; the constraint then
    /// becomes the equality `sum + slack - bound == 0` and is folded with the
    /// given penalty strength. The bound is truncated to an integer; bounds
    /// beyond [`MAX_INEQUALITY_BOUND`] (or NaN) are rejected.
    pub fn add_linear_inequality_constraint(
        &mut self,
        label: impl Into<String>,
        terms: Vec<(Variable, f64)>,
        bound: f64,
        lagrange: f64,
    ) -> Result<(), ModelError> {
        if bound < 0.0 {
            return Err(ModelError::NegativeBound(bound));
        }
        if !(bound <= MAX_INEQUALITY_BOUND) {
            return Err(ModelError::BoundTooLarge(bound));
        }
        let constraint_index = self.constraints.len();

        let mut folded = terms.clone();
        let target = bound.floor() as u64;
        let mut covered = 0u64;
        let mut coefficient = 1u64;
        let mut bit = 0usize;
        while covered + coefficient <= target {
            folded.push((
                Variable::Slack { constraint: constraint_index, bit },
                coefficient as f64,
            ));
            covered += coefficient;
            coefficient *= 2;
            bit += 1;
        }
        if covered < target {
            folded.push((
                Variable::Slack { constraint: constraint_index, bit },
                (target - covered) as f64,
            ));
        }

        self.fold_squared_penalty(&folded, -(target as f64), lagrange)?;
        self.constraints.push(Constraint::Inequality {
            label: label.into(),
            terms,
            bound: target as f64,
        });
        Ok(())
    }

    fn fold_squared_penalty(
        &mut self,
        terms: &[(Variable, f64)],
        constant: f64,
        lagrange: f64,
    ) -> Result<(), ModelError> {
        for (t, &(v, a)) in terms.iter().enumerate() {
            self.add_linear(v, lagrange * (a * a + 2.0 * constant * a));
            for &(u, b) in &terms[t + 1..] {
                self.add_quadratic(v, u, 2.0 * lagrange * a * b)?;
            }
        }
        self.offset += lagrange * constant * constant;
        Ok(())
    }

    /// Objective value of a full assignment, penalty terms included.
    ///
    /// Variables absent from the assignment are treated as 0.
    pub fn energy(&self, assignment: &BTreeMap<Variable, bool>) -> f64 {
        let set = |v: &Variable| assignment.get(v).copied().unwrap_or(false);
        let mut energy = self.offset;
        for (v, c) in &self.linear {
            if set(v) {
                energy += c;
            }
        }
        for ((u, v), c) in &self.quadratic {
            if set(u) && set(v) {
                energy += c;
            }
        }
        energy
    }

    /// Whether an assignment satisfies every recorded constraint.
    pub fn is_feasible(&self, assignment: &BTreeMap<Variable, bool>) -> bool {
        const TOLERANCE: f64 = 1e-9;
        self.constraints.iter().all(|constraint| {
            let sum = |terms: &[(Variable, f64)]| -> f64 {
                terms
                    .iter()
                    .filter(|(v, _)| assignment.get(v).copied().unwrap_or(false))
                    .map(|(_, a)| a)
                    .sum()
            };
            match constraint {
                Constraint::Equality { terms, constant, .. } => {
                    (sum(terms) + constant).abs() <= TOLERANCE
                }
                Constraint::Inequality { terms, bound, .. } => {
                    sum(terms) <= bound + TOLERANCE
                }
            }
        })
    }

    pub fn linear(&self) -> &BTreeMap<Variable, f64> {
        &self.linear
    }

    /// Quadratic coefficient of an unordered pair, 0 when absent.
    pub fn quadratic(&self, u: Variable, v: Variable) -> f64 {
        let key = if u < v { (u, v) } else { (v, u) };
        self.quadratic.get(&key).copied().unwrap_or(0.0)
    }

    pub fn quadratic_terms(&self) -> &BTreeMap<(Variable, Variable), f64> {
        &self.quadratic
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// All variables the model references, in sorted order.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.variables.iter().copied()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_accumulates_on_collision() {
        let mut model = QuadraticModel::new();
        let u = Variable::item(0);
        let v = Variable::item(1);
        model.add_quadratic(u, v, 1.5).unwrap();
        model.add_quadratic(v, u, 2.5).unwrap();
        assert_eq!(model.quadratic(u, v), 4.0);
        assert_eq!(model.num_interactions(), 1);
    }

    #[test]
    fn test_self_pair_is_rejected() {
        let mut model = QuadraticModel::new();
        let v = Variable::item(0);
        assert_eq!(
            model.add_quadratic(v, v, 1.0),
            Err(ModelError::SelfPair(v))
        );
    }

    #[test]
    fn test_linear_accumulates() {
        let mut model = QuadraticModel::new();
        let v = Variable::item(0);
        model.add_linear(v, 1.0);
        model.add_linear(v, -3.0);
        assert_eq!(model.linear()[&v], -2.0);
    }

    #[test]
    fn test_equality_penalty_expansion() {
        // lagrange * (x1 + x2 + x3 - 1)^2 with lagrange = 7:
        // each variable gets -7 linear, each pair +14 quadratic, offset +7
        let lagrange = 7.0;
        let vars: Vec<Variable> = (0..3).map(Variable::item).collect();
        let terms: Vec<(Variable, f64)> = vars.iter().map(|&v| (v, 1.0)).collect();

        let mut model = QuadraticModel::new();
        model
            .add_linear_equality_constraint("row", terms, -1.0, lagrange)
            .unwrap();

        for &v in &vars {
            assert_eq!(model.linear()[&v], -lagrange);
        }
        for (t, &v) in vars.iter().enumerate() {
            for &u in &vars[t + 1..] {
                assert_eq!(model.quadratic(v, u), 2.0 * lagrange);
            }
        }
        assert_eq!(model.offset(), lagrange);
        assert_eq!(model.constraints().len(), 1);
    }

    #[test]
    fn test_equality_penalty_is_zero_when_satisfied() {
        let vars: Vec<Variable> = (0..3).map(Variable::item).collect();
        let terms: Vec<(Variable, f64)> = vars.iter().map(|&v| (v, 1.0)).collect();

        let mut model = QuadraticModel::new();
        model
            .add_linear_equality_constraint("row", terms, -1.0, 100.0)
            .unwrap();

        // exactly one variable set: penalty contributes nothing
        let mut assignment = BTreeMap::new();
        assignment.insert(vars[0], true);
        assignment.insert(vars[1], false);
        assignment.insert(vars[2], false);
        assert_eq!(model.energy(&assignment), 0.0);
        assert!(model.is_feasible(&assignment));

        // two variables set: penalty of one full lagrange unit
        assignment.insert(vars[1], true);
        assert_eq!(model.energy(&assignment), 100.0);
        assert!(!model.is_feasible(&assignment));
    }

    #[test]
    fn test_inequality_slack_coefficients_cover_bound() {
        // bound 5 expands to slack coefficients 1, 2, 2
        let mut model = QuadraticModel::new();
        model
            .add_linear_inequality_constraint(
                "weight",
                vec![(Variable::item(0), 3.0)],
                5.0,
                10.0,
            )
            .unwrap();

        let slacks: Vec<Variable> = model
            .variables()
            .filter(|v| matches!(v, Variable::Slack { .. }))
            .collect();
        assert_eq!(slacks.len(), 3);

        // with the item unset, all slack bits together must reach the bound
        // exactly, so the penalty vanishes
        let mut assignment = BTreeMap::new();
        assignment.insert(Variable::item(0), false);
        for &s in &slacks {
            assignment.insert(s, true);
        }
        assert_eq!(model.energy(&assignment), 0.0);

        // an empty assignment leaves the full squared shortfall
        assert_eq!(model.energy(&BTreeMap::new()), 10.0 * 25.0);
    }

    #[test]
    fn test_inequality_penalty_is_zero_at_exact_fill() {
        // 2*x <= 3 with x = 1 and slack picking up the remaining 1
        let mut model = QuadraticModel::new();
        let x = Variable::item(0);
        model
            .add_linear_inequality_constraint("weight", vec![(x, 2.0)], 3.0, 4.0)
            .unwrap();

        // slack coefficients for bound 3: 1, 2
        let mut assignment = BTreeMap::new();
        assignment.insert(x, true);
        assignment.insert(Variable::Slack { constraint: 0, bit: 0 }, true);
        assignment.insert(Variable::Slack { constraint: 0, bit: 1 }, false);
        assert_eq!(model.energy(&assignment), 0.0);
        assert!(model.is_feasible(&assignment));
    }

    #[test]
    fn test_huge_bound_is_rejected() {
        // a bound past exact f64 integer range must not reach the slack
        // doubling loop
        let mut model = QuadraticModel::new();
        let result = model.add_linear_inequality_constraint(
            "weight",
            vec![(Variable::item(0), 1.0)],
            1e300,
            1.0,
        );
        assert_eq!(result, Err(ModelError::BoundTooLarge(1e300)));
        assert!(model.constraints().is_empty());
        assert_eq!(model.num_variables(), 0);
    }

    #[test]
    fn test_nan_bound_is_rejected() {
        let mut model = QuadraticModel::new();
        let result = model.add_linear_inequality_constraint(
            "weight",
            vec![(Variable::item(0), 1.0)],
            f64::NAN,
            1.0,
        );
        assert!(matches!(result, Err(ModelError::BoundTooLarge(_))));
    }

    #[test]
    fn test_negative_bound_is_rejected() {
        let mut model = QuadraticModel::new();
        let result = model.add_linear_inequality_constraint(
            "weight",
            vec![(Variable::item(0), 1.0)],
            -1.0,
            1.0,
        );
        assert_eq!(result, Err(ModelError::NegativeBound(-1.0)));
    }
}
