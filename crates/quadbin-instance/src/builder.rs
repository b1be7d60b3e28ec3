use quadbin_model::{ModelError, QuadraticModel, Variable};
use thiserror::Error;

use crate::qap::QapInstance;
use crate::qkp::QkpInstance;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{matrix} matrix is not {expected}x{expected}")]
    BadShape {
        matrix: &'static str,
        expected: usize,
    },
    #[error("{vector} has {found} entries, expected {expected}")]
    BadLength {
        vector: &'static str,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Last-resort stand-in for an unknown optimal value, taken from the original
/// formulation. Only used when the instance data gives a zero bound.
const UNKNOWN_OPTIMAL_SENTINEL: f64 = 10_000_000.0;

/// Penalty strength for folding the QAP assignment constraints.
///
/// 4x the known optimal value when the instance carries one; otherwise 4x an
/// upper bound on the objective derived from the instance data. The bound is
/// coarse (sum of flow magnitudes times the largest distance) but always
/// dominates the reachable objective range, which the old sentinel constant
/// did not guarantee.
pub fn qap_penalty_strength(instance: &QapInstance) -> f64 {
    let estimate = instance.optimal.unwrap_or_else(|| {
        let flow_total: f64 = instance
            .flow
            .iter()
            .flatten()
            .map(|f| f.abs())
            .sum();
        let distance_max = instance
            .distance
            .iter()
            .flatten()
            .map(|d| d.abs())
            .fold(0.0, f64::max);
        let bound = flow_total * distance_max;
        if bound > 0.0 {
            bound
        } else {
            UNKNOWN_OPTIMAL_SENTINEL
        }
    });
    4.0 * estimate
}

/// Penalty strength for folding the QKP weight constraint: 4x the total
/// attainable value, an upper bound on the objective magnitude.
pub fn qkp_penalty_strength(instance: &QkpInstance) -> f64 {
    let bound: f64 = instance
        .values
        .iter()
        .chain(&instance.cross)
        .map(|v| v.abs())
        .sum();
    4.0 * if bound > 0.0 {
        bound
    } else {
        UNKNOWN_OPTIMAL_SENTINEL
    }
}

/// Build the quadratic binary model of a QAP instance.
///
/// Variables are `x[i][p]`, "facility i assigned to location p". For every
/// ordered quadruple (i, j, p, q) except i==j, p==q (no self-interaction) a
/// quadratic term with coefficient `flow[i][j] * distance[p][q]` is
/// accumulated between x[i][p] and x[j][q]; symmetric flow and distance data
/// therefore contribute both orientations of each unordered pair. On top of
/// the objective, S row constraints (each facility in exactly one location)
/// and S column constraints (each location holding exactly one facility) are
/// folded in as squared penalties.
///
/// The quadruple loop is O(S^4) term insertions and dominates build time.
pub fn build_qap(instance: &QapInstance) -> Result<QuadraticModel, BuildError> {
    let size = instance.size;
    check_square("flow", &instance.flow, size)?;
    check_square("distance", &instance.distance, size)?;

    let lagrange = qap_penalty_strength(instance);
    let mut model = QuadraticModel::new();

    for i in 0..size {
        for j in 0..size {
            for p in 0..size {
                for q in 0..size {
                    if i == j && p == q {
                        continue;
                    }
                    model.add_quadratic(
                        Variable::assign(i, p),
                        Variable::assign(j, q),
                        instance.flow[i][j] * instance.distance[p][q],
                    )?;
                }
            }
        }
    }

    for facility in 0..size {
        let terms = (0..size)
            .map(|location| (Variable::assign(facility, location), 1.0))
            .collect();
        model.add_linear_equality_constraint(
            format!("facility_{}", facility + 1),
            terms,
            -1.0,
            lagrange,
        )?;
    }
    for location in 0..size {
        let terms = (0..size)
            .map(|facility| (Variable::assign(facility, location), 1.0))
            .collect();
        model.add_linear_equality_constraint(
            format!("location_{}", location + 1),
            terms,
            -1.0,
            lagrange,
        )?;
    }

    Ok(model)
}

/// Build the quadratic binary model of a QKP instance.
///
/// Maximizing the value function is expressed as minimizing its negation:
/// linear terms `-v[i]`, quadratic terms `-vv[i][j]` for every unordered item
/// pair. The weight constraint `sum(w[i] * x[i]) <= capacity` is folded in
/// through slack variables.
pub fn build_qkp(instance: &QkpInstance) -> Result<QuadraticModel, BuildError> {
    let size = instance.size;
    check_length("values", &instance.values, size)?;
    check_length("weights", &instance.weights, size)?;
    let pairs = quadbin_model::pair_count(size);
    check_length("cross values", &instance.cross, pairs)?;

    let mut model = QuadraticModel::new();

    for (i, value) in instance.values.iter().enumerate() {
        model.add_linear(Variable::item(i), -value);
    }
    for i in 0..size {
        for j in (i + 1)..size {
            model.add_quadratic(
                Variable::item(i),
                Variable::item(j),
                -instance.cross_value(i, j),
            )?;
        }
    }

    let terms = instance
        .weights
        .iter()
        .enumerate()
        .map(|(i, &w)| (Variable::item(i), w))
        .collect();
    model.add_linear_inequality_constraint(
        "max_weight",
        terms,
        instance.capacity,
        qkp_penalty_strength(instance),
    )?;

    Ok(model)
}

fn check_square(
    matrix: &'static str,
    rows: &[Vec<f64>],
    expected: usize,
) -> Result<(), BuildError> {
    if rows.len() != expected || rows.iter().any(|row| row.len() != expected) {
        return Err(BuildError::BadShape { matrix, expected });
    }
    Ok(())
}

fn check_length(
    vector: &'static str,
    values: &[f64],
    expected: usize,
) -> Result<(), BuildError> {
    if values.len() != expected {
        return Err(BuildError::BadLength {
            vector,
            expected,
            found: values.len(),
        });
    }
    Ok(())
}
