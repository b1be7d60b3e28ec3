use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::model::QuadraticModel;
use crate::sample::{Sample, SampleSet, Sampler, SamplerConfig, SamplerError};
use crate::variable::Variable;

/// Brute-force sampler enumerating every assignment of a small model.
///
/// This is not an optimization algorithm; it exists so callers have a
/// collaborator satisfying the [`Sampler`] contract for toy instances and
/// tests. The variable count is capped because the enumeration is 2^n.
pub struct ExhaustiveSampler {
    max_variables: usize,
}

impl Default for ExhaustiveSampler {
    fn default() -> Self {
        Self { max_variables: 20 }
    }
}

impl ExhaustiveSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cap is clamped to 63 because the enumeration mask is a u64.
    pub fn with_max_variables(mut self, max: usize) -> Self {
        self.max_variables = max.min(63);
        self
    }
}

impl Sampler for ExhaustiveSampler {
    fn sample(
        &self,
        model: &QuadraticModel,
        config: &SamplerConfig,
    ) -> Result<SampleSet, SamplerError> {
        let variables: Vec<Variable> = model.variables().collect();
        if variables.is_empty() {
            return Err(SamplerError::EmptyModel);
        }
        if variables.len() > self.max_variables {
            return Err(SamplerError::TooManyVariables {
                sampler: "ExhaustiveSampler",
                count: variables.len(),
                limit: self.max_variables,
            });
        }

        if config.num_reads == 0 {
            return Ok(SampleSet::default());
        }

        let deadline = Instant::now() + Duration::from_millis(config.timeout_ms);
        // Best num_reads assignments seen so far, kept sorted by energy
        let mut best: Vec<Sample> = Vec::with_capacity(config.num_reads);

        for mask in 0u64..(1u64 << variables.len()) {
            if mask % 4096 == 0 && Instant::now() > deadline {
                break;
            }

            let assignment: BTreeMap<Variable, bool> = variables
                .iter()
                .enumerate()
                .map(|(bit, &v)| (v, mask >> bit & 1 == 1))
                .collect();
            let energy = model.energy(&assignment);

            if best.len() == config.num_reads {
                match best.last() {
                    Some(worst) if worst.energy <= energy => continue,
                    _ => {
                        best.pop();
                    }
                }
            }
            let position = best.partition_point(|s| s.energy <= energy);
            best.insert(
                position,
                Sample {
                    assignment,
                    energy,
                    num_occurrences: 1,
                },
            );
        }

        Ok(SampleSet::from_unsorted(best))
    }
}
