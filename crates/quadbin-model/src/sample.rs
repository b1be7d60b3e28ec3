use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::QuadraticModel;
use crate::variable::Variable;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("Model has {count} variables; {sampler} handles at most {limit}")]
    TooManyVariables {
        sampler: &'static str,
        count: usize,
        limit: usize,
    },
    #[error("Model has no variables to sample")]
    EmptyModel,
}

/// Sampler configuration shared by every sampler implementation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// How many ranked samples to return
    pub num_reads: usize,
    /// Sweep budget for annealing-style samplers; enumerating samplers
    /// ignore it
    pub num_sweeps: usize,
    /// Wall-clock budget; samplers return the best found so far when it runs
    /// out
    pub timeout_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_reads: 100,
            num_sweeps: 1000,
            timeout_ms: 60_000,
        }
    }
}

impl SamplerConfig {
    pub fn with_num_reads(mut self, num_reads: usize) -> Self {
        self.num_reads = num_reads;
        self
    }

    pub fn with_num_sweeps(mut self, num_sweeps: usize) -> Self {
        self.num_sweeps = num_sweeps;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// One sampled assignment with its energy.
#[derive(Debug, Clone)]
pub struct Sample {
    pub assignment: BTreeMap<Variable, bool>,
    pub energy: f64,
    pub num_occurrences: usize,
}

/// Samples ranked by ascending energy.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// Build a sample set, sorting by ascending energy.
    pub fn from_unsorted(mut samples: Vec<Sample>) -> Self {
        samples.sort_by(|a, b| {
            a.energy
                .partial_cmp(&b.energy)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { samples }
    }

    /// The lowest-energy sample.
    pub fn best(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The solving collaborator contract: takes a finalized model, returns
/// candidate low-energy assignments ranked by ascending energy.
pub trait Sampler {
    fn sample(
        &self,
        model: &QuadraticModel,
        config: &SamplerConfig,
    ) -> Result<SampleSet, SamplerError>;
}
