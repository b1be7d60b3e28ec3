mod exhaustive;
mod model;
mod sample;
mod variable;

pub use exhaustive::ExhaustiveSampler;
pub use model::{Constraint, ModelError, QuadraticModel};
pub use sample::{Sample, SampleSet, Sampler, SamplerConfig, SamplerError};
pub use variable::{Variable, pair_count, pair_index};
