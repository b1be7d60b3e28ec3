pub mod builder;
pub mod qap;
pub mod qkp;
pub mod reader;

pub use builder::{BuildError, build_qap, build_qkp, qap_penalty_strength, qkp_penalty_strength};
pub use qap::QapInstance;
pub use qkp::QkpInstance;
pub use reader::ParseError;
