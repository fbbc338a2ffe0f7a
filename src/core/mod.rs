pub mod domain;
pub mod errors;
pub mod pipeline;
pub mod submission;
pub mod test_spec;
pub mod traits;
