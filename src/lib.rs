pub mod config;
pub mod constants;
pub mod core;
pub mod native;
pub mod stubs;


pub use crate::config::SandboxConfig;
pub use crate::core::domain::{
    ErrorKind, ExecutionRequest, ExecutionResult, Language, SubmissionResult, Subtask,
    SubtaskOutcome, TestCase, TestSpec, Verdict,
};
pub use crate::core::errors::{ConfigurationError, SubmissionError};
pub use crate::core::pipeline::{evaluating::Evaluator, running::run_custom};
pub use crate::core::submission::{Submission, SubmissionState};
pub use crate::core::test_spec::parse_test_spec;
pub use crate::core::traits::sandbox::Sandbox;
pub use crate::native::sandbox::NativeSandbox;
