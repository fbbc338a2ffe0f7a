use std::path::PathBuf;

use thiserror::Error;

/// A test specification or request that cannot be judged at all.
/// Surfaced to the caller instead of a verdict.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("test specification is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("test specification must be a list")]
    NotAList,
    #[error("test specification is empty")]
    Empty,
    #[error("subtask points sum to {total}, more than 100")]
    PointsOverflow { total: u32 },
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Failures of the sandbox machinery itself, as opposed to failures of the
/// judged program. Never escapes `Sandbox::run`.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to create workspace {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to access artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("cannot {action} a submission in state {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
