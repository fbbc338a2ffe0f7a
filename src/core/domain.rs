use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COMPILE_TIMEOUT_MS, DEFAULT_OUTPUT_LIMIT_BYTES, DEFAULT_TIMEOUT_MS};
use crate::core::errors::ConfigurationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    Python,
    GnuCpp,
    JavaScript,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::GnuCpp, Language::JavaScript];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::GnuCpp => "cpp",
            Language::JavaScript => "javascript",
        }
    }

    /// Name of the source file inside a run workspace.
    pub fn source_file_name(&self) -> &'static str {
        match self {
            Language::Python => "main.py",
            Language::GnuCpp => "main.cpp",
            Language::JavaScript => "main.js",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Ok(Language::Python),
            "cpp" | "c++" | "gnu-cpp" | "g++" => Ok(Language::GnuCpp),
            "javascript" | "js" | "node" | "nodejs" => Ok(Language::JavaScript),
            _ => Err(ConfigurationError::UnsupportedLanguage(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Wall-clock budget of the execute phase.
    pub time_ms: u64,
    /// Budget of the compile/syntax-check phase, never counted in `time_ms`.
    pub compile_time_ms: u64,
    pub output_size_bytes: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            time_ms: DEFAULT_TIMEOUT_MS,
            compile_time_ms: DEFAULT_COMPILE_TIMEOUT_MS,
            output_size_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub language: Language,
    pub source: String,
    pub stdin: String,
}

impl ExecutionRequest {
    pub fn new(language: Language, source: impl Into<String>, stdin: impl Into<String>) -> Self {
        Self {
            language,
            source: source.into(),
            stdin: stdin.into(),
        }
    }

    /// Builds a request from the language name declared by a submission.
    pub fn parse(
        language: &str,
        source: impl Into<String>,
        stdin: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::new(language.parse()?, source, stdin))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    None,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub error_kind: ErrorKind,
    pub error_detail: Option<String>,
    pub wall_time_ms: u64,
    pub peak_memory_kb: u64,
}

impl ExecutionResult {
    pub fn success(stdout: &str, wall_time_ms: u64, peak_memory_kb: u64) -> Self {
        Self {
            stdout: stdout.trim().to_string(),
            error_kind: ErrorKind::None,
            error_detail: None,
            wall_time_ms,
            peak_memory_kb,
        }
    }

    pub fn compile_error(detail: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            error_kind: ErrorKind::CompileError,
            error_detail: Some(detail.into()),
            wall_time_ms: 0,
            peak_memory_kb: 0,
        }
    }

    pub fn runtime_error(
        stdout: String,
        detail: impl Into<String>,
        wall_time_ms: u64,
        peak_memory_kb: u64,
    ) -> Self {
        Self {
            stdout,
            error_kind: ErrorKind::RuntimeError,
            error_detail: Some(detail.into()),
            wall_time_ms,
            peak_memory_kb,
        }
    }

    /// The wall time of a killed run is clamped to the limit it was killed at.
    pub fn time_limit_exceeded(timeout_ms: u64) -> Self {
        Self {
            stdout: String::new(),
            error_kind: ErrorKind::TimeLimitExceeded,
            error_detail: Some(format!("time limit of {} ms exceeded", timeout_ms)),
            wall_time_ms: timeout_ms,
            peak_memory_kb: 0,
        }
    }

    pub fn unsupported_language(name: &str) -> Self {
        Self::compile_error(format!("unsupported language: {}", name))
    }

    pub fn is_success(&self) -> bool {
        self.error_kind == ErrorKind::None
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(alias = "in")]
    pub input: String,
    #[serde(
        rename = "expectedOutput",
        alias = "expected_output",
        alias = "output",
        alias = "out"
    )]
    pub expected_output: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    #[serde(rename = "groupId", alias = "group_id")]
    pub group_id: u32,
    #[serde(alias = "pts")]
    pub points: u32,
    pub cases: Vec<TestCase>,
}

/// The full, normalized test data of a problem: subtasks in evaluation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestSpec {
    pub subtasks: Vec<Subtask>,
}

impl TestSpec {
    pub fn total_points(&self) -> u32 {
        self.subtasks.iter().map(|s| s.points).sum()
    }

    pub fn case_count(&self) -> usize {
        self.subtasks.iter().map(|s| s.cases.len()).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    AC,
    WA,
    TLE,
    RE,
    CE,
}

impl Verdict {
    pub fn from_error_kind(kind: ErrorKind) -> Option<Verdict> {
        match kind {
            ErrorKind::None => None,
            ErrorKind::CompileError => Some(Verdict::CE),
            ErrorKind::RuntimeError => Some(Verdict::RE),
            ErrorKind::TimeLimitExceeded => Some(Verdict::TLE),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskOutcome {
    pub group_id: u32,
    pub points: u32,
    pub passed: bool,
    /// Verdict of the case that failed the group, `None` when it passed
    /// or was never attempted.
    pub failure: Option<Verdict>,
    pub cases_run: usize,
}

impl SubtaskOutcome {
    pub fn awarded(&self) -> u32 {
        if self.passed { self.points } else { 0 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub verdict: Verdict,
    pub score: u32,
    pub max_wall_time_ms: u64,
    pub max_memory_kb: u64,
    pub groups: Vec<SubtaskOutcome>,
}
