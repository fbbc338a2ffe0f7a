pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_COMPILE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_OUTPUT_LIMIT_BYTES: u64 = 64 * 1024 * 1024;
/// Minimum time the output readers get once the process has exited.
pub const OUTPUT_GRACE_MS: u64 = 100;
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

pub const DEFAULT_GNUCPP_PATH: &str = "g++";
pub const DEFAULT_PYTHON_PATH: &str = "python3";
pub const DEFAULT_NODE_PATH: &str = "node";
pub const DEFAULT_MEMORY_PROBE_PATH: &str = "/usr/bin/time";

pub const WORK_DIR_NAME: &str = "judge-engine";
pub const RUN_DIR_PREFIX: &str = "run_";

pub const STDIN_FILE_NAME: &str = "input.txt";
pub const EXECUTABLE_FILE_NAME: &str = "main.out";
pub const MEMORY_PROBE_FILE_NAME: &str = "memory.txt";

/// Points of the synthetic subtask wrapping a legacy flat case list.
pub const LEGACY_SUBTASK_POINTS: u32 = 100;
pub const FULL_SCORE: u32 = 100;
