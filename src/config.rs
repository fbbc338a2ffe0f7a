use std::path::PathBuf;

use crate::constants::{
    DEFAULT_GNUCPP_PATH, DEFAULT_MEMORY_PROBE_PATH, DEFAULT_NODE_PATH, DEFAULT_PYTHON_PATH,
    WORK_DIR_NAME,
};
use crate::core::domain::ExecutionLimits;
use crate::core::errors::ConfigError;

/// Settings of the native sandbox.
#[derive(Clone, Debug)]
pub struct SandboxConfig {
    /// Parent directory of the per-run workspaces.
    pub work_dir: PathBuf,
    pub limits: ExecutionLimits,
    pub gnucpp_path: PathBuf,
    pub python_path: PathBuf,
    pub node_path: PathBuf,
    /// GNU `time`-compatible program used to sample peak RSS. Runs go
    /// unwrapped (memory reported as 0) when it is missing.
    pub memory_probe_path: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join(WORK_DIR_NAME),
            limits: ExecutionLimits::default(),
            gnucpp_path: DEFAULT_GNUCPP_PATH.into(),
            python_path: DEFAULT_PYTHON_PATH.into(),
            node_path: DEFAULT_NODE_PATH.into(),
            memory_probe_path: Some(DEFAULT_MEMORY_PROBE_PATH.into()),
        }
    }
}

impl SandboxConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("JUDGE_WORK_DIR") {
            config.work_dir = dir.into();
        }
        if let Some(value) = lookup("JUDGE_TIMEOUT_MS") {
            config.limits.time_ms = parse_positive("JUDGE_TIMEOUT_MS", value)?;
        }
        if let Some(value) = lookup("JUDGE_COMPILE_TIMEOUT_MS") {
            config.limits.compile_time_ms = parse_positive("JUDGE_COMPILE_TIMEOUT_MS", value)?;
        }
        if let Some(value) = lookup("JUDGE_OUTPUT_LIMIT_BYTES") {
            config.limits.output_size_bytes = parse_positive("JUDGE_OUTPUT_LIMIT_BYTES", value)?;
        }
        if let Some(path) = lookup("GNUCPP_PATH") {
            config.gnucpp_path = path.into();
        }
        if let Some(path) = lookup("PYTHON_PATH") {
            config.python_path = path.into();
        }
        if let Some(path) = lookup("NODE_PATH_BIN") {
            config.node_path = path.into();
        }
        if let Some(path) = lookup("JUDGE_MEMORY_PROBE") {
            // An empty value switches the probe off.
            config.memory_probe_path = (!path.is_empty()).then(|| path.into());
        }

        tracing::debug!("Sandbox config: {:?}", config);
        Ok(config)
    }
}

fn parse_positive(var: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::constants::DEFAULT_TIMEOUT_MS;

    fn lookup_from(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = SandboxConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.limits.time_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.gnucpp_path, PathBuf::from("g++"));
        assert!(config.memory_probe_path.is_some());
        assert!(config.work_dir.ends_with(WORK_DIR_NAME));
    }

    #[test]
    fn test_overrides_from_env() {
        let config = SandboxConfig::from_lookup(lookup_from(&[
            ("JUDGE_WORK_DIR", "/var/judge"),
            ("JUDGE_TIMEOUT_MS", "1500"),
            ("GNUCPP_PATH", "/usr/bin/g++-13"),
            ("JUDGE_MEMORY_PROBE", ""),
        ]))
        .unwrap();

        assert_eq!(config.work_dir, PathBuf::from("/var/judge"));
        assert_eq!(config.limits.time_ms, 1500);
        assert_eq!(config.gnucpp_path, PathBuf::from("/usr/bin/g++-13"));
        assert!(config.memory_probe_path.is_none());
    }

    #[test]
    fn test_invalid_timeout() {
        let result = SandboxConfig::from_lookup(lookup_from(&[("JUDGE_TIMEOUT_MS", "soon")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                var: "JUDGE_TIMEOUT_MS",
                ..
            })
        ));

        let result = SandboxConfig::from_lookup(lookup_from(&[("JUDGE_TIMEOUT_MS", "0")]));
        assert!(result.is_err());
    }
}
