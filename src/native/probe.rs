use std::path::{Path, PathBuf};

use tokio::fs;

use crate::native::toolchain::CommandLine;

/// Peak resident memory sampling through a GNU `time` style wrapper.
///
/// Best effort: a missing wrapper or an unreadable report yields 0.
#[derive(Clone, Debug)]
pub struct MemoryProbe {
    program: Option<PathBuf>,
}

impl MemoryProbe {
    pub fn detect(program: Option<&Path>) -> Self {
        let program = program.filter(|p| p.is_file()).map(Path::to_path_buf);
        if program.is_none() {
            tracing::info!("Memory probe unavailable, peak memory will be reported as 0");
        }
        Self { program }
    }

    pub fn disabled() -> Self {
        Self { program: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.program.is_some()
    }

    /// Wraps `command` so that its peak RSS in KiB lands in `report`.
    pub fn wrap(&self, command: CommandLine, report: &Path) -> CommandLine {
        let Some(program) = &self.program else {
            return command;
        };

        let mut wrapped = CommandLine::new(program)
            .arg("-f")
            .arg("%M")
            .arg("-o")
            .arg(report)
            .arg(command.program);
        wrapped.args.extend(command.args);
        wrapped
    }

    pub async fn read_peak_kb(&self, report: &Path) -> u64 {
        if !self.is_enabled() {
            return 0;
        }
        match fs::read_to_string(report).await {
            Ok(contents) => parse_peak_kb(&contents).unwrap_or(0),
            Err(e) => {
                tracing::debug!("No memory report at {}: {}", report.display(), e);
                0
            }
        }
    }
}

/// The report may start with status lines such as
/// `Command exited with non-zero status 1`; the figure is the last number.
pub fn parse_peak_kb(report: &str) -> Option<u64> {
    report
        .lines()
        .rev()
        .find_map(|line| line.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn test_parse_report() {
        assert_eq!(parse_peak_kb("3456\n"), Some(3456));
        assert_eq!(
            parse_peak_kb("Command exited with non-zero status 1\n9120\n"),
            Some(9120)
        );
        assert_eq!(parse_peak_kb("Command terminated by signal 9\n"), None);
        assert_eq!(parse_peak_kb(""), None);
    }

    #[test]
    fn test_wrap_prepends_probe() {
        let probe = MemoryProbe {
            program: Some("/usr/bin/time".into()),
        };
        let command = CommandLine::new("python3").arg("/w/main.py");

        let wrapped = probe.wrap(command, Path::new("/w/memory.txt"));

        assert_eq!(wrapped.program, PathBuf::from("/usr/bin/time"));
        let args: Vec<OsString> = ["-f", "%M", "-o", "/w/memory.txt", "python3", "/w/main.py"]
            .into_iter()
            .map(OsString::from)
            .collect();
        assert_eq!(wrapped.args, args);
    }

    #[test]
    fn test_missing_probe_is_disabled() {
        let probe = MemoryProbe::detect(Some(Path::new("/definitely/not/time")));
        assert!(!probe.is_enabled());

        let command = CommandLine::new("node").arg("main.js");
        assert_eq!(probe.wrap(command.clone(), Path::new("x")), command);
    }

    #[tokio::test]
    async fn test_disabled_probe_reports_zero() {
        let probe = MemoryProbe::disabled();
        assert_eq!(probe.read_peak_kb(Path::new("/nonexistent")).await, 0);
    }
}
