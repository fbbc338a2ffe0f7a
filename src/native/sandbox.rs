use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, timeout, timeout_at};

use crate::{
    config::SandboxConfig,
    constants::{MEMORY_PROBE_FILE_NAME, OUTPUT_GRACE_MS, READ_CHUNK_SIZE, STDIN_FILE_NAME},
    core::{
        domain::{ExecutionRequest, ExecutionResult, Language},
        errors::SandboxError,
        traits::sandbox::Sandbox,
    },
    native::{
        probe::MemoryProbe,
        toolchain::{CommandLine, Toolchain},
        workspace::Workspace,
    },
};

/// Sandbox running each request as a child process group of the judge.
///
/// A run goes through two separately timed phases: compile (or syntax
/// check) and execute. Only the execute phase counts toward the time
/// limit and the reported wall time.
#[derive(Clone, Debug)]
pub struct NativeSandbox {
    config: SandboxConfig,
    toolchain: Toolchain,
    probe: MemoryProbe,
}

struct ProcessOutput {
    /// `None` when the process was killed at the time limit.
    status: Option<ExitStatus>,
    stdout: String,
    stderr: String,
    elapsed: Duration,
}

enum CompileOutcome {
    Compiled,
    Failed(String),
}

impl NativeSandbox {
    pub fn new(config: SandboxConfig) -> Self {
        let toolchain = Toolchain::from_config(&config);
        let probe = MemoryProbe::detect(config.memory_probe_path.as_deref());
        Self {
            config,
            toolchain,
            probe,
        }
    }

    async fn run_in(
        &self,
        workspace: &Workspace,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, SandboxError> {
        workspace
            .write(request.language.source_file_name(), &request.source)
            .await?;
        let stdin_path = workspace.write(STDIN_FILE_NAME, &request.stdin).await?;

        if let CompileOutcome::Failed(detail) = self.compile(workspace, request.language).await {
            return Ok(ExecutionResult::compile_error(detail));
        }

        self.execute(workspace, request.language, &stdin_path).await
    }

    async fn compile(&self, workspace: &Workspace, language: Language) -> CompileOutcome {
        let command = self.toolchain.compile_command(language, workspace.path());
        let limit = self.config.limits.compile_time_ms;

        tracing::debug!("Start compiling with {}", command.program_name());
        let output = match self
            .spawn_and_wait(&command, workspace.path(), Stdio::null(), limit)
            .await
        {
            Ok(output) => output,
            Err(e) => return CompileOutcome::Failed(e.to_string()),
        };
        tracing::debug!(elapsed_ms = output.elapsed.as_millis() as u64, "Compile phase done");

        match output.status {
            None => CompileOutcome::Failed(format!("compilation exceeded {} ms", limit)),
            Some(status) if status.success() => CompileOutcome::Compiled,
            Some(status) => {
                let detail = [output.stderr, output.stdout]
                    .into_iter()
                    .find(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| describe_status(status));
                CompileOutcome::Failed(detail)
            }
        }
    }

    async fn execute(
        &self,
        workspace: &Workspace,
        language: Language,
        stdin_path: &Path,
    ) -> Result<ExecutionResult, SandboxError> {
        let report = workspace.file(MEMORY_PROBE_FILE_NAME);
        let command = self
            .probe
            .wrap(self.toolchain.run_command(language, workspace.path()), &report);
        let limit = self.config.limits.time_ms;

        let stdin = tokio::fs::File::open(stdin_path)
            .await
            .map_err(|source| SandboxError::Artifact {
                path: stdin_path.to_path_buf(),
                source,
            })?
            .into_std()
            .await;

        let output = match self
            .spawn_and_wait(&command, workspace.path(), Stdio::from(stdin), limit)
            .await
        {
            Ok(output) => output,
            Err(e @ SandboxError::Spawn { .. }) => {
                return Ok(ExecutionResult::runtime_error(String::new(), e.to_string(), 0, 0));
            }
            Err(e) => return Err(e),
        };

        let Some(status) = output.status else {
            tracing::debug!("Killed at time limit of {} ms", limit);
            return Ok(ExecutionResult::time_limit_exceeded(limit));
        };

        let wall_time_ms = (output.elapsed.as_millis() as u64).min(limit);
        let peak_memory_kb = self.probe.read_peak_kb(&report).await;

        if status.success() {
            return Ok(ExecutionResult::success(
                &output.stdout,
                wall_time_ms,
                peak_memory_kb,
            ));
        }

        let detail = if output.stderr.trim().is_empty() {
            describe_status(status)
        } else {
            output.stderr
        };
        Ok(ExecutionResult::runtime_error(
            output.stdout.trim().to_string(),
            detail,
            wall_time_ms,
            peak_memory_kb,
        ))
    }

    async fn spawn_and_wait(
        &self,
        command: &CommandLine,
        cwd: &Path,
        stdin: Stdio,
        limit_ms: u64,
    ) -> Result<ProcessOutput, SandboxError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(cwd)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| SandboxError::Spawn {
            program: command.program_name(),
            source,
        })?;
        let pid = child.id();

        let output_limit = self.config.limits.output_size_bytes;
        let stdout_reader = child
            .stdout
            .take()
            .map(|out| OutputReader::spawn(out, output_limit));
        let stderr_reader = child
            .stderr
            .take()
            .map(|err| OutputReader::spawn(err, output_limit));

        let status = match timeout(Duration::from_millis(limit_ms), child.wait()).await {
            Ok(status) => Some(status.map_err(SandboxError::Wait)?),
            Err(_) => None,
        };
        let elapsed = start.elapsed();

        // The leader is reaped at this point, but the group id stays taken
        // while any member is alive, and a new process only leads group
        // `pid` after its own setsid/setpgid. An empty group yields ESRCH.
        kill_process_group(pid);

        if status.is_none() {
            if let Err(e) = child.wait().await {
                tracing::warn!("Failed to reap killed process: {}", e);
            }
            stdout_reader.into_iter().for_each(OutputReader::abort);
            stderr_reader.into_iter().for_each(OutputReader::abort);
            return Ok(ProcessOutput {
                status,
                stdout: String::new(),
                stderr: String::new(),
                elapsed,
            });
        }

        // A descendant that left the group can still hold the pipes open.
        let deadline = (start + Duration::from_millis(limit_ms))
            .max(Instant::now() + Duration::from_millis(OUTPUT_GRACE_MS));
        Ok(ProcessOutput {
            status,
            stdout: OutputReader::finish(stdout_reader, deadline).await,
            stderr: OutputReader::finish(stderr_reader, deadline).await,
            elapsed,
        })
    }
}

#[async_trait::async_trait]
impl Sandbox for NativeSandbox {
    #[tracing::instrument(skip(self, request), fields(language = %request.language))]
    async fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        let workspace = match Workspace::create(&self.config.work_dir).await {
            Ok(workspace) => workspace,
            Err(e) => {
                tracing::error!("Internal error before running: {}", e);
                return ExecutionResult::runtime_error(String::new(), e.to_string(), 0, 0);
            }
        };

        let result = match self.run_in(&workspace, request).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Internal error while running: {}", e);
                ExecutionResult::runtime_error(String::new(), e.to_string(), 0, 0)
            }
        };
        workspace.remove().await;

        tracing::debug!(
            error_kind = ?result.error_kind,
            wall_time_ms = result.wall_time_ms,
            peak_memory_kb = result.peak_memory_kb,
            "Run finished"
        );
        result
    }
}

fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!("Failed to kill process group {}: {}", pid, e),
    }
}

fn describe_status(status: ExitStatus) -> String {
    match (status.code(), status.signal()) {
        (Some(code), _) => format!("process exited with status {}", code),
        (None, Some(signal)) => format!("process killed by signal {}", signal),
        (None, None) => "process exited abnormally".to_string(),
    }
}

/// Captures one output stream of a child into a shared buffer, so whatever
/// was read survives the reader task being aborted.
struct OutputReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl OutputReader {
    fn spawn<R>(reader: R, limit: u64) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(read_capped(reader, limit, Arc::clone(&buffer)));
        Self { buffer, task }
    }

    async fn finish(reader: Option<Self>, deadline: Instant) -> String {
        let Some(mut reader) = reader else {
            return String::new();
        };
        match timeout_at(deadline, &mut reader.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Output reader failed: {}", e),
            Err(_) => {
                tracing::warn!("Output still open after the process exited, keeping what was read");
                reader.task.abort();
            }
        }
        let buffer = reader.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn abort(self) {
        self.task.abort();
    }
}

async fn read_capped<R>(mut reader: R, limit: u64, buffer: Arc<Mutex<Vec<u8>>>)
where
    R: AsyncRead + Unpin,
{
    let mut remaining = usize::try_from(limit).unwrap_or(usize::MAX);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        // Past the cap the rest is drained so the child never blocks on a full pipe.
        let n = match reader.read(&mut chunk).await {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) => {
                tracing::trace!("Stopped reading process output: {}", e);
                return;
            }
        };
        let kept = n.min(remaining);
        if kept > 0 {
            remaining -= kept;
            buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(&chunk[..kept]);
        }
    }
}
