use std::sync::Arc;

use itertools::Itertools;

use crate::{
    constants::FULL_SCORE,
    core::{
        domain::{
            ErrorKind, ExecutionRequest, Language, SubmissionResult, Subtask, SubtaskOutcome,
            TestSpec, Verdict,
        },
        errors::ConfigurationError,
        test_spec::parse_test_spec,
        traits::sandbox::Sandbox,
    },
};

/// Grades a submission against subtask-grouped test data.
///
/// Groups and their cases are run strictly in order, one sandbox call at a
/// time. The first failing case ends its group; the first failure of the
/// whole evaluation decides the verdict unless the score reaches 100.
#[derive(Clone, Debug)]
pub struct Evaluator {
    sandbox: Arc<dyn Sandbox>,
}

struct GroupRun {
    outcome: SubtaskOutcome,
    max_wall_time_ms: u64,
    max_memory_kb: u64,
    compile_failed: bool,
}

impl Evaluator {
    pub fn new(sandbox: Arc<dyn Sandbox>) -> Self {
        Self { sandbox }
    }

    /// Entry point for raw inputs: parses the test data and the language name
    /// before anything is spawned.
    pub async fn evaluate_raw(
        &self,
        raw_spec: &str,
        code: &str,
        language: &str,
    ) -> Result<SubmissionResult, ConfigurationError> {
        let spec = parse_test_spec(raw_spec)?;
        let language: Language = language.parse()?;
        Ok(self.evaluate(&spec, code, language).await)
    }

    #[tracing::instrument(skip(self, spec, code), fields(subtasks = spec.subtasks.len()))]
    pub async fn evaluate(&self, spec: &TestSpec, code: &str, language: Language) -> SubmissionResult {
        let mut score = 0;
        let mut verdict = Verdict::AC;
        let mut max_wall_time_ms = 0;
        let mut max_memory_kb = 0;
        let mut groups = Vec::with_capacity(spec.subtasks.len());
        let mut sandbox_calls = 0;
        let mut compile_failed = false;

        for subtask in &spec.subtasks {
            if compile_failed {
                groups.push(SubtaskOutcome {
                    group_id: subtask.group_id,
                    points: subtask.points,
                    passed: false,
                    failure: None,
                    cases_run: 0,
                });
                continue;
            }

            let run = self.run_group(subtask, code, language).await;
            max_wall_time_ms = max_wall_time_ms.max(run.max_wall_time_ms);
            max_memory_kb = max_memory_kb.max(run.max_memory_kb);
            // Only a CE on the very first call is taken as the verdict of the
            // source itself; a later one (compile timeout, launch failure) is
            // a one-off and the remaining groups are still graded.
            compile_failed = run.compile_failed && sandbox_calls == 0;
            sandbox_calls += run.outcome.cases_run;

            score += run.outcome.awarded();
            if let (Verdict::AC, Some(failure)) = (verdict, run.outcome.failure) {
                verdict = failure;
            }
            groups.push(run.outcome);
        }

        if score == FULL_SCORE {
            verdict = Verdict::AC;
        }

        let summary = groups
            .iter()
            .map(|g| format!("{}:{}", g.group_id, if g.passed { "ok" } else { "fail" }))
            .join(",");
        tracing::info!(%verdict, score, max_wall_time_ms, groups = %summary, "Evaluation finished");

        SubmissionResult {
            verdict,
            score,
            max_wall_time_ms,
            max_memory_kb,
            groups,
        }
    }

    async fn run_group(&self, subtask: &Subtask, code: &str, language: Language) -> GroupRun {
        let mut run = GroupRun {
            outcome: SubtaskOutcome {
                group_id: subtask.group_id,
                points: subtask.points,
                passed: true,
                failure: None,
                cases_run: 0,
            },
            max_wall_time_ms: 0,
            max_memory_kb: 0,
            compile_failed: false,
        };

        for (case_idx, case) in subtask.cases.iter().enumerate() {
            let request = ExecutionRequest::new(language, code, case.input.as_str());
            let result = self.sandbox.run(&request).await;
            run.outcome.cases_run += 1;
            run.max_wall_time_ms = run.max_wall_time_ms.max(result.wall_time_ms);
            run.max_memory_kb = run.max_memory_kb.max(result.peak_memory_kb);

            let failure = match Verdict::from_error_kind(result.error_kind) {
                Some(verdict) => Some(verdict),
                None if result.stdout.trim() != case.expected_output.trim() => Some(Verdict::WA),
                None => None,
            };

            if let Some(failure) = failure {
                tracing::debug!(
                    group_id = subtask.group_id,
                    case = case_idx + 1,
                    %failure,
                    detail = ?result.error_detail,
                    "Case failed, skipping rest of group"
                );
                run.outcome.passed = false;
                run.outcome.failure = Some(failure);
                run.compile_failed = result.error_kind == ErrorKind::CompileError;
                break;
            }
        }

        run
    }
}
