use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::{
    domain::{Language, SubmissionResult, TestSpec},
    errors::SubmissionError,
    pipeline::evaluating::Evaluator,
};

#[derive(Clone, Debug, Serialize)]
pub struct Submission {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub code: String,
    pub language: String,
    pub state: SubmissionState,
}

/// `Created` moves to `Judged` through the local evaluator, or to `Pending`
/// when the submission is handed to an external judge. Only a rejudge
/// replaces a `Judged` result.
#[derive(Clone, Debug, Default, Serialize)]
pub enum SubmissionState {
    #[default]
    Created,
    Pending,
    Judged {
        result: SubmissionResult,
        judged_at: DateTime<Utc>,
    },
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Created => "created",
            SubmissionState::Pending => "pending",
            SubmissionState::Judged { .. } => "judged",
        }
    }
}

impl Submission {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            code: code.into(),
            language: language.into(),
            state: SubmissionState::Created,
        }
    }

    pub fn change_state(&self, new_state: SubmissionState) -> Self {
        Self {
            state: new_state,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        match &self.state {
            SubmissionState::Judged { result, .. } => Some(result),
            _ => None,
        }
    }

    #[tracing::instrument(skip(self, evaluator, spec), fields(id = %self.id))]
    pub async fn judge(
        &self,
        evaluator: &Evaluator,
        spec: &TestSpec,
    ) -> Result<Submission, SubmissionError> {
        self.expect_state("judge", |s| matches!(s, SubmissionState::Created))?;
        self.evaluate(evaluator, spec).await
    }

    /// Re-runs the stored code against the problem's current test data. The
    /// previous result is replaced, never merged.
    #[tracing::instrument(skip(self, evaluator, spec), fields(id = %self.id))]
    pub async fn rejudge(
        &self,
        evaluator: &Evaluator,
        spec: &TestSpec,
    ) -> Result<Submission, SubmissionError> {
        self.expect_state("rejudge", |s| matches!(s, SubmissionState::Judged { .. }))?;
        if let Some(previous) = self.result() {
            tracing::debug!(verdict = %previous.verdict, score = previous.score, "Replacing result");
        }
        self.evaluate(evaluator, spec).await
    }

    pub fn route_external(&self) -> Result<Submission, SubmissionError> {
        self.expect_state("route", |s| matches!(s, SubmissionState::Created))?;
        Ok(self.change_state(SubmissionState::Pending))
    }

    /// Called by the relay once the external judge has answered.
    pub fn complete_external(
        &self,
        result: SubmissionResult,
    ) -> Result<Submission, SubmissionError> {
        self.expect_state("complete", |s| matches!(s, SubmissionState::Pending))?;
        Ok(self.change_state(SubmissionState::Judged {
            result,
            judged_at: Utc::now(),
        }))
    }

    async fn evaluate(
        &self,
        evaluator: &Evaluator,
        spec: &TestSpec,
    ) -> Result<Submission, SubmissionError> {
        let language: Language = self.language.parse()?;
        let result = evaluator.evaluate(spec, &self.code, language).await;
        Ok(self.change_state(SubmissionState::Judged {
            result,
            judged_at: Utc::now(),
        }))
    }

    fn expect_state<F>(&self, action: &'static str, allowed: F) -> Result<(), SubmissionError>
    where
        F: Fn(&SubmissionState) -> bool,
    {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(SubmissionError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::{
        domain::{ExecutionResult, Subtask, TestCase, Verdict},
        errors::ConfigurationError,
        traits::sandbox::MockSandbox,
    };

    fn spec(expected: &str) -> TestSpec {
        TestSpec {
            subtasks: vec![Subtask {
                group_id: 1,
                points: 100,
                cases: vec![TestCase {
                    input: "".to_string(),
                    expected_output: expected.to_string(),
                }],
            }],
        }
    }

    fn echo_evaluator(stdout: &'static str) -> Evaluator {
        let mut sandbox = MockSandbox::new();
        sandbox
            .expect_run()
            .returning(move |_| ExecutionResult::success(stdout, 5, 0));
        Evaluator::new(Arc::new(sandbox))
    }

    #[tokio::test]
    async fn test_judge_then_rejudge_replaces_result() {
        let evaluator = echo_evaluator("hello");
        let submission = Submission::new("print('hello')", "python");

        let judged = submission.judge(&evaluator, &spec("hello")).await.unwrap();
        assert_eq!(judged.result().unwrap().verdict, Verdict::AC);
        assert_eq!(judged.id, submission.id);

        let rejudged = judged.rejudge(&evaluator, &spec("bye")).await.unwrap();
        let result = rejudged.result().unwrap();
        assert_eq!(result.verdict, Verdict::WA);
        assert_eq!(result.score, 0);
        assert_eq!(result.groups.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let evaluator = echo_evaluator("x");
        let submission = Submission::new("x", "cpp");

        let result = submission.rejudge(&evaluator, &spec("x")).await;
        assert!(matches!(
            result,
            Err(SubmissionError::InvalidTransition {
                action: "rejudge",
                state: "created"
            })
        ));

        let judged = submission.judge(&evaluator, &spec("x")).await.unwrap();
        assert!(judged.judge(&evaluator, &spec("x")).await.is_err());
        assert!(judged.route_external().is_err());
    }

    #[tokio::test]
    async fn test_external_path() {
        let submission = Submission::new("x", "cpp").route_external().unwrap();
        assert!(matches!(submission.state, SubmissionState::Pending));
        assert!(submission.result().is_none());

        let evaluator = echo_evaluator("x");
        assert!(submission.judge(&evaluator, &spec("x")).await.is_err());

        let completed = submission
            .complete_external(SubmissionResult {
                verdict: Verdict::TLE,
                score: 0,
                max_wall_time_ms: 2000,
                max_memory_kb: 0,
                groups: vec![],
            })
            .unwrap();
        assert_eq!(completed.result().unwrap().verdict, Verdict::TLE);
    }

    #[tokio::test]
    async fn test_unsupported_language_is_not_judged() {
        let mut sandbox = MockSandbox::new();
        sandbox.expect_run().never();
        let evaluator = Evaluator::new(Arc::new(sandbox));

        let result = Submission::new("x", "haskell")
            .judge(&evaluator, &spec("x"))
            .await;

        assert!(matches!(
            result,
            Err(SubmissionError::Configuration(
                ConfigurationError::UnsupportedLanguage(_)
            ))
        ));
    }
}
