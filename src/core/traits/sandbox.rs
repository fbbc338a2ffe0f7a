use crate::core::domain::{ExecutionRequest, ExecutionResult};

/// Runs one program against one input.
///
/// Implementations must not fail: every problem with the judged program or
/// the machinery around it is reported through `ExecutionResult::error_kind`.
/// All artifacts created for a call are gone once it returns.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Sandbox: std::fmt::Debug + Send + Sync {
    async fn run(&self, request: &ExecutionRequest) -> ExecutionResult;
}
