use std::time::Duration;

use crate::core::{
    domain::{ExecutionRequest, ExecutionResult},
    traits::sandbox::Sandbox,
};

/// Answers every request with the same result after a fixed delay.
#[derive(Debug, Clone)]
pub struct SandboxStub {
    result: ExecutionResult,
    delay: Duration,
}

impl SandboxStub {
    pub fn new(result: ExecutionResult, delay: Duration) -> Self {
        Self { result, delay }
    }
}

#[async_trait::async_trait]
impl Sandbox for SandboxStub {
    #[tracing::instrument(skip(request), fields(language = %request.language))]
    async fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        tracing::debug!("Start execution: stdin={:?}", request.stdin);
        tokio::time::sleep(self.delay).await;
        tracing::debug!("Execution result: {:?}", self.result);

        self.result.clone()
    }
}
