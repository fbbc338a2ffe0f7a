use crate::core::{
    domain::{ExecutionRequest, ExecutionResult},
    traits::sandbox::Sandbox,
};

/// Runs code against custom input without grading it.
///
/// An unknown language name yields a compile error result with empty
/// output and nothing is spawned.
#[tracing::instrument(skip(sandbox, source, stdin))]
pub async fn run_custom(
    sandbox: &dyn Sandbox,
    language: &str,
    source: &str,
    stdin: &str,
) -> ExecutionResult {
    let request = match ExecutionRequest::parse(language, source, stdin) {
        Ok(request) => request,
        Err(e) => {
            tracing::info!("Rejected run: {}", e);
            return ExecutionResult::unsupported_language(language);
        }
    };

    sandbox.run(&request).await
}
