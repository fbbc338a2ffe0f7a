use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use judge_engine::{Evaluator, NativeSandbox, SandboxConfig, run_custom};

#[derive(Parser, Debug)]
#[command(name = "judge-engine", about = "Compile, run and grade submissions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program once against custom input, without grading
    Run {
        #[arg(short, long)]
        language: String,
        #[arg(short, long)]
        source: PathBuf,
        /// File fed to stdin; empty input when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Grade a program against subtask test data
    Evaluate {
        #[arg(short, long)]
        language: String,
        #[arg(short, long)]
        source: PathBuf,
        /// JSON test specification
        #[arg(short, long)]
        tests: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    let cli = Cli::parse();
    let config = SandboxConfig::from_env()?;
    let sandbox = Arc::new(NativeSandbox::new(config));

    match cli.command {
        Commands::Run {
            language,
            source,
            input,
        } => {
            let code = read(&source)?;
            let stdin = input.map(|path| read(&path)).transpose()?.unwrap_or_default();

            let result = run_custom(sandbox.as_ref(), &language, &code, &stdin).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Evaluate {
            language,
            source,
            tests,
        } => {
            let code = read(&source)?;
            let raw_spec = read(&tests)?;

            let evaluator = Evaluator::new(sandbox);
            let result = evaluator
                .evaluate_raw(&raw_spec, &code, &language)
                .await
                .context("submission could not be judged")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
