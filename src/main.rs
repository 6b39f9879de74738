//! upmerge CLI entry point

mod cli;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use upmerge::types::StrategyKind;

/// Merge the current branch into a chosen target branch.
#[derive(Parser)]
#[command(name = "upmerge", version, about, disable_version_flag = true)]
struct Cli {
    /// Merge strategy
    #[arg(short, long, value_enum, default_value_t = StrategyKind::Worktree)]
    strategy: StrategyKind,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Repository to operate on (defaults to the current directory)
    #[arg(long, default_value = ".")]
    path: std::path::PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    if let Err(e) = cli::run(&args.path, args.strategy).await {
        cli::report_failure(&e);
        std::process::exit(1);
    }
}
