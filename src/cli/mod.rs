//! CLI command layer
//!
//! Owns everything interactive: branch selection, confirmation, styled
//! output, and the spinner shown while the conflict monitor waits.

pub mod style;

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anstream::println;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dialoguer::{Confirm, Select};
use indicatif::ProgressBar;

use upmerge::error::{Error, Result};
use upmerge::git::GitRunner;
use upmerge::inventory;
use upmerge::monitor::MonitorConfig;
use upmerge::progress::ProgressCallback;
use upmerge::strategy::create_strategy;
use upmerge::types::{Branch, MergeSession, StrategyKind};

use crate::cli::style::{check, spinner_style, Stylize};

/// Run one merge invocation: inventory, selection, confirmation, execution.
///
/// Returns `Ok(())` on success *and* on user cancellation (both exit 0).
pub async fn run(path: &Path, strategy_kind: StrategyKind) -> Result<()> {
    let git = GitRunner::new(path);

    let current = inventory::current_branch(&git)?;
    let repo_root = inventory::repo_root(&git)?;
    let branches = inventory::list_branches(&git)?;

    let choices: Vec<&Branch> = branches.iter().filter(|b| b.name != current).collect();
    if choices.is_empty() {
        println!("{}", "No other branches to merge into.".muted());
        return Ok(());
    }

    println!(
        "{} {}",
        "Current branch:".muted(),
        current.accent()
    );

    let now = Utc::now();
    let items: Vec<String> = choices
        .iter()
        .map(|b| format!("{} ({})", b.name, relative_age(b.last_commit_at, now)))
        .collect();

    let selection = Select::new()
        .with_prompt("Merge into which branch?")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(|e| Error::Prompt(e.to_string()))?;

    let Some(index) = selection else {
        println!("{}", "Aborted".muted());
        return Ok(());
    };
    let target = choices[index].name.clone();

    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Merge {current} into {target} using the {strategy_kind} strategy?"
        ))
        .default(true)
        .interact()
        .map_err(|e| Error::Prompt(e.to_string()))?;
    if !confirmed {
        println!("{}", "Aborted".muted());
        return Ok(());
    }

    let session = MergeSession::new(current, target, strategy_kind, repo_root);
    let strategy = create_strategy(strategy_kind, MonitorConfig::default());
    strategy.execute(&session, &CliProgress::new()).await?;

    println!(
        "{} {}",
        check(),
        format!(
            "Merged {} into {}",
            session.current_branch, session.target_branch
        )
        .success()
    );
    Ok(())
}

/// Print a fatal error before exiting non-zero.
pub fn report_failure(error: &Error) {
    anstream::eprintln!("{} {}", "✗".error(), error.error());
}

/// Progress sink that prints styled lines and drives a spinner during the
/// conflict wait.
#[derive(Debug, Default)]
pub struct CliProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Create a progress sink with no active spinner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn print(&self, line: &str) {
        let guard = self.spinner.lock().expect("progress lock poisoned");
        // Route through the spinner while it is live so lines don't garble it.
        if let Some(pb) = guard.as_ref() {
            pb.println(line);
        } else {
            println!("{line}");
        }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_message(&self, message: &str) {
        self.print(message);
    }

    async fn on_warning(&self, message: &str) {
        self.print(&format!("{} {}", "⚠".warn(), message.warn()));
    }

    async fn on_wait_started(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        *self.spinner.lock().expect("progress lock poisoned") = Some(pb);
    }

    async fn on_wait_tick(&self, message: &str) {
        if let Some(pb) = self
            .spinner
            .lock()
            .expect("progress lock poisoned")
            .as_ref()
        {
            pb.set_message(message.to_string());
        }
    }

    async fn on_wait_finished(&self, message: &str) {
        if let Some(pb) = self
            .spinner
            .lock()
            .expect("progress lock poisoned")
            .take()
        {
            pb.finish_and_clear();
        }
        println!("{message}");
    }
}

/// Compact "how long ago" label for the branch list.
fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3600),
        s => format!("{}d ago", s / 86_400),
    }
}
