//! CLI module for scenegate
//!
//! `repl` drives a live session, `decide` runs a single turn against a state
//! file, `eval` replays a labeled dataset and `config` shows resolved settings.

pub mod config;
pub mod decide;
pub mod error;
pub mod eval;
pub mod output;
pub mod repl;

use anyhow::Result;
use scenegate::ScenegateConfig;

/// Classifier overrides shared by commands that classify turns
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ClassifierArgs {
    /// Classifier program and arguments (whitespace separated); omit for echo mode
    #[arg(long = "classifier-cmd")]
    pub classifier_cmd: Option<String>,

    /// Deadline for one classifier call in milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

impl ClassifierArgs {
    /// Resolved config with these flags applied on top
    pub fn resolve(&self) -> Result<ScenegateConfig> {
        ScenegateConfig::resolve()?
            .with_classifier_flags(self.classifier_cmd.as_deref(), self.timeout_ms)
    }
}

/// Build the single-threaded runtime commands use for classifier calls
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
