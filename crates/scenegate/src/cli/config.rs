//! `scenegate config`: show resolved paths, classifier and policy constants

use anyhow::Result;
use scenegate::config::{config_path, ScenegateConfig};
use scenegate_intent::{HIGH_THRESHOLD, MID_THRESHOLD, PENDING_TTL_TURNS};
use scenegate_logging::{logs_dir, scenegate_home};

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved configuration in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let home = scenegate_home();
    let config_file = config_path();
    let logs = logs_dir();
    let config = ScenegateConfig::resolve()?;
    let source = config.classifier_source();
    let dataset = config.dataset_path();

    if args.json {
        let value = serde_json::json!({
            "home": home.to_string_lossy(),
            "config_file": {
                "path": config_file.to_string_lossy(),
                "exists": config_file.exists(),
            },
            "logs": logs.to_string_lossy(),
            "classifier": {
                "command": config.classifier.command,
                "timeout_ms": config.classifier.timeout_ms,
                "mode": if config.classifier.command.is_empty() { "echo" } else { "command" },
            },
            "dataset": {
                "path": dataset.to_string_lossy(),
                "exists": dataset.exists(),
            },
            "policy": {
                "high_threshold": HIGH_THRESHOLD,
                "mid_threshold": MID_THRESHOLD,
                "pending_ttl_turns": PENDING_TTL_TURNS,
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("SCENEGATE CONFIGURATION");
        println!("=======================");
        println!();
        println!("Home:        {}", home.display());
        println!(
            "Config file: {} ({})",
            config_file.display(),
            if config_file.exists() { "exists" } else { "not found" }
        );
        println!("Logs:        {}", logs.display());
        println!();
        println!("Classifier:  {}", source.describe());
        println!(
            "Dataset:     {} ({})",
            dataset.display(),
            if dataset.exists() { "exists" } else { "not found" }
        );
        println!();
        println!("Policy");
        println!("  HIGH tier:    score >= {}", HIGH_THRESHOLD);
        println!("  MID tier:     score >= {}", MID_THRESHOLD);
        println!("  Pending TTL:  {} turns", PENDING_TTL_TURNS);
    }

    Ok(())
}
