//! Offline evaluation command

use anyhow::Result;
use scenegate::eval::{load_dataset, run_eval, EvalReport};
use std::path::PathBuf;
use tracing::info;

use super::error::HelpfulError;
use super::output::{format_percent, print_table, truncate};
use super::{runtime, ClassifierArgs};

/// Mismatches listed in the human report
const MAX_SHOWN_MISMATCHES: usize = 10;

#[derive(Debug, clap::Args)]
pub struct EvalArgs {
    /// Labeled dataset (JSON array); defaults to the configured dataset
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    #[command(flatten)]
    pub classifier: ClassifierArgs,

    /// Evaluate only the first N samples
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output the full report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: EvalArgs) -> Result<()> {
    let config = args.classifier.resolve()?;
    let dataset = args.dataset.clone().unwrap_or_else(|| config.dataset_path());
    if !dataset.exists() {
        return Err(HelpfulError::dataset_not_found(&dataset).into());
    }

    let mut samples = load_dataset(&dataset)?;
    if let Some(limit) = args.limit {
        samples.truncate(limit);
    }

    let source = config.classifier_source();
    info!(
        "Evaluating {} samples from {} with {}",
        samples.len(),
        dataset.display(),
        source.describe()
    );
    let report = runtime()?.block_on(run_eval(&samples, &source));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("SCENEGATE EVALUATION");
        println!("====================");
        println!();
        println!("Dataset:    {}", dataset.display());
        println!("Classifier: {}", source.describe());
        println!("Samples:    {}", report.total);
        println!();
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &EvalReport) {
    println!(
        "Scene accuracy:  {}/{} ({})",
        report.correct_scene,
        report.total,
        format_percent(report.scene_accuracy())
    );
    println!(
        "Action accuracy: {}/{} ({})",
        report.correct_action,
        report.total,
        format_percent(report.action_accuracy())
    );

    if report.mismatches.is_empty() {
        return;
    }

    println!();
    println!(
        "Mismatches (showing {} of {}):",
        report.mismatches.len().min(MAX_SHOWN_MISMATCHES),
        report.mismatches.len()
    );
    print_table(&["ID", "KIND", "GOLD", "PREDICTED", "INTENT", "SCORE", "USER"], mismatch_rows(report));
}

fn mismatch_rows(report: &EvalReport) -> Vec<Vec<String>> {
    report
        .mismatches
        .iter()
        .take(MAX_SHOWN_MISMATCHES)
        .map(|m| {
            vec![
                m.id.clone(),
                m.kind.label().to_string(),
                m.gold.clone(),
                m.predicted.clone(),
                m.classification.intent.to_string(),
                m.classification.score().to_string(),
                truncate(&m.user, 40),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegate::eval::EvalSample;
    use scenegate_intent::{ClassificationResult, Decision, Scene};

    #[test]
    fn test_mismatch_rows_are_capped() {
        let sample: EvalSample = serde_json::from_value(serde_json::json!({
            "id": 1,
            "user": "switch to homework now",
            "state": {"active_scene": "chat"},
            "gold_scene": "homework",
            "gold_action": "switch",
        }))
        .unwrap();
        let classification = ClassificationResult::fallback("n/a");
        let mut report = EvalReport::new();
        for _ in 0..8 {
            report.record(&sample, &classification, &Decision::stay(Scene::Chat));
        }

        assert_eq!(report.mismatches.len(), 16);
        let rows = mismatch_rows(&report);
        assert_eq!(rows.len(), MAX_SHOWN_MISMATCHES);
        assert_eq!(rows[0][1], "scene");
        assert_eq!(rows[1][3], "continue");
    }
}
