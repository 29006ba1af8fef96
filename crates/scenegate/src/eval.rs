//! Offline evaluation against a labeled dataset
//!
//! Each sample fixes a session state, a user turn and the expected outcome.
//! The turn is classified (embedded payload or the configured classifier),
//! run through the guardrails, and the resulting scene and action are compared
//! with the gold labels.
//!
//! # Dataset Format
//!
//! ```json
//! [
//!   {
//!     "id": 1,
//!     "user": "let's do my math homework",
//!     "state": {"active_scene": "chat", "pending": {"target_scene": "homework"}},
//!     "gold_scene": "homework",
//!     "gold_action": "switch",
//!     "classification": {"intent": "homework", "score": 72}
//!   }
//! ]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::classifier::{classify_turn, ClassifierSource};
use scenegate_intent::{
    decide, normalize_value, Action, ClassificationResult, Decision, PendingSwitch, Scene,
    SessionState, Slots,
};

/// Sample identifier; datasets use both numbers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleId::Number(n) => write!(f, "{}", n),
            SampleId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Session state a sample starts from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleState {
    pub active_scene: Scene,
    #[serde(default)]
    pub pending: Option<SamplePending>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplePending {
    pub target_scene: Scene,
    #[serde(default)]
    pub slots: Slots,
    #[serde(default)]
    pub age_turns: u32,
}

impl SampleState {
    pub fn to_session_state(&self) -> SessionState {
        let mut state = SessionState::new(self.active_scene);
        state.pending_switch = self.pending.as_ref().map(|p| PendingSwitch {
            target_scene: p.target_scene,
            slots: p.slots.clone(),
            age_turns: p.age_turns,
        });
        state
    }
}

/// One labeled turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSample {
    pub id: SampleId,
    pub user: String,
    pub state: SampleState,
    pub gold_scene: Scene,
    pub gold_action: Action,
    /// Recorded classifier payload; when absent the configured classifier is called
    #[serde(default)]
    pub classification: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    Scene,
    Action,
}

impl MismatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            MismatchKind::Scene => "scene",
            MismatchKind::Action => "action",
        }
    }
}

/// A sample whose prediction disagreed with its label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mismatch {
    pub id: String,
    pub kind: MismatchKind,
    pub gold: String,
    pub predicted: String,
    pub user: String,
    pub classification: ClassificationResult,
}

/// Aggregate evaluation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalReport {
    pub total: usize,
    pub correct_scene: usize,
    pub correct_action: usize,
    pub mismatches: Vec<Mismatch>,
}

impl EvalReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one evaluated sample
    pub fn record(
        &mut self,
        sample: &EvalSample,
        classification: &ClassificationResult,
        decision: &Decision,
    ) {
        self.total += 1;

        if decision.resulting_scene == sample.gold_scene {
            self.correct_scene += 1;
        } else {
            self.push_mismatch(
                sample,
                classification,
                MismatchKind::Scene,
                sample.gold_scene.to_string(),
                decision.resulting_scene.to_string(),
            );
        }

        if decision.action == sample.gold_action {
            self.correct_action += 1;
        } else {
            self.push_mismatch(
                sample,
                classification,
                MismatchKind::Action,
                sample.gold_action.to_string(),
                decision.action.to_string(),
            );
        }
    }

    fn push_mismatch(
        &mut self,
        sample: &EvalSample,
        classification: &ClassificationResult,
        kind: MismatchKind,
        gold: String,
        predicted: String,
    ) {
        self.mismatches.push(Mismatch {
            id: sample.id.to_string(),
            kind,
            gold,
            predicted,
            user: sample.user.clone(),
            classification: classification.clone(),
        });
    }

    pub fn scene_accuracy(&self) -> f64 {
        ratio(self.correct_scene, self.total)
    }

    pub fn action_accuracy(&self) -> f64 {
        ratio(self.correct_action, self.total)
    }

    pub fn is_perfect(&self) -> bool {
        self.mismatches.is_empty()
    }
}

fn ratio(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

/// Load a dataset file
pub fn load_dataset(path: &Path) -> Result<Vec<EvalSample>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let samples: Vec<EvalSample> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;
    debug!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Classify and decide a single sample from its own starting state
pub async fn evaluate_sample(
    sample: &EvalSample,
    source: &ClassifierSource,
) -> (ClassificationResult, Decision) {
    let mut state = sample.state.to_session_state();
    let classification = match &sample.classification {
        Some(payload) => normalize_value(payload),
        None => classify_turn(source, &sample.user, &state).await,
    };
    let decision = decide(&classification, &mut state);
    (classification, decision)
}

/// Evaluate every sample in order
pub async fn run_eval(samples: &[EvalSample], source: &ClassifierSource) -> EvalReport {
    let mut report = EvalReport::new();
    for sample in samples {
        let (classification, decision) = evaluate_sample(sample, source).await;
        report.record(sample, &classification, &decision);
    }
    info!(
        "Evaluated {} samples: scene {}/{}, action {}/{}",
        report.total, report.correct_scene, report.total, report.correct_action, report.total
    );
    report
}
