//! Single-turn decision against an optional state file.

use anyhow::{Context, Result};
use scenegate_intent::{decide, normalize, ClassificationResult, Decision, SessionState};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::HelpfulError;
use super::output::{describe_classification, describe_decision, describe_state};

#[derive(Debug, clap::Args)]
pub struct DecideArgs {
    /// Raw classifier payload (JSON text), or `-` to read it from stdin
    #[arg(long)]
    pub payload: String,

    /// Session state file; a missing file starts a fresh chat session
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Write the updated state back to the state file
    #[arg(long, requires = "state")]
    pub write_state: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Everything one decided turn produced
#[derive(Debug, Serialize)]
pub struct DecideOutcome {
    pub classification: ClassificationResult,
    pub decision: Decision,
    pub state: SessionState,
}

pub fn run(args: DecideArgs) -> Result<()> {
    let payload = if args.payload == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        args.payload.clone()
    };
    if payload.trim().is_empty() {
        return Err(HelpfulError::empty_payload().into());
    }

    let state = match &args.state {
        Some(path) => load_state(path)?,
        None => SessionState::default(),
    };

    let outcome = decide_turn(&payload, state);

    if args.write_state {
        if let Some(path) = &args.state {
            save_state(path, &outcome.state)?;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("Classification: {}", describe_classification(&outcome.classification));
        println!("Decision:       {}", describe_decision(&outcome.decision));
        println!("State:          {}", describe_state(&outcome.state));
    }
    Ok(())
}

/// Normalize `payload` and run the guardrails once from `state`.
pub fn decide_turn(payload: &str, mut state: SessionState) -> DecideOutcome {
    let classification = normalize(payload);
    let decision = decide(&classification, &mut state);
    DecideOutcome {
        classification,
        decision,
        state,
    }
}

/// Read a state file; a missing file is a fresh session.
pub fn load_state(path: &Path) -> Result<SessionState> {
    if !path.exists() {
        debug!("No state file at {}, starting fresh", path.display());
        return Ok(SessionState::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| HelpfulError::invalid_state_file(path, e).into())
}

pub fn save_state(path: &Path, state: &SessionState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write state file: {}", path.display()))?;
    debug!("Saved state to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegate_intent::{Action, Scene};
    use tempfile::TempDir;

    #[test]
    fn test_missing_state_file_is_fresh_session() {
        let dir = TempDir::new().unwrap();
        let state = load_state(&dir.path().join("state.json")).unwrap();
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn test_state_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let first = decide_turn(r#"{"intent": "homework", "score": 60}"#, load_state(&path).unwrap());
        assert_eq!(first.decision.action, Action::Continue);
        save_state(&path, &first.state).unwrap();

        let second = decide_turn(r#"{"intent": "homework", "score": 58}"#, load_state(&path).unwrap());
        assert_eq!(second.decision.action, Action::Switch);
        assert_eq!(second.state.active_scene, Scene::Homework);
        assert!(second.state.pending_switch.is_none());
    }

    #[test]
    fn test_corrupt_state_file_is_helpful_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_state(&path).unwrap_err();
        let helpful = err.downcast_ref::<HelpfulError>().unwrap();
        assert!(helpful.message.contains("state.json"));
    }

    #[test]
    fn test_partial_state_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"active_scene": "recite"}"#).unwrap();

        let state = load_state(&path).unwrap();
        assert_eq!(state.active_scene, Scene::Recite);
        assert!(state.pending_switch.is_none());
    }

    #[test]
    fn test_malformed_payload_still_decides() {
        let outcome = decide_turn("router timed out", SessionState::new(Scene::Homework));
        assert_eq!(outcome.classification.score(), 0);
        assert_eq!(outcome.decision.action, Action::Continue);
        assert_eq!(outcome.state.active_scene, Scene::Homework);
    }
}
