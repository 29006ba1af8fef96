//! Classifier adapters.
//!
//! The classifier itself is external; these adapters only obtain its raw
//! payload. Whatever happens here, [`classify_turn`] hands the guardrails a
//! usable classification.
//!
//! ## Command protocol
//!
//! ```text
//! scenegate ──stdin──▶ {"user_text": "...", "state": {"active_scene": ..., "pending_switch": ...}}
//! scenegate ◀─stdout── {"intent": "...", "score": 0-100, "slots": {...}, "reason": "..."}
//! ```
//!
//! A non-zero exit, blank stdout or a blown deadline all count as a failed call.

use scenegate_intent::{normalize_outcome, ClassificationResult, ClassifierError, SessionState};
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default deadline for one classifier call (10 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// External program that classifies one turn per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandClassifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandClassifier {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Build from `[program, args...]`; `None` when `argv` is empty.
    pub fn from_argv(argv: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec(), timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the classifier for one turn and return its raw stdout.
    pub async fn classify(
        &self,
        user_text: &str,
        state: &SessionState,
    ) -> Result<String, ClassifierError> {
        let request = serde_json::json!({
            "user_text": user_text,
            "state": state.summary(),
        })
        .to_string();

        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.spawn(&request)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(raw)) => {
                debug!("Classifier '{}' answered in {}ms", self.program, duration_ms);
                Ok(raw)
            }
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Err(ClassifierError::Timeout(self.timeout)),
        }
    }

    async fn spawn(&self, request: &str) -> Result<String, ClassifierError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ClassifierError::Transport(format!("failed to spawn '{}': {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A classifier may answer without reading its input.
            if let Err(e) = stdin.write_all(request.as_bytes()).await {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(ClassifierError::Transport(format!(
                        "failed to write request: {}",
                        e
                    )));
                }
            }
        }

        let output = child.wait_with_output().await.map_err(|e| {
            ClassifierError::Transport(format!("failed to wait for '{}': {}", self.program, e))
        })?;

        if !output.status.success() {
            return Err(ClassifierError::Rejected {
                code: output.status.code(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| ClassifierError::Transport("classifier output is not valid UTF-8".into()))?;
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Err(ClassifierError::EmptyResponse);
        }
        Ok(trimmed.to_string())
    }
}

/// Where a turn's raw classification comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierSource {
    /// The input line is the raw payload (manual driving, scripted demos)
    Echo,
    Command(CommandClassifier),
}

impl ClassifierSource {
    pub async fn classify(
        &self,
        user_text: &str,
        state: &SessionState,
    ) -> Result<String, ClassifierError> {
        match self {
            ClassifierSource::Echo => {
                let raw = user_text.trim();
                if raw.is_empty() {
                    Err(ClassifierError::EmptyResponse)
                } else {
                    Ok(raw.to_string())
                }
            }
            ClassifierSource::Command(cmd) => cmd.classify(user_text, state).await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ClassifierSource::Echo => "echo (input is the classifier payload)".to_string(),
            ClassifierSource::Command(cmd) => {
                format!("command `{}` (timeout {:?})", cmd.describe(), cmd.timeout())
            }
        }
    }
}

/// Classify one turn; failed calls become the low-confidence chat fallback.
pub async fn classify_turn(
    source: &ClassifierSource,
    user_text: &str,
    state: &SessionState,
) -> ClassificationResult {
    let outcome = source.classify(user_text, state).await;
    if let Err(e) = &outcome {
        warn!("Classifier call failed, using fallback: {}", e);
    }
    normalize_outcome(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegate_intent::{ConfidenceTier, Intent};

    #[tokio::test]
    async fn test_echo_passes_payload_through() {
        let state = SessionState::default();
        let result = classify_turn(
            &ClassifierSource::Echo,
            r#"  {"intent": "homework", "score": 88}  "#,
            &state,
        )
        .await;
        assert_eq!(result.intent, Intent::Homework);
        assert_eq!(result.confidence_tier(), ConfidenceTier::High);
    }

    #[tokio::test]
    async fn test_echo_blank_input_is_empty_response() {
        let err = ClassifierSource::Echo
            .classify("   ", &SessionState::default())
            .await
            .unwrap_err();
        assert_eq!(err, ClassifierError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_missing_program_is_transport_error() {
        let cmd = CommandClassifier::new(
            "scenegate-no-such-classifier",
            vec![],
            Duration::from_secs(1),
        );
        let err = cmd.classify("hi", &SessionState::default()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Transport(_)));
    }

    #[test]
    fn test_from_argv() {
        let argv = vec!["python3".to_string(), "classify.py".to_string()];
        let cmd = CommandClassifier::from_argv(&argv, Duration::from_millis(500)).unwrap();
        assert_eq!(cmd.describe(), "python3 classify.py");
        assert!(CommandClassifier::from_argv(&[], Duration::from_millis(500)).is_none());
    }
}
