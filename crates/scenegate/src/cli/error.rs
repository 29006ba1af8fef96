//! Errors with context and suggestions for CLI commands

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    // === Common error constructors ===

    /// Evaluation dataset is missing
    pub fn dataset_not_found(path: &Path) -> Self {
        Self::new(format!("Dataset not found: {}", path.display()))
            .with_context("Offline evaluation needs a JSON array of labeled samples")
            .with_suggestion("TRY: scenegate eval --dataset path/to/eval_dataset.json")
            .with_suggestion(format!(
                "TRY: export {}=path/to/eval_dataset.json",
                scenegate::config::ENV_DATASET
            ))
    }

    /// State file exists but cannot be used
    pub fn invalid_state_file(path: &Path, reason: impl fmt::Display) -> Self {
        Self::new(format!("Invalid session state file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestion("TRY: Delete the file to start from a fresh chat session")
    }

    /// Nothing to classify
    pub fn empty_payload() -> Self {
        Self::new("Classifier payload is empty")
            .with_suggestion(r#"TRY: scenegate decide --payload '{"intent": "homework", "score": 90}'"#)
            .with_suggestion("TRY: echo '{...}' | scenegate decide --payload -")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as JSON on stdout for `--json` callers
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": helpful.message,
            "context": helpful.context,
            "suggestions": helpful.suggestions,
        }),
        None => serde_json::json!({ "error": format!("{:#}", err) }),
    };
    println!("{}", payload);
}
