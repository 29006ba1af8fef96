//! SceneGate: scene routing guardrails around an external intent classifier.
//!
//! The decision engine itself lives in `scenegate_intent`; this crate wires it
//! to classifier processes, configuration and offline evaluation.

pub mod classifier;
pub mod config;
pub mod eval;

pub use classifier::{classify_turn, ClassifierSource, CommandClassifier};
pub use config::ScenegateConfig;
pub use eval::{load_dataset, run_eval, EvalReport, EvalSample};
