//! Scene routing guardrails.
//!
//! Turns an externally computed intent classification into a scene-routing
//! decision for one conversational turn:
//!
//! - [`normalize`]: raw classifier payload -> [`ClassificationResult`], never fails
//! - [`decide`]: (classification, session state) -> [`Decision`], sole mutator of state
//! - [`SessionStore`]: per-session serialization of turns for long-lived callers
//!
//! Confidence is derived from the numeric score only; a classifier's own
//! confidence claims are never trusted.

pub mod confidence;
pub mod guardrails;
pub mod normalize;
pub mod session;
pub mod types;

pub use confidence::{clamp_score, HIGH_THRESHOLD, MID_THRESHOLD};
pub use guardrails::{decide, PENDING_TTL_TURNS};
pub use normalize::{normalize, normalize_outcome, normalize_value, ClassifierError};
pub use session::{SessionError, SessionId, SessionStore, TurnRecord, HISTORY_LIMIT};
pub use types::{
    Action, ClassificationResult, ConfidenceTier, Decision, Intent, ParseLabelError,
    PendingSwitch, Scene, SessionState, Slots,
};
