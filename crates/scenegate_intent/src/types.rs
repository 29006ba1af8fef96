//! Core routing types: scenes, intents, confidence tiers, session state and decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Slot values extracted by the classifier (string keys, arbitrary JSON values).
pub type Slots = serde_json::Map<String, serde_json::Value>;

/// Error when parsing one of the routing labels from a string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} label: {value}")]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
}

impl ParseLabelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Scene
// ============================================================================

/// Business context a session is currently in. Exactly one is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scene {
    Chat,
    Recite,
    Homework,
}

impl Scene {
    pub const ALL: [Scene; 3] = [Scene::Chat, Scene::Recite, Scene::Homework];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scene::Chat => "chat",
            Scene::Recite => "recite",
            Scene::Homework => "homework",
        }
    }

    /// The business intent that asks for this scene.
    pub fn intent(&self) -> Intent {
        match self {
            Scene::Chat => Intent::Chat,
            Scene::Recite => Intent::Recite,
            Scene::Homework => Intent::Homework,
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Scene::Chat
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Scene {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Scene::Chat),
            "recite" => Ok(Scene::Recite),
            "homework" => Ok(Scene::Homework),
            _ => Err(ParseLabelError::new("scene", s)),
        }
    }
}

// ============================================================================
// Intent
// ============================================================================

/// What the user wants this turn, as labelled by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "chat")]
    Chat,
    #[serde(rename = "recite")]
    Recite,
    #[serde(rename = "homework")]
    Homework,
    #[serde(rename = "continue_current")]
    Continue,
    #[serde(rename = "exit_current")]
    Exit,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::Chat,
        Intent::Recite,
        Intent::Homework,
        Intent::Continue,
        Intent::Exit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Chat => "chat",
            Intent::Recite => "recite",
            Intent::Homework => "homework",
            Intent::Continue => "continue_current",
            Intent::Exit => "exit_current",
        }
    }

    /// Scene requested by a business intent; `None` for continue/exit.
    pub fn scene(&self) -> Option<Scene> {
        match self {
            Intent::Chat => Some(Scene::Chat),
            Intent::Recite => Some(Scene::Recite),
            Intent::Homework => Some(Scene::Homework),
            Intent::Continue | Intent::Exit => None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Intent::Chat),
            "recite" => Ok(Intent::Recite),
            "homework" => Ok(Intent::Homework),
            "continue_current" => Ok(Intent::Continue),
            "exit_current" => Ok(Intent::Exit),
            _ => Err(ParseLabelError::new("intent", s)),
        }
    }
}

// ============================================================================
// Confidence Tier
// ============================================================================

/// Discrete confidence derived from the numeric score (see `confidence`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    Low,
    Mid,
    High,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::Low => "LOW",
            ConfidenceTier::Mid => "MID",
            ConfidenceTier::High => "HIGH",
        }
    }

    /// MID or HIGH.
    pub fn is_at_least_mid(&self) -> bool {
        matches!(self, ConfidenceTier::Mid | ConfidenceTier::High)
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConfidenceTier {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(ConfidenceTier::Low),
            "MID" => Ok(ConfidenceTier::Mid),
            "HIGH" => Ok(ConfidenceTier::High),
            _ => Err(ParseLabelError::new("confidence tier", s)),
        }
    }
}

// ============================================================================
// Classification Result
// ============================================================================

/// Canonical, validated classification for one turn.
///
/// The tier is always `ConfidenceTier::from_score(score)`: both are private and
/// set together by [`ClassificationResult::new`], and deserialization goes
/// through the same constructor, ignoring any serialized tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ClassificationRecord")]
pub struct ClassificationResult {
    pub intent: Intent,
    score: u8,
    confidence_tier: ConfidenceTier,
    #[serde(default)]
    pub slots: Slots,
    #[serde(default)]
    pub rationale: String,
}

/// Wire shape of a stored classification; the tier is re-derived on load.
#[derive(Deserialize)]
struct ClassificationRecord {
    intent: Intent,
    score: i64,
    #[serde(default)]
    slots: Slots,
    #[serde(default)]
    rationale: String,
}

impl From<ClassificationRecord> for ClassificationResult {
    fn from(record: ClassificationRecord) -> Self {
        Self::new(record.intent, record.score, record.slots, record.rationale)
    }
}

impl ClassificationResult {
    /// Build a result, clamping the score and deriving the tier from it.
    pub fn new(intent: Intent, score: i64, slots: Slots, rationale: impl Into<String>) -> Self {
        let score = crate::confidence::clamp_score(score);
        Self {
            intent,
            score,
            confidence_tier: ConfidenceTier::from_score(score),
            slots,
            rationale: rationale.into(),
        }
    }

    /// Score in `[0, 100]`
    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn confidence_tier(&self) -> ConfidenceTier {
        self.confidence_tier
    }

    /// The result used whenever no usable classification exists.
    pub fn fallback(rationale: impl Into<String>) -> Self {
        Self::new(Intent::Chat, 0, Slots::new(), rationale)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// A proposed scene change awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSwitch {
    pub target_scene: Scene,
    /// Slots carried from the turn that proposed the switch
    #[serde(default)]
    pub slots: Slots,
    /// Turns waited so far
    #[serde(default)]
    pub age_turns: u32,
}

impl PendingSwitch {
    pub fn new(target_scene: Scene, slots: Slots) -> Self {
        Self {
            target_scene,
            slots,
            age_turns: 0,
        }
    }
}

/// Mutable record of one conversation.
///
/// Only [`crate::guardrails::decide`] mutates `active_scene` and `pending_switch`.
/// `scene_state` belongs to the active scene's workflow and is never read here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub active_scene: Scene,
    #[serde(default)]
    pub pending_switch: Option<PendingSwitch>,
    #[serde(default)]
    pub scene_state: Slots,
}

impl SessionState {
    pub fn new(active_scene: Scene) -> Self {
        Self {
            active_scene,
            ..Self::default()
        }
    }

    pub fn with_pending(mut self, pending: PendingSwitch) -> Self {
        self.pending_switch = Some(pending);
        self
    }

    /// Compact view handed to the classifier alongside the user's text.
    pub fn summary(&self) -> serde_json::Value {
        let pending = self.pending_switch.as_ref().map(|ps| {
            serde_json::json!({
                "target_scene": ps.target_scene.as_str(),
                "age_turns": ps.age_turns,
            })
        });
        serde_json::json!({
            "active_scene": self.active_scene.as_str(),
            "pending_switch": pending,
        })
    }
}

// ============================================================================
// Decision
// ============================================================================

/// What the guardrails did this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Continue,
    Switch,
    Exit,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Continue => "continue",
            Action::Switch => "switch",
            Action::Exit => "exit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "continue" => Ok(Action::Continue),
            "switch" => Ok(Action::Switch),
            "exit" => Ok(Action::Exit),
            _ => Err(ParseLabelError::new("action", s)),
        }
    }
}

/// Routing decision handed to the per-scene dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    /// Scene whose workflow processes the current turn
    pub handling_scene: Scene,
    /// Scene the session rests in after this turn
    pub resulting_scene: Scene,
    /// Slots forwarded to the handling workflow
    #[serde(default)]
    pub slots: Slots,
}

impl Decision {
    /// Stay in `scene` with nothing forwarded.
    pub fn stay(scene: Scene) -> Self {
        Self::stay_with(scene, Slots::new())
    }

    pub fn stay_with(scene: Scene, slots: Slots) -> Self {
        Self {
            action: Action::Continue,
            handling_scene: scene,
            resulting_scene: scene,
            slots,
        }
    }

    pub fn switch_to(scene: Scene, slots: Slots) -> Self {
        Self {
            action: Action::Switch,
            handling_scene: scene,
            resulting_scene: scene,
            slots,
        }
    }

    pub fn exit() -> Self {
        Self {
            action: Action::Exit,
            handling_scene: Scene::Chat,
            resulting_scene: Scene::Chat,
            slots: Slots::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
