//! In-memory session store.
//!
//! Each session sits behind its own lock so one turn at a time can read,
//! decide and write its state. The registry lock is only held to look a
//! session up, never while a decision runs, so different sessions proceed in
//! parallel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::guardrails::decide;
use crate::types::{ClassificationResult, Decision, SessionState};

// ============================================================================
// Session ID - Newtype to prevent mixing with other IDs
// ============================================================================

/// Session identifier (UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ============================================================================
// Turn Record
// ============================================================================

/// One decided turn, kept in the session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 1-based turn number within the session
    pub turn: u64,
    pub at: DateTime<Utc>,
    pub classification: ClassificationResult,
    pub decision: Decision,
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("session lock poisoned: {0}")]
    LockPoisoned(SessionId),

    #[error("session registry lock poisoned")]
    RegistryPoisoned,
}

/// Most recent turns kept per session; older records are dropped.
pub const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Default)]
struct SessionEntry {
    state: SessionState,
    history: VecDeque<TurnRecord>,
    turns: u64,
}

type SharedEntry = Arc<Mutex<SessionEntry>>;

/// Registry of live conversations.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, SharedEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation in the default state (chat, nothing pending).
    pub fn open(&self) -> Result<SessionId, SessionError> {
        self.open_with(SessionState::default())
    }

    /// Start a conversation from a caller-supplied state.
    pub fn open_with(&self, state: SessionState) -> Result<SessionId, SessionError> {
        let id = SessionId::new();
        let entry = SessionEntry {
            state,
            ..SessionEntry::default()
        };
        self.sessions
            .lock()
            .map_err(|_| SessionError::RegistryPoisoned)?
            .insert(id, Arc::new(Mutex::new(entry)));
        debug!(session = %id, "session opened");
        Ok(id)
    }

    /// Run the guardrails for one turn of `id`, holding that session's lock.
    pub fn run_turn(
        &self,
        id: SessionId,
        classification: &ClassificationResult,
    ) -> Result<TurnRecord, SessionError> {
        let entry = self.entry(id)?;
        let mut entry = entry.lock().map_err(|_| SessionError::LockPoisoned(id))?;

        let decision = decide(classification, &mut entry.state);
        entry.turns += 1;
        let record = TurnRecord {
            turn: entry.turns,
            at: Utc::now(),
            classification: classification.clone(),
            decision,
        };
        entry.history.push_back(record.clone());
        if entry.history.len() > HISTORY_LIMIT {
            entry.history.pop_front();
        }

        debug!(
            session = %id,
            turn = record.turn,
            action = %record.decision.action,
            scene = %record.decision.resulting_scene,
            "turn decided"
        );
        Ok(record)
    }

    /// Copy of the session's current state.
    pub fn snapshot(&self, id: SessionId) -> Result<SessionState, SessionError> {
        let entry = self.entry(id)?;
        let entry = entry.lock().map_err(|_| SessionError::LockPoisoned(id))?;
        Ok(entry.state.clone())
    }

    /// The last [`HISTORY_LIMIT`] turns, oldest first.
    pub fn history(&self, id: SessionId) -> Result<Vec<TurnRecord>, SessionError> {
        let entry = self.entry(id)?;
        let entry = entry.lock().map_err(|_| SessionError::LockPoisoned(id))?;
        Ok(entry.history.iter().cloned().collect())
    }

    /// Turns decided since the session opened, including dropped records.
    pub fn turn_count(&self, id: SessionId) -> Result<u64, SessionError> {
        let entry = self.entry(id)?;
        let entry = entry.lock().map_err(|_| SessionError::LockPoisoned(id))?;
        Ok(entry.turns)
    }

    /// End a conversation, returning its final state.
    pub fn close(&self, id: SessionId) -> Result<SessionState, SessionError> {
        let entry = self
            .sessions
            .lock()
            .map_err(|_| SessionError::RegistryPoisoned)?
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;
        let entry = entry.lock().map_err(|_| SessionError::LockPoisoned(id))?;
        debug!(session = %id, turns = entry.turns, "session closed");
        Ok(entry.state.clone())
    }

    pub fn len(&self) -> Result<usize, SessionError> {
        Ok(self
            .sessions
            .lock()
            .map_err(|_| SessionError::RegistryPoisoned)?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.len()? == 0)
    }

    fn entry(&self, id: SessionId) -> Result<SharedEntry, SessionError> {
        self.sessions
            .lock()
            .map_err(|_| SessionError::RegistryPoisoned)?
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }
}
