//! Guardrails decision engine.
//!
//! `decide` is the only code that mutates [`SessionState`]. Per turn it runs,
//! in order:
//!
//! 1. TTL maintenance of the pending switch
//! 2. Exit short-circuit
//! 3. Pending-switch resolution (confirm / preempt / hold)
//! 4. Base scene-selection policy
//!
//! Every input resolves to a decision; there is no error path.

use tracing::debug;

use crate::types::{
    ClassificationResult, ConfidenceTier, Decision, Intent, PendingSwitch, Scene, SessionState,
};

/// Turns a pending switch may wait before it is discarded.
pub const PENDING_TTL_TURNS: u32 = 3;

/// Decide how to route this turn and update `state` accordingly.
pub fn decide(result: &ClassificationResult, state: &mut SessionState) -> Decision {
    age_pending_switch(state);

    if result.intent == Intent::Exit {
        state.pending_switch = None;
        state.active_scene = Scene::Chat;
        debug!(intent = %result.intent, "exit: back to chat");
        return Decision::exit();
    }

    if let Some(pending) = state.pending_switch.take() {
        match resolve_pending(result, state, pending) {
            PendingResolution::Decided(decision) => return decision,
            PendingResolution::Preempted => {
                debug!(intent = %result.intent, "pending switch preempted");
            }
        }
    }

    base_decision(result, state)
}

/// Outcome of step 3 when a pending switch is present.
enum PendingResolution {
    Decided(Decision),
    /// Pending switch dropped; continue with the base policy
    Preempted,
}

fn age_pending_switch(state: &mut SessionState) {
    let expired = match state.pending_switch.as_mut() {
        Some(pending) => {
            pending.age_turns = pending.age_turns.saturating_add(1);
            pending.age_turns > PENDING_TTL_TURNS
        }
        None => false,
    };
    if expired {
        if let Some(pending) = state.pending_switch.take() {
            debug!(
                target_scene = %pending.target_scene,
                age_turns = pending.age_turns,
                "pending switch expired"
            );
        }
    }
}

fn resolve_pending(
    result: &ClassificationResult,
    state: &mut SessionState,
    pending: PendingSwitch,
) -> PendingResolution {
    let target = pending.target_scene;
    let target_intent = target.intent();

    if result.intent == target_intent && result.confidence_tier().is_at_least_mid() {
        let mut slots = pending.slots;
        slots.extend(result.slots.iter().map(|(k, v)| (k.clone(), v.clone())));
        state.active_scene = target;
        debug!(target_scene = %target, "pending switch confirmed");
        return PendingResolution::Decided(Decision::switch_to(target, slots));
    }

    if result.intent != Intent::Continue
        && result.intent != target_intent
        && result.confidence_tier() == ConfidenceTier::High
    {
        return PendingResolution::Preempted;
    }

    debug!(
        target_scene = %target,
        age_turns = pending.age_turns,
        "holding pending switch"
    );
    state.pending_switch = Some(pending);
    PendingResolution::Decided(Decision::stay(state.active_scene))
}

fn base_decision(result: &ClassificationResult, state: &mut SessionState) -> Decision {
    let active = state.active_scene;

    let candidate = match result.intent {
        Intent::Continue => return Decision::stay(active),
        Intent::Chat | Intent::Recite | Intent::Homework => result.intent.scene(),
        // Handled by the exit short-circuit.
        Intent::Exit => None,
    };
    let Some(candidate) = candidate else {
        return Decision::stay(active);
    };

    match result.confidence_tier() {
        ConfidenceTier::High if candidate == active => {
            Decision::stay_with(active, result.slots.clone())
        }
        ConfidenceTier::High => {
            state.active_scene = candidate;
            debug!(from = %active, to = %candidate, "switching scene");
            Decision::switch_to(candidate, result.slots.clone())
        }
        ConfidenceTier::Mid if candidate != active => {
            state.pending_switch = Some(PendingSwitch::new(candidate, result.slots.clone()));
            debug!(target_scene = %candidate, "pending switch proposed");
            Decision::stay(active)
        }
        ConfidenceTier::Mid | ConfidenceTier::Low => Decision::stay(active),
    }
}
