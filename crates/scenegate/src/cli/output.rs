//! Output formatting for CLI commands

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use scenegate_intent::{ClassificationResult, Decision, SessionState};

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

/// Render a fraction as "xx.x%"
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Shorten text to `max` characters, marking the cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

pub fn describe_state(state: &SessionState) -> String {
    match &state.pending_switch {
        Some(pending) => format!(
            "scene={} pending={} (age {})",
            state.active_scene, pending.target_scene, pending.age_turns
        ),
        None => format!("scene={} pending=none", state.active_scene),
    }
}

pub fn describe_classification(result: &ClassificationResult) -> String {
    let mut line = format!(
        "intent={} score={} tier={}",
        result.intent, result.score(), result.confidence_tier()
    );
    if !result.slots.is_empty() {
        line.push_str(&format!(" slots={}", serde_json::Value::Object(result.slots.clone())));
    }
    if !result.rationale.is_empty() {
        line.push_str(&format!(" reason=\"{}\"", truncate(&result.rationale, 80)));
    }
    line
}

pub fn describe_decision(decision: &Decision) -> String {
    let mut line = format!(
        "action={} handled_by={} now_in={}",
        decision.action, decision.handling_scene, decision.resulting_scene
    );
    if !decision.slots.is_empty() {
        line.push_str(&format!(" slots={}", serde_json::Value::Object(decision.slots.clone())));
    }
    line
}
