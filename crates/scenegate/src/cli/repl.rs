//! Interactive session: one classifier call and one guardrail decision per line.

use anyhow::{Context, Result};
use scenegate::classify_turn;
use scenegate::ClassifierSource;
use scenegate_intent::{Scene, SessionStore, TurnRecord};
use std::io::{BufRead, Write};
use tokio::runtime::Runtime;
use tracing::info;

use super::output::{describe_classification, describe_decision, describe_state};
use super::{runtime, ClassifierArgs};

#[derive(Debug, clap::Args)]
pub struct ReplArgs {
    #[command(flatten)]
    pub classifier: ClassifierArgs,

    /// Print each decided turn as a JSON line instead of the human view
    #[arg(long)]
    pub json: bool,
}

/// Workflow that would handle a turn routed to `scene`
pub fn workflow_name(scene: Scene) -> &'static str {
    match scene {
        Scene::Chat => "ChatWorkflow",
        Scene::Recite => "ReciteWorkflow",
        Scene::Homework => "HomeworkWorkflow",
    }
}

fn is_quit(line: &str) -> bool {
    line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit")
}

pub fn run(args: ReplArgs) -> Result<()> {
    let config = args.classifier.resolve()?;
    let source = config.classifier_source();
    let rt = runtime()?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let summary = run_session(&rt, &source, stdin.lock(), stdout.lock(), args.json)?;
    info!("REPL session ended after {} turns", summary.turns);
    Ok(())
}

/// How a REPL session ended
#[derive(Debug)]
pub struct SessionSummary {
    pub turns: u64,
    /// Most recent turns, bounded by the store's history limit
    pub recent: Vec<TurnRecord>,
}

/// Drive one session from `input` until EOF or `quit`/`exit`.
pub fn run_session<R: BufRead, W: Write>(
    rt: &Runtime,
    source: &ClassifierSource,
    input: R,
    mut out: W,
    json: bool,
) -> Result<SessionSummary> {
    let store = SessionStore::new();
    let id = store.open()?;
    info!(session = %id, classifier = %source.describe(), "REPL session started");

    if !json {
        writeln!(out, "SCENEGATE REPL")?;
        writeln!(out, "==============")?;
        writeln!(out, "Classifier: {}", source.describe())?;
        writeln!(out, "Type 'quit' or 'exit' to leave.")?;
    }

    let mut lines = input.lines();
    loop {
        let state = store.snapshot(id)?;
        if !json {
            writeln!(out)?;
            writeln!(out, "[{}]", describe_state(&state))?;
            write!(out, "> ")?;
            out.flush()?;
        }

        let line = match lines.next() {
            Some(line) => line.context("Failed to read input")?,
            None => break,
        };
        let line = line.trim();
        if is_quit(line) {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let classification = rt.block_on(classify_turn(source, line, &state));
        let record = store.run_turn(id, &classification)?;

        if json {
            writeln!(out, "{}", serde_json::to_string(&record)?)?;
        } else {
            writeln!(out, "  classification: {}", describe_classification(&record.classification))?;
            writeln!(out, "  decision:       {}", describe_decision(&record.decision))?;
            writeln!(
                out,
                "  -> {} handles this turn",
                workflow_name(record.decision.handling_scene)
            )?;
        }
    }

    let summary = SessionSummary {
        turns: store.turn_count(id)?,
        recent: store.history(id)?,
    };
    store.close(id)?;
    if !json {
        writeln!(out)?;
        writeln!(out, "Bye.")?;
    }
    Ok(summary)
}
