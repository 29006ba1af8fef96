//! SceneGate launcher
//!
//! - `repl`: interactive session against the configured classifier
//! - `decide`: one turn from a raw classifier payload and a state file
//! - `eval`: replay a labeled dataset and report accuracy
//! - `config`: show resolved configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use scenegate_logging::{init_logging, LogConfig};
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "scenegate", version, about = "Scene routing guardrails for conversational agents")]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive session: each line is one user turn
    Repl(cli::repl::ReplArgs),

    /// Decide a single turn from a raw classifier payload
    Decide(cli::decide::DecideArgs),

    /// Evaluate routing accuracy against a labeled dataset
    Eval(cli::eval::EvalArgs),

    /// Show resolved configuration
    Config(cli::config::ConfigArgs),
}

impl Commands {
    fn wants_json(&self) -> bool {
        match self {
            Commands::Repl(args) => args.json,
            Commands::Decide(args) => args.json,
            Commands::Eval(args) => args.json,
            Commands::Config(args) => args.json,
        }
    }
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Repl(args) => cli::repl::run(args),
        Commands::Decide(args) => cli::decide::run(args),
        Commands::Eval(args) => cli::eval::run(args),
        Commands::Config(args) => cli::config::run(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.command.wants_json();

    // The REPL owns the terminal; keep stderr logging to warnings there.
    let interactive = matches!(cli.command, Commands::Repl(_));
    if let Err(err) = init_logging(LogConfig {
        app_name: "scenegate",
        verbose: cli.verbose,
        interactive,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else if err.downcast_ref::<cli::error::HelpfulError>().is_some() {
                eprint!("{}", err);
            } else {
                eprintln!("Error: {:#}", err);
            }
            ExitCode::from(1)
        }
    }
}
