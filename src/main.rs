use anyhow::Result;
use chainwatch::commands::{detect, run, validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chainwatch")]
#[command(about = "Chain instructions through an agent session by watching for completion keywords", long_about = None)]
#[command(version)]
struct Cli {
    /// Print diagnostic logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow against an agent session
    Run {
        /// Path to the workflow JSON file
        workflow: PathBuf,

        /// Task substituted for {{TASK}} (defaults to the workflow's taskDescription)
        #[arg(short, long)]
        task: Option<String>,

        /// Attach to an existing tmux session instead of spawning one
        #[arg(short, long)]
        session: Option<String>,

        /// Working directory for a spawned session (default: current directory)
        #[arg(short, long)]
        workdir: Option<PathBuf>,

        /// Agent command launched in a spawned session
        #[arg(long)]
        agent: Option<String>,

        /// Signal rules TOML file
        #[arg(long)]
        signals: Option<PathBuf>,

        /// Seconds between polls (overrides the workflow)
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Total timeout in seconds (overrides the workflow)
        #[arg(long)]
        timeout: Option<u64>,

        /// Emit events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Check a workflow file and print its chain
    Validate {
        /// Path to the workflow JSON file
        workflow: PathBuf,
    },

    /// Test which lines count as a completion signal for a keyword
    Detect {
        /// Keyword to look for
        #[arg(short, long)]
        keyword: String,

        /// Signal rules TOML file
        #[arg(long)]
        signals: Option<PathBuf>,

        /// Lines to classify (reads stdin when omitted)
        lines: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    chainwatch::logging::init(cli.verbose);

    match cli.command {
        Commands::Run {
            workflow,
            task,
            session,
            workdir,
            agent,
            signals,
            poll_interval,
            timeout,
            json,
        } => run::execute(run::RunArgs {
            workflow,
            task,
            session,
            workdir,
            agent,
            signals,
            poll_interval,
            timeout,
            json,
        }),
        Commands::Validate { workflow } => validate::execute(&workflow),
        Commands::Detect {
            keyword,
            signals,
            lines,
        } => detect::execute(&keyword, lines, signals.as_deref()).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::try_parse_from([
            "chainwatch",
            "run",
            "flow.json",
            "--task",
            "add tests",
            "--timeout",
            "60",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run { task, timeout, .. } => {
                assert_eq!(task.as_deref(), Some("add tests"));
                assert_eq!(timeout, Some(60));
            }
            _ => panic!("expected run"),
        }
    }
}
