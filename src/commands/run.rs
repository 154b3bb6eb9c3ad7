//! Run command - drives a workflow chain inside an agent session

use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::detector::{CompletionSignalDetector, SignalRules};
use crate::monitor::{
    ChainEvent, ChainMonitor, ChainOutcome, MonitorConfig, RetryingDispatcher, RunSummary,
    StopHandle,
};
use crate::terminal::{TerminalChannel, TmuxChannel};
use crate::workflow::{WorkflowDefinition, WorkflowOptions};

/// Delay between spawning a session and typing the first prompt
const AGENT_STARTUP_DELAY: Duration = Duration::from_secs(3);

/// Arguments for `chainwatch run`
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub workflow: PathBuf,
    pub task: Option<String>,
    pub session: Option<String>,
    pub workdir: Option<PathBuf>,
    pub agent: Option<String>,
    pub signals: Option<PathBuf>,
    pub poll_interval: Option<u64>,
    pub timeout: Option<u64>,
    pub json: bool,
}

/// Load a workflow, attach to (or spawn) a session, send the initial prompt,
/// and monitor the chain until it finishes.
pub fn execute(args: RunArgs) -> Result<()> {
    let definition = WorkflowDefinition::load(&args.workflow)?;
    let task = resolve_task(args.task.as_deref(), &definition)?;
    let chain = definition.instantiate(&task)?;
    let config = MonitorConfig::from(apply_overrides(definition.options(), &args));

    let detector = CompletionSignalDetector::new(SignalRules::resolve(args.signals.as_deref())?)?;

    let mut channel = TmuxChannel::new()?.with_history(config.capture_lines);
    if let Some(agent) = &args.agent {
        channel = channel.with_agent_command(agent.clone());
    }
    let channel: Arc<dyn TerminalChannel> = Arc::new(channel);

    let session = match &args.session {
        Some(name) => {
            if !channel.exists(name)? {
                bail!("Session '{name}' does not exist");
            }
            name.clone()
        }
        None => {
            let workdir = match &args.workdir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir().context("Failed to resolve working directory")?,
            };
            let name = channel.spawn(&workdir)?;
            if !args.json {
                println!("{} Spawned session {}", "✓".green(), name.cyan());
            }
            std::thread::sleep(AGENT_STARTUP_DELAY);
            name
        }
    };

    let stop = StopHandle::default();
    install_interrupt_handler(stop.clone());

    if let Some(prompt) = chain.initial_prompt() {
        let dispatcher = RetryingDispatcher::new(config.retry_attempts, config.retry_delay);
        dispatcher
            .dispatch(channel.as_ref(), &session, prompt, &stop)
            .context("Failed to send initial prompt")?;
        info!(session = %session, "initial prompt sent");
    }

    if !args.json {
        println!(
            "{} Watching {} for {} ({} stage(s))",
            "→".cyan().bold(),
            session.cyan(),
            chain.first_keyword().bold(),
            chain.len()
        );
    }

    let json = args.json;
    let mut monitor = ChainMonitor::new(chain, channel, session, config)
        .with_detector(detector)
        .with_stop_handle(stop);

    let outcome = monitor.run(|event| print_event(event, json))?;
    print_summary(&monitor.summary(), json)?;

    if outcome.is_success() {
        Ok(())
    } else {
        bail!("Chain did not complete: {}", describe_outcome(&outcome))
    }
}

fn resolve_task(explicit: Option<&str>, definition: &WorkflowDefinition) -> Result<String> {
    explicit
        .map(str::to_string)
        .or_else(|| definition.task_description.clone())
        .filter(|task| !task.trim().is_empty())
        .ok_or_else(|| anyhow!("No task given: pass --task or set taskDescription"))
}

fn apply_overrides(mut options: WorkflowOptions, args: &RunArgs) -> WorkflowOptions {
    if let Some(secs) = args.poll_interval {
        options.poll_interval = secs.max(1);
    }
    if let Some(secs) = args.timeout {
        options.timeout = secs.max(1);
    }
    options
}

fn install_interrupt_handler(stop: StopHandle) {
    if let Err(e) = ctrlc::set_handler(move || stop.request_stop()) {
        warn!(error = %e, "could not install interrupt handler");
    }
}

fn print_event(event: &ChainEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "failed to serialize event"),
        }
        return;
    }
    if let Some(line) = render_event(event) {
        println!("{line}");
    }
}

fn render_event(event: &ChainEvent) -> Option<String> {
    let line = match event {
        ChainEvent::Started => return None,
        ChainEvent::StageExecuted {
            keyword,
            stage_index,
        } => format!(
            "{} Stage {} triggered by {}",
            "✓".green(),
            stage_index + 1,
            keyword.cyan()
        ),
        ChainEvent::ChainComplete { total_stages } => format!(
            "{} Chain complete ({total_stages} stage(s))",
            "✓".green().bold()
        ),
        ChainEvent::ChainFailed {
            keyword, error, ..
        } => format!("{} Stage {} failed: {error}", "✗".red().bold(), keyword.cyan()),
        ChainEvent::TimedOut {
            completed_stages,
            total_stages,
        } => format!(
            "{} Timed out after {completed_stages}/{total_stages} stage(s)",
            "⏱".yellow().bold()
        ),
        ChainEvent::Stopped => format!("{} Stopped", "■".yellow()),
        ChainEvent::Error { detail } => format!("{} {}", "!".yellow(), detail.dimmed()),
    };
    Some(line)
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }

    println!("{}", "─".repeat(40).dimmed());
    if let Some(started_at) = summary.started_at {
        println!(
            "Started {}",
            started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
        );
    }
    println!(
        "Session {}: {}/{} stage(s) in {}s over {} poll(s)",
        summary.session.cyan(),
        summary.executed_stages.iter().filter(|s| s.dispatched).count(),
        summary.total_stages,
        summary.elapsed.as_secs(),
        summary.poll_count
    );
    Ok(())
}

fn describe_outcome(outcome: &ChainOutcome) -> String {
    match outcome {
        ChainOutcome::Complete { .. } => "complete".to_string(),
        ChainOutcome::Failed { keyword, error, .. } => format!("stage {keyword} failed: {error}"),
        ChainOutcome::TimedOut { .. } => "timed out".to_string(),
        ChainOutcome::Stopped => "stopped".to_string(),
    }
}
