//! Core ChainMonitor implementation

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::detector::CompletionSignalDetector;
use crate::error::ChainError;
use crate::terminal::TerminalChannel;
use crate::workflow::WorkflowChain;

use super::buffer::unseen_lines;
use super::config::MonitorConfig;
use super::dispatch::{RetryingDispatcher, StopHandle};
use super::events::{ChainEvent, ChainOutcome, RunSummary};
use super::state::{ChainRunState, MonitorState, StageExecution};

/// Longest single sleep in `run`, so stop requests are noticed promptly
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Drives one chain against one session.
///
/// Every poll runs to completion, dispatch retries included, before the next
/// one can start, so at most one stage transition happens at a time.
pub struct ChainMonitor {
    chain: WorkflowChain,
    channel: Arc<dyn TerminalChannel>,
    session: String,
    config: MonitorConfig,
    detector: CompletionSignalDetector,
    dispatcher: RetryingDispatcher,
    state: MonitorState,
    run: ChainRunState,
    outcome: Option<ChainOutcome>,
    stop: StopHandle,
}

impl ChainMonitor {
    pub fn new(
        chain: WorkflowChain,
        channel: Arc<dyn TerminalChannel>,
        session: impl Into<String>,
        config: MonitorConfig,
    ) -> Self {
        let run = ChainRunState::new(chain.first_keyword(), config.buffer_capacity);
        Self {
            dispatcher: RetryingDispatcher::new(config.retry_attempts, config.retry_delay),
            detector: CompletionSignalDetector::default(),
            chain,
            channel,
            session: session.into(),
            config,
            state: MonitorState::Idle,
            run,
            outcome: None,
            stop: StopHandle::default(),
        }
    }

    pub fn with_detector(mut self, detector: CompletionSignalDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Share a stop handle created elsewhere (e.g. before a signal handler
    /// was installed).
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn run_state(&self) -> &ChainRunState {
        &self.run
    }

    pub fn outcome(&self) -> Option<&ChainOutcome> {
        self.outcome.as_ref()
    }

    /// Handle that stops this monitor from another thread
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn start(&mut self) -> Result<Vec<ChainEvent>, ChainError> {
        self.start_at(Instant::now())
    }

    /// Begin polling, with `now` as the reference for the timeout.
    /// Performs the first poll immediately.
    pub fn start_at(&mut self, now: Instant) -> Result<Vec<ChainEvent>, ChainError> {
        match self.state {
            MonitorState::Idle => {}
            MonitorState::Active => return Err(ChainError::AlreadyActive),
            finished => return Err(ChainError::AlreadyFinished(finished)),
        }

        self.run.started_at = Some(now);
        self.run.started_at_utc = Some(Utc::now());
        self.transition(MonitorState::Active);
        info!(
            session = %self.session,
            stages = self.chain.len(),
            keyword = %self.run.current_keyword,
            "chain monitor started"
        );

        let mut events = vec![ChainEvent::Started];
        events.extend(self.poll_at(now));
        Ok(events)
    }

    /// Stop polling. Does nothing unless the monitor is active.
    pub fn stop(&mut self) -> Vec<ChainEvent> {
        if self.state != MonitorState::Active {
            return Vec::new();
        }
        self.stop.request_stop();
        info!(session = %self.session, "chain monitor stopped");
        vec![self.finish(ChainOutcome::Stopped)]
    }

    pub fn poll(&mut self) -> Vec<ChainEvent> {
        self.poll_at(Instant::now())
    }

    /// One poll cycle: timeout check, read, detect, and at most one stage.
    pub fn poll_at(&mut self, now: Instant) -> Vec<ChainEvent> {
        if self.state != MonitorState::Active {
            return Vec::new();
        }
        if self.stop.is_stop_requested() {
            return self.stop();
        }

        self.run.poll_count += 1;

        let elapsed = self
            .run
            .started_at
            .map_or(Duration::ZERO, |start| now.saturating_duration_since(start));
        if elapsed > self.config.timeout {
            let completed_stages = self.run.completed_stages();
            warn!(
                session = %self.session,
                completed_stages,
                total_stages = self.chain.len(),
                "chain timed out"
            );
            return vec![self.finish(ChainOutcome::TimedOut {
                completed_stages,
                total_stages: self.chain.len(),
            })];
        }

        let capture = match self.channel.read(&self.session, self.config.capture_lines) {
            Ok(capture) => capture,
            Err(e) => {
                let detail = ChainError::ChannelRead(format!("{e:#}")).to_string();
                warn!(session = %self.session, error = %detail, "read failed, will retry next poll");
                return vec![ChainEvent::Error { detail }];
            }
        };
        self.ingest(&capture);

        let keyword = self.run.current_keyword.clone();
        let Some(offset) = self.find_signal(&keyword) else {
            return Vec::new();
        };
        if !self.run.is_new_match(&keyword, offset) {
            return Vec::new();
        }
        self.run.consume(&keyword, offset);

        let stage_index = self.run.current_stage_index;
        if self.run.has_executed(&keyword, stage_index) {
            debug!(keyword = %keyword, stage_index, "stage already executed, ignoring");
            return Vec::new();
        }

        debug!(keyword = %keyword, stage_index, offset, "completion signal detected");
        self.execute_stage(stage_index)
    }

    /// Drive the chain until it reaches a terminal state, passing every event
    /// to `sink` in order.
    pub fn run(&mut self, mut sink: impl FnMut(&ChainEvent)) -> Result<ChainOutcome, ChainError> {
        for event in self.start()? {
            sink(&event);
        }

        while self.state == MonitorState::Active {
            self.wait_for_next_poll();
            for event in self.poll() {
                sink(&event);
            }
        }

        Ok(self.outcome.clone().unwrap_or(ChainOutcome::Stopped))
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            session: self.session.clone(),
            total_stages: self.chain.len(),
            executed_stages: self.run.executed_stages.clone(),
            started_at: self.run.started_at_utc,
            poll_count: self.run.poll_count,
            elapsed: self
                .run
                .started_at
                .map_or(Duration::ZERO, |start| start.elapsed()),
            outcome: self.outcome.clone(),
        }
    }

    fn wait_for_next_poll(&self) {
        let deadline = Instant::now() + self.config.poll_interval;
        while !self.stop.is_stop_requested() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(STOP_CHECK_INTERVAL));
        }
    }

    fn ingest(&mut self, capture: &str) {
        let fresh = unseen_lines(&self.run.last_capture, capture);
        if !fresh.is_empty() {
            debug!(lines = fresh.len(), "new session output");
            self.run.output.append_lines(fresh);
        }
        self.run.last_capture = capture.lines().map(str::to_string).collect();
    }

    fn find_signal(&self, keyword: &str) -> Option<usize> {
        let window = &self.run.output;
        self.detector
            .find_last_signal(window.as_str(), keyword)
            .map(|at| window.start_offset() + at)
    }

    fn execute_stage(&mut self, stage_index: usize) -> Vec<ChainEvent> {
        let Some(stage) = self.chain.stage(stage_index).cloned() else {
            return Vec::new();
        };

        self.run.executed_stages.push(StageExecution {
            keyword: stage.trigger_keyword.clone(),
            stage_index,
            executed_at: Utc::now(),
            attempts: 0,
            dispatched: false,
        });

        let result = self.dispatcher.dispatch(
            self.channel.as_ref(),
            &self.session,
            &stage.instruction,
            &self.stop,
        );

        let attempts = match result {
            Ok(attempts) => attempts,
            Err(ChainError::DispatchCancelled) => {
                return vec![self.finish(ChainOutcome::Stopped)];
            }
            Err(e) => {
                warn!(keyword = %stage.trigger_keyword, error = %e, "stage dispatch failed");
                return vec![self.finish(ChainOutcome::Failed {
                    keyword: stage.trigger_keyword,
                    instruction: stage.instruction,
                    error: e.to_string(),
                })];
            }
        };

        if let Some(execution) = self.run.executed_stages.last_mut() {
            execution.attempts = attempts;
            execution.dispatched = true;
        }
        info!(keyword = %stage.trigger_keyword, stage_index, attempts, "stage executed");

        let mut events = vec![ChainEvent::StageExecuted {
            keyword: stage.trigger_keyword.clone(),
            stage_index,
        }];

        match stage.next_keyword {
            Some(next) => {
                self.run.current_stage_index =
                    self.chain.index_of(&next).unwrap_or(stage_index + 1);
                // Output seen before the instruction went out cannot answer it.
                if let Some(last) = self.run.output.end_offset().checked_sub(1) {
                    self.run.consume(&next, last);
                }
                self.run.current_keyword = next;
            }
            None => {
                info!(session = %self.session, "chain complete");
                events.push(self.finish(ChainOutcome::Complete {
                    total_stages: self.chain.len(),
                }));
            }
        }

        events
    }

    /// Enter a terminal state and produce its one and only event.
    fn finish(&mut self, outcome: ChainOutcome) -> ChainEvent {
        let next = match &outcome {
            ChainOutcome::Complete { .. } => MonitorState::Complete,
            ChainOutcome::Failed { .. } => MonitorState::Failed,
            ChainOutcome::TimedOut { .. } => MonitorState::TimedOut,
            ChainOutcome::Stopped => MonitorState::Stopped,
        };
        self.transition(next);
        let event = ChainEvent::from(&outcome);
        self.outcome = Some(outcome);
        event
    }

    fn transition(&mut self, next: MonitorState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid monitor transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }
}
