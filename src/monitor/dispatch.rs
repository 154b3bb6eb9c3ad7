//! Retrying instruction dispatch

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ChainError;
use crate::terminal::TerminalChannel;

/// Cloneable stop request shared between a monitor and whoever may cancel it
/// (a Ctrl-C handler, another thread).
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sends text through a channel, retrying any failure a fixed number of times.
///
/// Failures are not inspected: whatever the channel reports is treated as
/// transient until the attempts run out.
#[derive(Debug, Clone, Copy)]
pub struct RetryingDispatcher {
    attempts: u32,
    delay: Duration,
}

impl RetryingDispatcher {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Deliver `text`, returning the attempt number that succeeded.
    ///
    /// A stop request lets a pending delay finish but prevents the next attempt.
    pub fn dispatch(
        &self,
        channel: &dyn TerminalChannel,
        session: &str,
        text: &str,
        stop: &StopHandle,
    ) -> Result<u32, ChainError> {
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            if stop.is_stop_requested() {
                debug!(attempt, "stop requested, abandoning dispatch");
                return Err(ChainError::DispatchCancelled);
            }

            match channel.send(session, text) {
                Ok(()) => {
                    debug!(session, attempt, "instruction delivered");
                    return Ok(attempt);
                }
                Err(e) => {
                    last_error = format!("{e:#}");
                    warn!(
                        session,
                        attempt,
                        max_attempts = self.attempts,
                        error = %last_error,
                        "dispatch attempt failed"
                    );
                }
            }

            if attempt < self.attempts {
                std::thread::sleep(self.delay);
            }
        }

        Err(ChainError::DispatchFailure {
            attempts: self.attempts,
            last_error,
        })
    }
}
