use tokio::time::Instant;
use tracing::debug;

use crate::config::PollerConfig;
use crate::state::PollState;

/// Which budget ran out first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    RetriesExhausted,
    DeadlineExceeded,
}

/// Bounds retrying independently of the loading signals.
///
/// Consulted only on ticks where the rules still report "loading". The
/// retry rule runs first and increments the counter; the deadline rule is
/// only reached when the retry rule allowed another round.
pub struct GiveUpPolicy {
    max_retries: u32,
    deadline: Option<Instant>,
}

impl GiveUpPolicy {
    pub fn new(config: &PollerConfig, start: Instant) -> Self {
        let deadline = if config.max_duration.is_zero() {
            None
        } else {
            Some(start + config.max_duration)
        };
        Self {
            max_retries: config.max_retries,
            deadline,
        }
    }

    /// Charges one retry and reports whether a budget is exhausted.
    /// `None` means keep polling.
    pub fn evaluate(&self, state: &mut PollState, now: Instant) -> Option<StopReason> {
        state.retry_count += 1;
        if self.max_retries != 0 && state.retry_count > self.max_retries {
            debug!(retries = state.retry_count, "retry budget exhausted");
            return Some(StopReason::RetriesExhausted);
        }
        if let Some(deadline) = self.deadline {
            if now > deadline {
                debug!(retries = state.retry_count, "deadline exceeded");
                return Some(StopReason::DeadlineExceeded);
            }
        }
        None
    }
}
