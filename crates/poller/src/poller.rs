use async_trait::async_trait;
use quiesce_core::{DomQuery, PollError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::PollerConfig;
use crate::rules::LoadingRules;
use crate::state::PollState;
use crate::termination::{GiveUpPolicy, StopReason};

/// Delay capability between ticks. A test harness can substitute an
/// implementation that returns immediately and drive ticks itself.
#[async_trait]
pub trait Ticker: Send + Sync {
    async fn pause(&self, interval: Duration);
}

/// Default ticker backed by the tokio timer.
pub struct TokioTicker;

#[async_trait]
impl Ticker for TokioTicker {
    async fn pause(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Result of a single evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No rule reported "loading"; the callback has fired.
    Ready,
    /// Rules still report "loading" but a budget ran out; the callback has
    /// fired.
    GaveUp(StopReason),
    /// The poll was canceled; the callback is suppressed permanently.
    Canceled,
    /// Still loading, budgets allow another round.
    Pending,
}

/// Terminal result of [`ReadinessPoller::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ready,
    RetriesExhausted,
    DeadlineExceeded,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Polling,
    Done,
}

/// Polls a document for readiness and fires a completion callback exactly
/// once.
///
/// One instance drives one poll. Construction captures the start instant
/// for the deadline budget; [`tick`](Self::tick) performs one evaluation
/// cycle and [`run`](Self::run) drives ticks at the configured cadence
/// until a terminal decision. The first tick runs immediately, without an
/// initial delay.
pub struct ReadinessPoller<D: DomQuery> {
    doc: D,
    config: PollerConfig,
    rules: LoadingRules,
    policy: GiveUpPolicy,
    state: PollState,
    phase: Phase,
    callback: Option<Box<dyn FnOnce() + Send>>,
    cancel: CancellationToken,
    ticker: Box<dyn Ticker>,
}

impl<D: DomQuery> ReadinessPoller<D> {
    pub fn new(
        doc: D,
        callback: impl FnOnce() + Send + 'static,
    ) -> Result<Self, PollError> {
        Self::with_config(doc, callback, PollerConfig::default())
    }

    pub fn with_config(
        doc: D,
        callback: impl FnOnce() + Send + 'static,
        config: PollerConfig,
    ) -> Result<Self, PollError> {
        let rules = LoadingRules::new(&config)?;
        let policy = GiveUpPolicy::new(&config, Instant::now());
        Ok(Self {
            doc,
            config,
            rules,
            policy,
            state: PollState::default(),
            phase: Phase::Polling,
            callback: Some(Box::new(callback)),
            cancel: CancellationToken::new(),
            ticker: Box::new(TokioTicker),
        })
    }

    pub fn with_ticker(mut self, ticker: impl Ticker + 'static) -> Self {
        self.ticker = Box::new(ticker);
        self
    }

    /// Handle for canceling the poll from elsewhere. A canceled poll never
    /// invokes the callback.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Counters accumulated so far.
    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// One evaluation cycle. Errors from the document source abort the
    /// poll; the callback never fires in that case.
    pub async fn tick(&mut self) -> Result<Tick, PollError> {
        if self.phase == Phase::Done {
            return Err(PollError::invalid_state("poll already finished"));
        }
        if self.cancel.is_cancelled() {
            self.phase = Phase::Done;
            self.callback = None;
            return Ok(Tick::Canceled);
        }

        let loading = self.rules.evaluate(&self.doc, &mut self.state).await?;
        if !loading {
            debug!(retries = self.state.retry_count, "page looks ready");
            self.finish();
            return Ok(Tick::Ready);
        }

        if let Some(reason) = self.policy.evaluate(&mut self.state, Instant::now()) {
            warn!(?reason, retries = self.state.retry_count, "giving up while still loading");
            self.finish();
            return Ok(Tick::GaveUp(reason));
        }

        Ok(Tick::Pending)
    }

    /// Drives ticks until a terminal decision, waiting `retry_interval`
    /// between rounds. Cancellation during the wait also ends the poll
    /// without invoking the callback.
    pub async fn run(mut self) -> Result<PollOutcome, PollError> {
        loop {
            match self.tick().await? {
                Tick::Ready => return Ok(PollOutcome::Ready),
                Tick::GaveUp(StopReason::RetriesExhausted) => {
                    return Ok(PollOutcome::RetriesExhausted);
                }
                Tick::GaveUp(StopReason::DeadlineExceeded) => {
                    return Ok(PollOutcome::DeadlineExceeded);
                }
                Tick::Canceled => return Ok(PollOutcome::Canceled),
                Tick::Pending => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Ok(PollOutcome::Canceled),
                        _ = self.ticker.pause(self.config.retry_interval) => {}
                    }
                }
            }
        }
    }

    /// Terminal transition. The callback is taken out of its slot before
    /// invocation, so it cannot fire twice even if it panics.
    fn finish(&mut self) {
        self.phase = Phase::Done;
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }
}
