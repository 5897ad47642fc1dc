pub mod config;
pub mod poller;
pub mod rules;
pub mod state;
pub mod termination;

pub use config::PollerConfig;
pub use poller::{PollOutcome, ReadinessPoller, Tick, Ticker, TokioTicker};
pub use rules::LoadingRules;
pub use state::PollState;
pub use termination::{GiveUpPolicy, StopReason};
