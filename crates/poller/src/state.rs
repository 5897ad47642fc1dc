/// Counters the poller carries across ticks.
///
/// Owned exclusively by one [`ReadinessPoller`](crate::ReadinessPoller) for
/// its lifetime and discarded when the poll finishes. The stored counts are
/// compared against fresh queries to detect structural growth, so they are
/// baselines, not absolute truths.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    /// Ticks that reached the give-up policy, incremented there.
    pub retry_count: u32,
    /// List-container count observed on the previous tick.
    pub last_list_count: usize,
    /// Item-element count observed on the previous tick.
    pub last_item_count: usize,
}
