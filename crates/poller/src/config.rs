use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-poller configuration with documented defaults.
///
/// Immutable once handed to a poller; build variations with the `with_*`
/// setters or start from a preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Delay between ticks.
    pub retry_interval: Duration,
    /// Maximum ticks that may reach the give-up policy. 0 = unlimited.
    pub max_retries: u32,
    /// Wall-clock budget measured from poller construction. 0 = unlimited.
    pub max_duration: Duration,
    /// Case-insensitive regexes matched against individual class tokens.
    pub loading_class_patterns: Vec<String>,
    /// Case-insensitive regexes matched against element resource URLs.
    pub loading_url_patterns: Vec<String>,
    /// Selectors counted by the list-growth rule.
    pub list_selectors: Vec<String>,
    /// Selectors counted by the item-growth rule.
    pub item_selectors: Vec<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(1000),
            max_retries: 22,
            max_duration: Duration::from_millis(20000),
            loading_class_patterns: vec!["^loading".into(), "^isloading".into()],
            loading_url_patterns: vec![r"(loading|spinner|loader)\.(gif|jpg|png)".into()],
            list_selectors: vec![
                "ul".into(),
                "ol".into(),
                "table".into(),
                "tbody".into(),
                "select".into(),
            ],
            item_selectors: vec!["li".into(), "tr".into(), "td".into(), "option".into()],
        }
    }
}

impl PollerConfig {
    pub fn with_retry_interval(mut self, ms: u64) -> Self {
        self.retry_interval = Duration::from_millis(ms);
        self
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_max_duration(mut self, ms: u64) -> Self {
        self.max_duration = Duration::from_millis(ms);
        self
    }

    pub fn with_loading_class_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loading_class_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_loading_url_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loading_url_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Tight cadence for pages known to settle quickly.
    pub fn fast() -> Self {
        Self {
            retry_interval: Duration::from_millis(250),
            max_retries: 22,
            max_duration: Duration::from_millis(10000),
            ..Self::default()
        }
    }

    /// Slow cadence with a generous budget for heavy pages.
    pub fn patient() -> Self {
        Self {
            retry_interval: Duration::from_millis(2000),
            max_retries: 0,
            max_duration: Duration::from_millis(60000),
            ..Self::default()
        }
    }

    /// List selectors joined into one selector list, e.g. `"ul, ol, table"`.
    pub fn joined_list_selectors(&self) -> String {
        self.list_selectors.join(", ")
    }

    pub fn joined_item_selectors(&self) -> String {
        self.item_selectors.join(", ")
    }
}
