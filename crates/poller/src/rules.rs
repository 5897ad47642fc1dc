use quiesce_core::{DomQuery, PollError};
use regex::{RegexSet, RegexSetBuilder};
use tracing::debug;

use crate::config::PollerConfig;
use crate::state::PollState;

/// The heuristic "is the page still loading?" rule set.
///
/// Four signals, evaluated against a fresh document query on every call:
/// a loading class marker, a spinner image URL, and growth of the
/// list-container and item-element counts since the previous tick.
#[derive(Debug)]
pub struct LoadingRules {
    class_patterns: RegexSet,
    url_patterns: RegexSet,
    list_selector: String,
    item_selector: String,
}

impl LoadingRules {
    /// Compiles the configured patterns. A malformed pattern is a
    /// configuration error, reported before any polling starts.
    pub fn new(config: &PollerConfig) -> Result<Self, PollError> {
        Ok(Self {
            class_patterns: compile(&config.loading_class_patterns)?,
            url_patterns: compile(&config.loading_url_patterns)?,
            list_selector: config.joined_list_selectors(),
            item_selector: config.joined_item_selectors(),
        })
    }

    /// True if any element carries a class token matching a loading pattern.
    pub async fn class_marker(&self, doc: &dyn DomQuery) -> Result<bool, PollError> {
        for el in doc.elements().await? {
            if el.classes.iter().any(|c| self.class_patterns.is_match(c)) {
                debug!(tag = %el.tag, classes = ?el.classes, "loading class marker");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True if any element's resource URL looks like a spinner image.
    pub async fn spinner_image(&self, doc: &dyn DomQuery) -> Result<bool, PollError> {
        for el in doc.elements().await? {
            if let Some(src) = &el.src {
                if self.url_patterns.is_match(src) {
                    debug!(tag = %el.tag, src = %src, "spinner image");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// True if the list-container count changed since the previous tick.
    /// The stored count is updated unconditionally after the comparison.
    pub async fn list_growth(
        &self,
        doc: &dyn DomQuery,
        state: &mut PollState,
    ) -> Result<bool, PollError> {
        let count = doc.count(&self.list_selector).await?;
        let changed = count != state.last_list_count;
        if changed {
            debug!(was = state.last_list_count, now = count, "list count changed");
        }
        state.last_list_count = count;
        Ok(changed)
    }

    /// True if the item-element count changed since the previous tick.
    pub async fn item_growth(
        &self,
        doc: &dyn DomQuery,
        state: &mut PollState,
    ) -> Result<bool, PollError> {
        let count = doc.count(&self.item_selector).await?;
        let changed = count != state.last_item_count;
        if changed {
            debug!(was = state.last_item_count, now = count, "item count changed");
        }
        state.last_item_count = count;
        Ok(changed)
    }

    /// Union of all rules: still loading if any rule says so.
    ///
    /// Every rule runs on every tick. The growth rules update their stored
    /// counts as a side effect, and those updates must happen even when an
    /// earlier rule already reported "loading".
    pub async fn evaluate(
        &self,
        doc: &dyn DomQuery,
        state: &mut PollState,
    ) -> Result<bool, PollError> {
        let class = self.class_marker(doc).await?;
        let image = self.spinner_image(doc).await?;
        let lists = self.list_growth(doc, state).await?;
        let items = self.item_growth(doc, state).await?;
        Ok(class || image || lists || items)
    }
}

fn compile(patterns: &[String]) -> Result<RegexSet, PollError> {
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .build()
        .map_err(|e| {
            PollError::parsing_error(format!("invalid loading pattern: {}", e))
                .with_context(serde_json::json!({ "patterns": patterns }))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiesce_core::ErrorCategory;
    use quiesce_dom::StaticDocument;

    fn rules() -> LoadingRules {
        LoadingRules::new(&PollerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn class_marker_matches_case_insensitively() {
        let doc = StaticDocument::new(r#"<div class="spacer isLoading">wait</div>"#);
        assert!(rules().class_marker(&doc).await.unwrap());
    }

    #[tokio::test]
    async fn class_marker_requires_token_prefix() {
        // "reloading" does not start with "loading"
        let doc = StaticDocument::new(r#"<div class="reloading done">ready</div>"#);
        assert!(!rules().class_marker(&doc).await.unwrap());
    }

    #[tokio::test]
    async fn spinner_image_matches_url_pattern() {
        let doc = StaticDocument::new(r#"<img src="/assets/Spinner.GIF">"#);
        assert!(rules().spinner_image(&doc).await.unwrap());
    }

    #[tokio::test]
    async fn spinner_image_ignores_other_images() {
        let doc = StaticDocument::new(r#"<img src="/assets/logo.png"><img src="loader.svg">"#);
        assert!(!rules().spinner_image(&doc).await.unwrap());
    }

    #[tokio::test]
    async fn missing_attributes_are_not_signals() {
        let doc = StaticDocument::new("<div><p>plain</p></div>");
        assert!(!rules().class_marker(&doc).await.unwrap());
        assert!(!rules().spinner_image(&doc).await.unwrap());
    }

    #[tokio::test]
    async fn list_growth_fires_on_first_tick_baseline() {
        let doc = StaticDocument::new("<ul><li>a</li></ul>");
        let rules = rules();
        let mut state = PollState::default();
        // baseline is 0, so the first observation of a non-empty page fires
        assert!(rules.list_growth(&doc, &mut state).await.unwrap());
        assert_eq!(state.last_list_count, 1);
        // unchanged document on the next tick
        assert!(!rules.list_growth(&doc, &mut state).await.unwrap());
    }

    #[tokio::test]
    async fn item_growth_tracks_count_changes() {
        let doc = StaticDocument::new("<ul><li>a</li><li>b</li></ul>");
        let rules = rules();
        let mut state = PollState::default();
        assert!(rules.item_growth(&doc, &mut state).await.unwrap());
        assert!(!rules.item_growth(&doc, &mut state).await.unwrap());

        doc.set_html("<ul><li>a</li><li>b</li><li>c</li></ul>");
        assert!(rules.item_growth(&doc, &mut state).await.unwrap());
        assert_eq!(state.last_item_count, 3);
    }

    #[tokio::test]
    async fn evaluate_is_a_union_of_all_rules() {
        // only the spinner rule matches: no classes, no list elements
        let doc = StaticDocument::new(r#"<img src="loading.gif">"#);
        let mut state = PollState::default();
        assert!(rules().evaluate(&doc, &mut state).await.unwrap());
    }

    #[tokio::test]
    async fn evaluate_updates_counters_even_when_a_marker_fired() {
        let doc = StaticDocument::new(r#"<div class="loading"></div><ul><li>a</li></ul>"#);
        let rules = rules();
        let mut state = PollState::default();
        assert!(rules.evaluate(&doc, &mut state).await.unwrap());
        // the marker fired, but the growth baselines were still recorded
        assert_eq!(state.last_list_count, 1);
        assert_eq!(state.last_item_count, 1);

        // marker gone, structure unchanged: nothing reports loading
        doc.set_html("<ul><li>a</li></ul>");
        assert!(!rules.evaluate(&doc, &mut state).await.unwrap());
    }

    #[test]
    fn malformed_pattern_is_a_parsing_error() {
        let config = PollerConfig::default().with_loading_class_patterns(["("]);
        let err = LoadingRules::new(&config).unwrap_err();
        assert_eq!(err.category, ErrorCategory::Parsing);
    }
}
