use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Snapshot of a single element as reported by a document source.
///
/// Sources hand the poller pre-split class tokens; a missing `class` or
/// `src` attribute is an empty list / `None`, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Tag name, lowercase.
    pub tag: String,
    /// Whitespace-split class-name tokens.
    pub classes: Vec<String>,
    /// Resource URL (e.g. an image `src`), if the element carries one.
    pub src: Option<String>,
}

impl ElementInfo {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: vec![],
            src: None,
        }
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }
}

/// Read-only view of the document under observation.
///
/// The poller re-queries on every tick; implementations must answer from
/// live state, not a cached parse. The poller never mutates the document.
#[async_trait]
pub trait DomQuery: Send + Sync {
    /// Every element in the document, in document order.
    async fn elements(&self) -> Result<Vec<ElementInfo>, PollError>;

    /// Number of elements matching a CSS selector list (e.g. `"ul, ol"`).
    async fn count(&self, selector: &str) -> Result<usize, PollError>;
}

/// Error categories for better error handling and recovery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Document source failed to answer a query (e.g. detached document)
    Query,
    /// Network-related errors (timeouts, connection failures)
    Network,
    /// Parsing errors (HTML/selectors/patterns)
    Parsing,
    /// JavaScript execution errors
    ScriptExecution,
    /// Browser/driver errors
    Browser,
    /// Operation not valid in the poller's current phase
    InvalidState,
    /// Unknown or uncategorized errors
    Unknown,
}

/// Structured error with context for better debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollError {
    /// Error category for programmatic handling
    pub category: ErrorCategory,
    /// Human-readable error message
    pub message: String,
    /// Optional context (selector, URL, phase, etc.)
    pub context: serde_json::Value,
}

impl PollError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            context: serde_json::json!({}),
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }

    // Convenience constructors
    pub fn query_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Query, message)
    }

    pub fn fetch_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Network, message)
    }

    pub fn parsing_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Parsing, message)
    }

    pub fn script_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ScriptExecution, message)
    }

    pub fn browser_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Browser, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InvalidState, message)
    }
}

impl std::fmt::Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.category, self.message)
    }
}

impl std::error::Error for PollError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_info_defaults_are_signal_absent() {
        let el = ElementInfo::new("div");
        assert!(el.classes.is_empty());
        assert!(el.src.is_none());
    }

    #[test]
    fn error_display_includes_category() {
        let err = PollError::parsing_error("bad selector")
            .with_context(serde_json::json!({ "selector": "ul,," }));
        assert_eq!(err.to_string(), "[Parsing] bad selector");
        assert_eq!(err.context["selector"], "ul,,");
    }
}
