use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::page::Page;
use futures::StreamExt;
use quiesce_core::{DomQuery, ElementInfo, PollError};
use serde_json::json;

use crate::js;

/// Launches a Chromium instance with a throwaway profile directory and
/// drains its event handler on a background task.
pub async fn launch(headless: bool) -> Result<Browser, PollError> {
    let temp_dir = std::env::temp_dir().join(format!("quiesce-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&temp_dir)
        .map_err(|e| PollError::browser_error(format!("Failed to create profile dir: {}", e)))?;

    let config = BrowserConfig::builder()
        .headless_mode(if headless { HeadlessMode::True } else { HeadlessMode::False })
        .user_data_dir(temp_dir)
        .build()
        .map_err(|e| PollError::browser_error(format!("Config failed: {}", e)))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| PollError::browser_error(format!("Launch failed: {}", e)))?;

    tokio::spawn(async move { while handler.next().await.is_some() {} });
    Ok(browser)
}

/// Live-browser document source over a DevTools page session.
///
/// Every query evaluates a JS snippet in the page, so each tick observes
/// the DOM as it currently stands. Evaluation failure (navigation tore the
/// context down, page crashed) is fatal to the poll.
pub struct LiveDocument {
    page: Page,
}

impl LiveDocument {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn evaluate(&self, call: String) -> Result<serde_json::Value, PollError> {
        let result = self
            .page
            .evaluate(call)
            .await
            .map_err(|e| PollError::script_error(format!("Evaluation failed: {}", e)))?;
        result
            .value()
            .cloned()
            .ok_or_else(|| PollError::script_error("evaluation produced no value"))
    }
}

#[async_trait]
impl DomQuery for LiveDocument {
    async fn elements(&self) -> Result<Vec<ElementInfo>, PollError> {
        let value = self
            .evaluate(js::build_js_call(js::COLLECT_ELEMENTS, &[]))
            .await?;
        serde_json::from_value(value)
            .map_err(|e| PollError::parsing_error(format!("bad element snapshot: {}", e)))
    }

    async fn count(&self, selector: &str) -> Result<usize, PollError> {
        let value = self
            .evaluate(js::build_js_call(js::COUNT_MATCHING, &[json!(selector)]))
            .await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| {
                PollError::script_error("selector count was not a number")
                    .with_context(json!({ "selector": selector }))
            })
    }
}
