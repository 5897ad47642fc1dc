use async_trait::async_trait;
use quiesce_core::{DomQuery, ElementInfo, PollError};
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Selector list that failed to parse.
#[derive(Debug, Error)]
#[error("invalid selector list `{selector}`: {detail}")]
pub struct SelectorError {
    pub selector: String,
    pub detail: String,
}

impl From<SelectorError> for PollError {
    fn from(e: SelectorError) -> Self {
        let selector = e.selector.clone();
        PollError::parsing_error(e.to_string())
            .with_context(serde_json::json!({ "selector": selector }))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        detail: e.to_string(),
    })
}

fn collect_elements(doc: &Html) -> Vec<ElementInfo> {
    doc.tree
        .nodes()
        .filter_map(scraper::ElementRef::wrap)
        .map(|el| {
            let v = el.value();
            ElementInfo {
                tag: v.name().to_ascii_lowercase(),
                classes: v.classes().map(str::to_string).collect(),
                src: v.attr("src").map(str::to_string),
            }
        })
        .collect()
}

fn count_matching(doc: &Html, selector: &str) -> Result<usize, SelectorError> {
    let sel = parse_selector(selector)?;
    Ok(doc.select(&sel).count())
}

/// In-memory document over an HTML string.
///
/// The string sits behind a shared lock and is re-parsed on every query,
/// so a clone of the handle can swap content between polls the way a live
/// page mutates between ticks. This is the source test harnesses drive.
#[derive(Clone)]
pub struct StaticDocument {
    html: Arc<RwLock<String>>,
}

impl StaticDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: Arc::new(RwLock::new(html.into())),
        }
    }

    /// Replaces the document content observed by subsequent queries.
    pub fn set_html(&self, html: impl Into<String>) {
        if let Ok(mut guard) = self.html.write() {
            *guard = html.into();
        }
    }

    fn parse(&self) -> Result<Html, PollError> {
        let guard = self
            .html
            .read()
            .map_err(|_| PollError::query_error("document lock poisoned"))?;
        Ok(Html::parse_document(&guard))
    }
}

#[async_trait]
impl DomQuery for StaticDocument {
    async fn elements(&self) -> Result<Vec<ElementInfo>, PollError> {
        Ok(collect_elements(&self.parse()?))
    }

    async fn count(&self, selector: &str) -> Result<usize, PollError> {
        let doc = self.parse()?;
        Ok(count_matching(&doc, selector)?)
    }
}

/// Document source that re-fetches a URL on every query.
///
/// Suited to server-rendered pages where each poll should observe the
/// freshly served markup.
pub struct FetchedDocument {
    client: Client,
    url: String,
}

impl FetchedDocument {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn fetch(&self) -> Result<String, PollError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| fetch_error(&self.url, e))?;
        response.text().await.map_err(|e| fetch_error(&self.url, e))
    }
}

fn fetch_error(url: &str, e: reqwest::Error) -> PollError {
    PollError::fetch_error(e.to_string()).with_context(serde_json::json!({ "url": url }))
}

#[async_trait]
impl DomQuery for FetchedDocument {
    async fn elements(&self) -> Result<Vec<ElementInfo>, PollError> {
        let html = self.fetch().await?;
        Ok(collect_elements(&Html::parse_document(&html)))
    }

    async fn count(&self, selector: &str) -> Result<usize, PollError> {
        // reject a bad selector before paying for the fetch
        parse_selector(selector).map_err(PollError::from)?;
        let html = self.fetch().await?;
        Ok(count_matching(&Html::parse_document(&html), selector)?)
    }
}
