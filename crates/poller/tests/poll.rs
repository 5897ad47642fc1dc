use poller::{PollOutcome, PollerConfig, ReadinessPoller, Tick};
use quiesce_core::{DomQuery, ElementInfo, ErrorCategory, PollError};
use quiesce_dom::StaticDocument;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let fired = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&fired);
    (fired, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

struct FailingDoc;

#[async_trait::async_trait]
impl DomQuery for FailingDoc {
    async fn elements(&self) -> Result<Vec<ElementInfo>, PollError> {
        Err(PollError::query_error("document detached"))
    }

    async fn count(&self, _selector: &str) -> Result<usize, PollError> {
        Err(PollError::query_error("document detached"))
    }
}

#[tokio::test(start_paused = true)]
async fn settled_page_completes_after_the_baseline_tick() {
    // tick 1 records the structural baseline, tick 2 sees no change
    let doc = StaticDocument::new("<ul><li>a</li><li>b</li></ul>");
    let (fired, callback) = counter();
    let poller = ReadinessPoller::new(doc, callback).unwrap();

    let outcome = poller.run().await.unwrap();
    assert_eq!(outcome, PollOutcome::Ready);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn loading_marker_removed_after_three_ticks_fires_on_tick_four() {
    let doc = StaticDocument::new(r#"<div class="isLoading">please wait</div>"#);
    let (fired, callback) = counter();
    let config = PollerConfig::default().with_max_retries(20);
    let mut poller = ReadinessPoller::with_config(doc.clone(), callback, config).unwrap();

    for _ in 0..3 {
        assert_eq!(poller.tick().await.unwrap(), Tick::Pending);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    doc.set_html("<div>please wait</div>");
    assert_eq!(poller.tick().await.unwrap(), Tick::Ready);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(poller.state().retry_count, 3);
}

#[tokio::test(start_paused = true)]
async fn permanent_spinner_exhausts_the_retry_cap() {
    let doc = StaticDocument::new(r#"<img src="/busy/loader.gif">"#);
    let (fired, callback) = counter();
    let config = PollerConfig::default().with_max_retries(2);
    let poller = ReadinessPoller::with_config(doc, callback, config).unwrap();

    // two retries allowed, so the third tick gives up
    let outcome = poller.run().await.unwrap();
    assert_eq!(outcome, PollOutcome::RetriesExhausted);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn deadline_stops_an_unbounded_retry_budget() {
    let doc = StaticDocument::new(r#"<img src="spinner.gif">"#);
    let (fired, callback) = counter();
    let config = PollerConfig::default()
        .with_max_retries(0)
        .with_max_duration(3500);
    let poller = ReadinessPoller::with_config(doc, callback, config).unwrap();

    let outcome = poller.run().await.unwrap();
    assert_eq!(outcome, PollOutcome::DeadlineExceeded);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unlimited_budgets_never_trip_on_their_own() {
    let doc = StaticDocument::new(r#"<img src="spinner.gif">"#);
    let (fired, callback) = counter();
    let config = PollerConfig::default()
        .with_max_retries(0)
        .with_max_duration(0);
    let mut poller = ReadinessPoller::with_config(doc, callback, config).unwrap();

    for _ in 0..50 {
        assert_eq!(poller.tick().await.unwrap(), Tick::Pending);
    }
    assert_eq!(poller.state().retry_count, 50);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn query_failure_aborts_without_the_callback() {
    let (fired, callback) = counter();
    let poller = ReadinessPoller::new(FailingDoc, callback).unwrap();

    let err = poller.run().await.unwrap_err();
    assert_eq!(err.category, ErrorCategory::Query);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_the_wait_suppresses_the_callback() {
    let doc = StaticDocument::new(r#"<img src="spinner.gif">"#);
    let (fired, callback) = counter();
    let config = PollerConfig::default()
        .with_max_retries(0)
        .with_max_duration(0);
    let poller = ReadinessPoller::with_config(doc, callback, config).unwrap();
    let token = poller.cancel_token();

    let handle = tokio::spawn(poller.run());
    tokio::task::yield_now().await;
    token.cancel();

    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, PollOutcome::Canceled);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[should_panic(expected = "callback blew up")]
async fn callback_panic_propagates_to_the_caller() {
    let doc = StaticDocument::new("<p>ready</p>");
    let mut poller = ReadinessPoller::new(doc, || panic!("callback blew up")).unwrap();
    let _ = poller.tick().await;
}
