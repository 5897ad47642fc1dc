use poller::{PollerConfig, ReadinessPoller};
use quiesce_browser::{LiveDocument, launch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());

    let browser = launch(true).await?;
    let page = browser.new_page(url.as_str()).await?;
    let doc = LiveDocument::new(page);

    let poller = ReadinessPoller::with_config(
        doc,
        || println!("page settled, ready to go"),
        PollerConfig::fast(),
    )?;

    let outcome = poller.run().await?;
    println!("poll finished: {:?}", outcome);
    Ok(())
}
