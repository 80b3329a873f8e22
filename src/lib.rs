pub mod api; // HTTP surface: chat turns, summarization proxy, health
pub mod config;
pub mod dialogue; // The intake engine: patterns → extractor → controller
pub mod sanitize; // Untrusted-markup stripping for summarizer output
pub mod summarize; // Upstream summarizer client + local fallback

use tracing_subscriber::EnvFilter;

/// Initialise logging and serve the intake API until shutdown.
pub async fn run() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let ctx = api::types::ApiContext::from_env();
    let router = api::router::api_router(ctx);

    let addr = config::bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router).await
}
