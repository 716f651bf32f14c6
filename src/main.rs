use std::sync::Arc;

use polite_relay::channels::LineChannel;
use polite_relay::config::RelayConfig;
use polite_relay::llm::{GeminiClient, LlmProvider};
use polite_relay::pipeline::{EventDispatcher, PromptTable};
use polite_relay::webhook::{WebhookState, webhook_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RelayConfig::from_env()?;

    let channel = Arc::new(LineChannel::new(
        config.channel_access_token.clone(),
        config.line_api_base.clone(),
    ));
    let llm = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
    ));

    eprintln!("🙇 Polite Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm.model_name());
    eprintln!("   LINE API: {}", config.line_api_base);
    eprintln!("   Webhook: http://0.0.0.0:{}/api/webhook\n", config.port);

    let dispatcher = EventDispatcher::new(channel, llm, Arc::new(PromptTable::builtin()))
        .with_loading_seconds(config.loading_seconds);

    let app = webhook_routes(WebhookState {
        dispatcher: Arc::new(dispatcher),
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Webhook server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
