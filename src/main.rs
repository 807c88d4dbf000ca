use std::{sync::Arc, time::Duration};

use anyhow::Context;
use gemini_chat_backend::{
    config::Config,
    routes,
    services::{
        generation::GeminiClient,
        session_store::{InMemorySessionStore, SessionStore},
    },
    state::AppState,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // A missing API key stops the process here, not on the first request.
    let config = Config::from_env().context("failed to load configuration")?;

    let client = GeminiClient::new(config.gemini.clone()).context("failed to build HTTP client")?;
    let store = Arc::new(InMemorySessionStore::with_limits(config.session_ttl, config.max_sessions));

    if let Some(ttl) = config.session_ttl {
        spawn_purge_task(Arc::clone(&store), ttl);
    }

    let state = Arc::new(
        AppState::new(Arc::new(client), store).with_policy(config.session_id_policy),
    );
    let app = routes::create_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %config.bind_addr,
        model = %config.gemini.model,
        policy = ?config.session_id_policy,
        "gemini chat backend listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_purge_task(store: Arc<InMemorySessionStore>, ttl: Duration) {
    let period = (ttl / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = store.purge_expired().await;
            if removed > 0 {
                tracing::info!(removed, "purged idle sessions");
            }
        }
    });
}
