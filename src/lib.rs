pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod domain;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use crate::core::{
    config::Settings, query_cache::QueryCache, redis::RedisHandle, security, state::AppState,
    telemetry,
};
use crate::services::{backend::BackendHandle, queries::Queries};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    let mut cache_redis = None;
    if settings.cache().redis_enabled {
        if let Err(err) = redis.connect().await {
            tracing::error!(error = %err, "Failed to connect to Redis; query cache stays in memory");
        } else {
            tracing::info!("Redis connected successfully");
            cache_redis = Some(redis.clone());
        }
    }

    let backend = BackendHandle::new();
    if !backend.connect(&settings).await? {
        tracing::warn!("EXAM_BACKEND_URL is not set; backend calls will fail until configured");
    }

    let queries = Queries::new(backend.clone(), QueryCache::new(settings.cache(), cache_redis));
    let state = AppState::new(settings, queries, redis.clone());

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        admins = state.allow_list().len(),
        "Delta practice portal listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    backend.disconnect().await;
    redis.disconnect().await;
    tracing::info!("Backend and Redis disconnected");

    result?;

    Ok(())
}

/// Signs a local identity token for `principal` with the configured secret.
pub fn issue_dev_token(principal: &str) -> anyhow::Result<String> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    Ok(security::issue_identity_token(principal, &settings, None)?)
}
