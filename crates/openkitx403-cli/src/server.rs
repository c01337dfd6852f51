/*
[INPUT]:  ServerConfig, a bound listener, and a shutdown token
[OUTPUT]: Running axum server guarded by the OpenKitx403 middleware
[POS]:    Server layer - reference host for protected routes
[UPDATE]: When adding routes or changing startup/shutdown flow
*/

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Json;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use chrono::Utc;
use openkitx403::{Authenticator, OpenKitUser, openkit_middleware};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;

/// Router with public and wallet-protected routes
pub fn build_app(auth: Arc<Authenticator>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/profile", get(profile))
        .route("/api/echo", post(echo))
        .layer(middleware::from_fn_with_state(auth, openkit_middleware))
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": "openkitx403",
        "protected": ["/api/profile", "/api/echo"],
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn profile(user: OpenKitUser) -> Json<Value> {
    Json(json!({
        "address": user.address,
        "challenge": {
            "nonce": user.challenge.nonce,
            "issuedAt": user.challenge.issued_at,
            "expiresAt": user.challenge.expires_at,
        },
    }))
}

async fn echo(user: OpenKitUser, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "address": user.address,
        "received": body,
    }))
}

/// Bind `config.listen` and serve until `shutdown` is cancelled
pub async fn serve(config: ServerConfig, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("bind {}", config.listen))?;
    serve_on(listener, config, shutdown).await
}

/// Serve on an already-bound listener until `shutdown` is cancelled
pub async fn serve_on(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    let auth = Authenticator::with_in_memory_store(config.auth.clone())
        .context("build authenticator")?;
    let app = build_app(Arc::new(auth));

    let local_addr = listener.local_addr().context("read local address")?;
    info!(
        addr = %local_addr,
        audience = %config.auth.audience,
        issuer = %config.auth.issuer,
        excluded = config.auth.excluded_paths.len(),
        "server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("serve http")?;

    info!("server stopped");
    Ok(())
}
