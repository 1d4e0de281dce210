//! Telegram webhook HTTP surface

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::bot::{self, AppState};
use crate::update::Update;

/// Telegram updates are a few KiB; anything near this is not an update
const MAX_UPDATE_BYTES: usize = 1024 * 1024;

/// Webhook response body
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

impl WebhookResponse {
    fn ok() -> (StatusCode, Json<Self>) {
        (StatusCode::OK, Json(Self { status: "ok" }))
    }

    fn error() -> (StatusCode, Json<Self>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self { status: "error" }),
        )
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(readiness).post(receive_update))
        .layer(DefaultBodyLimit::max(MAX_UPDATE_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the webhook until Ctrl-C / SIGTERM
pub async fn serve(state: Arc<AppState>, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("Webhook listening on {}", bind_address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn readiness(State(state): State<Arc<AppState>>) -> String {
    format!(
        "Telegram Bot Webhook Endpoint. Status: READY. Bot: {}",
        state.messenger_ready()
    )
}

async fn receive_update(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> (StatusCode, Json<WebhookResponse>) {
    let span = tracing::info_span!("webhook", request_id = %Uuid::new_v4());
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            let _guard = span.enter();
            error!("Failed to read webhook body: {}", e);
            return WebhookResponse::error();
        }
    };
    handle(&state, &body).instrument(span).await
}

/// Process one raw webhook body.
///
/// Returns 200 whenever the update parsed and the analysis flow ran, even if
/// the flow reported a failure to the chat. Telegram redelivers updates that
/// get a non-2xx answer, which would re-run the whole analysis.
pub async fn handle(state: &AppState, body: &[u8]) -> (StatusCode, Json<WebhookResponse>) {
    let update = match Update::parse(body) {
        Ok(update) => update,
        Err(e) => {
            error!("Failed to parse webhook body: {}", e);
            return WebhookResponse::error();
        }
    };

    match bot::process_update(state, &update).await {
        Ok(outcome) => {
            info!("Update {:?} handled: {:?}", update.update_id, outcome);
            WebhookResponse::ok()
        }
        Err(e) => {
            error!("Failed to handle update {:?}: {:#}", update.update_id, e);
            WebhookResponse::error()
        }
    }
}
