// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Route table and handlers.

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use graham_core::error::BridgeError;
use graham_spool::Dispatcher;

use crate::request::decode_print_request;
use crate::response::{ApiError, ProbeBody, StatusBody, WARNING_HEADER};

/// State shared by all handlers. Immutable after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Dispatcher,
    /// Largest accepted request body, measured before base64 decoding.
    pub max_body_bytes: usize,
}

impl GatewayState {
    pub fn new(dispatcher: Dispatcher, max_body_bytes: usize) -> Self {
        Self {
            dispatcher,
            max_body_bytes,
        }
    }
}

/// Build the gateway router with CORS, tracing, and the body limit applied.
pub fn router(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        // Chromium asks before letting a public page reach a loopback host.
        .allow_private_network(true);

    let max_body = state.max_body_bytes;

    Router::new()
        .route("/status", get(status))
        .route("/print", post(print))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe.
async fn status() -> Json<ProbeBody> {
    Json(ProbeBody::ready())
}

/// Decode, validate, and dispatch a raw print job. The response is sent only
/// after the spooler handshake has finished.
async fn print(State(state): State<GatewayState>, body: Bytes) -> Result<Response, ApiError> {
    let job = decode_print_request(&body).inspect_err(|e| {
        warn!(error = %e, "rejected print request");
    })?;

    info!(
        job_id = %job.id(),
        printer = job.device_name(),
        bytes = job.payload().len(),
        "print request"
    );

    let dispatcher = state.dispatcher.clone();
    let result = tokio::task::spawn_blocking(move || dispatcher.dispatch_job(&job))
        .await
        .map_err(|e| BridgeError::Server(format!("dispatch task failed: {e}")))?;

    let warnings = result.into_result()?;

    let mut response = Json(StatusBody::queued()).into_response();
    if !warnings.is_empty() {
        let joined = warnings
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        // OS messages may be localised; drop the header rather than fail.
        if let Ok(value) = HeaderValue::from_str(&joined) {
            response.headers_mut().insert(WARNING_HEADER, value);
        }
    }
    Ok(response)
}
