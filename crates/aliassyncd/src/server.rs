//! HTTP surface of the daemon
//!
//! Routes:
//! - `POST /sync`   - Reconcile a host's aliases: `{"host": "...", "aliases": ["..."]}`
//! - `GET  /health` - Liveness probe

use aliassync_core::{Error, ReconcileReport, Reconciler};
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    /// How long a request waits for its reconciliation to finish
    pub request_timeout: Duration,
}

/// Body of a sync request
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    /// FQDN of the host the aliases belong to
    pub host: String,
    /// Alias FQDNs the host should have
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    host: String,
    host_created: bool,
    created: Vec<String>,
    deleted: Vec<String>,
}

impl From<ReconcileReport> for SyncResponse {
    fn from(report: ReconcileReport) -> Self {
        Self {
            host: report.host,
            host_created: report.host_created,
            created: report.created,
            deleted: report.deleted,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Build the router
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// caller's address is available to the sync handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/sync", post(sync_aliases))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Reconcile the aliases of one host
///
/// The reconciliation runs in its own task. If it outlives the request
/// timeout the caller gets 504 while the task keeps going to completion.
async fn sync_aliases(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request: SyncRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            error!("Error while decoding sync request: {}", e);
            return error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {}", e));
        }
    };

    if request.host.trim().is_empty() {
        warn!("Rejecting sync request without host");
        return error_response(StatusCode::BAD_REQUEST, "host must not be empty");
    }

    let host_ip = client_ip(&headers, &peer);
    info!(
        "Sync requested for {} with {} alias(es) from {}",
        request.host,
        request.aliases.len(),
        host_ip
    );

    let reconciler = Arc::clone(&state.reconciler);
    let host = request.host.clone();
    let task = tokio::spawn(async move {
        reconciler
            .reconcile(&request.host, &request.aliases, host_ip)
            .await
    });

    match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(Ok(report))) => (StatusCode::OK, Json(SyncResponse::from(report))).into_response(),
        Ok(Ok(Err(e))) => {
            error!("Error while syncing aliases for {}: {}", host, e);
            error_response(status_for(&e), e.to_string())
        }
        Ok(Err(join_error)) => {
            error!("Reconciliation task for {} failed: {}", host, join_error);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "reconciliation task failed")
        }
        Err(_) => {
            warn!(
                "Reconciliation for {} still running after {:?}; responding with timeout",
                host, state.request_timeout
            );
            error_response(StatusCode::GATEWAY_TIMEOUT, "reconciliation timed out")
        }
    }
}

/// HTTP status reported for a failed reconciliation
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Remote(_) | Error::Authentication(_) | Error::Malformed(_) => {
            StatusCode::BAD_GATEWAY
        }
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Address of the caller
///
/// Proxy headers win over the socket address, in the order
/// `True-Client-IP`, `X-Real-IP`, first entry of `X-Forwarded-For`.
pub fn client_ip(headers: &HeaderMap, peer: &SocketAddr) -> IpAddr {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|value| value.trim().parse::<IpAddr>().ok())
    };

    header_ip("true-client-ip")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| header_ip("x-forwarded-for"))
        .unwrap_or_else(|| peer.ip())
}
