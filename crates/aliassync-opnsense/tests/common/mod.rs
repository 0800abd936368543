//! Scripted stand-in for the firewall's Unbound settings API
//!
//! Responses are configured per `(method, path)`; every request is logged
//! so tests can assert on the exact calls the client made.

#![allow(dead_code)]

use aliassync_core::config::StoreConfig;
use aliassync_opnsense::OpnsenseClient;
use axum::Router;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SEARCH_HOSTS: &str = "/api/unbound/settings/searchHostOverride/";
pub const SEARCH_ALIASES: &str = "/api/unbound/settings/searchHostAlias";
pub const ADD_HOST: &str = "/api/unbound/settings/addhostoverride";
pub const ADD_ALIAS: &str = "/api/unbound/settings/addHostAlias";

/// Basic auth header for `key:secret`
pub const BASIC_KEY_SECRET: &str = "Basic a2V5OnNlY3JldA==";

/// A request received by the fake firewall
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl Recorded {
    /// The request body parsed as JSON
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

#[derive(Default)]
struct FakeState {
    responses: Mutex<HashMap<(String, String), (u16, String)>>,
    requests: Mutex<Vec<Recorded>>,
}

/// Handle to a running fake firewall
#[derive(Clone)]
pub struct FakeFirewall {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeFirewall {
    /// Serve on an ephemeral local port
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());

        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind succeeds");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake firewall serves");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Client pointed at this fake with `key`/`secret` credentials
    pub fn client(&self) -> OpnsenseClient {
        OpnsenseClient::new(&StoreConfig::new(self.base_url.clone(), "key", "secret"))
            .expect("client builds")
    }

    /// Answer `method path` with `status` and `body`
    pub fn respond(&self, method: &str, path: &str, status: u16, body: impl Into<String>) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.into()));
    }

    /// Answer a search endpoint with the given rows
    pub fn rows(&self, path: &str, rows: serde_json::Value) {
        let count = rows.as_array().map(|r| r.len()).unwrap_or(0);
        let body = serde_json::json!({
            "rows": rows,
            "rowCount": count,
            "total": count,
            "current": 1,
        });
        self.respond("GET", path, 200, body.to_string());
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// `"METHOD path"` for every request received so far
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

async fn handle(
    axum::extract::State(state): axum::extract::State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body,
    });

    let scripted = state
        .responses
        .lock()
        .unwrap()
        .get(&(method.to_string(), uri.path().to_string()))
        .cloned();

    match scripted {
        Some((status, body)) => (
            StatusCode::from_u16(status).expect("valid status"),
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no scripted response").into_response(),
    }
}

/// Host override row as the firewall lists it
pub fn host_row(uuid: &str, hostname: &str, domain: &str, server: &str) -> serde_json::Value {
    serde_json::json!({
        "uuid": uuid,
        "enabled": "1",
        "hostname": hostname,
        "domain": domain,
        "rr": "A",
        "mxprio": "",
        "mx": "",
        "server": server,
        "description": "",
    })
}

/// Alias row as the firewall lists it (owner reported by FQDN)
pub fn alias_row(uuid: &str, host: &str, hostname: &str, domain: &str) -> serde_json::Value {
    serde_json::json!({
        "uuid": uuid,
        "enabled": "1",
        "host": host,
        "hostname": hostname,
        "domain": domain,
        "description": "",
    })
}
