// # OPNsense Record Store
//
// RecordStore implementation backed by the Unbound settings API of an
// OPNsense firewall.
//
// ## Behavior
//
// - One HTTP request per trait call, plus the listing needed to resolve a
//   name to an identifier
// - No retries, no caching, no background tasks: every error goes straight
//   back to the caller
// - Self-signed certificates are accepted
// - Requests time out after the configured per-request timeout
//
// ## Security Requirements
//
// - The API secret NEVER appears in logs or Debug output
//
// ## API Reference
//
// - Create host:   POST `/api/unbound/settings/addhostoverride`   `{"host": {...}}`
// - Create alias:  POST `/api/unbound/settings/addHostAlias`      `{"alias": {...}}`
// - List hosts:    GET  `/api/unbound/settings/searchHostOverride/`
// - List aliases:  GET  `/api/unbound/settings/searchHostAlias`
// - Delete host:   POST `/api/unbound/settings/delHostOverride/:uuid`
// - Delete alias:  POST `/api/unbound/settings/delHostAlias/:uuid`
//
// Search responses are `{"rows": [...], "rowCount", "total", "current"}`;
// only the first page is read. Delete responses are `{"result": "..."}` and
// only `"deleted"` counts as success.

use aliassync_core::config::StoreConfig;
use aliassync_core::records::{
    AddAliasRequest, AddHostRequest, AliasRecord, DeleteResponse, HostRecord, HostReference,
    SearchResponse,
};
use aliassync_core::traits::RecordStore;
use aliassync_core::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ADD_HOST_PATH: &str = "/api/unbound/settings/addhostoverride";
const ADD_ALIAS_PATH: &str = "/api/unbound/settings/addHostAlias";
const SEARCH_HOSTS_PATH: &str = "/api/unbound/settings/searchHostOverride/";
const SEARCH_ALIASES_PATH: &str = "/api/unbound/settings/searchHostAlias";
const DELETE_HOST_PATH: &str = "/api/unbound/settings/delHostOverride";
const DELETE_ALIAS_PATH: &str = "/api/unbound/settings/delHostAlias";

/// Body returned by the add endpoints
#[derive(Debug, Default, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    result: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    validations: Option<serde_json::Value>,
}

/// OPNsense Unbound record store
///
/// The client is cheap to share: the inner `reqwest::Client` pools
/// connections across concurrent reconciliations.
pub struct OpnsenseClient {
    /// Base address without trailing slash, e.g. `https://10.0.0.1`
    address: String,

    /// API key (basic auth user)
    api_key: String,

    /// API secret (basic auth password)
    /// ⚠️ NEVER log this value
    api_secret: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API secret
impl std::fmt::Debug for OpnsenseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpnsenseClient")
            .field("address", &self.address)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<REDACTED>")
            .finish()
    }
}

impl OpnsenseClient {
    /// Create a client from store configuration
    ///
    /// # Returns
    ///
    /// - `Ok(OpnsenseClient)`: Ready to use; no request has been made yet
    /// - `Err(Error::Config)`: Invalid configuration or HTTP client setup failure
    pub fn new(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            address: config.address.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.endpoint(path))
            .basic_auth(&self.api_key, Some(&self.api_secret))
    }

    /// Send a request and return the body of a success response
    async fn send(&self, request: reqwest::RequestBuilder, action: &str) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::remote(format!("{}: HTTP request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::remote(format!("{}: failed to read response: {}", action, e)))?;

        if !status.is_success() {
            return Err(status_error(status, &body, action));
        }

        Ok(body)
    }

    /// Fetch the first page of a search endpoint
    async fn search<T: DeserializeOwned>(&self, path: &str, action: &str) -> Result<Vec<T>> {
        let body = self
            .send(self.request(reqwest::Method::GET, path), action)
            .await?;

        let page: SearchResponse<T> = parse(&body, action)?;
        tracing::debug!(
            "{}: {} row(s) (rowCount {}, total {}, page {})",
            action,
            page.rows.len(),
            page.row_count,
            page.total,
            page.current
        );

        Ok(page.rows)
    }

    /// Submit a create request; success is decided by the HTTP status
    async fn submit_create<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        action: &str,
    ) -> Result<Option<String>> {
        let request = self.request(reqwest::Method::POST, path).json(body);
        let text = self.send(request, action).await?;

        let response: CreateResponse = match serde_json::from_str(&text) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("{}: ignoring undecodable create response: {}", action, e);
                CreateResponse::default()
            }
        };

        if response.result == "failed" {
            let validations = response
                .validations
                .map(|v| v.to_string())
                .unwrap_or_else(|| "no details".to_string());
            return Err(Error::remote(format!(
                "{}: rejected by the firewall: {}",
                action, validations
            )));
        }

        Ok(response.uuid.filter(|uuid| !uuid.is_empty()))
    }

    /// Delete by identifier; only the `deleted` marker counts as success
    async fn perform_delete(&self, fqdn: &str, path: &str, action: &str) -> Result<()> {
        let body = self
            .send(self.request(reqwest::Method::POST, path), action)
            .await?;

        let response: DeleteResponse = parse(&body, action)?;
        if !response.succeeded() {
            return Err(Error::remote(format!(
                "{} does not exist (result: {})",
                fqdn, response.result
            )));
        }

        tracing::info!("Deleted {}", fqdn);
        Ok(())
    }
}

fn parse<T: DeserializeOwned>(body: &str, action: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::malformed(format!("{}: failed to parse response: {}", action, e)))
}

fn status_error(status: StatusCode, body: &str, action: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API key/secret or insufficient privileges. Status: {}",
            action, status
        )),
        500..=599 => Error::remote(format!(
            "{}: firewall server error: {} - {}",
            action, status, body
        )),
        _ => Error::remote(format!("{}: {} - {}", action, status, body)),
    }
}

#[async_trait]
impl RecordStore for OpnsenseClient {
    async fn create_host(&self, host: &HostRecord) -> Result<HostRecord> {
        let fqdn = host.fqdn();
        tracing::info!("Creating host override {} -> {} ({})", fqdn, host.server, host.rr);

        let uuid = self
            .submit_create(
                ADD_HOST_PATH,
                &AddHostRequest { host },
                &format!("create host override {}", fqdn),
            )
            .await?;

        let mut created = host.clone();
        if let Some(uuid) = uuid {
            created.uuid = uuid;
        }
        Ok(created)
    }

    async fn create_alias(&self, alias: &AliasRecord) -> Result<AliasRecord> {
        let fqdn = alias.fqdn();
        let mut submitted = alias.clone();

        if let HostReference::Fqdn(host_fqdn) = alias.host_reference() {
            let host = self.get_host(host_fqdn).await?;
            tracing::debug!("Resolved host {} to {}", host_fqdn, host.uuid);
            submitted.host = host.uuid;
        }

        tracing::info!("Creating alias {} of host {}", fqdn, submitted.host);

        let uuid = self
            .submit_create(
                ADD_ALIAS_PATH,
                &AddAliasRequest { alias: &submitted },
                &format!("create alias {}", fqdn),
            )
            .await?;

        if let Some(uuid) = uuid {
            submitted.uuid = uuid;
        }
        Ok(submitted)
    }

    async fn list_hosts(&self) -> Result<Vec<HostRecord>> {
        self.search(SEARCH_HOSTS_PATH, "list host overrides").await
    }

    async fn list_aliases(&self) -> Result<Vec<AliasRecord>> {
        self.search(SEARCH_ALIASES_PATH, "list aliases").await
    }

    async fn delete_host(&self, fqdn: &str) -> Result<()> {
        let host = self.get_host(fqdn).await?;
        let path = format!("{}/{}", DELETE_HOST_PATH, host.uuid);

        self.perform_delete(fqdn, &path, &format!("delete host override {}", fqdn))
            .await
    }

    async fn delete_alias(&self, fqdn: &str) -> Result<()> {
        let alias = self.get_alias(fqdn).await?;
        let path = format!("{}/{}", DELETE_ALIAS_PATH, alias.uuid);

        self.perform_delete(fqdn, &path, &format!("delete alias {}", fqdn))
            .await
    }

    fn store_name(&self) -> &'static str {
        "opnsense"
    }
}
