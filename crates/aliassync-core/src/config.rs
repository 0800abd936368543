//! Configuration types for aliassync
//!
//! This module defines all configuration structures used throughout the crate.
//! Values are passed explicitly to the components that need them; nothing is
//! held in process-wide state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main aliassync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote record store connection
    pub store: StoreConfig,

    /// Domain suffix used to derive short names from FQDNs
    pub domain: String,

    /// Address the HTTP listener binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Upper bound on how long a request waits for its reconciliation
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl SyncConfig {
    /// Create a configuration with default listener settings
    pub fn new(store: StoreConfig, domain: impl Into<String>) -> Self {
        Self {
            store,
            domain: domain.into(),
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;

        if self.domain.is_empty() {
            return Err(crate::Error::config("Domain name cannot be empty"));
        }
        if self.domain.starts_with('.') || self.domain.ends_with('.') {
            return Err(crate::Error::config(format!(
                "Domain name must not start or end with '.': {}",
                self.domain
            )));
        }
        if self.listen_addr.is_empty() {
            return Err(crate::Error::config("Listen address cannot be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }

        Ok(())
    }
}

/// Remote record store connection settings
///
/// The Debug implementation does NOT expose the API secret.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base address of the firewall, including scheme (e.g. `https://10.0.0.1`)
    pub address: String,

    /// API key (basic auth user)
    pub api_key: String,

    /// API secret (basic auth password)
    pub api_secret: String,

    /// Per-request HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn new(
        address: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.address.is_empty() {
            return Err(crate::Error::config("Store address cannot be empty"));
        }
        if !self.address.starts_with("https://") && !self.address.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Store address must use HTTP or HTTPS scheme. Got: {}",
                self.address
            )));
        }
        if self.api_key.is_empty() {
            return Err(crate::Error::config("API key cannot be empty"));
        }
        if self.api_secret.is_empty() {
            return Err(crate::Error::config("API secret cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }

        Ok(())
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("address", &self.address)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<REDACTED>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:9657".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}
