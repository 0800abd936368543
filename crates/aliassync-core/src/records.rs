//! Host and alias record models
//!
//! Both record kinds mirror the field names of the firewall's Unbound
//! settings API, so the same types are used for request bodies and for the
//! rows returned by the search endpoints.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Name written into the description of every record this system creates
pub const CREATOR: &str = "aliassync";

/// Build a fully-qualified name from a hostname and domain
pub fn fqdn(hostname: &str, domain: &str) -> String {
    format!("{}.{}", hostname, domain)
}

/// Derive the short hostname of `fqdn` by stripping the trailing `.<domain>`
///
/// Names that do not end with the domain are returned unchanged.
pub fn short_name<'a>(fqdn: &'a str, domain: &str) -> &'a str {
    fqdn.strip_suffix(domain)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(fqdn)
}

fn default_description(fqdn: &str) -> String {
    format!("{} Automatically created by {}", fqdn, CREATOR)
}

/// DNS record type of a host override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
}

impl RecordType {
    /// Address record type matching the IP version
    pub fn for_ip(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Wire representation used in the `rr` field
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

/// Host override: maps `hostname.domain` to an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Identifier assigned by the remote store (empty until created)
    #[serde(default)]
    pub uuid: String,
    #[serde(default = "enabled_default", with = "enabled_flag")]
    pub enabled: bool,
    pub hostname: String,
    pub domain: String,
    /// Target address
    #[serde(default)]
    pub server: String,
    /// Record type (`A`, `AAAA`, ...)
    #[serde(default)]
    pub rr: String,
    #[serde(default)]
    pub description: String,
}

impl HostRecord {
    /// Create an enabled address record for `hostname.domain` pointing at `ip`
    pub fn new(hostname: impl Into<String>, domain: impl Into<String>, ip: IpAddr) -> Self {
        let mut record = Self {
            uuid: String::new(),
            enabled: true,
            hostname: hostname.into(),
            domain: domain.into(),
            server: ip.to_string(),
            rr: RecordType::for_ip(&ip).as_str().to_string(),
            description: String::new(),
        };
        record.description = default_description(&record.fqdn());
        record
    }

    pub fn fqdn(&self) -> String {
        fqdn(&self.hostname, &self.domain)
    }
}

/// How an alias refers to its owning host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostReference<'a> {
    /// The host's fully-qualified name; must be resolved to an identifier
    /// before the alias can be created
    Fqdn(&'a str),
    /// The host record's identifier
    Id(&'a str),
}

/// Alias of a host override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// Identifier assigned by the remote store (empty until created)
    #[serde(default)]
    pub uuid: String,
    #[serde(default = "enabled_default", with = "enabled_flag")]
    pub enabled: bool,
    /// Owning host, either its identifier or its FQDN
    #[serde(default)]
    pub host: String,
    pub hostname: String,
    pub domain: String,
    #[serde(default)]
    pub description: String,
}

impl AliasRecord {
    /// Create an enabled alias `hostname.domain` of the host referenced by `host`
    pub fn new(
        hostname: impl Into<String>,
        domain: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        let mut record = Self {
            uuid: String::new(),
            enabled: true,
            host: host.into(),
            hostname: hostname.into(),
            domain: domain.into(),
            description: String::new(),
        };
        record.description = default_description(&record.fqdn());
        record
    }

    pub fn fqdn(&self) -> String {
        fqdn(&self.hostname, &self.domain)
    }

    /// Classify the `host` field: anything containing a `.` is a name
    pub fn host_reference(&self) -> HostReference<'_> {
        if self.host.contains('.') {
            HostReference::Fqdn(&self.host)
        } else {
            HostReference::Id(&self.host)
        }
    }
}

/// Page of rows returned by the search endpoints
///
/// Only the first page is ever consumed; the paging fields are kept for
/// logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    pub rows: Vec<T>,
    #[serde(default)]
    pub row_count: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub current: i64,
}

/// Body of a create-host request
#[derive(Debug, Serialize)]
pub struct AddHostRequest<'a> {
    pub host: &'a HostRecord,
}

/// Body of a create-alias request
#[derive(Debug, Serialize)]
pub struct AddAliasRequest<'a> {
    pub alias: &'a AliasRecord,
}

/// Marker the remote store returns for a successful delete
pub const DELETED: &str = "deleted";

/// Body of a delete response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub result: String,
}

impl DeleteResponse {
    /// Only the literal `deleted` marker counts as success
    pub fn succeeded(&self) -> bool {
        self.result == DELETED
    }
}

fn enabled_default() -> bool {
    true
}

/// The remote store encodes flags as `"1"` / `"0"`
mod enabled_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Text(String),
        Number(i64),
        Bool(bool),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "1" } else { "0" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Flag::deserialize(deserializer)? {
            Flag::Text(text) => text == "1",
            Flag::Number(n) => n != 0,
            Flag::Bool(b) => b,
        })
    }
}
