//! Test doubles and common utilities for reconciliation contract tests
//!
//! `RecordingStore` wraps a [`MemoryRecordStore`], logs every call made
//! through the trait and can be told to fail specific operations.

#![allow(dead_code)]

use aliassync_core::error::{Error, Result};
use aliassync_core::records::{AliasRecord, HostRecord};
use aliassync_core::store::MemoryRecordStore;
use aliassync_core::traits::RecordStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const DOMAIN: &str = "example.com";

/// A store that records calls and injects failures
#[derive(Clone, Default)]
pub struct RecordingStore {
    /// Backing records
    pub inner: MemoryRecordStore,
    /// Calls in the order they were made, e.g. `"create_alias api.example.com"`
    calls: Arc<Mutex<Vec<String>>>,
    /// Failures keyed by `"<operation> <fqdn>"`
    failures: Arc<Mutex<HashMap<String, String>>>,
    /// Fail every list call
    unavailable: Arc<Mutex<bool>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrapping(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    /// Make `operation` fail for `fqdn` with a remote error
    pub fn fail_on(&self, operation: &str, fqdn: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(format!("{} {}", operation, fqdn), message.to_string());
    }

    /// Remove every injected failure
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
        *self.unavailable.lock().unwrap() = false;
    }

    /// Make list calls fail as if the store were unreachable
    pub fn set_unavailable(&self) {
        *self.unavailable.lock().unwrap() = true;
    }

    /// All calls recorded so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls of a single operation, e.g. `"create_alias"`
    pub fn calls_of(&self, operation: &str) -> Vec<String> {
        let prefix = format!("{} ", operation);
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(&prefix) || call == operation)
            .collect()
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, operation: &str, fqdn: &str) -> Result<()> {
        let key = format!("{} {}", operation, fqdn);
        self.calls.lock().unwrap().push(key.clone());

        match self.failures.lock().unwrap().get(&key) {
            Some(message) => Err(Error::remote(message.clone())),
            None => Ok(()),
        }
    }

    fn record_list(&self, operation: &str) -> Result<()> {
        self.calls.lock().unwrap().push(operation.to_string());

        if *self.unavailable.lock().unwrap() {
            return Err(Error::remote("connection refused"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for RecordingStore {
    async fn create_host(&self, host: &HostRecord) -> Result<HostRecord> {
        self.record("create_host", &host.fqdn())?;
        self.inner.create_host(host).await
    }

    async fn create_alias(&self, alias: &AliasRecord) -> Result<AliasRecord> {
        self.record("create_alias", &alias.fqdn())?;
        self.inner.create_alias(alias).await
    }

    async fn list_hosts(&self) -> Result<Vec<HostRecord>> {
        self.record_list("list_hosts")?;
        self.inner.list_hosts().await
    }

    async fn list_aliases(&self) -> Result<Vec<AliasRecord>> {
        self.record_list("list_aliases")?;
        self.inner.list_aliases().await
    }

    async fn delete_host(&self, fqdn: &str) -> Result<()> {
        self.record("delete_host", fqdn)?;
        self.inner.delete_host(fqdn).await
    }

    async fn delete_alias(&self, fqdn: &str) -> Result<()> {
        self.record("delete_alias", fqdn)?;
        self.inner.delete_alias(fqdn).await
    }

    fn store_name(&self) -> &'static str {
        "recording"
    }
}

/// Host record `hostname.example.com` with a fixed identifier
pub fn host(hostname: &str, uuid: &str) -> HostRecord {
    let mut record = HostRecord::new(hostname, DOMAIN, "10.0.0.10".parse().unwrap());
    record.uuid = uuid.to_string();
    record
}

/// Alias `hostname.example.com` of the host with identifier `host_uuid`
pub fn alias(hostname: &str, host_uuid: &str) -> AliasRecord {
    AliasRecord::new(hostname, DOMAIN, host_uuid)
}

/// Owned FQDN list from string literals
pub fn fqdns(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Sorted FQDNs of the aliases the store currently lists for `host_fqdn`
pub async fn alias_names(store: &dyn RecordStore, host_fqdn: &str) -> Vec<String> {
    let mut names: Vec<String> = store
        .aliases_for_host(host_fqdn)
        .await
        .unwrap()
        .iter()
        .map(AliasRecord::fqdn)
        .collect();
    names.sort();
    names
}
