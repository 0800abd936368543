// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Purpose
//
// Behaves like the firewall's record store without any network access:
// identifiers are assigned on create, FQDN host references are resolved
// before an alias is stored, and listed aliases report their owner by FQDN
// the way the firewall's search endpoint does.
//
// ## When to Use
//
// - Testing the reconciler
// - Embedding the reconciler without a firewall
//
// Nothing is persisted; all records are lost when the store is dropped.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::records::{AliasRecord, DELETED, DeleteResponse, HostRecord, HostReference};
use crate::traits::RecordStore;

#[derive(Debug, Default)]
struct Records {
    hosts: Vec<HostRecord>,
    /// Stored with `host` holding the owner's identifier once resolved
    aliases: Vec<AliasRecord>,
}

/// In-memory record store implementation
///
/// Clones share the same underlying records.
///
/// # Example
///
/// ```rust,no_run
/// use aliassync_core::records::HostRecord;
/// use aliassync_core::store::MemoryRecordStore;
/// use aliassync_core::traits::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///
///     let host = HostRecord::new("app", "example.com", "10.0.0.1".parse()?);
///     store.create_host(&host).await?;
///
///     assert!(store.host_exists("app.example.com").await?);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<Records>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryRecordStore {
    /// Create a new empty memory record store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records exactly as given
    ///
    /// Records keep their `uuid` and `host` fields; records without an
    /// identifier get one assigned.
    pub fn with_records(hosts: Vec<HostRecord>, aliases: Vec<AliasRecord>) -> Self {
        let store = Self::new();
        let mut records = Records { hosts, aliases };

        for host in records.hosts.iter_mut().filter(|h| h.uuid.is_empty()) {
            host.uuid = store.assign_id();
        }
        for alias in records.aliases.iter_mut().filter(|a| a.uuid.is_empty()) {
            alias.uuid = store.assign_id();
        }

        Self {
            inner: Arc::new(RwLock::new(records)),
            next_id: store.next_id,
        }
    }

    /// Number of host records in the store
    pub async fn host_count(&self) -> usize {
        self.inner.read().await.hosts.len()
    }

    /// Number of alias records in the store
    pub async fn alias_count(&self) -> usize {
        self.inner.read().await.aliases.len()
    }

    /// Remove every record
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.hosts.clear();
        guard.aliases.clear();
    }

    fn assign_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("mem-{:08x}", n)
    }

    async fn delete_host_by_id(&self, uuid: &str) -> DeleteResponse {
        let mut guard = self.inner.write().await;
        let before = guard.hosts.len();
        guard.hosts.retain(|host| host.uuid != uuid);

        delete_result(before != guard.hosts.len())
    }

    async fn delete_alias_by_id(&self, uuid: &str) -> DeleteResponse {
        let mut guard = self.inner.write().await;
        let before = guard.aliases.len();
        guard.aliases.retain(|alias| alias.uuid != uuid);

        delete_result(before != guard.aliases.len())
    }
}

fn delete_result(removed: bool) -> DeleteResponse {
    DeleteResponse {
        result: if removed { DELETED } else { "notfound" }.to_string(),
    }
}

fn check_deleted(fqdn: &str, response: DeleteResponse) -> Result<()> {
    if response.succeeded() {
        Ok(())
    } else {
        Err(Error::remote(format!(
            "{} does not exist (result: {})",
            fqdn, response.result
        )))
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_host(&self, host: &HostRecord) -> Result<HostRecord> {
        let mut guard = self.inner.write().await;
        let fqdn = host.fqdn();

        if guard.hosts.iter().any(|existing| existing.fqdn() == fqdn) {
            return Err(Error::remote(format!(
                "Host override {} already exists",
                fqdn
            )));
        }

        let mut created = host.clone();
        created.uuid = self.assign_id();
        guard.hosts.push(created.clone());

        Ok(created)
    }

    async fn create_alias(&self, alias: &AliasRecord) -> Result<AliasRecord> {
        let mut created = alias.clone();

        match alias.host_reference() {
            HostReference::Fqdn(name) => {
                created.host = self.get_host(name).await?.uuid;
            }
            HostReference::Id(id) => {
                let guard = self.inner.read().await;
                if !guard.hosts.iter().any(|host| host.uuid == id) {
                    return Err(Error::remote(format!(
                        "Validation failed: host {} is not a known host override",
                        id
                    )));
                }
            }
        }

        created.uuid = self.assign_id();
        self.inner.write().await.aliases.push(created.clone());

        Ok(created)
    }

    async fn list_hosts(&self) -> Result<Vec<HostRecord>> {
        Ok(self.inner.read().await.hosts.clone())
    }

    async fn list_aliases(&self) -> Result<Vec<AliasRecord>> {
        let guard = self.inner.read().await;

        Ok(guard
            .aliases
            .iter()
            .map(|alias| {
                let mut listed = alias.clone();
                if let Some(owner) = guard.hosts.iter().find(|host| host.uuid == alias.host) {
                    listed.host = owner.fqdn();
                }
                listed
            })
            .collect())
    }

    async fn delete_host(&self, fqdn: &str) -> Result<()> {
        let host = self.get_host(fqdn).await?;
        let response = self.delete_host_by_id(&host.uuid).await;
        check_deleted(fqdn, response)
    }

    async fn delete_alias(&self, fqdn: &str) -> Result<()> {
        let alias = self.get_alias(fqdn).await?;
        let response = self.delete_alias_by_id(&alias.uuid).await;
        check_deleted(fqdn, response)
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
