// # Record Store Trait
//
// Capability set over the remote DNS resolver's host and alias records.
//
// ## Implementations
//
// - OPNsense Unbound: `aliassync-opnsense` crate
// - In-memory: `aliassync_core::store::MemoryRecordStore`
//
// ## Usage
//
// ```rust,ignore
// use aliassync_core::RecordStore;
//
// async fn show(store: &dyn RecordStore) -> aliassync_core::Result<()> {
//     let host = store.get_host("app.example.com").await?;
//     for alias in store.aliases_for_host(&host.fqdn()).await? {
//         println!("{} -> {}", alias.fqdn(), host.server);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::records::{AliasRecord, HostRecord};

/// Trait for remote record store implementations
///
/// Records are addressed by fully-qualified name. The remote API has no
/// exact-match query, so every lookup provided here lists the whole
/// collection and filters it locally; each call costs one collection fetch.
///
/// # Thread Safety
///
/// Implementations must be thread-safe: concurrent reconciliations share a
/// single store without any locking.
///
/// # Failure Semantics
///
/// Stores execute one request per operation and never retry. Transport
/// failures and non-success statuses surface as [`Error::Remote`] (or
/// [`Error::Authentication`]), undecodable bodies as [`Error::Malformed`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a host record
    ///
    /// # Returns
    ///
    /// The submitted record, with `uuid` filled in when the store reports it
    async fn create_host(&self, host: &HostRecord) -> Result<HostRecord>;

    /// Create an alias record
    ///
    /// If the alias' host reference is an FQDN, it is first resolved to the
    /// host's identifier through [`RecordStore::get_host`]; an unknown host
    /// fails with [`Error::NotFound`]. Identifier references are submitted
    /// as-is without a lookup.
    async fn create_alias(&self, alias: &AliasRecord) -> Result<AliasRecord>;

    /// Fetch every host record (first page only)
    async fn list_hosts(&self) -> Result<Vec<HostRecord>>;

    /// Fetch every alias record (first page only)
    async fn list_aliases(&self) -> Result<Vec<AliasRecord>>;

    /// Delete the host record named `fqdn`
    ///
    /// Resolves the name to an identifier first ([`Error::NotFound`] when
    /// absent). The delete only succeeds if the store answers with the
    /// literal `deleted` marker.
    async fn delete_host(&self, fqdn: &str) -> Result<()>;

    /// Delete the alias record named `fqdn`
    ///
    /// Same resolution and success rules as [`RecordStore::delete_host`].
    async fn delete_alias(&self, fqdn: &str) -> Result<()>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;

    /// Find the host record named `fqdn`
    async fn get_host(&self, fqdn: &str) -> Result<HostRecord> {
        self.list_hosts()
            .await?
            .into_iter()
            .find(|host| host.fqdn() == fqdn)
            .ok_or_else(|| Error::not_found(format!("Host override {} does not exist", fqdn)))
    }

    /// Find the alias record named `fqdn`
    async fn get_alias(&self, fqdn: &str) -> Result<AliasRecord> {
        self.list_aliases()
            .await?
            .into_iter()
            .find(|alias| alias.fqdn() == fqdn)
            .ok_or_else(|| Error::not_found(format!("Alias override {} does not exist", fqdn)))
    }

    /// Whether a host record named `fqdn` exists
    ///
    /// Absence is `Ok(false)`; only fetch failures are errors.
    async fn host_exists(&self, fqdn: &str) -> Result<bool> {
        Ok(self
            .list_hosts()
            .await?
            .iter()
            .any(|host| host.fqdn() == fqdn))
    }

    /// Aliases currently attached to the host named `host_fqdn`
    ///
    /// Aliases are matched by comparing their `host` field with the host's
    /// FQDN, which is how the store reports the owner when listing. An alias
    /// whose `host` field holds an identifier instead never matches.
    async fn aliases_for_host(&self, host_fqdn: &str) -> Result<Vec<AliasRecord>> {
        let host = self.get_host(host_fqdn).await?;
        let owner = host.fqdn();

        Ok(self
            .list_aliases()
            .await?
            .into_iter()
            .filter(|alias| alias.host == owner)
            .collect())
    }
}
