//! Alias reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Making sure the target host record exists
//! - Diffing the desired alias set against the host's current aliases
//! - Applying the creates and deletes against the RecordStore
//!
//! ## Flow
//!
//! ```text
//! reconcile(host, desired, ip)
//!        │
//!        ├─ host_exists? ── no ──► create_host(short name, domain, ip)
//!        │
//!        ├─ aliases_for_host(host)
//!        │
//!        ├─ compute_diff(desired, current)
//!        │
//!        ├─ create_alias × to_create   (desired order)
//!        └─ delete_alias × to_delete   (current order)
//! ```
//!
//! ## Failure Model
//!
//! The first failing operation aborts the run and its error is returned
//! unchanged. Operations already applied are not rolled back; the next
//! reconciliation re-reads remote state and only performs what is left.
//! Nothing is retried here and no state is kept between runs.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::records::{AliasRecord, HostRecord, fqdn, short_name};
use crate::traits::RecordStore;

/// Alias changes needed to reach the desired state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasDiff {
    /// Desired alias FQDNs missing from the store, in desired order
    pub to_create: Vec<String>,
    /// Current alias FQDNs no longer desired, in current order
    pub to_delete: Vec<String>,
}

impl AliasDiff {
    /// Whether the store already matches the desired set
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Compute which aliases to create and which to delete
///
/// Membership is exact, case-sensitive string comparison on FQDNs. Inputs
/// are neither normalized nor deduplicated.
pub fn compute_diff(desired: &[String], existing: &[AliasRecord]) -> AliasDiff {
    let existing: Vec<String> = existing.iter().map(AliasRecord::fqdn).collect();

    let to_create = desired
        .iter()
        .filter(|fqdn| !existing.contains(fqdn))
        .cloned()
        .collect();

    let to_delete = existing
        .iter()
        .filter(|fqdn| !desired.contains(fqdn))
        .cloned()
        .collect();

    AliasDiff {
        to_create,
        to_delete,
    }
}

/// Outcome of a successful reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Host FQDN that was reconciled
    pub host: String,
    /// Whether the host record had to be created
    pub host_created: bool,
    /// Alias FQDNs created, in the order they were applied
    pub created: Vec<String>,
    /// Alias FQDNs deleted, in the order they were applied
    pub deleted: Vec<String>,
}

impl ReconcileReport {
    /// Whether the run changed anything on the store
    pub fn is_noop(&self) -> bool {
        !self.host_created && self.created.is_empty() && self.deleted.is_empty()
    }
}

/// Reconciles one host's aliases against a record store
///
/// The reconciler is stateless: every call re-reads the store. Concurrent
/// calls are not coordinated, so two runs for the same host may race.
pub struct Reconciler {
    /// Store holding the records
    store: Arc<dyn RecordStore>,

    /// Domain suffix for deriving short names
    domain: String,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `store`: Record store implementation
    /// - `domain`: Domain suffix stripped from FQDNs to obtain short names
    pub fn new(store: Arc<dyn RecordStore>, domain: impl Into<String>) -> Self {
        Self {
            store,
            domain: domain.into(),
        }
    }

    /// Make the store's aliases for `host` match `desired` exactly
    ///
    /// Bare names (no `.`) are qualified with the configured domain. Names
    /// outside the domain are rejected before the store is touched.
    ///
    /// # Parameters
    ///
    /// - `host`: Host name or FQDN the aliases belong to
    /// - `desired`: Alias names or FQDNs the host should have
    /// - `host_ip`: Address used only if the host record must be created
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileReport)`: Every computed change was applied
    /// - `Err(Error::InvalidInput)`: A name lies outside the domain; nothing was changed
    /// - `Err(Error)`: The first failing operation; earlier changes remain
    pub async fn reconcile(
        &self,
        host: &str,
        desired: &[String],
        host_ip: IpAddr,
    ) -> Result<ReconcileReport> {
        let host = self.qualify(host)?;
        let desired = desired
            .iter()
            .map(|alias| self.qualify(alias))
            .collect::<Result<Vec<_>>>()?;

        let mut report = ReconcileReport {
            host: host.clone(),
            ..Default::default()
        };

        report.host_created = self.ensure_host(&host, host_ip).await?;

        let current = self.store.aliases_for_host(&host).await?;
        let diff = compute_diff(&desired, &current);

        if diff.is_empty() {
            debug!("Aliases for {} already in sync ({} alias(es))", host, current.len());
            return Ok(report);
        }

        let store = self.store.store_name();
        if !diff.to_create.is_empty() {
            info!(
                "Creating {} aliases for {} on {}: [{}]",
                diff.to_create.len(),
                host,
                store,
                diff.to_create.join(", ")
            );
        }
        if !diff.to_delete.is_empty() {
            info!(
                "Deleting {} aliases for {} on {}: [{}]",
                diff.to_delete.len(),
                host,
                store,
                diff.to_delete.join(", ")
            );
        }

        for alias_fqdn in diff.to_create {
            let hostname = short_name(&alias_fqdn, &self.domain);
            let alias = AliasRecord::new(hostname, self.domain.as_str(), host.as_str());

            if let Err(e) = self.store.create_alias(&alias).await {
                error!(
                    "Failed to create alias {} for {} on {}: {}",
                    alias_fqdn, host, store, e
                );
                return Err(e);
            }
            report.created.push(alias_fqdn);
        }

        for alias_fqdn in diff.to_delete {
            if let Err(e) = self.store.delete_alias(&alias_fqdn).await {
                error!(
                    "Failed to delete alias {} of {} on {}: {}",
                    alias_fqdn, host, store, e
                );
                return Err(e);
            }
            report.deleted.push(alias_fqdn);
        }

        info!(
            "Reconciled {} on {}: {} created, {} deleted",
            host,
            store,
            report.created.len(),
            report.deleted.len()
        );

        Ok(report)
    }

    /// Turn `name` into an FQDN inside the configured domain
    ///
    /// A bare name gets the domain appended. A dotted name must already end
    /// with `.<domain>`, otherwise its short name would not round-trip.
    fn qualify(&self, name: &str) -> Result<String> {
        if name.is_empty() {
            return Err(Error::invalid_input("Record name cannot be empty"));
        }
        if !name.contains('.') {
            return Ok(fqdn(name, &self.domain));
        }
        if short_name(name, &self.domain) == name {
            return Err(Error::invalid_input(format!(
                "{} is outside domain {}",
                name, self.domain
            )));
        }

        Ok(name.to_string())
    }

    /// Create the host record if it is absent
    ///
    /// Returns whether a record was created.
    async fn ensure_host(&self, host: &str, host_ip: IpAddr) -> Result<bool> {
        if self.store.host_exists(host).await? {
            return Ok(false);
        }

        let hostname = short_name(host, &self.domain);
        info!(
            "{} does not exist. Creating host override with hostname ({}), domain ({}) and IP ({}) on {}",
            host,
            hostname,
            self.domain,
            host_ip,
            self.store.store_name()
        );

        let record = HostRecord::new(hostname, self.domain.as_str(), host_ip);
        if let Err(e) = self.store.create_host(&record).await {
            error!("Failed to create host override {}: {}", host, e);
            return Err(e);
        }

        Ok(true)
    }
}
