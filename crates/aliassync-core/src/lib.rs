// # aliassync-core
//
// Core library for reconciling DNS host aliases on a firewall's resolver.
//
// ## Architecture Overview
//
// - **records**: Host and alias record models in the remote store's wire shape
// - **RecordStore**: Trait over the remote store's create/list/delete capabilities
// - **Reconciler**: Ensures a host exists and brings its aliases to a desired set
// - **MemoryRecordStore**: In-memory RecordStore for tests and embedding
//
// ## Design Principles
//
// 1. **Stateless**: Every reconciliation re-reads the remote store
// 2. **Sequential**: One remote operation at a time, in a fixed order
// 3. **Fail fast**: The first failed operation ends the run; the next run
//    converges from wherever the store was left
// 4. **Library-First**: The daemon is a thin HTTP shell around this crate

pub mod config;
pub mod error;
pub mod reconciler;
pub mod records;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{StoreConfig, SyncConfig};
pub use error::{Error, Result};
pub use reconciler::{AliasDiff, ReconcileReport, Reconciler, compute_diff};
pub use records::{AliasRecord, HostRecord, HostReference};
pub use store::MemoryRecordStore;
pub use traits::RecordStore;
