//! Core traits for aliassync
//!
//! - [`RecordStore`]: Create, list and delete host/alias records on the remote resolver

pub mod record_store;

pub use record_store::RecordStore;
