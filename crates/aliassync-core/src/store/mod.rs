//! Record store implementations bundled with the core
//!
//! - [`MemoryRecordStore`]: In-memory store (testing, embedding)

pub mod memory;

pub use memory::MemoryRecordStore;
