//! Durable key-value preferences with an ordered fallback chain of storage media.

mod error;
mod file;
mod medium;
mod memory;
mod sqlite;
mod store;

pub use error::{MediumFault, StoreError};
pub use file::FilePreferences;
pub use medium::PreferenceMedium;
pub use memory::MemoryPreferences;
pub use sqlite::SqlitePreferences;
pub use store::{DurableStore, DurableStoreBuilder};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
