//! Durable store adapters for the route cache.
//!
//! - **memory**: process-local map with an optional byte quota
//! - **json_file**: single JSON document on disk, opened through `cap_std`

mod json_file;
mod memory;

pub use json_file::{DEFAULT_STORE_FILE_NAME, JsonFileDurableStore};
pub use memory::InMemoryDurableStore;

/// Bytes accounted against a quota for one key/value pair.
fn entry_size(key: &str, value: &str) -> usize {
    key.len().saturating_add(value.len())
}
