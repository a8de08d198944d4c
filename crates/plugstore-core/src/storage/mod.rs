//! Plugin-facing key-value storage.

pub mod adapter;
pub mod plugin;
pub mod traits;

pub use adapter::{NamespaceStorage, VALUE_FIELD};
pub use plugin::DocumentStoragePlugin;
pub use traits::{Storage, StoragePlugin};
