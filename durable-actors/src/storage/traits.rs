//! Storage provider trait abstraction.

use std::fmt;
use std::rc::Rc;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::storage::error::StorageError;

/// Key-value store scoped to a single actor instance.
///
/// Values are the codec-encoded text of one field each. Keys are listed in
/// ascending order.
///
/// # Single-core
///
/// No Send bounds, the runtime processes one request at a time per instance.
#[async_trait(?Send)]
pub trait DurableStorage: fmt::Debug {
    /// List up to `limit` entries whose key starts with `prefix`, in key order.
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<(String, String)>, StorageError>;

    /// Read a single key.
    ///
    /// Returns `Ok(None)` if the key has never been written or was deleted.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a single key, replacing any previous value.
    async fn put(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete a single key.
    ///
    /// Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete every key of this instance, not only the persisted-field prefix.
    async fn delete_all(&self) -> Result<(), StorageError>;

    /// The scheduled wake-up time, if any.
    async fn get_alarm(&self) -> Result<Option<SystemTime>, StorageError>;

    /// Schedule the single wake-up, replacing any previous one.
    async fn set_alarm(&self, at: SystemTime) -> Result<(), StorageError>;

    /// Cancel the scheduled wake-up.
    async fn delete_alarm(&self) -> Result<(), StorageError>;

    /// Open a transaction-scoped view over this store.
    ///
    /// Reads through the view observe its own pending writes. Nothing reaches
    /// the underlying store until [`commit`](Self::commit) is called on the
    /// view; dropping the view discards it.
    async fn transaction(&self) -> Result<Rc<dyn DurableStorage>, StorageError>;

    /// Apply a transaction view's pending writes atomically.
    ///
    /// A no-op on a store that is not a transaction view.
    async fn commit(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
