//! In-memory storage implementation for testing and the local namespace.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::storage::error::StorageError;
use crate::storage::traits::DurableStorage;

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, String>,
    alarm: Option<SystemTime>,
    fail_writes: bool,
}

impl MemoryState {
    fn check_writable(&self, key: Option<&str>) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::WriteFailed {
                key: key.map(str::to_string),
                reason: "write failures injected".to_string(),
            });
        }
        Ok(())
    }
}

/// Ordered in-memory store for one actor instance.
///
/// Cloning yields another handle to the same data, which lets a host keep the
/// store alive while the in-memory actor instance is dropped and recreated.
/// State is lost when the last handle is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Rc<RefCell<MemoryState>>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    /// All stored keys, in order.
    pub fn keys(&self) -> Vec<String> {
        self.state.borrow().entries.keys().cloned().collect()
    }

    /// Make every subsequent write fail with [`StorageError::WriteFailed`].
    ///
    /// Reads keep working. Used to exercise error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    fn list_entries(&self, prefix: &str) -> BTreeMap<String, String> {
        let state = self.state.borrow();
        state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[async_trait(?Send)]
impl DurableStorage for InMemoryStorage {
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<(String, String)>, StorageError> {
        Ok(self.list_entries(prefix).into_iter().take(limit).collect())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.state.borrow().entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        state.check_writable(Some(key))?;
        state.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let mut state = self.state.borrow_mut();
        state.check_writable(Some(key))?;
        Ok(state.entries.remove(key).is_some())
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        state.check_writable(None)?;
        state.entries.clear();
        Ok(())
    }

    async fn get_alarm(&self) -> Result<Option<SystemTime>, StorageError> {
        Ok(self.state.borrow().alarm)
    }

    async fn set_alarm(&self, at: SystemTime) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        state.check_writable(None)?;
        state.alarm = Some(at);
        Ok(())
    }

    async fn delete_alarm(&self) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        state.check_writable(None)?;
        state.alarm = None;
        Ok(())
    }

    async fn transaction(&self) -> Result<Rc<dyn DurableStorage>, StorageError> {
        Ok(Rc::new(MemoryTransaction::new(self.clone())))
    }
}

/// Writes buffered by an open transaction.
#[derive(Debug, Default)]
struct PendingWrites {
    /// `delete_all` was called; base entries are hidden.
    cleared: bool,
    /// `Some` = put, `None` = delete.
    writes: BTreeMap<String, Option<String>>,
    /// `Some(None)` = alarm deleted.
    alarm: Option<Option<SystemTime>>,
    closed: bool,
}

/// Transaction view over an [`InMemoryStorage`].
#[derive(Debug)]
struct MemoryTransaction {
    base: InMemoryStorage,
    pending: RefCell<PendingWrites>,
}

impl MemoryTransaction {
    fn new(base: InMemoryStorage) -> Self {
        Self {
            base,
            pending: RefCell::new(PendingWrites::default()),
        }
    }

    fn with_open<T>(
        &self,
        f: impl FnOnce(&mut PendingWrites) -> T,
    ) -> Result<T, StorageError> {
        let mut pending = self.pending.borrow_mut();
        if pending.closed {
            return Err(StorageError::TransactionClosed);
        }
        Ok(f(&mut pending))
    }
}

#[async_trait(?Send)]
impl DurableStorage for MemoryTransaction {
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<(String, String)>, StorageError> {
        let pending = self.pending.borrow();
        let mut entries = if pending.cleared {
            BTreeMap::new()
        } else {
            self.base.list_entries(prefix)
        };
        for (key, write) in pending.writes.iter().filter(|(k, _)| k.starts_with(prefix)) {
            match write {
                Some(value) => {
                    entries.insert(key.clone(), value.clone());
                }
                None => {
                    entries.remove(key);
                }
            }
        }
        Ok(entries.into_iter().take(limit).collect())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        {
            let pending = self.pending.borrow();
            if let Some(write) = pending.writes.get(key) {
                return Ok(write.clone());
            }
            if pending.cleared {
                return Ok(None);
            }
        }
        self.base.get(key).await
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.with_open(|pending| {
            pending.writes.insert(key.to_string(), Some(value));
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let existed = self.get(key).await?.is_some();
        self.with_open(|pending| {
            pending.writes.insert(key.to_string(), None);
        })?;
        Ok(existed)
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        self.with_open(|pending| {
            pending.cleared = true;
            pending.writes.clear();
        })
    }

    async fn get_alarm(&self) -> Result<Option<SystemTime>, StorageError> {
        if let Some(alarm) = self.pending.borrow().alarm {
            return Ok(alarm);
        }
        self.base.get_alarm().await
    }

    async fn set_alarm(&self, at: SystemTime) -> Result<(), StorageError> {
        self.with_open(|pending| pending.alarm = Some(Some(at)))
    }

    async fn delete_alarm(&self) -> Result<(), StorageError> {
        self.with_open(|pending| pending.alarm = Some(None))
    }

    async fn transaction(&self) -> Result<Rc<dyn DurableStorage>, StorageError> {
        Err(StorageError::NestedTransaction)
    }

    async fn commit(&self) -> Result<(), StorageError> {
        let mut pending = self.pending.borrow_mut();
        if pending.closed {
            return Err(StorageError::TransactionClosed);
        }

        let mut state = self.base.state.borrow_mut();
        state.check_writable(None)?;
        if pending.cleared {
            state.entries.clear();
        }
        for (key, write) in std::mem::take(&mut pending.writes) {
            match write {
                Some(value) => {
                    state.entries.insert(key, value);
                }
                None => {
                    state.entries.remove(&key);
                }
            }
        }
        if let Some(alarm) = pending.alarm.take() {
            state.alarm = alarm;
        }
        pending.closed = true;
        Ok(())
    }
}
