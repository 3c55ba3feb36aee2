//! Durable key-value storage for actor fields and alarms.
//!
//! This module provides the store adapter the actor runtime is handed:
//!
//! - **DurableStorage**: Trait for prefix listing, get/put/delete, alarms and
//!   transactional views, scoped to one actor instance
//! - **InMemoryStorage**: Ordered in-memory implementation for tests and the
//!   local namespace

pub mod error;
pub mod memory;
pub mod traits;

// Re-exports
pub use error::StorageError;
pub use memory::InMemoryStorage;
pub use traits::DurableStorage;
