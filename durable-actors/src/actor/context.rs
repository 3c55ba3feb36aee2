//! Internal namespace of an actor instance.

use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::try_join_all;
use http::{HeaderMap, Method, Request, Uri};
use serde::Serialize;

use crate::actor::StateLifecycle;
use crate::actor::state::{self, FieldMap};
use crate::config::DurableConfig;
use crate::error::ActorError;
use crate::namespace::{DurableId, Env};
use crate::protocol;
use crate::storage::DurableStorage;

/// Transport context of the request being handled.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// The request asks for a websocket upgrade.
    pub upgrade: bool,
    /// Lookup name the caller resolved this actor by.
    pub name: Option<String>,
}

impl RequestInfo {
    /// Capture the transport context of a request.
    pub fn from_request(request: &Request<String>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            upgrade: protocol::is_upgrade(request),
            name: protocol::lookup_name(request),
        }
    }
}

/// Everything the runtime keeps about an instance besides its state.
///
/// Handed to every [`DurableObject`](crate::DurableObject) hook. Never part of
/// the persisted fields.
pub struct ActorContext {
    id: DurableId,
    storage: Rc<dyn DurableStorage>,
    env: Env,
    config: DurableConfig,
    request: Option<RequestInfo>,
    initialized: bool,
    default_state: Option<String>,
    lifecycle: StateLifecycle,
}

impl ActorContext {
    pub(crate) fn new(
        id: DurableId,
        storage: Rc<dyn DurableStorage>,
        env: Env,
        config: DurableConfig,
    ) -> Self {
        Self {
            id,
            storage,
            env,
            config,
            request: None,
            initialized: false,
            default_state: None,
            lifecycle: StateLifecycle::Uninitialized,
        }
    }

    /// Identifier of this instance.
    pub fn id(&self) -> &DurableId {
        &self.id
    }

    /// The instance store. Inside an alarm this is the transaction view.
    pub fn storage(&self) -> &Rc<dyn DurableStorage> {
        &self.storage
    }

    /// Bindings available to the actor, including other actor namespaces.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Runtime configuration.
    pub fn config(&self) -> &DurableConfig {
        &self.config
    }

    /// The request being handled, if any.
    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_ref()
    }

    /// Lookup name sent by the caller of the current request.
    pub fn name(&self) -> Option<&str> {
        self.request.as_ref().and_then(|r| r.name.as_deref())
    }

    /// Whether persisted fields have been loaded.
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Current lifecycle marker.
    pub fn lifecycle(&self) -> StateLifecycle {
        self.lifecycle
    }

    /// Codec-encoded construction-time fields, once captured.
    pub fn default_state(&self) -> Option<&str> {
        self.default_state.as_deref()
    }

    pub(crate) fn set_request(&mut self, request: RequestInfo) {
        self.request = Some(request);
    }

    pub(crate) fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    pub(crate) fn set_default_state(&mut self, snapshot: String) {
        self.default_state = Some(snapshot);
    }

    pub(crate) fn replace_storage(
        &mut self,
        storage: Rc<dyn DurableStorage>,
    ) -> Rc<dyn DurableStorage> {
        std::mem::replace(&mut self.storage, storage)
    }

    pub(crate) fn transition(&mut self, next: StateLifecycle) {
        if !self.lifecycle.can_transition_to(next) {
            tracing::warn!(
                id = %self.id,
                from = ?self.lifecycle,
                to = ?next,
                "unexpected lifecycle transition"
            );
        }
        self.lifecycle = next;
    }

    /// Write every persistable field of `state` to its own key.
    ///
    /// Writes are issued concurrently. They are not atomic across fields
    /// unless the store is a transaction view.
    pub async fn persist<S: Serialize>(&mut self, state: &S) -> Result<(), ActorError> {
        let codec = self.config.codec();
        let entries = state::persistable_fields(state)?
            .into_iter()
            .map(|(name, value)| -> Result<(String, String), ActorError> {
                Ok((self.config.field_key(&name), codec.stringify(&value)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(id = %self.id, fields = entries.len(), "persisting fields");

        let storage = &self.storage;
        try_join_all(
            entries
                .iter()
                .map(|(key, text)| storage.put(key, text.clone())),
        )
        .await?;

        self.transition(StateLifecycle::Persisted);
        Ok(())
    }

    /// Read every persisted field back, keyed by field name.
    pub async fn load_fields(&self) -> Result<FieldMap, ActorError> {
        let prefix = self.config.prefix();
        let entries = self.storage.list(prefix, self.config.list_limit()).await?;

        let mut fields = FieldMap::new();
        for (key, text) in entries {
            let Some(name) = key.strip_prefix(prefix) else {
                continue;
            };
            if !state::is_persistable(name) {
                continue;
            }
            fields.insert(name.to_string(), self.config.codec().parse(&text)?);
        }
        Ok(fields)
    }

    /// The scheduled wake-up, if any.
    pub async fn get_alarm(&self) -> Result<Option<SystemTime>, ActorError> {
        Ok(self.storage.get_alarm().await?)
    }

    /// Schedule the wake-up, replacing any previous one.
    pub async fn set_alarm(&self, at: SystemTime) -> Result<(), ActorError> {
        tracing::debug!(id = %self.id, at_ms = epoch_millis(at), "alarm scheduled");
        Ok(self.storage.set_alarm(at).await?)
    }

    /// Cancel the scheduled wake-up.
    pub async fn delete_alarm(&self) -> Result<(), ActorError> {
        Ok(self.storage.delete_alarm().await?)
    }
}

impl std::fmt::Debug for ActorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorContext")
            .field("id", &self.id)
            .field("initialized", &self.initialized)
            .field("lifecycle", &self.lifecycle)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Milliseconds since the Unix epoch, clamped at zero.
pub fn epoch_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Time point from milliseconds since the Unix epoch.
pub fn from_epoch_millis(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::*;
    use crate::storage::InMemoryStorage;

    #[derive(Serialize)]
    struct Fields {
        count: u32,
        items: Vec<u32>,
        #[serde(rename = "$cache")]
        cache: u32,
    }

    fn context(storage: &InMemoryStorage) -> ActorContext {
        ActorContext::new(
            DurableId::from_name("test"),
            Rc::new(storage.clone()),
            Env::new(),
            DurableConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_persist_writes_one_key_per_field() {
        let storage = InMemoryStorage::new();
        let mut ctx = context(&storage);
        let fields = Fields {
            count: 2,
            items: vec![1, 2],
            cache: 7,
        };

        ctx.persist(&fields).await.expect("persist");

        assert_eq!(storage.keys(), vec!["_itty:count", "_itty:items"]);
        assert_eq!(ctx.lifecycle(), StateLifecycle::Persisted);
    }

    #[tokio::test]
    async fn test_load_fields_strips_prefix() {
        let storage = InMemoryStorage::new();
        storage.put("_itty:count", "3".into()).await.expect("put");
        storage.put("other", "1".into()).await.expect("put");

        let fields = context(&storage).load_fields().await.expect("load");

        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("count"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_persist_surfaces_write_failure() {
        let storage = InMemoryStorage::new();
        storage.set_fail_writes(true);
        let mut ctx = context(&storage);

        let result = ctx
            .persist(&Fields {
                count: 1,
                items: vec![],
                cache: 0,
            })
            .await;

        assert!(matches!(result, Err(ActorError::Storage(_))));
    }

    #[tokio::test]
    async fn test_alarm_roundtrip() {
        let storage = InMemoryStorage::new();
        let ctx = context(&storage);
        let at = from_epoch_millis(1_700_000_000_000);

        ctx.set_alarm(at).await.expect("set");
        assert_eq!(ctx.get_alarm().await.expect("get"), Some(at));

        ctx.delete_alarm().await.expect("delete");
        assert_eq!(ctx.get_alarm().await.expect("get"), None);
    }

    #[test]
    fn test_epoch_millis() {
        assert_eq!(epoch_millis(from_epoch_millis(42)), 42);
        assert_eq!(epoch_millis(UNIX_EPOCH - Duration::from_secs(1)), 0);
    }
}
