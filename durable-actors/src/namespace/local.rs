//! In-process actor namespace.
//!
//! `LocalNamespace` hosts one [`DurableRuntime`] per id in the current
//! thread. Each id owns an [`InMemoryStorage`] that outlives the in-memory
//! instance, so evicting an instance and addressing it again behaves like a
//! cold start against the same durable store.
//!
//! # Turn-Based Concurrency
//!
//! Requests to one instance are serialized by an async mutex; requests to
//! different instances interleave freely. A call that would re-enter an
//! instance already handling a request further up the same call chain (an
//! actor calling itself, directly or through other actors) fails with
//! `RpcError::Transport` instead of waiting on its own lock.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::SystemTime;

use async_trait::async_trait;
use http::{Request, Response};
use tokio::sync::Mutex;

use crate::actor::{DurableObject, DurableRuntime};
use crate::config::DurableConfig;
use crate::error::RpcError;
use crate::namespace::{ActorNamespace, ActorStub, DurableId, Env};
use crate::storage::{DurableStorage, InMemoryStorage, StorageError};

type Factory<A> = Rc<dyn Fn(&DurableId) -> A>;

/// Namespace address plus id of an instance.
type InstanceKey = (usize, DurableId);

tokio::task_local! {
    /// Instances handling a request on the current task, outermost first.
    static CALL_CHAIN: Vec<InstanceKey>;
}

/// In-process namespace for actor type `A`.
///
/// Cloning yields another handle to the same instances.
///
/// # Example
///
/// ```rust,ignore
/// let counters = LocalNamespace::new(|_id| Counter::default(), DurableConfig::default());
/// let env = Env::new().with_namespace("COUNTER", Rc::new(counters.clone()));
///
/// let counter = env.proxy("COUNTER")?.get("total");
/// counter.call::<()>("increment", vec![]).await?;
/// ```
pub struct LocalNamespace<A: DurableObject> {
    inner: Rc<LocalInner<A>>,
}

struct LocalInner<A: DurableObject> {
    factory: Factory<A>,
    config: DurableConfig,
    env: RefCell<Env>,
    instances: RefCell<HashMap<DurableId, Rc<Mutex<DurableRuntime<A>>>>>,
    storages: RefCell<HashMap<DurableId, InMemoryStorage>>,
}

impl<A: DurableObject> LocalNamespace<A> {
    /// Namespace with an empty environment.
    ///
    /// `factory` builds the construction-time object for an id.
    pub fn new<F>(factory: F, config: DurableConfig) -> Self
    where
        F: Fn(&DurableId) -> A + 'static,
    {
        Self::with_env(factory, config, Env::new())
    }

    /// Namespace whose instances see `env`.
    pub fn with_env<F>(factory: F, config: DurableConfig, env: Env) -> Self
    where
        F: Fn(&DurableId) -> A + 'static,
    {
        Self {
            inner: Rc::new(LocalInner {
                factory: Rc::new(factory),
                config,
                env: RefCell::new(env),
                instances: RefCell::new(HashMap::new()),
                storages: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Replace the environment seen by instances created from now on.
    pub fn set_env(&self, env: Env) {
        *self.inner.env.borrow_mut() = env;
    }

    /// Drop the in-memory instance for `id`. Its storage is kept.
    ///
    /// Returns `true` if an instance was live.
    pub fn evict(&self, id: &DurableId) -> bool {
        let removed = self.inner.instances.borrow_mut().remove(id).is_some();
        if removed {
            tracing::debug!(id = %id, "instance evicted");
        }
        removed
    }

    /// Durable store of `id`, created empty if it does not exist yet.
    pub fn storage(&self, id: &DurableId) -> InMemoryStorage {
        self.inner.storage(id)
    }

    /// Number of live in-memory instances.
    pub fn instance_count(&self) -> usize {
        self.inner.instances.borrow().len()
    }

    /// Fire every alarm due at `now`.
    ///
    /// Each due alarm is cleared before its handler runs, so the handler may
    /// schedule the next one. Returns the number of alarms fired.
    pub async fn run_alarms(&self, now: SystemTime) -> Result<usize, StorageError> {
        let stores: Vec<(DurableId, InMemoryStorage)> = self
            .inner
            .storages
            .borrow()
            .iter()
            .map(|(id, storage)| (id.clone(), storage.clone()))
            .collect();

        let mut fired = 0;
        for (id, storage) in stores {
            match storage.get_alarm().await? {
                Some(at) if at <= now => {}
                _ => continue,
            }
            storage.delete_alarm().await?;

            let runtime = self.inner.runtime(&id);
            runtime.lock().await.alarm().await;
            fired += 1;
        }
        Ok(fired)
    }
}

impl<A: DurableObject> LocalInner<A> {
    fn storage(&self, id: &DurableId) -> InMemoryStorage {
        self.storages
            .borrow_mut()
            .entry(id.clone())
            .or_default()
            .clone()
    }

    fn runtime(&self, id: &DurableId) -> Rc<Mutex<DurableRuntime<A>>> {
        if let Some(runtime) = self.instances.borrow().get(id) {
            return Rc::clone(runtime);
        }

        tracing::debug!(id = %id, "creating instance");
        let runtime = Rc::new(Mutex::new(DurableRuntime::new(
            id.clone(),
            (self.factory)(id),
            Rc::new(self.storage(id)),
            self.env.borrow().clone(),
            self.config.clone(),
        )));
        self.instances
            .borrow_mut()
            .insert(id.clone(), Rc::clone(&runtime));
        runtime
    }
}

impl<A: DurableObject> Clone for LocalNamespace<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: DurableObject> fmt::Debug for LocalNamespace<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalNamespace")
            .field("instances", &self.instance_count())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl<A: DurableObject> ActorNamespace for LocalNamespace<A> {
    fn get(&self, id: &DurableId) -> Rc<dyn ActorStub> {
        Rc::new(LocalStub {
            id: id.clone(),
            inner: Rc::clone(&self.inner),
        })
    }
}

/// Stub delivering requests to a [`LocalNamespace`] instance.
struct LocalStub<A: DurableObject> {
    id: DurableId,
    inner: Rc<LocalInner<A>>,
}

impl<A: DurableObject> fmt::Debug for LocalStub<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStub").field("id", &self.id).finish()
    }
}

#[async_trait(?Send)]
impl<A: DurableObject> ActorStub for LocalStub<A> {
    fn id(&self) -> &DurableId {
        &self.id
    }

    async fn fetch(&self, request: Request<String>) -> Result<Response<String>, RpcError> {
        let key = (Rc::as_ptr(&self.inner) as *const () as usize, self.id.clone());
        let mut chain = CALL_CHAIN.try_with(|chain| chain.clone()).unwrap_or_default();
        if chain.contains(&key) {
            tracing::warn!(id = %self.id, depth = chain.len(), "re-entrant call rejected");
            return Err(RpcError::Transport(format!(
                "re-entrant call to instance {}",
                self.id
            )));
        }
        chain.push(key);

        let runtime = self.inner.runtime(&self.id);
        CALL_CHAIN
            .scope(chain, async move {
                let mut runtime = runtime.lock().await;
                Ok::<_, RpcError>(runtime.handle(request).await)
            })
            .await
    }
}
