//! # durable-actors
//!
//! Location-transparent RPC against addressable, persistent, single-threaded
//! stateful actors.
//!
//! A client holds a [`ProxyHandle`] that stands in for a remote actor:
//! calling a method, reading a field or writing a field on it becomes an
//! action request routed to the actor instance, and the response is unwrapped
//! back into a native value. On the actor side, a [`DurableRuntime`] routes
//! those requests to a [`DurableObject`], loads and saves its fields to a
//! [`DurableStorage`], and runs the lifecycle hooks around loading,
//! persisting, resetting, destroying and scheduled wake-ups.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  caller                                                      │
//! │    └─ ProxyHandle ── call / get / set / member ──┐           │
//! ├──────────────────────────────────────────────────┼───────────┤
//! │  ActorNamespace / ActorStub          GET /do/{action}/{target}│
//! ├──────────────────────────────────────────────────┼───────────┤
//! │  DurableRuntime<A>                               ↓           │
//! │    load → route → fetch fallback → auto-persist              │
//! │    DurableObject (your actor) + ActorContext                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │  DurableStorage (one key per field)   StateCodec             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use durable_actors::{DurableConfig, Env, LocalNamespace};
//!
//! let config = DurableConfig::builder().auto_return(true).build();
//! let counters = LocalNamespace::new(|_id| Counter::default(), config);
//! let env = Env::new().with_namespace("COUNTER", Rc::new(counters));
//!
//! let counter = env.proxy("COUNTER")?.get("total");
//! let state: serde_json::Value = counter.call("increment", vec![]).await?;
//! ```
//!
//! ## Modules
//!
//! - [`actor`] - Actor trait, internal namespace and runtime
//! - [`namespace`] - Ids, hosting and environment bindings
//! - [`proxy`] - Client-side proxies
//! - [`storage`] - Store adapter and in-memory store
//! - [`protocol`] - Wire format shared by both sides

#![deny(missing_docs)]

pub mod actor;
pub mod codec;
pub mod config;
pub mod error;
pub mod namespace;
pub mod protocol;
pub mod proxy;
pub mod storage;

pub use actor::{
    ActorContext, Args, DestroyOptions, DurableObject, DurableRuntime, Reply, RequestInfo,
    StateLifecycle,
};
pub use codec::{CodecError, JsonCodec, StateCodec};
pub use config::{DurableConfig, DurableConfigBuilder, ErrorHandler};
pub use error::{ActorError, RpcError};
pub use namespace::{
    ActorNamespace, ActorStub, Binding, DurableId, Env, IdError, LocalNamespace,
};
pub use protocol::{Action, ActionEnvelope};
pub use proxy::{
    DurableProxy, FieldRef, Lookup, Member, MethodRef, ProxyHandle, RpcResponse, Shape,
};
pub use storage::{DurableStorage, InMemoryStorage, StorageError};
