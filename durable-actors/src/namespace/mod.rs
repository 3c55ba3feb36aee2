//! Hosting and addressing of actor instances.
//!
//! - **ActorNamespace**: resolves names and ids to stubs for one actor type
//! - **ActorStub**: delivers a request to one instance
//! - **LocalNamespace**: in-process namespace hosting [`DurableRuntime`]s
//! - **Env**: named bindings handed to actors and clients
//!
//! [`DurableRuntime`]: crate::DurableRuntime

pub mod env;
pub mod id;
pub mod local;

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use http::{Request, Response};

use crate::error::RpcError;

pub use env::{Binding, Env};
pub use id::{DurableId, IdError};
pub use local::LocalNamespace;

/// Network handle to one actor instance.
#[async_trait(?Send)]
pub trait ActorStub: fmt::Debug {
    /// Id of the instance this stub reaches.
    fn id(&self) -> &DurableId;

    /// Deliver a request and wait for the instance's response.
    ///
    /// Errors only when the request could not be delivered. Error statuses
    /// produced by the actor are returned as responses.
    async fn fetch(&self, request: Request<String>) -> Result<Response<String>, RpcError>;
}

/// Resolves identifiers to stubs for one actor type.
///
/// Exactly one instance exists per id; the namespace creates it on first
/// use.
pub trait ActorNamespace: fmt::Debug {
    /// Id of the instance addressed by `name`.
    fn id_from_name(&self, name: &str) -> DurableId {
        DurableId::from_name(name)
    }

    /// Parse the string form of an id.
    fn id_from_string(&self, id: &str) -> Result<DurableId, IdError> {
        DurableId::parse(id)
    }

    /// Fresh random id.
    fn new_unique_id(&self) -> DurableId {
        DurableId::unique()
    }

    /// Stub for the instance with this id.
    fn get(&self, id: &DurableId) -> Rc<dyn ActorStub>;
}
