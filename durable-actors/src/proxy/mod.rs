//! Client side: transparent proxies over actor namespaces.
//!
//! A [`DurableProxy`] wraps one namespace binding and hands out
//! [`ProxyHandle`]s. Handles turn method calls, field reads and field writes
//! into action requests and unwrap the responses, re-raising actor errors as
//! [`RpcError::Remote`](crate::RpcError::Remote) with the remote status.

pub mod handle;
pub mod response;

use std::rc::Rc;

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::error::RpcError;
use crate::namespace::{ActorNamespace, DurableId, IdError};

pub use handle::{FieldRef, Member, MethodRef, ProxyHandle, Shape};
pub use response::{RpcResponse, translate_response};

/// How a handle addresses its instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A pre-resolved id.
    Id(DurableId),
    /// A name, resolved with `id_from_name` and sent as the lookup name.
    Name(String),
}

impl From<DurableId> for Lookup {
    fn from(id: DurableId) -> Self {
        Lookup::Id(id)
    }
}

impl From<&str> for Lookup {
    fn from(name: &str) -> Self {
        Lookup::Name(name.to_string())
    }
}

impl From<String> for Lookup {
    fn from(name: String) -> Self {
        Lookup::Name(name)
    }
}

/// Proxy factory over one actor namespace binding.
#[derive(Debug, Clone)]
pub struct DurableProxy {
    binding: String,
    namespace: Rc<dyn ActorNamespace>,
    parse: bool,
    headers: HeaderMap,
    shape: Option<Shape>,
}

impl DurableProxy {
    /// Proxy over `namespace`, known as `binding`.
    ///
    /// With `parse`, raw responses are decoded as JSON or text.
    pub fn new(binding: impl Into<String>, namespace: Rc<dyn ActorNamespace>, parse: bool) -> Self {
        Self {
            binding: binding.into(),
            namespace,
            parse,
            headers: HeaderMap::new(),
            shape: None,
        }
    }

    /// Distinguish methods from fields with `shape`.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Send an extra header with every request.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Binding name.
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Whether raw responses are decoded.
    pub fn parse(&self) -> bool {
        self.parse
    }

    /// The wrapped namespace.
    pub fn namespace(&self) -> &Rc<dyn ActorNamespace> {
        &self.namespace
    }

    /// Id of the instance addressed by `name`.
    pub fn id_from_name(&self, name: &str) -> DurableId {
        self.namespace.id_from_name(name)
    }

    /// Parse the string form of an id.
    pub fn id_from_string(&self, id: &str) -> Result<DurableId, IdError> {
        self.namespace.id_from_string(id)
    }

    /// Fresh random id.
    pub fn new_unique_id(&self) -> DurableId {
        self.namespace.new_unique_id()
    }

    /// Handle on the instance addressed by `lookup`.
    pub fn get(&self, lookup: impl Into<Lookup>) -> ProxyHandle {
        let (id, name) = match lookup.into() {
            Lookup::Id(id) => (id, None),
            Lookup::Name(name) => (self.namespace.id_from_name(&name), Some(name)),
        };
        ProxyHandle::new(
            self.namespace.get(&id),
            name,
            self.headers.clone(),
            self.parse,
            self.shape.clone(),
        )
    }

    /// Handle on the instance with the string id `id`.
    pub fn get_by_string(&self, id: &str) -> Result<ProxyHandle, RpcError> {
        let id = self
            .id_from_string(id)
            .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
        Ok(self.get(id))
    }
}
