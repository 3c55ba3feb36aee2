//! Client-side stand-in for one actor instance.

use std::collections::BTreeSet;
use std::rc::Rc;

use http::{HeaderMap, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::actor::tagged;
use crate::error::RpcError;
use crate::namespace::{ActorStub, DurableId};
use crate::protocol::ActionEnvelope;
use crate::proxy::response::{RpcResponse, check_status, decode_body, translate_response};

/// Member name forwarded untranslated to the stub.
pub const TRANSPORT_MEMBER: &str = "fetch";

/// Method names of an actor type, used to tell methods from fields without
/// contacting the actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    methods: BTreeSet<String>,
}

impl Shape {
    /// Shape listing `methods`.
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` is a method of the actor.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }
}

impl<S: Into<String>> FromIterator<S> for Shape {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// What a member name resolves to on a [`ProxyHandle`].
#[derive(Debug)]
pub enum Member<'a> {
    /// The reserved transport member; use [`ProxyHandle::fetch`].
    Transport(&'a ProxyHandle),
    /// A data field.
    Field(FieldRef<'a>),
    /// A method.
    Method(MethodRef<'a>),
}

/// A field of the remote actor.
#[derive(Debug, Clone)]
pub struct FieldRef<'a> {
    handle: &'a ProxyHandle,
    name: String,
}

impl FieldRef<'_> {
    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the field (`get-prop`).
    pub async fn read<T: DeserializeOwned>(&self) -> Result<T, RpcError> {
        self.handle.get(&self.name).await
    }

    /// Assign the field (`set`).
    pub async fn write<V: Serialize + ?Sized>(&self, value: &V) -> Result<RpcResponse, RpcError> {
        self.handle.set(&self.name, value).await
    }
}

/// A method of the remote actor.
#[derive(Debug, Clone)]
pub struct MethodRef<'a> {
    handle: &'a ProxyHandle,
    name: String,
}

impl MethodRef<'_> {
    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the method and decode its result.
    pub async fn invoke<T: DeserializeOwned>(&self, args: Vec<Value>) -> Result<T, RpcError> {
        self.handle.call(&self.name, args).await
    }

    /// Call the method and translate the response by the `parse` preference.
    pub async fn invoke_raw(&self, args: Vec<Value>) -> Result<RpcResponse, RpcError> {
        self.handle.call_raw(&self.name, args).await
    }
}

/// Local stand-in for a remote actor instance.
///
/// Every method, field read and field write becomes one action request on
/// the wrapped stub. The lookup name, if any, travels with every request.
#[derive(Debug, Clone)]
pub struct ProxyHandle {
    stub: Rc<dyn ActorStub>,
    name: Option<String>,
    headers: HeaderMap,
    parse: bool,
    shape: Option<Shape>,
}

impl ProxyHandle {
    pub(crate) fn new(
        stub: Rc<dyn ActorStub>,
        name: Option<String>,
        headers: HeaderMap,
        parse: bool,
        shape: Option<Shape>,
    ) -> Self {
        Self {
            stub,
            name,
            headers,
            parse,
            shape,
        }
    }

    /// Id of the remote instance.
    pub fn id(&self) -> &DurableId {
        self.stub.id()
    }

    /// Lookup name sent with every request.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Resolve a member name.
    ///
    /// `fetch` is the transport member. With a shape, names that are not
    /// methods of it are fields. Everything else is a method.
    pub fn member(&self, name: &str) -> Member<'_> {
        if name == TRANSPORT_MEMBER {
            return Member::Transport(self);
        }
        match &self.shape {
            Some(shape) if !shape.has_method(name) => Member::Field(FieldRef {
                handle: self,
                name: name.to_string(),
            }),
            _ => Member::Method(MethodRef {
                handle: self,
                name: name.to_string(),
            }),
        }
    }

    /// Send a request to the instance untranslated.
    pub async fn fetch(&self, request: Request<String>) -> Result<Response<String>, RpcError> {
        self.stub.fetch(request).await
    }

    /// Call a method and decode its result.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, RpcError> {
        decode_body(self.send(ActionEnvelope::call(method, args)).await?)
    }

    /// Call a method; the response is translated by the `parse` preference.
    pub async fn call_raw(&self, method: &str, args: Vec<Value>) -> Result<RpcResponse, RpcError> {
        translate_response(self.send(ActionEnvelope::call(method, args)).await?, self.parse)
    }

    /// Read a field and decode it.
    pub async fn get<T: DeserializeOwned>(&self, field: &str) -> Result<T, RpcError> {
        decode_body(self.send(ActionEnvelope::get_prop(field)).await?)
    }

    /// Read a field; the response is translated by the `parse` preference.
    pub async fn get_raw(&self, field: &str) -> Result<RpcResponse, RpcError> {
        translate_response(self.send(ActionEnvelope::get_prop(field)).await?, self.parse)
    }

    /// Assign a field. Resolves once the write is acknowledged.
    pub async fn set<V: Serialize + ?Sized>(
        &self,
        field: &str,
        value: &V,
    ) -> Result<RpcResponse, RpcError> {
        let value = tagged::to_value(value)?;
        translate_response(self.send(ActionEnvelope::set(field, value)).await?, self.parse)
    }

    async fn send(&self, envelope: ActionEnvelope) -> Result<Response<String>, RpcError> {
        let envelope = envelope.with_name(self.name.clone());
        let mut request = envelope
            .to_request()
            .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
        for (key, value) in &self.headers {
            request.headers_mut().append(key.clone(), value.clone());
        }

        tracing::debug!(
            id = %self.stub.id(),
            action = %envelope.action,
            member = %envelope.target,
            "sending action"
        );
        check_status(self.stub.fetch(request).await?)
    }
}
