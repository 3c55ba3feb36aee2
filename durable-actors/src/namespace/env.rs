//! Named bindings handed to actors and clients.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::RpcError;
use crate::namespace::ActorNamespace;
use crate::proxy::DurableProxy;

/// One named binding.
#[derive(Debug, Clone)]
pub enum Binding {
    /// An addressable actor namespace.
    Namespace(Rc<dyn ActorNamespace>),
    /// A plain text variable.
    Text(String),
}

/// Environment bindings.
///
/// Namespace bindings are wrapped as [`DurableProxy`]s on demand so an actor
/// can call other actors the same way an outside client does.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: BTreeMap<String, Binding>,
}

impl Env {
    /// Empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an actor namespace binding.
    pub fn with_namespace(
        mut self,
        name: impl Into<String>,
        namespace: Rc<dyn ActorNamespace>,
    ) -> Self {
        self.insert(name, Binding::Namespace(namespace));
        self
    }

    /// Add a text variable binding.
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, Binding::Text(value.into()));
        self
    }

    /// Add or replace a binding.
    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    /// Binding by name.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Text variable by name.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.bindings.get(name) {
            Some(Binding::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Proxy over the namespace bound to `name`, parsing responses.
    ///
    /// # Errors
    ///
    /// `RpcError::Configuration` when the binding is missing or is not an
    /// actor namespace.
    pub fn proxy(&self, name: &str) -> Result<DurableProxy, RpcError> {
        match self.bindings.get(name) {
            Some(Binding::Namespace(namespace)) => {
                Ok(DurableProxy::new(name, Rc::clone(namespace), true))
            }
            _ => Err(RpcError::Configuration(name.to_string())),
        }
    }

    /// Proxies over every namespace binding, keyed by binding name.
    pub fn durables(&self) -> BTreeMap<String, DurableProxy> {
        self.bindings
            .iter()
            .filter_map(|(name, binding)| match binding {
                Binding::Namespace(namespace) => Some((
                    name.clone(),
                    DurableProxy::new(name.as_str(), Rc::clone(namespace), true),
                )),
                Binding::Text(_) => None,
            })
            .collect()
    }
}
