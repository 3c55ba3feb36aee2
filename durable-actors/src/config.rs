//! Per-instance configuration for [`DurableRuntime`](crate::DurableRuntime).
//!
//! Every runtime receives its own [`DurableConfig`]; there are no
//! process-wide defaults to mutate.

use std::fmt;
use std::rc::Rc;

use http::Response;

use crate::codec::{JsonCodec, StateCodec};
use crate::error::ActorError;
use crate::protocol::error_response;

/// Default key prefix for persisted fields.
pub const DEFAULT_PREFIX: &str = "_itty:";

/// Default maximum number of entries read back on load.
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Translates a routing error into the response sent to the caller.
pub type ErrorHandler = Rc<dyn Fn(&ActorError) -> Response<String>>;

/// The default error handler: the error's status and message as
/// `{"error": message, "status": code}`.
pub fn default_error_handler(err: &ActorError) -> Response<String> {
    error_response(err.status(), &err.to_string())
}

/// Configuration of one actor runtime.
///
/// # Example
///
/// ```rust
/// use durable_actors::DurableConfig;
///
/// let config = DurableConfig::builder()
///     .auto_persist(true)
///     .prefix("counter:")
///     .build();
///
/// assert!(config.auto_persist());
/// assert!(!config.auto_return());
/// assert_eq!(config.prefix(), "counter:");
/// ```
#[derive(Clone)]
pub struct DurableConfig {
    auto_persist: bool,
    auto_return: bool,
    prefix: String,
    list_limit: usize,
    codec: Rc<dyn StateCodec>,
    on_error: ErrorHandler,
}

impl DurableConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> DurableConfigBuilder {
        DurableConfigBuilder::default()
    }

    /// Persist every field after each request.
    pub fn auto_persist(&self) -> bool {
        self.auto_persist
    }

    /// Respond with the actor state when a handler returns nothing.
    pub fn auto_return(&self) -> bool {
        self.auto_return
    }

    /// Key prefix for persisted fields.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Maximum number of entries read back on load.
    pub fn list_limit(&self) -> usize {
        self.list_limit
    }

    /// Codec used for stored values.
    pub fn codec(&self) -> &Rc<dyn StateCodec> {
        &self.codec
    }

    /// Routing error translator.
    pub fn on_error(&self) -> &ErrorHandler {
        &self.on_error
    }

    /// Store key for a field.
    pub fn field_key(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field)
    }
}

impl Default for DurableConfig {
    fn default() -> Self {
        DurableConfigBuilder::default().build()
    }
}

impl fmt::Debug for DurableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DurableConfig")
            .field("auto_persist", &self.auto_persist)
            .field("auto_return", &self.auto_return)
            .field("prefix", &self.prefix)
            .field("list_limit", &self.list_limit)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

/// Builder for [`DurableConfig`].
#[derive(Clone)]
pub struct DurableConfigBuilder {
    auto_persist: bool,
    auto_return: bool,
    prefix: String,
    list_limit: usize,
    codec: Rc<dyn StateCodec>,
    on_error: ErrorHandler,
}

impl Default for DurableConfigBuilder {
    fn default() -> Self {
        Self {
            auto_persist: false,
            auto_return: false,
            prefix: DEFAULT_PREFIX.to_string(),
            list_limit: DEFAULT_LIST_LIMIT,
            codec: Rc::new(JsonCodec),
            on_error: Rc::new(default_error_handler),
        }
    }
}

impl DurableConfigBuilder {
    /// Persist every field after each request.
    pub fn auto_persist(mut self, enabled: bool) -> Self {
        self.auto_persist = enabled;
        self
    }

    /// Respond with the actor state when a handler returns nothing.
    pub fn auto_return(mut self, enabled: bool) -> Self {
        self.auto_return = enabled;
        self
    }

    /// Set the key prefix for persisted fields.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the maximum number of entries read back on load.
    pub fn list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Replace the state codec.
    pub fn codec(mut self, codec: Rc<dyn StateCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the routing error translator.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ActorError) -> Response<String> + 'static,
    {
        self.on_error = Rc::new(handler);
        self
    }

    /// Build the configuration (infallible).
    pub fn build(self) -> DurableConfig {
        DurableConfig {
            auto_persist: self.auto_persist,
            auto_return: self.auto_return,
            prefix: self.prefix,
            list_limit: self.list_limit,
            codec: self.codec,
            on_error: self.on_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_default() {
        let config = DurableConfig::default();
        assert!(!config.auto_persist());
        assert!(!config.auto_return());
        assert_eq!(config.prefix(), "_itty:");
        assert_eq!(config.list_limit(), 1000);
    }

    #[test]
    fn test_builder() {
        let config = DurableConfig::builder()
            .auto_persist(true)
            .auto_return(true)
            .prefix("p/")
            .list_limit(10)
            .build();

        assert!(config.auto_persist());
        assert!(config.auto_return());
        assert_eq!(config.field_key("count"), "p/count");
        assert_eq!(config.list_limit(), 10);
    }

    #[test]
    fn test_default_error_handler() {
        let response = default_error_handler(&ActorError::MethodNotFound("explode".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = serde_json::from_str(response.body()).expect("json");
        assert_eq!(
            body,
            json!({ "error": "method not found: explode", "status": 500 })
        );
    }

    #[test]
    fn test_custom_error_handler() {
        let config = DurableConfig::builder()
            .on_error(|_| error_response(StatusCode::IM_A_TEAPOT, "custom"))
            .build();

        let response = (config.on_error())(&ActorError::UnhandledRequest);
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
