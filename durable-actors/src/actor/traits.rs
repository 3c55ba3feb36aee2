//! The capability interface implemented by every actor type.

use async_trait::async_trait;
use http::{Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::actor::{ActorContext, tagged};
use crate::error::ActorError;
use crate::protocol::json_response;

/// A durable actor type.
///
/// The actor keeps its data in [`State`](Self::State), whose serde schema is
/// the list of persisted fields. Methods reachable through `call` are
/// dispatched by hand in [`invoke`](Self::invoke); every other hook has a
/// default.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use durable_actors::{ActorContext, ActorError, Args, DurableObject, Reply};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct CounterState {
///     count: u64,
/// }
///
/// #[derive(Default)]
/// struct Counter {
///     state: CounterState,
/// }
///
/// #[async_trait(?Send)]
/// impl DurableObject for Counter {
///     type State = CounterState;
///
///     fn state(&self) -> &CounterState {
///         &self.state
///     }
///
///     fn state_mut(&mut self) -> &mut CounterState {
///         &mut self.state
///     }
///
///     async fn invoke(
///         &mut self,
///         _ctx: &mut ActorContext,
///         method: &str,
///         args: Args,
///     ) -> Result<Option<Reply>, ActorError> {
///         match method {
///             "increment" => {
///                 self.state.count += 1;
///                 Ok(None)
///             }
///             "add" => {
///                 self.state.count += args.get::<u64>(0)?;
///                 Ok(Some(Reply::json(&self.state.count)?))
///             }
///             other => Err(ActorError::MethodNotFound(other.to_string())),
///         }
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait DurableObject: 'static {
    /// Persisted field schema. Must serialize to a map of fields.
    type State: Serialize + DeserializeOwned;

    /// Current state.
    fn state(&self) -> &Self::State;

    /// Current state, mutably.
    fn state_mut(&mut self) -> &mut Self::State;

    /// Dispatch a `call` action.
    ///
    /// Return `Ok(None)` when the method produces no value. Built-in
    /// lifecycle methods are handled by the runtime and never reach here.
    async fn invoke(
        &mut self,
        _ctx: &mut ActorContext,
        method: &str,
        _args: Args,
    ) -> Result<Option<Reply>, ActorError> {
        Err(ActorError::MethodNotFound(method.to_string()))
    }

    /// Runs once persisted fields have been overlaid onto the state.
    async fn on_load(&mut self, _ctx: &mut ActorContext) -> Result<(), ActorError> {
        Ok(())
    }

    /// Runs after the store was wiped. A returned value becomes the result
    /// of the `destroy` call.
    async fn on_destroy(&mut self, _ctx: &mut ActorContext) -> Result<Option<Value>, ActorError> {
        Ok(None)
    }

    /// Runs on a scheduled wake-up, inside a store transaction.
    async fn on_alarm(&mut self, _ctx: &mut ActorContext) -> Result<(), ActorError> {
        Ok(())
    }

    /// Fallback for requests the action router did not answer.
    async fn fetch(
        &mut self,
        _ctx: &mut ActorContext,
        _request: &Request<String>,
    ) -> Result<Option<Response<String>>, ActorError> {
        Ok(None)
    }

    /// Custom representation used by auto-return and `to_json`.
    ///
    /// `None` falls back to the persistable fields.
    fn to_json(&self) -> Option<Value> {
        None
    }
}

/// Result of an actor method.
#[derive(Debug)]
pub enum Reply {
    /// JSON-encoded into a 200 response.
    Value(Value),
    /// Sent to the caller as is.
    Response(Response<String>),
}

impl Reply {
    /// Serialize any value into a JSON reply.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ActorError> {
        tagged::to_value(value)
            .map(Reply::Value)
            .map_err(|e| ActorError::Handler(e.to_string()))
    }

    /// Response sent to the caller.
    pub fn into_response(self) -> Response<String> {
        match self {
            Reply::Value(value) => json_response(&value),
            Reply::Response(response) => response,
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Value(value)
    }
}

impl From<Response<String>> for Reply {
    fn from(response: Response<String>) -> Self {
        Reply::Response(response)
    }
}

/// Positional arguments of a `call` action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Value>);

impl Args {
    /// Wrap an argument list.
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Arguments from decoded action content.
    ///
    /// An array is the argument list; any other value is a single argument.
    pub fn from_content(content: Option<Value>) -> Self {
        match content {
            None => Self::default(),
            Some(Value::Array(values)) => Self(values),
            Some(other) => Self(vec![other]),
        }
    }

    /// Number of arguments supplied.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no argument was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw argument at `index`.
    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Decode the argument at `index`.
    ///
    /// A missing argument decodes from `null`, so optional parameters can be
    /// read as `Option<T>`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, ActorError> {
        let value = self.0.get(index).cloned().unwrap_or(Value::Null);
        tagged::from_value(value).map_err(|e| ActorError::InvalidArgument {
            index,
            reason: e.to_string(),
        })
    }

    /// The argument list.
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_args_from_content() {
        assert!(Args::from_content(None).is_empty());
        assert_eq!(Args::from_content(Some(json!([1, 2]))).len(), 2);
        assert_eq!(
            Args::from_content(Some(json!({ "reset": false }))).raw(0),
            Some(&json!({ "reset": false }))
        );
    }

    #[test]
    fn test_args_typed_access() {
        let args = Args::new(vec![json!(5), json!("name")]);

        assert_eq!(args.get::<u32>(0).expect("u32"), 5);
        assert_eq!(args.get::<String>(1).expect("string"), "name");
        assert_eq!(args.get::<Option<u32>>(2).expect("missing"), None);
    }

    #[test]
    fn test_args_invalid_argument() {
        let args = Args::new(vec![json!("five")]);
        let err = args.get::<u32>(0).expect_err("should fail");

        assert!(matches!(err, ActorError::InvalidArgument { index: 0, .. }));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_reply_into_response() {
        let response = Reply::json(&json!({ "count": 1 })).expect("json").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), r#"{"count":1}"#);

        let mut teapot = Response::new("short and stout".to_string());
        *teapot.status_mut() = StatusCode::IM_A_TEAPOT;
        let response = Reply::from(teapot).into_response();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
