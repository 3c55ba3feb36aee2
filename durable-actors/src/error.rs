//! Error types for durable actors and their proxies.

use http::StatusCode;

use crate::codec::CodecError;
use crate::storage::StorageError;

/// Errors raised while an actor instance handles a request.
///
/// Every variant maps to an HTTP status through [`ActorError::status`], which
/// the default error handler uses to build the client-facing response.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// `call` targeted a name that is not a method of the actor.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// `set` targeted a name that is not a field of the actor state.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// The route matched but the action is not `call`, `set` or `get-prop`.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The action content could not be decoded.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// A positional argument did not decode to the expected type.
    #[error("invalid argument {index}: {reason}")]
    InvalidArgument {
        /// Zero-based argument position.
        index: usize,
        /// Decoder message.
        reason: String,
    },

    /// Structured error carrying its own status, raised by actor methods.
    #[error("{message}")]
    Status {
        /// Status reported to the caller.
        status: StatusCode,
        /// Message reported to the caller.
        message: String,
    },

    /// The router produced no response and the actor has no fallback.
    #[error("bad request")]
    UnhandledRequest,

    /// The actor state could not be converted to or from its field map.
    #[error("state error: {0}")]
    State(String),

    /// The store adapter failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The state codec failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Any other failure inside an actor method.
    #[error("{0}")]
    Handler(String),
}

impl ActorError {
    /// Build a status-carrying error.
    pub fn status_error(status: StatusCode, message: impl Into<String>) -> Self {
        ActorError::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ActorError::Status { status, .. } => *status,
            ActorError::FieldNotFound(_) => StatusCode::NOT_FOUND,
            ActorError::UnknownAction(_)
            | ActorError::InvalidContent(_)
            | ActorError::InvalidArgument { .. }
            | ActorError::UnhandledRequest => StatusCode::BAD_REQUEST,
            ActorError::MethodNotFound(_)
            | ActorError::State(_)
            | ActorError::Storage(_)
            | ActorError::Codec(_)
            | ActorError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors observed by callers of a [`ProxyHandle`](crate::ProxyHandle).
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The named binding is missing or is not an actor namespace.
    #[error("binding `{0}` is not an addressable actor namespace")]
    Configuration(String),

    /// The actor answered with a non-success status.
    #[error("remote error ({status}): {message}")]
    Remote {
        /// Status returned by the actor.
        status: StatusCode,
        /// Message extracted from the response body.
        message: String,
    },

    /// The outbound request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The stub failed to deliver the request.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not decode to the expected type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RpcError {
    /// Remote status, when the error came from the actor.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RpcError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
