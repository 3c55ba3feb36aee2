//! Pluggable state codec for persisted fields and action content.
//!
//! The [`StateCodec`] trait turns field values into transportable text and
//! back. Values travel as [`serde_json::Value`]; types a plain JSON document
//! cannot express on its own (sets, time points, optional fields, nested
//! structs) still round-trip because the final decode into the actor's state
//! type is directed by its serde schema. Non-finite floats reach the codec
//! already tagged as `{"$float": "NaN"}` objects, so every codec sees plain
//! JSON.
//!
//! # Example
//!
//! ```rust
//! use durable_actors::{JsonCodec, StateCodec};
//! use serde_json::json;
//!
//! let codec = JsonCodec;
//! let text = codec.stringify(&json!({ "count": 1 })).unwrap();
//! assert_eq!(text, r#"{"count":1}"#);
//! assert_eq!(codec.parse(&text).unwrap(), json!({ "count": 1 }));
//! ```

use std::fmt;

use serde_json::Value;

/// Error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Failed to encode a value to text.
    #[error("encode error: {0}")]
    Encode(String),
    /// Failed to decode text to a value.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Round-trips field values to and from transportable text.
///
/// Object safe so a runtime can hold it as `Rc<dyn StateCodec>`.
pub trait StateCodec: fmt::Debug + 'static {
    /// Encode a value to text.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Encode` if the value cannot be represented.
    fn stringify(&self, value: &Value) -> Result<String, CodecError>;

    /// Decode text produced by [`stringify`](Self::stringify).
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Decode` if the text is malformed.
    fn parse(&self, text: &str) -> Result<Value, CodecError>;
}

/// JSON codec using serde_json.
///
/// The default codec. Human-readable, which keeps stored fields easy to
/// inspect.
#[derive(Clone, Default, Debug, Copy)]
pub struct JsonCodec;

impl StateCodec for JsonCodec {
    fn stringify(&self, value: &Value) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn parse(&self, text: &str) -> Result<Value, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
