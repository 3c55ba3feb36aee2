//! Translation of actor responses into caller-facing values and errors.

use http::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::actor::tagged;
use crate::error::RpcError;

/// Successful response, decoded according to the `parse` preference.
#[derive(Debug)]
pub enum RpcResponse {
    /// Body decoded as JSON.
    Json(Value),
    /// Non-empty body that is not JSON.
    Text(String),
    /// The response itself: `parse` was off, or the body was empty.
    Raw(Response<String>),
}

impl RpcResponse {
    /// The JSON value, if the body decoded as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RpcResponse::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Status of a raw response; `200` for decoded bodies.
    pub fn status(&self) -> StatusCode {
        match self {
            RpcResponse::Raw(response) => response.status(),
            _ => StatusCode::OK,
        }
    }
}

/// Whether a status passes through untranslated.
pub fn is_success(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::SWITCHING_PROTOCOLS
}

/// Pass successful responses through, turn anything else into
/// `RpcError::Remote`.
pub fn check_status(response: Response<String>) -> Result<Response<String>, RpcError> {
    let status = response.status();
    if is_success(status) {
        return Ok(response);
    }
    Err(RpcError::Remote {
        status,
        message: error_message(status, response.body()),
    })
}

/// Message of an error response: the JSON `error` field, else the body, else
/// the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return match value {
            Value::Object(mut fields) => match fields.remove("error") {
                Some(Value::String(message)) => message,
                Some(other) => other.to_string(),
                None => body.to_string(),
            },
            Value::String(message) => message,
            other => other.to_string(),
        };
    }
    if !body.trim().is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

/// Translate a response for the raw call family.
pub fn translate_response(response: Response<String>, parse: bool) -> Result<RpcResponse, RpcError> {
    let response = check_status(response)?;
    if !parse || response.body().is_empty() {
        return Ok(RpcResponse::Raw(response));
    }
    match serde_json::from_str(response.body()) {
        Ok(value) => Ok(RpcResponse::Json(value)),
        Err(_) => Ok(RpcResponse::Text(response.into_body())),
    }
}

/// Decode a response body into `T`. An empty body decodes from `null`.
///
/// Float fields accept the tagged form of non-finite values.
pub fn decode_body<T: DeserializeOwned>(response: Response<String>) -> Result<T, RpcError> {
    let response = check_status(response)?;
    let body = response.body();
    let value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body)?
    };
    Ok(tagged::from_value(value)?)
}
