//! Wire protocol shared by the actor runtime and the proxy.
//!
//! Every action travels as a single request:
//!
//! ```text
//! GET /do/{action}/{target}
//! do-content: <JSON argument list (call) or JSON value (set)>
//! do-name:    <lookup name the caller resolved the actor by>
//! ```
//!
//! Responses carry a JSON body (200), a pass-through response produced by the
//! actor, no content (204), or an error body `{"error": "...", "status": n}`.

use std::fmt;
use std::fmt::Write as _;

use http::header::{CONTENT_TYPE, UPGRADE};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use serde_json::{Value, json};

use crate::error::ActorError;

/// First path segment of the action route.
pub const ROUTE_ROOT: &str = "do";

/// Header carrying the encoded action content.
pub const CONTENT_HEADER: &str = "do-content";

/// Header carrying the caller-supplied lookup name.
pub const NAME_HEADER: &str = "do-name";

/// Lifecycle methods every actor answers to through `call`.
pub mod builtin {
    /// Write every persistable field to the store.
    pub const PERSIST: &str = "persist";
    /// Restore the construction-time field values in memory.
    pub const RESET: &str = "reset";
    /// Wipe the store, optionally resetting in memory.
    pub const DESTROY: &str = "destroy";
    /// Read the scheduled wake-up as epoch milliseconds.
    pub const GET_ALARM: &str = "get_alarm";
    /// Schedule the wake-up at epoch milliseconds.
    pub const SET_ALARM: &str = "set_alarm";
    /// Cancel the scheduled wake-up.
    pub const DELETE_ALARM: &str = "delete_alarm";
    /// Return the auto-return representation of the actor.
    pub const TO_JSON: &str = "to_json";
}

/// Kind of access an action performs on the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Invoke a method with a positional argument list.
    Call,
    /// Assign a field.
    Set,
    /// Read a field.
    GetProp,
}

impl Action {
    /// Path segment for this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Call => "call",
            Action::Set => "set",
            Action::GetProp => "get-prop",
        }
    }

    /// Parse a path segment.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "call" => Some(Action::Call),
            "set" => Some(Action::Set),
            "get-prop" => Some(Action::GetProp),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match `GET /do/{action}/{target}`, returning the raw action and target.
///
/// The action segment is returned unparsed so the runtime can reject unknown
/// actions with a proper error instead of ignoring the request.
pub fn match_route(request: &Request<String>) -> Option<(&str, &str)> {
    if request.method() != Method::GET {
        return None;
    }

    let mut segments = request.uri().path().trim_start_matches('/').split('/');
    match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(ROUTE_ROOT), Some(action), Some(target), None)
            if !action.is_empty() && !target.is_empty() =>
        {
            Some((action, target))
        }
        _ => None,
    }
}

/// Whether the request is a `call` of `method`.
pub fn is_call(request: &Request<String>, method: &str) -> bool {
    match_route(request).is_some_and(|(action, target)| {
        Action::parse(action) == Some(Action::Call) && target == method
    })
}

/// Raw action content: the content header, or a non-empty body.
pub fn read_content(request: &Request<String>) -> Result<Option<&str>, ActorError> {
    if let Some(value) = request.headers().get(CONTENT_HEADER) {
        let text = value
            .to_str()
            .map_err(|e| ActorError::InvalidContent(e.to_string()))?;
        return Ok(Some(text));
    }
    let body = request.body();
    Ok((!body.is_empty()).then_some(body.as_str()))
}

/// Lookup name the caller attached, if any.
pub fn lookup_name(request: &Request<String>) -> Option<String> {
    request
        .headers()
        .get(NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Whether the request asks for a streaming (websocket) upgrade.
pub fn is_upgrade(request: &Request<String>) -> bool {
    request
        .headers()
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Encode a value as JSON that is always a valid header value.
///
/// Every character outside printable ASCII is written as a `\uXXXX` escape.
/// Such characters only ever occur inside JSON strings, where the escape is
/// equivalent.
pub fn to_header_json(value: &Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii() && !ch.is_ascii_control() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{:04x}", unit);
            }
        }
    }
    out
}

/// One action request, before it is turned into an HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEnvelope {
    /// What to do.
    pub action: Action,
    /// Field or method name.
    pub target: String,
    /// Argument list (`call`) or value (`set`).
    pub content: Option<Value>,
    /// Lookup name forwarded as `do-name`.
    pub name: Option<String>,
}

impl ActionEnvelope {
    /// `call` with a positional argument list.
    pub fn call(target: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            action: Action::Call,
            target: target.into(),
            content: Some(Value::Array(args)),
            name: None,
        }
    }

    /// `set` a field to a value.
    pub fn set(target: impl Into<String>, value: Value) -> Self {
        Self {
            action: Action::Set,
            target: target.into(),
            content: Some(value),
            name: None,
        }
    }

    /// `get-prop` a field.
    pub fn get_prop(target: impl Into<String>) -> Self {
        Self {
            action: Action::GetProp,
            target: target.into(),
            content: None,
            name: None,
        }
    }

    /// Attach the caller's lookup name.
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Build the HTTP request for this envelope.
    pub fn to_request(&self) -> Result<Request<String>, http::Error> {
        let uri = format!("/{}/{}/{}", ROUTE_ROOT, self.action, self.target);
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(content) = &self.content {
            builder = builder.header(CONTENT_HEADER, to_header_json(content));
        }
        if let Some(name) = &self.name {
            builder = builder.header(NAME_HEADER, name.as_str());
        }
        builder.body(String::new())
    }
}

/// 200 response with a JSON body.
pub fn json_response(value: &Value) -> Response<String> {
    let mut response = Response::new(value.to_string());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// 204 response with an empty body.
pub fn no_content() -> Response<String> {
    let mut response = Response::new(String::new());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

/// Error response `{"error": message, "status": code}`.
pub fn error_response(status: StatusCode, message: &str) -> Response<String> {
    let mut response = json_response(&json!({
        "error": message,
        "status": status.as_u16(),
    }));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, uri: &str) -> Request<String> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(String::new())
            .expect("request")
    }

    #[test]
    fn test_action_parse_roundtrip() {
        for action in [Action::Call, Action::Set, Action::GetProp] {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
        assert_eq!(Action::parse("delete"), None);
    }

    #[test]
    fn test_match_route() {
        let req = request(Method::GET, "/do/call/increment");
        assert_eq!(match_route(&req), Some(("call", "increment")));

        let req = request(Method::GET, "/do/get-prop/items");
        assert_eq!(match_route(&req), Some(("get-prop", "items")));
    }

    #[test]
    fn test_match_route_rejects_other_shapes() {
        assert_eq!(match_route(&request(Method::POST, "/do/call/x")), None);
        assert_eq!(match_route(&request(Method::GET, "/do/call")), None);
        assert_eq!(match_route(&request(Method::GET, "/do/call/x/y")), None);
        assert_eq!(match_route(&request(Method::GET, "/other/call/x")), None);
        assert_eq!(match_route(&request(Method::GET, "/do//x")), None);
    }

    #[test]
    fn test_is_call() {
        assert!(is_call(&request(Method::GET, "/do/call/destroy"), "destroy"));
        assert!(!is_call(&request(Method::GET, "/do/get-prop/destroy"), "destroy"));
        assert!(!is_call(&request(Method::GET, "/do/call/reset"), "destroy"));
    }

    #[test]
    fn test_envelope_to_request() {
        let envelope = ActionEnvelope::call("add", vec![json!(1), json!("two")])
            .with_name(Some("counter".to_string()));
        let req = envelope.to_request().expect("request");

        assert_eq!(match_route(&req), Some(("call", "add")));
        assert_eq!(
            read_content(&req).expect("content"),
            Some(r#"[1,"two"]"#)
        );
        assert_eq!(lookup_name(&req), Some("counter".to_string()));
    }

    #[test]
    fn test_get_prop_has_no_content() {
        let req = ActionEnvelope::get_prop("items").to_request().expect("request");
        assert_eq!(read_content(&req).expect("content"), None);
        assert_eq!(lookup_name(&req), None);
    }

    #[test]
    fn test_body_used_when_header_absent() {
        let req = Request::builder()
            .uri("/do/set/items")
            .body("[1,2]".to_string())
            .expect("request");
        assert_eq!(read_content(&req).expect("content"), Some("[1,2]"));
    }

    #[test]
    fn test_header_json_escapes_non_ascii() {
        let value = json!({ "name": "café ☕", "emoji": "🦀" });
        let encoded = to_header_json(&value);

        assert!(encoded.is_ascii());
        assert!(HeaderValue::from_str(&encoded).is_ok());
        let decoded: Value = serde_json::from_str(&encoded).expect("valid json");
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_upgrade_detection() {
        let req = Request::builder()
            .uri("/do/call/x")
            .header(UPGRADE, "WebSocket")
            .body(String::new())
            .expect("request");
        assert!(is_upgrade(&req));
        assert!(!is_upgrade(&request(Method::GET, "/do/call/x")));
    }

    #[test]
    fn test_error_response_body() {
        let resp = error_response(StatusCode::NOT_FOUND, "field not found: x");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = serde_json::from_str(resp.body()).expect("json");
        assert_eq!(body, json!({ "error": "field not found: x", "status": 404 }));
    }

    #[test]
    fn test_no_content() {
        let resp = no_content();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(resp.body().is_empty());
    }
}
