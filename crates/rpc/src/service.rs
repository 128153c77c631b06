//! JSON-RPC over a single HTTP request, for embedding the method table into
//! another HTTP server.
//!
//! Admission follows the usual Ethereum client rules: only `POST`, JSON
//! content type, bounded body. Everything past admission is answered with
//! `200 OK` and a JSON-RPC payload, errors included.

use std::net::SocketAddr;

use http::header::{self, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use jsonrpsee::types::error::ErrorCode;
use jsonrpsee::Methods;
use serde_json::value::RawValue;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::middleware::{IpAllowlist, RequestTiming, UNKNOWN_METHOD};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Admit and dispatch one HTTP request against `methods`.
///
/// If the request extensions carry the caller's [`SocketAddr`], it is checked
/// against `allowlist`.
pub(crate) async fn handle_request(
    methods: &Methods,
    allowlist: &IpAllowlist,
    max_body_size: u32,
    request: Request<Vec<u8>>,
) -> Response<String> {
    if let Some(remote) = request.extensions().get::<SocketAddr>() {
        if allowlist.check(remote.ip()).is_err() {
            return status_response(StatusCode::FORBIDDEN);
        }
    }

    if request.method() != Method::POST {
        return status_response(StatusCode::METHOD_NOT_ALLOWED);
    }

    if let Some(content_type) = request.headers().get(header::CONTENT_TYPE) {
        if !is_json(content_type) {
            return status_response(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        }
    }

    let body = request.into_body();
    if body.len() > max_body_size as usize {
        return status_response(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let payload = dispatch(methods, &body).await.unwrap_or_default();
    let mut response = Response::new(payload);
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

/// Dispatch a request body holding a single call or a batch.
///
/// Returns `None` when nothing warrants a response (notifications only).
async fn dispatch(methods: &Methods, body: &[u8]) -> Option<String> {
    let is_batch = body
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'[');

    if !is_batch {
        return match serde_json::from_slice::<Box<RawValue>>(body) {
            Ok(call) => dispatch_call(methods, call.get()).await,
            Err(_) => Some(error_response(ErrorCode::ParseError, Value::Null)),
        };
    }

    let calls: Vec<Box<RawValue>> = match serde_json::from_slice(body) {
        Ok(calls) => calls,
        Err(_) => return Some(error_response(ErrorCode::ParseError, Value::Null)),
    };
    if calls.is_empty() {
        return Some(error_response(ErrorCode::InvalidRequest, Value::Null));
    }

    trace!(len = calls.len(), "Dispatching batch");
    let mut responses = Vec::with_capacity(calls.len());
    for call in calls {
        if let Some(response) = dispatch_call(methods, call.get()).await {
            responses.push(response);
        }
    }

    if responses.is_empty() {
        None
    } else {
        Some(format!("[{}]", responses.join(",")))
    }
}

async fn dispatch_call(methods: &Methods, call: &str) -> Option<String> {
    let Ok(Value::Object(mut envelope)) = serde_json::from_str::<Value>(call) else {
        return Some(error_response(ErrorCode::InvalidRequest, Value::Null));
    };
    // Errors echo the id whenever it could be read
    let id = envelope.get("id").cloned().unwrap_or(Value::Null);

    if envelope.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Some(error_response(ErrorCode::InvalidRequest, id));
    }
    let Some(method) = envelope.get("method").and_then(Value::as_str).map(str::to_owned) else {
        return Some(error_response(ErrorCode::InvalidRequest, id));
    };

    // Notifications still run, their response is dropped.
    let is_notification = !envelope.contains_key("id");
    if is_notification {
        envelope.insert("id".to_string(), Value::Null);
    }

    let label = if methods.method(&method).is_some() {
        method.as_str()
    } else {
        UNKNOWN_METHOD
    };
    let timing = RequestTiming::new(label);

    let request = Value::Object(envelope).to_string();
    match methods.raw_json_request(&request, 1).await {
        Ok((response, _subscriptions)) => {
            timing.complete(!is_error(&response));
            (!is_notification).then_some(response)
        }
        Err(e) => {
            debug!(%method, error = %e, "Rejected malformed call");
            timing.complete(false);
            Some(error_response(ErrorCode::InvalidRequest, id))
        }
    }
}

fn is_json(content_type: &HeaderValue) -> bool {
    content_type
        .to_str()
        .ok()
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
}

fn is_error(response: &str) -> bool {
    serde_json::from_str::<Value>(response)
        .map(|value| value.get("error").is_some())
        .unwrap_or(false)
}

fn error_response(code: ErrorCode, id: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code.code(), "message": code.message() },
    })
    .to_string()
}

fn status_response(status: StatusCode) -> Response<String> {
    let mut response = Response::new(String::new());
    *response.status_mut() = status;
    response
}
