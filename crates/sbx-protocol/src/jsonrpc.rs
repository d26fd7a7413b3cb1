//! JSON-RPC 2.0 framing for the line transport.
//!
//! Requests are validated from a parsed [`Value`] rather than derived, so a
//! malformed message still yields the id to answer with, and an explicit
//! `"id": null` can be told apart from a missing id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Request id, either an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

/// A well-formed incoming request.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// `None` both for notifications and for an explicit `null` id.
    pub id: Option<RequestId>,
    pub method: String,
    pub params: Option<Value>,
    /// False only when the message has no `id` member at all.
    pub expects_reply: bool,
}

impl RpcRequest {
    /// Validate a parsed message. The error side carries the id to answer
    /// with, when one could be read.
    pub fn from_value(value: Value) -> Result<Self, (Option<RequestId>, RpcError)> {
        let Value::Object(mut message) = value else {
            return Err((None, RpcError::invalid_request("Request must be a JSON object")));
        };

        let (id, expects_reply) = match message.remove("id") {
            None => (None, false),
            Some(Value::Null) => (None, true),
            Some(raw) => match serde_json::from_value(raw) {
                Ok(id) => (Some(id), true),
                Err(_) => {
                    return Err((None, RpcError::invalid_request("Request id must be a string or integer")));
                }
            },
        };

        if message.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err((id, RpcError::invalid_request("jsonrpc must be \"2.0\"")));
        }
        let method = match message.remove("method") {
            Some(Value::String(method)) if !method.is_empty() => method,
            _ => return Err((id, RpcError::invalid_request("method must be a non-empty string"))),
        };
        let params = message.remove("params").filter(|p| !p.is_null());

        Ok(Self { id, method, params, expects_reply })
    }
}

/// Response line. `id` is always written, as `null` when the request had
/// none that could be read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

/// Result from a service handler.
pub type HandlerResult = Result<Value, RpcError>;

impl RpcResponse {
    pub fn from_result(id: Option<RequestId>, result: HandlerResult) -> Self {
        let outcome = match result {
            Ok(value) => Outcome::Result(value),
            Err(err) => Outcome::Error(err),
        };
        Self { jsonrpc: JSONRPC_VERSION.into(), id, outcome }
    }

    pub fn error(id: Option<RequestId>, error: RpcError) -> Self {
        Self::from_result(id, Err(error))
    }
}
