//! JSON-RPC 2.0 message types for the language server session.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Allocates request identifiers for a single session.
///
/// Identifiers only need to be unique per connection, so each client
/// session starts counting from one; the first request after a spawn is
/// always `initialize` with id 1.
#[derive(Debug)]
pub struct RequestIdSequence {
    next: AtomicI64,
}

impl RequestIdSequence {
    /// Creates a sequence starting at one.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }

    /// Returns the next identifier, monotonically increasing.
    #[must_use]
    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for RequestIdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// A JSON-RPC 2.0 request message sent to the server.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// Unique request identifier.
    pub id: i64,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Creates a request with an explicit identifier.
    #[must_use]
    pub fn new(id: i64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 notification sent to the server (no response expected).
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 response received from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Protocol version.
    pub jsonrpc: String,
    /// Request identifier this response corresponds to.
    pub id: Option<i64>,
    /// The result on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(default)]
    pub data: Option<Value>,
}

/// A request initiated by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerRequest {
    /// Request identifier chosen by the server.
    pub id: i64,
    /// The method the server invokes on the client.
    pub method: String,
    /// Optional parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// A notification initiated by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerNotification {
    /// The notification method.
    pub method: String,
    /// Optional parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// Any message the server may deliver over the transport.
#[derive(Debug, Clone)]
pub enum Incoming {
    /// Response to a client request.
    Response(Response),
    /// Server-initiated request.
    Request(ServerRequest),
    /// Server-initiated notification.
    Notification(ServerNotification),
}

impl Incoming {
    /// Classifies and decodes a raw payload.
    ///
    /// Messages carrying both `method` and `id` are server requests, a
    /// `method` alone marks a notification, and everything else must be a
    /// response.
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(payload)?;
        let has_method = value.get("method").is_some();
        let has_id = value.get("id").is_some();
        match (has_method, has_id) {
            (true, true) => serde_json::from_value(value).map(Self::Request),
            (true, false) => serde_json::from_value(value).map(Self::Notification),
            _ => serde_json::from_value(value).map(Self::Response),
        }
    }
}
