//! JSON-RPC messaging over a framed transport.
//!
//! The helpers here are generic over the transport's byte streams so the
//! request/response plumbing can be exercised with in-memory buffers; the
//! session layer drives them with the spawned server's stdio.

use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::protocol::{Incoming, Notification, Request, Response};
use crate::trace::ProtocolTrace;
use crate::transport::FramedTransport;

/// Log target for session messaging.
pub(crate) const SESSION_TARGET: &str = "glicol_ide_client::session";

/// Maximum number of interleaved messages inspected while waiting for a
/// matching response.
const MAX_RESPONSE_ITERATIONS: usize = 100;

/// Sends a request and returns the raw JSON-RPC response.
pub(crate) fn send_request_raw<R, W, P>(
    transport: &mut FramedTransport<R, W>,
    trace: &ProtocolTrace,
    id: i64,
    method: &str,
    params: P,
) -> Result<Response, ClientError>
where
    R: Read,
    W: Write,
    P: Serialize,
{
    let params_value = serde_json::to_value(params)?;
    let request = Request::new(id, method, Some(params_value));
    let payload = serde_json::to_vec(&request)?;

    debug!(target: SESSION_TARGET, method, id, "sending request");
    trace.sent_request(method, id, &payload);

    transport.send(&payload)?;
    let response = receive_response_for_request(transport, trace, id)?;

    if let Some(error) = response.error {
        return Err(ClientError::from_rpc(error));
    }

    Ok(response)
}

/// Sends a request and decodes its result.
pub(crate) fn send_request<R, W, P, Res>(
    transport: &mut FramedTransport<R, W>,
    trace: &ProtocolTrace,
    id: i64,
    method: &str,
    params: P,
) -> Result<Res, ClientError>
where
    R: Read,
    W: Write,
    P: Serialize,
    Res: DeserializeOwned,
{
    let response = send_request_raw(transport, trace, id, method, params)?;
    let result = response.result.ok_or_else(|| ClientError::HandshakeFailed {
        message: "empty result in response".to_string(),
    })?;
    serde_json::from_value(result).map_err(ClientError::from)
}

/// Sends a notification (no response expected).
pub(crate) fn send_notification<R, W, P>(
    transport: &mut FramedTransport<R, W>,
    trace: &ProtocolTrace,
    method: &str,
    params: P,
) -> Result<(), ClientError>
where
    R: Read,
    W: Write,
    P: Serialize,
{
    let params_value = serde_json::to_value(params)?;
    let notification = Notification::new(method, Some(params_value));
    let payload = serde_json::to_vec(&notification)?;

    debug!(target: SESSION_TARGET, method, "sending notification");
    trace.sent_notification(method, &payload);

    transport.send(&payload)?;
    Ok(())
}

/// Receives messages until a response with the expected id arrives.
///
/// Server notifications and server-initiated requests interleave freely
/// with responses; they are traced and skipped. The loop is bounded so a
/// server that never answers cannot block the session forever.
pub(crate) fn receive_response_for_request<R, W>(
    transport: &mut FramedTransport<R, W>,
    trace: &ProtocolTrace,
    request_id: i64,
) -> Result<Response, ClientError>
where
    R: Read,
    W: Write,
{
    for _ in 0..MAX_RESPONSE_ITERATIONS {
        let payload = transport.receive()?;

        match Incoming::parse(&payload)? {
            Incoming::Response(response) => {
                trace.received_response(response.id, &payload);
                if response.id == Some(request_id) {
                    return Ok(response);
                }
                warn!(
                    target: SESSION_TARGET,
                    expected = request_id,
                    received = ?response.id,
                    "skipping response with non-matching id"
                );
            }
            Incoming::Request(request) => {
                trace.received_request(&request.method, request.id, &payload);
                warn!(
                    target: SESSION_TARGET,
                    method = %request.method,
                    id = request.id,
                    "ignoring server-initiated request"
                );
            }
            Incoming::Notification(notification) => {
                trace.received_notification(&notification.method, &payload);
                debug!(
                    target: SESSION_TARGET,
                    method = %notification.method,
                    "skipping server notification"
                );
            }
        }
    }

    warn!(
        target: SESSION_TARGET,
        request_id,
        max_iterations = MAX_RESPONSE_ITERATIONS,
        "giving up on response after reaching maximum iterations"
    );
    Err(ClientError::UnansweredRequest { request_id })
}
