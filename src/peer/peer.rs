// src/peer/peer.rs
// Connection-scoped peer: owns the pending-request table, the id source and
// the transport handle. One of these exists per connection; there is no
// process-wide state.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::env::Config;
use crate::message::{
    classify, create_error_response, create_notification, create_request,
    create_success_response, Message, ResponseResult,
};

use super::errors::PeerError;
use super::pending::PendingRequestTable;
use super::request_id::IdSource;

/// Outbound half of the duplex transport. Framing and delivery are the
/// implementer's problem; the peer hands over one wire-shaped value at a
/// time.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: Value) -> Result<(), PeerError>;
}

/// Application-level collaborator. Receives the requests and notifications
/// the remote peer sends us; the `Ok`/`Err` return of `on_request` becomes
/// the success/error Response on the wire.
#[async_trait]
pub trait PeerHandler: Send + Sync {
    async fn on_request(&self, method: &str, data: Value) -> Result<Value, HandlerError>;

    async fn on_notification(&self, method: &str, data: Value);
}

/// Application-side request failure, mapped onto the wire's
/// errorCode/errorReason pair.
#[derive(Clone, Debug)]
pub struct HandlerError {
    pub code: i64,
    pub reason: String,
}

impl HandlerError {
    pub fn new(code: i64, reason: &str) -> Self {
        HandlerError {
            code,
            reason: reason.to_string(),
        }
    }
}

pub struct Peer<T: Transport> {
    name: String,
    transport: T,
    handler: Arc<dyn PeerHandler>,
    pending: PendingRequestTable,
    ids: IdSource,
}

impl<T: Transport> Peer<T> {
    pub fn new(transport: T, handler: Arc<dyn PeerHandler>) -> Self {
        Peer {
            name: "peer".to_string(),
            transport,
            handler,
            pending: PendingRequestTable::new(),
            ids: IdSource::default(),
        }
    }

    /// Builds a peer with the name and id source the environment config
    /// selects.
    pub fn from_config(config: &Config, transport: T, handler: Arc<dyn PeerHandler>) -> Self {
        Peer {
            name: config.peer_name.clone(),
            transport,
            handler,
            pending: PendingRequestTable::new(),
            ids: config.id_source(),
        }
    }

    pub fn with_id_source(mut self, ids: IdSource) -> Self {
        self.ids = ids;
        self
    }

    /// Sends a request and awaits the matching response. The pending entry
    /// is registered before the send goes out, so the caller can never miss
    /// a settlement, and it is removed again if the send itself fails.
    pub async fn request(&self, method: &str, data: Option<Value>) -> Result<Value, PeerError> {
        if method.is_empty() {
            return Err(PeerError::InvalidMethod);
        }

        let request = create_request(&self.ids, method, data);
        let id = match &request {
            Message::Request { id, .. } => *id,
            _ => unreachable!("create_request always builds a request"),
        };

        let rx = self.pending.track(id, method)?;

        if let Err(error) = self.transport.send(request.to_value()).await {
            self.pending
                .reject(id, PeerError::Transport(error.to_string()));
            return Err(error);
        }

        match rx.await {
            Ok(outcome) => outcome,
            // Sender vanished without settling; close_all or a settle path
            // always sends, so this only happens if the table was dropped.
            Err(_) => Err(PeerError::ResponseChannelClosed),
        }
    }

    /// Fire-and-forget notification. Nothing is tracked; only a transport
    /// failure is reported.
    pub async fn notify(&self, method: &str, data: Option<Value>) -> Result<(), PeerError> {
        if method.is_empty() {
            return Err(PeerError::InvalidMethod);
        }

        let notification = create_notification(method, data);
        self.transport.send(notification.to_value()).await
    }

    /// Feeds one raw inbound payload through classification and dispatch.
    ///
    /// Malformed payloads and orphan responses are logged and dropped here;
    /// they never become errors. The only failures this returns are
    /// transport errors while replying to a remote request.
    pub async fn handle_incoming(&self, raw: Value) -> Result<(), PeerError> {
        let message = match classify(&raw) {
            Ok(message) => message,
            Err(error) => {
                warn!(peer = %self.name, error = %error, "dropping malformed message");
                return Ok(());
            }
        };

        match message {
            Message::Response { id, result } => {
                self.dispatch_response(id, result);
                Ok(())
            }
            Message::Request { id, method, data } => {
                let reply = match self.handler.on_request(&method, data).await {
                    Ok(data) => create_success_response(id, data),
                    Err(error) => create_error_response(id, error.code, &error.reason),
                };
                self.transport.send(reply.to_value()).await
            }
            Message::Notification { method, data } => {
                self.handler.on_notification(&method, data).await;
                Ok(())
            }
        }
    }

    fn dispatch_response(&self, id: u64, result: ResponseResult) {
        let settled = match result {
            ResponseResult::Success { data } => self.pending.resolve(id, data),
            ResponseResult::Error { code, reason } => {
                self.pending.reject(id, PeerError::Remote { code, reason })
            }
        };

        if !settled {
            warn!(peer = %self.name, id, "received response does not match any sent request");
        }
    }

    /// Connection teardown: rejects every pending request with `PeerClosed`.
    /// Later responses for those ids are orphans.
    pub fn close(&self) {
        self.pending.close_all();
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }
}

/// Handler for peers that only issue requests and never serve any. Remote
/// requests are answered with a "method not found" error Response.
pub struct NoopHandler;

#[async_trait]
impl PeerHandler for NoopHandler {
    async fn on_request(&self, method: &str, _data: Value) -> Result<Value, HandlerError> {
        Err(HandlerError::new(
            404,
            &format!("no handler for method '{}'", method),
        ))
    }

    async fn on_notification(&self, _method: &str, _data: Value) {}
}
