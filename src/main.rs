mod env;
mod message;
mod peer;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::env::Config;
use crate::peer::{HandlerError, NoopHandler, Peer, PeerError, PeerHandler, Transport};

// In-memory duplex transport: each side sends into the channel the other
// side's pump reads from.
struct ChannelTransport {
    tx: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, payload: Value) -> Result<(), PeerError> {
        self.tx
            .send(payload)
            .map_err(|e| PeerError::Transport(e.to_string()))
    }
}

struct DemoHandler;

#[async_trait]
impl PeerHandler for DemoHandler {
    async fn on_request(&self, method: &str, data: Value) -> Result<Value, HandlerError> {
        match method {
            "echo" => Ok(data),
            "math.sum" => {
                let a = data["a"].as_i64().unwrap_or(0);
                let b = data["b"].as_i64().unwrap_or(0);
                Ok(json!({"sum": a + b}))
            }
            _ => Err(HandlerError::new(404, &format!("unknown method '{}'", method))),
        }
    }

    async fn on_notification(&self, method: &str, data: Value) {
        info!(method, %data, "notification received");
    }
}

fn spawn_pump<T>(peer: Arc<Peer<T>>, mut rx: mpsc::UnboundedReceiver<Value>)
where
    T: Transport + 'static,
{
    tokio::spawn(async move {
        while let Some(raw) = rx.recv().await {
            if let Err(e) = peer.handle_incoming(raw).await {
                error!("failed to handle inbound message: {}", e);
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load();

    let (to_server, from_client) = mpsc::unbounded_channel();
    let (to_client, from_server) = mpsc::unbounded_channel();

    let client = Arc::new(Peer::from_config(
        &config,
        ChannelTransport { tx: to_server },
        Arc::new(NoopHandler),
    ));
    let server = Arc::new(Peer::new(
        ChannelTransport { tx: to_client },
        Arc::new(DemoHandler),
    ));

    spawn_pump(client.clone(), from_server);
    spawn_pump(server.clone(), from_client);

    let sum = client
        .request("math.sum", Some(json!({"a": 19, "b": 23})))
        .await?;
    info!(%sum, "math.sum answered");

    let echoed = client
        .request("echo", Some(json!({"text": "hello peer"})))
        .await?;
    info!(%echoed, "echo answered");

    match client.request("no.such.method", None).await {
        Err(PeerError::Remote { code, reason }) => {
            info!(?code, %reason, "remote rejected the request, as expected");
        }
        other => error!("expected a remote error, got {:?}", other),
    }

    client.notify("session.bye", Some(json!({"reason": "demo over"}))).await?;

    client.close();
    server.close();

    Ok(())
}
