//! The websocket channel.
//!
//! One socket carries every topic. Contract highlights:
//! - `subscribe` keeps exactly one handler per topic string; re-subscribing
//!   replaces the prior handler so a topic is never delivered twice.
//! - Handlers persist across reconnects; the channel replays `Subscribe`
//!   frames itself after re-establishing, callers never re-register.
//! - `publish` is fire-and-forget; while disconnected it logs and drops the
//!   payload (no queue, no replay).
//! - Reconnect runs on a fixed delay, unbounded, until `disconnect()`.
//! - `disconnect` is idempotent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use outbreak_protocol::WireFrame;

use crate::config::ClientConfig;
use crate::error::ClientError;

use super::state::{ConnectionState, ConnectionStateObserver};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type TopicHandler = Box<dyn Fn(serde_json::Value) + Send + Sync + 'static>;
type StateCallback = Box<dyn Fn(ConnectionState) + Send + Sync + 'static>;

/// Bidirectional message channel over one persistent websocket.
///
/// Cheap to clone; clones share the connection. The channel is owned
/// explicitly and passed to dependents - there is deliberately no ambient
/// global instance.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    endpoint: Url,
    reconnect_delay: std::time::Duration,
    send_buffer: usize,
    state: Arc<AtomicU8>,
    handlers: Mutex<HashMap<String, TopicHandler>>,
    tx: Mutex<Option<mpsc::Sender<WireFrame>>>,
    on_state_change: Mutex<Option<StateCallback>>,
    shutdown: watch::Sender<bool>,
}

impl Channel {
    /// Connect to the configured endpoint.
    ///
    /// The first handshake failure is returned to the caller; once
    /// established, the channel owns recovery and retries with the fixed
    /// delay until [`Channel::disconnect`].
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let endpoint = Url::parse(&config.endpoint)?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let inner = Arc::new(ChannelInner {
            endpoint,
            reconnect_delay: config.reconnect_delay(),
            send_buffer: config.send_buffer,
            state: Arc::new(AtomicU8::new(ConnectionState::Connecting.to_u8())),
            handlers: Mutex::new(HashMap::new()),
            tx: Mutex::new(None),
            on_state_change: Mutex::new(None),
            shutdown,
        });

        let ws = match connect_async(inner.endpoint.as_str()).await {
            Ok((ws, _)) => ws,
            Err(err) => {
                inner.set_state(ConnectionState::Disconnected).await;
                return Err(err.into());
            }
        };
        tracing::info!(endpoint = %inner.endpoint, "connected");
        inner.set_state(ConnectionState::Connected).await;

        // Install the outbound sender before returning so frames published
        // right after connect are never lost to the spawn gap.
        let (tx, rx) = mpsc::channel(inner.send_buffer);
        *inner.tx.lock().await = Some(tx);

        let run_inner = Arc::clone(&inner);
        tokio::spawn(run(run_inner, ws, rx, shutdown_rx));

        Ok(Self { inner })
    }

    /// Register the handler for a topic, replacing any prior handler.
    ///
    /// Replacement (not accumulation) is the contract: it is what prevents
    /// double-firing handlers after a view re-subscribes or the channel
    /// reconnects.
    pub async fn subscribe<F>(&self, topic: &str, handler: F)
    where
        F: Fn(serde_json::Value) + Send + Sync + 'static,
    {
        let replaced = self
            .inner
            .handlers
            .lock()
            .await
            .insert(topic.to_string(), Box::new(handler))
            .is_some();
        if replaced {
            tracing::debug!(topic, "topic handler replaced");
            return;
        }
        // Newly registered topic: tell the server, if we currently can. A
        // duplicate Subscribe after a racing reconnect replay is harmless.
        let tx = self.inner.tx.lock().await.clone();
        if let Some(tx) = tx {
            let frame = WireFrame::Subscribe {
                topic: topic.to_string(),
            };
            if tx.try_send(frame).is_err() {
                tracing::warn!(topic, "subscribe frame dropped, will replay on reconnect");
            }
        }
    }

    /// Fire-and-forget publish to a destination.
    ///
    /// Never blocks on the network and never queues across disconnects: if
    /// the channel is not connected the payload is logged and dropped.
    pub async fn publish<T: Serialize>(&self, destination: &str, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(error = %err, destination, "failed to serialize payload");
                return;
            }
        };
        let tx = self.inner.tx.lock().await.clone();
        match tx {
            Some(tx) => {
                let frame = WireFrame::Send {
                    destination: destination.to_string(),
                    payload,
                };
                if let Err(err) = tx.try_send(frame) {
                    tracing::warn!(error = %err, destination, "outbound frame dropped");
                }
            }
            None => {
                tracing::warn!(destination, "publish while disconnected, payload dropped");
            }
        }
    }

    /// Callback invoked on every connection state change.
    pub async fn set_on_state_change<F>(&self, callback: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        *self.inner.on_state_change.lock().await = Some(Box::new(callback));
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    pub fn state_observer(&self) -> ConnectionStateObserver {
        ConnectionStateObserver::new(Arc::clone(&self.inner.state))
    }

    /// Close the channel and stop reconnecting. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        if *self.inner.shutdown.borrow() {
            return;
        }
        let _ = self.inner.shutdown.send(true);
        *self.inner.tx.lock().await = None;
        self.inner.set_state(ConnectionState::Disconnected).await;
        tracing::info!("channel disconnected");
    }
}

impl ChannelInner {
    async fn set_state(&self, new_state: ConnectionState) {
        let prev = self.state.swap(new_state.to_u8(), Ordering::SeqCst);
        if prev == new_state.to_u8() {
            return;
        }
        let callback = self.on_state_change.lock().await;
        if let Some(ref cb) = *callback {
            cb(new_state);
        }
    }

    fn closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Decode one inbound frame and route it to its topic handler.
    async fn deliver(&self, text: &str) {
        match WireFrame::decode(text) {
            Ok(WireFrame::Message { topic, payload }) => {
                let handlers = self.handlers.lock().await;
                match handlers.get(&topic) {
                    Some(handler) => handler(payload),
                    None => tracing::debug!(topic, "message for unsubscribed topic dropped"),
                }
            }
            Ok(frame) => {
                tracing::debug!(?frame, "unexpected client-bound frame dropped");
            }
            Err(err) => {
                tracing::debug!(error = %err, "undecodable frame dropped");
            }
        }
    }
}

/// Connection supervisor: serves one socket session at a time and reconnects
/// on the fixed delay until shutdown.
async fn run(
    inner: Arc<ChannelInner>,
    first_ws: WsStream,
    first_rx: mpsc::Receiver<WireFrame>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut session = Some((first_ws, first_rx));
    loop {
        let (ws, rx) = match session.take() {
            Some(pair) => pair,
            None => {
                inner.set_state(ConnectionState::Reconnecting).await;
                tokio::select! {
                    _ = tokio::time::sleep(inner.reconnect_delay) => {}
                    _ = shutdown.changed() => {}
                }
                if inner.closed() {
                    break;
                }
                match connect_async(inner.endpoint.as_str()).await {
                    Ok((ws, _)) => {
                        tracing::info!(endpoint = %inner.endpoint, "reconnected");
                        inner.set_state(ConnectionState::Connected).await;
                        let (tx, rx) = mpsc::channel(inner.send_buffer);
                        *inner.tx.lock().await = Some(tx);
                        (ws, rx)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "reconnect attempt failed");
                        continue;
                    }
                }
            }
        };

        serve(&inner, ws, rx, &mut shutdown).await;
        *inner.tx.lock().await = None;

        if inner.closed() {
            break;
        }
        tracing::info!("connection lost");
    }
    inner.set_state(ConnectionState::Disconnected).await;
}

/// Pump one established socket until it closes or shutdown is requested.
async fn serve(
    inner: &Arc<ChannelInner>,
    ws: WsStream,
    mut rx: mpsc::Receiver<WireFrame>,
    shutdown: &mut watch::Receiver<bool>,
) {
    let (mut write, mut read) = ws.split();

    // Replay subscriptions so callers registered before this (re)connect keep
    // receiving without re-registering.
    let topics: Vec<String> = inner.handlers.lock().await.keys().cloned().collect();
    for topic in topics {
        let frame = WireFrame::Subscribe { topic };
        match frame.encode() {
            Ok(text) => {
                if let Err(err) = write.send(Message::Text(text)).await {
                    tracing::warn!(error = %err, "subscription replay failed");
                    return;
                }
            }
            Err(err) => tracing::error!(error = %err, "failed to encode subscribe frame"),
        }
    }

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = write.send(Message::Close(None)).await;
                return;
            }
            frame = rx.recv() => {
                let Some(frame) = frame else { return };
                match frame.encode() {
                    Ok(text) => {
                        if let Err(err) = write.send(Message::Text(text)).await {
                            tracing::error!(error = %err, "send failed");
                            return;
                        }
                    }
                    Err(err) => tracing::error!(error = %err, "failed to encode frame"),
                }
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => inner.deliver(&text).await,
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("server closed connection");
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "websocket error");
                        return;
                    }
                    None => return,
                }
            }
        }
    }
}
