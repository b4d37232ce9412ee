//! Minimal Chrome DevTools Protocol client over one WebSocket.
//!
//! Commands carry an auto-incremented id and are resolved by a background
//! reader task; messages without an id are events and go to an unbounded
//! channel the owner drains when it waits for page lifecycle events.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::error::{BrowserError, SOCKET_CLOSED_CODE};

pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;

#[derive(Debug, Clone)]
pub struct CdpEvent {
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Serialize)]
struct Command<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub id: u64,
    pub result: Option<Value>,
    pub error: Option<ReplyError>,
}

/// One decoded inbound frame.
#[derive(Debug, Clone)]
pub enum Inbound {
    Reply(Reply),
    Event(CdpEvent),
}

pub struct CdpClient {
    next_id: AtomicU64,
    pending: PendingMap,
    writer: Mutex<SplitSink<Socket, Message>>,
    events: mpsc::UnboundedReceiver<CdpEvent>,
    reader: JoinHandle<()>,
}

impl CdpClient {
    pub async fn connect(ws_url: &str) -> Result<Self, BrowserError> {
        let (socket, _) = tokio_tungstenite::connect_async(ws_url).await.map_err(|err| {
            BrowserError::ConnectionFailed {
                url: ws_url.to_string(),
                reason: err.to_string(),
            }
        })?;
        let (writer, reader) = socket.split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(reader, Arc::clone(&pending), event_tx));

        tracing::debug!(url = ws_url, "DevTools socket connected");

        Ok(Self {
            next_id: AtomicU64::new(1),
            pending,
            writer: Mutex::new(writer),
            events,
            reader,
        })
    }

    pub async fn send(&self, method: &str, params: Value) -> Result<Value, BrowserError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let payload = serde_json::to_string(&Command { id, method, params }).map_err(|err| {
            BrowserError::Protocol {
                detail: format!("failed to serialize {method}: {err}"),
            }
        })?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        tracing::trace!(id, method, "sending CDP command");
        self.writer
            .lock()
            .await
            .send(Message::Text(payload.into()))
            .await
            .map_err(|err| BrowserError::Protocol {
                detail: format!("failed to send {method}: {err}"),
            })?;

        let reply = match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => {
                return Err(BrowserError::Protocol {
                    detail: format!("reply channel for {method} closed"),
                });
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(BrowserError::Timeout {
                    method: method.to_string(),
                    duration: COMMAND_TIMEOUT,
                });
            }
        };

        if let Some(err) = reply.error {
            return Err(BrowserError::Cdp {
                code: err.code,
                message: err.message,
            });
        }
        Ok(reply.result.unwrap_or(Value::Null))
    }

    pub async fn enable(&self, domain: &str) -> Result<(), BrowserError> {
        self.send(&format!("{domain}.enable"), serde_json::json!({}))
            .await
            .map(|_| ())
    }

    /// Wait for an event named `method`, dropping any other events on the way.
    ///
    /// Returns `Ok(false)` when `timeout` elapses first.
    pub async fn wait_for_event(
        &mut self,
        method: &str,
        timeout: Duration,
    ) -> Result<bool, BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(event)) if event.method == method => {
                    tracing::trace!(method, params = %event.params, "awaited event arrived");
                    return Ok(true);
                }
                Ok(Some(event)) => {
                    tracing::trace!(method = %event.method, "skipping unrelated event");
                }
                Ok(None) => {
                    return Err(BrowserError::Protocol {
                        detail: format!("socket closed while waiting for {method}"),
                    });
                }
                Err(_) => return Ok(false),
            }
        }
    }

    /// Drop events that arrived since the last wait.
    pub fn drain_events(&mut self) {
        while self.events.try_recv().is_ok() {}
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

pub fn decode_frame(text: &str) -> Option<Inbound> {
    let json: Value = serde_json::from_str(text).ok()?;

    if let Some(id) = json.get("id").and_then(Value::as_u64) {
        return Some(Inbound::Reply(Reply {
            id,
            result: json.get("result").cloned(),
            error: json
                .get("error")
                .and_then(|err| serde_json::from_value(err.clone()).ok()),
        }));
    }

    let method = json.get("method")?.as_str()?.to_string();
    let params = json.get("params").cloned().unwrap_or(Value::Null);
    Some(Inbound::Event(CdpEvent { method, params }))
}

async fn read_loop(
    mut reader: SplitStream<Socket>,
    pending: PendingMap,
    events: mpsc::UnboundedSender<CdpEvent>,
) {
    while let Some(frame) = reader.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.as_str().to_string(),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(_) => continue,
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                tracing::debug!(error = %err, "DevTools socket read failed");
                break;
            }
        };

        match decode_frame(&text) {
            Some(Inbound::Reply(reply)) => {
                if let Some(tx) = pending.lock().await.remove(&reply.id) {
                    let _ = tx.send(reply);
                }
            }
            Some(Inbound::Event(event)) => {
                let _ = events.send(event);
            }
            None => tracing::debug!("ignoring undecodable DevTools frame"),
        }
    }

    for (id, tx) in pending.lock().await.drain() {
        let _ = tx.send(Reply {
            id,
            result: None,
            error: Some(ReplyError {
                code: SOCKET_CLOSED_CODE,
                message: "DevTools socket closed".to_string(),
            }),
        });
    }
}
