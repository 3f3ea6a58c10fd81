//! In-process mock of the websocket notification service
//!
//! Accepts real websocket connections, records the `subscribe` /
//! `unsubscribe` control frames each connection sends, and lets tests
//! push named events (or drop the connection) at chosen moments.

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// How long test expectations wait before failing
const EXPECT_TIMEOUT: Duration = Duration::from_secs(5);

enum Outbound {
    Text(String),
    Shutdown,
}

/// Handle to the listening mock service
pub struct MockNotificationServer {
    /// `ws://...` URL for the client configuration
    pub url: String,
    connections: mpsc::UnboundedReceiver<ServerConnection>,
}

/// One accepted client connection
pub struct ServerConnection {
    frames: mpsc::UnboundedReceiver<Value>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl MockNotificationServer {
    /// Bind a listener and start accepting connections
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock notification server");
        let addr = listener.local_addr().expect("local addr");
        let (conn_tx, connections) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let ws = match accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(_) => continue,
                };
                let (mut sink, mut source) = ws.split();
                let (frame_tx, frame_rx) = mpsc::unbounded_channel();
                let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();

                tokio::spawn(async move {
                    while let Some(Ok(message)) = source.next().await {
                        if let Message::Text(text) = message
                            && let Ok(value) = serde_json::from_str::<Value>(&text)
                        {
                            let _ = frame_tx.send(value);
                        }
                    }
                });
                tokio::spawn(async move {
                    while let Some(outbound) = outbound_rx.recv().await {
                        match outbound {
                            Outbound::Text(text) => {
                                if sink.send(Message::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                            Outbound::Shutdown => {
                                let _ = sink.send(Message::Close(None)).await;
                                break;
                            }
                        }
                    }
                });

                let _ = conn_tx.send(ServerConnection {
                    frames: frame_rx,
                    outbound: outbound_tx,
                });
            }
        });

        Self {
            url: format!("ws://{addr}/ws"),
            connections,
        }
    }

    /// Wait for the next client connection
    pub async fn next_connection(&mut self) -> ServerConnection {
        tokio::time::timeout(EXPECT_TIMEOUT, self.connections.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("listener task ended")
    }
}

impl ServerConnection {
    /// Assert the next control frame is `event` for `topic`
    pub async fn expect_frame(&mut self, event: &str, topic: &str) {
        let frame = tokio::time::timeout(EXPECT_TIMEOUT, self.frames.recv())
            .await
            .expect("timed out waiting for a control frame")
            .expect("connection closed");
        assert_eq!(frame["event"], event, "unexpected control frame: {frame}");
        assert_eq!(frame["topic"], topic, "unexpected control frame: {frame}");
    }

    /// Collect control frames until `count` have arrived
    pub async fn collect_frames(&mut self, count: usize) -> Vec<Value> {
        let mut frames = Vec::with_capacity(count);
        while frames.len() < count {
            let frame = tokio::time::timeout(EXPECT_TIMEOUT, self.frames.recv())
                .await
                .expect("timed out waiting for control frames")
                .expect("connection closed");
            frames.push(frame);
        }
        frames
    }

    /// Push a named event to the client
    pub fn send_event(&self, event: &str, id: &str, name: Option<&str>) {
        let mut data = serde_json::json!({"id": id});
        if let Some(name) = name {
            data["name"] = name.into();
        }
        let message = serde_json::json!({"event": event, "data": data});
        let _ = self.outbound.send(Outbound::Text(message.to_string()));
    }

    /// Push a raw text frame (for malformed-input tests)
    pub fn send_raw(&self, text: &str) {
        let _ = self.outbound.send(Outbound::Text(text.to_string()));
    }

    /// Close the websocket from the server side
    pub fn disconnect(&self) {
        let _ = self.outbound.send(Outbound::Shutdown);
    }
}
