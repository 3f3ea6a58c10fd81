//! Real-time notification channel
//!
//! A single persistent websocket connection to the notification service,
//! shared by any number of concurrent watches. Callers register interest
//! in a topic (`task.<id>` or `job.<id>`) and receive that topic's events
//! through a [`Subscription`] handle; unrelated topics never reach it.
//!
//! The channel never times out on its own — absence of a terminal event
//! is a caller-detected condition (e.g. an external deadline). Closing the
//! channel, or dropping the connection without reconnection configured,
//! surfaces [`Error::ChannelClosed`] to pending subscriptions.

pub mod events;
pub mod reconnect;

pub use events::{EventPayload, NotificationEvent, Topic};
pub use reconnect::ReconnectConfig;

use futures::SinkExt;
use futures::stream::{SplitSink, SplitStream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use events::ControlFrame;
use reconnect::next_delay;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Broadcast capacity for fan-out of incoming events
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Shared state behind a [`NotificationChannel`] and its subscriptions
struct Inner {
    config: Config,
    /// Write half of the socket; `None` once the channel is closed
    sink: Mutex<Option<WsSink>>,
    /// Active topics with subscriber reference counts
    topics: Mutex<HashMap<Topic, usize>>,
    event_tx: broadcast::Sender<NotificationEvent>,
    /// Cancelled when the channel is closed or permanently disconnected
    closed: CancellationToken,
}

/// Persistent bidirectional event channel to the notification service
/// (cloneable — clones share one connection)
///
/// ```no_run
/// use fileconvert::{Config, JobId, NotificationChannel, Topic};
///
/// # async fn example() -> fileconvert::Result<()> {
/// let config = Config::new("my_api_key");
/// let channel = NotificationChannel::connect(&config).await?;
/// let mut subscription = channel.subscribe(Topic::Job(JobId::new("job-1"))).await?;
/// let event = subscription.recv().await?;
/// println!("got {event:?}");
/// subscription.unsubscribe().await?;
/// channel.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NotificationChannel {
    inner: Arc<Inner>,
}

impl NotificationChannel {
    /// Connect to the notification endpoint, authenticating with the
    /// configured bearer credential
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate()?;
        let stream = open_socket(config).await?;
        let (sink, source) = stream.split();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let inner = Arc::new(Inner {
            config: config.clone(),
            sink: Mutex::new(Some(sink)),
            topics: Mutex::new(HashMap::new()),
            event_tx,
            closed: CancellationToken::new(),
        });
        tokio::spawn(read_loop(Arc::clone(&inner), source));
        tracing::info!(url = %config.notification.url, "notification channel connected");
        Ok(Self { inner })
    }

    /// Register interest in a topic
    ///
    /// The `subscribe` control frame is sent only for the topic's first
    /// subscriber; further subscriptions to the same topic share it. Safe
    /// to call from multiple concurrent tasks.
    pub async fn subscribe(&self, topic: Topic) -> Result<Subscription> {
        if self.inner.closed.is_cancelled() {
            return Err(Error::ChannelClosed);
        }
        // Take the receiver before announcing the topic so no event
        // delivered after the frame can be missed.
        let rx = self.inner.event_tx.subscribe();
        let first = {
            let mut topics = self.inner.topics.lock().await;
            register_topic(&mut topics, &topic)
        };
        if first {
            if let Err(e) = self.inner.send_frame("subscribe", &topic).await {
                let mut topics = self.inner.topics.lock().await;
                release_topic(&mut topics, &topic);
                return Err(e);
            }
            tracing::debug!(topic = %topic, "subscribed");
        }
        Ok(Subscription {
            topic,
            rx,
            inner: Arc::clone(&self.inner),
            detached: false,
        })
    }

    /// A stream of every event the channel receives, regardless of topic
    ///
    /// Mostly useful for logging and diagnostics; completion watches
    /// should prefer topic-scoped [`subscribe`](Self::subscribe).
    pub fn event_stream(&self) -> BroadcastStream<NotificationEvent> {
        BroadcastStream::new(self.inner.event_tx.subscribe())
    }

    /// Close the channel
    ///
    /// Pending and future subscription calls observe
    /// [`Error::ChannelClosed`]. Closing never cancels remote work.
    pub async fn close(&self) -> Result<()> {
        if self.inner.closed.is_cancelled() {
            return Ok(());
        }
        self.inner.closed.cancel();
        let mut guard = self.inner.sink.lock().await;
        if let Some(mut sink) = guard.take() {
            let _ = sink.send(Message::Close(None)).await;
        }
        tracing::info!("notification channel closed");
        Ok(())
    }

    /// Whether the channel has been closed or permanently disconnected
    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Wait until the channel is closed
    pub async fn closed(&self) {
        self.inner.closed.cancelled().await;
    }
}

impl Inner {
    async fn send_frame(&self, event: &str, topic: &Topic) -> Result<()> {
        let text = serde_json::to_string(&ControlFrame {
            event,
            topic: topic.to_string(),
        })?;
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(Error::ChannelClosed)?;
        sink.send(Message::Text(text.into()))
            .await
            .map_err(|e| Error::Channel(format!("failed to send {event} frame: {e}")))
    }

    /// Drop one subscriber reference; the last one sends `unsubscribe`
    async fn release(&self, topic: &Topic) -> Result<()> {
        let last = {
            let mut topics = self.topics.lock().await;
            release_topic(&mut topics, topic)
        };
        if last && !self.closed.is_cancelled() {
            match self.send_frame("unsubscribe", topic).await {
                Ok(()) => tracing::debug!(topic = %topic, "unsubscribed"),
                // Channel already torn down -- nothing left to tell the server.
                Err(Error::ChannelClosed) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Handle to one topic's event feed
///
/// [`recv`](Self::recv) yields only events belonging to this handle's
/// topic. Unsubscribing consumes the handle, so no further delivery for
/// the topic is possible through it; dropping the handle releases the
/// topic the same way, fire-and-forget.
pub struct Subscription {
    topic: Topic,
    rx: broadcast::Receiver<NotificationEvent>,
    inner: Arc<Inner>,
    detached: bool,
}

impl Subscription {
    /// The topic this subscription delivers
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Receive the next event for this subscription's topic
    ///
    /// Events for other topics are filtered out. Returns
    /// [`Error::ChannelClosed`] once the channel is closed or permanently
    /// disconnected.
    pub async fn recv(&mut self) -> Result<NotificationEvent> {
        loop {
            tokio::select! {
                _ = self.inner.closed.cancelled() => return Err(Error::ChannelClosed),
                received = self.rx.recv() => match received {
                    Ok(event) if event.topic() == self.topic => return Ok(event),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(topic = %self.topic, skipped, "subscription lagged behind event fan-out");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return Err(Error::ChannelClosed),
                }
            }
        }
    }

    /// Release this subscription's interest in its topic
    ///
    /// Consumes the handle; the topic's `unsubscribe` frame is sent once
    /// its last subscriber releases it.
    pub async fn unsubscribe(mut self) -> Result<()> {
        self.detached = true;
        self.inner.release(&self.topic).await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let topic = self.topic.clone();
        // Best effort outside a runtime: the topic entry stays registered
        // but the channel is being torn down anyway in that case.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = inner.release(&topic).await {
                    tracing::debug!(topic = %topic, error = %e, "failed to release topic on drop");
                }
            });
        }
    }
}

/// Record a subscriber for a topic; returns true for the first one
fn register_topic(topics: &mut HashMap<Topic, usize>, topic: &Topic) -> bool {
    let count = topics.entry(topic.clone()).or_insert(0);
    *count += 1;
    *count == 1
}

/// Remove a subscriber for a topic; returns true when the last one left
fn release_topic(topics: &mut HashMap<Topic, usize>, topic: &Topic) -> bool {
    match topics.get_mut(topic) {
        Some(count) if *count > 1 => {
            *count -= 1;
            false
        }
        Some(_) => {
            topics.remove(topic);
            true
        }
        None => false,
    }
}

async fn open_socket(config: &Config) -> Result<WsStream> {
    let mut request = config
        .notification
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| Error::Channel(format!("invalid notification URL: {e}")))?;
    let bearer = format!("Bearer {}", config.api_key);
    let auth = HeaderValue::from_str(&bearer).map_err(|_| {
        Error::Channel("api_key contains characters not valid in a header".to_string())
    })?;
    request.headers_mut().insert(AUTHORIZATION, auth);

    let (stream, _response) = connect_async(request).await.map_err(|e| {
        Error::Channel(format!(
            "failed to connect to {}: {e}",
            config.notification.url
        ))
    })?;
    Ok(stream)
}

enum PumpEnd {
    Shutdown,
    Disconnected,
}

/// Read frames until shutdown or disconnect, fanning events out to
/// subscribers
async fn pump(inner: &Inner, source: &mut WsSource) -> PumpEnd {
    loop {
        tokio::select! {
            _ = inner.closed.cancelled() => return PumpEnd::Shutdown,
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match events::parse_event(&text) {
                    Ok(event) => {
                        tracing::debug!(topic = %event.topic(), "notification event");
                        // No receivers is fine; events simply go unobserved.
                        let _ = inner.event_tx.send(event);
                    }
                    Err(e) => tracing::debug!(error = %e, "ignoring unrecognized notification frame"),
                },
                Some(Ok(Message::Close(_))) | None => return PumpEnd::Disconnected,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "notification socket error");
                    return PumpEnd::Disconnected;
                }
            }
        }
    }
}

async fn read_loop(inner: Arc<Inner>, mut source: WsSource) {
    loop {
        match pump(&inner, &mut source).await {
            PumpEnd::Shutdown => break,
            PumpEnd::Disconnected => {
                tracing::warn!("notification socket disconnected");
                match reestablish(&inner).await {
                    Some(new_source) => source = new_source,
                    None => break,
                }
            }
        }
    }
    inner.closed.cancel();
    let _ = inner.sink.lock().await.take();
    tracing::debug!("notification read loop ended");
}

/// Reconnect with exponential backoff and re-subscribe active topics
///
/// Returns the new read half, or `None` when reconnection is disabled,
/// exhausted, or the channel was closed meanwhile.
async fn reestablish(inner: &Inner) -> Option<WsSource> {
    let rc = inner.config.notification.reconnect.clone();
    if rc.max_attempts == 0 {
        return None;
    }
    let mut delay = rc.initial_delay;
    for attempt in 1..=rc.max_attempts {
        tokio::select! {
            _ = inner.closed.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }
        match open_socket(&inner.config).await {
            Ok(stream) => {
                let (sink, source) = stream.split();
                *inner.sink.lock().await = Some(sink);
                let topics: Vec<Topic> = inner.topics.lock().await.keys().cloned().collect();
                for topic in &topics {
                    if let Err(e) = inner.send_frame("subscribe", topic).await {
                        tracing::warn!(topic = %topic, error = %e, "failed to re-subscribe after reconnect");
                    }
                }
                tracing::info!(attempt, topics = topics.len(), "notification channel reconnected");
                return Some(source);
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts = rc.max_attempts,
                    error = %e,
                    "reconnect attempt failed"
                );
                delay = next_delay(delay, &rc);
            }
        }
    }
    None
}
