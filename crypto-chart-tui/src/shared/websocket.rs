//! WebSocket client for the crypto price feed
//!
//! Provides subscription, automatic reconnection, heartbeat and tick parsing.
//! The connection lives inside a single task owned by a [`FeedSession`], so at
//! most one socket is open at any time.

use crate::shared::error::ChartError;
use crate::shared::types::{SubscribeMessage, Symbol, Tick};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// WebSocket feed URL
    pub url: String,
    /// Symbols named in the subscribe message
    pub symbols: Vec<Symbol>,
    /// Ping interval to keep connection alive
    pub ping_interval: Duration,
    /// Fixed delay between a close and the next connection attempt
    pub reconnect_delay: Duration,
    /// Maximum channel buffer size for ticks
    pub channel_buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: crate::shared::config::DEFAULT_WS_URL.to_string(),
            symbols: Symbol::ALL.to_vec(),
            ping_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(3),
            channel_buffer_size: 1000,
        }
    }
}

impl WebSocketConfig {
    /// Create a new configuration with custom URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set subscribed symbols
    pub fn with_symbols(mut self, symbols: Vec<Symbol>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Set ping interval
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }
}

/// Connection status updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Error => "Error",
        }
    }
}

/// WebSocket client for price ticks
pub struct WebSocketClient {
    config: WebSocketConfig,
    tick_tx: mpsc::Sender<Tick>,
    tick_rx: mpsc::Receiver<Tick>,
    status_tx: mpsc::Sender<ConnectionStatus>,
    status_rx: mpsc::Receiver<ConnectionStatus>,
}

impl WebSocketClient {
    /// Create a new WebSocket client with default configuration
    pub fn new() -> Self {
        Self::with_config(WebSocketConfig::default())
    }

    /// Create a new WebSocket client with custom configuration
    pub fn with_config(config: WebSocketConfig) -> Self {
        let (tick_tx, tick_rx) = mpsc::channel(config.channel_buffer_size);
        let (status_tx, status_rx) = mpsc::channel(16);

        Self {
            config,
            tick_tx,
            tick_rx,
            status_tx,
            status_rx,
        }
    }

    /// Start the feed.
    ///
    /// Returns the owning session handle, a receiver for ticks and a receiver
    /// for connection status updates.
    pub fn start(
        self,
    ) -> (
        FeedSession,
        mpsc::Receiver<Tick>,
        mpsc::Receiver<ConnectionStatus>,
    ) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run_websocket_loop(
            self.config,
            self.tick_tx,
            self.status_tx,
            shutdown_rx,
        ));

        let session = FeedSession {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        };

        (session, self.tick_rx, self.status_rx)
    }
}

impl Default for WebSocketClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned handle to the running feed task.
///
/// Dropping the handle shuts the feed down.
#[derive(Debug)]
pub struct FeedSession {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FeedSession {
    /// Signal the feed to close its socket and stop reconnecting. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            debug!("Feed shutdown requested");
            let _ = shutdown_tx.send(());
        }
    }

    /// True until the feed task has exited
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Shut down and wait for the socket and any pending reconnect to be released
    pub async fn close(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Feed task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// How a single connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Socket closed or failed; reconnect after the delay
    Closed,
    /// Owner asked to stop, or nobody is listening any more
    Stopped,
}

/// Main WebSocket connection loop with auto-reconnect
async fn run_websocket_loop(
    config: WebSocketConfig,
    tick_tx: mpsc::Sender<Tick>,
    status_tx: mpsc::Sender<ConnectionStatus>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    info!("Starting WebSocket feed for {}", config.url);

    loop {
        let end = run_connection(&config, &tick_tx, &status_tx, &mut shutdown_rx).await;
        if end == SessionEnd::Stopped {
            break;
        }

        // Exactly one reconnect per close
        debug!(
            "Waiting {:?} before reconnecting...",
            config.reconnect_delay
        );
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }

    info!("WebSocket feed stopped");
}

/// Connect, subscribe and pump messages until the socket closes
async fn run_connection(
    config: &WebSocketConfig,
    tick_tx: &mpsc::Sender<Tick>,
    status_tx: &mpsc::Sender<ConnectionStatus>,
    shutdown_rx: &mut oneshot::Receiver<()>,
) -> SessionEnd {
    let connected = tokio::select! {
        _ = &mut *shutdown_rx => return SessionEnd::Stopped,
        result = connect_async(config.url.as_str()) => result.map_err(ChartError::from),
    };

    let ws_stream = match connected {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            error!("Failed to connect to {}: {}", config.url, e);
            report_failure(status_tx, &e).await;
            let _ = status_tx.send(ConnectionStatus::Disconnected).await;
            return SessionEnd::Closed;
        }
    };

    info!("Connected to price feed at {}", config.url);
    let _ = status_tx.send(ConnectionStatus::Connected).await;

    let (mut write, mut read) = ws_stream.split();

    if let Err(e) = send_subscribe(&mut write, &config.symbols).await {
        error!("Failed to subscribe: {}", e);
        report_failure(status_tx, &e).await;
        let _ = status_tx.send(ConnectionStatus::Disconnected).await;
        return SessionEnd::Closed;
    }

    let mut ping = interval_at(Instant::now() + config.ping_interval, config.ping_interval);

    loop {
        tokio::select! {
            _ = &mut *shutdown_rx => {
                debug!("Closing socket on shutdown");
                let _ = write.send(Message::Close(None)).await;
                let _ = status_tx.send(ConnectionStatus::Disconnected).await;
                return SessionEnd::Stopped;
            }
            _ = ping.tick() => {
                if let Err(e) = write.send(Message::Ping(vec![].into())).await {
                    debug!("Failed to send ping, connection likely dead");
                    report_failure(status_tx, &ChartError::from(e)).await;
                    break;
                }
            }
            msg = read.next() => {
                let Some(msg) = msg else {
                    info!("Price feed stream ended");
                    break;
                };

                match msg {
                    Ok(Message::Text(text)) => match Tick::parse(&text, Utc::now()) {
                        Ok(tick) => {
                            if tick_tx.send(tick).await.is_err() {
                                warn!("Tick receiver dropped, stopping feed");
                                let _ = write.send(Message::Close(None)).await;
                                return SessionEnd::Stopped;
                            }
                        }
                        Err(e) => {
                            warn!("Dropping feed message: {}", e);
                            debug!("Raw message: {}", text.as_str());
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        info!("Server closed connection: {:?}", frame);
                        break;
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                        // Heartbeat messages - tungstenite handles these automatically
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        report_failure(status_tx, &ChartError::from(e)).await;
                        break;
                    }
                }
            }
        }
    }

    warn!("Connection closed, will reconnect...");
    let _ = status_tx.send(ConnectionStatus::Disconnected).await;
    SessionEnd::Closed
}

async fn send_subscribe<S>(write: &mut S, symbols: &[Symbol]) -> Result<(), ChartError>
where
    S: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let payload = serde_json::to_string(&SubscribeMessage::new(symbols))?;
    debug!("Subscribing: {}", payload);
    write.send(Message::Text(payload.into())).await?;
    Ok(())
}

/// Surface a transport failure as the Error status
async fn report_failure(status_tx: &mpsc::Sender<ConnectionStatus>, error: &ChartError) {
    if error.is_transport() {
        let _ = status_tx.send(ConnectionStatus::Error).await;
    }
}
