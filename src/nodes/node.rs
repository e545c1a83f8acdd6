use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WebSocketError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use super::{ConnectionStatus, NodeConfig, State};
use crate::model::{Incoming, IntoWebSocketMessage, RemoteStats};
use crate::{Error, Event, EventHandler};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The close code sent when shutting the connection down on purpose.
pub const CLEAN_CLOSE_CODE: u16 = 1000;
/// The close reason sent when shutting the connection down on purpose.
pub const CLEAN_CLOSE_REASON: &str = "destroy";
/// Reported when the connection dropped (or never opened) without a close
/// frame.
pub const ABNORMAL_CLOSE_CODE: u16 = 1006;

/// Whether a message made it onto the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SendStatus {
    Sent,
    /// There was no open connection; nothing was sent.
    NotConnected,
}

struct Inner {
    status: ConnectionStatus,
    sink: Option<SplitSink<WsStream, Message>>,
    /// The pending reconnect timer and its ID.
    reconnect: Option<(u64, JoinHandle<()>)>,
    next_timer_id: u64,
    /// The task reading the current session.
    reader: Option<JoinHandle<()>>,
}

/// A connection to a single node.
///
/// The connection heals itself: any close other than a clean shutdown (code
/// `1000`, reason `destroy`) schedules one reconnect after
/// [`NodeConfig::reconnect_delay`].
///
/// [`NodeConfig::reconnect_delay`]: struct.NodeConfig.html#structfield.reconnect_delay
pub struct Node {
    config: NodeConfig,
    handler: Arc<dyn EventHandler>,
    state: RwLock<State>,
    /// Incremented whenever a session is installed or torn down. Frames and
    /// closes from older sessions are discarded.
    generation: AtomicU64,
    inner: Mutex<Inner>,
}

impl Node {
    pub fn new(config: NodeConfig, handler: Arc<dyn EventHandler>) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(State::default()),
            generation: AtomicU64::new(0),
            inner: Mutex::new(Inner {
                status: ConnectionStatus::Disconnected,
                sink: None,
                reconnect: None,
                next_timer_id: 0,
                reader: None,
            }),
            config,
            handler,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Opens the WebSocket to the node.
    ///
    /// Does nothing if the connection is already open or opening. Otherwise
    /// any pending reconnect is cancelled. If the handshake fails the error
    /// is returned and a reconnect is scheduled.
    pub async fn connect(self: &Arc<Self>) -> Result<(), Error> {
        {
            let mut inner = self.inner.lock().await;

            if inner.status != ConnectionStatus::Disconnected {
                debug!("Not connecting to node, connection is {:?}", inner.status);

                return Ok(());
            }

            if let Some((_, timer)) = inner.reconnect.take() {
                debug!("Cancelling pending reconnect");

                timer.abort();
            }

            inner.status = ConnectionStatus::Connecting;
        }

        self.open().await
    }

    /// Whether a session exists and is open.
    pub async fn is_connected(&self) -> bool {
        let inner = self.inner.lock().await;

        inner.status == ConnectionStatus::Connected && inner.sink.is_some()
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.inner.lock().await.status
    }

    /// Whether a reconnect timer is waiting to fire.
    pub async fn has_pending_reconnect(&self) -> bool {
        self.inner.lock().await.reconnect.is_some()
    }

    /// The last stats snapshot sent by the node, if any.
    pub fn stats(&self) -> Option<RemoteStats> {
        self.state.read().stats.clone()
    }

    /// Sends a message to the node.
    ///
    /// Resolves to [`SendStatus::NotConnected`] without error if there is no
    /// open connection. Writes are serialized across callers.
    ///
    /// [`SendStatus::NotConnected`]: enum.SendStatus.html#variant.NotConnected
    pub async fn send<M: IntoWebSocketMessage>(&self, message: &M) -> Result<SendStatus, Error> {
        let message = message.into_ws_message()?;
        let mut inner = self.inner.lock().await;

        if inner.status != ConnectionStatus::Connected {
            return Ok(SendStatus::NotConnected);
        }

        let sink = match inner.sink.as_mut() {
            Some(sink) => sink,
            None => return Ok(SendStatus::NotConnected),
        };

        trace!("Sending message: {:?}", message);

        sink.send(message).await?;

        Ok(SendStatus::Sent)
    }

    /// Closes the connection with code `1000` and reason `destroy`, and
    /// cancels any pending reconnect. No reconnect follows the resulting
    /// close.
    ///
    /// If the node doesn't answer the close within
    /// [`NodeConfig::close_timeout`], the session is dropped anyway.
    ///
    /// [`NodeConfig::close_timeout`]: struct.NodeConfig.html#structfield.close_timeout
    pub async fn destroy(self: &Arc<Self>) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;

        if let Some((_, timer)) = inner.reconnect.take() {
            debug!("Cancelling pending reconnect");

            timer.abort();
        }

        match inner.status {
            ConnectionStatus::Connected => {
                inner.status = ConnectionStatus::Closing;

                self.expire_close(self.generation.load(Ordering::SeqCst));

                if let Some(sink) = inner.sink.as_mut() {
                    let close = sink.send(Message::Close(Some(clean_close_frame())));

                    match timeout(self.config.close_timeout, close).await {
                        Ok(result) => result?,
                        Err(_) => debug!("Timed out sending close to node"),
                    }
                }
            },
            ConnectionStatus::Connecting => inner.status = ConnectionStatus::Closing,
            ConnectionStatus::Closing | ConnectionStatus::Disconnected => {},
        }

        Ok(())
    }

    /// Ends the session with the given generation once the close timeout
    /// passes, unless it has ended by then.
    fn expire_close(self: &Arc<Self>, generation: u64) {
        let node = Arc::clone(self);
        let close_timeout = self.config.close_timeout;

        tokio::spawn(async move {
            tokio::time::sleep(close_timeout).await;

            node.handle_close(generation, CLEAN_CLOSE_CODE, CLEAN_CLOSE_REASON.to_owned()).await;
        });
    }

    /// Performs the handshake. The status must already be `Connecting`.
    async fn open(self: &Arc<Self>) -> Result<(), Error> {
        let request = match self.request() {
            Ok(request) => request,
            Err(why) => {
                self.inner.lock().await.status = ConnectionStatus::Disconnected;

                return Err(why);
            },
        };

        info!("Connecting to node at {}", self.config.websocket_url());

        let result = tokio_tungstenite::connect_async(request).await;
        let mut inner = self.inner.lock().await;

        let stream = match result {
            Ok((stream, _)) => stream,
            Err(why) => {
                warn!("Failed to connect to node: {:?}", why);

                let (disconnect, _) = self.closed(&mut inner, ABNORMAL_CLOSE_CODE, String::new());
                drop(inner);

                self.handler.event(disconnect);

                return Err(why.into());
            },
        };

        if inner.status != ConnectionStatus::Connecting {
            debug!("Connection was destroyed during the handshake");

            let (disconnect, _) = self.closed(
                &mut inner,
                CLEAN_CLOSE_CODE,
                CLEAN_CLOSE_REASON.to_owned(),
            );
            drop(inner);

            self.handler.event(disconnect);

            let mut stream = stream;

            if let Err(why) = stream.close(Some(clean_close_frame())).await {
                debug!("Failed to close abandoned connection: {:?}", why);
            }

            return Ok(());
        }

        let (sink, stream) = stream.split();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        inner.sink = Some(sink);
        inner.status = ConnectionStatus::Connected;

        if let Some((_, timer)) = inner.reconnect.take() {
            timer.abort();
        }

        drop(inner);

        info!("Connected to node at {}", self.config.websocket_url());

        self.handler.event(Event::NodeConnect);

        let reader = tokio::spawn(Arc::clone(self).read(stream, generation));
        let mut inner = self.inner.lock().await;

        if self.generation.load(Ordering::SeqCst) == generation {
            inner.reader = Some(reader);
        } else {
            reader.abort();
        }

        Ok(())
    }

    fn request(&self) -> Result<Request, Error> {
        let mut request = self.config.websocket_url().into_client_request()?;

        {
            let headers = request.headers_mut();
            headers.insert("Authorization", HeaderValue::from_str(&self.config.password)?);
            headers.insert("Num-Shards", HeaderValue::from(self.config.num_shards));
            headers.insert("User-Id", HeaderValue::from(self.config.user_id));
            headers.insert("Client-Name", HeaderValue::from_str(&self.config.client_name)?);
        }

        Ok(request)
    }

    async fn read(self: Arc<Self>, mut stream: SplitStream<WsStream>, generation: u64) {
        let mut close = None;

        while let Some(message) = stream.next().await {
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!("Discarding frame from a superseded session");

                return;
            }

            match message {
                Ok(Message::Text(text)) => self.handle_message(text.as_bytes()),
                Ok(Message::Binary(bytes)) => self.handle_message(&bytes),
                Ok(Message::Close(frame)) => {
                    info!("Received a close: {:?}", frame);

                    close = frame.map(|frame| (u16::from(frame.code), frame.reason.to_string()));

                    break;
                },
                Ok(Message::Ping(data)) => debug!("Received a ping: {:?}", data),
                Ok(other) => trace!("Ignoring frame: {:?}", other),
                Err(WebSocketError::ConnectionClosed) | Err(WebSocketError::AlreadyClosed) => break,
                Err(why) => {
                    error!("Error reading from node: {:?}", why);

                    self.handler.event(Event::NodeError(why.into()));

                    break;
                },
            }
        }

        let (code, reason) = close.unwrap_or((ABNORMAL_CLOSE_CODE, String::new()));

        self.handle_close(generation, code, reason).await;
    }

    fn handle_message(&self, bytes: &[u8]) {
        trace!("Received frame: {}", String::from_utf8_lossy(bytes));

        match Incoming::from_slice(bytes) {
            Ok(Some(Incoming::Ready(ready))) => {
                self.handler.event(Event::NodeReady {
                    resumed: ready.resumed,
                    session_id: ready.session_id,
                });
            },
            Ok(Some(Incoming::Stats(stats))) => {
                self.state.write().stats = Some(stats);
            },
            Ok(Some(Incoming::PlayerUpdate(update))) => {
                self.handler.event(Event::PlayerUpdate(update));
            },
            Ok(Some(Incoming::Event(event))) => self.handler.event(event.into()),
            Ok(None) => {},
            Err(why) => {
                warn!("Error handling frame from node: {:?}", why);

                self.handler.event(Event::NodeError(why));
            },
        }
    }

    /// Handles the end of the session with the given generation. Closes of
    /// sessions that already ended are ignored.
    ///
    /// Returns whether a reconnect was scheduled.
    pub(crate) async fn handle_close(
        self: &Arc<Self>,
        generation: u64,
        code: u16,
        reason: String,
    ) -> bool {
        let mut inner = self.inner.lock().await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Ignoring close from a superseded session");

            return false;
        }

        // Flushes the reply to the node's close, if one is queued.
        if let Some(mut sink) = inner.sink.take() {
            match timeout(self.config.close_timeout, sink.close()).await {
                Ok(Ok(())) => {},
                Ok(Err(why)) => debug!("Error closing connection: {:?}", why),
                Err(_) => debug!("Timed out closing connection"),
            }
        }

        let (disconnect, reconnecting) = self.closed(&mut inner, code, reason);
        drop(inner);

        self.handler.event(disconnect);

        reconnecting
    }

    /// Tears down the session and schedules a reconnect unless this was a
    /// clean shutdown.
    ///
    /// Returns the disconnect event, to be emitted once the lock is released,
    /// and whether a reconnect was scheduled.
    fn closed(
        self: &Arc<Self>,
        inner: &mut Inner,
        code: u16,
        reason: String,
    ) -> (Event, bool) {
        let (code, reason) = if inner.status == ConnectionStatus::Closing {
            (CLEAN_CLOSE_CODE, CLEAN_CLOSE_REASON.to_owned())
        } else {
            (code, reason)
        };

        self.generation.fetch_add(1, Ordering::SeqCst);
        inner.sink = None;
        inner.status = ConnectionStatus::Disconnected;

        if let Some(reader) = inner.reader.take() {
            reader.abort();
        }

        info!("Node connection closed: {} {:?}", code, reason);

        let reconnecting = !is_clean_close(code, &reason) && self.schedule_reconnect(inner);

        (Event::NodeDisconnect { code, reason }, reconnecting)
    }

    /// Schedules a single reconnect. Does nothing if one is already pending.
    fn schedule_reconnect(self: &Arc<Self>, inner: &mut Inner) -> bool {
        if inner.reconnect.is_some() {
            debug!("Reconnect already pending");

            return false;
        }

        let id = inner.next_timer_id;
        inner.next_timer_id += 1;

        let node = Arc::clone(self);
        let delay = self.config.reconnect_delay;

        info!("Reconnecting to node in {:?}", delay);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut inner = node.inner.lock().await;

                match inner.reconnect {
                    Some((pending, _)) if pending == id => inner.reconnect = None,
                    _ => return,
                }

                if inner.status != ConnectionStatus::Disconnected {
                    return;
                }

                inner.status = ConnectionStatus::Connecting;
            }

            node.handler.event(Event::NodeReconnect);

            if let Err(why) = node.open().await {
                warn!("Failed to reconnect to node: {:?}", why);

                node.handler.event(Event::NodeError(why));
            }
        });

        inner.reconnect = Some((id, timer));

        true
    }
}

/// Whether a close means the connection was shut down on purpose.
pub fn is_clean_close(code: u16, reason: &str) -> bool {
    code == CLEAN_CLOSE_CODE && reason == CLEAN_CLOSE_REASON
}

fn clean_close_frame() -> CloseFrame<'static> {
    CloseFrame {
        code: CloseCode::from(CLEAN_CLOSE_CODE),
        reason: CLEAN_CLOSE_REASON.into(),
    }
}
