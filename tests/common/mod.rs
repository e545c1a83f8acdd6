#![allow(dead_code)]

use futures::StreamExt;
use lavalink_tokio::model::VoiceChannelDirective;
use lavalink_tokio::{Event, EventHandler};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

pub const WAIT: Duration = Duration::from_secs(5);

pub struct Recorder {
    events: UnboundedSender<Event>,
    pub forwarded: Mutex<Vec<(u64, VoiceChannelDirective)>>,
}

impl EventHandler for Recorder {
    fn forward(&self, shard_id: u64, directive: &VoiceChannelDirective) {
        self.forwarded.lock().push((shard_id, directive.clone()));
    }

    fn event(&self, event: Event) {
        let _ = self.events.send(event);
    }
}

pub fn recorder() -> (Arc<Recorder>, UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let recorder = Recorder {
        events: tx,
        forwarded: Mutex::new(Vec::new()),
    };

    (Arc::new(recorder), rx)
}

/// Waits for the first event matching `f`, skipping the rest.
pub async fn wait_for<F>(events: &mut UnboundedReceiver<Event>, f: F) -> Event
    where F: Fn(&Event) -> bool {
    timeout(WAIT, async {
        loop {
            match events.recv().await {
                Some(event) => if f(&event) {
                    return event;
                },
                None => panic!("event channel closed"),
            }
        }
    }).await.expect("timed out waiting for event")
}

pub type ServerSocket = WebSocketStream<TcpStream>;

/// A stand-in for a node's WebSocket endpoint.
pub struct MockNode {
    listener: TcpListener,
    pub port: u16,
}

impl MockNode {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        Self { listener, port }
    }

    /// Accepts a connection, returning it with its handshake headers.
    pub async fn accept(&self) -> (ServerSocket, HeaderMap) {
        let (stream, _) = self.listener.accept().await.unwrap();
        let mut headers = None;

        let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            headers = Some(request.headers().clone());

            Ok(response)
        };
        let socket = tokio_tungstenite::accept_hdr_async(stream, callback).await.unwrap();

        (socket, headers.unwrap())
    }

    pub async fn accept_within(&self, duration: Duration) -> Option<(ServerSocket, HeaderMap)> {
        timeout(duration, self.accept()).await.ok()
    }
}

/// Reads the next text frame as JSON.
pub async fn next_json(socket: &mut ServerSocket) -> Value {
    let frame = timeout(WAIT, async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("socket ended: {:?}", other),
            }
        }
    }).await.expect("timed out waiting for frame");

    serde_json::from_str(&frame).unwrap()
}

/// Reads until the socket is closed, then drops it. Returns the close frame's
/// code and reason if there was one.
pub async fn drain(mut socket: ServerSocket) -> Option<(u16, String)> {
    let mut close = None;

    let _ = timeout(WAIT, async {
        while let Some(Ok(message)) = socket.next().await {
            if let Message::Close(Some(frame)) = message {
                close = Some((u16::from(frame.code), frame.reason.to_string()));
            }
        }
    }).await;

    close
}
