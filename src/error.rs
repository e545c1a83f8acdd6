use hyper::http::Error as HttpError;
use hyper::Error as HyperError;
use serde_json::{Error as JsonError, Value};
use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};
use tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue;
use tokio_tungstenite::tungstenite::Error as WebSocketError;

#[derive(Debug)]
pub enum Error {
    /// An HTTP request to the node could not be built.
    Http(HttpError),
    /// An HTTP request to the node failed in transit.
    Hyper(HyperError),
    /// A handshake header value contained invalid bytes.
    InvalidHeader(InvalidHeaderValue),
    Json(JsonError),
    /// A track search returned nothing playable.
    TrackNotFound,
    /// The node sent an `event` frame with a `type` this crate does not
    /// recognize.
    UnknownEvent {
        kind: String,
        payload: Value,
    },
    /// The node sent a frame with an `op` this crate does not recognize.
    UnknownOpcode {
        op: String,
        payload: Value,
    },
    WebSocket(WebSocketError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match *self {
            Error::Http(ref why) => write!(f, "invalid HTTP request: {}", why),
            Error::Hyper(ref why) => write!(f, "HTTP request failed: {}", why),
            Error::InvalidHeader(ref why) => write!(f, "invalid header value: {}", why),
            Error::Json(ref why) => write!(f, "JSON error: {}", why),
            Error::TrackNotFound => f.write_str("Query not found."),
            Error::UnknownEvent { ref kind, .. } => write!(f, "unknown event type: {}", kind),
            Error::UnknownOpcode { ref op, .. } => write!(f, "unknown opcode: {}", op),
            Error::WebSocket(ref why) => write!(f, "websocket error: {}", why),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Http(ref why) => Some(why),
            Error::Hyper(ref why) => Some(why),
            Error::InvalidHeader(ref why) => Some(why),
            Error::Json(ref why) => Some(why),
            Error::WebSocket(ref why) => Some(why),
            _ => None,
        }
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        Error::Http(err)
    }
}

impl From<HyperError> for Error {
    fn from(err: HyperError) -> Self {
        Error::Hyper(err)
    }
}

impl From<InvalidHeaderValue> for Error {
    fn from(err: InvalidHeaderValue) -> Self {
        Error::InvalidHeader(err)
    }
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Self {
        Error::Json(err)
    }
}

impl From<WebSocketError> for Error {
    fn from(err: WebSocketError) -> Self {
        Error::WebSocket(err)
    }
}
