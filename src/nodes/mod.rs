mod node;

pub use self::node::{
    is_clean_close,
    Node,
    SendStatus,
    ABNORMAL_CLOSE_CODE,
    CLEAN_CLOSE_CODE,
    CLEAN_CLOSE_REASON,
};

use crate::model::RemoteStats;
use std::env;
use std::time::Duration;

/// How long to wait after an abnormal close before reconnecting.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// How long a close handshake may take before the session is dropped.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_CLIENT_NAME: &str = "lavalink-tokio";

/// Connection details for a node.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// The ID of the bot user, sent as `User-Id` and used to recognize the
    /// client's own voice state updates.
    pub user_id: u64,
    pub num_shards: u64,
    pub client_name: String,
    pub reconnect_delay: Duration,
    /// How long to wait for the node to answer a close before giving up on
    /// the session.
    pub close_timeout: Duration,
}

impl NodeConfig {
    pub fn new<H, P>(host: H, port: u16, password: P, user_id: u64) -> Self
        where H: Into<String>, P: Into<String> {
        Self {
            host: host.into(),
            password: password.into(),
            num_shards: 1,
            client_name: DEFAULT_CLIENT_NAME.to_owned(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            port,
            user_id,
        }
    }

    /// Builds a config from `LAVALINK_HOST`, `LAVALINK_PORT` and
    /// `LAVALINK_PASSWORD`, falling back to the node's stock defaults.
    pub fn from_env(user_id: u64) -> Self {
        let host = env::var("LAVALINK_HOST").unwrap_or_else(|_| "localhost".to_owned());
        let port = env::var("LAVALINK_PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(2333);
        let password = env::var("LAVALINK_PASSWORD")
            .unwrap_or_else(|_| "youshallnotpass".to_owned());

        Self::new(host, port, password, user_id)
    }

    pub fn num_shards(mut self, num_shards: u64) -> Self {
        self.num_shards = num_shards;

        self
    }

    pub fn client_name<S: Into<String>>(mut self, client_name: S) -> Self {
        self.client_name = client_name.into();

        self
    }

    pub fn reconnect_delay(mut self, reconnect_delay: Duration) -> Self {
        self.reconnect_delay = reconnect_delay;

        self
    }

    pub fn close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;

        self
    }

    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    pub fn http_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// The lifecycle state of the connection to a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    /// A clean shutdown was requested and the close handshake is in flight.
    Closing,
}

#[derive(Clone, Debug, Default)]
pub struct State {
    pub stats: Option<RemoteStats>,
}
