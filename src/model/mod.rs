//! Wire models for the node's WebSocket and HTTP APIs, and the Discord
//! gateway payloads used to establish voice connections.

pub mod gateway;
pub mod incoming;
pub mod outgoing;
pub mod snowflake;
pub mod stats;
pub mod track;

pub use self::gateway::{GatewayEvent, VoiceChannelDirective, VoiceServerUpdate, VoiceStateUpdate};
pub use self::incoming::{
    Incoming,
    PlayerUpdate,
    Ready,
    TrackEnd,
    TrackEvent,
    TrackException,
    TrackStart,
    TrackStuck,
    WebSocketClosed,
};
pub use self::outgoing::{
    Destroy,
    IntoWebSocketMessage,
    Pause,
    Play,
    Seek,
    Stop,
    VoiceUpdate,
    Volume,
};
pub use self::stats::RemoteStats;
pub use self::track::{LoadType, LoadedTracks, ThumbnailSize, TrackDescriptor};
