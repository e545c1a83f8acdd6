use crate::model::{
    PlayerUpdate,
    TrackEnd,
    TrackEvent,
    TrackException,
    TrackStart,
    TrackStuck,
    VoiceChannelDirective,
    WebSocketClosed,
};
use crate::Error;

/// Everything the node connection reports to the outside world.
#[derive(Debug)]
pub enum Event {
    /// The WebSocket to the node opened and messages can be sent.
    NodeConnect,
    /// The node sent its `ready` frame.
    NodeReady {
        resumed: bool,
        session_id: Option<String>,
    },
    /// The WebSocket to the node closed.
    NodeDisconnect {
        code: u16,
        reason: String,
    },
    /// A scheduled reconnect is about to be attempted.
    NodeReconnect,
    /// A frame could not be decoded or classified, or the transport failed.
    ///
    /// These are never fatal.
    NodeError(Error),
    PlayerUpdate(PlayerUpdate),
    TrackStart(TrackStart),
    TrackEnd(TrackEnd),
    TrackException(TrackException),
    TrackStuck(TrackStuck),
    WebSocketClosed(WebSocketClosed),
}

impl From<TrackEvent> for Event {
    fn from(event: TrackEvent) -> Self {
        match event {
            TrackEvent::TrackStart(event) => Event::TrackStart(event),
            TrackEvent::TrackEnd(event) => Event::TrackEnd(event),
            TrackEvent::TrackException(event) => Event::TrackException(event),
            TrackEvent::TrackStuck(event) => Event::TrackStuck(event),
            TrackEvent::WebSocketClosed(event) => Event::WebSocketClosed(event),
        }
    }
}

pub trait EventHandler: Send + Sync {
    /// Tymethod called for forwarding a voice channel directive to the Discord
    /// shard with the given ID.
    fn forward(&self, shard_id: u64, directive: &VoiceChannelDirective);

    /// Called for each event from the node connection.
    fn event(&self, event: Event) {
        trace!("Unhandled event: {:?}", event);
    }
}

/// Calculates the ID of the shard that receives events for a guild.
pub fn shard_id(guild_id: u64, shard_count: u64) -> u64 {
    (guild_id >> 22) % shard_count.max(1)
}

#[cfg(test)]
mod tests {
    use super::shard_id;

    #[test]
    fn test_shard_id() {
        assert_eq!(shard_id(81384788765712384, 1), 0);
        assert_eq!(shard_id(81384788765712384, 2), 0);
        assert_eq!(shard_id(41771983423143937, 2), 0);
        assert_eq!(shard_id(41771983423143937 + (1 << 22), 2), 1);
        assert_eq!(shard_id(41771983423143937, 0), 0);
    }
}
