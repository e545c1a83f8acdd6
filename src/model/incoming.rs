//! Frames received from the node over the control WebSocket.

use serde::Deserialize;
use serde_json::{self, Value};
use super::stats::RemoteStats;
use crate::Error;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ready {
    #[serde(default)]
    pub resumed: bool,
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    pub state: PlayerUpdateState,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerUpdateState {
    /// Unix timestamp in milliseconds at which the update was made.
    pub time: i64,
    /// Track position in milliseconds, absent when nothing is playing.
    pub position: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackStart {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    #[serde(default)]
    pub track: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackEnd {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    #[serde(default)]
    pub track: String,
    /// Why the track ended, e.g. `FINISHED`, `STOPPED` or `REPLACED`.
    #[serde(default)]
    pub reason: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackException {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    #[serde(default)]
    pub track: String,
    pub exception: Option<TrackExceptionInfo>,
    /// Older nodes send a bare message instead of `exception`.
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackExceptionInfo {
    pub message: Option<String>,
    pub severity: String,
    pub cause: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackStuck {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    #[serde(default)]
    pub track: String,
    #[serde(default)]
    pub threshold_ms: i64,
}

/// The node's voice WebSocket to Discord was closed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketClosed {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub by_remote: bool,
}

/// A track or voice event, sent with the `event` opcode.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackEvent {
    TrackStart(TrackStart),
    TrackEnd(TrackEnd),
    TrackException(TrackException),
    TrackStuck(TrackStuck),
    WebSocketClosed(WebSocketClosed),
}

/// A classified frame from the node.
#[derive(Clone, Debug, PartialEq)]
pub enum Incoming {
    Ready(Ready),
    Stats(RemoteStats),
    PlayerUpdate(PlayerUpdate),
    Event(TrackEvent),
}

impl Incoming {
    /// Decodes and classifies a raw frame by its `op` field.
    ///
    /// Returns `Ok(None)` for events that don't carry a guild ID. Unrecognized
    /// opcodes and event types are errors carrying the raw payload.
    pub fn from_slice(bytes: &[u8]) -> Result<Option<Self>, Error> {
        let payload = serde_json::from_slice::<Value>(bytes)?;

        let op = match payload.get("op").and_then(Value::as_str) {
            Some(op) => op.to_owned(),
            None => {
                return Err(Error::UnknownOpcode {
                    op: payload.get("op").map(Value::to_string).unwrap_or_default(),
                    payload,
                });
            },
        };

        let incoming = match &op[..] {
            "ready" => Incoming::Ready(serde_json::from_value(payload)?),
            "stats" => Incoming::Stats(serde_json::from_value(payload)?),
            "playerUpdate" => Incoming::PlayerUpdate(serde_json::from_value(payload)?),
            "event" => return Self::classify_event(payload).map(|e| e.map(Incoming::Event)),
            _ => return Err(Error::UnknownOpcode { op, payload }),
        };

        Ok(Some(incoming))
    }

    fn classify_event(payload: Value) -> Result<Option<TrackEvent>, Error> {
        let has_guild = payload.get("guildId").map_or(false, |id| !id.is_null());

        if !has_guild {
            trace!("Ignoring event without a guild: {:?}", payload);

            return Ok(None);
        }

        let kind = payload.get("type").and_then(Value::as_str).unwrap_or_default().to_owned();

        let event = match &kind[..] {
            "TrackStartEvent" => TrackEvent::TrackStart(serde_json::from_value(payload)?),
            "TrackEndEvent" => TrackEvent::TrackEnd(serde_json::from_value(payload)?),
            "TrackExceptionEvent" => TrackEvent::TrackException(serde_json::from_value(payload)?),
            "TrackStuckEvent" => TrackEvent::TrackStuck(serde_json::from_value(payload)?),
            "WebSocketClosedEvent" => TrackEvent::WebSocketClosed(serde_json::from_value(payload)?),
            _ => return Err(Error::UnknownEvent { kind, payload }),
        };

        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use super::*;

    fn parse(value: Value) -> Result<Option<Incoming>, Error> {
        Incoming::from_slice(value.to_string().as_bytes())
    }

    #[test]
    fn test_ready() {
        let ready = parse(json!({"op": "ready", "resumed": true, "sessionId": "la3kfsdf5eafe848"}));

        assert_eq!(ready.unwrap(), Some(Incoming::Ready(Ready {
            resumed: true,
            session_id: Some("la3kfsdf5eafe848".to_owned()),
        })));
    }

    #[test]
    fn test_stats() {
        let stats = parse(json!({
            "op": "stats",
            "players": 2,
            "playingPlayers": 1,
            "uptime": 123456,
            "memory": {"free": 1, "used": 2, "allocated": 3, "reservable": 4},
            "cpu": {"cores": 4, "systemLoad": 0.5, "lavalinkLoad": 0.25},
        })).unwrap();

        match stats {
            Some(Incoming::Stats(stats)) => {
                assert_eq!(stats.playing_players, 1);
                assert_eq!(stats.memory.reservable, 4);
                assert_eq!(stats.cpu.lavalink_load, 0.25);
                assert!(stats.frame_stats.is_none());
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_track_events() {
        let start = parse(json!({
            "op": "event",
            "type": "TrackStartEvent",
            "guildId": "5",
            "track": "abc",
        })).unwrap();
        let closed = parse(json!({
            "op": "event",
            "type": "WebSocketClosedEvent",
            "guildId": "5",
            "code": 4006,
            "reason": "Your session is no longer valid.",
            "byRemote": true,
        })).unwrap();

        assert_eq!(start, Some(Incoming::Event(TrackEvent::TrackStart(TrackStart {
            guild_id: 5,
            track: "abc".to_owned(),
        }))));
        assert_eq!(closed, Some(Incoming::Event(TrackEvent::WebSocketClosed(WebSocketClosed {
            guild_id: 5,
            code: 4006,
            reason: "Your session is no longer valid.".to_owned(),
            by_remote: true,
        }))));
    }

    #[test]
    fn test_event_without_guild_is_ignored() {
        let event = parse(json!({"op": "event", "type": "TrackStartEvent", "track": "abc"}));

        assert_eq!(event.unwrap(), None);
    }

    #[test]
    fn test_unknown_event_type() {
        match parse(json!({"op": "event", "type": "SegmentSkipped", "guildId": "1"})) {
            Err(Error::UnknownEvent { kind, payload }) => {
                assert_eq!(kind, "SegmentSkipped");
                assert_eq!(payload["guildId"], "1");
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_opcode() {
        match parse(json!({"op": "hello", "x": 1})) {
            Err(Error::UnknownOpcode { op, payload }) => {
                assert_eq!(op, "hello");
                assert_eq!(payload["x"], 1);
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json() {
        match Incoming::from_slice(b"{not json") {
            Err(Error::Json(_)) => {},
            other => panic!("unexpected: {:?}", other),
        }
    }
}
