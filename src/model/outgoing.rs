//! Messages sent to the node over the control WebSocket.

use serde::Serialize;
use serde_json::{self, Value};
use tokio_tungstenite::tungstenite::Message;
use super::gateway::VoiceServerUpdate;
use crate::Error;

/// Serializes a message into a WebSocket text frame.
pub trait IntoWebSocketMessage {
    fn into_ws_message(&self) -> Result<Message, Error>;
}

macro_rules! impl_into_ws_message {
    ($($name:ident),* $(,)*) => {
        $(
            impl IntoWebSocketMessage for $name {
                fn into_ws_message(&self) -> Result<Message, Error> {
                    Ok(Message::Text(serde_json::to_string(self)?.into()))
                }
            }
        )*
    };
}

impl_into_ws_message!(Destroy, Pause, Play, Seek, Stop, Value, VoiceUpdate, Volume);

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "op", rename = "destroy")]
pub struct Destroy {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
}

impl Destroy {
    pub fn new(guild_id: u64) -> Self {
        Self { guild_id }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "op", rename = "pause")]
pub struct Pause {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    pub pause: bool,
}

impl Pause {
    pub fn new(guild_id: u64, pause: bool) -> Self {
        Self { guild_id, pause }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "op", rename = "play")]
pub struct Play {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    pub track: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
}

impl Play {
    pub fn new<S: Into<String>>(
        guild_id: u64,
        track: S,
        start_time: Option<u64>,
        end_time: Option<u64>,
    ) -> Self {
        Self {
            track: track.into(),
            guild_id,
            start_time,
            end_time,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "op", rename = "seek")]
pub struct Seek {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    pub position: i64,
}

impl Seek {
    pub fn new(guild_id: u64, position: i64) -> Self {
        Self { guild_id, position }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "op", rename = "stop")]
pub struct Stop {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
}

impl Stop {
    pub fn new(guild_id: u64) -> Self {
        Self { guild_id }
    }
}

/// A guild's voice connection details, forwarded to the node so it can
/// connect to Discord's voice servers.
///
/// The node needs both halves: the session ID from the client's own
/// `VOICE_STATE_UPDATE` and the `VOICE_SERVER_UPDATE` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "op", rename = "voiceUpdate")]
pub struct VoiceUpdate {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<VoiceServerUpdate>,
}

impl VoiceUpdate {
    pub fn new(guild_id: u64) -> Self {
        Self {
            session_id: None,
            event: None,
            guild_id,
        }
    }

    /// Whether both the session ID and the voice server event are present.
    pub fn is_complete(&self) -> bool {
        self.session_id.is_some() && self.event.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "op", rename = "volume")]
pub struct Volume {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    pub volume: i32,
}

impl Volume {
    pub fn new(guild_id: u64, volume: i32) -> Self {
        Self { guild_id, volume }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use super::*;

    fn frame<T: IntoWebSocketMessage>(message: &T) -> Value {
        match message.into_ws_message().unwrap() {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected a text frame, got {:?}", other),
        }
    }

    #[test]
    fn test_play() {
        assert_eq!(frame(&Play::new(1, "QAAAjQIAJFJp", None, None)), json!({
            "op": "play",
            "guildId": "1",
            "track": "QAAAjQIAJFJp",
        }));
        assert_eq!(frame(&Play::new(1, "x", Some(10), Some(20))), json!({
            "op": "play",
            "guildId": "1",
            "track": "x",
            "startTime": 10,
            "endTime": 20,
        }));
    }

    #[test]
    fn test_volume() {
        assert_eq!(frame(&Volume::new(7, 150)), json!({
            "op": "volume",
            "guildId": "7",
            "volume": 150,
        }));
    }

    #[test]
    fn test_voice_update() {
        let mut update = VoiceUpdate::new(3);
        assert!(!update.is_complete());

        update.session_id = Some("abc".to_owned());
        update.event = Some(VoiceServerUpdate {
            guild_id: Some(3),
            token: "tok".to_owned(),
            endpoint: Some("us-east1.discord.media".to_owned()),
        });
        assert!(update.is_complete());

        assert_eq!(frame(&update), json!({
            "op": "voiceUpdate",
            "guildId": "3",
            "sessionId": "abc",
            "event": {
                "guild_id": "3",
                "token": "tok",
                "endpoint": "us-east1.discord.media",
            },
        }));
    }

    #[test]
    fn test_small_ops() {
        assert_eq!(frame(&Pause::new(1, true)), json!({"op": "pause", "guildId": "1", "pause": true}));
        assert_eq!(frame(&Seek::new(1, 3000)), json!({"op": "seek", "guildId": "1", "position": 3000}));
        assert_eq!(frame(&Stop::new(1)), json!({"op": "stop", "guildId": "1"}));
        assert_eq!(frame(&Destroy::new(1)), json!({"op": "destroy", "guildId": "1"}));
    }
}
