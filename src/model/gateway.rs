//! Discord gateway payloads consumed and produced for voice connections.

use serde::{Deserialize, Serialize};
use serde_json::{self, Value};

/// The gateway opcode for updating the client's voice state.
pub const VOICE_STATE_UPDATE_OPCODE: u8 = 4;

/// A gateway `VOICE_SERVER_UPDATE` payload.
///
/// This is passed verbatim to the node as the `event` of a voice update.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VoiceServerUpdate {
    #[serde(default, with = "super::snowflake::option")]
    pub guild_id: Option<u64>,
    pub token: String,
    pub endpoint: Option<String>,
}

/// A gateway `VOICE_STATE_UPDATE` payload, trimmed to the fields needed for
/// voice connections.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VoiceStateUpdate {
    #[serde(default, with = "super::snowflake::option")]
    pub guild_id: Option<u64>,
    #[serde(default, with = "super::snowflake::option")]
    pub channel_id: Option<u64>,
    #[serde(with = "super::snowflake")]
    pub user_id: u64,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A gateway dispatch relevant to voice connections.
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayEvent {
    VoiceServerUpdate(VoiceServerUpdate),
    VoiceStateUpdate(VoiceStateUpdate),
}

impl GatewayEvent {
    /// Parses a gateway dispatch by its event name (`t`) and data (`d`).
    ///
    /// Returns `None` for any event other than `VOICE_STATE_UPDATE` and
    /// `VOICE_SERVER_UPDATE`, and for payloads that don't have the expected
    /// shape.
    pub fn from_dispatch(kind: &str, data: Value) -> Option<Self> {
        let parsed = match kind {
            "VOICE_SERVER_UPDATE" => {
                serde_json::from_value(data).map(GatewayEvent::VoiceServerUpdate)
            },
            "VOICE_STATE_UPDATE" => {
                serde_json::from_value(data).map(GatewayEvent::VoiceStateUpdate)
            },
            _ => return None,
        };

        match parsed {
            Ok(event) => Some(event),
            Err(why) => {
                debug!("Dropping malformed {} payload: {:?}", kind, why);

                None
            },
        }
    }

    pub fn guild_id(&self) -> Option<u64> {
        match *self {
            GatewayEvent::VoiceServerUpdate(ref update) => update.guild_id,
            GatewayEvent::VoiceStateUpdate(ref update) => update.guild_id,
        }
    }
}

/// An outbound gateway payload asking Discord to move the client into (or out
/// of) a guild's voice channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VoiceChannelDirective {
    pub op: u8,
    pub d: VoiceChannelDirectiveData,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VoiceChannelDirectiveData {
    #[serde(with = "super::snowflake")]
    pub guild_id: u64,
    #[serde(with = "super::snowflake::option")]
    pub channel_id: Option<u64>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

impl VoiceChannelDirective {
    /// Creates a directive joining the channel, or leaving voice if
    /// `channel_id` is `None`.
    pub fn new(guild_id: u64, channel_id: Option<u64>) -> Self {
        Self {
            op: VOICE_STATE_UPDATE_OPCODE,
            d: VoiceChannelDirectiveData {
                self_mute: false,
                self_deaf: true,
                guild_id,
                channel_id,
            },
        }
    }
}
