use serde::Deserialize;

/// A snapshot of a node's resource usage, sent periodically with the `stats`
/// opcode.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteStats {
    pub players: i32,
    pub playing_players: i32,
    /// Node uptime in milliseconds.
    pub uptime: i64,
    pub memory: RemoteStatsMemory,
    pub cpu: RemoteStatsCpu,
    /// Frame statistics, only present while at least one player is playing.
    pub frame_stats: Option<RemoteStatsFrames>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteStatsMemory {
    pub free: i64,
    pub used: i64,
    pub allocated: i64,
    pub reservable: i64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteStatsCpu {
    pub cores: i32,
    pub system_load: f64,
    pub lavalink_load: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteStatsFrames {
    pub sent: i64,
    pub nulled: i64,
    pub deficit: i64,
}
