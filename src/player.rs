//! Module containing structs for playing audio for guilds through a node.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use crate::event_handler::{shard_id, EventHandler};
use crate::model::{
    Destroy,
    IntoWebSocketMessage,
    Pause,
    Play,
    Seek,
    Stop,
    VoiceChannelDirective,
    VoiceUpdate,
    Volume,
};
use crate::nodes::{Node, SendStatus};
use crate::Error;

/// The lowest volume accepted by the node.
pub const MIN_VOLUME: i32 = 0;
/// The highest volume accepted by the node.
pub const MAX_VOLUME: i32 = 1000;
pub const DEFAULT_VOLUME: i32 = 100;

/// A light wrapper around a map keyed by guild IDs with audio players.
#[derive(Default)]
pub struct AudioPlayerManager {
    players: DashMap<u64, Arc<AudioPlayer>>,
}

impl AudioPlayerManager {
    /// Creates a new default `AudioPlayerManager`.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the guild's audio player, creating it with `create` if the
    /// guild doesn't have one yet.
    pub fn get_or_create<F>(&self, guild_id: u64, create: F) -> Arc<AudioPlayer>
        where F: FnOnce() -> AudioPlayer {
        let player = self.players.entry(guild_id).or_insert_with(|| Arc::new(create()));

        Arc::clone(player.value())
    }

    /// Retrieves the audio player for the guild, if it exists.
    pub fn get(&self, guild_id: u64) -> Option<Arc<AudioPlayer>> {
        self.players.get(&guild_id).map(|player| Arc::clone(player.value()))
    }

    /// Whether the manager contains a player for the given guild.
    pub fn has(&self, guild_id: u64) -> bool {
        self.players.contains_key(&guild_id)
    }

    pub fn remove(&self, guild_id: u64) -> Option<Arc<AudioPlayer>> {
        self.players.remove(&guild_id).map(|(_, player)| player)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[derive(Clone, Debug)]
struct PlayerState {
    channel_id: Option<u64>,
    paused: bool,
    position: i64,
    time: i64,
    track: Option<String>,
    voice: VoiceUpdate,
    volume: i32,
}

/// The audio player of a single guild.
///
/// Commands are forwarded to the node; sends while the node is disconnected
/// resolve to [`SendStatus::NotConnected`].
///
/// [`SendStatus::NotConnected`]: ../nodes/enum.SendStatus.html#variant.NotConnected
pub struct AudioPlayer {
    guild_id: u64,
    node: Arc<Node>,
    handler: Arc<dyn EventHandler>,
    state: Mutex<PlayerState>,
}

impl AudioPlayer {
    /// Creates a new audio player.
    ///
    /// Using [`Manager::create`] is the preferred method of creating a new
    /// player.
    ///
    /// [`Manager::create`]: ../struct.Manager.html#method.create
    pub fn new(
        guild_id: u64,
        channel_id: Option<u64>,
        node: Arc<Node>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            state: Mutex::new(PlayerState {
                paused: false,
                position: 0,
                time: 0,
                track: None,
                voice: VoiceUpdate::new(guild_id),
                volume: DEFAULT_VOLUME,
                channel_id,
            }),
            guild_id,
            node,
            handler,
        }
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn channel_id(&self) -> Option<u64> {
        self.state.lock().channel_id
    }

    pub fn paused(&self) -> bool {
        self.state.lock().paused
    }

    /// The track position in milliseconds, as of the node's last player
    /// update.
    pub fn position(&self) -> i64 {
        self.state.lock().position
    }

    /// When the node's last player update was made, as a Unix timestamp in
    /// milliseconds.
    pub fn time(&self) -> i64 {
        self.state.lock().time
    }

    /// The track the node was last told to play, if it hasn't ended.
    pub fn track(&self) -> Option<String> {
        self.state.lock().track.clone()
    }

    pub fn volume(&self) -> i32 {
        self.state.lock().volume
    }

    /// The pending voice state, as it would be sent to the node.
    pub fn voice_state(&self) -> VoiceUpdate {
        self.state.lock().voice.clone()
    }

    /// Asks Discord to join the player's voice channel.
    ///
    /// This doesn't wait for Discord to confirm; the confirmation arrives as
    /// voice state and voice server updates.
    pub fn connect(&self) {
        let channel_id = self.state.lock().channel_id;

        self.forward(channel_id);
    }

    /// Sets the player's voice channel and asks Discord to join it.
    pub fn join(&self, channel_id: u64) {
        self.state.lock().channel_id = Some(channel_id);

        self.forward(Some(channel_id));
    }

    /// Asks Discord to leave the guild's voice channel.
    pub fn disconnect(&self) {
        self.state.lock().channel_id = None;

        self.forward(None);
    }

    /// Sends the pending voice state to the node as-is.
    pub async fn update_state(&self) -> Result<SendStatus, Error> {
        let voice = self.voice_state();

        self.send(&voice).await
    }

    /// Tells the node to play a track, given its opaque handle.
    pub async fn play(&self, track: &str) -> Result<SendStatus, Error> {
        self.play_range(track, None, None).await
    }

    /// Tells the node to play a track between optional start and end times,
    /// in milliseconds.
    pub async fn play_range(
        &self,
        track: &str,
        start_time: Option<u64>,
        end_time: Option<u64>,
    ) -> Result<SendStatus, Error> {
        let status = self.send(&Play::new(self.guild_id, track, start_time, end_time)).await?;

        if status == SendStatus::Sent {
            let mut state = self.state.lock();
            state.track = Some(track.to_owned());
            state.paused = false;
        }

        Ok(status)
    }

    /// Tells the node to either pause or unpause the player.
    pub async fn pause(&self, pause: bool) -> Result<SendStatus, Error> {
        let status = self.send(&Pause::new(self.guild_id, pause)).await?;

        if status == SendStatus::Sent {
            self.state.lock().paused = pause;
        }

        Ok(status)
    }

    /// Tells the node to seek the player to a position in milliseconds.
    pub async fn seek(&self, position: i64) -> Result<SendStatus, Error> {
        self.send(&Seek::new(self.guild_id, position)).await
    }

    pub async fn stop(&self) -> Result<SendStatus, Error> {
        let status = self.send(&Stop::new(self.guild_id)).await?;

        if status == SendStatus::Sent {
            self.state.lock().track = None;
        }

        Ok(status)
    }

    /// Tells the node to destroy its player for the guild.
    pub async fn destroy(&self) -> Result<SendStatus, Error> {
        self.send(&Destroy::new(self.guild_id)).await
    }

    /// Sets the volume, clamped to `MIN_VOLUME..=MAX_VOLUME`, and tells the
    /// node about it.
    ///
    /// The new volume is kept even if the node can't be reached. Returns the
    /// player so calls can be chained.
    pub async fn set_volume(&self, volume: i32) -> &Self {
        let volume = clamp_volume(volume);

        self.state.lock().volume = volume;

        match self.send(&Volume::new(self.guild_id, volume)).await {
            Ok(SendStatus::Sent) => {},
            Ok(SendStatus::NotConnected) => {
                debug!("Volume for guild {} not sent, node disconnected", self.guild_id);
            },
            Err(why) => warn!("Failed to send volume for guild {}: {:?}", self.guild_id, why),
        }

        self
    }

    /// Runs `f` on the pending voice state while it's locked.
    pub(crate) fn with_voice_state<F, T>(&self, f: F) -> T
        where F: FnOnce(&mut VoiceUpdate) -> T {
        f(&mut self.state.lock().voice)
    }

    pub(crate) fn update_position(&self, time: i64, position: Option<i64>) {
        let mut state = self.state.lock();
        state.time = time;

        if let Some(position) = position {
            state.position = position;
        }
    }

    /// Forgets the current track if it's the one that ended.
    pub(crate) fn track_ended(&self, track: &str) {
        let mut state = self.state.lock();

        if state.track.as_ref().map_or(false, |current| current == track) {
            state.track = None;
            state.position = 0;
        }
    }

    fn forward(&self, channel_id: Option<u64>) {
        let directive = VoiceChannelDirective::new(self.guild_id, channel_id);
        let shard_id = shard_id(self.guild_id, self.node.config().num_shards);

        debug!("Forwarding voice state to shard {}: {:?}", shard_id, directive);

        self.handler.forward(shard_id, &directive);
    }

    #[inline]
    async fn send<M: IntoWebSocketMessage>(&self, message: &M) -> Result<SendStatus, Error> {
        self.node.send(message).await
    }
}

/// Clamps a volume to the range the node accepts.
pub fn clamp_volume(volume: i32) -> i32 {
    volume.max(MIN_VOLUME).min(MAX_VOLUME)
}
