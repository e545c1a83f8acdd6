use serde_json::Value;
use std::sync::{Arc, Weak};
use crate::model::{
    GatewayEvent,
    IntoWebSocketMessage,
    RemoteStats,
    TrackDescriptor,
    VoiceChannelDirective,
};
use crate::nodes::{ConnectionStatus, Node, NodeConfig, SendStatus};
use crate::player::{AudioPlayer, AudioPlayerManager};
use crate::search::TrackResolver;
use crate::voice::VoiceStateReconciler;
use crate::{Error, Event, EventHandler};

/// The entry point: owns the connection to the node and the guilds' audio
/// players, and feeds Discord's voice dispatches to them.
pub struct Manager {
    node: Arc<Node>,
    players: Arc<AudioPlayerManager>,
    handler: Arc<dyn EventHandler>,
    reconciler: VoiceStateReconciler,
    resolver: TrackResolver,
}

impl Manager {
    /// Creates a manager. Nothing connects until [`connect`] is called.
    ///
    /// [`connect`]: #method.connect
    pub fn new(config: NodeConfig, handler: Arc<dyn EventHandler>) -> Self {
        let players = Arc::new(AudioPlayerManager::new());
        let dispatcher = Arc::new(Dispatcher {
            players: Arc::downgrade(&players),
            handler: Arc::clone(&handler),
        });

        Self {
            reconciler: VoiceStateReconciler::new(config.user_id),
            resolver: TrackResolver::new(&config),
            node: Node::new(config, dispatcher),
            players,
            handler,
        }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Connects to the node. Does nothing if already connected.
    pub async fn connect(&self) -> Result<(), Error> {
        self.node.connect().await
    }

    pub async fn is_connected(&self) -> bool {
        self.node.is_connected().await
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.node.status().await
    }

    /// Shuts the connection down cleanly. It won't reconnect on its own.
    pub async fn destroy(&self) -> Result<(), Error> {
        self.node.destroy().await
    }

    /// The last stats snapshot sent by the node, if any.
    pub fn stats(&self) -> Option<RemoteStats> {
        self.node.stats()
    }

    /// Sends a message to the node.
    ///
    /// Resolves to `SendStatus::NotConnected` if there is no connection.
    pub async fn send<M: IntoWebSocketMessage>(&self, message: &M) -> Result<SendStatus, Error> {
        self.node.send(message).await
    }

    /// Returns the guild's player, creating it for the given voice channel if
    /// it doesn't exist. An existing player is returned unchanged.
    pub fn create(&self, guild_id: u64, channel_id: u64) -> Arc<AudioPlayer> {
        self.players.get_or_create(guild_id, || {
            debug!("Creating player for guild {}", guild_id);

            AudioPlayer::new(
                guild_id,
                Some(channel_id),
                Arc::clone(&self.node),
                Arc::clone(&self.handler),
            )
        })
    }

    pub fn player(&self, guild_id: u64) -> Option<Arc<AudioPlayer>> {
        self.players.get(guild_id)
    }

    /// Removes the guild's player from the manager, returning it.
    pub fn remove(&self, guild_id: u64) -> Option<Arc<AudioPlayer>> {
        self.players.remove(guild_id)
    }

    /// Feeds a gateway dispatch to the guild's player.
    ///
    /// Only `VOICE_STATE_UPDATE` and `VOICE_SERVER_UPDATE` are used. Dispatches
    /// for guilds without a player are dropped. Once the player has both a
    /// session ID and a voice server event, every update sends its voice
    /// state to the node; the status of that send is returned.
    pub async fn update(&self, kind: &str, data: Value) -> Result<Option<SendStatus>, Error> {
        match GatewayEvent::from_dispatch(kind, data) {
            Some(event) => self.update_voice(&event).await,
            None => Ok(None),
        }
    }

    /// Typed version of [`update`].
    ///
    /// [`update`]: #method.update
    pub async fn update_voice(&self, event: &GatewayEvent) -> Result<Option<SendStatus>, Error> {
        let player = match event.guild_id().and_then(|id| self.players.get(id)) {
            Some(player) => player,
            None => {
                trace!("Dropping voice event for unknown guild: {:?}", event.guild_id());

                return Ok(None);
            },
        };

        let complete = player.with_voice_state(|state| self.reconciler.apply(state, event));

        if !complete {
            return Ok(None);
        }

        player.update_state().await.map(Some)
    }

    /// Resolves a query or URI to tracks. See [`TrackResolver::search`].
    ///
    /// [`TrackResolver::search`]: search/struct.TrackResolver.html#method.search
    pub async fn search<R: Clone>(&self, query: &str, requester: R)
        -> Result<Vec<TrackDescriptor<R>>, Error> {
        self.resolver.search(query, requester).await
    }
}

/// Folds node events into player state before passing them on.
struct Dispatcher {
    players: Weak<AudioPlayerManager>,
    handler: Arc<dyn EventHandler>,
}

impl EventHandler for Dispatcher {
    fn forward(&self, shard_id: u64, directive: &VoiceChannelDirective) {
        self.handler.forward(shard_id, directive);
    }

    fn event(&self, event: Event) {
        if let Some(players) = self.players.upgrade() {
            match event {
                Event::PlayerUpdate(ref update) => {
                    if let Some(player) = players.get(update.guild_id) {
                        player.update_position(update.state.time, update.state.position);
                    }
                },
                Event::TrackEnd(ref end) => {
                    if let Some(player) = players.get(end.guild_id) {
                        player.track_ended(&end.track);
                    }
                },
                _ => {},
            }
        }

        self.handler.event(event);
    }
}
