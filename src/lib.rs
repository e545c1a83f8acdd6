//! A tokio client for Lavalink audio nodes.
//!
//! The [`Manager`] owns one WebSocket connection to a node and one
//! [`AudioPlayer`] per guild. Feed it Discord's `VOICE_STATE_UPDATE` and
//! `VOICE_SERVER_UPDATE` dispatches with [`Manager::update`] and it forwards
//! each guild's voice connection details to the node once they're complete.
//!
//! [`AudioPlayer`]: player/struct.AudioPlayer.html
//! [`Manager`]: struct.Manager.html
//! [`Manager::update`]: struct.Manager.html#method.update

#[macro_use] extern crate log;

pub mod model;
pub mod nodes;
pub mod player;
pub mod search;
pub mod voice;

mod error;
mod event_handler;
mod manager;

pub use self::error::Error;
pub use self::event_handler::{shard_id, Event, EventHandler};
pub use self::manager::Manager;
pub use self::nodes::{ConnectionStatus, NodeConfig, SendStatus};
