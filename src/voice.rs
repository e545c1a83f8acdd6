//! Merges Discord's `VOICE_STATE_UPDATE` and `VOICE_SERVER_UPDATE` dispatches
//! into the voice update a node needs to connect a guild's player.
//!
//! The gateway doesn't order the two dispatches, so each half is stored as it
//! arrives (last writer wins) and the update becomes sendable once both are
//! present.

use crate::model::{GatewayEvent, VoiceUpdate};

#[derive(Clone, Copy, Debug)]
pub struct VoiceStateReconciler {
    user_id: u64,
}

impl VoiceStateReconciler {
    /// Creates a reconciler accepting voice state updates for the given user,
    /// which should be the client's own user.
    pub fn new(user_id: u64) -> Self {
        Self { user_id }
    }

    /// Applies a gateway event to a guild's pending voice state.
    ///
    /// Voice state updates for other users, or without a session ID, are
    /// dropped without touching the state.
    ///
    /// Returns whether the state now has both the session ID and the voice
    /// server event, meaning it should be sent to the node. This is true
    /// after every applied update once both halves have arrived, even if
    /// nothing changed.
    pub fn apply(&self, state: &mut VoiceUpdate, event: &GatewayEvent) -> bool {
        match *event {
            GatewayEvent::VoiceServerUpdate(ref update) => {
                state.event = Some(update.clone());
            },
            GatewayEvent::VoiceStateUpdate(ref update) => {
                if update.user_id != self.user_id {
                    trace!("Dropping voice state update for user {}", update.user_id);

                    return false;
                }

                match update.session_id {
                    Some(ref session_id) => state.session_id = Some(session_id.clone()),
                    None => {
                        trace!("Dropping voice state update without a session");

                        return false;
                    },
                }
            },
        }

        state.is_complete()
    }
}
