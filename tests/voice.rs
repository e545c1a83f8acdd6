mod common;

use common::{drain, next_json, recorder, wait_for, MockNode};
use lavalink_tokio::model::VoiceChannelDirective;
use lavalink_tokio::{Event, Manager, NodeConfig, SendStatus};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const USER: u64 = 42;

fn voice_state(guild_id: u64, user_id: u64, session_id: &str) -> Value {
    json!({
        "guild_id": guild_id.to_string(),
        "channel_id": "700",
        "user_id": user_id.to_string(),
        "session_id": session_id,
        "deaf": false,
        "mute": false,
        "self_deaf": true,
        "self_mute": false,
    })
}

fn voice_server(guild_id: u64) -> Value {
    json!({
        "guild_id": guild_id.to_string(),
        "token": "abcdef",
        "endpoint": "rotterdam1234.discord.media:443",
    })
}

#[tokio::test]
async fn test_voice_update_sent_once_in_either_order() {
    let server = MockNode::bind().await;
    let (handler, mut events) = recorder();
    let manager = Manager::new(NodeConfig::new("127.0.0.1", server.port, "pw", USER), handler.clone());

    let (connected, (mut socket, _)) = tokio::join!(manager.connect(), server.accept());
    connected.unwrap();
    wait_for(&mut events, |e| match *e { Event::NodeConnect => true, _ => false }).await;

    let first = manager.create(1, 700);
    let second = manager.create(2, 700);

    first.connect();
    assert_eq!(
        handler.forwarded.lock().clone(),
        vec![(0, VoiceChannelDirective::new(1, Some(700)))],
    );

    // Server first for guild 1, session first for guild 2, with noise between.
    assert_eq!(manager.update("VOICE_SERVER_UPDATE", voice_server(1)).await.unwrap(), None);
    assert_eq!(manager.update("VOICE_STATE_UPDATE", voice_state(2, USER, "s2")).await.unwrap(), None);
    assert_eq!(manager.update("VOICE_STATE_UPDATE", voice_state(1, USER + 1, "other")).await.unwrap(), None);
    assert_eq!(manager.update("VOICE_STATE_UPDATE", voice_state(1, USER, "s1")).await.unwrap(), Some(SendStatus::Sent));
    assert_eq!(manager.update("VOICE_SERVER_UPDATE", voice_server(2)).await.unwrap(), Some(SendStatus::Sent));

    // Marks the end of the voice updates.
    assert_eq!(second.pause(true).await.unwrap(), SendStatus::Sent);

    let one = next_json(&mut socket).await;
    let two = next_json(&mut socket).await;
    let marker = next_json(&mut socket).await;

    assert_eq!(one, json!({
        "op": "voiceUpdate",
        "guildId": "1",
        "sessionId": "s1",
        "event": {
            "guild_id": "1",
            "token": "abcdef",
            "endpoint": "rotterdam1234.discord.media:443",
        },
    }));
    assert_eq!(two["op"], "voiceUpdate");
    assert_eq!(two["sessionId"], "s2");
    assert_eq!(two["event"]["token"], one["event"]["token"]);
    assert_eq!(marker, json!({"op": "pause", "guildId": "2", "pause": true}));
    assert!(second.paused());

    // Once complete, every further update is sent again.
    assert_eq!(manager.update("VOICE_SERVER_UPDATE", voice_server(1)).await.unwrap(), Some(SendStatus::Sent));
    assert_eq!(next_json(&mut socket).await, one);

    manager.destroy().await.unwrap();
    drain(socket).await;
}

#[tokio::test]
async fn test_voice_update_for_unknown_guild_is_dropped() {
    let (handler, _) = recorder();
    let manager = Manager::new(NodeConfig::new("127.0.0.1", 1, "pw", USER), handler);

    assert_eq!(manager.update("VOICE_SERVER_UPDATE", voice_server(3)).await.unwrap(), None);
    assert_eq!(manager.update("VOICE_STATE_UPDATE", voice_state(3, USER, "s")).await.unwrap(), None);
    assert!(manager.player(3).is_none());
}
