use std::sync::Mutex;

use adaptive_domain::RoomEvent;
use dashmap::DashMap;
use tokio::sync::broadcast;

/// Publishes wire events to whoever is listening on a room (§6 broadcast
/// events). Partitioned per room: no cross-room message ordering is
/// promised (§5 "Shared resource policy").
pub trait RoomBroadcaster: Send + Sync {
    fn publish(&self, room_id: &str, event: RoomEvent);
}

/// Production broadcast gateway: one `tokio::sync::broadcast` channel per
/// room, created lazily on first publish or subscribe.
pub struct TokioBroadcastGateway {
    channels: DashMap<String, broadcast::Sender<RoomEvent>>,
}

impl Default for TokioBroadcastGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioBroadcastGateway {
    const CHANNEL_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribes to a room's event stream, creating the channel if this is
    /// the first subscriber.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        self.channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(Self::CHANNEL_CAPACITY).0)
            .subscribe()
    }
}

impl RoomBroadcaster for TokioBroadcastGateway {
    fn publish(&self, room_id: &str, event: RoomEvent) {
        let sender = self
            .channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(Self::CHANNEL_CAPACITY).0);
        // A send error here just means nobody is currently subscribed;
        // events are not replayed, matching the "no cross-room ordering,
        // no durability" broadcast contract.
        let _ = sender.send(event);
    }
}

/// Test double that records every published event instead of delivering it,
/// so orchestrator tests can assert on the exact broadcast sequence (§5
/// ordering guarantee: `question_started` -> N x `player_*` -> 0..k x
/// `bingo_achieved` -> `game_completed`).
#[derive(Default)]
pub struct RecordingBroadcaster {
    pub events: Mutex<Vec<(String, RoomEvent)>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events_for(&self, room_id: &str) -> Vec<RoomEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == room_id)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

impl RoomBroadcaster for RecordingBroadcaster {
    fn publish(&self, room_id: &str, event: RoomEvent) {
        self.events.lock().unwrap().push((room_id.to_string(), event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_event() -> RoomEvent {
        RoomEvent::QuestionStarted {
            room_id: "r1".into(),
            question_number: 1,
            clue_text: "clue".into(),
            skill_connection: "Counting".into(),
            career_code: "Chef".into(),
            time_limit_seconds: 20,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn recording_broadcaster_only_returns_events_for_the_requested_room() {
        let broadcaster = RecordingBroadcaster::new();
        broadcaster.publish("r1", sample_event());
        broadcaster.publish("r2", sample_event());

        assert_eq!(broadcaster.events_for("r1").len(), 1);
        assert_eq!(broadcaster.events_for("r2").len(), 1);
        assert!(broadcaster.events_for("r3").is_empty());
    }

    #[tokio::test]
    async fn tokio_gateway_delivers_to_subscribers_of_the_same_room() {
        let gateway = TokioBroadcastGateway::new();
        let mut rx = gateway.subscribe("r1");

        gateway.publish("r1", sample_event());

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, RoomEvent::QuestionStarted { .. }));
    }
}
