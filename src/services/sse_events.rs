use tracing::warn;

use crate::{
    dto::sse::{RoomVersionEvent, ServerEvent},
    state::{CommitOutcome, SharedState},
};

pub(crate) const EVENT_ROOM_VERSION: &str = "room.version";

/// Tell the subscribers of room `code` that a new version was committed.
pub fn broadcast_room_version(state: &SharedState, code: &str, outcome: CommitOutcome) {
    let payload = RoomVersionEvent {
        version: outcome.version.to_string(),
        state: outcome.phase,
    };
    match ServerEvent::json(Some(EVENT_ROOM_VERSION.to_string()), &payload) {
        Ok(event) => state.hubs().broadcast(code, event),
        Err(err) => warn!(room = %code, error = %err, "failed to serialise room event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState, state::state_machine::RoomPhase};

    #[tokio::test]
    async fn room_version_event_carries_version_and_state() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.hubs().subscribe("ROOM42");

        broadcast_room_version(
            &state,
            "ROOM42",
            CommitOutcome {
                phase: RoomPhase::GuessingOpen,
                version: 7,
            },
        );

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("room.version"));
        let body: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(body, serde_json::json!({ "version": "7", "state": "GUESSING_OPEN" }));
    }
}
