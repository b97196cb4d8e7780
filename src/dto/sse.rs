use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::state_machine::RoomPhase;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Sent after every committed write to a room; clients re-poll the state endpoint.
pub struct RoomVersionEvent {
    /// Version token of the new room state.
    pub version: String,
    pub state: RoomPhase,
}
