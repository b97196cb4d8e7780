use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{state_machine::RoomAction, transitions::ActionPayload};

/// Body of `POST /room/{code}/action`.
///
/// Only the fields relevant to `action` are read; the rest are ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActionRequest {
    pub action: RoomAction,
    /// Player issuing the action.
    pub player_id: Uuid,
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub asker_player_id: Option<Uuid>,
    /// Drinking-penalty mode, read by `select-asker`.
    #[serde(default)]
    pub gui_mode: Option<bool>,
    #[serde(default)]
    pub target_player_ids: Option<Vec<Uuid>>,
    /// Ordered ids, most preferred first.
    #[serde(default)]
    pub ranking: Option<Vec<String>>,
    #[serde(default)]
    pub guess_top1: Option<String>,
    #[serde(default)]
    pub kick_player_id: Option<Uuid>,
}

impl ActionRequest {
    /// Split the request into the action, its caller and the action-specific fields.
    pub fn into_parts(self) -> (RoomAction, Uuid, ActionPayload) {
        let payload = ActionPayload {
            theme_id: self.theme_id,
            asker_player_id: self.asker_player_id,
            gui_mode: self.gui_mode,
            target_player_ids: self.target_player_ids,
            ranking: self.ranking,
            guess_top1: self.guess_top1,
            kick_player_id: self.kick_player_id,
        };
        (self.action, self.player_id, payload)
    }
}

/// Acknowledgement of a committed action.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    pub ok: bool,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_kebab_case_actions() {
        let request: ActionRequest = serde_json::from_str(
            r#"{
                "action": "submit-guess",
                "player_id": "6c1f4a8e-2f7e-4c55-9b0e-6b2f3e0c9a11",
                "guess_top1": "money",
                "theme_id": null
            }"#,
        )
        .unwrap();

        let (action, _, payload) = request.into_parts();
        assert_eq!(action, RoomAction::SubmitGuess);
        assert_eq!(payload.guess_top1.as_deref(), Some("money"));
        assert!(payload.theme_id.is_none());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let result = serde_json::from_str::<ActionRequest>(
            r#"{"action": "dance", "player_id": "6c1f4a8e-2f7e-4c55-9b0e-6b2f3e0c9a11"}"#,
        );
        assert!(result.is_err());
    }
}
