use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::validation::{validate_player_name, validate_room_code};

/// Payload used to open a new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Display name of the host.
    #[validate(custom(function = "validate_player_name"))]
    pub host_name: String,
}

/// Payload used to join an existing room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Code shared by the host; trimmed and upper-cased.
    #[validate(custom(function = "validate_room_code"))]
    pub room_code: String,
    /// Display name of the new player.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
}

/// Credentials returned after creating or joining a room.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomTicket {
    pub room_code: String,
    /// Identifier to present on every subsequent request.
    pub player_id: Uuid,
}

/// Marks a room as premium-entitled.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EntitlementRequest {
    /// Must be the host of the room.
    pub player_id: Uuid,
}

/// Confirms a room through the verification channel.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerificationRequest {
    /// One-time code shown in the room.
    pub verify_code: String,
}

/// Outcome of a verification request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerificationResponse {
    /// Room that was verified.
    pub room_code: String,
    pub verified: bool,
}
