use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Guesso Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::create_room,
        crate::routes::room::join_room,
        crate::routes::room::apply_action,
        crate::routes::room::room_state,
        crate::routes::room::grant_entitlement,
        crate::routes::sse::room_events,
        crate::routes::verification::confirm_verification,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::RoomTicket,
            crate::dto::room::EntitlementRequest,
            crate::dto::room::VerificationRequest,
            crate::dto::room::VerificationResponse,
            crate::dto::action::ActionRequest,
            crate::dto::action::ActionResponse,
            crate::dto::snapshot::StateResponse,
            crate::dto::snapshot::RoomSnapshot,
            crate::dto::sse::RoomVersionEvent,
            crate::state::state_machine::RoomAction,
            crate::state::state_machine::RoomPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Room lifecycle, actions and state polling"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "verification", description = "Verification channel hook"),
    )
)]
pub struct ApiDoc;
