use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{get, post},
};
use axum_valid::{Valid, ValidRejection};

use crate::{
    dto::{
        action::{ActionRequest, ActionResponse},
        room::{CreateRoomRequest, EntitlementRequest, JoinRoomRequest, RoomTicket},
        snapshot::{StateQuery, StateResponse},
    },
    error::AppError,
    services::{action_service, query_service, room_service},
    state::SharedState,
};

/// Routes handling the room lifecycle, player actions and state polling.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/room/create", post(create_room))
        .route("/room/join", post(join_room))
        .route("/room/{code}/action", post(apply_action))
        .route("/room/{code}/state", get(room_state))
        .route("/room/{code}/entitlement", post(grant_entitlement))
}

/// Open a new room hosted by the caller.
#[utoipa::path(
    post,
    path = "/room/create",
    tag = "room",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomTicket),
        (status = 400, description = "Invalid host name")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    payload: Result<Valid<Json<CreateRoomRequest>>, ValidRejection<JsonRejection>>,
) -> Result<Json<RoomTicket>, AppError> {
    let Valid(Json(payload)) = payload?;
    let ticket = room_service::create_room(&state, payload).await?;
    Ok(Json(ticket))
}

/// Join an existing room.
#[utoipa::path(
    post,
    path = "/room/join",
    tag = "room",
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined", body = RoomTicket),
        (status = 400, description = "Invalid payload or room full"),
        (status = 404, description = "Room not found")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    payload: Result<Valid<Json<JoinRoomRequest>>, ValidRejection<JsonRejection>>,
) -> Result<Json<RoomTicket>, AppError> {
    let Valid(Json(payload)) = payload?;
    let ticket = room_service::join_room(&state, payload).await?;
    Ok(Json(ticket))
}

/// Apply a player action to the room.
#[utoipa::path(
    post,
    path = "/room/{code}/action",
    tag = "room",
    params(("code" = String, Path, description = "Room code")),
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Action committed", body = ActionResponse),
        (status = 400, description = "Invalid payload or wrong room state"),
        (status = 403, description = "Caller lacks the required role"),
        (status = 404, description = "Room not found")
    )
)]
pub async fn apply_action(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    let Json(payload) = payload?;
    let response = action_service::apply_action(&state, &code, payload).await?;
    Ok(Json(response))
}

/// Poll the masked room state.
#[utoipa::path(
    get,
    path = "/room/{code}/state",
    tag = "room",
    params(("code" = String, Path, description = "Room code"), StateQuery),
    responses(
        (status = 200, description = "Snapshot, or `{\"changed\": false}` when `ver` is current", body = StateResponse),
        (status = 404, description = "Room not found")
    )
)]
pub async fn room_state(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    query: Result<Query<StateQuery>, QueryRejection>,
) -> Result<Json<StateResponse>, AppError> {
    let Query(query) = query?;
    let response = query_service::room_state(&state, &code, query).await?;
    Ok(Json(response))
}

/// Mark the room as premium-entitled (host only).
#[utoipa::path(
    post,
    path = "/room/{code}/entitlement",
    tag = "room",
    params(("code" = String, Path, description = "Room code")),
    request_body = EntitlementRequest,
    responses(
        (status = 200, description = "Entitlement granted", body = ActionResponse),
        (status = 403, description = "Caller is not the host"),
        (status = 404, description = "Room not found")
    )
)]
pub async fn grant_entitlement(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<EntitlementRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    let Json(payload) = payload?;
    room_service::grant_entitlement(&state, &code, payload.player_id).await?;
    Ok(Json(ActionResponse::ok()))
}
