use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    dto::room::{VerificationRequest, VerificationResponse},
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Hook called by the verification channel once a player sent the room's code.
#[utoipa::path(
    post,
    path = "/verification",
    tag = "verification",
    request_body = VerificationRequest,
    responses(
        (status = 200, description = "Room verified", body = VerificationResponse),
        (status = 404, description = "No unverified room holds this code")
    )
)]
pub async fn confirm_verification(
    State(state): State<SharedState>,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> Result<Json<VerificationResponse>, AppError> {
    let Json(payload) = payload?;
    let response = room_service::confirm_verification(&state, &payload.verify_code).await?;
    Ok(Json(response))
}

/// Configure the verification hook.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/verification", post(confirm_verification))
}
