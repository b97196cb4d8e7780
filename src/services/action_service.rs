use tracing::{debug, info};

use crate::{
    dto::{
        action::{ActionRequest, ActionResponse},
        validation::normalize_room_code,
    },
    error::ServiceError,
    state::{SharedState, transitions::run_transition_with_broadcast},
};

/// Dispatch a player action against room `code`.
pub async fn apply_action(
    state: &SharedState,
    code: &str,
    request: ActionRequest,
) -> Result<ActionResponse, ServiceError> {
    let code = normalize_room_code(code);
    let (action, caller, payload) = request.into_parts();

    match run_transition_with_broadcast(state, &code, caller, action, &payload).await {
        Ok(outcome) => {
            info!(
                room = %code,
                action = ?action,
                state = %outcome.phase,
                version = outcome.version,
                "action applied"
            );
            Ok(ActionResponse::ok())
        }
        Err(err) => {
            debug!(room = %code, action = ?action, player = %caller, error = %err, "action rejected");
            Err(err)
        }
    }
}
