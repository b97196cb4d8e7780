//! Room lifecycle: creation, joining and the verification and entitlement channels.

use std::time::SystemTime;

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::{
        room::{CreateRoomRequest, JoinRoomRequest, RoomTicket, VerificationResponse},
        validation::normalize_room_code,
    },
    error::ServiceError,
    services::sse_events::broadcast_room_version,
    state::{
        SharedState,
        room::{Player, Room},
    },
};

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ROOM_CODE_LEN: usize = 6;

/// Draw a room code, avoiding characters that are easy to misread.
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())]))
        .collect()
}

/// Draw a four digit verification code.
pub fn generate_verify_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.random_range(1000..=9999_u16).to_string()
}

fn new_player(name: &str, is_host: bool) -> Player {
    let now = SystemTime::now();
    Player {
        id: Uuid::new_v4(),
        name: name.trim().to_owned(),
        is_host,
        joined_at: now,
        last_seen: now,
    }
}

/// Open a room in the lobby phase, hosted by the caller.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<RoomTicket, ServiceError> {
    let store = state.require_room_store().await?;
    let host = new_player(&request.host_name, true);

    for attempt in 1..=state.config().room_code_attempts() {
        let (code, verify_code) = {
            let mut rng = rand::rng();
            (generate_room_code(&mut rng), generate_verify_code(&mut rng))
        };
        if store
            .find_room_by_verify_code(verify_code.clone())
            .await?
            .is_some()
        {
            debug!(attempt, "verification code in use; drawing again");
            continue;
        }

        let room = Room::new(code.clone(), verify_code, host.clone(), host.joined_at);
        if store.insert_room(room.into()).await? {
            info!(room = %code, host = %host.id, "room created");
            return Ok(RoomTicket {
                room_code: code,
                player_id: host.id,
            });
        }
        debug!(attempt, room = %code, "room code collision; drawing again");
    }

    Err(ServiceError::Internal(
        "could not allocate a unique room code".into(),
    ))
}

/// Add a player to an existing room.
pub async fn join_room(
    state: &SharedState,
    request: JoinRoomRequest,
) -> Result<RoomTicket, ServiceError> {
    let code = normalize_room_code(&request.room_code);
    let max_players = state.config().max_players();
    let player = new_player(&request.name, false);

    let ((), outcome) = state
        .update_room(&code, |room| {
            if room.players.len() >= max_players {
                return Err(ServiceError::InvalidState(format!(
                    "this room is full ({max_players} players max)"
                )));
            }
            room.players.push(player.clone());
            Ok(())
        })
        .await?;

    info!(room = %code, player = %player.id, "player joined");
    broadcast_room_version(state, &code, outcome);
    Ok(RoomTicket {
        room_code: code,
        player_id: player.id,
    })
}

/// Mark the unverified room holding `verify_code` as verified.
pub async fn confirm_verification(
    state: &SharedState,
    verify_code: &str,
) -> Result<VerificationResponse, ServiceError> {
    let verify_code = verify_code.trim();
    let store = state.require_room_store().await?;
    let room = store
        .find_room_by_verify_code(verify_code.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound("no room is waiting for this code".into()))?;

    let ((), outcome) = state
        .update_room(&room.code, |room| {
            if room.verified || room.verify_code != verify_code {
                return Err(ServiceError::NotFound(
                    "no room is waiting for this code".into(),
                ));
            }
            room.verified = true;
            Ok(())
        })
        .await?;

    info!(room = %room.code, "room verified");
    broadcast_room_version(state, &room.code, outcome);
    Ok(VerificationResponse {
        room_code: room.code,
        verified: true,
    })
}

/// Mark room `code` as premium-entitled on behalf of its host.
pub async fn grant_entitlement(
    state: &SharedState,
    code: &str,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    let code = normalize_room_code(code);
    let ((), outcome) = state
        .update_room(&code, |room| {
            let caller = room
                .caller(player_id)
                .ok_or_else(|| ServiceError::Forbidden("not a player of this room".into()))?;
            if !caller.is_host {
                return Err(ServiceError::Forbidden("only the host can do this".into()));
            }
            room.premium = true;
            Ok(())
        })
        .await?;

    info!(room = %code, "premium entitlement granted");
    broadcast_room_version(state, &code, outcome);
    Ok(())
}
