use std::time::SystemTime;

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{
    GuessEntity, PlayerEntity, RoomEntity, RoundEntity, VerificationEntity,
};
use crate::state::state_machine::RoomPhase;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomDocument {
    #[serde(rename = "_id")]
    code: String,
    phase: RoomPhase,
    current_round: i64,
    asker_player_id: Option<Uuid>,
    current_guess_rank: Option<i32>,
    #[serde(default)]
    gui_mode: bool,
    verification: VerificationEntity,
    #[serde(default)]
    premium: bool,
    players: Vec<MongoPlayerDocument>,
    rounds: Vec<RoundEntity>,
    version: i64,
    created_at: DateTime,
    updated_at: DateTime,
}

/// Player inside a room document. The id is stored as text so presence updates can match on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoPlayerDocument {
    id: String,
    name: String,
    is_host: bool,
    joined_at: DateTime,
    last_seen: DateTime,
}

impl From<RoomEntity> for MongoRoomDocument {
    fn from(value: RoomEntity) -> Self {
        Self {
            code: value.code,
            phase: value.phase,
            current_round: i64::from(value.current_round),
            asker_player_id: value.asker_player_id,
            current_guess_rank: value.current_guess_rank.map(i32::from),
            gui_mode: value.gui_mode,
            verification: value.verification,
            premium: value.premium,
            players: value.players.into_iter().map(Into::into).collect(),
            rounds: value.rounds,
            version: version_to_i64(value.version),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoRoomDocument> for RoomEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRoomDocument) -> Result<Self, Self::Error> {
        let corrupt = |reason: &str| MongoDaoError::CorruptDocument {
            code: value.code.clone(),
            reason: reason.to_owned(),
        };
        let current_round =
            u32::try_from(value.current_round).map_err(|_| corrupt("current_round out of range"))?;
        let current_guess_rank = value
            .current_guess_rank
            .map(u8::try_from)
            .transpose()
            .map_err(|_| corrupt("current_guess_rank out of range"))?;
        let version = u64::try_from(value.version).map_err(|_| corrupt("negative version"))?;
        let players = value
            .players
            .iter()
            .cloned()
            .map(PlayerEntity::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| corrupt("player id is not a uuid"))?;

        Ok(Self {
            code: value.code,
            phase: value.phase,
            current_round,
            asker_player_id: value.asker_player_id,
            current_guess_rank,
            gui_mode: value.gui_mode,
            verification: value.verification,
            premium: value.premium,
            players,
            rounds: value.rounds,
            version,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            is_host: value.is_host,
            joined_at: DateTime::from_system_time(value.joined_at),
            last_seen: DateTime::from_system_time(value.last_seen),
        }
    }
}

impl TryFrom<MongoPlayerDocument> for PlayerEntity {
    type Error = uuid::Error;

    fn try_from(value: MongoPlayerDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&value.id)?,
            name: value.name,
            is_host: value.is_host,
            joined_at: value.joined_at.to_system_time(),
            last_seen: value.last_seen.to_system_time(),
        })
    }
}

/// Guess ledger row. The player id is stored as text so the unique key is easy to filter on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGuessDocument {
    room_code: String,
    round_no: i64,
    player_id: String,
    guess_rank: i32,
    guess_top1: String,
    submitted_at: DateTime,
}

impl MongoGuessDocument {
    /// Filter matching this row's unique key.
    pub fn key_filter(&self) -> Document {
        doc! {
            "room_code": &self.room_code,
            "round_no": self.round_no,
            "player_id": &self.player_id,
            "guess_rank": self.guess_rank,
        }
    }
}

impl From<GuessEntity> for MongoGuessDocument {
    fn from(value: GuessEntity) -> Self {
        Self {
            room_code: value.room_code,
            round_no: i64::from(value.round_no),
            player_id: value.player_id.to_string(),
            guess_rank: i32::from(value.guess_rank),
            guess_top1: value.guess_top1,
            submitted_at: DateTime::from_system_time(value.submitted_at),
        }
    }
}

impl TryFrom<MongoGuessDocument> for GuessEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGuessDocument) -> Result<Self, Self::Error> {
        let corrupt = |reason: &str| MongoDaoError::CorruptDocument {
            code: value.room_code.clone(),
            reason: reason.to_owned(),
        };
        let round_no = u32::try_from(value.round_no).map_err(|_| corrupt("guess round out of range"))?;
        let guess_rank =
            u8::try_from(value.guess_rank).map_err(|_| corrupt("guess rank out of range"))?;
        let player_id =
            Uuid::parse_str(&value.player_id).map_err(|_| corrupt("guess player id is not a uuid"))?;

        Ok(Self {
            room_code: value.room_code,
            round_no,
            player_id,
            guess_rank,
            guess_top1: value.guess_top1,
            submitted_at: value.submitted_at.to_system_time(),
        })
    }
}

/// Stored versions are signed; rooms never get anywhere near the limit.
pub fn version_to_i64(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

pub fn doc_code(code: &str) -> Document {
    doc! { "_id": code }
}
