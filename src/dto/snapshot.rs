use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    catalog::{ThemeAccess, ThemeCategory},
    dto::format_system_time,
    state::{room::Player, state_machine::RoomPhase},
};

/// Query string of `GET /room/{code}/state`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StateQuery {
    /// Player polling; scopes `my_guess` and presence updates.
    #[serde(default)]
    pub player_id: Option<Uuid>,
    /// Version token from the previous snapshot.
    #[serde(default)]
    pub ver: Option<String>,
    /// `1` to refresh the caller's presence.
    #[serde(default)]
    pub update_seen: Option<String>,
}

impl StateQuery {
    /// Whether the caller asked for a presence refresh.
    pub fn wants_seen_update(&self) -> bool {
        matches!(self.update_seen.as_deref(), Some("1") | Some("true"))
    }
}

/// Either a lightweight "nothing changed" marker or the full snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum StateResponse {
    Full(Box<RoomSnapshot>),
    Unchanged(Unchanged),
}

/// Returned when the presented version token is still current.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Unchanged {
    /// Always `false`.
    pub changed: bool,
}

/// Masked view of a room, identical for every player except `my_guess`.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomSnapshot {
    /// Version token to send back as `ver`.
    #[serde_as(as = "DisplayFromStr")]
    #[schema(value_type = String)]
    pub version: u64,
    pub room: RoomSummary,
    /// Roster in join order.
    pub players: Vec<PlayerSummary>,
    /// Theme of the current round.
    pub theme: Option<ThemeView>,
    pub round: Option<RoundView>,
    /// Submissions for the active rank.
    pub guess_count: usize,
    /// Caller's guess for the active rank.
    pub my_guess: Option<String>,
    /// Answer at the active rank (`RESULT_REVEALED` only).
    pub correct_answer: Option<String>,
    /// Every guess for the active rank (`RESULT_REVEALED` only).
    pub guesses: Option<Vec<GuessView>>,
    /// Game totals (`ROUND_SUMMARY` only).
    pub scores: Option<Vec<ScoreEntry>>,
    /// Current round scores (`ROUND_SUMMARY` only).
    pub round_scores: Option<Vec<RoundScoreEntry>>,
    /// Best and worst understanders (`ROUND_SUMMARY` only).
    pub badges: Option<BadgesView>,
    /// Drinking penalties (`ROUND_SUMMARY` in gui mode only).
    pub gui_counts: Option<Vec<GuiCountView>>,
}

/// Room-level fields of a snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomSummary {
    pub code: String,
    pub state: RoomPhase,
    pub current_round: u32,
    pub asker_player_id: Option<Uuid>,
    pub current_guess_rank: Option<u8>,
    pub gui_mode: bool,
    pub verified: bool,
    /// Code to hand to the verification channel.
    pub verify_code: String,
    pub premium: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub is_host: bool,
    /// RFC 3339 timestamp of the last presence refresh.
    pub last_seen: String,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            is_host: player.is_host,
            last_seen: format_system_time(player.last_seen),
        }
    }
}

/// Resolved theme. Person-rank themes list the targeted players as items.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThemeView {
    pub id: String,
    pub title: String,
    pub emoji: String,
    pub category: ThemeCategory,
    pub access: ThemeAccess,
    pub is_person_rank: bool,
    pub items: Vec<ItemView>,
}

/// A rankable entry with its display data.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemView {
    pub id: String,
    /// Missing for players who left the room.
    pub label: Option<String>,
    pub emoji: Option<String>,
}

/// Round fields of a snapshot, with the ranking masked.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoundView {
    pub round_no: u32,
    pub theme_id: String,
    pub asker_player_id: Option<Uuid>,
    pub target_player_ids: Vec<Uuid>,
    /// One slot per rank; hidden ranks are `null`. Absent until the ranking is submitted.
    pub ranking: Option<Vec<Option<ItemView>>>,
    /// Id at the hint rank, once disclosed.
    pub middle_revealed_value: Option<String>,
    pub rank_sequence: Vec<u8>,
    pub hint_rank: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GuessView {
    pub player_id: Uuid,
    pub guess_top1: String,
    pub correct: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScoreEntry {
    pub player_id: Uuid,
    pub total: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoundScoreEntry {
    pub player_id: Uuid,
    pub correct: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BadgesView {
    pub best: Vec<Uuid>,
    pub worst: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GuiCountView {
    pub player_id: Uuid,
    pub count: u32,
}
