use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{
    GuessEntity, GuiCountEntity, PlayerEntity, RoomEntity, RoundEntity, VerificationEntity,
};
use crate::state::state_machine::{Caller, RoomPhase};

/// Participant of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Identifier handed to the client.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Whether the player created the room.
    pub is_host: bool,
    /// Join time.
    pub joined_at: SystemTime,
    /// Last presence refresh.
    pub last_seen: SystemTime,
}

/// Per-round data, created when a theme is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    /// Round number, starting at 1.
    pub round_no: u32,
    /// Selected theme.
    pub theme_id: String,
    /// Whether players are ranked instead of catalog items.
    pub is_person_rank: bool,
    /// Ranked players, in selection order (person-rank only).
    pub target_player_ids: Vec<Uuid>,
    /// Asker at selection time.
    pub asker_player_id: Option<Uuid>,
    /// Secret ranking, most preferred first. Written once.
    pub ranking: Option<Vec<String>>,
    /// Ranks guessed, in order.
    pub rank_sequence: Vec<u8>,
    /// Id at the hint rank.
    pub middle_revealed_value: Option<String>,
    /// Penalty counts, computed at summary time in gui mode.
    pub gui_counts: Option<IndexMap<Uuid, u32>>,
}

impl Round {
    /// Fresh round for `theme_id`.
    pub fn new(round_no: u32, theme_id: String, is_person_rank: bool) -> Self {
        Self {
            round_no,
            theme_id,
            is_person_rank,
            target_player_ids: Vec::new(),
            asker_player_id: None,
            ranking: None,
            rank_sequence: Vec::new(),
            middle_revealed_value: None,
            gui_counts: None,
        }
    }

    /// Clear everything chosen after the theme.
    pub fn reset_selection(&mut self) {
        self.target_player_ids.clear();
        self.asker_player_id = None;
        self.ranking = None;
        self.rank_sequence.clear();
        self.middle_revealed_value = None;
        self.is_person_rank = false;
        self.gui_counts = None;
    }

    /// Id ranked at `rank` (1-based), once the ranking is submitted.
    pub fn answer_at(&self, rank: u8) -> Option<&str> {
        let index = usize::from(rank).checked_sub(1)?;
        self.ranking
            .as_ref()
            .and_then(|ranking| ranking.get(index))
            .map(String::as_str)
    }

    /// Last rank of the guess sequence.
    pub fn last_sequence_rank(&self) -> Option<u8> {
        self.rank_sequence.last().copied()
    }

    /// Rank following `rank` in the guess sequence.
    pub fn next_sequence_rank(&self, rank: u8) -> Option<u8> {
        let position = self.rank_sequence.iter().position(|r| *r == rank)?;
        self.rank_sequence.get(position + 1).copied()
    }
}

/// Room aggregate: players and rounds are owned by the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Public room code.
    pub code: String,
    /// Current phase.
    pub phase: RoomPhase,
    /// Round pointer; 0 before the game starts.
    pub current_round: u32,
    /// Asker of the current round.
    pub asker_player_id: Option<Uuid>,
    /// Rank currently open for guessing.
    pub current_guess_rank: Option<u8>,
    /// Drinking-penalty presentation flag.
    pub gui_mode: bool,
    /// Whether the verification channel confirmed the room.
    pub verified: bool,
    /// One-time code exchanged with the verification channel.
    pub verify_code: String,
    /// Premium entitlement.
    pub premium: bool,
    /// Roster in join order.
    pub players: Vec<Player>,
    /// Rounds in play order.
    pub rounds: Vec<Round>,
    /// Optimistic concurrency stamp.
    pub version: u64,
    /// Creation time.
    pub created_at: SystemTime,
    /// Last state-affecting write.
    pub updated_at: SystemTime,
}

impl Room {
    /// Fresh lobby hosted by `host`.
    pub fn new(code: String, verify_code: String, host: Player, now: SystemTime) -> Self {
        Self {
            code,
            phase: RoomPhase::WaitingPlayers,
            current_round: 0,
            asker_player_id: None,
            current_guess_rank: None,
            gui_mode: false,
            verified: false,
            verify_code,
            premium: false,
            players: vec![host],
            rounds: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a member.
    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    /// Whether `id` belongs to the room.
    pub fn is_member(&self, id: Uuid) -> bool {
        self.player(id).is_some()
    }

    /// Role facts of a member, or `None` for strangers.
    pub fn caller(&self, id: Uuid) -> Option<Caller> {
        let player = self.player(id)?;
        Some(Caller {
            is_host: player.is_host,
            is_asker: self.asker_player_id == Some(id),
        })
    }

    /// Round record of the current round.
    pub fn current_round_record(&self) -> Option<&Round> {
        self.round(self.current_round)
    }

    /// Mutable round record of the current round.
    pub fn current_round_record_mut(&mut self) -> Option<&mut Round> {
        let current = self.current_round;
        self.rounds.iter_mut().find(|round| round.round_no == current)
    }

    /// Round record by number.
    pub fn round(&self, round_no: u32) -> Option<&Round> {
        self.rounds.iter().find(|round| round.round_no == round_no)
    }

    /// Insert `round`, replacing any record with the same number.
    pub fn upsert_round(&mut self, round: Round) {
        match self
            .rounds
            .iter_mut()
            .find(|existing| existing.round_no == round.round_no)
        {
            Some(existing) => *existing = round,
            None => self.rounds.push(round),
        }
    }

    /// Remove a member. Returns whether anyone was removed.
    pub fn remove_player(&mut self, id: Uuid) -> bool {
        let before = self.players.len();
        self.players.retain(|player| player.id != id);
        self.players.len() != before
    }

    /// Record a write that did not go through the state machine.
    pub fn bump_version(&mut self, now: SystemTime) {
        self.version += 1;
        self.updated_at = now;
    }
}

/// One guess ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guess {
    /// Owning room.
    pub room_code: String,
    /// Round the guess belongs to.
    pub round_no: u32,
    /// Guessing player.
    pub player_id: Uuid,
    /// Rank being guessed.
    pub guess_rank: u8,
    /// Id the player believes sits at `guess_rank`.
    pub guess_top1: String,
    /// Last submission time.
    pub submitted_at: SystemTime,
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            is_host: value.is_host,
            joined_at: value.joined_at,
            last_seen: value.last_seen,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            name: value.name,
            is_host: value.is_host,
            joined_at: value.joined_at,
            last_seen: value.last_seen,
        }
    }
}

impl From<RoundEntity> for Round {
    fn from(value: RoundEntity) -> Self {
        Self {
            round_no: value.round_no,
            theme_id: value.theme_id,
            is_person_rank: value.is_person_rank,
            target_player_ids: value.target_player_ids,
            asker_player_id: value.asker_player_id,
            ranking: value.ranking,
            rank_sequence: value.rank_sequence,
            middle_revealed_value: value.middle_revealed_value,
            gui_counts: value.gui_counts.map(|counts| {
                counts
                    .into_iter()
                    .map(|entry| (entry.player_id, entry.count))
                    .collect()
            }),
        }
    }
}

impl From<Round> for RoundEntity {
    fn from(value: Round) -> Self {
        Self {
            round_no: value.round_no,
            theme_id: value.theme_id,
            is_person_rank: value.is_person_rank,
            target_player_ids: value.target_player_ids,
            asker_player_id: value.asker_player_id,
            ranking: value.ranking,
            rank_sequence: value.rank_sequence,
            middle_revealed_value: value.middle_revealed_value,
            gui_counts: value.gui_counts.map(|counts| {
                counts
                    .into_iter()
                    .map(|(player_id, count)| GuiCountEntity { player_id, count })
                    .collect()
            }),
        }
    }
}

impl From<RoomEntity> for Room {
    fn from(value: RoomEntity) -> Self {
        Self {
            code: value.code,
            phase: value.phase,
            current_round: value.current_round,
            asker_player_id: value.asker_player_id,
            current_guess_rank: value.current_guess_rank,
            gui_mode: value.gui_mode,
            verified: value.verification.verified,
            verify_code: value.verification.code,
            premium: value.premium,
            players: value.players.into_iter().map(Into::into).collect(),
            rounds: value.rounds.into_iter().map(Into::into).collect(),
            version: value.version,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<Room> for RoomEntity {
    fn from(value: Room) -> Self {
        Self {
            code: value.code,
            phase: value.phase,
            current_round: value.current_round,
            asker_player_id: value.asker_player_id,
            current_guess_rank: value.current_guess_rank,
            gui_mode: value.gui_mode,
            verification: VerificationEntity {
                code: value.verify_code,
                verified: value.verified,
            },
            premium: value.premium,
            players: value.players.into_iter().map(Into::into).collect(),
            rounds: value.rounds.into_iter().map(Into::into).collect(),
            version: value.version,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<GuessEntity> for Guess {
    fn from(value: GuessEntity) -> Self {
        Self {
            room_code: value.room_code,
            round_no: value.round_no,
            player_id: value.player_id,
            guess_rank: value.guess_rank,
            guess_top1: value.guess_top1,
            submitted_at: value.submitted_at,
        }
    }
}

impl From<Guess> for GuessEntity {
    fn from(value: Guess) -> Self {
        Self {
            room_code: value.room_code,
            round_no: value.round_no,
            player_id: value.player_id,
            guess_rank: value.guess_rank,
            guess_top1: value.guess_top1,
            submitted_at: value.submitted_at,
        }
    }
}
