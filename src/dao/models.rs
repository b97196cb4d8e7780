use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::state_machine::RoomPhase;

/// Room aggregate as persisted: players and rounds are embedded so a transition is one write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Public room code, primary key.
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
    /// Verification channel state.
    pub verification: VerificationEntity,
    /// Premium entitlement granted by the payment channel.
    pub premium: bool,
    /// Roster in join order.
    pub players: Vec<PlayerEntity>,
    /// One entry per started round.
    pub rounds: Vec<RoundEntity>,
    /// Optimistic concurrency stamp, bumped on every state-affecting write.
    pub version: u64,
    /// Creation time.
    pub created_at: SystemTime,
    /// Last state-affecting write.
    pub updated_at: SystemTime,
}

impl RoomEntity {
    /// Whether `guess` targets the rank currently open in this room and comes from a guesser.
    pub fn accepts_guess(&self, guess: &GuessEntity) -> bool {
        self.phase == RoomPhase::GuessingOpen
            && self.current_round == guess.round_no
            && self.current_guess_rank == Some(guess.guess_rank)
            && self.asker_player_id != Some(guess.player_id)
            && self.players.iter().any(|player| player.id == guess.player_id)
    }
}

/// One-time code exchanged with the verification channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationEntity {
    /// Four digit code shown to the host.
    pub code: String,
    /// Whether the channel confirmed the code.
    pub verified: bool,
}

/// Player stored inside a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Identifier handed to the client.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Whether the player created the room.
    pub is_host: bool,
    /// Join time.
    pub joined_at: SystemTime,
    /// Last poll that asked to refresh presence.
    pub last_seen: SystemTime,
}

/// Round stored inside a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Round number, starting at 1.
    pub round_no: u32,
    /// Selected theme.
    pub theme_id: String,
    /// Whether players are ranked instead of catalog items.
    pub is_person_rank: bool,
    /// Ranked players (person-rank themes only).
    pub target_player_ids: Vec<Uuid>,
    /// Asker at selection time.
    pub asker_player_id: Option<Uuid>,
    /// Secret ranking, most preferred first.
    pub ranking: Option<Vec<String>>,
    /// Ranks guessed in order.
    pub rank_sequence: Vec<u8>,
    /// Id at the hint rank.
    pub middle_revealed_value: Option<String>,
    /// Penalty counts computed at summary time.
    pub gui_counts: Option<Vec<GuiCountEntity>>,
}

/// Penalty count of one player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuiCountEntity {
    /// Penalised player.
    pub player_id: Uuid,
    /// Number of penalties.
    pub count: u32,
}

/// Guess ledger row, unique per (room, round, player, rank).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessEntity {
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

impl GuessEntity {
    /// Unique ledger key.
    pub fn key(&self) -> GuessKey {
        GuessKey {
            room_code: self.room_code.clone(),
            round_no: self.round_no,
            player_id: self.player_id,
            guess_rank: self.guess_rank,
        }
    }
}

/// Unique key of a guess ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuessKey {
    /// Owning room.
    pub room_code: String,
    /// Round number.
    pub round_no: u32,
    /// Guessing player.
    pub player_id: Uuid,
    /// Rank being guessed.
    pub guess_rank: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_room(guesser: Uuid, asker: Uuid) -> RoomEntity {
        let player = |id: Uuid| PlayerEntity {
            id,
            name: "P".into(),
            is_host: false,
            joined_at: SystemTime::UNIX_EPOCH,
            last_seen: SystemTime::UNIX_EPOCH,
        };
        RoomEntity {
            code: "ABCDEF".into(),
            phase: RoomPhase::GuessingOpen,
            current_round: 2,
            asker_player_id: Some(asker),
            current_guess_rank: Some(3),
            gui_mode: false,
            verification: VerificationEntity {
                code: "1234".into(),
                verified: false,
            },
            premium: false,
            players: vec![player(guesser), player(asker)],
            rounds: Vec::new(),
            version: 9,
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    fn guess(player_id: Uuid, round_no: u32, guess_rank: u8) -> GuessEntity {
        GuessEntity {
            room_code: "ABCDEF".into(),
            round_no,
            player_id,
            guess_rank,
            guess_top1: "money".into(),
            submitted_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn guesses_only_land_on_the_open_rank() {
        let (guesser, asker) = (Uuid::new_v4(), Uuid::new_v4());
        let mut room = open_room(guesser, asker);

        assert!(room.accepts_guess(&guess(guesser, 2, 3)));
        assert!(!room.accepts_guess(&guess(guesser, 2, 5)));
        assert!(!room.accepts_guess(&guess(guesser, 1, 3)));
        assert!(!room.accepts_guess(&guess(asker, 2, 3)));
        assert!(!room.accepts_guess(&guess(Uuid::new_v4(), 2, 3)));

        room.phase = RoomPhase::GuessingClosed;
        assert!(!room.accepts_guess(&guess(guesser, 2, 3)));
    }
}
