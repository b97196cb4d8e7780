pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{GuessEntity, RoomEntity};
use crate::dao::storage::StorageResult;

pub use self::memory::MemoryRoomStore;

/// Abstraction over the persistence layer for rooms and the guess ledger.
///
/// Room writes are conditional on the version the caller read, so two racing transitions on the
/// same room can never both commit.
pub trait RoomStore: Send + Sync {
    /// Insert a new room. Returns `false` when the code is already taken.
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Load a room by its code.
    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Replace a room if its stored version still equals `expected_version`.
    ///
    /// Returns `false` when another writer got there first.
    fn replace_room(
        &self,
        room: RoomEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Refresh a player's presence without bumping the room version.
    fn mark_player_seen(
        &self,
        code: String,
        player_id: Uuid,
        seen_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Find the unverified room holding `verify_code`.
    fn find_room_by_verify_code(
        &self,
        verify_code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Insert or overwrite a guess keyed by (room, round, player, rank) and bump the room version.
    ///
    /// The guess is only recorded while its room is open for guesses on that round and rank and
    /// the guesser is a player other than the asker. The guess is stored before the version moves,
    /// so a poller holding the new version always sees it. Returns the new version, or `None`
    /// when the room no longer accepts the guess.
    fn record_guess(
        &self,
        guess: GuessEntity,
        updated_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<u64>>>;
    /// Guesses of a room, optionally restricted to one round, oldest first.
    fn list_guesses(
        &self,
        code: String,
        round_no: Option<u32>,
    ) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>>;
    /// Check that the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
