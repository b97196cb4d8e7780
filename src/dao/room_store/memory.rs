use std::{sync::Arc, time::SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{GuessEntity, GuessKey, RoomEntity},
    room_store::RoomStore,
    storage::StorageResult,
};

/// In-process store backed by [`DashMap`]s. Data lives as long as the process.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    rooms: DashMap<String, RoomEntity>,
    guesses: DashMap<GuessKey, GuessEntity>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryInner {
    fn insert_room(&self, room: RoomEntity) -> bool {
        match self.rooms.entry(room.code.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(room);
                true
            }
        }
    }

    fn replace_room(&self, room: RoomEntity, expected_version: u64) -> bool {
        match self.rooms.get_mut(&room.code) {
            Some(mut current) if current.version == expected_version => {
                *current = room;
                true
            }
            _ => false,
        }
    }

    fn mark_player_seen(&self, code: &str, player_id: Uuid, seen_at: SystemTime) {
        let Some(mut room) = self.rooms.get_mut(code) else {
            return;
        };
        if let Some(player) = room.players.iter_mut().find(|p| p.id == player_id) {
            player.last_seen = seen_at;
        }
    }

    fn record_guess(&self, guess: GuessEntity, updated_at: SystemTime) -> Option<u64> {
        // The room entry stays locked until the version moves, so no reader sees it ahead of the row.
        let mut room = self.rooms.get_mut(&guess.room_code)?;
        if !room.accepts_guess(&guess) {
            return None;
        }
        self.guesses.insert(guess.key(), guess);
        room.version += 1;
        room.updated_at = updated_at;
        Some(room.version)
    }

    fn find_room_by_verify_code(&self, verify_code: &str) -> Option<RoomEntity> {
        self.rooms
            .iter()
            .find(|room| !room.verification.verified && room.verification.code == verify_code)
            .map(|room| room.value().clone())
    }

    fn list_guesses(&self, code: &str, round_no: Option<u32>) -> Vec<GuessEntity> {
        let mut guesses: Vec<GuessEntity> = self
            .guesses
            .iter()
            .filter(|guess| {
                guess.room_code == code && round_no.is_none_or(|round| guess.round_no == round)
            })
            .map(|guess| guess.value().clone())
            .collect();
        guesses.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        guesses
    }
}

impl RoomStore for MemoryRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.insert_room(room)) })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.rooms.get(&code).map(|room| room.value().clone())) })
    }

    fn replace_room(
        &self,
        room: RoomEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.replace_room(room, expected_version)) })
    }

    fn mark_player_seen(
        &self,
        code: String,
        player_id: Uuid,
        seen_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.mark_player_seen(&code, player_id, seen_at);
            Ok(())
        })
    }

    fn find_room_by_verify_code(
        &self,
        verify_code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.find_room_by_verify_code(&verify_code)) })
    }

    fn record_guess(
        &self,
        guess: GuessEntity,
        updated_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<u64>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.record_guess(guess, updated_at)) })
    }

    fn list_guesses(
        &self,
        code: String,
        round_no: Option<u32>,
    ) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.list_guesses(&code, round_no)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
