use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, doc},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoGuessDocument, MongoRoomDocument, doc_code, version_to_i64},
};
use crate::{
    dao::{
        models::{GuessEntity, RoomEntity},
        room_store::RoomStore,
        storage::StorageResult,
    },
    state::state_machine::RoomPhase,
};

const ROOM_COLLECTION_NAME: &str = "rooms";
const GUESS_COLLECTION_NAME: &str = "guesses";
const DUPLICATE_KEY: i32 = 11000;

/// Room store persisting rooms as single documents and guesses in a keyed ledger collection.
#[derive(Clone)]
pub struct MongoRoomStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRoomStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let rooms = self.rooms().await;
        let verify_index = IndexModel::builder()
            .keys(doc! { "verification.code": 1, "verification.verified": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("room_verify_code_idx".to_owned()))
                    .build(),
            )
            .build();
        rooms
            .create_index(verify_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ROOM_COLLECTION_NAME,
                index: "verification.code,verification.verified",
                source,
            })?;

        let guesses = self.guesses().await;
        let guess_key = IndexModel::builder()
            .keys(doc! { "room_code": 1, "round_no": 1, "player_id": 1, "guess_rank": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("guess_key_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        guesses
            .create_index(guess_key)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GUESS_COLLECTION_NAME,
                index: "room_code,round_no,player_id,guess_rank",
                source,
            })?;

        Ok(())
    }

    async fn rooms(&self) -> Collection<MongoRoomDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoRoomDocument>(ROOM_COLLECTION_NAME)
    }

    async fn guesses(&self) -> Collection<MongoGuessDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoGuessDocument>(GUESS_COLLECTION_NAME)
    }

    async fn insert_room(&self, room: RoomEntity) -> MongoResult<bool> {
        let code = room.code.clone();
        let document: MongoRoomDocument = room.into();
        match self.rooms().await.insert_one(&document).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::InsertRoom { code, source }),
        }
    }

    async fn find_room(&self, code: String) -> MongoResult<Option<RoomEntity>> {
        let document = self
            .rooms()
            .await
            .find_one(doc_code(&code))
            .await
            .map_err(|source| MongoDaoError::LoadRoom {
                code: code.clone(),
                source,
            })?;

        document.map(RoomEntity::try_from).transpose()
    }

    async fn replace_room(&self, room: RoomEntity, expected_version: u64) -> MongoResult<bool> {
        let code = room.code.clone();
        let document: MongoRoomDocument = room.into();
        let result = self
            .rooms()
            .await
            .replace_one(
                doc! { "_id": &code, "version": version_to_i64(expected_version) },
                &document,
            )
            .await
            .map_err(|source| MongoDaoError::ReplaceRoom {
                code: code.clone(),
                source,
            })?;

        Ok(result.matched_count == 1)
    }

    /// Refresh one player's `last_seen` in place, leaving the version and every other field alone.
    async fn mark_player_seen(
        &self,
        code: String,
        player_id: Uuid,
        seen_at: SystemTime,
    ) -> MongoResult<()> {
        let result = self
            .rooms()
            .await
            .update_one(
                doc! { "_id": &code, "players.id": player_id.to_string() },
                doc! { "$set": { "players.$.last_seen": DateTime::from_system_time(seen_at) } },
            )
            .await
            .map_err(|source| MongoDaoError::MarkSeen {
                code: code.clone(),
                source,
            })?;
        if result.matched_count == 0 {
            debug!(room = %code, player = %player_id, "presence refresh matched no player");
        }
        Ok(())
    }

    async fn find_room_by_verify_code(&self, verify_code: String) -> MongoResult<Option<RoomEntity>> {
        let document = self
            .rooms()
            .await
            .find_one(doc! {
                "verification.code": &verify_code,
                "verification.verified": false,
            })
            .await
            .map_err(|source| MongoDaoError::FindByVerifyCode { source })?;

        document.map(RoomEntity::try_from).transpose()
    }

    /// Check the room is open for `guess`, write the ledger row, then bump the room version.
    ///
    /// Without a multi-document transaction the row lands first, so a poll between the two
    /// writes sees the fresh tally under the old version and refreshes again on the bump.
    async fn record_guess(
        &self,
        guess: GuessEntity,
        updated_at: SystemTime,
    ) -> MongoResult<Option<u64>> {
        let code = guess.room_code.clone();
        let open_filter = doc! {
            "_id": &code,
            "phase": RoomPhase::GuessingOpen.to_string(),
            "current_round": i64::from(guess.round_no),
            "current_guess_rank": i32::from(guess.guess_rank),
            "players.id": guess.player_id.to_string(),
        };
        let rooms = self.rooms().await;
        let Some(room) = rooms
            .find_one(open_filter)
            .await
            .map_err(|source| MongoDaoError::LoadRoom {
                code: code.clone(),
                source,
            })?
        else {
            return Ok(None);
        };
        if !RoomEntity::try_from(room)?.accepts_guess(&guess) {
            return Ok(None);
        }

        let document: MongoGuessDocument = guess.into();
        self.guesses()
            .await
            .replace_one(document.key_filter(), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGuess {
                code: code.clone(),
                source,
            })?;

        let bumped = rooms
            .find_one_and_update(
                doc_code(&code),
                doc! {
                    "$inc": { "version": 1_i64 },
                    "$set": { "updated_at": DateTime::from_system_time(updated_at) },
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::ReplaceRoom {
                code: code.clone(),
                source,
            })?;

        bumped
            .map(RoomEntity::try_from)
            .transpose()
            .map(|room| room.map(|room| room.version))
    }

    async fn list_guesses(&self, code: String, round_no: Option<u32>) -> MongoResult<Vec<GuessEntity>> {
        let mut filter = doc! { "room_code": &code };
        if let Some(round_no) = round_no {
            filter.insert("round_no", i64::from(round_no));
        }

        let documents: Vec<MongoGuessDocument> = self
            .guesses()
            .await
            .find(filter)
            .sort(doc! { "submitted_at": 1, "player_id": 1 })
            .await
            .map_err(|source| MongoDaoError::ListGuesses {
                code: code.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGuesses {
                code: code.clone(),
                source,
            })?;

        documents.into_iter().map(GuessEntity::try_from).collect()
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

impl RoomStore for MongoRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_room(room).await.map_err(Into::into) })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_room(code).await.map_err(Into::into) })
    }

    fn replace_room(
        &self,
        room: RoomEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_room(room, expected_version)
                .await
                .map_err(Into::into)
        })
    }

    fn mark_player_seen(
        &self,
        code: String,
        player_id: Uuid,
        seen_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .mark_player_seen(code, player_id, seen_at)
                .await
                .map_err(Into::into)
        })
    }

    fn find_room_by_verify_code(
        &self,
        verify_code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_room_by_verify_code(verify_code)
                .await
                .map_err(Into::into)
        })
    }

    fn record_guess(
        &self,
        guess: GuessEntity,
        updated_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<u64>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .record_guess(guess, updated_at)
                .await
                .map_err(Into::into)
        })
    }

    fn list_guesses(
        &self,
        code: String,
        round_no: Option<u32>,
    ) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_guesses(code, round_no).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
