pub mod ranking;
pub mod reveal;
pub mod room;
pub mod scoring;
mod sse;
pub mod state_machine;
pub mod transitions;

use std::{sync::Arc, time::SystemTime};

use tokio::sync::{RwLock, watch};
use tracing::debug;
use uuid::Uuid;

use crate::{
    catalog::ThemeCatalog,
    config::AppConfig,
    dao::room_store::RoomStore,
    error::ServiceError,
    state::{
        room::{Guess, Room},
        state_machine::{RoomAction, RoomPhase},
        transitions::{ActionEnv, ActionPayload, apply_action, transition_for},
    },
};

pub use self::sse::{RoomHubs, SseHub};
pub use self::state_machine::{ApplyError, Plan, PlanError};

pub type SharedState = Arc<AppState>;

const ROOM_EVENT_CAPACITY: usize = 16;

/// Phase and version of a room right after a committed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Phase after the write.
    pub phase: RoomPhase,
    /// Version after the write.
    pub version: u64,
}

/// Central application state storing the storage handle, the catalog and the SSE hubs.
pub struct AppState {
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    hubs: RoomHubs,
    catalog: ThemeCatalog,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            room_store: RwLock::new(None),
            hubs: RoomHubs::new(ROOM_EVENT_CAPACITY),
            catalog: ThemeCatalog::with_extra(config.extra_themes().to_vec()),
            config,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        let guard = self.room_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current room store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_room_store(&self) -> Result<Arc<dyn RoomStore>, ServiceError> {
        self.room_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new room store implementation and leave degraded mode.
    pub async fn install_room_store(&self, store: Arc<dyn RoomStore>) {
        {
            let mut guard = self.room_store.write().await;
            *guard = Some(store);
        }
        self.set_degraded(false);
    }

    /// Remove the current room store and enter degraded mode.
    pub async fn clear_room_store(&self) {
        {
            let mut guard = self.room_store.write().await;
            guard.take();
        }
        self.set_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Theme registry.
    pub fn catalog(&self) -> &ThemeCatalog {
        &self.catalog
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Per-room broadcast hubs feeding the SSE streams.
    pub fn hubs(&self) -> &RoomHubs {
        &self.hubs
    }

    /// Update and broadcast the degraded flag when the value changes.
    ///
    /// The installed store is kept; the supervisor flags it while reconnecting.
    pub fn set_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Load room `code` or fail with [`ServiceError::NotFound`].
    pub async fn load_room(&self, code: &str) -> Result<Room, ServiceError> {
        let store = self.require_room_store().await?;
        fetch_room(store.as_ref(), code).await
    }

    /// Run `action` against the latest persisted value of room `code`.
    ///
    /// The room is re-read and the action re-validated whenever a concurrent write slips in
    /// between the read and the conditional write. Guesses skip the conditional write and go
    /// through [`RoomStore::record_guess`], which stores the row before moving the version.
    pub async fn run_transition(
        &self,
        code: &str,
        caller: Uuid,
        action: RoomAction,
        payload: &ActionPayload,
    ) -> Result<CommitOutcome, ServiceError> {
        let store = self.require_room_store().await?;
        let transition = transition_for(action);
        let mut retries = CommitRetries::new(self.config.commit_attempts());

        loop {
            let mut room = fetch_room(store.as_ref(), code).await?;
            if !retries.admit(&room) {
                break;
            }
            let expected = room.version;

            let round_guesses: Vec<Guess> = if transition.reads_ledger {
                store
                    .list_guesses(code.to_owned(), Some(room.current_round))
                    .await?
                    .into_iter()
                    .map(Guess::from)
                    .collect()
            } else {
                Vec::new()
            };

            let now = SystemTime::now();
            let env = ActionEnv {
                catalog: &self.catalog,
                premium_unlocked: self.config.premium_unlocked(),
                now,
            };
            let guess = apply_action(&mut room, action, caller, payload, env, &round_guesses)?;

            if let Some(guess) = guess {
                if let Some(version) = store.record_guess(guess.into(), now).await? {
                    return Ok(CommitOutcome {
                        phase: room.phase,
                        version,
                    });
                }
                debug!(room = %code, attempt = retries.attempts, "guess no longer accepted; re-reading");
                continue;
            }

            let outcome = CommitOutcome {
                phase: room.phase,
                version: room.version,
            };
            if store.replace_room(room.into(), expected).await? {
                return Ok(outcome);
            }

            debug!(room = %code, action = ?action, attempt = retries.attempts, "room changed concurrently; re-reading");
        }

        Err(ServiceError::Conflict(
            "the room changed while the action was applied; refresh and retry".into(),
        ))
    }

    /// Apply a non-state-machine write to room `code` with the same optimistic retry loop.
    ///
    /// `mutate` runs against a fresh copy on every attempt; the version bump is done here.
    pub async fn update_room<T, F>(
        &self,
        code: &str,
        mut mutate: F,
    ) -> Result<(T, CommitOutcome), ServiceError>
    where
        T: Send,
        F: FnMut(&mut Room) -> Result<T, ServiceError> + Send,
    {
        let store = self.require_room_store().await?;
        let mut retries = CommitRetries::new(self.config.commit_attempts());

        loop {
            let mut room = fetch_room(store.as_ref(), code).await?;
            if !retries.admit(&room) {
                break;
            }
            let expected = room.version;

            let value = mutate(&mut room)?;
            room.bump_version(SystemTime::now());
            let outcome = CommitOutcome {
                phase: room.phase,
                version: room.version,
            };

            if store.replace_room(room.into(), expected).await? {
                return Ok((value, outcome));
            }

            debug!(room = %code, attempt = retries.attempts, "room changed concurrently; re-reading");
        }

        Err(ServiceError::Conflict(
            "the room changed while it was being updated; refresh and retry".into(),
        ))
    }
}

/// Upper bound on re-reads that do not count against the configured attempts.
const MAX_FREE_RETRIES: u32 = 32;

/// Phase, round and open rank of a room.
type Cursor = (RoomPhase, u32, Option<u8>);

/// Re-read budget of one optimistic write.
///
/// Losing to a write that left the room on the same phase, round and rank (a guess, a join, a
/// presence refresh) costs nothing; the caller's checks still hold on the fresh copy. Only
/// re-reads that find the room moved on spend one of the configured attempts.
struct CommitRetries {
    attempts: u32,
    max_attempts: u32,
    free: u32,
    previous: Option<Cursor>,
}

impl CommitRetries {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            free: 0,
            previous: None,
        }
    }

    /// Account for a fresh read of `room`. Returns `false` once the budget is spent.
    fn admit(&mut self, room: &Room) -> bool {
        let cursor = (room.phase, room.current_round, room.current_guess_rank);
        let unchanged = self.previous.replace(cursor) == Some(cursor);
        if unchanged && self.free < MAX_FREE_RETRIES {
            self.free += 1;
            return true;
        }
        self.attempts += 1;
        self.attempts <= self.max_attempts
    }
}

async fn fetch_room(store: &dyn RoomStore, code: &str) -> Result<Room, ServiceError> {
    store
        .find_room(code.to_owned())
        .await?
        .map(Room::from)
        .ok_or_else(|| ServiceError::NotFound("room not found".into()))
}
