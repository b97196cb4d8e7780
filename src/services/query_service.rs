//! Masked room snapshots served to polling clients.

use std::time::SystemTime;

use tracing::warn;
use uuid::Uuid;

use crate::{
    catalog::{ItemSource, ThemeCatalog},
    dto::{
        snapshot::{
            BadgesView, GuessView, GuiCountView, ItemView, PlayerSummary, RoomSnapshot,
            RoomSummary, RoundScoreEntry, RoundView, ScoreEntry, StateQuery, StateResponse,
            ThemeView, Unchanged,
        },
        validation::normalize_room_code,
    },
    error::ServiceError,
    state::{
        SharedState,
        ranking::hint_rank,
        reveal::{RevealContext, mask_ranking, revealed_ranks},
        room::{Guess, Room},
        scoring,
        state_machine::RoomPhase,
    },
};

/// Snapshot of room `code`, or an unchanged marker when `query.ver` is current.
pub async fn room_state(
    state: &SharedState,
    code: &str,
    query: StateQuery,
) -> Result<StateResponse, ServiceError> {
    let code = normalize_room_code(code);
    let store = state.require_room_store().await?;
    let room: Room = store
        .find_room(code.clone())
        .await?
        .map(Room::from)
        .ok_or_else(|| ServiceError::NotFound("room not found".into()))?;

    if query.wants_seen_update() {
        if let Some(player_id) = query.player_id.filter(|id| room.is_member(*id)) {
            if let Err(err) = store
                .mark_player_seen(code.clone(), player_id, SystemTime::now())
                .await
            {
                warn!(room = %code, player = %player_id, error = %err, "failed to refresh presence");
            }
        }
    }

    let version = room.version.to_string();
    if query.ver.as_deref().map(str::trim) == Some(version.as_str()) {
        return Ok(StateResponse::Unchanged(Unchanged { changed: false }));
    }

    let guesses: Vec<Guess> = if room.current_round == 0 {
        Vec::new()
    } else {
        let round_filter = match room.phase {
            RoomPhase::RoundSummary => None,
            _ => Some(room.current_round),
        };
        store
            .list_guesses(code.clone(), round_filter)
            .await?
            .into_iter()
            .map(Guess::from)
            .collect()
    };

    let snapshot = build_snapshot(&room, state.catalog(), &guesses, query.player_id);
    Ok(StateResponse::Full(Box::new(snapshot)))
}

/// Assemble the masked view of `room`.
///
/// `guesses` must hold every guess of the current round, and of every earlier round when the
/// room is in `ROUND_SUMMARY`.
pub fn build_snapshot(
    room: &Room,
    catalog: &ThemeCatalog,
    guesses: &[Guess],
    viewer: Option<Uuid>,
) -> RoomSnapshot {
    let round = room.current_round_record();
    let theme = round.and_then(|round| catalog.get(&round.theme_id));
    let source = round
        .zip(theme)
        .map(|(round, theme)| ItemSource::for_theme(theme, &room.players, &round.target_player_ids));
    let item_view = |id: &str| ItemView {
        id: id.to_owned(),
        label: source.and_then(|source| source.label(id)),
        emoji: source.and_then(|source| source.emoji(id)),
    };

    let theme_view = theme.map(|theme| ThemeView {
        id: theme.id.clone(),
        title: theme.title.clone(),
        emoji: theme.emoji.clone(),
        category: theme.category,
        access: theme.access,
        is_person_rank: theme.is_person_rank(),
        items: source
            .map(|source| source.eligible_ids())
            .unwrap_or_default()
            .iter()
            .map(|id| item_view(id.as_str()))
            .collect(),
    });

    let round_view = round.map(|round| {
        let item_count = match &round.ranking {
            Some(ranking) => ranking.len(),
            None => source.map_or(0, |source| source.len()),
        };
        let hint = hint_rank(item_count, round.is_person_rank);
        let revealed = revealed_ranks(&RevealContext {
            phase: room.phase,
            item_count,
            hint_rank: hint,
            sequence: &round.rank_sequence,
            current_guess_rank: room.current_guess_rank,
        });

        RoundView {
            round_no: round.round_no,
            theme_id: round.theme_id.clone(),
            asker_player_id: round.asker_player_id,
            target_player_ids: round.target_player_ids.clone(),
            ranking: round.ranking.as_ref().map(|ranking| {
                mask_ranking(ranking, &revealed)
                    .into_iter()
                    .map(|slot| slot.map(&item_view))
                    .collect()
            }),
            middle_revealed_value: round
                .middle_revealed_value
                .clone()
                .filter(|_| room.phase.discloses_ranking()),
            rank_sequence: round.rank_sequence.clone(),
            hint_rank: hint,
        }
    });

    let active: Vec<&Guess> = match room.current_guess_rank {
        Some(rank) => guesses
            .iter()
            .filter(|guess| guess.round_no == room.current_round && guess.guess_rank == rank)
            .collect(),
        None => Vec::new(),
    };
    let my_guess = viewer.and_then(|viewer| {
        active
            .iter()
            .find(|guess| guess.player_id == viewer)
            .map(|guess| guess.guess_top1.clone())
    });

    let mut snapshot = RoomSnapshot {
        version: room.version,
        room: RoomSummary {
            code: room.code.clone(),
            state: room.phase,
            current_round: room.current_round,
            asker_player_id: room.asker_player_id,
            current_guess_rank: room.current_guess_rank,
            gui_mode: room.gui_mode,
            verified: room.verified,
            verify_code: room.verify_code.clone(),
            premium: room.premium,
        },
        players: room.players.iter().map(PlayerSummary::from).collect(),
        theme: theme_view,
        round: round_view,
        guess_count: active.len(),
        my_guess,
        correct_answer: None,
        guesses: None,
        scores: None,
        round_scores: None,
        badges: None,
        gui_counts: None,
    };

    let Some(round) = round else {
        return snapshot;
    };

    match room.phase {
        RoomPhase::ResultRevealed => {
            snapshot.correct_answer = room
                .current_guess_rank
                .and_then(|rank| round.answer_at(rank))
                .map(str::to_owned);
            snapshot.guesses = Some(
                active
                    .iter()
                    .map(|guess| GuessView {
                        player_id: guess.player_id,
                        guess_top1: guess.guess_top1.clone(),
                        correct: scoring::is_correct(round, guess),
                    })
                    .collect(),
            );
        }
        RoomPhase::RoundSummary => {
            let roster: Vec<Uuid> = room.players.iter().map(|player| player.id).collect();
            let board = scoring::aggregate(&roster, &room.rounds, guesses, room.current_round);
            let badges = scoring::badges(&board.round_scores, round.asker_player_id);

            snapshot.scores = Some(
                board
                    .totals
                    .iter()
                    .map(|(player_id, total)| ScoreEntry {
                        player_id: *player_id,
                        total: *total,
                    })
                    .collect(),
            );
            snapshot.round_scores = Some(
                board
                    .round_scores
                    .iter()
                    .map(|(player_id, correct)| RoundScoreEntry {
                        player_id: *player_id,
                        correct: *correct,
                    })
                    .collect(),
            );
            snapshot.badges = Some(BadgesView {
                best: badges.best,
                worst: badges.worst,
            });
            snapshot.gui_counts = round.gui_counts.as_ref().map(|counts| {
                counts
                    .iter()
                    .map(|(player_id, count)| GuiCountView {
                        player_id: *player_id,
                        count: *count,
                    })
                    .collect()
            });
        }
        _ => {}
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;
    use tokio::time::sleep;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{GuessEntity, RoomEntity},
            room_store::{MemoryRoomStore, RoomStore},
            storage::StorageResult,
        },
        dto::{
            action::ActionRequest,
            room::{CreateRoomRequest, JoinRoomRequest},
        },
        services::{action_service, room_service},
        state::{AppState, state_machine::RoomAction},
    };

    const LIFE: [&str; 7] = [
        "freedom", "money", "health", "family", "work", "friends", "hobby",
    ];

    /// Memory store that takes its time on room reads and guess writes.
    #[derive(Clone, Default)]
    struct LaggyStore {
        inner: MemoryRoomStore,
        read_delay: Duration,
        guess_delay: Duration,
    }

    impl RoomStore for LaggyStore {
        fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.insert_room(room)
        }

        fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
            let lookup = self.inner.find_room(code);
            let delay = self.read_delay;
            Box::pin(async move {
                sleep(delay).await;
                lookup.await
            })
        }

        fn replace_room(
            &self,
            room: RoomEntity,
            expected_version: u64,
        ) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.replace_room(room, expected_version)
        }

        fn mark_player_seen(
            &self,
            code: String,
            player_id: Uuid,
            seen_at: SystemTime,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.mark_player_seen(code, player_id, seen_at)
        }

        fn find_room_by_verify_code(
            &self,
            verify_code: String,
        ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
            self.inner.find_room_by_verify_code(verify_code)
        }

        fn record_guess(
            &self,
            guess: GuessEntity,
            updated_at: SystemTime,
        ) -> BoxFuture<'static, StorageResult<Option<u64>>> {
            let write = self.inner.record_guess(guess, updated_at);
            let delay = self.guess_delay;
            Box::pin(async move {
                sleep(delay).await;
                write.await
            })
        }

        fn list_guesses(
            &self,
            code: String,
            round_no: Option<u32>,
        ) -> BoxFuture<'static, StorageResult<Vec<GuessEntity>>> {
            self.inner.list_guesses(code, round_no)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    struct Game {
        state: SharedState,
        code: String,
        host: Uuid,
        guests: Vec<Uuid>,
    }

    fn request(action: RoomAction, player_id: Uuid) -> ActionRequest {
        ActionRequest {
            action,
            player_id,
            theme_id: None,
            asker_player_id: None,
            gui_mode: None,
            target_player_ids: None,
            ranking: None,
            guess_top1: None,
            kick_player_id: None,
        }
    }

    impl Game {
        async fn new(guests: usize) -> Self {
            Self::with_store(guests, Arc::new(MemoryRoomStore::new())).await
        }

        async fn with_store(guests: usize, store: Arc<dyn RoomStore>) -> Self {
            let state = AppState::new(AppConfig::default());
            state.install_room_store(store).await;
            let ticket = room_service::create_room(
                &state,
                CreateRoomRequest {
                    host_name: "Host".into(),
                },
            )
            .await
            .unwrap();

            let mut ids = Vec::new();
            for index in 0..guests {
                let joined = room_service::join_room(
                    &state,
                    JoinRoomRequest {
                        room_code: ticket.room_code.clone(),
                        name: format!("Guest {index}"),
                    },
                )
                .await
                .unwrap();
                ids.push(joined.player_id);
            }

            Self {
                state,
                code: ticket.room_code,
                host: ticket.player_id,
                guests: ids,
            }
        }

        async fn act(&self, request: ActionRequest) -> Result<(), ServiceError> {
            action_service::apply_action(&self.state, &self.code, request)
                .await
                .map(|_| ())
        }

        async fn host(&self, action: RoomAction) {
            self.act(request(action, self.host)).await.unwrap();
        }

        async fn try_guess(&self, player: Uuid, id: &str) -> Result<(), ServiceError> {
            let mut guess = request(RoomAction::SubmitGuess, player);
            guess.guess_top1 = Some(id.into());
            self.act(guess).await
        }

        async fn guess(&self, player: Uuid, id: &str) {
            self.try_guess(player, id).await.unwrap();
        }

        /// Play a `life` round with `asker` up to the first open rank.
        async fn open_guessing(&self, asker: Uuid) {
            self.host(RoomAction::StartGame).await;
            let mut select = request(RoomAction::SelectTheme, self.host);
            select.theme_id = Some("life".into());
            self.act(select).await.unwrap();
            let mut pick = request(RoomAction::SelectAsker, self.host);
            pick.asker_player_id = Some(asker);
            self.act(pick).await.unwrap();
            let mut submit = request(RoomAction::SubmitRanking, asker);
            submit.ranking = Some(LIFE.iter().map(|id| id.to_string()).collect());
            self.act(submit).await.unwrap();
            self.host(RoomAction::OpenGuessing).await;
        }

        async fn version(&self) -> u64 {
            self.state.load_room(&self.code).await.unwrap().version
        }

        async fn poll(&self, ver: u64) -> StateResponse {
            let query = StateQuery {
                ver: Some(ver.to_string()),
                ..Default::default()
            };
            room_state(&self.state, &self.code, query).await.unwrap()
        }

        /// Everyone but `asker`, host first.
        fn guessers(&self, asker: Uuid) -> Vec<Uuid> {
            std::iter::once(self.host)
                .chain(self.guests.iter().copied().filter(|id| *id != asker))
                .collect()
        }

        async fn snapshot(&self, viewer: Uuid) -> RoomSnapshot {
            let query = StateQuery {
                player_id: Some(viewer),
                ..Default::default()
            };
            match room_state(&self.state, &self.code, query).await.unwrap() {
                StateResponse::Full(snapshot) => *snapshot,
                StateResponse::Unchanged(_) => panic!("expected a full snapshot"),
            }
        }
    }

    fn revealed_ids(snapshot: &RoomSnapshot) -> Vec<Option<String>> {
        snapshot
            .round
            .as_ref()
            .and_then(|round| round.ranking.as_ref())
            .unwrap()
            .iter()
            .map(|slot| slot.as_ref().map(|item| item.id.clone()))
            .collect()
    }

    #[tokio::test]
    async fn full_round_of_an_ordinary_theme() {
        let game = Game::new(3).await;
        let asker = game.guests[0];
        let (b, c) = (game.guests[1], game.guests[2]);

        game.host(RoomAction::StartGame).await;
        let mut select = request(RoomAction::SelectTheme, game.host);
        select.theme_id = Some("life".into());
        game.act(select).await.unwrap();
        let mut pick = request(RoomAction::SelectAsker, game.host);
        pick.asker_player_id = Some(asker);
        pick.gui_mode = Some(true);
        game.act(pick).await.unwrap();

        let mut submit = request(RoomAction::SubmitRanking, asker);
        submit.ranking = Some(LIFE.iter().map(|id| id.to_string()).collect());
        game.act(submit).await.unwrap();

        let snapshot = game.snapshot(b).await;
        assert_eq!(snapshot.room.state, RoomPhase::RevealMiddle);
        let round = snapshot.round.as_ref().unwrap();
        assert_eq!(round.middle_revealed_value.as_deref(), Some("family"));
        assert_eq!(round.hint_rank, Some(4));
        assert_eq!(round.rank_sequence, vec![1, 2, 3, 5, 6]);
        assert_eq!(
            revealed_ids(&snapshot),
            vec![None, None, None, Some("family".into()), None, None, None]
        );
        assert_eq!(snapshot.theme.as_ref().unwrap().items.len(), 7);

        game.host(RoomAction::OpenGuessing).await;
        game.guess(game.host, "freedom").await;
        game.guess(b, "money").await;
        game.guess(c, "freedom").await;

        let snapshot = game.snapshot(b).await;
        assert_eq!(snapshot.room.current_guess_rank, Some(1));
        assert_eq!(snapshot.guess_count, 3);
        assert_eq!(snapshot.my_guess.as_deref(), Some("money"));
        assert!(snapshot.guesses.is_none());
        assert!(snapshot.correct_answer.is_none());

        game.host(RoomAction::CloseGuess).await;
        game.host(RoomAction::RevealResult).await;
        let snapshot = game.snapshot(b).await;
        assert_eq!(snapshot.correct_answer.as_deref(), Some("freedom"));
        let flagged: Vec<(Uuid, bool)> = snapshot
            .guesses
            .unwrap()
            .iter()
            .map(|guess| (guess.player_id, guess.correct))
            .collect();
        assert_eq!(flagged.len(), 3);
        assert!(flagged.contains(&(game.host, true)));
        assert!(flagged.contains(&(b, false)));
        assert!(flagged.contains(&(c, true)));

        for (rank, answer) in [(2, "money"), (3, "health"), (5, "work"), (6, "friends")] {
            game.host(RoomAction::NextRank).await;
            assert_eq!(game.snapshot(b).await.room.current_guess_rank, Some(rank));
            game.guess(c, answer).await;
            game.host(RoomAction::CloseGuess).await;
            game.host(RoomAction::RevealResult).await;
        }

        let last = game.snapshot(b).await;
        assert_eq!(revealed_ids(&last).last().cloned().flatten().as_deref(), Some("hobby"));

        game.host(RoomAction::ShowSummary).await;
        let summary = game.snapshot(b).await;
        assert_eq!(summary.room.state, RoomPhase::RoundSummary);
        assert_eq!(
            revealed_ids(&summary),
            LIFE.iter().map(|id| Some(id.to_string())).collect::<Vec<_>>()
        );

        let totals = summary.scores.unwrap();
        let total_of = |player: Uuid| {
            totals
                .iter()
                .find(|entry| entry.player_id == player)
                .map(|entry| entry.total)
        };
        assert_eq!(total_of(c), Some(5));
        assert_eq!(total_of(game.host), Some(1));
        assert_eq!(total_of(b), Some(0));
        assert_eq!(total_of(asker), Some(0));

        let badges = summary.badges.unwrap();
        assert_eq!(badges.best, vec![c]);
        assert_eq!(badges.worst, vec![b]);

        let penalties = summary.gui_counts.unwrap();
        let penalty_of = |player: Uuid| {
            penalties
                .iter()
                .find(|entry| entry.player_id == player)
                .map(|entry| entry.count)
        };
        // rank 1: b wrong; ranks 2..6: only c guessed, correctly
        assert_eq!(penalty_of(b), Some(1));
        assert_eq!(penalty_of(asker), Some(4));
    }

    #[tokio::test]
    async fn matching_version_short_circuits_but_marks_presence() {
        let game = Game::new(1).await;
        let guest = game.guests[0];
        let before = game.state.load_room(&game.code).await.unwrap();

        let query = StateQuery {
            player_id: Some(guest),
            ver: Some(before.version.to_string()),
            update_seen: Some("1".into()),
        };
        let response = room_state(&game.state, &game.code, query).await.unwrap();
        assert!(matches!(response, StateResponse::Unchanged(Unchanged { changed: false })));

        let after = game.state.load_room(&game.code).await.unwrap();
        assert_eq!(after.version, before.version);
        assert!(after.player(guest).unwrap().last_seen >= before.player(guest).unwrap().last_seen);

        let stale = StateQuery {
            ver: Some("0".into()),
            ..Default::default()
        };
        assert!(matches!(
            room_state(&game.state, &game.code, stale).await.unwrap(),
            StateResponse::Full(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_during_a_slow_guess_write_does_not_miss_the_guess() {
        let store = LaggyStore {
            guess_delay: Duration::from_millis(50),
            ..LaggyStore::default()
        };
        let game = Arc::new(Game::with_store(2, Arc::new(store)).await);
        let (asker, guesser) = (game.guests[0], game.guests[1]);
        game.open_guessing(asker).await;
        let before = game.version().await;

        let submit = {
            let game = Arc::clone(&game);
            tokio::spawn(async move { game.try_guess(guesser, "money").await })
        };
        sleep(Duration::from_millis(10)).await;
        assert!(matches!(game.poll(before).await, StateResponse::Unchanged(_)));

        submit.await.unwrap().unwrap();
        let StateResponse::Full(snapshot) = game.poll(before).await else {
            panic!("expected a full snapshot once the guess landed");
        };
        assert_eq!(snapshot.version, before + 1);
        assert_eq!(snapshot.guess_count, 1);
        assert!(matches!(
            game.poll(snapshot.version).await,
            StateResponse::Unchanged(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_guessers_all_land() {
        let store = LaggyStore {
            read_delay: Duration::from_millis(5),
            ..LaggyStore::default()
        };
        let game = Arc::new(Game::with_store(7, Arc::new(store)).await);
        let asker = game.guests[0];
        game.open_guessing(asker).await;
        let before = game.version().await;

        let guessers = game.guessers(asker);
        assert_eq!(guessers.len(), 7);
        let tasks: Vec<_> = guessers
            .into_iter()
            .map(|player| {
                let game = Arc::clone(&game);
                tokio::spawn(async move { game.try_guess(player, "money").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let snapshot = game.snapshot(game.host).await;
        assert_eq!(snapshot.guess_count, 7);
        assert_eq!(snapshot.version, before + 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn host_closes_while_guesses_stream_in() {
        let store = LaggyStore {
            read_delay: Duration::from_millis(5),
            ..LaggyStore::default()
        };
        let game = Arc::new(Game::with_store(7, Arc::new(store)).await);
        let asker = game.guests[0];
        game.open_guessing(asker).await;

        let guesses: Vec<_> = game
            .guessers(asker)
            .into_iter()
            .map(|player| {
                let game = Arc::clone(&game);
                tokio::spawn(async move { game.try_guess(player, "health").await })
            })
            .collect();
        let close = {
            let game = Arc::clone(&game);
            tokio::spawn(async move { game.act(request(RoomAction::CloseGuess, game.host)).await })
        };

        close.await.unwrap().unwrap();
        let mut accepted = 0;
        for task in guesses {
            match task.await.unwrap() {
                Ok(()) => accepted += 1,
                Err(err) => assert!(matches!(err, ServiceError::InvalidState(_)), "{err}"),
            }
        }

        let store = game.state.room_store().await.unwrap();
        let ledger = store.list_guesses(game.code.clone(), Some(1)).await.unwrap();
        assert_eq!(ledger.len(), accepted);
        let room = game.state.load_room(&game.code).await.unwrap();
        assert_eq!(room.phase, RoomPhase::GuessingClosed);
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let game = Game::new(0).await;
        let err = room_state(&game.state, "QQQQQQ", StateQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn person_rank_items_are_the_targets() {
        let game = Game::new(4).await;
        let asker = game.guests[0];
        let targets = vec![game.guests[1], game.guests[2], game.guests[3]];

        let store = game.state.room_store().await.unwrap();
        let mut room = game.state.load_room(&game.code).await.unwrap();
        let expected = room.version;
        room.premium = true;
        assert!(store.replace_room(room.into(), expected).await.unwrap());

        game.host(RoomAction::StartGame).await;
        let mut select = request(RoomAction::SelectTheme, game.host);
        select.theme_id = Some("pr-kiss".into());
        game.act(select).await.unwrap();
        let mut pick = request(RoomAction::SelectAsker, game.host);
        pick.asker_player_id = Some(asker);
        game.act(pick).await.unwrap();
        let mut choose = request(RoomAction::SelectTargets, asker);
        choose.target_player_ids = Some(targets.clone());
        game.act(choose).await.unwrap();

        let snapshot = game.snapshot(asker).await;
        let theme = snapshot.theme.unwrap();
        assert!(theme.is_person_rank);
        let labels: Vec<Option<String>> = theme.items.iter().map(|item| item.label.clone()).collect();
        assert_eq!(
            labels,
            vec![
                Some("Guest 1".to_string()),
                Some("Guest 2".to_string()),
                Some("Guest 3".to_string())
            ]
        );

        let mut submit = request(RoomAction::SubmitRanking, asker);
        submit.ranking = Some(targets.iter().rev().map(Uuid::to_string).collect());
        game.act(submit).await.unwrap();

        let snapshot = game.snapshot(asker).await;
        assert_eq!(snapshot.room.state, RoomPhase::GuessingOpen);
        let round = snapshot.round.unwrap();
        assert_eq!(round.hint_rank, None);
        assert_eq!(round.rank_sequence, vec![1, 2]);
        assert!(round.middle_revealed_value.is_none());
        assert!(round.ranking.unwrap().iter().all(Option::is_none));
    }

    #[test]
    fn lobby_snapshot_has_no_round() {
        let now = SystemTime::now();
        let host = crate::state::room::Player {
            id: Uuid::new_v4(),
            name: "Host".into(),
            is_host: true,
            joined_at: now,
            last_seen: now,
        };
        let room = Room::new("ABCDEF".into(), "1234".into(), host, now);
        let snapshot = build_snapshot(&room, &ThemeCatalog::default(), &[], None);

        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.players.len(), 1);
        assert!(snapshot.theme.is_none());
        assert!(snapshot.round.is_none());
        assert_eq!(snapshot.guess_count, 0);
        assert!(snapshot.scores.is_none());
    }
}
