//! Transition table of the room state machine.
//!
//! Each [`RoomAction`] has exactly one row naming the role allowed to issue it, the phases it may
//! be issued from, the phases it may lead to and the side effect that validates the payload and
//! mutates the room.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    catalog::{ItemSource, ThemeAccess, ThemeCatalog},
    error::ServiceError,
    services::sse_events::broadcast_room_version,
    state::{
        CommitOutcome, SharedState,
        ranking::{MAX_TARGETS, MIN_TARGETS, compute_sequence, hint_rank},
        room::{Guess, Room, Round},
        scoring,
        state_machine::{PhaseGuard, PhaseTarget, Role, RoomAction, RoomPhase, RoomStateMachine},
    },
};

/// Action-specific fields of an action request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPayload {
    /// Theme to play (`select-theme`).
    pub theme_id: Option<String>,
    /// Player to designate (`select-asker`).
    pub asker_player_id: Option<Uuid>,
    /// Drinking-penalty mode (`select-asker`).
    pub gui_mode: Option<bool>,
    /// Players to rank (`select-targets`).
    pub target_player_ids: Option<Vec<Uuid>>,
    /// Ordered ids, most preferred first (`submit-ranking`).
    pub ranking: Option<Vec<String>>,
    /// Guessed id for the open rank (`submit-guess`).
    pub guess_top1: Option<String>,
    /// Player to remove (`kick-player`).
    pub kick_player_id: Option<Uuid>,
}

/// Read-only inputs of a transition that do not live on the room.
#[derive(Debug, Clone, Copy)]
pub struct ActionEnv<'a> {
    /// Theme registry.
    pub catalog: &'a ThemeCatalog,
    /// Debug switch granting the premium entitlement to every room.
    pub premium_unlocked: bool,
    /// Wall clock of the request.
    pub now: SystemTime,
}

/// Mutable view handed to a side effect.
pub struct ActionContext<'a> {
    room: &'a mut Room,
    caller: Uuid,
    payload: &'a ActionPayload,
    env: ActionEnv<'a>,
    round_guesses: &'a [Guess],
    ledger: Option<Guess>,
}

/// Side effect of a transition, returning the phase the room moves to.
pub type Effect = fn(&mut ActionContext<'_>) -> Result<RoomPhase, ServiceError>;

/// One row of the transition table.
pub struct Transition {
    /// Action the row describes.
    pub action: RoomAction,
    /// Role allowed to issue the action.
    pub role: Role,
    /// Phases the action may be issued from.
    pub from: PhaseGuard,
    /// Phases the action may lead to.
    pub to: PhaseTarget,
    /// Whether the side effect needs the current round's guesses.
    pub reads_ledger: bool,
    /// Validation and mutation.
    pub effect: Effect,
}

use RoomPhase::*;

/// Indexed by `RoomAction as usize`.
pub static TRANSITIONS: [Transition; 14] = [
    Transition {
        action: RoomAction::StartGame,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[WaitingPlayers]),
        to: PhaseTarget::OneOf(&[SelectTheme]),
        reads_ledger: false,
        effect: start_game,
    },
    Transition {
        action: RoomAction::SelectTheme,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[SelectTheme]),
        to: PhaseTarget::OneOf(&[SelectAsker]),
        reads_ledger: false,
        effect: select_theme,
    },
    Transition {
        action: RoomAction::SelectAsker,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[SelectAsker]),
        to: PhaseTarget::OneOf(&[SelectTargets, AskerRanking]),
        reads_ledger: false,
        effect: select_asker,
    },
    Transition {
        action: RoomAction::SelectTargets,
        role: Role::Asker,
        from: PhaseGuard::OneOf(&[SelectTargets]),
        to: PhaseTarget::OneOf(&[AskerRanking]),
        reads_ledger: false,
        effect: select_targets,
    },
    Transition {
        action: RoomAction::SubmitRanking,
        role: Role::Asker,
        from: PhaseGuard::OneOf(&[AskerRanking]),
        to: PhaseTarget::OneOf(&[RevealMiddle, GuessingOpen]),
        reads_ledger: false,
        effect: submit_ranking,
    },
    Transition {
        action: RoomAction::OpenGuessing,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[RevealMiddle]),
        to: PhaseTarget::OneOf(&[GuessingOpen]),
        reads_ledger: false,
        effect: open_guessing,
    },
    Transition {
        action: RoomAction::SubmitGuess,
        role: Role::Guesser,
        from: PhaseGuard::OneOf(&[GuessingOpen]),
        to: PhaseTarget::Unchanged,
        reads_ledger: false,
        effect: submit_guess,
    },
    Transition {
        action: RoomAction::CloseGuess,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[GuessingOpen]),
        to: PhaseTarget::OneOf(&[GuessingClosed]),
        reads_ledger: false,
        effect: close_guess,
    },
    Transition {
        action: RoomAction::RevealResult,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[GuessingClosed]),
        to: PhaseTarget::OneOf(&[ResultRevealed]),
        reads_ledger: false,
        effect: reveal_result,
    },
    Transition {
        action: RoomAction::NextRank,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[ResultRevealed]),
        to: PhaseTarget::OneOf(&[GuessingOpen]),
        reads_ledger: false,
        effect: next_rank,
    },
    Transition {
        action: RoomAction::ShowSummary,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[ResultRevealed]),
        to: PhaseTarget::OneOf(&[RoundSummary]),
        reads_ledger: true,
        effect: show_summary,
    },
    Transition {
        action: RoomAction::NextRound,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[RoundSummary]),
        to: PhaseTarget::OneOf(&[SelectTheme]),
        reads_ledger: false,
        effect: next_round,
    },
    Transition {
        action: RoomAction::BackToTheme,
        role: Role::Host,
        from: PhaseGuard::OneOf(&[SelectAsker, SelectTargets, AskerRanking, RevealMiddle]),
        to: PhaseTarget::OneOf(&[SelectTheme]),
        reads_ledger: false,
        effect: back_to_theme,
    },
    Transition {
        action: RoomAction::KickPlayer,
        role: Role::Host,
        from: PhaseGuard::Any,
        to: PhaseTarget::Unchanged,
        reads_ledger: false,
        effect: kick_player,
    },
];

/// Table row of `action`.
pub fn transition_for(action: RoomAction) -> &'static Transition {
    &TRANSITIONS[action as usize]
}

/// Apply `action` to `room` on behalf of `caller`.
///
/// On success the room carries the new phase, a bumped version and `updated_at = env.now`, and
/// the guess to record (for `submit-guess`) is returned. On failure the room is left untouched.
pub fn apply_action(
    room: &mut Room,
    action: RoomAction,
    caller: Uuid,
    payload: &ActionPayload,
    env: ActionEnv<'_>,
    round_guesses: &[Guess],
) -> Result<Option<Guess>, ServiceError> {
    let role = room
        .caller(caller)
        .ok_or_else(|| ServiceError::Forbidden("not a player of this room".into()))?;
    let transition = transition_for(action);
    let mut machine = RoomStateMachine::new(room.phase, room.version);
    let plan = machine.plan(transition, &role)?;

    let mut draft = room.clone();
    let mut ctx = ActionContext {
        room: &mut draft,
        caller,
        payload,
        env,
        round_guesses,
        ledger: None,
    };
    let next = (transition.effect)(&mut ctx)?;
    let guess = ctx.ledger.take();

    machine.apply(&plan, next)?;
    draft.phase = machine.phase();
    draft.version = machine.version();
    draft.updated_at = env.now;
    *room = draft;
    Ok(guess)
}

/// Commit `action` on room `code`, then notify the room's SSE subscribers.
pub async fn run_transition_with_broadcast(
    state: &SharedState,
    code: &str,
    caller: Uuid,
    action: RoomAction,
    payload: &ActionPayload,
) -> Result<CommitOutcome, ServiceError> {
    let outcome = state.run_transition(code, caller, action, payload).await?;
    broadcast_room_version(state, code, outcome);
    Ok(outcome)
}

fn required<'p, T>(value: Option<&'p T>, field: &str) -> Result<&'p T, ServiceError> {
    value.ok_or_else(|| ServiceError::InvalidInput(format!("`{field}` is required")))
}

fn required_text<'p>(value: Option<&'p String>, field: &str) -> Result<&'p str, ServiceError> {
    match value.map(|text| text.trim()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ServiceError::InvalidInput(format!("`{field}` is required"))),
    }
}

fn current_round(room: &Room) -> Result<&Round, ServiceError> {
    room.current_round_record()
        .ok_or_else(|| ServiceError::InvalidState("no theme has been selected for this round".into()))
}

fn current_round_mut(room: &mut Room) -> Result<&mut Round, ServiceError> {
    room.current_round_record_mut()
        .ok_or_else(|| ServiceError::InvalidState("no theme has been selected for this round".into()))
}

fn open_rank(room: &Room) -> Result<u8, ServiceError> {
    room.current_guess_rank
        .ok_or_else(|| ServiceError::InvalidState("no rank is open for guessing".into()))
}

/// Item source of the current round, resolved through the catalog.
fn item_source<'r>(room: &'r Room, catalog: &'r ThemeCatalog) -> Result<ItemSource<'r>, ServiceError> {
    let round = current_round(room)?;
    let theme = catalog.get(&round.theme_id).ok_or_else(|| {
        ServiceError::InvalidState(format!("theme `{}` is no longer available", round.theme_id))
    })?;
    Ok(ItemSource::for_theme(
        theme,
        &room.players,
        &round.target_player_ids,
    ))
}

fn start_game(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    ctx.room.current_round = 1;
    ctx.room.asker_player_id = None;
    ctx.room.current_guess_rank = None;
    Ok(SelectTheme)
}

fn select_theme(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    let theme_id = required_text(ctx.payload.theme_id.as_ref(), "theme_id")?;
    let theme = ctx
        .env
        .catalog
        .get(theme_id)
        .ok_or_else(|| ServiceError::InvalidInput(format!("unknown theme `{theme_id}`")))?;

    match theme.access {
        ThemeAccess::Free => {}
        ThemeAccess::Verified if !ctx.room.verified => {
            return Err(ServiceError::Forbidden(
                "this theme requires the room to be verified".into(),
            ));
        }
        ThemeAccess::Premium if !(ctx.room.premium || ctx.env.premium_unlocked) => {
            return Err(ServiceError::Forbidden(
                "this theme requires the premium unlock".into(),
            ));
        }
        ThemeAccess::Verified | ThemeAccess::Premium => {}
    }

    let round = Round::new(
        ctx.room.current_round,
        theme.id.clone(),
        theme.is_person_rank(),
    );
    ctx.room.upsert_round(round);
    Ok(SelectAsker)
}

fn select_asker(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    let asker = *required(ctx.payload.asker_player_id.as_ref(), "asker_player_id")?;
    if !ctx.room.is_member(asker) {
        return Err(ServiceError::InvalidInput(
            "the asker must be a player of this room".into(),
        ));
    }

    let round = current_round_mut(ctx.room)?;
    round.asker_player_id = Some(asker);
    let person_rank = round.is_person_rank;

    ctx.room.asker_player_id = Some(asker);
    ctx.room.gui_mode = ctx.payload.gui_mode.unwrap_or(false);
    Ok(if person_rank { SelectTargets } else { AskerRanking })
}

fn select_targets(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    let targets = required(ctx.payload.target_player_ids.as_ref(), "target_player_ids")?;
    if !(MIN_TARGETS..=MAX_TARGETS).contains(&targets.len()) {
        return Err(ServiceError::InvalidInput(format!(
            "select between {MIN_TARGETS} and {MAX_TARGETS} players"
        )));
    }
    for (index, target) in targets.iter().enumerate() {
        if targets[..index].contains(target) {
            return Err(ServiceError::InvalidInput(
                "target players must be distinct".into(),
            ));
        }
        if !ctx.room.is_member(*target) {
            return Err(ServiceError::InvalidInput(
                "every target must be a player of this room".into(),
            ));
        }
    }

    let round = current_round_mut(ctx.room)?;
    if !round.is_person_rank {
        return Err(ServiceError::InvalidState(
            "the selected theme does not rank players".into(),
        ));
    }
    round.target_player_ids = targets.clone();
    round.rank_sequence = compute_sequence(targets.len(), true);
    Ok(AskerRanking)
}

fn submit_ranking(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    let ranking = required(ctx.payload.ranking.as_ref(), "ranking")?;

    let person_rank = {
        let round = current_round(ctx.room)?;
        if round.ranking.is_some() {
            return Err(ServiceError::InvalidState(
                "the ranking for this round was already submitted".into(),
            ));
        }
        let source = item_source(ctx.room, ctx.env.catalog)?;
        validate_permutation(ranking, &source)?;
        round.is_person_rank
    };

    let item_count = ranking.len();
    let hint = hint_rank(item_count, person_rank);
    let sequence = compute_sequence(item_count, person_rank);
    let first = sequence.first().copied().ok_or_else(|| {
        ServiceError::InvalidInput("the ranking is too short to play".into())
    })?;
    let middle = hint.and_then(|rank| ranking.get(usize::from(rank) - 1).cloned());

    let round = current_round_mut(ctx.room)?;
    round.ranking = Some(ranking.clone());
    round.rank_sequence = sequence;
    round.middle_revealed_value = middle;

    if hint.is_none() {
        ctx.room.current_guess_rank = Some(first);
        Ok(GuessingOpen)
    } else {
        Ok(RevealMiddle)
    }
}

fn validate_permutation(ranking: &[String], source: &ItemSource<'_>) -> Result<(), ServiceError> {
    if source.is_empty() {
        return Err(ServiceError::InvalidState(
            "no players have been selected to rank".into(),
        ));
    }
    if ranking.len() != source.len() {
        return Err(ServiceError::InvalidInput(format!(
            "the ranking must contain exactly {} entries",
            source.len()
        )));
    }
    for (index, id) in ranking.iter().enumerate() {
        if !source.contains(id) {
            return Err(ServiceError::InvalidInput(format!(
                "`{id}` cannot be ranked in this round"
            )));
        }
        if ranking[..index].contains(id) {
            return Err(ServiceError::InvalidInput(format!(
                "`{id}` appears more than once in the ranking"
            )));
        }
    }
    Ok(())
}

fn open_guessing(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    let first = current_round(ctx.room)?
        .rank_sequence
        .first()
        .copied()
        .ok_or_else(|| ServiceError::InvalidState("the round has no ranks to guess".into()))?;
    ctx.room.current_guess_rank = Some(first);
    Ok(GuessingOpen)
}

fn submit_guess(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    let guess_top1 = required_text(ctx.payload.guess_top1.as_ref(), "guess_top1")?;
    let rank = open_rank(ctx.room)?;
    let source = item_source(ctx.room, ctx.env.catalog)?;
    if !source.contains(guess_top1) {
        return Err(ServiceError::InvalidInput(format!(
            "`{guess_top1}` is not part of this round"
        )));
    }

    ctx.ledger = Some(Guess {
        room_code: ctx.room.code.clone(),
        round_no: ctx.room.current_round,
        player_id: ctx.caller,
        guess_rank: rank,
        guess_top1: guess_top1.to_owned(),
        submitted_at: ctx.env.now,
    });
    Ok(ctx.room.phase)
}

fn close_guess(_ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    Ok(GuessingClosed)
}

fn reveal_result(_ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    Ok(ResultRevealed)
}

fn next_rank(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    let current = open_rank(ctx.room)?;
    let next = current_round(ctx.room)?
        .next_sequence_rank(current)
        .ok_or_else(|| {
            ServiceError::InvalidState(
                "every rank has been guessed; show the summary instead".into(),
            )
        })?;
    ctx.room.current_guess_rank = Some(next);
    Ok(GuessingOpen)
}

fn show_summary(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    let current = open_rank(ctx.room)?;
    let gui_mode = ctx.room.gui_mode;
    let round_guesses = ctx.round_guesses;

    let round = current_round_mut(ctx.room)?;
    if round.last_sequence_rank() != Some(current) {
        return Err(ServiceError::InvalidState(
            "ranks remain to be guessed; use next-rank".into(),
        ));
    }
    if gui_mode {
        round.gui_counts = Some(scoring::gui_counts(round, round_guesses));
    }
    Ok(RoundSummary)
}

fn next_round(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    ctx.room.current_round += 1;
    ctx.room.asker_player_id = None;
    ctx.room.current_guess_rank = None;
    ctx.room.gui_mode = false;
    Ok(SelectTheme)
}

fn back_to_theme(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    if let Some(round) = ctx.room.current_round_record_mut() {
        round.reset_selection();
    }
    ctx.room.asker_player_id = None;
    ctx.room.current_guess_rank = None;
    Ok(SelectTheme)
}

fn kick_player(ctx: &mut ActionContext<'_>) -> Result<RoomPhase, ServiceError> {
    let target = *required(ctx.payload.kick_player_id.as_ref(), "kick_player_id")?;
    if target == ctx.caller {
        return Err(ServiceError::InvalidInput("you cannot kick yourself".into()));
    }
    if !ctx.room.remove_player(target) {
        return Err(ServiceError::InvalidInput(
            "that player is not in this room".into(),
        ));
    }
    Ok(ctx.room.phase)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::room::Player;

    struct Table {
        room: Room,
        catalog: ThemeCatalog,
        premium_unlocked: bool,
        guesses: Vec<Guess>,
        clock: u64,
    }

    fn player(name: &str, is_host: bool) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: name.into(),
            is_host,
            joined_at: SystemTime::UNIX_EPOCH,
            last_seen: SystemTime::UNIX_EPOCH,
        }
    }

    impl Table {
        fn new(guests: usize) -> Self {
            let host = player("Host", true);
            let mut room = Room::new("ABCDEF".into(), "1234".into(), host, SystemTime::UNIX_EPOCH);
            for index in 0..guests {
                room.players.push(player(&format!("Guest {index}"), false));
            }
            Self {
                room,
                catalog: ThemeCatalog::default(),
                premium_unlocked: false,
                guesses: Vec::new(),
                clock: 0,
            }
        }

        fn host(&self) -> Uuid {
            self.room.players[0].id
        }

        fn guest(&self, index: usize) -> Uuid {
            self.room.players[index + 1].id
        }

        fn act(
            &mut self,
            action: RoomAction,
            caller: Uuid,
            payload: ActionPayload,
        ) -> Result<RoomPhase, ServiceError> {
            self.clock += 1;
            let env = ActionEnv {
                catalog: &self.catalog,
                premium_unlocked: self.premium_unlocked,
                now: SystemTime::UNIX_EPOCH + Duration::from_secs(self.clock),
            };
            let round_guesses: Vec<Guess> = self
                .guesses
                .iter()
                .filter(|guess| guess.round_no == self.room.current_round)
                .cloned()
                .collect();
            let guess = apply_action(&mut self.room, action, caller, &payload, env, &round_guesses)?;
            if let Some(guess) = guess {
                self.guesses.retain(|existing| {
                    !(existing.round_no == guess.round_no
                        && existing.player_id == guess.player_id
                        && existing.guess_rank == guess.guess_rank)
                });
                self.guesses.push(guess);
            }
            Ok(self.room.phase)
        }

        fn host_act(&mut self, action: RoomAction) -> Result<RoomPhase, ServiceError> {
            let host = self.host();
            self.act(action, host, ActionPayload::default())
        }

        fn to_ranking(&mut self, theme: &str, asker: Uuid) {
            self.host_act(RoomAction::StartGame).unwrap();
            let host = self.host();
            self.act(
                RoomAction::SelectTheme,
                host,
                ActionPayload {
                    theme_id: Some(theme.into()),
                    ..Default::default()
                },
            )
            .unwrap();
            self.act(
                RoomAction::SelectAsker,
                host,
                ActionPayload {
                    asker_player_id: Some(asker),
                    gui_mode: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        }

        fn ordinary_ids(&self, theme: &str) -> Vec<String> {
            self.catalog
                .get(theme)
                .unwrap()
                .items()
                .iter()
                .map(|item| item.id.clone())
                .collect()
        }
    }

    fn ranking(ids: Vec<String>) -> ActionPayload {
        ActionPayload {
            ranking: Some(ids),
            ..Default::default()
        }
    }

    fn guess(id: &str) -> ActionPayload {
        ActionPayload {
            guess_top1: Some(id.into()),
            ..Default::default()
        }
    }

    #[test]
    fn table_is_indexed_by_action() {
        for action in RoomAction::ALL {
            assert_eq!(transition_for(action).action, action);
        }
    }

    #[test]
    fn strangers_are_rejected() {
        let mut table = Table::new(2);
        let err = table
            .act(RoomAction::StartGame, Uuid::new_v4(), ActionPayload::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[test]
    fn failed_action_leaves_room_untouched() {
        let mut table = Table::new(2);
        table.host_act(RoomAction::StartGame).unwrap();
        let before = table.room.clone();

        let host = table.host();
        let err = table
            .act(
                RoomAction::SelectTheme,
                host,
                ActionPayload {
                    theme_id: Some("no-such-theme".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(table.room, before);

        assert!(table.host_act(RoomAction::CloseGuess).is_err());
        assert_eq!(table.room, before);
    }

    #[test]
    fn every_commit_bumps_version_and_timestamp() {
        let mut table = Table::new(2);
        table.host_act(RoomAction::StartGame).unwrap();
        assert_eq!(table.room.version, 1);
        assert_eq!(table.room.current_round, 1);
        assert_eq!(
            table.room.updated_at,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1)
        );
    }

    #[test]
    fn theme_access_gates() {
        let mut table = Table::new(2);
        table.host_act(RoomAction::StartGame).unwrap();
        let host = table.host();
        let select = |theme: &str| ActionPayload {
            theme_id: Some(theme.into()),
            ..Default::default()
        };

        let err = table
            .act(RoomAction::SelectTheme, host, select("fetish-female"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = table
            .act(RoomAction::SelectTheme, host, select("pr-type"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        table.room.verified = true;
        assert_eq!(
            table
                .act(RoomAction::SelectTheme, host, select("fetish-female"))
                .unwrap(),
            SelectAsker
        );

        table.host_act(RoomAction::BackToTheme).unwrap();
        table.premium_unlocked = true;
        assert_eq!(
            table
                .act(RoomAction::SelectTheme, host, select("pr-type"))
                .unwrap(),
            SelectAsker
        );
        assert!(table.room.current_round_record().unwrap().is_person_rank);
    }

    #[test]
    fn asker_must_be_a_member() {
        let mut table = Table::new(2);
        table.host_act(RoomAction::StartGame).unwrap();
        let host = table.host();
        table
            .act(
                RoomAction::SelectTheme,
                host,
                ActionPayload {
                    theme_id: Some("love".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let err = table
            .act(
                RoomAction::SelectAsker,
                host,
                ActionPayload {
                    asker_player_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(
            table
                .host_act(RoomAction::SelectAsker)
                .is_err_and(|err| matches!(err, ServiceError::InvalidInput(_)))
        );
    }

    #[test]
    fn ordinary_ranking_must_be_a_permutation() {
        let mut table = Table::new(3);
        let asker = table.guest(0);
        table.to_ranking("love", asker);
        assert_eq!(table.room.phase, AskerRanking);
        assert!(table.room.gui_mode);

        let ids = table.ordinary_ids("love");
        let mut duplicate = ids.clone();
        duplicate[6] = duplicate[0].clone();
        let mut foreign = ids.clone();
        foreign[6] = "beer".into();

        for bad in [ids[..6].to_vec(), duplicate, foreign] {
            let err = table.act(RoomAction::SubmitRanking, asker, ranking(bad)).unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }

        let host = table.host();
        let err = table
            .act(RoomAction::SubmitRanking, host, ranking(ids.clone()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        assert_eq!(
            table
                .act(RoomAction::SubmitRanking, asker, ranking(ids.clone()))
                .unwrap(),
            RevealMiddle
        );
        let round = table.room.current_round_record().unwrap();
        assert_eq!(round.middle_revealed_value.as_deref(), Some(ids[3].as_str()));
        assert_eq!(round.rank_sequence, vec![1, 2, 3, 5, 6]);

        let err = table
            .act(RoomAction::SubmitRanking, asker, ranking(ids))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[test]
    fn person_rank_targets_and_small_round_skip_hint() {
        let mut table = Table::new(4);
        table.premium_unlocked = true;
        let asker = table.guest(0);
        table.to_ranking("pr-kiss", asker);
        assert_eq!(table.room.phase, SelectTargets);

        let host = table.host();
        let targets = |ids: Vec<Uuid>| ActionPayload {
            target_player_ids: Some(ids),
            ..Default::default()
        };
        let err = table
            .act(RoomAction::SelectTargets, host, targets(vec![host]))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let too_few = vec![table.guest(1), table.guest(2)];
        assert!(table.act(RoomAction::SelectTargets, asker, targets(too_few)).is_err());
        let repeated = vec![table.guest(1), table.guest(1), table.guest(2)];
        assert!(table.act(RoomAction::SelectTargets, asker, targets(repeated)).is_err());
        let stranger = vec![table.guest(1), table.guest(2), Uuid::new_v4()];
        assert!(table.act(RoomAction::SelectTargets, asker, targets(stranger)).is_err());

        let chosen = vec![table.guest(1), table.guest(2), table.guest(3), host];
        table
            .act(RoomAction::SelectTargets, asker, targets(chosen.clone()))
            .unwrap();
        assert_eq!(
            table.room.current_round_record().unwrap().rank_sequence,
            vec![1, 2, 3]
        );

        let mut order: Vec<String> = chosen.iter().map(Uuid::to_string).collect();
        order.reverse();
        assert_eq!(
            table.act(RoomAction::SubmitRanking, asker, ranking(order)).unwrap(),
            GuessingOpen
        );
        assert_eq!(table.room.current_guess_rank, Some(1));
        assert!(
            table
                .room
                .current_round_record()
                .unwrap()
                .middle_revealed_value
                .is_none()
        );
    }

    #[test]
    fn select_targets_rejected_for_ordinary_theme_phase() {
        let mut table = Table::new(3);
        let asker = table.guest(0);
        table.to_ranking("life", asker);
        let err = table
            .act(
                RoomAction::SelectTargets,
                asker,
                ActionPayload {
                    target_player_ids: Some(vec![table.guest(1), table.guest(2), table.host()]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[test]
    fn guessing_walks_the_sequence() {
        let mut table = Table::new(3);
        let asker = table.guest(0);
        table.to_ranking("drinks", asker);
        let ids = table.ordinary_ids("drinks");
        table
            .act(RoomAction::SubmitRanking, asker, ranking(ids.clone()))
            .unwrap();
        table.host_act(RoomAction::OpenGuessing).unwrap();
        assert_eq!(table.room.current_guess_rank, Some(1));

        let err = table.act(RoomAction::SubmitGuess, asker, guess(&ids[0])).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let guesser = table.guest(1);
        let err = table.act(RoomAction::SubmitGuess, guesser, guess("sushi")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        table.act(RoomAction::SubmitGuess, guesser, guess(&ids[2])).unwrap();
        table.act(RoomAction::SubmitGuess, guesser, guess(&ids[0])).unwrap();
        assert_eq!(table.guesses.len(), 1);
        assert_eq!(table.guesses[0].guess_top1, ids[0]);
        assert_eq!(table.room.phase, GuessingOpen);

        for expected in [2, 3, 5, 6] {
            table.host_act(RoomAction::CloseGuess).unwrap();
            table.host_act(RoomAction::RevealResult).unwrap();
            let err = table.host_act(RoomAction::ShowSummary).unwrap_err();
            assert!(matches!(err, ServiceError::InvalidState(_)));
            table.host_act(RoomAction::NextRank).unwrap();
            assert_eq!(table.room.current_guess_rank, Some(expected));
        }

        table.host_act(RoomAction::CloseGuess).unwrap();
        table.host_act(RoomAction::RevealResult).unwrap();
        let err = table.host_act(RoomAction::NextRank).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(table.host_act(RoomAction::ShowSummary).unwrap(), RoundSummary);

        let counts = table
            .room
            .current_round_record()
            .unwrap()
            .gui_counts
            .clone()
            .unwrap();
        assert_eq!(counts.get(&asker), Some(&1));

        table.host_act(RoomAction::NextRound).unwrap();
        assert_eq!(table.room.phase, SelectTheme);
        assert_eq!(table.room.current_round, 2);
        assert_eq!(table.room.asker_player_id, None);
        assert_eq!(table.room.current_guess_rank, None);
        assert!(!table.room.gui_mode);
    }

    #[test]
    fn back_to_theme_resets_the_round() {
        let mut table = Table::new(3);
        let asker = table.guest(0);
        table.to_ranking("love", asker);
        let ids = table.ordinary_ids("love");
        table.act(RoomAction::SubmitRanking, asker, ranking(ids)).unwrap();

        table.host_act(RoomAction::BackToTheme).unwrap();
        assert_eq!(table.room.phase, SelectTheme);
        assert_eq!(table.room.current_round, 1);
        assert_eq!(table.room.asker_player_id, None);
        let round = table.room.current_round_record().unwrap();
        assert!(round.ranking.is_none());
        assert!(round.rank_sequence.is_empty());
        assert!(round.asker_player_id.is_none());
        assert!(round.middle_revealed_value.is_none());

        table.host_act(RoomAction::StartGame).unwrap_err();
    }

    #[test]
    fn kick_rules() {
        let mut table = Table::new(2);
        let host = table.host();
        let guest = table.guest(0);
        let kick = |id: Uuid| ActionPayload {
            kick_player_id: Some(id),
            ..Default::default()
        };

        assert!(matches!(
            table.act(RoomAction::KickPlayer, guest, kick(host)),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            table.act(RoomAction::KickPlayer, host, kick(host)),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            table.act(RoomAction::KickPlayer, host, kick(Uuid::new_v4())),
            Err(ServiceError::InvalidInput(_))
        ));

        let version = table.room.version;
        assert_eq!(
            table.act(RoomAction::KickPlayer, host, kick(guest)).unwrap(),
            WaitingPlayers
        );
        assert!(!table.room.is_member(guest));
        assert_eq!(table.room.version, version + 1);
    }
}
