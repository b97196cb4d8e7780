use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::transitions::Transition;

/// Phases a room moves through during a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomPhase {
    /// Lobby: players are joining.
    WaitingPlayers,
    /// Host picks the theme for the round.
    SelectTheme,
    /// Host designates the asker.
    SelectAsker,
    /// Asker picks which players are ranked (person-rank themes only).
    SelectTargets,
    /// Asker privately submits the ranking.
    AskerRanking,
    /// The hint rank is shown before guessing starts.
    RevealMiddle,
    /// Guessers submit their guess for the active rank.
    GuessingOpen,
    /// Submissions for the active rank are closed.
    GuessingClosed,
    /// The active rank and everyone's guesses are shown.
    ResultRevealed,
    /// End-of-round scoreboard.
    RoundSummary,
}

impl RoomPhase {
    /// Every phase, in game order.
    pub const ALL: [RoomPhase; 10] = [
        RoomPhase::WaitingPlayers,
        RoomPhase::SelectTheme,
        RoomPhase::SelectAsker,
        RoomPhase::SelectTargets,
        RoomPhase::AskerRanking,
        RoomPhase::RevealMiddle,
        RoomPhase::GuessingOpen,
        RoomPhase::GuessingClosed,
        RoomPhase::ResultRevealed,
        RoomPhase::RoundSummary,
    ];

    /// Wire name of the phase.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomPhase::WaitingPlayers => "WAITING_PLAYERS",
            RoomPhase::SelectTheme => "SELECT_THEME",
            RoomPhase::SelectAsker => "SELECT_ASKER",
            RoomPhase::SelectTargets => "SELECT_TARGETS",
            RoomPhase::AskerRanking => "ASKER_RANKING",
            RoomPhase::RevealMiddle => "REVEAL_MIDDLE",
            RoomPhase::GuessingOpen => "GUESSING_OPEN",
            RoomPhase::GuessingClosed => "GUESSING_CLOSED",
            RoomPhase::ResultRevealed => "RESULT_REVEALED",
            RoomPhase::RoundSummary => "ROUND_SUMMARY",
        }
    }

    /// Whether the submitted ranking is (partially) disclosed in this phase.
    pub fn discloses_ranking(self) -> bool {
        matches!(
            self,
            RoomPhase::RevealMiddle
                | RoomPhase::GuessingOpen
                | RoomPhase::GuessingClosed
                | RoomPhase::ResultRevealed
                | RoomPhase::RoundSummary
        )
    }
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutations a player can request through the action endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RoomAction {
    /// Leave the lobby and open round 1.
    StartGame,
    /// Pick the theme of the current round.
    SelectTheme,
    /// Designate the asker of the current round.
    SelectAsker,
    /// Pick the ranked players for a person-rank theme.
    SelectTargets,
    /// Submit the asker's secret ranking.
    SubmitRanking,
    /// Open guessing on the first rank of the sequence.
    OpenGuessing,
    /// Record (or overwrite) a guess for the active rank.
    SubmitGuess,
    /// Close submissions for the active rank.
    CloseGuess,
    /// Reveal the active rank.
    RevealResult,
    /// Move guessing to the next rank of the sequence.
    NextRank,
    /// Show the round scoreboard once the final rank is revealed.
    ShowSummary,
    /// Start the next round.
    NextRound,
    /// Abandon the round setup and pick another theme.
    BackToTheme,
    /// Remove a player from the room.
    KickPlayer,
}

impl RoomAction {
    /// Every action the dispatcher understands.
    pub const ALL: [RoomAction; 14] = [
        RoomAction::StartGame,
        RoomAction::SelectTheme,
        RoomAction::SelectAsker,
        RoomAction::SelectTargets,
        RoomAction::SubmitRanking,
        RoomAction::OpenGuessing,
        RoomAction::SubmitGuess,
        RoomAction::CloseGuess,
        RoomAction::RevealResult,
        RoomAction::NextRank,
        RoomAction::ShowSummary,
        RoomAction::NextRound,
        RoomAction::BackToTheme,
        RoomAction::KickPlayer,
    ];
}

/// Who may issue an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The room creator.
    Host,
    /// The asker of the current round.
    Asker,
    /// Any member except the asker.
    Guesser,
    /// Any member.
    Member,
}

/// Role facts about the player issuing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// The caller created the room.
    pub is_host: bool,
    /// The caller is the asker of the current round.
    pub is_asker: bool,
}

impl Role {
    /// Whether `caller` satisfies this role requirement.
    pub fn admits(self, caller: &Caller) -> bool {
        match self {
            Role::Host => caller.is_host,
            Role::Asker => caller.is_asker,
            Role::Guesser => !caller.is_asker,
            Role::Member => true,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Role::Host => "only the host can do this",
            Role::Asker => "only the asker can do this",
            Role::Guesser => "the asker cannot guess their own ranking",
            Role::Member => "only room members can do this",
        }
    }
}

/// Phases an action may be issued from.
#[derive(Debug, Clone, Copy)]
pub enum PhaseGuard {
    /// Legal in every phase.
    Any,
    /// Legal only from the listed phases.
    OneOf(&'static [RoomPhase]),
}

impl PhaseGuard {
    /// Whether the guard admits `phase`.
    pub fn admits(&self, phase: RoomPhase) -> bool {
        match self {
            PhaseGuard::Any => true,
            PhaseGuard::OneOf(phases) => phases.contains(&phase),
        }
    }
}

/// Phases an action may lead to.
#[derive(Debug, Clone, Copy)]
pub enum PhaseTarget {
    /// The phase does not change.
    Unchanged,
    /// One of the listed phases, chosen by the action's side effect.
    OneOf(&'static [RoomPhase]),
}

impl PhaseTarget {
    /// Whether moving from `from` to `to` is allowed by this target.
    pub fn admits(&self, from: RoomPhase, to: RoomPhase) -> bool {
        match self {
            PhaseTarget::Unchanged => from == to,
            PhaseTarget::OneOf(phases) => phases.contains(&to),
        }
    }
}

/// Error returned when an action cannot be issued from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action:?} cannot be applied while the room is in {from}")]
pub struct InvalidTransition {
    /// Phase the room was in.
    pub from: RoomPhase,
    /// Rejected action.
    pub action: RoomAction,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The caller does not hold the role the action requires.
    #[error("{reason}")]
    Forbidden {
        /// Rejected action.
        action: RoomAction,
        /// Human readable reason.
        reason: &'static str,
    },
    /// The action is not legal from the current phase.
    #[error(transparent)]
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// Phase changed since the plan was created.
    #[error("room phase changed during transition (expected {expected}, got {actual})")]
    PhaseMismatch {
        /// Phase when the plan was created.
        expected: RoomPhase,
        /// Current phase.
        actual: RoomPhase,
    },
    /// Version changed since the plan was created.
    #[error("room version changed during transition (expected {expected}, got {actual})")]
    VersionMismatch {
        /// Version when the plan was created.
        expected: u64,
        /// Current version.
        actual: u64,
    },
    /// The side effect chose a phase the table does not allow.
    #[error("{action:?} may not move the room from {from} to {to}")]
    UnexpectedTarget {
        /// Applied action.
        action: RoomAction,
        /// Phase before the transition.
        from: RoomPhase,
        /// Phase chosen by the side effect.
        to: RoomPhase,
    },
}

/// A transition that passed the role and phase guards but is not applied yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Planned action.
    pub action: RoomAction,
    /// Phase the room is in.
    pub from: RoomPhase,
    /// Phases the side effect may choose from.
    pub to: PhaseTarget,
    /// Version the room must still have when the plan is committed.
    pub version_expected: u64,
    /// Version after applying this transition.
    pub version_next: u64,
}

/// Guarded view of a room's phase and version stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomStateMachine {
    phase: RoomPhase,
    version: u64,
}

impl RoomStateMachine {
    /// Wrap the persisted phase and version of a room.
    pub fn new(phase: RoomPhase, version: u64) -> Self {
        Self { phase, version }
    }

    /// Current phase.
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Current version stamp.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check the caller's role and the current phase against `transition`.
    pub fn plan(&self, transition: &Transition, caller: &Caller) -> Result<Plan, PlanError> {
        if !transition.role.admits(caller) {
            return Err(PlanError::Forbidden {
                action: transition.action,
                reason: transition.role.describe(),
            });
        }

        if !transition.from.admits(self.phase) {
            return Err(PlanError::InvalidTransition(InvalidTransition {
                from: self.phase,
                action: transition.action,
            }));
        }

        Ok(Plan {
            action: transition.action,
            from: self.phase,
            to: transition.to,
            version_expected: self.version,
            version_next: self.version + 1,
        })
    }

    /// Apply a plan, moving to `next` and bumping the version.
    pub fn apply(&mut self, plan: &Plan, next: RoomPhase) -> Result<RoomPhase, ApplyError> {
        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version != plan.version_expected {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_expected,
                actual: self.version,
            });
        }

        if !plan.to.admits(plan.from, next) {
            return Err(ApplyError::UnexpectedTarget {
                action: plan.action,
                from: plan.from,
                to: next,
            });
        }

        self.phase = next;
        self.version = plan.version_next;
        Ok(self.phase)
    }
}
