//! Score aggregation
//!
//! Pure functions over the room's rounds and guess ledger. Nothing here touches storage; the
//! caller fetches rounds and guesses and passes them in.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::state::room::{Guess, Round};

/// Correct-guess counts per player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    /// Correct guesses across every round up to the current one.
    pub totals: IndexMap<Uuid, u32>,
    /// Correct guesses within the current round.
    pub round_scores: IndexMap<Uuid, u32>,
}

/// Best and worst "understanders" of the asker for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Badges {
    /// Players sharing the top round score.
    pub best: Vec<Uuid>,
    /// Players sharing the bottom round score, unless it equals the top one.
    pub worst: Vec<Uuid>,
}

/// Whether `guess` names the id actually ranked at its rank in `round`.
///
/// Rounds without a submitted ranking score nothing.
pub fn is_correct(round: &Round, guess: &Guess) -> bool {
    round
        .answer_at(guess.guess_rank)
        .is_some_and(|answer| answer == guess.guess_top1)
}

/// Aggregate totals and current-round scores.
///
/// Every roster member starts at zero, in roster order; guessers no longer on the roster are
/// appended as they are found.
pub fn aggregate(
    roster: &[Uuid],
    rounds: &[Round],
    guesses: &[Guess],
    current_round: u32,
) -> Scoreboard {
    let mut board = Scoreboard {
        totals: roster.iter().map(|id| (*id, 0)).collect(),
        round_scores: roster.iter().map(|id| (*id, 0)).collect(),
    };

    for guess in guesses {
        if guess.round_no > current_round {
            continue;
        }
        let Some(round) = rounds.iter().find(|round| round.round_no == guess.round_no) else {
            continue;
        };
        if !is_correct(round, guess) {
            continue;
        }

        *board.totals.entry(guess.player_id).or_insert(0) += 1;
        if guess.round_no == current_round {
            *board.round_scores.entry(guess.player_id).or_insert(0) += 1;
        }
    }

    board
}

/// Badges derived from round scores, ignoring the asker.
///
/// When more than one guesser is scored and everyone is tied, no badge is handed out.
pub fn badges(round_scores: &IndexMap<Uuid, u32>, asker: Option<Uuid>) -> Badges {
    let mut ranked: Vec<(Uuid, u32)> = round_scores
        .iter()
        .filter(|(player, _)| Some(**player) != asker)
        .map(|(player, score)| (*player, *score))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let top = ranked.first().map(|(_, score)| *score).unwrap_or(0);
    let bottom = ranked.last().map(|(_, score)| *score).unwrap_or(0);
    if top == bottom && ranked.len() > 1 {
        return Badges::default();
    }

    Badges {
        best: ranked
            .iter()
            .filter(|(_, score)| *score == top)
            .map(|(player, _)| *player)
            .collect(),
        worst: ranked
            .iter()
            .filter(|(_, score)| *score == bottom && *score != top)
            .map(|(player, _)| *player)
            .collect(),
    }
}

/// Drinking-penalty counts for a finished round.
///
/// Per guessed rank: when everyone who guessed got it right the asker takes the penalty, otherwise
/// every wrong guesser does. Ranks nobody guessed are skipped.
pub fn gui_counts(round: &Round, guesses: &[Guess]) -> IndexMap<Uuid, u32> {
    let mut counts = IndexMap::new();

    for rank in &round.rank_sequence {
        let for_rank: Vec<&Guess> = guesses
            .iter()
            .filter(|guess| guess.round_no == round.round_no && guess.guess_rank == *rank)
            .collect();
        if for_rank.is_empty() {
            continue;
        }

        let wrong: Vec<&Guess> = for_rank
            .iter()
            .copied()
            .filter(|guess| !is_correct(round, guess))
            .collect();

        match round.asker_player_id {
            Some(asker) if wrong.is_empty() => *counts.entry(asker).or_insert(0) += 1,
            _ => {
                for guess in wrong {
                    *counts.entry(guess.player_id).or_insert(0) += 1;
                }
            }
        }
    }

    counts
}
