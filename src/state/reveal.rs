//! Derives which ranks of a round are public for a given room phase.

use std::collections::BTreeSet;

use crate::state::{ranking::bottom_rank, state_machine::RoomPhase};

/// Inputs of the masking rules, independent of who is asking.
#[derive(Debug, Clone, Copy)]
pub struct RevealContext<'a> {
    /// Room phase.
    pub phase: RoomPhase,
    /// Number of ranked entries.
    pub item_count: usize,
    /// Rank shown before guessing, if the round has one.
    pub hint_rank: Option<u8>,
    /// Ranks guessed, in order.
    pub sequence: &'a [u8],
    /// Rank currently open (or just revealed).
    pub current_guess_rank: Option<u8>,
}

/// Ranks (1-based) visible to every player.
pub fn revealed_ranks(ctx: &RevealContext<'_>) -> BTreeSet<u8> {
    let mut revealed = BTreeSet::new();
    if !ctx.phase.discloses_ranking() {
        return revealed;
    }

    if let Some(hint) = ctx.hint_rank {
        revealed.insert(hint);
    }

    let bottom = bottom_rank(ctx.item_count);
    if ctx.phase == RoomPhase::RoundSummary {
        revealed.extend(1..=bottom);
        return revealed;
    }

    let Some(current) = ctx.current_guess_rank else {
        return revealed;
    };
    let Some(position) = ctx.sequence.iter().position(|rank| *rank == current) else {
        return revealed;
    };

    match ctx.phase {
        RoomPhase::ResultRevealed => {
            revealed.extend(&ctx.sequence[..=position]);
            if position + 1 == ctx.sequence.len() {
                revealed.insert(bottom);
            }
        }
        RoomPhase::GuessingOpen | RoomPhase::GuessingClosed => {
            revealed.extend(&ctx.sequence[..position]);
        }
        _ => {}
    }

    revealed
}

/// Replace every unrevealed slot of `ranking` with `None`.
pub fn mask_ranking<'r>(ranking: &'r [String], revealed: &BTreeSet<u8>) -> Vec<Option<&'r str>> {
    ranking
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let rank = u8::try_from(index + 1).ok()?;
            revealed.contains(&rank).then_some(id.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ranking::{compute_sequence, hint_rank};

    fn ordinary(phase: RoomPhase, current: Option<u8>) -> BTreeSet<u8> {
        let sequence = compute_sequence(7, false);
        revealed_ranks(&RevealContext {
            phase,
            item_count: 7,
            hint_rank: hint_rank(7, false),
            sequence: &sequence,
            current_guess_rank: current,
        })
    }

    fn set(ranks: &[u8]) -> BTreeSet<u8> {
        ranks.iter().copied().collect()
    }

    #[test]
    fn nothing_is_public_before_the_hint() {
        for phase in [
            RoomPhase::WaitingPlayers,
            RoomPhase::SelectTheme,
            RoomPhase::SelectAsker,
            RoomPhase::SelectTargets,
            RoomPhase::AskerRanking,
        ] {
            assert!(ordinary(phase, None).is_empty(), "{phase}");
        }
    }

    #[test]
    fn hint_is_public_from_reveal_middle() {
        assert_eq!(ordinary(RoomPhase::RevealMiddle, None), set(&[4]));
    }

    #[test]
    fn guessing_hides_the_active_rank() {
        assert_eq!(ordinary(RoomPhase::GuessingOpen, Some(1)), set(&[4]));
        assert_eq!(ordinary(RoomPhase::GuessingOpen, Some(3)), set(&[1, 2, 4]));
        assert_eq!(
            ordinary(RoomPhase::GuessingClosed, Some(6)),
            set(&[1, 2, 3, 4, 5])
        );
    }

    #[test]
    fn result_reveals_through_the_active_rank() {
        assert_eq!(ordinary(RoomPhase::ResultRevealed, Some(1)), set(&[1, 4]));
        assert_eq!(
            ordinary(RoomPhase::ResultRevealed, Some(5)),
            set(&[1, 2, 3, 4, 5])
        );
    }

    #[test]
    fn last_result_reveals_the_bottom_rank() {
        assert_eq!(
            ordinary(RoomPhase::ResultRevealed, Some(6)),
            set(&[1, 2, 3, 4, 5, 6, 7])
        );
    }

    #[test]
    fn summary_reveals_everything() {
        assert_eq!(ordinary(RoomPhase::RoundSummary, Some(6)), set(&[1, 2, 3, 4, 5, 6, 7]));
        assert_eq!(ordinary(RoomPhase::RoundSummary, None), set(&[1, 2, 3, 4, 5, 6, 7]));
    }

    #[test]
    fn small_person_rank_has_no_hint() {
        let sequence = compute_sequence(4, true);
        let ctx = |phase, current| RevealContext {
            phase,
            item_count: 4,
            hint_rank: hint_rank(4, true),
            sequence: &sequence,
            current_guess_rank: current,
        };

        assert!(revealed_ranks(&ctx(RoomPhase::GuessingOpen, Some(1))).is_empty());
        assert_eq!(
            revealed_ranks(&ctx(RoomPhase::ResultRevealed, Some(2))),
            set(&[1, 2])
        );
        assert_eq!(
            revealed_ranks(&ctx(RoomPhase::ResultRevealed, Some(3))),
            set(&[1, 2, 3, 4])
        );
    }

    #[test]
    fn person_rank_five_reveals_rank_three() {
        let sequence = compute_sequence(5, true);
        let revealed = revealed_ranks(&RevealContext {
            phase: RoomPhase::GuessingOpen,
            item_count: 5,
            hint_rank: hint_rank(5, true),
            sequence: &sequence,
            current_guess_rank: Some(4),
        });
        assert_eq!(revealed, set(&[1, 2, 3]));
    }

    #[test]
    fn mask_hides_unrevealed_slots() {
        let ranking: Vec<String> = ["a", "b", "c", "d", "e", "f", "g"]
            .iter()
            .map(|id| id.to_string())
            .collect();
        let masked = mask_ranking(&ranking, &set(&[1, 2, 4]));
        assert_eq!(
            masked,
            vec![Some("a"), Some("b"), None, Some("d"), None, None, None]
        );
    }
}
