//! Rank layout of a round: how many items are ranked, which rank is shown as a hint and which
//! ranks are guessed, in order.

/// Number of items in every ordinary (catalog) theme.
pub const ORDINARY_ITEM_COUNT: usize = 7;
/// Smallest number of players a person-rank round can rank.
pub const MIN_TARGETS: usize = 3;
/// Largest number of players a person-rank round can rank.
pub const MAX_TARGETS: usize = 7;

/// Hint rank of an ordinary seven-item theme.
const ORDINARY_HINT_RANK: u8 = 4;
/// Hint rank of a person-rank round ranking at least [`PERSON_HINT_THRESHOLD`] players.
const PERSON_HINT_RANK: u8 = 3;
/// Smallest person-rank round that reveals a hint rank.
const PERSON_HINT_THRESHOLD: usize = 5;

/// Rank revealed before guessing starts, if any.
///
/// Ordinary themes reveal the middle rank. Person-rank rounds reveal rank 3 once at least five
/// players are ranked and have no hint below that.
pub fn hint_rank(item_count: usize, person_rank: bool) -> Option<u8> {
    if person_rank {
        (item_count >= PERSON_HINT_THRESHOLD).then_some(PERSON_HINT_RANK)
    } else {
        (item_count >= usize::from(ORDINARY_HINT_RANK)).then_some(ORDINARY_HINT_RANK)
    }
}

/// Ranks that are guessed, in play order.
///
/// The bottom rank is never guessed (it is revealed together with the one above it) and the hint
/// rank is skipped because it is already public.
pub fn compute_sequence(item_count: usize, person_rank: bool) -> Vec<u8> {
    let hint = hint_rank(item_count, person_rank);
    let bottom = bottom_rank(item_count);
    (1..bottom).filter(|rank| Some(*rank) != hint).collect()
}

/// Lowest rank of a ranking with `item_count` entries.
pub fn bottom_rank(item_count: usize) -> u8 {
    u8::try_from(item_count).unwrap_or(u8::MAX)
}

/// Whether a person-rank round with `item_count` targets skips the hint phase entirely.
pub fn skips_hint(item_count: usize, person_rank: bool) -> bool {
    hint_rank(item_count, person_rank).is_none()
}
