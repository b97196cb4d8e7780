//! Static registry of themes and the item sources a round ranks.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{ranking::ORDINARY_ITEM_COUNT, room::Player};

/// Grouping shown in the theme picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeCategory {
    /// Dating preferences.
    Love,
    /// Life values.
    Life,
    /// Light, casual topics.
    Light,
    /// Restricted category unlocked by the verification channel.
    Fetish,
    /// The room's own players are ranked.
    PersonRank,
    /// Themes added through the configuration file.
    Custom,
}

/// Unlock requirement of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ThemeAccess {
    /// Always selectable.
    Free,
    /// Needs the room's verification flag.
    Verified,
    /// Needs the room's premium entitlement.
    Premium,
}

/// A single rankable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeItem {
    /// Identifier stored in rankings and guesses.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Decorative emoji.
    pub emoji: String,
}

/// Where a theme's items come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeKind {
    /// A fixed list of catalog items.
    Ordinary(Vec<ThemeItem>),
    /// The players targeted by the asker.
    PersonRank,
}

/// A selectable theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Stable identifier.
    pub id: String,
    /// Question shown to players.
    pub title: String,
    /// Decorative emoji.
    pub emoji: String,
    /// Picker grouping.
    pub category: ThemeCategory,
    /// Unlock requirement.
    pub access: ThemeAccess,
    /// Item source.
    pub kind: ThemeKind,
}

impl Theme {
    /// Whether the theme ranks the room's players.
    pub fn is_person_rank(&self) -> bool {
        matches!(self.kind, ThemeKind::PersonRank)
    }

    /// Catalog items of an ordinary theme; empty for person-rank themes.
    pub fn items(&self) -> &[ThemeItem] {
        match &self.kind {
            ThemeKind::Ordinary(items) => items,
            ThemeKind::PersonRank => &[],
        }
    }
}

/// Source of the ids a round ranks, resolving ids to display labels.
#[derive(Debug, Clone, Copy)]
pub enum ItemSource<'a> {
    /// Ids are catalog item ids.
    Catalog(&'a [ThemeItem]),
    /// Ids are player ids taken from the targeted roster.
    Roster {
        /// Room roster used for labels.
        players: &'a [Player],
        /// Players being ranked.
        targets: &'a [Uuid],
    },
}

impl<'a> ItemSource<'a> {
    /// Item source of a round of `theme`.
    pub fn for_theme(theme: &'a Theme, players: &'a [Player], targets: &'a [Uuid]) -> Self {
        match &theme.kind {
            ThemeKind::Ordinary(items) => ItemSource::Catalog(items),
            ThemeKind::PersonRank => ItemSource::Roster { players, targets },
        }
    }

    /// Ids the asker must rank, in catalog (or target selection) order.
    pub fn eligible_ids(&self) -> Vec<String> {
        match self {
            ItemSource::Catalog(items) => items.iter().map(|item| item.id.clone()).collect(),
            ItemSource::Roster { targets, .. } => {
                targets.iter().map(|target| target.to_string()).collect()
            }
        }
    }

    /// Whether `id` may appear in the ranking.
    pub fn contains(&self, id: &str) -> bool {
        match self {
            ItemSource::Catalog(items) => items.iter().any(|item| item.id == id),
            ItemSource::Roster { targets, .. } => {
                targets.iter().any(|target| target.to_string() == id)
            }
        }
    }

    /// Display label of `id`, if it belongs to this source.
    ///
    /// Kicked players keep their slot in the ranking but lose their label.
    pub fn label(&self, id: &str) -> Option<String> {
        match self {
            ItemSource::Catalog(items) => items
                .iter()
                .find(|item| item.id == id)
                .map(|item| item.label.clone()),
            ItemSource::Roster { players, targets } => {
                let target = targets.iter().find(|target| target.to_string() == id)?;
                players
                    .iter()
                    .find(|player| player.id == *target)
                    .map(|player| player.name.clone())
            }
        }
    }

    /// Emoji of a catalog item; players have none.
    pub fn emoji(&self, id: &str) -> Option<String> {
        match self {
            ItemSource::Catalog(items) => items
                .iter()
                .find(|item| item.id == id)
                .map(|item| item.emoji.clone()),
            ItemSource::Roster { .. } => None,
        }
    }

    /// Number of ranked entries.
    pub fn len(&self) -> usize {
        match self {
            ItemSource::Catalog(items) => items.len(),
            ItemSource::Roster { targets, .. } => targets.len(),
        }
    }

    /// Whether the source has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable registry of every selectable theme, keyed by id in display order.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: IndexMap<String, Theme>,
}

impl ThemeCatalog {
    /// Built-in themes followed by `extra` ones. Extra themes never replace a built-in id.
    pub fn with_extra(extra: Vec<Theme>) -> Self {
        let mut themes = IndexMap::new();
        for theme in builtin_themes().into_iter().chain(extra) {
            if themes.contains_key(&theme.id) {
                tracing::warn!(theme = %theme.id, "duplicate theme id ignored");
                continue;
            }
            themes.insert(theme.id.clone(), theme);
        }
        Self { themes }
    }

    /// Look a theme up by id.
    pub fn get(&self, id: &str) -> Option<&Theme> {
        self.themes.get(id)
    }

    /// Every theme in display order.
    pub fn themes(&self) -> impl Iterator<Item = &Theme> {
        self.themes.values()
    }

    /// Number of registered themes.
    pub fn len(&self) -> usize {
        self.themes.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::with_extra(Vec::new())
    }
}

/// Build an ordinary theme, checking it has exactly the expected number of unique items.
pub fn ordinary_theme(
    id: &str,
    title: &str,
    emoji: &str,
    category: ThemeCategory,
    access: ThemeAccess,
    items: &[(&str, &str, &str)],
) -> Result<Theme, String> {
    if items.len() != ORDINARY_ITEM_COUNT {
        return Err(format!(
            "theme `{id}` has {} items, expected {ORDINARY_ITEM_COUNT}",
            items.len()
        ));
    }
    let mut seen = Vec::with_capacity(items.len());
    for (item_id, _, _) in items {
        if item_id.is_empty() || seen.contains(item_id) {
            return Err(format!("theme `{id}` has an empty or duplicate item id"));
        }
        seen.push(*item_id);
    }

    Ok(Theme {
        id: id.to_owned(),
        title: title.to_owned(),
        emoji: emoji.to_owned(),
        category,
        access,
        kind: ThemeKind::Ordinary(
            items
                .iter()
                .map(|(item_id, emoji, label)| ThemeItem {
                    id: (*item_id).to_owned(),
                    label: (*label).to_owned(),
                    emoji: (*emoji).to_owned(),
                })
                .collect(),
        ),
    })
}

fn person_rank_theme(id: &str, title: &str, emoji: &str) -> Theme {
    Theme {
        id: id.to_owned(),
        title: title.to_owned(),
        emoji: emoji.to_owned(),
        category: ThemeCategory::PersonRank,
        access: ThemeAccess::Premium,
        kind: ThemeKind::PersonRank,
    }
}

type ItemRow = (&'static str, &'static str, &'static str);

const ORDINARY_THEMES: &[(
    &str,
    &str,
    &str,
    ThemeCategory,
    ThemeAccess,
    [ItemRow; ORDINARY_ITEM_COUNT],
)] = &[
    (
        "love",
        "What matters most in a partner?",
        "💕",
        ThemeCategory::Love,
        ThemeAccess::Free,
        [
            ("face", "👀", "Looks"),
            ("personality", "💝", "Personality"),
            ("height", "📏", "Height"),
            ("income", "💰", "Income"),
            ("chemistry", "🔥", "Physical chemistry"),
            ("drinking", "🍻", "Drinking habits"),
            ("frequency", "📅", "How often you can meet"),
        ],
    ),
    (
        "life",
        "What matters most in life?",
        "🌈",
        ThemeCategory::Life,
        ThemeAccess::Free,
        [
            ("freedom", "🗽", "Freedom"),
            ("money", "💴", "Money"),
            ("health", "💪", "Health"),
            ("family", "👨‍👩‍👧", "Family"),
            ("work", "🏢", "Work"),
            ("friends", "👫", "Friends"),
            ("hobby", "🎨", "Hobbies"),
        ],
    ),
    (
        "drinks",
        "Favourite kind of drink",
        "🍺",
        ThemeCategory::Light,
        ThemeAccess::Free,
        [
            ("beer", "🍺", "Beer"),
            ("highball", "🥃", "Highball"),
            ("sake", "🍶", "Sake"),
            ("wine", "🍷", "Wine"),
            ("shochu", "🫗", "Shochu"),
            ("lemonsour", "🍋", "Lemon sour"),
            ("tequila", "🌵", "Tequila"),
        ],
    ),
    (
        "fetish-female",
        "Honestly, what's your weak spot? (women)",
        "💜",
        ThemeCategory::Fetish,
        ThemeAccess::Verified,
        [
            ("nape", "✨", "Nape"),
            ("collarbone", "💜", "Collarbone"),
            ("armpit", "🌸", "Armpit"),
            ("thigh", "🌙", "Thighs"),
            ("hand", "🤍", "Hands"),
            ("butt", "🍑", "Butt"),
            ("chest", "💗", "Chest"),
        ],
    ),
    (
        "fetish-male",
        "Honestly, what's your weak spot? (men)",
        "💙",
        ThemeCategory::Fetish,
        ThemeAccess::Verified,
        [
            ("hand", "✋", "Hands"),
            ("vein", "💪", "Veins"),
            ("shoulder", "🏔", "Shoulders"),
            ("pectoral", "🦾", "Chest muscles"),
            ("adams", "🔥", "Adam's apple"),
            ("collarbone", "⚡", "Collarbone"),
            ("calf", "🦵", "Calves"),
        ],
    ),
];

const PERSON_RANK_THEMES: &[(&str, &str, &str)] = &[
    ("pr-type", "Who is most your type?", "💘"),
    ("pr-popular", "Who is the most popular?", "🌟"),
    ("pr-kiss", "Who is the best kisser?", "💋"),
    ("pr-clingy", "Who would be the most possessive partner?", "🔒"),
    ("pr-charisma", "Who is the most alluring?", "✨"),
    ("pr-night", "Who stays up the latest?", "🌙"),
    ("pr-erotic", "Who is secretly the naughtiest?", "🔥"),
    ("pr-ds", "Who is the most sadistic?", "😈"),
    ("pr-cheat", "Who would cheat first?", "💔"),
    ("pr-drunk", "Who is the most annoying drunk?", "🍺"),
    ("pr-selfish", "Who is the most selfish?", "👑"),
    ("pr-heartbreak", "Who takes a breakup the hardest?", "😢"),
];

fn builtin_themes() -> Vec<Theme> {
    let ordinary = ORDINARY_THEMES
        .iter()
        .map(|(id, title, emoji, category, access, items)| Theme {
            id: (*id).to_owned(),
            title: (*title).to_owned(),
            emoji: (*emoji).to_owned(),
            category: *category,
            access: *access,
            kind: ThemeKind::Ordinary(
                items
                    .iter()
                    .map(|(item_id, emoji, label)| ThemeItem {
                        id: (*item_id).to_owned(),
                        label: (*label).to_owned(),
                        emoji: (*emoji).to_owned(),
                    })
                    .collect(),
            ),
        });
    let person_rank = PERSON_RANK_THEMES
        .iter()
        .map(|(id, title, emoji)| person_rank_theme(id, title, emoji));

    ordinary.chain(person_rank).collect()
}
