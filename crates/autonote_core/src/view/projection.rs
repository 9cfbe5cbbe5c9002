//! Filter/sort projection.
//!
//! # Invariants
//! - Text matching is a case-insensitive substring match on title or
//!   content; tag matching is exact and requires every selected tag.
//! - Ordering is total: ties always fall back to `id` ascending.
//! - The tag universe is computed from the unfiltered input.

use crate::model::note::Note;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Sort order for projections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// `created_at` descending.
    #[default]
    Newest,
    /// `created_at` ascending.
    Oldest,
    /// Case-sensitive lexicographic title order.
    Title,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Title => "title",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl Display for UnknownSortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown sort key `{}`; expected newest|oldest|title",
            self.0
        )
    }
}

impl Error for UnknownSortKey {}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "title" => Ok(Self::Title),
            _ => Err(UnknownSortKey(value.to_string())),
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Projection inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    /// Free text, matched as typed (surrounding spaces included);
    /// whitespace-only text matches everything.
    pub text: String,
    /// Required tags; all must be present on a note.
    pub tags: Vec<String>,
    pub sort: SortKey,
}

impl ViewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}

/// Filters and sorts `notes` according to `query`.
pub fn project<'a, I>(notes: I, query: &ViewQuery) -> Vec<&'a Note>
where
    I: IntoIterator<Item = &'a Note>,
{
    let needle = if query.text.trim().is_empty() {
        String::new()
    } else {
        query.text.to_lowercase()
    };
    let mut matched: Vec<&Note> = notes
        .into_iter()
        .filter(|note| matches_text(note, needle.as_str()))
        .filter(|note| query.tags.iter().all(|tag| note.has_tag(tag)))
        .collect();
    matched.sort_by(|left, right| compare(left, right, query.sort));
    matched
}

/// Total order used by [`project`].
pub fn compare(left: &Note, right: &Note, sort: SortKey) -> Ordering {
    let primary = match sort {
        SortKey::Newest => right.created_at.cmp(&left.created_at),
        SortKey::Oldest => left.created_at.cmp(&right.created_at),
        SortKey::Title => left.title.cmp(&right.title),
    };
    primary.then_with(|| left.id.cmp(&right.id))
}

/// Sorted, deduplicated union of tags across `notes`.
pub fn tag_universe<'a, I>(notes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Note>,
{
    notes
        .into_iter()
        .flat_map(|note| note.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn matches_text(note: &Note, needle: &str) -> bool {
    needle.is_empty()
        || note.title.to_lowercase().contains(needle)
        || note.content.to_lowercase().contains(needle)
}
