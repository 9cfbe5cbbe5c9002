//! Seeded in-process collection for `--demo` runs.

use autonote_core::{InMemoryNotesGateway, Note, NoteId, SourceType};
use chrono::{Duration, TimeZone, Utc};

struct Seed {
    title: &'static str,
    content: &'static str,
    tags: &'static [&'static str],
    source: SourceType,
    url: Option<&'static str>,
}

const SEEDS: &[Seed] = &[
    Seed {
        title: "Ownership in five minutes",
        content: "<h2>Moves</h2><p>Values have a single owner; assignment <b>moves</b> them.</p>",
        tags: &["rust", "video"],
        source: SourceType::Video,
        url: Some("https://www.youtube.com/watch?v=ownership"),
    },
    Seed {
        title: "Reading list",
        content: "<ul><li>Async book</li><li>Nomicon</li></ul>",
        tags: &["rust", "books"],
        source: SourceType::Manual,
        url: None,
    },
    Seed {
        title: "Raft paper highlights",
        content: "<p>Leader election &amp; log replication, with terms as logical clocks.</p>",
        tags: &["papers", "distributed"],
        source: SourceType::Pdf,
        url: Some("https://raft.github.io/raft.pdf"),
    },
    Seed {
        title: "API design notes",
        content: "<p>Prefer typed errors at crate boundaries.</p>",
        tags: &["rust"],
        source: SourceType::Web,
        url: Some("https://rust-lang.github.io/api-guidelines/"),
    },
];

/// Gateway pre-populated with a small, fixed collection.
pub fn seeded_gateway() -> InMemoryNotesGateway {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).single();
    let notes = SEEDS.iter().zip(1u64..).filter_map(|(seed, id)| {
        let created_at = base? + Duration::days(id as i64);
        let note = Note::new(NoteId::from(id), seed.title, seed.content, created_at).ok()?;
        Some(
            note.with_tags(seed.tags)
                .with_source(seed.source, seed.url.map(str::to_string)),
        )
    });
    InMemoryNotesGateway::with_notes(notes)
}

#[cfg(test)]
mod tests {
    use super::{seeded_gateway, SEEDS};

    #[test]
    fn every_seed_is_valid() {
        assert_eq!(seeded_gateway().snapshot().len(), SEEDS.len());
    }
}
