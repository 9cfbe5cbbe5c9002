use autonote_core::{
    excerpt, project, tag_universe, InMemoryNotesGateway, Note, NoteId, NoteStore, SortKey,
    ViewQuery,
};
use chrono::{TimeZone, Utc};

fn note(id: u64, title: &str, content: &str, day: u32, tags: &[&str]) -> Note {
    let created_at = Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap();
    Note::new(NoteId::from(id), title, content, created_at)
        .unwrap()
        .with_tags(tags)
}

fn ids(notes: &[&Note]) -> Vec<String> {
    notes.iter().map(|note| note.id.to_string()).collect()
}

fn corpus() -> Vec<Note> {
    vec![
        note(1, "alpha", "Rust ownership notes", 3, &["x", "rust"]),
        note(2, "Beta", "Borrow checker", 1, &["y"]),
        note(3, "gamma", "<p>Lifetimes in <b>RUST</b></p>", 2, &["x"]),
    ]
}

#[test]
fn tag_filter_with_newest_sort() {
    let notes = vec![
        note(1, "one", "first", 2, &["x"]),
        note(2, "two", "second", 1, &["y"]),
    ];
    let query = ViewQuery::new().with_tag("x").sorted_by(SortKey::Newest);

    assert_eq!(ids(&project(&notes, &query)), vec!["1"]);
}

#[test]
fn empty_query_returns_everything_sorted() {
    let notes = corpus();
    assert_eq!(ids(&project(&notes, &ViewQuery::new())), vec!["1", "3", "2"]);
    assert_eq!(
        ids(&project(&notes, &ViewQuery::new().sorted_by(SortKey::Oldest))),
        vec!["2", "3", "1"]
    );
    assert_eq!(
        ids(&project(&notes, &ViewQuery::new().with_text("   "))),
        vec!["1", "3", "2"]
    );
}

#[test]
fn title_sort_is_case_sensitive() {
    let notes = corpus();
    let query = ViewQuery::new().sorted_by(SortKey::Title);
    assert_eq!(ids(&project(&notes, &query)), vec!["2", "1", "3"]);
}

#[test]
fn equal_sort_keys_fall_back_to_id() {
    let notes = vec![
        note(12, "same", "c", 1, &[]),
        note(3, "same", "b", 1, &[]),
        note(7, "same", "a", 1, &[]),
    ];
    for sort in [SortKey::Newest, SortKey::Oldest, SortKey::Title] {
        let query = ViewQuery::new().sorted_by(sort);
        assert_eq!(ids(&project(&notes, &query)), vec!["3", "7", "12"]);
    }
}

#[test]
fn text_search_is_case_insensitive_over_title_and_content() {
    let notes = corpus();
    let query = ViewQuery::new().with_text("rust");
    assert_eq!(ids(&project(&notes, &query)), vec!["1", "3"]);

    let by_title = ViewQuery::new().with_text("BETA");
    assert_eq!(ids(&project(&notes, &by_title)), vec!["2"]);
}

#[test]
fn surrounding_spaces_in_text_are_part_of_the_match() {
    let notes = vec![
        note(1, "box", "plain", 1, &[]),
        note(2, "a xylophone", "plain", 2, &[]),
    ];
    assert_eq!(ids(&project(&notes, &ViewQuery::new().with_text(" x"))), vec!["2"]);
    assert_eq!(
        ids(&project(&notes, &ViewQuery::new().with_text("x"))),
        vec!["2", "1"]
    );
}

#[test]
fn every_selected_tag_is_required() {
    let notes = corpus();
    let both = ViewQuery::new().with_tags(["x", "rust"]);
    assert_eq!(ids(&project(&notes, &both)), vec!["1"]);

    let wrong_case = ViewQuery::new().with_tag("X");
    assert!(project(&notes, &wrong_case).is_empty());

    let combined = ViewQuery::new().with_tag("x").with_text("lifetimes");
    assert_eq!(ids(&project(&notes, &combined)), vec!["3"]);
}

#[test]
fn tag_universe_ignores_active_filters() {
    let notes = corpus();
    let filtered = project(&notes, &ViewQuery::new().with_tag("y"));
    assert_eq!(filtered.len(), 1);
    assert_eq!(tag_universe(&notes), vec!["rust", "x", "y"]);
}

#[test]
fn excerpt_of_rich_content_is_plain_text() {
    let notes = corpus();
    assert_eq!(excerpt(&notes[2].content, 40), "Lifetimes in RUST");
    assert_eq!(excerpt(&notes[0].content, 4), "Rust...");
}

#[tokio::test]
async fn store_view_reflects_removals() {
    let store = NoteStore::new(InMemoryNotesGateway::with_notes(corpus()));
    store.load_all().await.unwrap();
    assert_eq!(store.tag_universe(), vec!["rust", "x", "y"]);

    store.remove(&NoteId::from(1)).await.unwrap();
    let view = store.view(&ViewQuery::new().with_tag("x"));
    let remaining: Vec<String> = view.iter().map(|note| note.id.to_string()).collect();
    assert_eq!(remaining, vec!["3"]);
    assert_eq!(store.tag_universe(), vec!["x", "y"]);
}
