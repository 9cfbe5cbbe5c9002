use autonote_core::{Note, NoteDraft, NoteId, NotePatch, NoteValidationError, SourceType};
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn decodes_lenient_wire_shape_with_defaults() {
    let value = json!({
        "id": 7,
        "title": "Captured page",
        "content": "<p>Hello</p>",
        "created_at": "2024-01-01T10:00:00",
        "user_id": "alice",
        "summary": null
    });

    let note: Note = serde_json::from_value(value).unwrap();
    let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    assert_eq!(note.id, NoteId::from(7));
    assert!(note.tags.is_empty());
    assert_eq!(note.source_type, SourceType::Manual);
    assert_eq!(note.source_url, None);
    assert_eq!(note.created_at, created_at);
    assert_eq!(note.updated_at, created_at);
}

#[test]
fn decodes_full_wire_shape_and_normalizes_tags() {
    let value = json!({
        "id": "abc-1",
        "title": "Lecture",
        "content": "transcript",
        "tags": ["ml", " ml ", "", "video"],
        "source_url": "https://video.example.com/watch?v=1",
        "source_type": "video",
        "created_at": "2024-02-01T00:00:00Z",
        "updated_at": "2024-02-02T08:30:00+00:00"
    });

    let note: Note = serde_json::from_value(value).unwrap();
    assert_eq!(note.id.as_str(), "abc-1");
    assert_eq!(note.tags, vec!["ml", "video"]);
    assert_eq!(note.source_type, SourceType::Video);
    assert_eq!(
        note.source_url.as_deref(),
        Some("https://video.example.com/watch?v=1")
    );
    assert!(note.updated_at > note.created_at);
}

#[test]
fn rejects_reversed_timestamps() {
    let value = json!({
        "id": 1,
        "title": "t",
        "content": "c",
        "created_at": "2024-02-01",
        "updated_at": "2024-01-01"
    });

    let err = serde_json::from_value::<Note>(value).unwrap_err();
    assert!(
        err.to_string().contains("must be >= created_at"),
        "unexpected error: {err}"
    );
}

#[test]
fn rejects_missing_required_fields_and_unknown_source_type() {
    let missing_title = json!({"id": 1, "content": "c", "created_at": "2024-01-01"});
    assert!(serde_json::from_value::<Note>(missing_title).is_err());

    let blank_content = json!({"id": 1, "title": "t", "content": "  ", "created_at": "2024-01-01"});
    let err = serde_json::from_value::<Note>(blank_content).unwrap_err();
    assert!(err.to_string().contains("Content is required"));

    let unknown_source = json!({
        "id": 1,
        "title": "t",
        "content": "c",
        "source_type": "coursera",
        "created_at": "2024-01-01"
    });
    assert!(serde_json::from_value::<Note>(unknown_source).is_err());

    let blank_id = json!({"id": " ", "title": "t", "content": "c", "created_at": "2024-01-01"});
    assert!(serde_json::from_value::<Note>(blank_id).is_err());
}

#[test]
fn serialized_note_decodes_back_to_same_value() {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let note = Note::new(NoteId::from(3), "Title", "Body", created_at)
        .unwrap()
        .with_tags(["a", "b"])
        .with_source(SourceType::Web, Some("https://example.com".to_string()));

    let value = serde_json::to_value(&note).unwrap();
    assert_eq!(value["id"], "3");
    assert_eq!(value["source_type"], "web");
    assert_eq!(serde_json::from_value::<Note>(value).unwrap(), note);
}

#[test]
fn identity_is_defined_by_id() {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let original = Note::new(NoteId::from(3), "Title", "Body", created_at).unwrap();
    let mut edited = original.clone();
    edited.title = "Edited".to_string();

    assert!(original.is_same_note(&edited));
    assert_ne!(original, edited);
}

#[test]
fn draft_validation_reports_required_fields() {
    assert_eq!(
        NoteDraft::new("", "x").validate(),
        Err(NoteValidationError::BlankTitle)
    );
    assert_eq!(
        NoteDraft::new("title", " \n").validate(),
        Err(NoteValidationError::BlankContent)
    );
    assert_eq!(NoteValidationError::BlankTitle.to_string(), "Title is required");
    assert!(NoteDraft::new("title", "body").validate().is_ok());
}

#[test]
fn draft_and_patch_serialize_snake_case_wire_fields() {
    let draft = NoteDraft::new("Title", "Body")
        .with_tags(["x", "x", "y"])
        .with_source(SourceType::Pdf, Some("https://example.com/a.pdf".to_string()));
    let value = serde_json::to_value(&draft).unwrap();
    assert_eq!(value["tags"], json!(["x", "y"]));
    assert_eq!(value["source_type"], "pdf");
    assert_eq!(value["source_url"], "https://example.com/a.pdf");

    let patch = NotePatch::new().title("New title");
    assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"title": "New title"}));
    assert!(NotePatch::new().is_empty());
}
