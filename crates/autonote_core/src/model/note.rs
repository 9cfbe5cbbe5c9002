//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted `Note` record and its server-assigned identity.
//! - Decode wire payloads into validated notes.
//! - Define `NoteDraft` (create) and `NotePatch` (partial update) payloads.
//!
//! # Invariants
//! - `id` is non-blank and never reused by the remote after deletion.
//! - `title` and `content` are non-blank.
//! - `updated_at` is never earlier than `created_at`.
//! - `tags` are trimmed, non-blank and unique, in first-seen order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Validation failure for note payloads, local drafts and wire records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Identifier is empty or whitespace.
    BlankId,
    /// Title is empty or whitespace.
    BlankTitle,
    /// Content is empty or whitespace.
    BlankContent,
    /// `updated_at` precedes `created_at`.
    TimestampOrder {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
    /// Timestamp text could not be parsed.
    InvalidTimestamp { field: &'static str, value: String },
    /// Source type outside `web|video|pdf|manual`.
    UnknownSourceType(String),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "Note id is required"),
            Self::BlankTitle => write!(f, "Title is required"),
            Self::BlankContent => write!(f, "Content is required"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({}) must be >= created_at ({})",
                updated_at.to_rfc3339(),
                created_at.to_rfc3339()
            ),
            Self::InvalidTimestamp { field, value } => {
                write!(f, "invalid timestamp `{value}` in `{field}`")
            }
            Self::UnknownSourceType(value) => write!(
                f,
                "unknown source type `{value}`; expected web|video|pdf|manual"
            ),
        }
    }
}

impl Error for NoteValidationError {}

/// Server-assigned note identifier.
///
/// The remote may emit ids as JSON numbers or strings; both decode to the same
/// textual id. Numeric ids order numerically and sort before non-numeric ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Creates an id from text, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, NoteValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(NoteValidationError::BlankId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<u64> for NoteId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for NoteId {
    type Err = NoteValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl Ord for NoteId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (numeric_digits(&self.0), numeric_digits(&other.0)) {
            (Some(left), Some(right)) => left
                .len()
                .cmp(&right.len())
                .then_with(|| left.cmp(right))
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for NoteId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Text(value) => NoteId::new(value).map_err(serde::de::Error::custom),
            RawId::Number(value) => Ok(NoteId::from(value)),
        }
    }
}

fn numeric_digits(value: &str) -> Option<&str> {
    if !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit()) {
        Some(value.trim_start_matches('0'))
    } else {
        None
    }
}

/// Provenance of captured note content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Scraped from a web page.
    Web,
    /// Captured from a video transcript.
    Video,
    /// Extracted from a PDF document.
    Pdf,
    /// Typed in by the user.
    #[default]
    Manual,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Video => "video",
            Self::Pdf => "pdf",
            Self::Manual => "manual",
        }
    }
}

impl FromStr for SourceType {
    type Err = NoteValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "video" => Ok(Self::Video),
            "pdf" => Ok(Self::Pdf),
            "manual" => Ok(Self::Manual),
            _ => Err(NoteValidationError::UnknownSourceType(value.to_string())),
        }
    }
}

impl Display for SourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted unit of content, as acknowledged by the remote.
///
/// Identity is the `id`; use [`Note::is_same_note`] for identity checks.
/// `PartialEq` compares every field so server-computed values are observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NoteWire")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// May contain rich markup.
    pub content: String,
    /// Display order is preserved; membership ignores order.
    pub tags: Vec<String>,
    pub source_url: Option<String>,
    pub source_type: SourceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a manual note with no tags and `updated_at == created_at`.
    ///
    /// Used by remote fakes and fixtures; the store never fabricates notes.
    pub fn new(
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, NoteValidationError> {
        let note = Self {
            id,
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            source_url: None,
            source_type: SourceType::Manual,
            created_at,
            updated_at: created_at,
        };
        note.validate()?;
        Ok(note)
    }

    /// Replaces tags with their normalized form.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    /// Sets capture provenance.
    pub fn with_source(mut self, source_type: SourceType, source_url: Option<String>) -> Self {
        self.source_type = source_type;
        self.source_url = source_url;
        self
    }

    /// Validates entity invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(NoteValidationError::BlankId);
        }
        validate_text_fields(Some(self.title.as_str()), Some(self.content.as_str()))?;
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Identity comparison: two notes are the same note when their ids match.
    pub fn is_same_note(&self, other: &Note) -> bool {
        self.id == other.id
    }

    /// Exact, case-sensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value == tag)
    }
}

/// Lenient wire shape; converted into `Note` with validation.
#[derive(Debug, Deserialize)]
struct NoteWire {
    id: NoteId,
    title: String,
    content: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    source_type: Option<SourceType>,
    created_at: String,
    #[serde(default)]
    updated_at: Option<String>,
}

impl TryFrom<NoteWire> for Note {
    type Error = NoteValidationError;

    fn try_from(wire: NoteWire) -> Result<Self, Self::Error> {
        let created_at = parse_timestamp(&wire.created_at).ok_or_else(|| {
            NoteValidationError::InvalidTimestamp {
                field: "created_at",
                value: wire.created_at.clone(),
            }
        })?;
        let updated_at = match wire.updated_at {
            Some(value) => {
                parse_timestamp(&value).ok_or(NoteValidationError::InvalidTimestamp {
                    field: "updated_at",
                    value,
                })?
            }
            None => created_at,
        };

        let note = Note {
            id: wire.id,
            title: wire.title,
            content: wire.content,
            tags: normalize_tags(wire.tags.unwrap_or_default()),
            source_url: wire.source_url.filter(|value| !value.trim().is_empty()),
            source_type: wire.source_type.unwrap_or_default(),
            created_at,
            updated_at,
        };
        note.validate()?;
        Ok(note)
    }
}

/// Client-built note payload without server-assigned identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub source_type: SourceType,
}

impl NoteDraft {
    /// Creates a manual draft without tags.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            source_url: None,
            source_type: SourceType::Manual,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn with_source(mut self, source_type: SourceType, source_url: Option<String>) -> Self {
        self.source_type = source_type;
        self.source_url = source_url;
        self
    }

    /// Checks required fields before any remote call is issued.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_text_fields(Some(self.title.as_str()), Some(self.content.as_str()))
    }
}

/// Partial update payload. `None` fields are left untouched by the remote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
}

impl NotePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = Some(normalize_tags(tags));
        self
    }

    pub fn source(mut self, source_type: SourceType, source_url: Option<String>) -> Self {
        self.source_type = Some(source_type);
        self.source_url = source_url;
        self
    }

    /// Returns whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.source_url.is_none()
            && self.source_type.is_none()
    }

    /// Rejects patches that would blank a required field.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_text_fields(self.title.as_deref(), self.content.as_deref())
    }

    /// Full payload for `note` with this patch applied.
    ///
    /// Unset fields keep the current value of `note`, including its
    /// `source_url`.
    pub fn apply_to(&self, note: &Note) -> NoteDraft {
        NoteDraft {
            title: self.title.clone().unwrap_or_else(|| note.title.clone()),
            content: self.content.clone().unwrap_or_else(|| note.content.clone()),
            tags: normalize_tags(self.tags.as_ref().unwrap_or(&note.tags)),
            source_url: self.source_url.clone().or_else(|| note.source_url.clone()),
            source_type: self.source_type.unwrap_or(note.source_type),
        }
    }
}

fn validate_text_fields(
    title: Option<&str>,
    content: Option<&str>,
) -> Result<(), NoteValidationError> {
    if title.is_some_and(|value| value.trim().is_empty()) {
        return Err(NoteValidationError::BlankTitle);
    }
    if content.is_some_and(|value| value.trim().is_empty()) {
        return Err(NoteValidationError::BlankContent);
    }
    Ok(())
}

/// Trims tags, drops blanks and removes duplicates keeping first occurrence.
///
/// Tags are case-sensitive: `Rust` and `rust` are distinct.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();
    for tag in tags {
        let trimmed = tag.as_ref().trim();
        if trimmed.is_empty() || !seen.insert(trimmed.to_string()) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    normalized
}

/// Parses wire timestamps.
///
/// Accepts RFC 3339, offset-less ISO date-times (assumed UTC, with `T` or
/// space separator) and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, parse_timestamp, Note, NoteId, NotePatch, SourceType};
    use chrono::{TimeZone, Utc};

    #[test]
    fn numeric_ids_order_numerically_before_text_ids() {
        let mut ids = vec![
            NoteId::new("abc").expect("valid id"),
            NoteId::from(10),
            NoteId::from(2),
            NoteId::new("9a").expect("valid id"),
        ];
        ids.sort();
        let rendered: Vec<&str> = ids.iter().map(NoteId::as_str).collect();
        assert_eq!(rendered, vec!["2", "10", "9a", "abc"]);
    }

    #[test]
    fn blank_id_is_rejected() {
        assert!(NoteId::new("   ").is_err());
    }

    #[test]
    fn normalize_tags_keeps_first_occurrence_order() {
        let tags = normalize_tags([" rust ", "", "notes", "rust", "Rust"]);
        assert_eq!(tags, vec!["rust", "notes", "Rust"]);
    }

    #[test]
    fn parse_timestamp_accepts_date_only_and_naive_forms() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-01T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-01 00:00:00.000"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-01T01:00:00+01:00"), Some(midnight));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn source_type_parses_case_insensitively() {
        assert_eq!("PDF".parse::<SourceType>(), Ok(SourceType::Pdf));
        assert!("coursera".parse::<SourceType>().is_err());
    }

    #[test]
    fn patch_rejects_blank_required_fields_only_when_present() {
        assert!(NotePatch::new().tags(["x"]).validate().is_ok());
        assert!(NotePatch::new().title("  ").validate().is_err());
        assert!(NotePatch::new().content("").validate().is_err());
    }

    #[test]
    fn patch_applied_to_note_keeps_unset_fields() {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let note = Note::new(NoteId::from(1), "Old", "Body", created_at)
            .expect("valid note")
            .with_tags(["x"])
            .with_source(SourceType::Web, Some("https://example.com".to_string()));

        let draft = NotePatch::new().title("New").tags(["y", "y"]).apply_to(&note);
        assert_eq!(draft.title, "New");
        assert_eq!(draft.content, "Body");
        assert_eq!(draft.tags, vec!["y"]);
        assert_eq!(draft.source_type, SourceType::Web);
        assert_eq!(draft.source_url.as_deref(), Some("https://example.com"));
    }
}
