//! Core client-side note collection logic for AutoNote.
//! This crate owns the local mirror of the remote collection, the lifecycle
//! of remote mutations and the derived views over the mirror.

pub mod gateway;
pub mod logging;
pub mod model;
pub mod store;
pub mod view;

pub use gateway::config::{ConfigError, GatewayConfig};
pub use gateway::http::HttpNotesGateway;
pub use gateway::memory::{GatewayOp, InMemoryNotesGateway};
pub use gateway::session::Session;
pub use gateway::{GatewayError, GatewayResult, NotesGateway};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingConfig};
pub use model::note::{
    normalize_tags, parse_timestamp, Note, NoteDraft, NoteId, NotePatch, NoteValidationError,
    SourceType,
};
pub use store::note_store::{describe_failure, NoteStore, StoreError, StoreResult};
pub use store::status::{OperationClass, OperationStatus, Phase, StatusBoard};
pub use view::excerpt::{excerpt, DEFAULT_EXCERPT_CHARS};
pub use view::projection::{compare, project, tag_universe, SortKey, UnknownSortKey, ViewQuery};
