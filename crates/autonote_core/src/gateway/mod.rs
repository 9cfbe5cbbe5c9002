//! Remote notes gateway contract and implementations.
//!
//! # Responsibility
//! - Define the boundary between the store and the remote note collection.
//! - Classify every failure into a typed `GatewayError`.
//!
//! # Invariants
//! - Gateways return fully-formed, validated `Note` values or an error;
//!   malformed payloads never cross this boundary.
//! - Timeouts and transport failures resolve as errors; calls never hang
//!   beyond the configured timeout.
//!
//! # See also
//! - DESIGN.md (Remote Notes Gateway)

use crate::model::note::{Note, NoteDraft, NoteId, NotePatch};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;

pub mod config;
pub mod http;
pub mod memory;
pub mod session;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure reported by a gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Remote unreachable or connection dropped.
    Transport(String),
    /// Request exceeded the configured timeout.
    Timeout,
    /// Credential missing, expired or rejected (401).
    Unauthorized(Option<String>),
    /// Target note does not exist (404).
    NotFound(Option<String>),
    /// Any other non-success response.
    Remote {
        status: u16,
        message: Option<String>,
    },
    /// Response body could not be decoded into the expected shape.
    Malformed(String),
}

impl GatewayError {
    /// Server-provided message, when the remote sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(message) | Self::NotFound(message) => message.as_deref(),
            Self::Remote { message, .. } => message.as_deref(),
            Self::Transport(_) | Self::Timeout | Self::Malformed(_) => None,
        }
    }

    /// Stable short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout => "timeout",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Remote { .. } => "remote",
            Self::Malformed(_) => "malformed",
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(details) => write!(f, "transport error: {details}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Unauthorized(message) => match message {
                Some(message) => write!(f, "unauthorized: {message}"),
                None => write!(f, "unauthorized"),
            },
            Self::NotFound(message) => match message {
                Some(message) => write!(f, "not found: {message}"),
                None => write!(f, "not found"),
            },
            Self::Remote { status, message } => match message {
                Some(message) => write!(f, "remote error {status}: {message}"),
                None => write!(f, "remote error {status}"),
            },
            Self::Malformed(details) => write!(f, "malformed response: {details}"),
        }
    }
}

impl Error for GatewayError {}

/// Remote note collection operations.
///
/// Futures carry no `Send` bound: the store drives them cooperatively on one
/// logical thread.
pub trait NotesGateway {
    /// Returns the full current collection.
    fn list(&self) -> impl Future<Output = GatewayResult<Vec<Note>>>;
    /// Returns one note by id.
    fn get(&self, id: &NoteId) -> impl Future<Output = GatewayResult<Note>>;
    /// Creates a note and returns it with server-assigned id and timestamps.
    fn create(&self, draft: &NoteDraft) -> impl Future<Output = GatewayResult<Note>>;
    /// Applies a partial update and returns the full updated note.
    fn update(&self, id: &NoteId, patch: &NotePatch)
        -> impl Future<Output = GatewayResult<Note>>;
    /// Deletes a note; resolves once the remote acknowledged it.
    fn delete(&self, id: &NoteId) -> impl Future<Output = GatewayResult<()>>;
}
