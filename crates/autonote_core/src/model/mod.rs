//! Note entity model shared by the gateway, store and view layers.
//!
//! # Responsibility
//! - Define the canonical shape of a persisted note and its identity.
//! - Define client-side payloads (`NoteDraft`, `NotePatch`) sent to the remote.
//!
//! # Invariants
//! - Every note is identified by a stable, server-assigned `NoteId`.
//! - `updated_at >= created_at` for every decoded note.
//! - Malformed wire payloads are rejected at decode time.
//!
//! # See also
//! - DESIGN.md (Entity Model)

pub mod note;
