//! Read-only presentation projections over the mirror.
//!
//! # Responsibility
//! - Filter and sort notes for list presentation.
//! - Derive plain-text excerpts from rich-markup content.
//!
//! # Invariants
//! - Projections never mutate their input and are recomputed on every call.
//!
//! # See also
//! - DESIGN.md (Derived View Engine)

pub mod excerpt;
pub mod projection;
