//! Client-side note collection store.
//!
//! # Responsibility
//! - Own the local mirror of the remote collection and the focus reference.
//! - Drive every remote call through the per-class status machine.
//!
//! # Invariants
//! - Only the store mutates the mirror and the focus reference.
//! - The mirror reflects acknowledged remote state; nothing is applied
//!   optimistically.
//!
//! # See also
//! - DESIGN.md (Note Collection Store, Mutation State Machine)

pub mod note_store;
pub mod status;
