//! In-process remote fake.
//!
//! # Responsibility
//! - Behave like the remote note service: assign ids, stamp timestamps and
//!   merge partial updates server-side.
//! - Support failure injection and call counting for tests and demos.
//!
//! # Invariants
//! - Ids are sequential and never reused after deletion.
//! - `updated_at` never precedes `created_at`.

use crate::gateway::{GatewayError, GatewayResult, NotesGateway};
use crate::model::note::{Note, NoteDraft, NoteId, NotePatch};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

const NOT_FOUND_MESSAGE: &str = "Note not found";
const UNPROCESSABLE_STATUS: u16 = 422;

/// Gateway call kind, used for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Display for GatewayOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(label)
    }
}

#[derive(Default)]
struct MemoryState {
    notes: BTreeMap<NoteId, Note>,
    next_id: u64,
    failures: HashMap<GatewayOp, VecDeque<GatewayError>>,
    calls: HashMap<GatewayOp, usize>,
}

impl MemoryState {
    fn enter(&mut self, op: GatewayOp) -> GatewayResult<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn allocate_id(&mut self) -> NoteId {
        self.next_id += 1;
        NoteId::from(self.next_id)
    }
}

/// Remote note collection held in process memory.
#[derive(Default)]
pub struct InMemoryNotesGateway {
    state: Mutex<MemoryState>,
}

impl InMemoryNotesGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway pre-populated with remote notes.
    ///
    /// Fresh ids continue after the largest numeric seeded id.
    pub fn with_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let gateway = Self::new();
        for note in notes {
            gateway.insert_remote(note);
        }
        gateway
    }

    /// Inserts or replaces a note on the remote side without a client call,
    /// as another client would.
    pub fn insert_remote(&self, note: Note) {
        let mut state = self.lock();
        if let Ok(numeric) = note.id.as_str().parse::<u64>() {
            state.next_id = state.next_id.max(numeric);
        }
        state.notes.insert(note.id.clone(), note);
    }

    /// Removes a note on the remote side without a client call.
    pub fn remove_remote(&self, id: &NoteId) -> Option<Note> {
        self.lock().notes.remove(id)
    }

    /// Makes the next call of `op` fail with `err`. Failures queue up.
    pub fn fail_next(&self, op: GatewayOp, err: GatewayError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Number of calls issued for `op`, including failed ones.
    pub fn calls(&self, op: GatewayOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Remote-side collection, ordered by id.
    pub fn snapshot(&self) -> Vec<Note> {
        self.lock().notes.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unprocessable(message: String) -> GatewayError {
    GatewayError::Remote {
        status: UNPROCESSABLE_STATUS,
        message: Some(message),
    }
}

fn not_found() -> GatewayError {
    GatewayError::NotFound(Some(NOT_FOUND_MESSAGE.to_string()))
}

impl NotesGateway for InMemoryNotesGateway {
    async fn list(&self) -> GatewayResult<Vec<Note>> {
        let mut state = self.lock();
        state.enter(GatewayOp::List)?;
        Ok(state.notes.values().cloned().collect())
    }

    async fn get(&self, id: &NoteId) -> GatewayResult<Note> {
        let mut state = self.lock();
        state.enter(GatewayOp::Get)?;
        state.notes.get(id).cloned().ok_or_else(not_found)
    }

    async fn create(&self, draft: &NoteDraft) -> GatewayResult<Note> {
        let mut state = self.lock();
        state.enter(GatewayOp::Create)?;
        draft
            .validate()
            .map_err(|err| unprocessable(err.to_string()))?;

        let id = state.allocate_id();
        let note = Note::new(id, draft.title.clone(), draft.content.clone(), Utc::now())
            .map_err(|err| unprocessable(err.to_string()))?
            .with_tags(&draft.tags)
            .with_source(draft.source_type, draft.source_url.clone());
        state.notes.insert(note.id.clone(), note.clone());
        Ok(note)
    }

    async fn update(&self, id: &NoteId, patch: &NotePatch) -> GatewayResult<Note> {
        let mut state = self.lock();
        state.enter(GatewayOp::Update)?;
        let current = state.notes.get(id).cloned().ok_or_else(not_found)?;

        let merged = patch.apply_to(&current);
        let mut next = current;
        next.title = merged.title;
        next.content = merged.content;
        next.tags = merged.tags;
        next.source_type = merged.source_type;
        next.source_url = merged.source_url;
        next.updated_at = Utc::now().max(next.created_at);
        next
            .validate()
            .map_err(|err| unprocessable(err.to_string()))?;

        state.notes.insert(id.clone(), next.clone());
        Ok(next)
    }

    async fn delete(&self, id: &NoteId) -> GatewayResult<()> {
        let mut state = self.lock();
        state.enter(GatewayOp::Delete)?;
        state.notes.remove(id).map(|_| ()).ok_or_else(not_found)
    }
}
