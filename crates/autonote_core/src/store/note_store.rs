//! Note collection store.
//!
//! # Responsibility
//! - Mirror the remote collection as last acknowledged by the gateway.
//! - Hold the focus reference (the note being viewed or edited).
//! - Wrap each gateway call in the status machine and apply its result.
//!
//! # Invariants
//! - The mirror never holds two entries with the same id.
//! - Successful results replace whole entries; patches are never merged
//!   locally.
//! - The focus reference always points at an entry present in the mirror.
//! - Failed operations leave the mirror untouched and record their error in
//!   the class status.
//! - Results of one class are applied in resolution order. A slower, older
//!   response can overwrite a newer one; there is no sequencing token.
//!
//! # See also
//! - DESIGN.md (Note Collection Store)

use crate::gateway::{GatewayError, NotesGateway};
use crate::model::note::{normalize_tags, Note, NoteDraft, NoteId, NotePatch, NoteValidationError};
use crate::store::status::{OperationClass, OperationStatus, StatusBoard};
use crate::view::projection::{project, tag_universe, ViewQuery};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation failure.
///
/// Every variant except `UnknownNote` is also recorded in the status of its
/// operation class.
#[derive(Debug)]
pub enum StoreError {
    /// Local validation failed; the gateway was not called.
    Validation {
        class: OperationClass,
        error: NoteValidationError,
    },
    /// Gateway call failed; `message` is the user-facing description.
    Gateway {
        class: OperationClass,
        message: String,
        source: GatewayError,
    },
    /// Focus requested for an id absent from the mirror (caller bug).
    UnknownNote(NoteId),
}

impl StoreError {
    pub fn class(&self) -> Option<OperationClass> {
        match self {
            Self::Validation { class, .. } | Self::Gateway { class, .. } => Some(*class),
            Self::UnknownNote(_) => None,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { error, .. } => write!(f, "{error}"),
            Self::Gateway { message, .. } => write!(f, "{message}"),
            Self::UnknownNote(id) => write!(f, "note not in collection: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation { error, .. } => Some(error),
            Self::Gateway { source, .. } => Some(source),
            Self::UnknownNote(_) => None,
        }
    }
}

/// Derives the user-facing message recorded for a failed gateway call.
///
/// The server message wins when present; otherwise the class fallback is
/// used, qualified by a generic cause for non-remote failures.
pub fn describe_failure(class: OperationClass, err: &GatewayError) -> String {
    if let Some(message) = err.server_message() {
        return message.to_string();
    }
    let fallback = class.fallback_message();
    match err {
        GatewayError::Transport(_) => format!("{fallback}: network error"),
        GatewayError::Timeout => format!("{fallback}: request timed out"),
        GatewayError::Malformed(_) => format!("{fallback}: unexpected response from server"),
        GatewayError::Unauthorized(_) => format!("{fallback}: not authorized"),
        GatewayError::NotFound(_) | GatewayError::Remote { .. } => fallback.to_string(),
    }
}

#[derive(Debug, Default)]
struct Collection {
    notes: BTreeMap<NoteId, Note>,
    focus: Option<NoteId>,
}

impl Collection {
    /// Swaps in a full snapshot. Rejects snapshots with duplicate ids and
    /// leaves the current mirror untouched in that case.
    fn replace_all(&mut self, notes: Vec<Note>) -> Result<usize, NoteId> {
        let mut mirror = BTreeMap::new();
        for note in notes {
            if let Some(duplicate) = mirror.insert(note.id.clone(), note) {
                return Err(duplicate.id);
            }
        }
        self.notes = mirror;
        if self
            .focus
            .as_ref()
            .is_some_and(|id| !self.notes.contains_key(id))
        {
            self.focus = None;
        }
        Ok(self.notes.len())
    }

    fn upsert_and_focus(&mut self, note: Note) {
        self.focus = Some(note.id.clone());
        self.notes.insert(note.id.clone(), note);
    }

    fn replace_existing(&mut self, note: Note) -> bool {
        match self.notes.get_mut(&note.id) {
            Some(entry) => {
                *entry = note;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: &NoteId) -> bool {
        if self.focus.as_ref() == Some(id) {
            self.focus = None;
        }
        self.notes.remove(id).is_some()
    }
}

/// Owned, injectable note collection store.
///
/// Not `Sync`: operations interleave cooperatively on one thread. Several
/// stores can coexist, each with its own gateway and mirror.
pub struct NoteStore<G> {
    gateway: G,
    collection: RefCell<Collection>,
    statuses: watch::Sender<StatusBoard>,
}

impl<G: NotesGateway> NoteStore<G> {
    /// Creates a store with an empty mirror and idle statuses.
    pub fn new(gateway: G) -> Self {
        let (statuses, _) = watch::channel(StatusBoard::default());
        debug!("event=store_init module=store status=ok");
        Self {
            gateway,
            collection: RefCell::new(Collection::default()),
            statuses,
        }
    }

    /// Replaces the whole mirror with the remote collection.
    ///
    /// On failure the mirror is unchanged. Returns the number of notes held.
    pub async fn load_all(&self) -> StoreResult<usize> {
        let class = OperationClass::FetchAll;
        let request_id = self.begin(class);
        let notes = self
            .gateway
            .list()
            .await
            .map_err(|err| self.reject(class, request_id, err))?;

        let replaced = self.collection.borrow_mut().replace_all(notes);
        match replaced {
            Ok(count) => {
                self.fulfill(class, request_id);
                info!("event=mirror_replaced module=store status=ok notes={count}");
                Ok(count)
            }
            Err(duplicate) => Err(self.reject(
                class,
                request_id,
                GatewayError::Malformed(format!("duplicate note id `{duplicate}` in collection")),
            )),
        }
    }

    /// Fetches one note, upserts it and focuses it.
    pub async fn load_one(&self, id: &NoteId) -> StoreResult<Note> {
        let class = OperationClass::FetchOne;
        let request_id = self.begin(class);
        let note = self
            .gateway
            .get(id)
            .await
            .map_err(|err| self.reject(class, request_id, err))?;
        let note = self.expect_identity(class, request_id, id, note)?;

        self.collection.borrow_mut().upsert_and_focus(note.clone());
        self.fulfill(class, request_id);
        Ok(note)
    }

    /// Creates a note from a draft, inserts the remote result and focuses it.
    ///
    /// Drafts with a blank title or content are rejected without a gateway
    /// call.
    pub async fn create(&self, mut draft: NoteDraft) -> StoreResult<Note> {
        let class = OperationClass::Create;
        let request_id = self.begin(class);
        draft.tags = normalize_tags(&draft.tags);
        if let Err(error) = draft.validate() {
            return Err(self.reject_locally(class, request_id, error));
        }

        let note = self
            .gateway
            .create(&draft)
            .await
            .map_err(|err| self.reject(class, request_id, err))?;

        debug!(
            "event=note_created module=store request_id={request_id} note_id={}",
            note.id
        );
        self.collection.borrow_mut().upsert_and_focus(note.clone());
        self.fulfill(class, request_id);
        Ok(note)
    }

    /// Sends a partial update and replaces the mirror entry with the full
    /// note returned by the remote.
    ///
    /// A focused note is refreshed implicitly. If the entry left the mirror
    /// while the request was in flight it is not re-inserted.
    pub async fn update(&self, id: &NoteId, patch: NotePatch) -> StoreResult<Note> {
        let class = OperationClass::Update;
        let request_id = self.begin(class);
        if let Err(error) = patch.validate() {
            return Err(self.reject_locally(class, request_id, error));
        }

        let note = self
            .gateway
            .update(id, &patch)
            .await
            .map_err(|err| self.reject(class, request_id, err))?;
        let note = self.expect_identity(class, request_id, id, note)?;

        if !self.collection.borrow_mut().replace_existing(note.clone()) {
            debug!(
                "event=update_not_mirrored module=store request_id={request_id} note_id={id}"
            );
        }
        self.fulfill(class, request_id);
        Ok(note)
    }

    /// Deletes a note remotely, then drops it from the mirror and clears a
    /// matching focus.
    pub async fn remove(&self, id: &NoteId) -> StoreResult<()> {
        let class = OperationClass::Delete;
        let request_id = self.begin(class);
        self.gateway
            .delete(id)
            .await
            .map_err(|err| self.reject(class, request_id, err))?;

        let removed = self.collection.borrow_mut().remove(id);
        debug!(
            "event=note_removed module=store request_id={request_id} note_id={id} mirrored={removed}"
        );
        self.fulfill(class, request_id);
        Ok(())
    }

    /// Clears the error of one class without any remote call.
    pub fn clear_error(&self, class: OperationClass) {
        self.statuses.send_modify(|board| board.clear_error(class));
        debug!("event=error_cleared module=store class={class}");
    }

    /// Sets or clears the focus reference.
    ///
    /// Focusing an id absent from the mirror is a caller bug: the focus is
    /// left unchanged and `StoreError::UnknownNote` is returned. No status
    /// records it.
    pub fn set_focus(&self, id: Option<&NoteId>) -> StoreResult<()> {
        let mut collection = self.collection.borrow_mut();
        match id {
            None => {
                collection.focus = None;
                Ok(())
            }
            Some(id) if collection.notes.contains_key(id) => {
                collection.focus = Some(id.clone());
                Ok(())
            }
            Some(id) => {
                warn!("event=focus_rejected module=store status=error note_id={id}");
                Err(StoreError::UnknownNote(id.clone()))
            }
        }
    }

    /// Mirror contents ordered by id.
    pub fn notes(&self) -> Vec<Note> {
        self.collection.borrow().notes.values().cloned().collect()
    }

    pub fn note(&self, id: &NoteId) -> Option<Note> {
        self.collection.borrow().notes.get(id).cloned()
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.collection.borrow().notes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.collection.borrow().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.borrow().notes.is_empty()
    }

    /// Currently focused note.
    pub fn focus(&self) -> Option<Note> {
        let collection = self.collection.borrow();
        collection
            .focus
            .as_ref()
            .and_then(|id| collection.notes.get(id))
            .cloned()
    }

    pub fn focus_id(&self) -> Option<NoteId> {
        self.collection.borrow().focus.clone()
    }

    pub fn status(&self, class: OperationClass) -> OperationStatus {
        self.statuses.borrow().get(class).clone()
    }

    pub fn statuses(&self) -> StatusBoard {
        self.statuses.borrow().clone()
    }

    /// Any operation class has requests in flight.
    pub fn is_loading(&self) -> bool {
        self.statuses.borrow().is_loading()
    }

    /// Most recent error still recorded, with its class.
    pub fn error(&self) -> Option<(OperationClass, String)> {
        self.statuses
            .borrow()
            .latest_error()
            .map(|(class, message)| (class, message.to_string()))
    }

    /// Receiver notified on every status transition.
    pub fn subscribe(&self) -> watch::Receiver<StatusBoard> {
        self.statuses.subscribe()
    }

    /// Freshly computed filtered and sorted projection of the mirror.
    pub fn view(&self, query: &ViewQuery) -> Vec<Note> {
        let collection = self.collection.borrow();
        project(collection.notes.values(), query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every tag used across the unfiltered mirror.
    pub fn tag_universe(&self) -> Vec<String> {
        tag_universe(self.collection.borrow().notes.values())
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    fn begin(&self, class: OperationClass) -> Uuid {
        let request_id = Uuid::new_v4();
        self.statuses.send_modify(|board| board.begin(class));
        debug!("event=op_start module=store class={class} request_id={request_id}");
        request_id
    }

    fn fulfill(&self, class: OperationClass, request_id: Uuid) {
        self.statuses.send_modify(|board| board.fulfill(class));
        info!("event=op_fulfilled module=store status=ok class={class} request_id={request_id}");
    }

    fn reject(&self, class: OperationClass, request_id: Uuid, err: GatewayError) -> StoreError {
        let message = describe_failure(class, &err);
        self.statuses
            .send_modify(|board| board.reject(class, message.clone()));
        warn!(
            "event=op_rejected module=store status=error class={class} request_id={request_id} kind={}",
            err.kind()
        );
        StoreError::Gateway {
            class,
            message,
            source: err,
        }
    }

    fn reject_locally(
        &self,
        class: OperationClass,
        request_id: Uuid,
        error: NoteValidationError,
    ) -> StoreError {
        self.statuses
            .send_modify(|board| board.reject(class, error.to_string()));
        warn!(
            "event=op_rejected module=store status=invalid class={class} request_id={request_id} kind=validation"
        );
        StoreError::Validation { class, error }
    }

    fn expect_identity(
        &self,
        class: OperationClass,
        request_id: Uuid,
        expected: &NoteId,
        note: Note,
    ) -> StoreResult<Note> {
        if note.id == *expected {
            return Ok(note);
        }
        let details = format!("expected note `{expected}`, got `{}`", note.id);
        Err(self.reject(class, request_id, GatewayError::Malformed(details)))
    }
}

impl<G> Drop for NoteStore<G> {
    fn drop(&mut self) {
        let notes = self.collection.get_mut().notes.len();
        debug!("event=store_dispose module=store notes={notes}");
    }
}
