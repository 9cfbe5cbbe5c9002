//! Per-operation lifecycle tracking.
//!
//! # Responsibility
//! - Model `idle -> pending -> fulfilled|rejected` for each operation class.
//! - Keep class statuses independent and aggregate them for callers.
//!
//! # Invariants
//! - Entering `pending` clears the class's previous error message.
//! - `fulfilled`/`rejected` persist until the class is invoked again; only
//!   `clear_error` neutralizes a rejection without a new request.
//! - Several requests of one class may be in flight; `phase` reflects the
//!   latest transition, `in_flight` counts unresolved requests.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Logical operation class with independent status tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationClass {
    FetchAll,
    FetchOne,
    Create,
    Update,
    Delete,
}

impl OperationClass {
    pub const ALL: [OperationClass; 5] = [
        Self::FetchAll,
        Self::FetchOne,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchAll => "fetch_all",
            Self::FetchOne => "fetch_one",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Generic user-facing message used when the remote gives none.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::FetchAll => "Failed to fetch notes",
            Self::FetchOne => "Failed to fetch note",
            Self::Create => "Failed to create note",
            Self::Update => "Failed to update note",
            Self::Delete => "Failed to delete note",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::FetchAll => 0,
            Self::FetchOne => 1,
            Self::Create => 2,
            Self::Update => 3,
            Self::Delete => 4,
        }
    }
}

impl Display for OperationClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of one operation class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// Status record for one operation class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStatus {
    phase: Phase,
    error_message: Option<String>,
    in_flight: usize,
    changed_at: u64,
}

impl OperationStatus {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Requests issued for this class that have not resolved yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_pending(&self) -> bool {
        self.phase == Phase::Pending
    }

    /// A new request was issued.
    pub fn begin(&mut self) {
        self.phase = Phase::Pending;
        self.error_message = None;
        self.in_flight += 1;
    }

    /// A request resolved successfully.
    pub fn fulfill(&mut self) {
        self.phase = Phase::Fulfilled;
        self.error_message = None;
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// A request failed with a human-readable message.
    pub fn reject(&mut self, message: impl Into<String>) {
        self.phase = Phase::Rejected;
        self.error_message = Some(message.into());
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Drops the error; a rejected phase returns to idle.
    pub fn clear_error(&mut self) {
        self.error_message = None;
        if self.phase == Phase::Rejected {
            self.phase = Phase::Idle;
        }
    }
}

/// Statuses of every operation class plus aggregate views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBoard {
    statuses: [OperationStatus; 5],
    revision: u64,
}

impl StatusBoard {
    pub fn get(&self, class: OperationClass) -> &OperationStatus {
        &self.statuses[class.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (OperationClass, &OperationStatus)> {
        OperationClass::ALL
            .into_iter()
            .map(move |class| (class, self.get(class)))
    }

    /// Number of transitions recorded so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Any class has unresolved requests.
    pub fn is_loading(&self) -> bool {
        self.statuses.iter().any(|status| status.in_flight > 0)
    }

    /// Most recently recorded error that is still present.
    pub fn latest_error(&self) -> Option<(OperationClass, &str)> {
        self.iter()
            .filter_map(|(class, status)| {
                status
                    .error_message()
                    .map(|message| (status.changed_at, class, message))
            })
            .max_by_key(|(changed_at, _, _)| *changed_at)
            .map(|(_, class, message)| (class, message))
    }

    pub(crate) fn begin(&mut self, class: OperationClass) {
        self.transition(class, OperationStatus::begin);
    }

    pub(crate) fn fulfill(&mut self, class: OperationClass) {
        self.transition(class, OperationStatus::fulfill);
    }

    pub(crate) fn reject(&mut self, class: OperationClass, message: String) {
        self.transition(class, |status| status.reject(message));
    }

    pub(crate) fn clear_error(&mut self, class: OperationClass) {
        self.transition(class, OperationStatus::clear_error);
    }

    fn transition(&mut self, class: OperationClass, apply: impl FnOnce(&mut OperationStatus)) {
        self.revision += 1;
        let status = &mut self.statuses[class.index()];
        apply(status);
        status.changed_at = self.revision;
    }
}
