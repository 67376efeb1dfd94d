use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Errors surfaced by the task lifecycle layer.
///
/// Store failures are wrapped rather than flattened so callers can tell a
/// lifecycle rule violation (for example completing a non-recurring task)
/// apart from the backing store being unhappy.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The id is not present in the in-memory collection.
    #[error("Task not found: {0}")]
    NotFound(Uuid),

    /// The backing record store failed.
    #[error("Store error")]
    Store(#[from] StoreError),

    /// A mutating operation was attempted before an owner was bound.
    #[error("No owner is bound; fetch tasks for an owner first")]
    NoOwner,

    /// The recurrence policy was asked to advance a non-recurring task.
    #[error("Task {0} is not recurring")]
    NotRecurring(Uuid),

    /// The next occurrence could not be computed.
    #[error("Recurrence error: {0}")]
    Recurrence(String),

    /// A wire record could not be converted to or from a task.
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// User-supplied input was rejected before reaching the store.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A short id prefix matched more than one task.
    #[error("Ambiguous id matches {} tasks", .0.len())]
    AmbiguousId(Vec<(Uuid, String)>),
}
