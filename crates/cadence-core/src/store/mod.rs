//! Record-oriented persistence boundary.
//!
//! The lifecycle layer never speaks SQL. It hands the store encoded records
//! (see [`crate::codec`]) and a small filter language covering what the
//! manager actually queries: equality, id sets, a two-clause OR, and
//! ordering by a timestamp field.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::codec::WireRecord;

pub mod memory;
pub mod sqlite;

pub use memory::{MemoryStore, StoreOp};
pub use sqlite::SqliteStore;

/// The single collection the task manager persists into.
pub const TASKS: &str = "tasks";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("No record with id {0}")]
    MissingRecord(Uuid),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Unsupported field: {0}")]
    UnsupportedField(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A predicate over persisted records. Fields absent from a record never
/// match, the persisted `null` included.
#[derive(Debug, Clone)]
pub enum Match {
    /// Field equals the given value.
    Eq(&'static str, Value),
    /// Field equals one of the given values.
    In(&'static str, Vec<Value>),
    /// Either branch matches.
    Either(Box<Match>, Box<Match>),
}

impl Match {
    pub fn matches(&self, record: &WireRecord) -> bool {
        match self {
            Match::Eq(field, value) => record.get(*field).is_some_and(|v| v == value),
            Match::In(field, values) => record.get(*field).is_some_and(|v| values.contains(v)),
            Match::Either(a, b) => a.matches(record) || b.matches(record),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrderBy {
    pub field: &'static str,
    pub descending: bool,
}

/// What to fetch: a predicate plus an optional ordering.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    pub matching: Match,
    pub order_by: Option<OrderBy>,
}

impl RecordFilter {
    pub fn new(matching: Match) -> Self {
        Self {
            matching,
            order_by: None,
        }
    }

    pub fn ordered_by(mut self, field: &'static str, descending: bool) -> Self {
        self.order_by = Some(OrderBy { field, descending });
        self
    }
}

/// A collection-addressed record store.
///
/// Records are JSON objects keyed by persisted field names. Implementations
/// assign the id and creation stamp on insert when the caller did not, and
/// report an update or delete of an absent id as [`StoreError::MissingRecord`].
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn query(
        &self,
        collection: &str,
        filter: RecordFilter,
    ) -> Result<Vec<WireRecord>, StoreError>;

    /// Inserts a record and returns it as stored.
    async fn insert(&self, collection: &str, record: WireRecord)
        -> Result<WireRecord, StoreError>;

    /// Merges the patch fields into the record with the given id.
    async fn update(&self, collection: &str, id: Uuid, patch: WireRecord)
        -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError>;

    /// Deletes every listed id that exists. Absent ids are skipped; an empty
    /// list is a no-op.
    async fn delete_many(&self, collection: &str, ids: &[Uuid]) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(entries: &[(&str, Value)]) -> WireRecord {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn eq_matches_on_value() {
        let rec = record(&[("status", json!("done"))]);

        assert!(Match::Eq("status", json!("done")).matches(&rec));
        assert!(!Match::Eq("status", json!("todo")).matches(&rec));
    }

    #[test]
    fn missing_field_never_matches() {
        let rec = record(&[("status", json!("done"))]);

        assert!(!Match::Eq("owner_id", json!("x")).matches(&rec));
        assert!(!Match::In("owner_id", vec![json!("x")]).matches(&rec));
    }

    #[test]
    fn in_matches_any_listed_value() {
        let rec = record(&[("id", json!("b"))]);

        assert!(Match::In("id", vec![json!("a"), json!("b")]).matches(&rec));
        assert!(!Match::In("id", vec![json!("a"), json!("c")]).matches(&rec));
        assert!(!Match::In("id", Vec::new()).matches(&rec));
    }

    #[test]
    fn either_matches_when_one_branch_does() {
        let rec = record(&[("id", json!("root"))]);
        let filter = Match::Either(
            Box::new(Match::Eq("id", json!("root"))),
            Box::new(Match::Eq("recurring_template_id", json!("root"))),
        );

        assert!(filter.matches(&rec));

        let other = record(&[("recurring_template_id", json!("root"))]);
        assert!(filter.matches(&other));

        let neither = record(&[("id", json!("leaf"))]);
        assert!(!filter.matches(&neither));
    }
}
