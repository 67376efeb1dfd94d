//! In-memory store used by tests and offline runs.
//!
//! Mirrors the SQLite store's observable behavior down to id assignment and
//! missing-record errors, and can additionally be armed to fail the next
//! matching operation, which is how the lifecycle tests reach the rollback
//! and reconciliation paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{RecordFilter, StoreError, TaskStore};
use crate::codec::{wire, WireRecord};

/// Which store operation a failure rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Query,
    Insert,
    Update,
    Delete,
    DeleteMany,
}

#[derive(Debug)]
struct FailRule {
    op: StoreOp,
    id: Option<Uuid>,
    message: String,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, Vec<WireRecord>>,
    fail_rules: Vec<FailRule>,
}

impl Inner {
    fn take_failure(&mut self, op: StoreOp, id: Option<Uuid>) -> Option<StoreError> {
        let position = self
            .fail_rules
            .iter()
            .position(|rule| rule.op == op && (rule.id.is_none() || rule.id == id))?;
        let rule = self.fail_rules.remove(position);
        Some(StoreError::Unavailable(rule.message))
    }
}

/// Clonable handle to a shared in-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot failure for the next matching operation. A rule
    /// carrying an id fires only for that record; a rule without one fires
    /// for whichever matching operation comes first. Rules are consumed when
    /// they fire.
    pub fn fail_next(&self, op: StoreOp, id: Option<Uuid>, message: &str) {
        self.lock().fail_rules.push(FailRule {
            op,
            id,
            message: message.to_string(),
        });
    }

    /// Number of records currently held in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Snapshot of a collection's raw records.
    pub fn dump(&self, collection: &str) -> Vec<WireRecord> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// The raw record with the given id, if present.
    pub fn find(&self, collection: &str, id: Uuid) -> Option<WireRecord> {
        self.lock().collections.get(collection).and_then(|records| {
            records
                .iter()
                .find(|record| record_id(record) == Some(id))
                .cloned()
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn record_id(record: &WireRecord) -> Option<Uuid> {
    record
        .get(wire::ID)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// Ordering key for a timestamp field. Records are compared as parsed
/// instants rather than as strings so offset and mixed-precision stamps
/// still sort chronologically.
fn order_key(record: &WireRecord, field: &str) -> Option<DateTime<Utc>> {
    record
        .get(field)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn query(
        &self,
        collection: &str,
        filter: RecordFilter,
    ) -> Result<Vec<WireRecord>, StoreError> {
        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(StoreOp::Query, None) {
            return Err(err);
        }

        let mut records: Vec<WireRecord> = inner
            .collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filter.matching.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = filter.order_by {
            records.sort_by_key(|record| order_key(record, order.field));
            if order.descending {
                records.reverse();
            }
        }
        Ok(records)
    }

    async fn insert(
        &self,
        collection: &str,
        record: WireRecord,
    ) -> Result<WireRecord, StoreError> {
        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(StoreOp::Insert, record_id(&record)) {
            return Err(err);
        }

        let mut stored = record;
        if !stored.contains_key(wire::ID) {
            stored.insert(
                wire::ID.to_string(),
                Value::String(Uuid::now_v7().to_string()),
            );
        }
        if !stored.contains_key(wire::CREATED_AT) {
            stored.insert(
                wire::CREATED_AT.to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }

        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        patch: WireRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(StoreOp::Update, Some(id)) {
            return Err(err);
        }

        let record = inner
            .collections
            .get_mut(collection)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|record| record_id(record) == Some(id))
            })
            .ok_or(StoreError::MissingRecord(id))?;

        for (key, value) in patch {
            if key == wire::ID {
                continue;
            }
            record.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(StoreOp::Delete, Some(id)) {
            return Err(err);
        }

        let records = inner
            .collections
            .get_mut(collection)
            .ok_or(StoreError::MissingRecord(id))?;
        let before = records.len();
        records.retain(|record| record_id(record) != Some(id));
        if records.len() == before {
            return Err(StoreError::MissingRecord(id));
        }
        Ok(())
    }

    async fn delete_many(&self, collection: &str, ids: &[Uuid]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut inner = self.lock();
        if let Some(err) = inner.take_failure(StoreOp::DeleteMany, None) {
            return Err(err);
        }

        if let Some(records) = inner.collections.get_mut(collection) {
            records.retain(|record| record_id(record).map_or(true, |id| !ids.contains(&id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Match, TASKS};
    use serde_json::json;

    fn record(id: &str, start: &str) -> WireRecord {
        let mut rec = WireRecord::new();
        rec.insert(wire::ID.to_string(), json!(id));
        rec.insert(wire::START_TIME.to_string(), json!(start));
        rec
    }

    #[tokio::test]
    async fn insert_assigns_id_and_created_at() {
        let store = MemoryStore::new();
        let mut draft = WireRecord::new();
        draft.insert(wire::TITLE.to_string(), json!("Walk"));

        let stored = store.insert(TASKS, draft).await.unwrap();

        assert!(record_id(&stored).is_some());
        assert!(stored.contains_key(wire::CREATED_AT));
        assert_eq!(store.len(TASKS), 1);
    }

    #[tokio::test]
    async fn update_merges_patch_fields() {
        let store = MemoryStore::new();
        let stored = store.insert(TASKS, WireRecord::new()).await.unwrap();
        let id = record_id(&stored).unwrap();

        let mut patch = WireRecord::new();
        patch.insert(wire::TITLE.to_string(), json!("Renamed"));
        store.update(TASKS, id, patch).await.unwrap();

        let found = store.find(TASKS, id).unwrap();
        assert_eq!(found.get(wire::TITLE), Some(&json!("Renamed")));
        assert!(found.contains_key(wire::CREATED_AT));
    }

    #[tokio::test]
    async fn update_of_absent_id_is_reported() {
        let store = MemoryStore::new();
        let err = store
            .update(TASKS, Uuid::now_v7(), WireRecord::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingRecord(_)));
    }

    #[tokio::test]
    async fn delete_many_skips_absent_ids() {
        let store = MemoryStore::new();
        let stored = store.insert(TASKS, WireRecord::new()).await.unwrap();
        let id = record_id(&stored).unwrap();

        store
            .delete_many(TASKS, &[id, Uuid::now_v7()])
            .await
            .unwrap();

        assert!(store.is_empty(TASKS));
    }

    #[tokio::test]
    async fn query_orders_by_parsed_timestamp() {
        let store = MemoryStore::new();
        // An offset timestamp sorts wrongly as a string: lexicographically
        // `a` is the larger, but as an instant it is half an hour earlier.
        let a = Uuid::now_v7().to_string();
        let b = Uuid::now_v7().to_string();
        store
            .insert(TASKS, record(&a, "2025-03-10T10:00:00+01:00"))
            .await
            .unwrap();
        store
            .insert(TASKS, record(&b, "2025-03-10T09:30:00Z"))
            .await
            .unwrap();

        let filter = Match::In(
            wire::ID,
            vec![json!(a.clone()), json!(b.clone())],
        );
        let records = store
            .query(TASKS, RecordFilter::new(filter).ordered_by(wire::START_TIME, true))
            .await
            .unwrap();

        assert_eq!(records[0].get(wire::ID), Some(&json!(b)));
        assert_eq!(records[1].get(wire::ID), Some(&json!(a)));
    }

    #[tokio::test]
    async fn armed_failure_fires_once() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::Insert, None, "offline");

        let err = store.insert(TASKS, WireRecord::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        assert!(store.insert(TASKS, WireRecord::new()).await.is_ok());
    }

    #[tokio::test]
    async fn id_scoped_failure_spares_other_records() {
        let store = MemoryStore::new();
        let stored = store.insert(TASKS, WireRecord::new()).await.unwrap();
        let other = store.insert(TASKS, WireRecord::new()).await.unwrap();
        let target = record_id(&stored).unwrap();

        store.fail_next(StoreOp::Update, Some(target), "offline");

        // A different record updates fine and leaves the rule armed.
        store
            .update(TASKS, record_id(&other).unwrap(), WireRecord::new())
            .await
            .unwrap();
        let err = store
            .update(TASKS, target, WireRecord::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
