//! The task lifecycle manager.
//!
//! [`TaskManager`] owns an in-memory snapshot of one owner's tasks and keeps
//! it aligned with a [`TaskStore`]. Mutations follow an optimistic pattern:
//! the snapshot changes first, the store is told second, and disagreement is
//! resolved either by rolling back or by refetching, depending on what the
//! operation promises.
//!
//! Mutating operations are serialized through an internal async gate, so at
//! most one is in flight at a time. Reads never block on the gate: they see
//! the latest committed snapshot, which is swapped atomically as a whole.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, NaiveTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::codec::{self, wire};
use crate::error::CoreError;
use crate::models::{Recurrence, Task, TaskDraft, TaskPatch, TaskStatus, TransitionOutcome};
use crate::recurrence;
use crate::store::{Match, RecordFilter, TaskStore, TASKS};

#[derive(Debug, Default)]
struct ViewState {
    tasks: Arc<Vec<Task>>,
    owner: Option<Uuid>,
    loading: bool,
    last_error: Option<String>,
}

pub struct TaskManager<S: TaskStore> {
    store: S,
    state: RwLock<ViewState>,
    write_gate: tokio::sync::Mutex<()>,
}

impl<S: TaskStore> TaskManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: RwLock::new(ViewState::default()),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    fn read_state<T>(&self, f: impl FnOnce(&ViewState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn write_state<T>(&self, f: impl FnOnce(&mut ViewState) -> T) -> T {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// The latest committed snapshot of the collection.
    pub fn tasks(&self) -> Arc<Vec<Task>> {
        self.read_state(|s| Arc::clone(&s.tasks))
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<Task> {
        self.read_state(|s| s.tasks.iter().find(|t| t.id == id).cloned())
    }

    pub fn owner(&self) -> Option<Uuid> {
        self.read_state(|s| s.owner)
    }

    pub fn is_loading(&self) -> bool {
        self.read_state(|s| s.loading)
    }

    /// Message of the most recent failed operation, cleared when the next
    /// operation begins.
    pub fn last_error(&self) -> Option<String> {
        self.read_state(|s| s.last_error.clone())
    }

    fn replace_tasks(&self, tasks: Vec<Task>) {
        self.write_state(|s| s.tasks = Arc::new(tasks));
    }

    fn restore_tasks(&self, snapshot: Arc<Vec<Task>>) {
        self.write_state(|s| s.tasks = snapshot);
    }

    /// Clones the current snapshot, lets `f` edit the clone, and publishes
    /// it as the new snapshot. Readers only ever observe whole versions.
    fn mutate_tasks(&self, f: impl FnOnce(&mut Vec<Task>)) {
        self.write_state(|s| {
            let mut tasks = s.tasks.as_ref().clone();
            f(&mut tasks);
            s.tasks = Arc::new(tasks);
        });
    }

    fn begin_op(&self) {
        self.write_state(|s| s.last_error = None);
    }

    fn fail<T>(&self, err: CoreError) -> Result<T, CoreError> {
        self.write_state(|s| s.last_error = Some(err.to_string()));
        Err(err)
    }

    fn owner_filter(owner: Uuid) -> RecordFilter {
        RecordFilter::new(Match::Eq(
            wire::OWNER_ID,
            Value::String(owner.to_string()),
        ))
        .ordered_by(wire::START_TIME, false)
    }

    async fn fetch_into_state(&self, owner: Uuid) -> Result<(), CoreError> {
        let records = self.store.query(TASKS, Self::owner_filter(owner)).await?;
        let tasks = records
            .into_iter()
            .map(codec::decode_task)
            .collect::<Result<Vec<_>, _>>()?;
        self.replace_tasks(tasks);
        Ok(())
    }

    async fn refetch(&self) -> Result<(), CoreError> {
        let owner = self.owner().ok_or(CoreError::NoOwner)?;
        self.fetch_into_state(owner).await
    }

    /// Reconciliation fetch on an already-failing path. The original error
    /// wins; a failure here is only logged.
    async fn refetch_best_effort(&self) {
        if let Err(err) = self.refetch().await {
            warn!(error = %err, "reconciliation fetch failed");
        }
    }

    /// Loads the owner's tasks, replacing the snapshot wholesale, and binds
    /// the owner for every later operation.
    pub async fn fetch_all(&self, owner: Uuid) -> Result<(), CoreError> {
        let _gate = self.write_gate.lock().await;
        self.write_state(|s| {
            s.owner = Some(owner);
            s.loading = true;
            s.last_error = None;
        });

        let result = self.fetch_into_state(owner).await;
        self.write_state(|s| s.loading = false);
        match result {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    /// Adds a draft for the bound owner. The task appears in the snapshot
    /// immediately under a provisional id and is replaced by the record the
    /// store returns; if the store refuses, the snapshot is refetched.
    pub async fn add(&self, draft: TaskDraft) -> Result<Task, CoreError> {
        let _gate = self.write_gate.lock().await;
        self.begin_op();

        let owner = match self.owner() {
            Some(owner) => owner,
            None => return self.fail(CoreError::NoOwner),
        };
        let record = match codec::encode_draft(&draft, owner) {
            Ok(record) => record,
            Err(err) => return self.fail(err),
        };

        let provisional = Task::from_draft(draft, owner);
        let provisional_id = provisional.id;
        self.mutate_tasks(|tasks| tasks.push(provisional));

        match self.store.insert(TASKS, record).await {
            Ok(stored) => match codec::decode_task(stored) {
                Ok(task) => {
                    self.mutate_tasks(|tasks| {
                        if let Some(slot) = tasks.iter_mut().find(|t| t.id == provisional_id) {
                            *slot = task.clone();
                        }
                    });
                    Ok(task)
                }
                Err(err) => {
                    self.refetch_best_effort().await;
                    self.fail(err)
                }
            },
            Err(err) => {
                self.refetch_best_effort().await;
                self.fail(err.into())
            }
        }
    }

    /// Applies a partial update optimistically and persists the changed
    /// fields. When persistence fails the optimistic copy is kept: the error
    /// is logged, recorded, and returned, but nothing is rolled back. Use
    /// [`TaskManager::update_with_transition`] for status changes that must
    /// stay consistent with the store.
    pub async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<(), CoreError> {
        let _gate = self.write_gate.lock().await;
        self.begin_op();

        if self.get_by_id(id).is_none() {
            return self.fail(CoreError::NotFound(id));
        }
        if patch.is_empty() {
            return Ok(());
        }
        let record = match codec::encode_patch(&patch) {
            Ok(record) => record,
            Err(err) => return self.fail(err),
        };

        self.mutate_tasks(|tasks| {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
                patch.apply(task);
            }
        });

        match self.store.update(TASKS, id, record).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(task = %id, error = %err, "update failed to persist; keeping optimistic copy");
                self.fail(err.into())
            }
        }
    }

    /// Replaces a task wholesale and runs the completion transition.
    ///
    /// The replacement is applied optimistically and rolled back to the
    /// pre-call snapshot if persistence fails. When the replacement takes a
    /// recurring task from a not-done status to done, the next occurrence is
    /// computed, inserted for the same owner, and the snapshot is refreshed
    /// from the store. A failure while spawning the successor surfaces
    /// without undoing the already-persisted completion.
    pub async fn update_with_transition(
        &self,
        task: Task,
    ) -> Result<TransitionOutcome, CoreError> {
        let _gate = self.write_gate.lock().await;
        self.begin_op();

        let snapshot = self.tasks();
        let prior = match snapshot.iter().find(|t| t.id == task.id) {
            Some(prior) => prior.clone(),
            None => return self.fail(CoreError::NotFound(task.id)),
        };

        let mut record = match codec::encode_task(&task) {
            Ok(record) => record,
            Err(err) => return self.fail(err),
        };
        record.remove(wire::ID);

        self.mutate_tasks(|tasks| {
            if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
                *slot = task.clone();
            }
        });

        if let Err(err) = self.store.update(TASKS, task.id, record).await {
            error!(task = %task.id, error = %err, "replacement failed to persist; rolling back");
            self.restore_tasks(snapshot);
            return self.fail(err.into());
        }

        let just_completed = task.status == TaskStatus::Done
            && prior.status != TaskStatus::Done
            && task.recurrence.is_recurring();
        if !just_completed {
            return Ok(TransitionOutcome::Updated(task));
        }

        let draft = match recurrence::next_occurrence(&task) {
            Ok(draft) => draft,
            Err(err) => return self.fail(err),
        };
        let record = match codec::encode_draft(&draft, task.owner_id) {
            Ok(record) => record,
            Err(err) => return self.fail(err),
        };

        // The completion above is already committed; failures from here on
        // surface without touching it.
        let next = match self.store.insert(TASKS, record).await {
            Ok(stored) => match codec::decode_task(stored) {
                Ok(next) => next,
                Err(err) => {
                    self.refetch_best_effort().await;
                    return self.fail(err);
                }
            },
            Err(err) => return self.fail(err.into()),
        };

        debug!(completed = %task.id, next = %next.id, "recurring task advanced");

        if let Err(err) = self.refetch().await {
            return self.fail(err);
        }
        Ok(TransitionOutcome::Advanced {
            completed: task,
            next,
        })
    }

    /// Deletes a task. A non-recurring task is removed as a single record.
    /// Deleting a recurring task terminates its whole series: pending and
    /// future occurrences are removed, finished past occurrences are kept,
    /// and the most recent of them stops recurring.
    pub async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        let _gate = self.write_gate.lock().await;
        self.begin_op();

        let target = match self.get_by_id(id) {
            Some(target) => target,
            None => return self.fail(CoreError::NotFound(id)),
        };

        if target.recurrence.is_recurring() {
            self.terminate_series(&target).await
        } else {
            self.delete_single(id).await
        }
    }

    async fn delete_single(&self, id: Uuid) -> Result<(), CoreError> {
        if let Err(err) = self.store.delete(TASKS, id).await {
            self.refetch_best_effort().await;
            return self.fail(err.into());
        }
        match self.refetch().await {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    async fn terminate_series(&self, target: &Task) -> Result<(), CoreError> {
        let root = target.series_root();
        let root_value = Value::String(root.to_string());
        let filter = RecordFilter::new(Match::Either(
            Box::new(Match::Eq(wire::ID, root_value.clone())),
            Box::new(Match::Eq(wire::RECURRING_TEMPLATE_ID, root_value)),
        ))
        .ordered_by(wire::START_TIME, true);

        let records = match self.store.query(TASKS, filter).await {
            Ok(records) => records,
            Err(err) => {
                self.refetch_best_effort().await;
                return self.fail(err.into());
            }
        };
        if records.is_empty() {
            // Nothing persisted for this series; reconcile and move on.
            return match self.refetch().await {
                Ok(()) => Ok(()),
                Err(err) => self.fail(err),
            };
        }

        let mut members = Vec::with_capacity(records.len());
        for record in records {
            match codec::decode_task(record) {
                Ok(member) => members.push(member),
                Err(err) => {
                    self.refetch_best_effort().await;
                    return self.fail(err);
                }
            }
        }
        // Most recent first, independent of what the store returned.
        members.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        let cutoff = start_of_today();
        let mut terminator: Option<&Task> = None;
        let mut doomed: Vec<Uuid> = Vec::new();
        for member in &members {
            let historical = member.start_time < cutoff && member.status == TaskStatus::Done;
            if historical {
                if terminator.is_none() {
                    terminator = Some(member);
                }
            } else {
                doomed.push(member.id);
            }
        }

        if let Some(terminator) = terminator {
            if terminator.recurrence.is_recurring() {
                let patch = TaskPatch {
                    recurrence: Some(Recurrence::None),
                    ..Default::default()
                };
                let record = match codec::encode_patch(&patch) {
                    Ok(record) => record,
                    Err(err) => {
                        self.refetch_best_effort().await;
                        return self.fail(err);
                    }
                };
                if let Err(err) = self.store.update(TASKS, terminator.id, record).await {
                    self.refetch_best_effort().await;
                    return self.fail(err.into());
                }
            }
        }

        if !doomed.is_empty() {
            if let Err(err) = self.store.delete_many(TASKS, &doomed).await {
                self.refetch_best_effort().await;
                return self.fail(err.into());
            }
        }

        debug!(
            series = %root,
            kept = members.len() - doomed.len(),
            removed = doomed.len(),
            "series terminated"
        );

        match self.refetch().await {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    /// Deletes a set of tasks in one store call, then refetches. No series
    /// handling: exactly the listed records go away.
    pub async fn bulk_delete(&self, ids: &[Uuid]) -> Result<(), CoreError> {
        let _gate = self.write_gate.lock().await;
        self.begin_op();
        if ids.is_empty() {
            return Ok(());
        }

        let result = self.store.delete_many(TASKS, ids).await;
        let refetched = self.refetch().await;
        match result.map_err(CoreError::from).and(refetched) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    /// Persists full replacements for several tasks concurrently. The first
    /// failure is surfaced after all writes settle, and the snapshot is
    /// refreshed from the store either way.
    pub async fn bulk_update(&self, tasks: Vec<Task>) -> Result<(), CoreError> {
        let _gate = self.write_gate.lock().await;
        self.begin_op();
        if tasks.is_empty() {
            return Ok(());
        }

        let writes = tasks.iter().map(|task| self.persist_replacement(task));
        let results = join_all(writes).await;
        let first_error = results.into_iter().find_map(Result::err);

        let refetched = self.refetch().await;
        match first_error.map_or(refetched, Err) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    async fn persist_replacement(&self, task: &Task) -> Result<(), CoreError> {
        let mut record = codec::encode_task(task)?;
        record.remove(wire::ID);
        self.store.update(TASKS, task.id, record).await?;
        Ok(())
    }
}

/// Midnight UTC of the current day. A finished occurrence counts as
/// historical once its start has slipped before this line.
fn start_of_today() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}
