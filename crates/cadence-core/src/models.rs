use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "todo")]
    ToDo,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

#[derive(Debug, Error)]
#[error("Invalid status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" | "to-do" | "to_do" => Ok(TaskStatus::ToDo),
            "in_progress" | "in-progress" | "inprogress" | "doing" => Ok(TaskStatus::InProgress),
            "done" | "complete" | "completed" => Ok(TaskStatus::Done),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::ToDo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

/// How a task repeats. The set is closed: records carrying any other value
/// are rejected at decode time instead of being silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    None,
    Daily,
    Weekdays,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::None)
    }
}

#[derive(Debug, Error)]
#[error("Invalid recurrence: {0}")]
pub struct ParseRecurrenceError(String);

impl FromStr for Recurrence {
    type Err = ParseRecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Recurrence::None),
            "daily" | "day" => Ok(Recurrence::Daily),
            "weekdays" | "weekday" => Ok(Recurrence::Weekdays),
            "weekly" | "week" => Ok(Recurrence::Weekly),
            "monthly" | "month" => Ok(Recurrence::Monthly),
            "yearly" | "year" | "annually" => Ok(Recurrence::Yearly),
            _ => Err(ParseRecurrenceError(s.to_string())),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::None => write!(f, "none"),
            Recurrence::Daily => write!(f, "daily"),
            Recurrence::Weekdays => write!(f, "weekdays"),
            Recurrence::Weekly => write!(f, "weekly"),
            Recurrence::Monthly => write!(f, "monthly"),
            Recurrence::Yearly => write!(f, "yearly"),
        }
    }
}

/// One entry of a task's checklist. Order within the checklist is positional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
        }
    }
}

/// A task as the application sees it.
///
/// Serialized field names follow the application convention (camelCase);
/// the codec module translates to and from the store's persisted names.
///
/// Recurring tasks form a series: the first task of the series is the root,
/// and every spawned occurrence points back at it through
/// `recurring_template_id`. The root itself carries `None` there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: TaskStatus,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    pub is_important: bool,
    pub recurrence: Recurrence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a persistable task from a draft, assigning a fresh id.
    pub fn from_draft(draft: TaskDraft, owner_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            title: draft.title,
            notes: draft.notes,
            start_time: draft.start_time,
            end_time: draft.end_time,
            status: draft.status,
            checklist: draft.checklist,
            is_important: draft.is_important,
            recurrence: draft.recurrence,
            recurring_template_id: draft.recurring_template_id,
            created_at: Utc::now(),
        }
    }

    /// True when the task belongs to a series, either as a still-recurring
    /// member or as a terminated occurrence that kept its template link.
    pub fn is_series_member(&self) -> bool {
        self.recurrence.is_recurring() || self.recurring_template_id.is_some()
    }

    /// The id of the series root: the template id when present, otherwise
    /// the task itself is the root.
    pub fn series_root(&self) -> Uuid {
        self.recurring_template_id.unwrap_or(self.id)
    }
}

impl Default for Task {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            title: String::new(),
            notes: None,
            start_time: now,
            end_time: now + Duration::hours(1),
            status: TaskStatus::ToDo,
            checklist: Vec::new(),
            is_important: false,
            recurrence: Recurrence::None,
            recurring_template_id: None,
            created_at: now,
        }
    }
}

/// A task the user has described but the store has not seen yet.
/// Identity and ownership are assigned when the draft is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: TaskStatus,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    pub is_important: bool,
    pub recurrence: Recurrence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_template_id: Option<Uuid>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            title: String::new(),
            notes: None,
            start_time: now,
            end_time: now + Duration::hours(1),
            status: TaskStatus::ToDo,
            checklist: Vec::new(),
            is_important: false,
            recurrence: Recurrence::None,
            recurring_template_id: None,
        }
    }
}

/// A partial update. `None` fields are left untouched; the double-`Option`
/// fields distinguish "leave alone" from "clear the value".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub checklist: Option<Vec<ChecklistItem>>,
    pub is_important: Option<bool>,
    pub recurrence: Option<Recurrence>,
    pub recurring_template_id: Option<Option<Uuid>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.notes.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.status.is_none()
            && self.checklist.is_none()
            && self.is_important.is_none()
            && self.recurrence.is_none()
            && self.recurring_template_id.is_none()
    }

    /// Applies the patch to a task in place.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(notes) = &self.notes {
            task.notes = notes.clone();
        }
        if let Some(start_time) = self.start_time {
            task.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            task.end_time = end_time;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(checklist) = &self.checklist {
            task.checklist = checklist.clone();
        }
        if let Some(is_important) = self.is_important {
            task.is_important = is_important;
        }
        if let Some(recurrence) = self.recurrence {
            task.recurrence = recurrence;
        }
        if let Some(template) = self.recurring_template_id {
            task.recurring_template_id = template;
        }
    }
}

/// What a full-replacement update resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The task was replaced in place; no lifecycle transition fired.
    Updated(Task),
    /// Completing the task spawned the next occurrence of its series.
    Advanced { completed: Task, next: Task },
}
