//! Scheduling policy for recurring series.
//!
//! Given a just-completed occurrence, [`next_occurrence`] produces the draft
//! of the follow-up task: same title, notes and flags, checklist reset to
//! unchecked, start time advanced by the recurrence rule, and the original
//! duration preserved. The policy is pure; persisting the draft is the
//! caller's business.

use chrono::{DateTime, Datelike, Days, Months, Utc, Weekday};

use crate::error::CoreError;
use crate::models::{ChecklistItem, Recurrence, Task, TaskDraft, TaskStatus};

/// Computes the draft of the occurrence that follows `completed`.
///
/// The draft points back at the series root: the completed task's template
/// when it has one, otherwise the completed task itself. Fails with
/// [`CoreError::NotRecurring`] when the task does not repeat and with
/// [`CoreError::Recurrence`] when the advanced date falls outside the
/// supported calendar range.
pub fn next_occurrence(completed: &Task) -> Result<TaskDraft, CoreError> {
    if !completed.recurrence.is_recurring() {
        return Err(CoreError::NotRecurring(completed.id));
    }

    let start = advance(completed.start_time, completed.recurrence).ok_or_else(|| {
        CoreError::Recurrence(format!(
            "cannot advance {} recurrence past {}",
            completed.recurrence, completed.start_time
        ))
    })?;
    let duration = completed.end_time - completed.start_time;
    let end = start.checked_add_signed(duration).ok_or_else(|| {
        CoreError::Recurrence("occurrence end falls outside the supported range".to_string())
    })?;

    let checklist = completed
        .checklist
        .iter()
        .map(|item| ChecklistItem {
            text: item.text.clone(),
            completed: false,
        })
        .collect();

    Ok(TaskDraft {
        title: completed.title.clone(),
        notes: completed.notes.clone(),
        start_time: start,
        end_time: end,
        status: TaskStatus::ToDo,
        checklist,
        is_important: completed.is_important,
        recurrence: completed.recurrence,
        recurring_template_id: Some(completed.series_root()),
    })
}

/// Moves a start time forward by one recurrence step. Month and year steps
/// clamp to the last day of the target month when the source day does not
/// exist there.
fn advance(start: DateTime<Utc>, recurrence: Recurrence) -> Option<DateTime<Utc>> {
    match recurrence {
        Recurrence::None => None,
        Recurrence::Daily => start.checked_add_days(Days::new(1)),
        Recurrence::Weekdays => next_weekday(start),
        Recurrence::Weekly => start.checked_add_days(Days::new(7)),
        Recurrence::Monthly => start.checked_add_months(Months::new(1)),
        Recurrence::Yearly => start.checked_add_months(Months::new(12)),
    }
}

/// The next Monday-through-Friday day after `start`. Friday skips to Monday.
fn next_weekday(start: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let step = match start.weekday() {
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        _ => 1,
    };
    start.checked_add_days(Days::new(step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn recurring(recurrence: Recurrence, start: DateTime<Utc>) -> Task {
        Task {
            title: "Standup".to_string(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(30),
            recurrence,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(Recurrence::Daily, at(2025, 3, 10, 9), at(2025, 3, 11, 9))]
    #[case(Recurrence::Weekly, at(2025, 3, 10, 9), at(2025, 3, 17, 9))]
    #[case(Recurrence::Monthly, at(2025, 3, 10, 9), at(2025, 4, 10, 9))]
    #[case(Recurrence::Yearly, at(2025, 3, 10, 9), at(2026, 3, 10, 9))]
    fn advances_by_rule(
        #[case] recurrence: Recurrence,
        #[case] start: DateTime<Utc>,
        #[case] expected: DateTime<Utc>,
    ) {
        let next = next_occurrence(&recurring(recurrence, start)).unwrap();
        assert_eq!(next.start_time, expected);
    }

    #[rstest]
    // Wednesday steps to Thursday, Friday and the weekend all land on Monday.
    #[case(at(2025, 3, 12, 8), at(2025, 3, 13, 8))]
    #[case(at(2025, 3, 14, 8), at(2025, 3, 17, 8))]
    #[case(at(2025, 3, 15, 8), at(2025, 3, 17, 8))]
    #[case(at(2025, 3, 16, 8), at(2025, 3, 17, 8))]
    fn weekdays_skip_weekends(#[case] start: DateTime<Utc>, #[case] expected: DateTime<Utc>) {
        let next = next_occurrence(&recurring(Recurrence::Weekdays, start)).unwrap();
        assert_eq!(next.start_time, expected);
    }

    #[test]
    fn monthly_clamps_to_shorter_month() {
        let next = next_occurrence(&recurring(Recurrence::Monthly, at(2025, 1, 31, 12))).unwrap();
        assert_eq!(next.start_time, at(2025, 2, 28, 12));
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let next = next_occurrence(&recurring(Recurrence::Yearly, at(2024, 2, 29, 12))).unwrap();
        assert_eq!(next.start_time, at(2025, 2, 28, 12));
    }

    #[test]
    fn preserves_duration() {
        let task = Task {
            start_time: at(2025, 3, 10, 9),
            end_time: at(2025, 3, 10, 11),
            recurrence: Recurrence::Daily,
            ..Default::default()
        };

        let next = next_occurrence(&task).unwrap();

        assert_eq!(next.end_time - next.start_time, chrono::Duration::hours(2));
    }

    #[test]
    fn resets_checklist_and_status() {
        let mut task = recurring(Recurrence::Daily, at(2025, 3, 10, 9));
        task.status = TaskStatus::Done;
        task.checklist = vec![
            ChecklistItem {
                text: "first".to_string(),
                completed: true,
            },
            ChecklistItem {
                text: "second".to_string(),
                completed: true,
            },
        ];

        let next = next_occurrence(&task).unwrap();

        assert_eq!(next.status, TaskStatus::ToDo);
        assert_eq!(next.checklist.len(), 2);
        assert!(next.checklist.iter().all(|item| !item.completed));
        assert_eq!(next.checklist[0].text, "first");
        assert_eq!(next.checklist[1].text, "second");
    }

    #[test]
    fn root_completion_links_successor_to_root() {
        let root = recurring(Recurrence::Daily, at(2025, 3, 10, 9));
        let next = next_occurrence(&root).unwrap();
        assert_eq!(next.recurring_template_id, Some(root.id));
    }

    #[test]
    fn instance_completion_keeps_root_link() {
        let root_id = Uuid::now_v7();
        let mut instance = recurring(Recurrence::Daily, at(2025, 3, 11, 9));
        instance.recurring_template_id = Some(root_id);

        let next = next_occurrence(&instance).unwrap();

        assert_eq!(next.recurring_template_id, Some(root_id));
    }

    #[test]
    fn refuses_non_recurring_task() {
        let task = Task::default();
        let err = next_occurrence(&task).unwrap_err();
        assert!(matches!(err, CoreError::NotRecurring(id) if id == task.id));
    }
}
