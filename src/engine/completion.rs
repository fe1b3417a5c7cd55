use crate::domain::{Snapshot, TaskList};
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

/// What a completion toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Moved from the active list to the end of the completed list
    Completed,
    /// Moved from the completed list back to the end of the active list
    Reopened,
    /// The task already had the requested state
    Unchanged,
}

/// Set a task's completion flag, moving it between its project's lists.
///
/// Stamping, moving and re-estimating happen in one call under an exclusive
/// borrow of the snapshot, so no tick can observe a half-moved task.
pub fn toggle_completion(
    snapshot: &mut Snapshot,
    task_id: Uuid,
    completed: bool,
    now: DateTime<Utc>,
) -> Result<CompletionOutcome, ValidationError> {
    let idx = snapshot
        .project_index_of_task(task_id)
        .ok_or_else(|| ValidationError::TaskNotFound(task_id.to_string()))?;
    let project = &mut snapshot.projects[idx];
    let project_name = project.name.clone();

    let outcome = match (project.locate(task_id), completed) {
        (Some(TaskList::Active), true) => {
            if let Some(task) = project.move_to_completed(task_id, now) {
                info!(project = %project_name, task = %task.name, "task completed");
            }
            CompletionOutcome::Completed
        }
        (Some(TaskList::Completed), false) => {
            if let Some(task) = project.move_to_active(task_id) {
                info!(project = %project_name, task = %task.name, "task reopened");
            }
            CompletionOutcome::Reopened
        }
        _ => CompletionOutcome::Unchanged,
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Project, Task};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap()
    }

    fn study() -> (Snapshot, Uuid, Uuid) {
        let mut snapshot = Snapshot::new("tester");
        let mut project = Project::new("Study");
        let read = Task::new("Read", Duration::seconds(2), now());
        let write = Task::new("Write", Duration::minutes(20), now());
        let read_id = read.id;
        project.add_task(read);
        project.add_task(write);
        let project_id = project.id;
        snapshot.projects.push(project);
        (snapshot, project_id, read_id)
    }

    /// Every task is in exactly one list and its flag matches that list
    fn assert_invariants(snapshot: &Snapshot) {
        for project in &snapshot.projects {
            for task in project.active_tasks() {
                assert!(!task.is_completed());
                assert!(task.completed_at().is_none());
                assert!(!project.completed_tasks().iter().any(|t| t.id == task.id));
            }
            for task in project.completed_tasks() {
                assert!(task.is_completed());
                assert!(task.completed_at().is_some());
            }
        }
    }

    #[test]
    fn test_scenario_complete_moves_task() {
        let (mut snapshot, project_id, read_id) = study();
        let outcome = toggle_completion(&mut snapshot, read_id, true, now()).unwrap();
        assert_eq!(outcome, CompletionOutcome::Completed);

        let project = snapshot.project(project_id).unwrap();
        assert_eq!(project.active_tasks().len(), 1);
        assert_eq!(project.completed_tasks().len(), 1);
        assert_eq!(project.completed_tasks()[0].completed_at(), Some(now()));
        assert_eq!(project.estimated_duration(), Duration::minutes(20));
        assert_invariants(&snapshot);
    }

    #[test]
    fn test_reopen_reverses_everything() {
        let (mut snapshot, project_id, read_id) = study();
        toggle_completion(&mut snapshot, read_id, true, now()).unwrap();
        let outcome = toggle_completion(&mut snapshot, read_id, false, now()).unwrap();
        assert_eq!(outcome, CompletionOutcome::Reopened);

        let project = snapshot.project(project_id).unwrap();
        assert!(project.completed_tasks().is_empty());
        assert_eq!(project.active_tasks().last().unwrap().id, read_id);
        assert_eq!(project.estimated_duration(), Duration::minutes(20) + Duration::seconds(2));
        assert_invariants(&snapshot);
    }

    #[test]
    fn test_repeated_toggle_is_unchanged() {
        let (mut snapshot, _, read_id) = study();
        assert_eq!(
            toggle_completion(&mut snapshot, read_id, false, now()).unwrap(),
            CompletionOutcome::Unchanged
        );
        toggle_completion(&mut snapshot, read_id, true, now()).unwrap();
        let later = now() + Duration::hours(1);
        assert_eq!(
            toggle_completion(&mut snapshot, read_id, true, later).unwrap(),
            CompletionOutcome::Unchanged
        );
        // The original stamp survives a redundant toggle
        let (_, task) = snapshot.find_task(read_id).unwrap();
        assert_eq!(task.completed_at(), Some(now()));
        assert_invariants(&snapshot);
    }

    #[test]
    fn test_unknown_task() {
        let (mut snapshot, _, _) = study();
        assert!(matches!(
            toggle_completion(&mut snapshot, Uuid::new_v4(), true, now()),
            Err(ValidationError::TaskNotFound(_))
        ));
    }
}
