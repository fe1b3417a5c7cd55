use super::duration::{add, add_one_second, hms};
use super::enums::TaskField;
use super::task::Task;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of a project's two lists holds a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskList {
    Active,
    Completed,
}

/// A named group of tasks
///
/// Every task lives in exactly one of `active_tasks` / `completed_tasks`.
/// `estimated_duration` is derived from the active list and is refreshed
/// through [`Project::on_task_changed`] by whoever mutates a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(with = "hms", default = "Duration::zero", alias = "TimeSpent")]
    pub time_spent: Duration,
    #[serde(with = "hms", default = "Duration::zero", alias = "EstimatedTime")]
    estimated_duration: Duration,
    #[serde(default, alias = "Tasks")]
    active_tasks: Vec<Task>,
    #[serde(default, alias = "CompletedTasks")]
    completed_tasks: Vec<Task>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            time_spent: Duration::zero(),
            estimated_duration: Duration::zero(),
            active_tasks: Vec::new(),
            completed_tasks: Vec::new(),
        }
    }

    pub fn estimated_duration(&self) -> Duration {
        self.estimated_duration
    }

    pub fn active_tasks(&self) -> &[Task] {
        &self.active_tasks
    }

    pub fn completed_tasks(&self) -> &[Task] {
        &self.completed_tasks
    }

    /// Iterate over every task, active first
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.active_tasks.iter().chain(self.completed_tasks.iter())
    }

    /// Append a new active task
    pub fn add_task(&mut self, task: Task) {
        self.active_tasks.push(task);
        self.on_task_changed(TaskField::Membership);
    }

    /// Remove a task from whichever list holds it
    pub fn remove_task(&mut self, task_id: Uuid) -> Option<Task> {
        let removed = match self.locate(task_id)? {
            TaskList::Active => {
                let idx = self.active_tasks.iter().position(|t| t.id == task_id)?;
                self.active_tasks.remove(idx)
            }
            TaskList::Completed => {
                let idx = self.completed_tasks.iter().position(|t| t.id == task_id)?;
                self.completed_tasks.remove(idx)
            }
        };
        self.on_task_changed(TaskField::Membership);
        Some(removed)
    }

    pub fn locate(&self, task_id: Uuid) -> Option<TaskList> {
        if self.active_tasks.iter().any(|t| t.id == task_id) {
            Some(TaskList::Active)
        } else if self.completed_tasks.iter().any(|t| t.id == task_id) {
            Some(TaskList::Completed)
        } else {
            None
        }
    }

    pub fn task(&self, task_id: Uuid) -> Option<&Task> {
        self.all_tasks().find(|t| t.id == task_id)
    }

    /// Mutable access for field edits; list membership stays with the project
    pub fn task_mut(&mut self, task_id: Uuid) -> Option<&mut Task> {
        self.active_tasks
            .iter_mut()
            .chain(self.completed_tasks.iter_mut())
            .find(|t| t.id == task_id)
    }

    /// Stamp an active task completed and append it to the completed list
    pub(crate) fn move_to_completed(&mut self, task_id: Uuid, now: DateTime<Utc>) -> Option<&Task> {
        let idx = self.active_tasks.iter().position(|t| t.id == task_id)?;
        let mut task = self.active_tasks.remove(idx);
        task.mark_completed(now);
        self.completed_tasks.push(task);
        self.on_task_changed(TaskField::Membership);
        self.completed_tasks.last()
    }

    /// Clear a completed task's stamp and append it to the active list
    pub(crate) fn move_to_active(&mut self, task_id: Uuid) -> Option<&Task> {
        let idx = self.completed_tasks.iter().position(|t| t.id == task_id)?;
        let mut task = self.completed_tasks.remove(idx);
        task.mark_active();
        self.active_tasks.push(task);
        self.on_task_changed(TaskField::Membership);
        self.active_tasks.last()
    }

    /// Called by whatever mutated a task so derived values stay current
    pub fn on_task_changed(&mut self, field: TaskField) {
        if field.affects_estimate() {
            self.recompute_estimate();
        }
    }

    fn recompute_estimate(&mut self) {
        self.estimated_duration = self
            .active_tasks
            .iter()
            .map(|t| t.expected_duration)
            .fold(Duration::zero(), add);
    }

    /// Accrue one timer second on the project
    pub fn apply_tick(&mut self) {
        self.time_spent = add_one_second(self.time_spent);
    }

    /// Repair list membership and derived values after load
    pub(crate) fn normalize(&mut self) {
        let (finished, still_active): (Vec<Task>, Vec<Task>) = std::mem::take(&mut self.active_tasks)
            .into_iter()
            .partition(|t| t.is_completed());
        self.active_tasks = still_active;
        self.completed_tasks.extend(finished);

        for task in &mut self.active_tasks {
            task.normalize_completion(false);
        }
        for task in &mut self.completed_tasks {
            task.normalize_completion(true);
        }
        self.recompute_estimate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    fn project_with_tasks() -> (Project, Uuid, Uuid) {
        let mut project = Project::new("Study");
        let a = Task::new("Read", Duration::minutes(30), now());
        let b = Task::new("Write", Duration::minutes(45), now());
        let (a_id, b_id) = (a.id, b.id);
        project.add_task(a);
        project.add_task(b);
        (project, a_id, b_id)
    }

    #[test]
    fn test_estimate_tracks_active_tasks() {
        let (mut project, a_id, _) = project_with_tasks();
        assert_eq!(project.estimated_duration(), Duration::minutes(75));

        project.remove_task(a_id);
        assert_eq!(project.estimated_duration(), Duration::minutes(45));
    }

    #[test]
    fn test_estimate_after_expected_edit() {
        let (mut project, a_id, _) = project_with_tasks();
        project.task_mut(a_id).unwrap().set_expected(Duration::minutes(10));
        project.on_task_changed(TaskField::Expected);
        assert_eq!(project.estimated_duration(), Duration::minutes(55));
    }

    #[test]
    fn test_move_between_lists() {
        let (mut project, a_id, b_id) = project_with_tasks();

        let moved = project.move_to_completed(a_id, now()).unwrap();
        assert!(moved.is_completed());
        assert_eq!(project.locate(a_id), Some(TaskList::Completed));
        assert_eq!(project.estimated_duration(), Duration::minutes(45));

        project.move_to_active(a_id).unwrap();
        assert_eq!(project.locate(a_id), Some(TaskList::Active));
        // Append semantics: the reopened task goes to the end
        let order: Vec<Uuid> = project.active_tasks().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![b_id, a_id]);
        assert_eq!(project.estimated_duration(), Duration::minutes(75));
    }

    #[test]
    fn test_move_missing_task_is_none() {
        let (mut project, a_id, _) = project_with_tasks();
        assert!(project.move_to_active(a_id).is_none());
        assert!(project.move_to_completed(Uuid::new_v4(), now()).is_none());
    }

    #[test]
    fn test_apply_tick() {
        let mut project = Project::new("Study");
        project.apply_tick();
        project.apply_tick();
        assert_eq!(project.time_spent, Duration::seconds(2));
    }

    #[test]
    fn test_apply_tick_on_huge_stored_time_spent() {
        let mut project: Project =
            serde_json::from_str(r#"{"name":"A","timeSpent":9223372036854775}"#).unwrap();
        let before = project.time_spent;
        project.apply_tick();
        assert_eq!(project.time_spent, before);
    }

    #[test]
    fn test_normalize_legacy_membership() {
        let json = r#"{
            "Name": "Old",
            "TimeSpent": "00:10:00",
            "EstimatedTime": "99:00:00",
            "Tasks": [
                {"Name": "Done already", "ExpectedTime": "00:20:00", "IsCompleted": true},
                {"Name": "Open", "ExpectedTime": "00:15:00", "IsCompleted": false}
            ],
            "CompletedTasks": []
        }"#;
        let mut project: Project = serde_json::from_str(json).unwrap();
        project.normalize();

        assert_eq!(project.time_spent, Duration::minutes(10));
        assert_eq!(project.active_tasks().len(), 1);
        assert_eq!(project.completed_tasks().len(), 1);
        assert!(project.completed_tasks()[0].completed_at().is_some());
        assert_eq!(project.estimated_duration(), Duration::minutes(15));
    }
}
