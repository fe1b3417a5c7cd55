use super::duration::{add_one_second, hms};
use super::project::Project;
use super::task::Task;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Complete persisted state for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, alias = "UserId")]
    pub user_id: String,
    #[serde(default, alias = "Projects")]
    pub projects: Vec<Project>,
    /// Timer seconds accrued on `last_reset_date` (UTC)
    #[serde(with = "hms", default = "Duration::zero")]
    pub today_accumulated: Duration,
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
}

impl Snapshot {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            projects: Vec::new(),
            today_accumulated: Duration::zero(),
            last_reset_date: None,
        }
    }

    /// Repair a freshly loaded snapshot so every invariant holds
    pub fn normalize(&mut self) {
        for project in &mut self.projects {
            project.normalize();
        }
    }

    pub fn project(&self, project_id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn project_mut(&mut self, project_id: Uuid) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }

    /// Index of the project that owns a task
    pub fn project_index_of_task(&self, task_id: Uuid) -> Option<usize> {
        self.projects
            .iter()
            .position(|p| p.locate(task_id).is_some())
    }

    pub fn find_task(&self, task_id: Uuid) -> Option<(&Project, &Task)> {
        self.projects
            .iter()
            .find_map(|p| p.task(task_id).map(|t| (p, t)))
    }

    /// Zero the daily counter if `today` differs from the stored reset date.
    /// Returns whether a rollover happened.
    pub fn roll_daily_counter(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date == Some(today) {
            return false;
        }
        self.today_accumulated = Duration::zero();
        self.last_reset_date = Some(today);
        true
    }

    pub fn accrue_daily(&mut self) {
        self.today_accumulated = add_one_second(self.today_accumulated);
    }

    /// Daily counter as seen on `today`, without resetting the stored value
    pub fn daily_total_on(&self, today: NaiveDate) -> Duration {
        if self.last_reset_date == Some(today) {
            self.today_accumulated
        } else {
            Duration::zero()
        }
    }

    pub fn active_task_count(&self) -> usize {
        self.projects.iter().map(|p| p.active_tasks().len()).sum()
    }

    pub fn completed_task_count(&self) -> usize {
        self.projects.iter().map(|p| p.completed_tasks().len()).sum()
    }
}
