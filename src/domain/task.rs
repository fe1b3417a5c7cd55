use super::duration::{add_one_second, hms, hms_opt, subtract_one_second};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp used when a stored record predates the field
pub(crate) fn unknown_instant() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// A unit of work with a time budget
///
/// `expected_duration` is the budget the user set, `remaining_duration` is the
/// countdown carried between timer sessions, and `elapsed_duration` only ever
/// grows. The completion flag and timestamp are kept together: a completed
/// task always has `completed_at`, an active one never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(with = "hms", default = "Duration::zero", alias = "ExpectedTime")]
    pub expected_duration: Duration,
    #[serde(with = "hms", default = "Duration::zero", alias = "TimeElapsed")]
    pub elapsed_duration: Duration,
    #[serde(with = "hms_opt", default)]
    pub remaining_duration: Option<Duration>,
    #[serde(default, alias = "Priority")]
    pub priority: i32,
    #[serde(default, alias = "IsCompleted")]
    is_completed: bool,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default = "unknown_instant")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(name: impl Into<String>, expected: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            expected_duration: expected,
            elapsed_duration: Duration::zero(),
            remaining_duration: None,
            priority: 0,
            is_completed: false,
            completed_at: None,
            created_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Budget the next timer session counts down from
    pub fn budget(&self) -> Duration {
        self.remaining_duration.unwrap_or(self.expected_duration)
    }

    /// Change the budget; the carried countdown restarts from the new value
    pub fn set_expected(&mut self, expected: Duration) {
        self.expected_duration = expected;
        self.remaining_duration = None;
    }

    /// Apply one timer second: countdown down, elapsed up
    pub fn apply_tick(&mut self) {
        self.remaining_duration = Some(subtract_one_second(self.budget()));
        self.elapsed_duration = add_one_second(self.elapsed_duration);
    }

    pub(crate) fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(now);
    }

    pub(crate) fn mark_active(&mut self) {
        self.is_completed = false;
        self.completed_at = None;
    }

    /// Repair the flag/timestamp pair after load, given which list holds the task
    pub(crate) fn normalize_completion(&mut self, in_completed_list: bool) {
        if in_completed_list {
            self.is_completed = true;
            if self.completed_at.is_none() {
                self.completed_at = Some(unknown_instant());
            }
        } else {
            self.mark_active();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_task_new() {
        let task = Task::new("Read", Duration::minutes(30), now());
        assert_eq!(task.name, "Read");
        assert_eq!(task.budget(), Duration::minutes(30));
        assert!(!task.is_completed());
        assert!(task.completed_at().is_none());
        assert_eq!(task.created_at, now());
    }

    #[test]
    fn test_apply_tick_moves_both_counters() {
        let mut task = Task::new("Read", Duration::seconds(2), now());
        task.apply_tick();
        assert_eq!(task.remaining_duration, Some(Duration::seconds(1)));
        assert_eq!(task.elapsed_duration, Duration::seconds(1));

        task.apply_tick();
        task.apply_tick();
        assert_eq!(task.remaining_duration, Some(Duration::zero()));
        assert_eq!(task.elapsed_duration, Duration::seconds(3));
    }

    #[test]
    fn test_set_expected_resets_countdown() {
        let mut task = Task::new("Read", Duration::seconds(10), now());
        task.apply_tick();
        task.set_expected(Duration::minutes(5));
        assert_eq!(task.budget(), Duration::minutes(5));
        assert_eq!(task.elapsed_duration, Duration::seconds(1));
    }

    #[test]
    fn test_completion_pair() {
        let mut task = Task::new("Read", Duration::seconds(10), now());
        task.mark_completed(now());
        assert!(task.is_completed());
        assert_eq!(task.completed_at(), Some(now()));

        task.mark_active();
        assert!(!task.is_completed());
        assert!(task.completed_at().is_none());
    }

    #[test]
    fn test_normalize_completion() {
        let mut task = Task::new("Legacy", Duration::zero(), now());
        task.normalize_completion(true);
        assert!(task.is_completed());
        assert_eq!(task.completed_at(), Some(unknown_instant()));

        task.normalize_completion(false);
        assert!(!task.is_completed());
        assert!(task.completed_at().is_none());
    }

    #[test]
    fn test_legacy_task_fields() {
        let json = r#"{"Name":"Old","ExpectedTime":"00:30:00","TimeElapsed":"00:01:00","IsCompleted":false,"Priority":2}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.name, "Old");
        assert_eq!(task.expected_duration, Duration::minutes(30));
        assert_eq!(task.elapsed_duration, Duration::minutes(1));
        assert_eq!(task.priority, 2);
        assert_eq!(task.remaining_duration, None);
        assert_eq!(task.created_at, unknown_instant());
    }
}
