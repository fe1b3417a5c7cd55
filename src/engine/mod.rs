//! Countdown timer engine.
//!
//! One [`TimerSession`] at a time. The engine never owns the project graph:
//! the session keeps the ids of the project and task it was started against
//! and resolves them on every tick, so a task that has been deleted simply
//! stops receiving task-level updates. All methods take `&mut self` and the
//! snapshot by `&mut`, so a tick and a command can never interleave.

pub mod completion;

pub use completion::{toggle_completion, CompletionOutcome};

use crate::domain::duration::{format_hms, subtract_one_second};
use crate::domain::{Snapshot, TaskField, TimerState};
use crate::error::ValidationError;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

/// Countdown text once a session runs out on its own
pub const EXPIRED_MARKER: &str = "Time's up!";
/// Countdown text after the user stops a running session
pub const STOPPED_MARKER: &str = "Timer Stopped";

/// The transient state of the current (or last) countdown
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSession {
    pub project_id: Uuid,
    pub task_id: Uuid,
    pub project_name: String,
    pub task_name: String,
    /// Countdown left in this session
    pub remaining: Duration,
    /// Countdown at start; denominator for progress
    pub total: Duration,
    pub running: bool,
    pub countdown: String,
    /// Percent complete, 0..=100
    pub progress: f64,
}

/// Published after every tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub task_id: Uuid,
    pub remaining: Duration,
    pub countdown: String,
    pub progress: f64,
    pub expired: bool,
    /// The daily counter was reset on this tick
    pub rolled_over: bool,
}

/// Published on every state transition
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub from: TimerState,
    pub to: TimerState,
    pub project_name: String,
    pub task_name: String,
}

type TickObserver = Box<dyn FnMut(&TickReport)>;
type StateObserver = Box<dyn FnMut(&StateChange)>;

/// Timer state machine: Idle → Running → (Expired | Stopped) → Running ...
pub struct TimerEngine {
    state: TimerState,
    session: Option<TimerSession>,
    tick_observers: Vec<TickObserver>,
    state_observers: Vec<StateObserver>,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            session: None,
            tick_observers: Vec::new(),
            state_observers: Vec::new(),
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session(&self) -> Option<&TimerSession> {
        self.session.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Task the running session is timing, if any
    pub fn running_task(&self) -> Option<Uuid> {
        self.session
            .as_ref()
            .filter(|s| s.running)
            .map(|s| s.task_id)
    }

    pub fn countdown(&self) -> &str {
        self.session.as_ref().map(|s| s.countdown.as_str()).unwrap_or("")
    }

    pub fn progress(&self) -> f64 {
        self.session.as_ref().map(|s| s.progress).unwrap_or(0.0)
    }

    /// Subscribe to per-tick progress
    pub fn on_tick(&mut self, observer: impl FnMut(&TickReport) + 'static) {
        self.tick_observers.push(Box::new(observer));
    }

    /// Subscribe to state transitions
    pub fn on_state_change(&mut self, observer: impl FnMut(&StateChange) + 'static) {
        self.state_observers.push(Box::new(observer));
    }

    /// Start counting down `task_id` inside `project_id`.
    ///
    /// A running session is replaced without merging.
    pub fn start(
        &mut self,
        snapshot: &Snapshot,
        project_id: Option<Uuid>,
        task_id: Uuid,
    ) -> Result<(), ValidationError> {
        let project_id = project_id.ok_or(ValidationError::NoProjectSelected)?;
        let project = snapshot
            .project(project_id)
            .ok_or_else(|| ValidationError::ProjectNotFound(project_id.to_string()))?;
        let task = project
            .task(task_id)
            .ok_or_else(|| ValidationError::TaskNotFound(task_id.to_string()))?;
        if task.is_completed() {
            return Err(ValidationError::TaskCompleted(task.name.clone()));
        }

        if let Some(previous) = self.session.as_ref().filter(|s| s.running) {
            info!(
                replaced = %previous.task_name,
                task = %task.name,
                "starting a new session replaces the running one"
            );
        }

        let budget = task.budget();
        self.session = Some(TimerSession {
            project_id,
            task_id,
            project_name: project.name.clone(),
            task_name: task.name.clone(),
            remaining: budget,
            total: budget,
            running: true,
            countdown: format_hms(budget),
            progress: 0.0,
        });
        info!(project = %project.name, task = %task.name, budget = %format_hms(budget), "timer started");
        self.transition(TimerState::Running);
        Ok(())
    }

    /// Advance the running session by one second at wall-clock `now`.
    ///
    /// Returns `None` when no session is running.
    pub fn tick(&mut self, snapshot: &mut Snapshot, now: DateTime<Utc>) -> Option<TickReport> {
        if self.state != TimerState::Running {
            return None;
        }
        let session = self.session.as_mut()?;

        let had_date = snapshot.last_reset_date.is_some();
        let rolled_over = snapshot.roll_daily_counter(now.date_naive()) && had_date;
        if rolled_over {
            info!(date = %now.date_naive(), "daily counter reset");
        }

        session.remaining = subtract_one_second(session.remaining);
        snapshot.accrue_daily();

        match snapshot.project_mut(session.project_id) {
            Some(project) => {
                project.apply_tick();
                match project.task_mut(session.task_id) {
                    Some(task) => {
                        task.apply_tick();
                        project.on_task_changed(TaskField::Remaining);
                        project.on_task_changed(TaskField::Elapsed);
                    }
                    None => debug!(task = %session.task_name, "timed task no longer exists"),
                }
            }
            None => debug!(project = %session.project_name, "timed project no longer exists"),
        }

        session.countdown = format_hms(session.remaining);
        session.progress = progress_percent(session.total, session.remaining);

        let expired = session.remaining <= Duration::zero();
        if expired {
            session.running = false;
            session.countdown = EXPIRED_MARKER.to_string();
            session.progress = 100.0;
            info!(task = %session.task_name, "timer expired");
        }

        let report = TickReport {
            task_id: session.task_id,
            remaining: session.remaining,
            countdown: session.countdown.clone(),
            progress: session.progress,
            expired,
            rolled_over,
        };

        if expired {
            self.transition(TimerState::Expired);
        }
        for observer in &mut self.tick_observers {
            observer(&report);
        }
        Some(report)
    }

    /// Halt the countdown. Stopping twice, or stopping an idle engine, changes nothing.
    pub fn stop(&mut self) -> TimerState {
        match self.state {
            TimerState::Running => {
                if let Some(session) = self.session.as_mut() {
                    session.running = false;
                    session.countdown = STOPPED_MARKER.to_string();
                    info!(task = %session.task_name, remaining = %format_hms(session.remaining), "timer stopped");
                }
                self.transition(TimerState::Stopped);
            }
            TimerState::Expired => {
                if let Some(session) = self.session.as_mut() {
                    session.running = false;
                }
                self.transition(TimerState::Stopped);
            }
            TimerState::Stopped | TimerState::Idle => {}
        }
        self.state
    }

    fn transition(&mut self, to: TimerState) {
        let from = self.state;
        self.state = to;

        let (project_name, task_name) = self
            .session
            .as_ref()
            .map(|s| (s.project_name.clone(), s.task_name.clone()))
            .unwrap_or_default();
        let change = StateChange {
            from,
            to,
            project_name,
            task_name,
        };
        for observer in &mut self.state_observers {
            observer(&change);
        }
    }
}

/// `100 * (total - remaining) / total`, clamped to 0..=100; a zero total counts as done
pub fn progress_percent(total: Duration, remaining: Duration) -> f64 {
    let total_secs = total.num_seconds();
    if total_secs <= 0 {
        return 100.0;
    }
    let done_secs = (total - remaining).num_seconds() as f64;
    (100.0 * done_secs / total_secs as f64).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Project, Task, TaskList};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, s).unwrap()
    }

    /// Snapshot with project "Study" holding one task "Read"
    fn study(expected: Duration) -> (Snapshot, Uuid, Uuid) {
        let mut snapshot = Snapshot::new("tester");
        let mut project = Project::new("Study");
        let task = Task::new("Read", expected, at(8, 0, 0));
        let task_id = task.id;
        project.add_task(task);
        let project_id = project.id;
        snapshot.projects.push(project);
        (snapshot, project_id, task_id)
    }

    #[test]
    fn test_scenario_expiry_does_not_complete() {
        let (mut snapshot, project_id, task_id) = study(Duration::seconds(2));
        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), task_id).unwrap();

        engine.tick(&mut snapshot, at(9, 0, 1)).unwrap();
        let report = engine.tick(&mut snapshot, at(9, 0, 2)).unwrap();

        assert!(report.expired);
        let session = engine.session().unwrap();
        assert_eq!(session.remaining, Duration::zero());
        assert_eq!(engine.countdown(), EXPIRED_MARKER);
        assert_eq!(engine.progress(), 100.0);
        assert_eq!(engine.state(), TimerState::Expired);

        let project = snapshot.project(project_id).unwrap();
        assert_eq!(project.active_tasks().len(), 1);
        assert!(!project.active_tasks()[0].is_completed());
    }

    #[test]
    fn test_tick_conservation() {
        let (mut snapshot, project_id, task_id) = study(Duration::minutes(1));
        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        engine.tick(&mut snapshot, at(9, 0, 1));

        let (project, task) = snapshot.find_task(task_id).unwrap();
        assert_eq!(project.time_spent, Duration::seconds(1));
        assert_eq!(task.elapsed_duration, Duration::seconds(1));
        assert_eq!(task.remaining_duration, Some(Duration::seconds(59)));
        assert_eq!(snapshot.today_accumulated, Duration::seconds(1));
        assert_eq!(engine.session().unwrap().remaining, Duration::seconds(59));
        assert_eq!(engine.countdown(), "00:00:59");
    }

    #[test]
    fn test_zero_budget_holds_at_zero() {
        let (mut snapshot, project_id, task_id) = study(Duration::zero());
        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        assert_eq!(engine.progress(), 0.0);

        let report = engine.tick(&mut snapshot, at(9, 0, 1)).unwrap();
        assert!(report.expired);
        assert_eq!(report.remaining, Duration::zero());
        assert_eq!(engine.progress(), 100.0);

        let (project, task) = snapshot.find_task(task_id).unwrap();
        assert_eq!(project.time_spent, Duration::seconds(1));
        assert_eq!(task.elapsed_duration, Duration::seconds(1));
        assert_eq!(task.remaining_duration, Some(Duration::zero()));
    }

    #[test]
    fn test_complete_running_task_then_tick() {
        let (mut snapshot, project_id, task_id) = study(Duration::minutes(1));
        let other = Task::new("Write", Duration::minutes(5), at(8, 0, 0));
        snapshot.project_mut(project_id).unwrap().add_task(other);

        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        engine.tick(&mut snapshot, at(9, 0, 1));

        toggle_completion(&mut snapshot, task_id, true, at(9, 0, 1)).unwrap();
        let before = snapshot.find_task(task_id).unwrap().1.clone();

        let report = engine.tick(&mut snapshot, at(9, 0, 2)).unwrap();
        assert_eq!(report.remaining, Duration::seconds(58));
        assert_eq!(engine.state(), TimerState::Running);

        let project = snapshot.project(project_id).unwrap();
        assert_eq!(project.locate(task_id), Some(TaskList::Completed));
        assert_eq!(project.estimated_duration(), Duration::minutes(5));
        assert_eq!(project.time_spent, Duration::seconds(2));

        let task = project.task(task_id).unwrap();
        assert!(task.is_completed());
        assert_eq!(task.completed_at(), before.completed_at());
        assert_eq!(task.completed_at(), Some(at(9, 0, 1)));
        assert_eq!(task.elapsed_duration, before.elapsed_duration + Duration::seconds(1));
        assert_eq!(
            task.remaining_duration,
            before.remaining_duration.map(|r| r - Duration::seconds(1))
        );
        assert_eq!(task.remaining_duration, Some(Duration::seconds(58)));
    }

    #[test]
    fn test_progress_bounds() {
        let (mut snapshot, project_id, task_id) = study(Duration::seconds(4));
        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        assert_eq!(engine.progress(), 0.0);

        let mut seen = Vec::new();
        for s in 1..=4 {
            let report = engine.tick(&mut snapshot, at(9, 0, s)).unwrap();
            seen.push(report.progress);
        }
        assert_eq!(seen, vec![25.0, 50.0, 75.0, 100.0]);
        assert!(engine.tick(&mut snapshot, at(9, 0, 5)).is_none());
    }

    #[test]
    fn test_progress_percent_guards() {
        assert_eq!(progress_percent(Duration::zero(), Duration::zero()), 100.0);
        assert_eq!(progress_percent(Duration::seconds(10), Duration::seconds(10)), 0.0);
        assert_eq!(progress_percent(Duration::seconds(10), Duration::seconds(20)), 0.0);
        assert_eq!(progress_percent(Duration::seconds(10), Duration::seconds(-5)), 100.0);
    }

    #[test]
    fn test_resume_uses_remaining_budget() {
        let (mut snapshot, project_id, task_id) = study(Duration::seconds(10));
        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        for s in 1..=3 {
            engine.tick(&mut snapshot, at(9, 0, s));
        }
        engine.stop();

        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        let session = engine.session().unwrap();
        assert_eq!(session.total, Duration::seconds(7));
        assert_eq!(session.countdown, "00:00:07");
    }

    #[test]
    fn test_start_validation() {
        let (snapshot, project_id, task_id) = study(Duration::seconds(10));
        let mut engine = TimerEngine::new();

        assert_eq!(
            engine.start(&snapshot, None, task_id),
            Err(ValidationError::NoProjectSelected)
        );
        assert!(matches!(
            engine.start(&snapshot, Some(Uuid::new_v4()), task_id),
            Err(ValidationError::ProjectNotFound(_))
        ));
        assert!(matches!(
            engine.start(&snapshot, Some(project_id), Uuid::new_v4()),
            Err(ValidationError::TaskNotFound(_))
        ));
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(engine.session().is_none());
    }

    #[test]
    fn test_start_rejects_completed_task() {
        let (mut snapshot, project_id, task_id) = study(Duration::seconds(10));
        toggle_completion(&mut snapshot, task_id, true, at(9, 0, 0)).unwrap();

        let mut engine = TimerEngine::new();
        assert_eq!(
            engine.start(&snapshot, Some(project_id), task_id),
            Err(ValidationError::TaskCompleted("Read".into()))
        );
    }

    #[test]
    fn test_stop_semantics() {
        let (mut snapshot, project_id, task_id) = study(Duration::seconds(10));
        let mut engine = TimerEngine::new();
        assert_eq!(engine.stop(), TimerState::Idle);

        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        engine.tick(&mut snapshot, at(9, 0, 1));
        assert_eq!(engine.stop(), TimerState::Stopped);
        assert_eq!(engine.countdown(), STOPPED_MARKER);
        assert!(!engine.is_running());

        // Ticks after stop are ignored
        assert!(engine.tick(&mut snapshot, at(9, 0, 2)).is_none());
        assert_eq!(snapshot.project(project_id).unwrap().time_spent, Duration::seconds(1));

        // Double stop stays stopped
        assert_eq!(engine.stop(), TimerState::Stopped);
    }

    #[test]
    fn test_stop_after_expiry() {
        let (mut snapshot, project_id, task_id) = study(Duration::seconds(1));
        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        engine.tick(&mut snapshot, at(9, 0, 1));
        assert_eq!(engine.state(), TimerState::Expired);

        assert_eq!(engine.stop(), TimerState::Stopped);
        assert!(!engine.session().unwrap().running);
        assert_eq!(engine.countdown(), EXPIRED_MARKER);
    }

    #[test]
    fn test_start_replaces_running_session() {
        let (mut snapshot, project_id, first) = study(Duration::seconds(10));
        let second = Task::new("Write", Duration::seconds(20), at(8, 0, 0));
        let second_id = second.id;
        snapshot.project_mut(project_id).unwrap().add_task(second);

        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), first).unwrap();
        engine.tick(&mut snapshot, at(9, 0, 1));
        engine.start(&snapshot, Some(project_id), second_id).unwrap();
        engine.tick(&mut snapshot, at(9, 0, 2));

        let project = snapshot.project(project_id).unwrap();
        assert_eq!(project.task(first).unwrap().elapsed_duration, Duration::seconds(1));
        assert_eq!(project.task(second_id).unwrap().elapsed_duration, Duration::seconds(1));
        assert_eq!(project.time_spent, Duration::seconds(2));
        assert_eq!(engine.running_task(), Some(second_id));
    }

    #[test]
    fn test_rollover_mid_timer() {
        let (mut snapshot, project_id, task_id) = study(Duration::minutes(5));
        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), task_id).unwrap();

        let before_midnight = Utc.with_ymd_and_hms(2024, 5, 6, 23, 59, 59).unwrap();
        let after_midnight = Utc.with_ymd_and_hms(2024, 5, 7, 0, 0, 0).unwrap();

        let first = engine.tick(&mut snapshot, before_midnight).unwrap();
        assert!(!first.rolled_over);
        engine.tick(&mut snapshot, before_midnight);
        assert_eq!(snapshot.today_accumulated, Duration::seconds(2));

        let report = engine.tick(&mut snapshot, after_midnight).unwrap();
        assert!(report.rolled_over);
        assert_eq!(snapshot.today_accumulated, Duration::seconds(1));
        assert_eq!(snapshot.project(project_id).unwrap().time_spent, Duration::seconds(3));
    }

    #[test]
    fn test_tick_after_task_deleted() {
        let (mut snapshot, project_id, task_id) = study(Duration::seconds(10));
        let mut engine = TimerEngine::new();
        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        snapshot.project_mut(project_id).unwrap().remove_task(task_id);

        let report = engine.tick(&mut snapshot, at(9, 0, 1)).unwrap();
        assert_eq!(report.remaining, Duration::seconds(9));
        assert_eq!(snapshot.project(project_id).unwrap().time_spent, Duration::seconds(1));
    }

    #[test]
    fn test_observers() {
        let (mut snapshot, project_id, task_id) = study(Duration::seconds(2));
        let mut engine = TimerEngine::new();

        let ticks = Rc::new(RefCell::new(Vec::new()));
        let changes = Rc::new(RefCell::new(Vec::new()));
        let tick_log = Rc::clone(&ticks);
        let change_log = Rc::clone(&changes);
        engine.on_tick(move |report| tick_log.borrow_mut().push(report.countdown.clone()));
        engine.on_state_change(move |change| change_log.borrow_mut().push((change.from, change.to)));

        engine.start(&snapshot, Some(project_id), task_id).unwrap();
        engine.tick(&mut snapshot, at(9, 0, 1));
        engine.tick(&mut snapshot, at(9, 0, 2));
        engine.stop();

        assert_eq!(*ticks.borrow(), vec!["00:00:01".to_string(), EXPIRED_MARKER.to_string()]);
        assert_eq!(
            *changes.borrow(),
            vec![
                (TimerState::Idle, TimerState::Running),
                (TimerState::Running, TimerState::Expired),
                (TimerState::Expired, TimerState::Stopped),
            ]
        );
    }
}
