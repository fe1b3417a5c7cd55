use crate::config::AppConfig;
use crate::domain::{parse_hms, Focus, Snapshot, StatsFilter, Task, TaskField, TimerState, UiMode};
use crate::engine::{CompletionOutcome, TickReport, TimerEngine};
use crate::error::ValidationError;
use crate::notifications;
use crate::persistence::{AutoSaver, SnapshotStore};
use crate::report::{StatsSummary, StatsView};
use crate::ticker::SecondTicker;
use chrono::{DateTime, Duration, Local, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Input form state for the add/rename/edit dialogs
#[derive(Debug, Clone, PartialEq)]
pub struct InputFormState {
    pub name: String,
    pub expected: String,
    pub editing_field: usize, // 0 = name, 1 = expected
    /// Project or task the form edits; `None` when adding
    pub target: Option<Uuid>,
}

/// Main application state: the snapshot, the timer, and everything the UI selects
pub struct AppState {
    pub snapshot: Snapshot,
    pub engine: TimerEngine,
    pub stats: StatsView,
    pub selected_project: usize,
    pub selected_task: usize, // index into active tasks followed by completed tasks
    pub focus: Focus,
    pub ui_mode: UiMode,
    pub input_form: Option<InputFormState>,
    pub status: Option<String>,
    pub ticker: SecondTicker,
    default_expected: Duration,
    notifications: bool,
    saver: AutoSaver,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn SnapshotStore>) -> Self {
        let snapshot = store.load(&config.user_id);
        info!(
            user = %snapshot.user_id,
            projects = snapshot.projects.len(),
            active = snapshot.active_task_count(),
            completed = snapshot.completed_task_count(),
            "snapshot loaded"
        );

        let mut engine = TimerEngine::new();
        if config.notifications {
            engine.on_state_change(|change| {
                if change.to == TimerState::Expired {
                    notifications::notify_timer_expired(&change.project_name, &change.task_name);
                }
            });
        }

        Self {
            snapshot,
            engine,
            stats: StatsView::new(config.default_filter),
            selected_project: 0,
            selected_task: 0,
            focus: Focus::Projects,
            ui_mode: UiMode::Normal,
            input_form: None,
            status: None,
            ticker: SecondTicker::new(Instant::now()),
            default_expected: config.default_expected_duration(),
            notifications: config.notifications,
            saver: AutoSaver::spawn(store),
        }
    }

    /// Queue an autosave of the whole snapshot
    fn autosave(&self) {
        self.saver.request(&self.snapshot);
    }

    /// Block until queued saves are written
    pub fn flush(&self) {
        self.saver.flush();
    }

    /// Most recent save failure, if the last save did not succeed
    pub fn save_error(&self) -> Option<String> {
        self.saver.last_error()
    }

    // ---- Command surface ----

    pub fn add_project(&mut self, name: &str) -> Result<Uuid, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        let project = crate::domain::Project::new(name);
        let id = project.id;
        self.snapshot.projects.push(project);
        info!(project = %name, "project added");
        self.autosave();
        Ok(id)
    }

    pub fn add_task(
        &mut self,
        project_id: Option<Uuid>,
        name: &str,
        expected: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, ValidationError> {
        let project_id = project_id.ok_or(ValidationError::NoProjectSelected)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyTaskName);
        }
        let expected = parse_expected(expected)?;
        let project = self
            .snapshot
            .project_mut(project_id)
            .ok_or_else(|| ValidationError::ProjectNotFound(project_id.to_string()))?;

        let task = Task::new(name, expected, now);
        let id = task.id;
        project.add_task(task);
        info!(project = %project.name, task = %name, "task added");
        self.autosave();
        Ok(id)
    }

    /// Remove a task from either list; a timer running against it is stopped first
    pub fn delete_task(&mut self, project_id: Option<Uuid>, task_id: Uuid) -> Result<Task, ValidationError> {
        let project_id = project_id.ok_or(ValidationError::NoProjectSelected)?;
        let project = self
            .snapshot
            .project(project_id)
            .ok_or_else(|| ValidationError::ProjectNotFound(project_id.to_string()))?;
        if project.locate(task_id).is_none() {
            return Err(ValidationError::TaskNotFound(task_id.to_string()));
        }

        if self.engine.running_task() == Some(task_id) {
            self.engine.stop();
        }

        let project = self
            .snapshot
            .project_mut(project_id)
            .ok_or_else(|| ValidationError::ProjectNotFound(project_id.to_string()))?;
        let removed = project
            .remove_task(task_id)
            .ok_or_else(|| ValidationError::TaskNotFound(task_id.to_string()))?;
        info!(project = %project.name, task = %removed.name, "task deleted");
        self.clamp_selection();
        self.autosave();
        Ok(removed)
    }

    pub fn start_task(&mut self, project_id: Option<Uuid>, task_id: Uuid) -> Result<(), ValidationError> {
        self.engine.start(&self.snapshot, project_id, task_id)?;
        self.ticker.reset(Instant::now());
        self.autosave();
        Ok(())
    }

    pub fn stop_timer(&mut self) -> TimerState {
        let state = self.engine.stop();
        self.autosave();
        state
    }

    pub fn toggle_completion(
        &mut self,
        task_id: Uuid,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, ValidationError> {
        let outcome = crate::engine::toggle_completion(&mut self.snapshot, task_id, completed, now)?;
        if outcome == CompletionOutcome::Completed && self.notifications {
            if let Some((_, task)) = self.snapshot.find_task(task_id) {
                notifications::notify_task_completed(&task.name);
            }
        }
        if outcome != CompletionOutcome::Unchanged {
            self.autosave();
        }
        Ok(outcome)
    }

    pub fn set_filter(&mut self, filter: StatsFilter) {
        self.stats.set_filter(filter);
        self.autosave();
    }

    pub fn rename_project(&mut self, project_id: Uuid, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        let project = self
            .snapshot
            .project_mut(project_id)
            .ok_or_else(|| ValidationError::ProjectNotFound(project_id.to_string()))?;
        project.name = name.to_string();
        self.autosave();
        Ok(())
    }

    pub fn rename_task(&mut self, task_id: Uuid, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyTaskName);
        }
        self.edit_task(task_id, TaskField::Name, |task| task.name = name.to_string())
    }

    /// Change a task's budget; its carried countdown restarts from the new value
    pub fn edit_expected(&mut self, task_id: Uuid, expected: &str) -> Result<(), ValidationError> {
        let expected = parse_expected(expected)?;
        self.edit_task(task_id, TaskField::Expected, |task| task.set_expected(expected))
    }

    pub fn set_priority(&mut self, task_id: Uuid, priority: i32) -> Result<(), ValidationError> {
        self.edit_task(task_id, TaskField::Priority, |task| task.priority = priority)
    }

    fn edit_task(
        &mut self,
        task_id: Uuid,
        field: TaskField,
        edit: impl FnOnce(&mut Task),
    ) -> Result<(), ValidationError> {
        let idx = self
            .snapshot
            .project_index_of_task(task_id)
            .ok_or_else(|| ValidationError::TaskNotFound(task_id.to_string()))?;
        let project = &mut self.snapshot.projects[idx];
        let task = project
            .task_mut(task_id)
            .ok_or_else(|| ValidationError::TaskNotFound(task_id.to_string()))?;
        edit(task);
        project.on_task_changed(field);
        self.autosave();
        Ok(())
    }

    /// One engine second at wall-clock `now`
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TickReport> {
        let report = self.engine.tick(&mut self.snapshot, now)?;
        if report.expired {
            if let Some(session) = self.engine.session() {
                self.status = Some(format!("Time's up for {}", session.task_name));
            }
        }
        self.autosave();
        Some(report)
    }

    /// Run one tick per whole second elapsed since the last call
    pub fn advance(&mut self, instant: Instant) {
        for _ in 0..self.ticker.due_seconds(instant) {
            if self.tick(Utc::now()).is_none() {
                break;
            }
        }
    }

    pub fn stats_summary(&self) -> StatsSummary {
        self.stats.summarize(&self.snapshot.projects, &Local::now())
    }

    // ---- Lookup by id or name (CLI) ----

    /// Find a project by id or exact name
    pub fn resolve_project(&self, key: &str) -> Result<Uuid, ValidationError> {
        let by_id = Uuid::parse_str(key).ok();
        self.snapshot
            .projects
            .iter()
            .find(|p| Some(p.id) == by_id || p.name == key)
            .map(|p| p.id)
            .ok_or_else(|| ValidationError::ProjectNotFound(key.to_string()))
    }

    /// Find a task by id or exact name, optionally inside one project; returns (project, task)
    pub fn resolve_task(&self, project: Option<Uuid>, key: &str) -> Result<(Uuid, Uuid), ValidationError> {
        let by_id = Uuid::parse_str(key).ok();
        self.snapshot
            .projects
            .iter()
            .filter(|p| project.map_or(true, |id| p.id == id))
            .find_map(|p| {
                p.all_tasks()
                    .find(|t| Some(t.id) == by_id || t.name == key)
                    .map(|t| (p.id, t.id))
            })
            .ok_or_else(|| ValidationError::TaskNotFound(key.to_string()))
    }

    // ---- Selection ----

    pub fn selected_project_id(&self) -> Option<Uuid> {
        self.snapshot.projects.get(self.selected_project).map(|p| p.id)
    }

    /// Tasks of the selected project, active first then completed
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.snapshot
            .projects
            .get(self.selected_project)
            .map(|p| p.all_tasks().collect())
            .unwrap_or_default()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected_task).copied()
    }

    pub fn selected_task_id(&self) -> Option<Uuid> {
        self.selected_task().map(|t| t.id)
    }

    pub fn move_selection_up(&mut self) {
        match self.focus {
            Focus::Projects => {
                if self.selected_project > 0 {
                    self.selected_project -= 1;
                    self.selected_task = 0;
                }
            }
            Focus::Tasks => {
                if self.selected_task > 0 {
                    self.selected_task -= 1;
                }
            }
        }
    }

    pub fn move_selection_down(&mut self) {
        match self.focus {
            Focus::Projects => {
                if self.selected_project + 1 < self.snapshot.projects.len() {
                    self.selected_project += 1;
                    self.selected_task = 0;
                }
            }
            Focus::Tasks => {
                if self.selected_task + 1 < self.visible_tasks().len() {
                    self.selected_task += 1;
                }
            }
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Projects => Focus::Tasks,
            Focus::Tasks => Focus::Projects,
        };
    }

    fn clamp_selection(&mut self) {
        let projects = self.snapshot.projects.len();
        if self.selected_project >= projects {
            self.selected_project = projects.saturating_sub(1);
        }
        let tasks = self.visible_tasks().len();
        if self.selected_task >= tasks {
            self.selected_task = tasks.saturating_sub(1);
        }
    }

    /// Keep the selection on `task_id` after it moved between lists
    fn follow_task(&mut self, task_id: Uuid) {
        if let Some(idx) = self.visible_tasks().iter().position(|t| t.id == task_id) {
            self.selected_task = idx;
        }
    }

    // ---- Actions on the selection (TUI) ----

    fn report<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.status = None;
                Some(value)
            }
            Err(e) => {
                self.status = Some(e.to_string());
                None
            }
        }
    }

    /// Start the selected task, or stop the timer if that task is the one running
    pub fn toggle_timer_on_selected(&mut self) {
        let Some(task_id) = self.selected_task_id() else {
            self.status = Some(ValidationError::TaskNotFound("no task selected".to_string()).to_string());
            return;
        };
        if self.engine.is_running() && self.engine.running_task() == Some(task_id) {
            self.stop_timer();
            return;
        }
        let result = self.start_task(self.selected_project_id(), task_id);
        self.report(result);
    }

    pub fn toggle_completion_on_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let (task_id, completed) = (task.id, !task.is_completed());
        let result = self.toggle_completion(task_id, completed, Utc::now());
        if self.report(result).is_some() {
            self.follow_task(task_id);
        }
    }

    pub fn delete_selected(&mut self) {
        match self.focus {
            Focus::Tasks => {
                if let Some(task_id) = self.selected_task_id() {
                    let result = self.delete_task(self.selected_project_id(), task_id);
                    self.report(result);
                }
            }
            Focus::Projects => {
                self.status = Some("Select a task to delete (Tab switches panes)".to_string());
            }
        }
    }

    pub fn cycle_filter(&mut self) {
        self.set_filter(self.stats.filter().next());
    }

    // ---- Input form ----

    fn open_form(&mut self, mode: UiMode, form: InputFormState) {
        self.input_form = Some(form);
        self.ui_mode = mode;
    }

    pub fn start_add_project(&mut self) {
        self.open_form(
            UiMode::AddingProject,
            InputFormState {
                name: String::new(),
                expected: String::new(),
                editing_field: 0,
                target: None,
            },
        );
    }

    pub fn start_add_task(&mut self) {
        if self.selected_project_id().is_none() {
            self.status = Some(ValidationError::NoProjectSelected.to_string());
            return;
        }
        self.open_form(
            UiMode::AddingTask,
            InputFormState {
                name: String::new(),
                expected: crate::domain::format_hms(self.default_expected),
                editing_field: 0,
                target: None,
            },
        );
    }

    /// Rename the focused project or task
    pub fn start_rename(&mut self) {
        match self.focus {
            Focus::Projects => {
                if let Some(project) = self.snapshot.projects.get(self.selected_project) {
                    let form = InputFormState {
                        name: project.name.clone(),
                        expected: String::new(),
                        editing_field: 0,
                        target: Some(project.id),
                    };
                    self.open_form(UiMode::RenamingProject, form);
                }
            }
            Focus::Tasks => {
                if let Some(task) = self.selected_task() {
                    let form = InputFormState {
                        name: task.name.clone(),
                        expected: String::new(),
                        editing_field: 0,
                        target: Some(task.id),
                    };
                    self.open_form(UiMode::RenamingTask, form);
                }
            }
        }
    }

    pub fn start_edit_expected(&mut self) {
        if let Some(task) = self.selected_task() {
            let form = InputFormState {
                name: task.name.clone(),
                expected: crate::domain::format_hms(task.expected_duration),
                editing_field: 1,
                target: Some(task.id),
            };
            self.open_form(UiMode::EditingExpected, form);
        }
    }

    /// Switch between name and expected fields (add-task form only)
    pub fn input_form_toggle_field(&mut self) {
        if self.ui_mode != UiMode::AddingTask {
            return;
        }
        if let Some(form) = &mut self.input_form {
            form.editing_field = (form.editing_field + 1) % 2;
        }
    }

    /// Add character to input form (current field)
    pub fn input_form_add_char(&mut self, c: char) {
        if let Some(form) = &mut self.input_form {
            match form.editing_field {
                0 => form.name.push(c),
                _ => form.expected.push(c),
            }
        }
    }

    /// Backspace in input form (current field)
    pub fn input_form_backspace(&mut self) {
        if let Some(form) = &mut self.input_form {
            match form.editing_field {
                0 => form.name.pop(),
                _ => form.expected.pop(),
            };
        }
    }

    /// Submit the open form; on a validation error the form stays open
    pub fn submit_input_form(&mut self) {
        let Some(form) = self.input_form.clone() else {
            return;
        };
        let result = match (self.ui_mode, form.target) {
            (UiMode::AddingProject, _) => self.add_project(&form.name).map(|_| ()),
            (UiMode::AddingTask, _) => self
                .add_task(self.selected_project_id(), &form.name, &form.expected, Utc::now())
                .map(|_| ()),
            (UiMode::RenamingProject, Some(id)) => self.rename_project(id, &form.name),
            (UiMode::RenamingTask, Some(id)) => self.rename_task(id, &form.name),
            (UiMode::EditingExpected, Some(id)) => self.edit_expected(id, &form.expected),
            _ => Ok(()),
        };

        if self.report(result).is_some() {
            if self.ui_mode == UiMode::AddingProject {
                self.selected_project = self.snapshot.projects.len().saturating_sub(1);
                self.selected_task = 0;
            }
            self.input_form = None;
            self.ui_mode = UiMode::Normal;
        }
    }

    /// Cancel input form
    pub fn cancel_input_form(&mut self) {
        self.input_form = None;
        self.ui_mode = UiMode::Normal;
    }
}

fn parse_expected(text: &str) -> Result<Duration, ValidationError> {
    parse_hms(text.trim()).map_err(|_| ValidationError::InvalidExpectedTime(text.to_string()))
}
