//! Read-only statistics over the project graph.
//!
//! Nothing here mutates; every function takes the projects and, for windowed
//! queries, the current instant in the caller's time zone.

use crate::domain::duration::add;
use crate::domain::{Project, StatsFilter, Task};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;

/// A whole-number percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rate(pub u32);

impl Rate {
    /// `part * 100 / whole`, rounded half away from zero; zero when `whole` is zero
    pub fn of(part: usize, whole: usize) -> Self {
        if whole == 0 {
            return Rate(0);
        }
        Rate(((part as f64 * 100.0) / whole as f64).round() as u32)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Time span a filter selects, in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Everything, including tasks without a timestamp
    Unbounded,
    /// `[start, ∞)`
    Since(DateTime<Utc>),
    /// `[start, end]`
    Closed(DateTime<Utc>, DateTime<Utc>),
    /// `[start, end)`
    HalfOpen(DateTime<Utc>, DateTime<Utc>),
}

impl Window {
    pub fn for_filter<Tz: TimeZone>(filter: StatsFilter, now: &DateTime<Tz>) -> Self {
        match filter {
            StatsFilter::Today => Window::Since(start_of_day(now)),
            StatsFilter::ThisWeek => Window::Closed(start_of_week(now), now.with_timezone(&Utc)),
            StatsFilter::LastWeek => {
                let this_week = start_of_week(now);
                let tz = now.timezone();
                let week_start_date = this_week.with_timezone(&tz).date_naive();
                let last_week = local_midnight(&tz, week_start_date - Duration::days(7));
                Window::HalfOpen(last_week, this_week)
            }
            StatsFilter::AllTime => Window::Unbounded,
        }
    }

    pub fn contains(&self, instant: Option<DateTime<Utc>>) -> bool {
        match (self, instant) {
            (Window::Unbounded, _) => true,
            (_, None) => false,
            (Window::Since(start), Some(t)) => t >= *start,
            (Window::Closed(start, end), Some(t)) => t >= *start && t <= *end,
            (Window::HalfOpen(start, end), Some(t)) => t >= *start && t < *end,
        }
    }
}

/// Midnight of `date` in `tz`, as UTC. A midnight skipped by a DST jump falls back to UTC midnight.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive).earliest() {
        Some(midnight) => midnight.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

/// Local midnight of `now`'s day
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    local_midnight(&now.timezone(), now.date_naive())
}

/// Local midnight of the most recent Sunday (weekday index 0)
pub fn start_of_week<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let date = now.date_naive();
    let days_since = i64::from(date.weekday().num_days_from_sunday());
    local_midnight(&now.timezone(), date - Duration::days(days_since))
}

/// Sum of every project's time spent
pub fn total_time_spent(projects: &[Project]) -> Duration {
    projects
        .iter()
        .map(|p| p.time_spent)
        .fold(Duration::zero(), add)
}

pub fn total_completed_count(projects: &[Project]) -> usize {
    projects.iter().map(|p| p.completed_tasks().len()).sum()
}

pub fn total_active_count(projects: &[Project]) -> usize {
    projects.iter().map(|p| p.active_tasks().len()).sum()
}

/// Completed share of all tasks
pub fn completion_rate(projects: &[Project]) -> Rate {
    let completed = total_completed_count(projects);
    Rate::of(completed, completed + total_active_count(projects))
}

/// Every completed task whose completion time falls in the filter window
pub fn filtered_completed_tasks<'a, Tz: TimeZone>(
    projects: &'a [Project],
    filter: StatsFilter,
    now: &DateTime<Tz>,
) -> Vec<&'a Task> {
    let window = Window::for_filter(filter, now);
    projects
        .iter()
        .flat_map(|p| p.completed_tasks())
        .filter(|t| window.contains(t.completed_at()))
        .collect()
}

/// Elapsed time of the filtered completed tasks
pub fn filtered_total_time_spent<Tz: TimeZone>(
    projects: &[Project],
    filter: StatsFilter,
    now: &DateTime<Tz>,
) -> Duration {
    filtered_completed_tasks(projects, filter, now)
        .iter()
        .map(|t| t.elapsed_duration)
        .fold(Duration::zero(), add)
}

/// Completed-in-window over (completed-in-window + active tasks created in window).
///
/// Active tasks have no completion time, so they are placed in the window by
/// creation time instead. For `AllTime` every active task counts.
pub fn filtered_completion_rate<Tz: TimeZone>(
    projects: &[Project],
    filter: StatsFilter,
    now: &DateTime<Tz>,
) -> Rate {
    let window = Window::for_filter(filter, now);
    let completed = filtered_completed_tasks(projects, filter, now).len();
    let active = projects
        .iter()
        .flat_map(|p| p.active_tasks())
        .filter(|t| window.contains(Some(t.created_at)))
        .count();
    Rate::of(completed, completed + active)
}

/// Per-project figures for reports
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectStats {
    pub name: String,
    pub time_spent: Duration,
    pub estimated: Duration,
    pub active_count: usize,
    pub completed_count: usize,
    pub completion_rate: Rate,
}

pub fn project_stats(projects: &[Project]) -> Vec<ProjectStats> {
    projects
        .iter()
        .map(|p| {
            let active_count = p.active_tasks().len();
            let completed_count = p.completed_tasks().len();
            ProjectStats {
                name: p.name.clone(),
                time_spent: p.time_spent,
                estimated: p.estimated_duration(),
                active_count,
                completed_count,
                completion_rate: Rate::of(completed_count, active_count + completed_count),
            }
        })
        .collect()
}

/// Everything the statistics panel shows
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub filter: StatsFilter,
    pub total_time_spent: Duration,
    pub completed_count: usize,
    pub active_count: usize,
    pub completion_rate: Rate,
    pub filtered_completed_count: usize,
    pub filtered_time_spent: Duration,
    pub filtered_completion_rate: Rate,
}

/// Holds the selected filter; the only state the aggregator keeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsView {
    filter: StatsFilter,
}

impl StatsView {
    pub fn new(filter: StatsFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> StatsFilter {
        self.filter
    }

    /// Select a filter; the previous selection is replaced
    pub fn set_filter(&mut self, filter: StatsFilter) {
        self.filter = filter;
    }

    pub fn summarize<Tz: TimeZone>(&self, projects: &[Project], now: &DateTime<Tz>) -> StatsSummary {
        StatsSummary {
            filter: self.filter,
            total_time_spent: total_time_spent(projects),
            completed_count: total_completed_count(projects),
            active_count: total_active_count(projects),
            completion_rate: completion_rate(projects),
            filtered_completed_count: filtered_completed_tasks(projects, self.filter, now).len(),
            filtered_time_spent: filtered_total_time_spent(projects, self.filter, now),
            filtered_completion_rate: filtered_completion_rate(projects, self.filter, now),
        }
    }
}
