use serde::{Deserialize, Serialize};

/// Timer engine state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerState {
    /// No session has been started yet
    Idle,
    /// Counting down once per second
    Running,
    /// Countdown reached zero on its own
    Expired,
    /// Halted by the user
    Stopped,
}

impl TimerState {
    /// Convert state to a short status tag
    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
            Self::Expired => "EXPIRED",
            Self::Stopped => "STOPPED",
        }
    }
}

/// Time window used to scope statistics queries
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum StatsFilter {
    Today,
    ThisWeek,
    LastWeek,
    #[default]
    AllTime,
}

impl StatsFilter {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::ThisWeek => "This Week",
            Self::LastWeek => "Last Week",
            Self::AllTime => "All Time",
        }
    }

    /// File-name friendly form, matching the serialized name
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::ThisWeek => "this-week",
            Self::LastWeek => "last-week",
            Self::AllTime => "all-time",
        }
    }

    /// Get all filters in display order
    pub fn all() -> &'static [StatsFilter] {
        &[
            StatsFilter::Today,
            StatsFilter::ThisWeek,
            StatsFilter::LastWeek,
            StatsFilter::AllTime,
        ]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|f| f == self).unwrap_or(0)
    }

    /// Next filter, wrapping around
    pub fn next(&self) -> Self {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }
}

/// Which task field a mutation touched; drives project recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Name,
    Expected,
    Remaining,
    Elapsed,
    Priority,
    /// The task entered or left the project's active list
    Membership,
}

impl TaskField {
    /// Whether the project's derived estimate depends on this field
    pub fn affects_estimate(&self) -> bool {
        matches!(self, Self::Expected | Self::Membership)
    }
}

/// Which list has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Projects,
    Tasks,
}

/// UI mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Normal,
    AddingProject,
    AddingTask,
    RenamingProject,
    RenamingTask,
    EditingExpected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_cycle() {
        assert_eq!(StatsFilter::Today.next(), StatsFilter::ThisWeek);
        assert_eq!(StatsFilter::AllTime.next(), StatsFilter::Today);
        assert_eq!(StatsFilter::default(), StatsFilter::AllTime);
    }

    #[test]
    fn test_filter_serde_names() {
        let json = serde_json::to_string(&StatsFilter::LastWeek).unwrap();
        assert_eq!(json, "\"last-week\"");
        let parsed: StatsFilter = serde_json::from_str("\"this-week\"").unwrap();
        assert_eq!(parsed, StatsFilter::ThisWeek);
    }

    #[test]
    fn test_task_field_affects_estimate() {
        assert!(TaskField::Expected.affects_estimate());
        assert!(TaskField::Membership.affects_estimate());
        assert!(!TaskField::Elapsed.affects_estimate());
        assert!(!TaskField::Remaining.affects_estimate());
    }

    #[test]
    fn test_timer_state_tag() {
        assert_eq!(TimerState::Expired.to_tag(), "EXPIRED");
    }
}
