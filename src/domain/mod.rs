pub mod duration;
pub mod enums;
pub mod project;
pub mod snapshot;
pub mod task;

pub use duration::{format_hms, parse_hms};
pub use enums::{Focus, StatsFilter, TaskField, TimerState, UiMode};
pub use project::{Project, TaskList};
pub use snapshot::Snapshot;
pub use task::Task;
