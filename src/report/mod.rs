pub mod generator;
pub mod stats;

pub use generator::write_report;
pub use stats::{StatsSummary, StatsView};
