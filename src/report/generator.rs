use crate::domain::{format_hms, Snapshot, StatsFilter};
use crate::persistence::atomic_write;
use crate::report::stats::{filtered_completed_tasks, project_stats, StatsView};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone};
use std::path::{Path, PathBuf};

/// Format duration as "Xh Ym" or "Xm" for prose lines
fn format_duration(duration: Duration) -> String {
    let total_mins = duration.num_minutes();
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// Render a markdown report of the snapshot for one statistics window
pub fn render_report<Tz: TimeZone>(snapshot: &Snapshot, filter: StatsFilter, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let summary = StatsView::new(filter).summarize(&snapshot.projects, now);
    let mut report = String::new();

    // Header
    report.push_str(&format!("# Time Report - {} ({})\n\n", filter.label(), snapshot.user_id));
    report.push_str(&format!("_Generated {}_\n\n", now.format("%Y-%m-%d %H:%M")));

    // Summary Section
    report.push_str("## Summary\n\n");
    report.push_str(&format!(
        "- **Total Time Spent:** {} ({})\n",
        format_hms(summary.total_time_spent),
        format_duration(summary.total_time_spent)
    ));
    report.push_str(&format!(
        "- **Tasks:** {} (Active: {}, Completed: {})\n",
        summary.active_count + summary.completed_count,
        summary.active_count,
        summary.completed_count
    ));
    report.push_str(&format!("- **Completion Rate:** {}\n", summary.completion_rate));
    if let Some(date) = snapshot.last_reset_date {
        report.push_str(&format!(
            "- **Tracked On {}:** {}\n",
            date,
            format_hms(snapshot.today_accumulated)
        ));
    }
    report.push('\n');

    // Window Section
    report.push_str(&format!("## {}\n\n", filter.label()));
    report.push_str(&format!("- **Completed Tasks:** {}\n", summary.filtered_completed_count));
    report.push_str(&format!("- **Time On Completed Tasks:** {}\n", format_hms(summary.filtered_time_spent)));
    report.push_str(&format!("- **Completion Rate:** {}\n\n", summary.filtered_completion_rate));

    let completed = filtered_completed_tasks(&snapshot.projects, filter, now);
    if !completed.is_empty() {
        report.push_str("| Task | Elapsed | Expected | Completed |\n");
        report.push_str("|------|---------|----------|-----------|\n");
        for task in completed {
            let when = task
                .completed_at()
                .map(|t| t.with_timezone(&now.timezone()).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            report.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                task.name,
                format_hms(task.elapsed_duration),
                format_hms(task.expected_duration),
                when
            ));
        }
        report.push('\n');
    }

    // Projects Section
    let projects = project_stats(&snapshot.projects);
    if !projects.is_empty() {
        report.push_str("## Projects\n\n");
        report.push_str("| Project | Time Spent | Estimated | Active | Completed | Rate |\n");
        report.push_str("|---------|------------|-----------|--------|-----------|------|\n");
        for p in projects {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                p.name,
                format_hms(p.time_spent),
                format_hms(p.estimated),
                p.active_count,
                p.completed_count,
                p.completion_rate
            ));
        }
        report.push('\n');
    }

    report
}

/// Write a report to `output`, or to `<data dir>/report-<filter>.md`
pub fn write_report<Tz: TimeZone>(
    snapshot: &Snapshot,
    filter: StatsFilter,
    now: &DateTime<Tz>,
    data_dir: &Path,
    output: Option<PathBuf>,
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let path = output.unwrap_or_else(|| data_dir.join(format!("report-{}.md", filter.slug())));
    let report = render_report(snapshot, filter, now);
    atomic_write(&path, &report).with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(path)
}
