/// Desktop notifications.
/// Currently only implements macOS notifications; other platforms are a no-op.

#[cfg(target_os = "macos")]
use std::process::Command;

fn send(title: &str, body: &str) {
    #[cfg(target_os = "macos")]
    {
        let script = format!(
            r#"display notification "{}" with title "{}""#,
            body.replace('"', "\\\""),
            title.replace('"', "\\\"")
        );

        if let Err(e) = Command::new("osascript").arg("-e").arg(&script).output() {
            tracing::debug!(error = %e, "notification not delivered");
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = (title, body);
    }
}

/// Send a notification when a task's countdown reaches zero
pub fn notify_timer_expired(project_name: &str, task_name: &str) {
    send("Timetally - Time's up!", &format!("⏰ {} ({})", task_name, project_name));
}

/// Send a notification when a task is completed
pub fn notify_task_completed(task_name: &str) {
    send("Timetally - Task Completed", task_name);
}
