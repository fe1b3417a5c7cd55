mod app;
mod config;
mod domain;
mod engine;
mod error;
mod input;
mod notifications;
mod persistence;
mod report;
mod ticker;
mod ui;

use anyhow::{Context, Result};
use app::AppState;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use config::{AppConfig, Overrides};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use domain::{format_hms, StatsFilter};
use engine::CompletionOutcome;
use persistence::{ensure_dir, init_local_dir, log_file, JsonFileStore};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timetally")]
#[command(about = "A terminal time tracker: projects, tasks, countdown timers and statistics", long_about = None)]
#[command(version)]
struct Cli {
    /// User whose data to open (letters, digits, '-' and '_')
    #[arg(long, global = true)]
    user: Option<String>,
    /// Data directory. Defaults to a local .timetally or the platform data dir.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .timetally directory in the current directory
    Init,
    /// Add a project
    AddProject { name: String },
    /// Add a task to a project (by id or name)
    AddTask {
        project: String,
        name: String,
        /// Expected time, HH:MM:SS. Defaults to the configured default.
        #[arg(short, long)]
        expected: Option<String>,
    },
    /// List projects and their tasks
    List,
    /// Mark a task completed
    Complete {
        task: String,
        /// Only look inside this project
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Move a completed task back to the active list
    Reopen {
        task: String,
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Delete a task
    DeleteTask {
        task: String,
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Print statistics for a window
    Stats {
        #[arg(short, long, value_enum)]
        filter: Option<StatsFilter>,
    },
    /// Write a markdown report for a window
    Report {
        #[arg(short, long, value_enum)]
        filter: Option<StatsFilter>,
        /// Output file path. Defaults to <data dir>/report-<filter>.md
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Init) = cli.command {
        let current_dir = std::env::current_dir().context("Could not determine current directory")?;
        let dir = init_local_dir(&current_dir)?;
        println!("Initialized timetally directory: {}", dir.display());
        println!();
        println!("Timetally will now use this local directory for its data.");
        println!("Run 'timetally' to start tracking time.");
        return Ok(());
    }

    let overrides = Overrides {
        user: cli.user.clone(),
        data_dir: cli.data_dir.clone(),
    };
    let config = AppConfig::load(&overrides)?;
    let data_dir = config.data_dir();
    ensure_dir(&data_dir)?;

    match cli.command {
        None => {
            init_logging(&config, true)?;
            run_tui(&config)
        }
        Some(command) => {
            init_logging(&config, false)?;
            run_command(&config, command)
        }
    }
}

/// Log to `<data dir>/timetally.log` while the TUI owns the terminal, stderr otherwise
fn init_logging(config: &AppConfig, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if to_file {
        let path = log_file(&config.data_dir());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .compact()
            .init();
    }
    Ok(())
}

fn open_app(config: &AppConfig) -> AppState {
    let store = Arc::new(JsonFileStore::new(config.data_dir()));
    AppState::new(config, store)
}

/// Resolve an optional project key, then a task key inside it
fn resolve(app: &AppState, project: Option<&str>, task: &str) -> Result<(uuid::Uuid, uuid::Uuid)> {
    let project = project.map(|key| app.resolve_project(key)).transpose()?;
    Ok(app.resolve_task(project, task)?)
}

fn run_command(config: &AppConfig, command: Commands) -> Result<()> {
    let mut app = open_app(config);

    match command {
        Commands::Init => {}
        Commands::AddProject { name } => {
            let id = app.add_project(&name)?;
            println!("Added project '{}' ({})", name.trim(), id);
        }
        Commands::AddTask {
            project,
            name,
            expected,
        } => {
            let project_id = app.resolve_project(&project)?;
            let expected = expected.unwrap_or_else(|| config.default_expected.clone());
            let id = app.add_task(Some(project_id), &name, &expected, Utc::now())?;
            println!("Added task '{}' ({}) to '{}'", name.trim(), id, project);
        }
        Commands::List => print_list(&app),
        Commands::Complete { task, project } => {
            let (_, task_id) = resolve(&app, project.as_deref(), &task)?;
            match app.toggle_completion(task_id, true, Utc::now())? {
                CompletionOutcome::Unchanged => println!("'{}' is already completed", task),
                _ => println!("Completed '{}'", task),
            }
        }
        Commands::Reopen { task, project } => {
            let (_, task_id) = resolve(&app, project.as_deref(), &task)?;
            match app.toggle_completion(task_id, false, Utc::now())? {
                CompletionOutcome::Unchanged => println!("'{}' is already active", task),
                _ => println!("Reopened '{}'", task),
            }
        }
        Commands::DeleteTask { task, project } => {
            let (project_id, task_id) = resolve(&app, project.as_deref(), &task)?;
            let removed = app.delete_task(Some(project_id), task_id)?;
            println!("Deleted '{}'", removed.name);
        }
        Commands::Stats { filter } => {
            app.stats.set_filter(filter.unwrap_or(config.default_filter));
            print_stats(&app);
        }
        Commands::Report { filter, output } => {
            let filter = filter.unwrap_or(config.default_filter);
            let path = report::write_report(&app.snapshot, filter, &Local::now(), &config.data_dir(), output)?;
            println!("Report generated: {}", path.display());
        }
    }

    app.flush();
    if let Some(err) = app.save_error() {
        anyhow::bail!("Failed to save: {}", err);
    }
    Ok(())
}

fn print_list(app: &AppState) {
    if app.snapshot.projects.is_empty() {
        println!("No projects yet. Add one with 'timetally add-project <name>'.");
        return;
    }
    for project in &app.snapshot.projects {
        println!(
            "{}  [{} spent, {} estimated]  {}",
            project.name,
            format_hms(project.time_spent),
            format_hms(project.estimated_duration()),
            project.id
        );
        for task in project.active_tasks() {
            println!(
                "  ○ {}  {} / {}  {}",
                task.name,
                format_hms(task.elapsed_duration),
                format_hms(task.expected_duration),
                task.id
            );
        }
        for task in project.completed_tasks() {
            let when = task
                .completed_at()
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!(
                "  ✓ {}  {} / {}  {}  {}",
                task.name,
                format_hms(task.elapsed_duration),
                format_hms(task.expected_duration),
                when,
                task.id
            );
        }
    }
}

fn print_stats(app: &AppState) {
    let summary = app.stats_summary();
    println!("Total time spent:  {}", format_hms(summary.total_time_spent));
    println!(
        "Tasks:             {} active, {} completed ({})",
        summary.active_count, summary.completed_count, summary.completion_rate
    );
    println!();
    println!("{}:", summary.filter.label());
    println!("  Completed:       {}", summary.filtered_completed_count);
    println!("  Time spent:      {}", format_hms(summary.filtered_time_spent));
    println!("  Completion rate: {}", summary.filtered_completion_rate);
}

fn run_tui(config: &AppConfig) -> Result<()> {
    let mut app = open_app(config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Wait for the last autosave
    app.flush();
    if let Some(err) = app.save_error() {
        eprintln!("Error saving state: {}", err);
    }

    if let Err(err) = result {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut AppState) -> Result<()> {
    let poll_rate = ticker::tick_duration();

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Handle events with timeout for ticking
        if event::poll(poll_rate)? {
            if let Event::Key(key) = event::read()? {
                // Only process key press events (ignore key release)
                if key.kind == KeyEventKind::Press && input::handle_key(app, key)? {
                    return Ok(());
                }
            }
        }

        // One engine tick per whole elapsed second
        app.advance(Instant::now());
    }
}
