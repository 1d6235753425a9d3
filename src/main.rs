use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use taskboard::due::{format_due, format_header, parse_due};
use taskboard::{Backend, Clock, Config, KvStore, Task, TaskFilter, TaskStore};
use tracing::Level;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "taskboard - Local task list with due dates and filters")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the config file (default: <config dir>/taskboard/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the task data (overrides config)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(short, long, value_enum, global = true)]
    backend: Option<Backend>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        /// Task text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Deadline: YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339
        #[arg(long)]
        due: Option<String>,
    },

    /// Change a task's text or deadline
    Edit {
        /// Position, id, or id prefix (numbers past the end match id prefixes)
        reference: String,

        /// New text
        #[arg(long)]
        text: Option<String>,

        /// New deadline
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the deadline
        #[arg(long)]
        clear_due: bool,
    },

    /// Toggle a task between pending and completed
    Done {
        /// Position, id, or id prefix
        reference: String,
    },

    /// Delete a task
    Rm {
        /// Position, id, or id prefix
        reference: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show tasks
    List {
        /// all, active, completed or overdue
        #[arg(short, long, default_value_t = TaskFilter::All)]
        filter: TaskFilter,
    },

    /// Show task counts
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    // Setup tracing
    let level = match cli.verbose {
        0 => config.log_level()?,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => config.data_dir()?,
    };
    let backend = cli.backend.unwrap_or(config.backend);

    let mut store = TaskStore::open(backend.open_or_unavailable(&data_dir));

    match cli.command {
        Commands::Add { text, due } => {
            let due_at = due.map(|d| parse_due(&d, &Local)).transpose()?;
            let task = store.add(&text.join(" "), due_at)?;
            println!("{} {}", "Added:".green(), task.text);
            render(&store, TaskFilter::All);
        }
        Commands::Edit {
            reference,
            text,
            due,
            clear_due,
        } => {
            let id = store.resolve(&reference)?;
            let current = store.get(id).ok_or_else(|| eyre!("Task not found: {}", reference))?;

            let text = text.unwrap_or(current.text);
            let due_at = if clear_due {
                None
            } else {
                match due {
                    Some(d) => Some(parse_due(&d, &Local)?),
                    None => current.due_at,
                }
            };

            let task = store.edit(id, &text, due_at)?;
            println!("{} {}", "Updated:".green(), task.text);
            render(&store, TaskFilter::All);
        }
        Commands::Done { reference } => {
            let id = store.resolve(&reference)?;
            let task = store.toggle_completed(id)?;
            if task.completed {
                println!("{} {}", "Completed:".green(), task.text);
            } else {
                println!("{} {}", "Reopened:".yellow(), task.text);
            }
            render(&store, TaskFilter::All);
        }
        Commands::Rm { reference, yes } => {
            let id = store.resolve(&reference)?;
            let current = store.get(id).ok_or_else(|| eyre!("Task not found: {}", reference))?;

            if !yes && !confirm(&format!("Delete \"{}\"?", current.text))? {
                println!("Cancelled");
                return Ok(());
            }

            let task = store.delete(id)?;
            println!("{} {}", "Deleted:".red(), task.text);
            render(&store, TaskFilter::All);
        }
        Commands::List { filter } => {
            render(&store, filter);
        }
        Commands::Stats => {
            print_stats(&store);
        }
    }

    Ok(())
}

/// Print the header, the tasks in `filter`'s view, and the counts
fn render<K: KvStore, C: Clock>(store: &TaskStore<K, C>, filter: TaskFilter) {
    let now = store.clock().now().with_timezone(&Local);
    println!();
    println!("{}", format_header(&now).bold());
    println!();

    let positions: HashMap<_, _> = store.tasks().iter().enumerate().map(|(i, t)| (t.id, i + 1)).collect();
    let tasks = store.list(filter);

    if tasks.is_empty() {
        println!("  {}", "No tasks found.".dimmed());
    }

    for task in &tasks {
        let position = positions.get(&task.id).copied().unwrap_or_default();
        println!("{}", format_row(store, task, position, &now));
    }

    println!();
    print_stats(store);
}

fn format_row<K: KvStore, C: Clock>(
    store: &TaskStore<K, C>,
    task: &Task,
    position: usize,
    now: &chrono::DateTime<Local>,
) -> String {
    let overdue = store.is_overdue(task);

    let (marker, text) = if task.completed {
        ("[x]".green(), task.text.dimmed().strikethrough())
    } else if overdue {
        ("[!]".red().bold(), task.text.red())
    } else {
        ("[ ]".normal(), task.text.normal())
    };

    let mut row = format!("{:>3}. {} {}", position, marker, text);
    if let Some(due) = &task.due_at {
        let label = format!("({})", format_due(due, now));
        let label = if overdue { label.red() } else { label.dimmed() };
        row.push_str(&format!("  {}", label));
    }
    row
}

fn print_stats<K: KvStore, C: Clock>(store: &TaskStore<K, C>) {
    let stats = store.stats();
    let mut line = format!(
        "{} total · {} completed · {} pending",
        stats.total, stats.completed, stats.pending
    );
    if stats.overdue > 0 {
        line.push_str(&format!(" · {}", format!("{} overdue", stats.overdue).red()));
    }
    println!("{}", line);
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
