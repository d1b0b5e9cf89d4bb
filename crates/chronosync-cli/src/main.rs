//! ChronoSync CLI - personal time tracking with encrypted snapshot sync
//!
//! All data lives in per-user JSON files in the platform data directory.
//! `export` prints an encrypted sync code that `import` on another device
//! turns back into the full dataset; passwords are always prompted, never
//! passed as arguments.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;

use chronosync_core::{ChronoError, NewTask, Period, Task, Tracker};

/// ChronoSync - track your time and carry it between devices
#[derive(Parser, Debug)]
#[command(name = "chronosync")]
#[command(version = "0.1.0")]
#[command(about = "Personal time tracking with password-encrypted sync codes")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in as a user (creates the user on first login)
    Login { name: String },
    /// Log out of the current user
    Logout,
    /// Show the current user
    Whoami,
    /// Add a task
    Add {
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Start time (HH:MM)
        #[arg(long)]
        start: String,
        /// End time (HH:MM)
        #[arg(long)]
        end: String,
        /// What you worked on
        #[arg(long)]
        description: String,
        /// Tag name (auto-registered with a palette color if new)
        #[arg(long)]
        tag: String,
        /// Optional image payload (data URI)
        #[arg(long)]
        image: Option<String>,
    },
    /// List tasks for a date, sorted by start time
    List {
        /// Calendar date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove a task by id
    Remove { id: String },
    /// Manage the tag palette
    Tag {
        #[command(subcommand)]
        command: TagCommand,
    },
    /// Show tracked minutes per tag
    Stats {
        /// Bucket size around the reference date
        #[arg(long, value_enum, default_value_t = PeriodArg::Day)]
        period: PeriodArg,
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Encrypt all current data into a portable sync code
    Export,
    /// Decrypt a sync code and replace all local data with it
    Import {
        /// The sync code produced by `export` on another device
        code: String,
        /// Skip the overwrite confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    /// List the palette
    List,
    /// Rename a tag everywhere it is used
    Rename { old: String, new: String },
    /// Change a tag's display color
    Color { name: String, color: String },
    /// Remove an unused tag
    Remove { name: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PeriodArg {
    Day,
    Week,
    Month,
}

impl From<PeriodArg> for Period {
    fn from(value: PeriodArg) -> Self {
        match value {
            PeriodArg::Day => Period::Day,
            PeriodArg::Week => Period::Week,
            PeriodArg::Month => Period::Month,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut tracker = Tracker::new().map_err(|e| format!("Failed to open data store: {}", e))?;

    match args.command {
        Command::Login { name } => {
            tracker.login(&name).await?;
            println!(
                "Logged in as {} ({} tasks, {} tags)",
                name,
                tracker.tasks().len(),
                tracker.tags().len()
            );
        }
        Command::Logout => {
            tracker.resume().await?;
            tracker.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => {
            match tracker.resume().await? {
                Some(user) => println!("{}", user),
                None => println!("Not logged in"),
            }
        }
        Command::Add {
            date,
            start,
            end,
            description,
            tag,
            image,
        } => {
            tracker.resume().await?;
            let id = tracker
                .add_task(NewTask {
                    date: date.unwrap_or_else(today),
                    start_time: start,
                    end_time: end,
                    description,
                    tag,
                    image_url: image,
                })
                .await?;
            println!("Added task {}", id);
        }
        Command::List { date } => {
            tracker.resume().await?;
            require_user(&tracker)?;
            let date = date.unwrap_or_else(today);
            let tasks = tracker.tasks_for_date(&date);
            if tasks.is_empty() {
                println!("No tasks on {}", date);
            } else {
                for task in &tasks {
                    print_task(task);
                }
            }
        }
        Command::Remove { id } => {
            tracker.resume().await?;
            tracker.delete_task(&id).await?;
            println!("Removed task {}", id);
        }
        Command::Tag { command } => {
            tracker.resume().await?;
            match command {
                TagCommand::List => {
                    require_user(&tracker)?;
                    for tag in tracker.tags() {
                        println!("{}  {}", tag.color, tag.name);
                    }
                }
                TagCommand::Rename { old, new } => {
                    tracker.rename_tag(&old, &new).await?;
                    println!("Renamed {} -> {}", old, new);
                }
                TagCommand::Color { name, color } => {
                    tracker.set_tag_color(&name, &color).await?;
                    println!("Updated color of {}", name);
                }
                TagCommand::Remove { name } => {
                    tracker.delete_tag(&name).await?;
                    println!("Removed tag {}", name);
                }
            }
        }
        Command::Stats { period, date } => {
            tracker.resume().await?;
            require_user(&tracker)?;
            let reference = match date {
                Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .map_err(|e| format!("Invalid date '{}': {}", d, e))?,
                None => chrono::Local::now().date_naive(),
            };
            let totals = tracker.stats(period.into(), reference)?;
            if totals.is_empty() {
                println!("No tracked time in this period");
            } else {
                for total in totals {
                    println!("{:>10}  {}", format_minutes(total.minutes), total.name);
                }
            }
        }
        Command::Export => {
            tracker.resume().await?;
            require_user(&tracker)?;
            let password = rpassword::prompt_password("Encryption password: ")?;
            let code = tracker.export_sync_code(&password)?;
            eprintln!("Use the same password to import on another device:");
            println!("{}", code);
        }
        Command::Import { code, yes } => {
            if !yes && !confirm_overwrite()? {
                println!("Import cancelled");
                return Ok(());
            }
            let password = rpassword::prompt_password("Decryption password: ")?;
            tracker.import_sync_code(&code, &password).await?;
            println!(
                "Imported data for {} ({} tasks, {} tags)",
                tracker.current_user().unwrap_or("?"),
                tracker.tasks().len(),
                tracker.tags().len()
            );
        }
    }

    Ok(())
}

fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn require_user(tracker: &Tracker) -> Result<(), ChronoError> {
    if tracker.current_user().is_none() {
        return Err(ChronoError::NotLoggedIn);
    }
    Ok(())
}

fn print_task(task: &Task) {
    println!(
        "{}-{}  [{}]  {}  ({})",
        task.start_time, task.end_time, task.tag, task.description, task.id
    );
}

fn format_minutes(minutes: i64) -> String {
    let hours = minutes / 60;
    let remaining = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, remaining)
    } else {
        format!("{}m", remaining)
    }
}

fn confirm_overwrite() -> std::io::Result<bool> {
    print!("This will overwrite all current data on this device for the imported user. Continue? [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
