use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "daybook", version, about = "Personal task tracker with a month calendar")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a task file in the current directory
    Init,
    /// List tasks in chronological order
    List,
    /// Add a new task
    Add {
        /// Task text
        text: String,
        /// Tag for the task
        #[arg(long, short = 't', default_value = "general")]
        tag: String,
        /// Priority 0 (lowest) to 2 (highest)
        #[arg(long, short = 'r', default_value_t = 0)]
        rank: i64,
    },
    /// Edit an existing task
    Edit {
        /// Task id to edit
        task_id: String,
        /// New text
        #[arg(long)]
        text: Option<String>,
        /// New tag
        #[arg(long, short = 't')]
        tag: Option<String>,
        /// New priority (0-2)
        #[arg(long, short = 'r')]
        rank: Option<i64>,
    },
    /// Delete a task
    Delete {
        /// Task id to delete
        task_id: String,
    },
    /// Show today/past counts and tag totals
    Summary,
    /// Print a month grid
    Calendar {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,
        /// List tasks created on this day (YYYY-MM-DD)
        #[arg(long)]
        day: Option<String>,
    },
    /// Launch the interactive TUI
    Tui,
}
