use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mindflow", version, about = "Write a thought, then let it fade")]
pub struct Cli {
    /// Directory holding thoughts and settings
    #[arg(long, global = true, env = "MINDFLOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, env = "MINDFLOW_LOG")]
    pub log_level: Option<String>,
    /// Path to config.yml
    #[arg(long, global = true, env = "MINDFLOW_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Jot down a thought
    Add {
        /// Text of the thought
        content: String,
    },
    /// List thoughts grouped by day
    List {
        /// Show thoughts in full instead of masking older ones
        #[arg(long)]
        reveal: bool,
    },
    /// Replace the text of a thought
    Edit {
        /// Thought id
        id: String,
        /// New text
        content: String,
    },
    /// Delete a single thought
    Delete {
        /// Thought id
        id: String,
    },
    /// Delete every thought
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Run a countdown in the terminal
    Timer {
        /// Hours (0-23)
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=23))]
        hours: u64,
        /// Minutes (0-59)
        #[arg(long, short = 'm', default_value_t = 15, value_parser = clap::value_parser!(u64).range(0..=59))]
        minutes: u64,
    },
    /// Show or change preferences
    Prefs {
        /// Enable or disable blurring
        #[arg(long)]
        blur: Option<bool>,
        /// Enable or disable focus mode
        #[arg(long)]
        focus: Option<bool>,
        /// Show onboarding again on next launch
        #[arg(long)]
        reset_onboarding: bool,
    },
    /// Launch the interactive TUI
    Tui,
}
