use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "clo", about = concat!("[~] checklist overlay v", env!("CARGO_PKG_VERSION"), " - paste text, tick it off"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory (tasks.json, config.json)
    #[arg(long = "data-dir", env = "CLO_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log debug detail
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace the checklist with tasks parsed from text
    Paste(PasteArgs),
    /// List tasks and their steps
    List,
    /// Mark a task or one of its steps done
    Check(CheckArgs),
    /// Mark a task or one of its steps not done
    Uncheck(CheckArgs),
    /// Show completion counts
    Status,
    /// Read or change configuration
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct PasteArgs {
    /// File to read (default: stdin)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Task ID or unique ID prefix
    pub task: String,
    /// Step ID or unique ID prefix within the task
    #[arg(long)]
    pub step: Option<String>,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the value at a dotted key path (e.g. window.anchor)
    Get { key: String },
    /// Set the value at a dotted key path; VALUE is JSON or a bare string
    Set { key: String, value: String },
    /// Print the config file location
    Path,
}
