use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::BackendKind;

#[derive(Parser)]
#[command(name = "seatmate")]
#[command(about = "Same-gender seat pairing with a restorable history")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file (defaults to ~/.config/seatmate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the current arrangement and the archive
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Roster file with one `name,category` row per person
    #[arg(long, global = true)]
    pub roster: Option<PathBuf>,

    /// Field delimiter for the roster file
    #[arg(long, global = true)]
    pub delimiter: Option<char>,

    /// Fixed random seed for a reproducible arrangement
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Give a person without a partner their own table
    #[arg(long, global = true, default_value_t = false)]
    pub seat_alone: bool,

    /// Show debug logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Shuffle the roster into a new arrangement and make it current
    Generate(OutputArgs),

    /// Display the current arrangement
    Show(OutputArgs),

    /// List archived arrangements, newest first
    History(OutputArgs),

    /// Display an archived arrangement
    View(IdArgs),

    /// Make an archived arrangement current again
    Restore(IdArgs),
}

#[derive(Parser)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct IdArgs {
    /// Snapshot id or file name, e.g. 19-01-2026_21-15-31 or config-19-01-2026_21-15-31.json
    pub id: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
