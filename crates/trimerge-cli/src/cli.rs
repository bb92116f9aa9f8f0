use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "trimerge",
    about = "Path-scoped three-way merge of JSON documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge local and incoming edits of a common ancestor
    Merge(MergeArgs),
    /// Show the changes between two documents
    Diff(DiffArgs),
    /// Validate a merge configuration file
    CheckConfig(CheckConfigArgs),
}

#[derive(Args)]
pub struct MergeArgs {
    /// The common ancestor document
    #[arg(long)]
    pub ancestor: PathBuf,
    /// The currently authoritative document
    #[arg(long)]
    pub local: PathBuf,
    /// The proposed new document
    #[arg(long)]
    pub incoming: PathBuf,
    /// Merge rules (TOML); the manual-merge profile when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Write the merged document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Exit with status 1 when conflicts remain
    #[arg(long)]
    pub fail_on_conflict: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    pub file: PathBuf,
}
