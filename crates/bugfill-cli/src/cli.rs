use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bugfill")]
#[command(version, about = "Fill tracker create-issue forms from structured records")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "BUGFILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging for every crate
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a create form and fill it from one JSON record
    Create(CreateArgs),

    /// Fill one form per record of a JSON array, each in its own tab
    Batch(BatchArgs),

    /// Close the debugging browser
    Close,

    /// Print the form schema in use as TOML
    Schema,

    /// Show the resolved configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON object keyed by field name
    pub record: PathBuf,

    /// Exit as soon as the form is filled instead of waiting for Enter
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON array of records
    pub records: PathBuf,

    /// Print the batch summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the defaults to the config file if it does not exist yet
    #[arg(long)]
    pub init: bool,
}
