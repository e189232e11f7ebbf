use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Write logs to this file instead of the platform log directory
    #[arg(long, global = true, env = "PATCHWORK_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the changes stored in a serialized patch
    Inspect {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Changes)]
        format: Format,
    },
    /// Swap the old and new sides of a patch
    Invert {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compose two patches, applying `first` before `second`
    Combine {
        first: PathBuf,
        second: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Rewrite a patch with a balanced tree
    Rebalance {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Replay buffer changes on top of a base text
    Apply {
        changes: PathBuf,
        base: PathBuf,
        /// Buffer configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the resulting text here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// One line per change
    #[default]
    Changes,
    Json,
    /// Graphviz dot
    Dot,
}
