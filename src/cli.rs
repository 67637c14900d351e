use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "postergrid")]
#[command(author, version, about = "Tilted movie-poster wallpapers for every screen")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch posters and render wallpapers for every device
    Generate {
        /// Only render this device (repeatable, case-insensitive)
        #[arg(short, long = "device")]
        devices: Vec<String>,

        /// Number of catalog items to sample
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Local output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List device profiles with their output size and JPEG budget
    Devices,

    /// Validate configuration and print it with secrets masked
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
