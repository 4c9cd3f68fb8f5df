use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Describe the surroundings captured in a photo
    Describe {
        /// Captured photo to analyze
        #[arg(short, long)]
        image: PathBuf,

        /// Latitude override (skips location resolution)
        #[arg(long, requires = "lon")]
        lat: Option<f64>,

        /// Longitude override (skips location resolution)
        #[arg(long, requires = "lat")]
        lon: Option<f64>,
    },

    /// Translate text between languages
    Translate {
        /// Text to translate
        text: String,

        /// Target language code
        #[arg(short, long)]
        target: String,

        /// Source language code (auto-detected when omitted)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Plan a visit: nearby points of interest with summaries
    Plan {
        /// Latitude override (skips location resolution)
        #[arg(long, requires = "lon")]
        lat: Option<f64>,

        /// Longitude override (skips location resolution)
        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        /// Maximum number of points of interest
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the resolved position and place description
    Locate {
        /// Skip the last-known fix and force a fresh read
        #[arg(long)]
        fresh: bool,
    },
}
