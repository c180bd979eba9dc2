//! Command-line argument definitions for the Fiz CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, parse strictness, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Fiz recipe compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input recipe file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to write the graph dump to; stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Skip statements that fail to parse instead of aborting
    #[arg(long)]
    pub lenient: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
