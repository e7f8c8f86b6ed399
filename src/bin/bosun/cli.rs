//! CLI definitions using clap.

use clap::Parser;
use clap_complete::Shell;

/// bosun - A minimal task runner for C and C++ projects
#[derive(Parser)]
#[command(name = "bosun")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Remove the .bosun directory and exit
    #[arg(long)]
    pub clean: bool,

    /// Print the resolved build configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Task names forwarded to the task delegate
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,
}
