//! bosun CLI - A minimal task runner for C and C++ projects

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

mod cli;

use bosun::{ops, BuildConfig, GlobalContext};
use cli::Cli;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("bosun=debug")
    } else {
        EnvFilter::new("bosun=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(0);
    }

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);

    if cli.clean {
        ops::clean(&ctx)?;
        return Ok(0);
    }

    let config = BuildConfig::load(&ctx)?;

    if cli.show_config {
        println!("{}", config);
        return Ok(0);
    }

    // The delegate's exit code becomes our exit code.
    ops::run(&ctx, &config, &cli.tasks)
}
