mod cli;
mod ops;

use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

use cli::{Cli, Commands};

fn init_logger() {
    // RUST_LOG=debug shows every copy and delete
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Save => {
            ops::do_save(&cli)?;
        }
        Commands::Load { key } => {
            ops::do_load(&cli, key)?;
        }
        Commands::Reset { migrate } => {
            ops::do_reset(&cli, migrate.as_deref())?;
        }
        Commands::Delete { key } => {
            ops::do_delete(&cli, key)?;
        }
        Commands::Purge { yes } => {
            ops::do_purge(&cli, *yes)?;
        }
        Commands::List { json } => {
            ops::do_list(&cli, *json)?;
        }
        Commands::Info => {
            ops::do_info(&cli)?;
        }
        Commands::Verify { key } => {
            ops::do_verify(&cli, key)?;
        }
        Commands::Version => {
            ops::do_version();
        }
    }

    Ok(())
}
