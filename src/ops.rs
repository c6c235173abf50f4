use anyhow::{Context, Result, anyhow};
use colored::*;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressStyle};

use dbstate::config::{CONNECTION_ENV, StateConfig};
use dbstate::drivers::selector::select_connection;
use dbstate::{Connection, SnapshotKey, SnapshotManager};

use crate::cli::Cli;

type Manager = SnapshotManager<Box<dyn Connection>>;

/// Resolve the connection (flag, then environment, then config file) and
/// wrap it in a snapshot manager.
fn open_manager(cli: &Cli) -> Result<Manager> {
    let cwd = std::env::current_dir()?;
    let mut config = StateConfig::load(cli.config.as_deref(), &cwd)?
        .with_env_connection(std::env::var(CONNECTION_ENV).ok());
    if cli.preserve_case {
        config.preserve_case = true;
    }

    let connection = cli
        .connection
        .clone()
        .or_else(|| config.connection.clone())
        .ok_or_else(|| {
            anyhow!(
                "no connection string: pass --connection, set {} or add one to .dbstate.json",
                CONNECTION_ENV
            )
        })?;

    let conn = select_connection(&connection)?;
    let manager = SnapshotManager::with_options(conn, config.manager_options())
        .with_context(|| format!("cannot manage '{}'", connection))?;
    Ok(manager)
}

fn parse_key(key: &str) -> Result<SnapshotKey> {
    Ok(SnapshotKey::parse(key)?)
}

pub fn do_save(cli: &Cli) -> Result<()> {
    let manager = open_manager(cli)?;
    let bar = create_progress_bar("Saving state");
    let key = manager.save_state()?;
    bar.finish_and_clear();

    eprintln!(
        "{} {}",
        "✔".green().bold(),
        format!("Saved {} as '{}'", manager.current_filename()?, key).green()
    );
    // key alone on stdout so scripts can capture it
    println!("{}", key);
    Ok(())
}

pub fn do_load(cli: &Cli, key: &str) -> Result<()> {
    let key = parse_key(key)?;
    let mut manager = open_manager(cli)?;
    let bar = create_progress_bar("Restoring state");
    manager
        .load_state(&key)
        .with_context(|| format!("state '{}' could not be loaded", key))?;
    bar.finish_and_clear();

    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Restored {} from '{}'", manager.base_filename(), key).green()
    );
    Ok(())
}

pub fn do_reset(cli: &Cli, migrate: Option<&str>) -> Result<()> {
    let mut manager = open_manager(cli)?;
    let removed = manager.active_path()?;
    manager.reset_state(migrate)?;

    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Reset: removed {}", removed.display()).green()
    );
    Ok(())
}

pub fn do_delete(cli: &Cli, key: &str) -> Result<()> {
    let key = parse_key(key)?;
    let manager = open_manager(cli)?;
    manager.delete_state(&key)?;

    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Deleted state '{}'", key).green()
    );
    Ok(())
}

pub fn do_purge(cli: &Cli, yes: bool) -> Result<()> {
    let manager = open_manager(cli)?;
    let count = manager.purgeable_states()?.len();
    if count == 0 {
        println!("{} {}", "i".yellow().bold(), "No saved states found".yellow());
        return Ok(());
    }

    if !yes
        && !prompt_confirm(&format!(
            "Delete {} saved state(s) in {}? [y/N] ",
            count,
            manager.storage_path()?
        ))?
    {
        println!("Aborted.");
        return Ok(());
    }

    let bar = create_progress_bar("Purging states");
    let removed = manager.purge_states()?;
    bar.finish_and_clear();

    println!(
        "{} {}",
        "✔".green().bold(),
        format!("Deleted {} saved state(s)", removed).green()
    );
    Ok(())
}

pub fn do_list(cli: &Cli, json: bool) -> Result<()> {
    let manager = open_manager(cli)?;
    let states = manager.list_states()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&states)?);
        return Ok(());
    }

    if states.is_empty() {
        println!("{} {}", "i".yellow().bold(), "No saved states found".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Key").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new("Saved").add_attribute(Attribute::Bold),
        ]);

    for s in &states {
        table.add_row(vec![
            Cell::new(&s.key),
            Cell::new(s.size_bytes).set_alignment(CellAlignment::Right),
            Cell::new(s.modified.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub fn do_info(cli: &Cli) -> Result<()> {
    let manager = open_manager(cli)?;
    println!("{} {}", "driver:".bold(), manager.connection().driver_name());
    println!("{} {}", "storage path:".bold(), manager.storage_path()?);
    println!("{} {}", "active file:".bold(), manager.current_filename()?);
    println!("{} {}", "saved states:".bold(), manager.list_states()?.len());
    Ok(())
}

pub fn do_verify(cli: &Cli, key: &str) -> Result<()> {
    let key = parse_key(key)?;
    let manager = open_manager(cli)?;
    if manager.state_matches(&key)? {
        println!(
            "{} {}",
            "✔".green().bold(),
            format!("{} matches '{}'", manager.current_filename()?, key).green()
        );
        Ok(())
    } else {
        Err(anyhow!(
            "{} differs from '{}'",
            manager.current_filename()?,
            key
        ))
    }
}

pub fn do_version() {
    println!("{} {}", "dbstate".bold(), env!("CARGO_PKG_VERSION").cyan());
}

fn create_progress_bar(prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .map(|s| s.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    bar.set_style(style);
    bar.set_message(prefix.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(80));
    bar
}

fn prompt_confirm(message: &str) -> Result<bool> {
    use std::io::{self, Write};
    print!("{} {}", "?".cyan().bold(), message.cyan());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let ans = input.trim().to_lowercase();
    Ok(ans == "y" || ans == "yes")
}
