use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use scriptdeck_core::{ConfigPaths, ConfigStore, LoggingConfig, init_logging};
use scriptdeck_scripts::{ParamValue, ScriptCatalog, expand_home, parse_cli_overrides, resolve};

/// ScriptDeck - discover and run small utility scripts
#[derive(Parser, Debug)]
#[command(name = "scriptdeck")]
#[command(about = "Discover, inspect and run utility scripts", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Directory holding config.json (default: platform config dir)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available scripts
    List,
    /// Show a script's manifest
    Show {
        /// Script id or directory
        #[arg(value_name = "SCRIPT")]
        script: String,
    },
    /// Run a script with key=value arguments
    Run {
        /// Script id or directory
        #[arg(required = true, value_name = "SCRIPT")]
        script: String,

        /// Arguments in key=value form
        #[arg(value_name = "KEY=VALUE")]
        args: Vec<String>,
    },
    /// Show or clear recently run scripts
    Recent {
        #[arg(long)]
        clear: bool,
    },
    /// Manage monitored script directories
    Paths {
        #[command(subcommand)]
        action: PathsAction,
    },
    /// Toggle a script in the favorites list
    Favorite {
        #[arg(value_name = "SCRIPT")]
        script: String,
    },
    /// Show the current theme
    Theme {
        /// Switch between dark and light
        #[arg(long)]
        toggle: bool,
    },
    /// Read or write configuration values by dot path
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum PathsAction {
    /// List monitored directories
    List,
    /// Start monitoring a directory
    Add {
        #[arg(value_name = "DIR")]
        dir: String,
    },
    /// Stop monitoring a directory
    Remove {
        #[arg(value_name = "DIR")]
        dir: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print a value, e.g. `settings.dark_mode`
    Get {
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Set a value; parsed as JSON, otherwise stored as a string
    Set {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(value_name = "VALUE")]
        value: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let paths = match &cli.config_dir {
        Some(dir) => ConfigPaths::in_dir(dir),
        None => ConfigPaths::discover(),
    };

    let _guard = init_logging(LoggingConfig::from_env(cli.verbose, &paths.log_dir()))?;

    let mut store = ConfigStore::load(paths);
    for warning in store.load_warnings() {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }

    if cli.verbose {
        println!("{} Using config: {}", "Info:".blue().bold(), store.paths().user.display());
    }

    debug!(command = ?cli.command, "dispatching");
    let result = match cli.command {
        Commands::List => cmd_list(&store),
        Commands::Show { script } => cmd_show(&store, &script),
        Commands::Run { script, args } => cmd_run(&mut store, &script, &args),
        Commands::Recent { clear } => cmd_recent(&mut store, clear),
        Commands::Paths { action } => cmd_paths(&mut store, action),
        Commands::Favorite { script } => cmd_favorite(&mut store, &script),
        Commands::Theme { toggle } => cmd_theme(&mut store, toggle),
        Commands::Config { action } => cmd_config(&mut store, action),
    };

    finish(result, store.close())
}

/// Combine the command outcome with the final save; the command's error wins.
fn finish(result: Result<()>, closed: scriptdeck_core::Result<()>) -> Result<()> {
    match (result, closed) {
        (result, Ok(())) => result,
        (Ok(()), Err(e)) => Err(e).context("Failed to save configuration"),
        (Err(e), Err(close_err)) => {
            eprintln!("{} Failed to save configuration: {}", "Warning:".yellow().bold(), close_err);
            Err(e)
        }
    }
}

/// List catalog scripts, favorites marked with a star
fn cmd_list(store: &ConfigStore) -> Result<()> {
    let catalog = ScriptCatalog::from_store(store)?;

    println!("{}", "Scripts".green().bold().underline());
    for script in catalog.scripts() {
        let marker = if store.is_favorite(&script.location()) { "*" } else { " " };
        println!("{} {:<24} {}", marker.yellow(), script.id.cyan(), script.manifest.title);
    }

    if catalog.is_empty() {
        println!("{} No scripts found", "Info:".yellow().bold());
    }
    Ok(())
}

/// Print a script's manifest
fn cmd_show(store: &ConfigStore, name: &str) -> Result<()> {
    let catalog = ScriptCatalog::from_store(store)?;
    let script = catalog.get(name)?;

    println!("{}", script.manifest.title.green().bold().underline());
    if !script.manifest.description.is_empty() {
        println!("{}", script.manifest.description);
    }
    println!();
    println!("{} {}", "Location:".blue().bold(), script.location());

    if script.manifest.parameters.is_empty() {
        println!("{} No arguments", "Info:".blue().bold());
    } else {
        println!("{}", "Arguments:".blue().bold());
        for param in &script.manifest.parameters {
            println!(
                "  {} ({}, default: {}) {}",
                param.name.cyan(),
                param.param_type,
                display_default(&param.default),
                param.description
            );
        }
    }

    if !script.help.is_empty() {
        println!();
        println!("{}", script.help);
    }
    Ok(())
}

fn display_default(value: &ParamValue) -> String {
    match value {
        ParamValue::Str(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

/// Resolve arguments, run the script, and record it as recent
fn cmd_run(store: &mut ConfigStore, name: &str, args: &[String]) -> Result<()> {
    let catalog = ScriptCatalog::from_store(store)?;
    let script = catalog.get(name)?;

    let overrides = parse_cli_overrides(args);
    let resolved = match resolve(&script.manifest, &overrides) {
        Ok(resolved) => resolved,
        Err(err) => {
            for e in &err.errors {
                eprintln!("{} {}", "Invalid:".red().bold(), e);
            }
            anyhow::bail!("{} invalid argument(s) for '{}'", err.errors.len(), script.id);
        }
    };

    debug!(script = %script.id, args = ?resolved.to_cli_tokens(), "arguments resolved");
    let result = scriptdeck_scripts::invoke(script, &resolved);
    store
        .add_recent_script(script.location())
        .context("Failed to record recent script")?;

    if result.is_success() {
        println!("{} {}", "Success:".green().bold(), result.message);
        Ok(())
    } else {
        anyhow::bail!("{}", result.message)
    }
}

/// Show or clear recent scripts
fn cmd_recent(store: &mut ConfigStore, clear: bool) -> Result<()> {
    if clear {
        store.clear_recent_scripts()?;
        println!("{} Recent scripts cleared", "Success:".green().bold());
        return Ok(());
    }

    let recent = store.get_recent_scripts();
    if recent.is_empty() {
        println!("{} No recent scripts", "Info:".blue().bold());
    }
    for (i, script) in recent.iter().enumerate() {
        println!("{:>2}. {}", i + 1, script.cyan());
    }
    Ok(())
}

fn cmd_paths(store: &mut ConfigStore, action: PathsAction) -> Result<()> {
    match action {
        PathsAction::List => {
            for path in store.get_monitored_paths() {
                let exists = Path::new(path).is_dir();
                if exists {
                    println!("  {}", path.cyan());
                } else {
                    println!("  {} {}", path.cyan(), "(missing)".yellow());
                }
            }
        }
        PathsAction::Add { dir } => {
            let path = monitored_dir(&dir)?;
            if store.add_monitored_path(path.clone())? {
                println!("{} Monitoring {}", "Success:".green().bold(), path.cyan());
            } else {
                println!("{} Already monitoring {}", "Info:".blue().bold(), path.cyan());
            }
        }
        PathsAction::Remove { dir } => {
            let removed = store.remove_monitored_path(&dir)?
                || match monitored_dir(&dir) {
                    Ok(path) => store.remove_monitored_path(&path)?,
                    Err(_) => false,
                };
            if removed {
                println!("{} Stopped monitoring {}", "Success:".green().bold(), dir.cyan());
            } else {
                println!("{} Not monitored: {}", "Info:".blue().bold(), dir.cyan());
            }
        }
    }
    Ok(())
}

/// Absolute form of a directory argument
fn monitored_dir(dir: &str) -> Result<String> {
    let path = expand_home(dir);
    let path = path
        .canonicalize()
        .with_context(|| format!("Not a directory: {}", path.display()))?;
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }
    Ok(path.display().to_string())
}

fn cmd_favorite(store: &mut ConfigStore, name: &str) -> Result<()> {
    let catalog = ScriptCatalog::from_store(store)?;
    let script = catalog.get(name)?;

    if store.toggle_favorite(&script.location())? {
        println!("{} Added {} to favorites", "Success:".green().bold(), script.id.cyan());
    } else {
        println!("{} Removed {} from favorites", "Success:".green().bold(), script.id.cyan());
    }
    Ok(())
}

fn cmd_theme(store: &mut ConfigStore, toggle: bool) -> Result<()> {
    let dark = if toggle { store.toggle_dark_mode()? } else { store.is_dark_mode() };
    println!("{} {}", "Theme:".blue().bold(), if dark { "dark" } else { "light" });
    Ok(())
}

fn cmd_config(store: &mut ConfigStore, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { path } => match store.lookup(&path) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => anyhow::bail!("No value at '{path}'"),
        },
        ConfigAction::Set { path, value } => {
            let value = parse_config_value(&value);
            store
                .set(&path, value.clone())
                .with_context(|| format!("Failed to set '{path}'"))?;
            println!("{} {} = {}", "Success:".green().bold(), path.cyan(), value);
        }
    }
    Ok(())
}

/// JSON when it parses, plain string otherwise
fn parse_config_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
