use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod views;

const DEFAULT_CONFIG: &str = "almanac.toml";

fn main() {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => handle_error(e),
    };

    let result = config
        .expansion
        .validate()
        .map_err(anyhow::Error::from)
        .and_then(|_| config.now().map_err(anyhow::Error::msg))
        .and_then(|now| match cli.command {
            cli::Commands::Agenda(command) => commands::agenda::show_agenda(command, &config, now),
            cli::Commands::Day(command) => commands::day::show_day(command, &config, now),
            cli::Commands::Check(command) => commands::check::check_export(command, &config),
        });

    if let Err(e) = result {
        handle_error(e);
    }
}

/// An explicit `--config` must load; the implicit `almanac.toml` falls back to defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<config::Config> {
    match explicit {
        Some(path) => {
            if !path.is_file() {
                anyhow::bail!("Config file '{}' does not exist", path.display());
            }
            config::Config::load(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))
        }
        None => Ok(config::Config::load(Path::new(DEFAULT_CONFIG)).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            config::Config::default()
        })),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_error(e: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), e);
    std::process::exit(1);
}
