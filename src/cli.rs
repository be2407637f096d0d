use crate::client::ApiClient;
use crate::config::ResolvedConfig;
use crate::constants::LEDGER_TIMESTAMP_FORMAT;
use crate::errors::AppResult;
use crate::scan::{ScanSummary, Scanner};
use crate::sync::sync_cnpj_list;
use crate::utils::format_duration;
use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

fn build_command() -> Command<'static> {
    Command::new("cnd-sync")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .after_help(
            "Without a subcommand, refreshes the CNPJ list and downloads new certificates.\n\
             Credentials come from CND_API_BASE_URL and CND_API_TOKEN (a .env file is honored).",
        )
        .subcommand(
            Command::new("toml")
                .about("Run the full scan using a TOML configuration file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Only refresh the CNPJ list from the contact roster")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Optional TOML config file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
}

/// Parses command-line arguments and runs the selected workflow.
///
/// - no subcommand: contact sync (unless disabled) followed by the certificate scan
/// - `toml <FILE>`: the same, configured from a TOML file
/// - `sync [--config FILE]`: contact sync only
///
/// Only configuration problems are returned as errors. Network and file failures
/// during the run are logged and never abort it.
pub async fn cli() -> AppResult<()> {
    let matches = build_command().get_matches();

    match matches.subcommand() {
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .expect("config is required");
            let config = load_config(Some(config_path.as_path()))?;
            run_workflow(&config).await?;
        }
        Some(("sync", sub)) => {
            let config = load_config(sub.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
            let client = ApiClient::new(&config)?;
            sync_cnpj_list(&client, &config.cnpj_list_path).await;
        }
        _ => {
            let config = load_config(None)?;
            run_workflow(&config).await?;
        }
    }

    Ok(())
}

/// Defaults, optionally replaced by a TOML file, then environment overrides; validated.
pub fn load_config(path: Option<&Path>) -> AppResult<ResolvedConfig> {
    let config = match path {
        Some(path) => ResolvedConfig::from_toml_file(path)?,
        None => ResolvedConfig::default(),
    }
    .with_env_overrides();

    config.validate()?;
    Ok(config)
}

/// Contact sync (when enabled) followed by the full scan. Prints the summary.
pub async fn run_workflow(config: &ResolvedConfig) -> AppResult<ScanSummary> {
    let client = ApiClient::new(config)?;
    let started = Instant::now();

    info!(
        started_at = %chrono::Local::now().format(LEDGER_TIMESTAMP_FORMAT),
        destination = %config.destination_dir.display(),
        "Starting certificate scan"
    );

    if config.sync_contacts {
        sync_cnpj_list(&client, &config.cnpj_list_path).await;
    } else {
        info!("Contact sync disabled");
    }

    let summary = Scanner::new(&client, config).run().await;

    println!("\n{summary}");
    println!("Elapsed: {}", format_duration(started.elapsed()));
    Ok(summary)
}
