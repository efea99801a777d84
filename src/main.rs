use clap::{Parser, Subcommand, ValueEnum};
use exn::ResultExt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uniview::error::{ErrorKind, Result};
use uniview::{App, LATEST};
use uniview_catalog::PackageRecord;
use uniview_config::Config;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "Aggregates a package repository feed into a searchable catalog")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, global = true, env = "UNIVIEW_CONFIG")]
    config: Option<PathBuf>,
    /// Log level; `RUST_LOG` takes precedence when set.
    #[arg(long, global = true, value_enum, default_value = "info")]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load everything, then keep catalog and documentation fresh until Ctrl-C.
    Serve,
    /// Search the catalog and print matching packages as JSON.
    Search { query: String },
    /// Print one package as JSON (latest version unless selected otherwise).
    Show {
        name: String,
        #[arg(long, conflicts_with = "release")]
        version: Option<String>,
        #[arg(long)]
        release: Option<String>,
        /// List available versions instead of printing a record.
        #[arg(long, conflicts_with_all = ["version", "release"])]
        versions: bool,
    },
    /// Print a package's rendered documentation.
    Docs { name: String },
}

fn initialize_tracing(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.directive()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).or_raise(|| ErrorKind::Output)?;
    println!("{json}");
    Ok(())
}

fn records(records: &[std::sync::Arc<PackageRecord>]) -> Vec<&PackageRecord> {
    records.iter().map(|record| &**record).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level);

    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let app = App::from_config(&config)?;

    match cli.command {
        Command::Serve => {
            app.scheduler.startup().await;
            let _jobs = app.scheduler.clone().spawn();
            tracing::info!(
                packages = app.service.stats().packages,
                feed_refresh_secs = config.feed.refresh_secs,
                docs_refresh_secs = config.docs.bulk_refresh_secs,
                "Serving catalog"
            );
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "Could not listen for Ctrl-C");
            }
            tracing::info!("Shutting down");
        },
        Command::Search { query } => {
            app.scheduler.reload_catalog().await?;
            print_json(&records(&app.service.search(&query)))?;
        },
        Command::Show {
            name,
            version,
            release,
            versions,
        } => {
            app.scheduler.reload_catalog().await?;
            if versions {
                match (app.service.list_versions(&name), app.service.list_release_versions(&name)) {
                    (Some(versions), Some(releases)) => {
                        print_json(&serde_json::json!({ "versions": versions, "releaseVersions": releases }))?
                    },
                    _ => tracing::warn!(package = %name, "Package not found"),
                }
                return Ok(());
            }
            let record = match (version, release) {
                (Some(version), _) => app.service.get_version(&name, &version),
                (None, Some(release)) => app.service.get_release_version(&name, &release),
                (None, None) => app.service.get_version(&name, LATEST),
            };
            match record {
                Some(record) => print_json(&*record)?,
                None => tracing::warn!(package = %name, "Package or version not found"),
            }
        },
        Command::Docs { name } => {
            app.scheduler.reload_catalog().await?;
            match app.service.get_docs(&name).await {
                Some(html) => println!("{html}"),
                None => tracing::warn!(package = %name, "No documentation available"),
            }
        },
    }
    Ok(())
}
