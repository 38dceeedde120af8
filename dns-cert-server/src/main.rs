//! DNS Certificate runner
//!
//! Loads the TOML configuration, wires the core services and drives
//! DNS-01 issuance from the command line.

mod app;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use dns_cert_core::AppConfig;
use dns_cert_core::types::{IssueKind, Priority};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use app::App;

/// DNS Certificate - multi-provider DNS-01 certificate issuance
#[derive(Parser)]
#[command(name = "dns-cert-server")]
#[command(version)]
#[command(about = "Multi-provider DNS-01 certificate issuance")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "DNS_CERT_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sync and list the domains of an account
    Domains { account: String },

    /// Print the CNAME records that delegate challenges to the apply domain
    Cname {
        #[arg(required = true)]
        domains: Vec<String>,
    },

    /// Issue a certificate covering `*.d` and `d` for every domain
    Issue {
        account: String,
        #[arg(required = true)]
        domains: Vec<String>,
        #[arg(long, value_enum, default_value_t = PriorityArg::Default)]
        priority: PriorityArg,
    },

    /// Renew a certificate saved on disk
    Renew {
        account: String,
        /// Directory containing `resource.json`
        save_path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    Critical,
    Default,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Critical => Self::Critical,
            PriorityArg::Default => Self::Default,
            PriorityArg::Low => Self::Low,
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: Args, config: AppConfig) -> Result<bool> {
    let mut app = App::new(config);

    match args.command {
        Command::Domains { account } => {
            app.prepare(&account).await?;
            print_json(&app.domains.list_domains(Some(&account)).await?)?;
            Ok(true)
        }
        Command::Cname { domains } => {
            print_json(&app.domains.cname_info(&domains)?)?;
            Ok(true)
        }
        Command::Issue {
            account,
            domains,
            priority,
        } => {
            app.prepare(&account).await?;
            let outcome = app
                .issue(&account, domains, IssueKind::Obtain, priority.into())
                .await?;
            print_json(&outcome)?;
            Ok(outcome.succeeded())
        }
        Command::Renew { account, save_path } => {
            app.prepare(&account).await?;
            let existing = app.import_saved(&save_path).await?;
            tracing::info!(
                "Renewing {} (expires {:?})",
                existing.domain_list,
                existing.not_after
            );
            let outcome = app
                .issue(
                    &account,
                    Vec::new(),
                    IssueKind::Renew {
                        certificate_id: existing.id,
                    },
                    Priority::Critical,
                )
                .await?;
            print_json(&outcome)?;
            Ok(outcome.succeeded())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match AppConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.server.log_level);
    tracing::info!("Configuration loaded from {}", args.config.display());

    match run(args, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
