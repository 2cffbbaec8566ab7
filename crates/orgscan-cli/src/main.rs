//! orgscan CLI
//!
//! Inventory of a Salesforce org: organization details, detected cloud
//! products, installed packages, licenses and integration points.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use eyre::{WrapErr, eyre};
use orgscan_exec::{CredentialSource, RestExecutor};
use orgscan_inventory::InventoryAssembler;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod render;

use render::{Format, Output};

#[derive(Parser, Debug)]
#[command(name = "orgscan", version)]
#[command(about = "Inventory of a Salesforce org", long_about = None)]
struct Cli {
    /// Username or alias of the target org, resolved with the sf CLI
    #[arg(short = 'o', long, global = true)]
    target_org: Option<String>,

    /// Instance URL, used with an access token instead of the sf CLI
    #[arg(long, env = "SF_INSTANCE_URL", global = true)]
    instance_url: Option<String>,

    /// Access token, used with an instance URL instead of the sf CLI
    #[arg(long, env = "SF_ACCESS_TOKEN", global = true, hide_env_values = true)]
    access_token: Option<String>,

    /// Write the result to this file instead of stdout
    #[arg(short = 'f', long, global = true)]
    output_file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, value_enum, default_value_t = Format::Json, global = true)]
    format: Format,

    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Comprehensive inventory of the org
    All,
    /// Enabled cloud products
    CloudProducts,
    /// Installed packages
    #[command(visible_alias = "list")]
    Packages,
    /// User licenses
    Licenses,
    /// Permission set licenses
    PermissionSets,
    /// Named credentials and custom settings
    Integrations,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;
    init_tracing(&config.logging.level, cli.log_format);

    let credentials = credential_source(&cli)?;
    let conn_info = credentials
        .resolve(&config.connection.api_version)
        .await
        .wrap_err("failed to connect to org")?;

    let mut executor =
        RestExecutor::with_timeout(conn_info, config.connection.request_timeout())?;
    if let Some(limit) = config.security.rate_limit.limit() {
        executor = executor.with_rate_limit(limit);
    }

    let config = Arc::new(config);
    let assembler = InventoryAssembler::new(Arc::new(executor), &config);

    let output = run(cli.command, &assembler).await?;
    let rendered = output.render(cli.format)?;

    match &cli.output_file {
        Some(path) => {
            tokio::fs::write(path, &rendered)
                .await
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "saved {}", output.label());
            eprintln!("Saved {} to {}", output.label(), path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

/// Run one subcommand against the org
async fn run(command: Commands, assembler: &InventoryAssembler) -> Result<Output> {
    let output = match command {
        Commands::All => {
            let report = assembler
                .build_inventory()
                .await
                .wrap_err("error fetching comprehensive inventory")?;
            Output::Report(Box::new(report))
        }
        Commands::CloudProducts => Output::CloudProducts(
            assembler
                .cloud_products()
                .await
                .wrap_err("error fetching cloud products")?,
        ),
        Commands::Packages => Output::Packages(
            assembler
                .installed_packages()
                .await
                .wrap_err("error fetching installed packages")?,
        ),
        Commands::Licenses => Output::UserLicenses(
            assembler
                .user_licenses()
                .await
                .wrap_err("error fetching user licenses")?,
        ),
        Commands::PermissionSets => Output::PermissionSets(
            assembler
                .permission_set_licenses()
                .await
                .wrap_err("error fetching permission set licenses")?,
        ),
        Commands::Integrations => Output::Integrations(assembler.integrations().await),
    };

    Ok(output)
}

/// Pick explicit token credentials when both parts are given, the sf CLI otherwise
fn credential_source(cli: &Cli) -> Result<CredentialSource> {
    match (&cli.instance_url, &cli.access_token, &cli.target_org) {
        (Some(instance_url), Some(access_token), _) => Ok(CredentialSource::Token {
            instance_url: instance_url.clone(),
            access_token: access_token.clone(),
        }),
        (_, _, Some(target_org)) => Ok(CredentialSource::SfCli {
            target_org: target_org.clone(),
        }),
        _ => Err(eyre!(
            "no org selected: pass --target-org, or --instance-url with --access-token"
        )),
    }
}

/// Log to stderr; `RUST_LOG` overrides the configured level
fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
