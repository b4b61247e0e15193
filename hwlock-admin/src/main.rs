//! hwlock admin tool
//!
//! Usage:
//!   hwlock-admin --server http://licenses:5000 --key $ADMIN_KEY generate --days 30
//!   hwlock-admin list --detail
//!   hwlock-admin reset --license LIC_...

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hwlock_admin::{parse_target, render_issued, render_list, AdminClient, DEFAULT_SERVER};
use hwlock_license::api::IssueRequest;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "hwlock-admin")]
#[command(about = "Manage licenses on an hwlock license server")]
struct Cli {
    /// License server URL
    #[arg(long, env = "HWLOCK_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Admin key
    #[arg(long, env = "HWLOCK_ADMIN_KEY", hide_env_values = true)]
    key: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue new licenses
    Generate {
        /// Lifetime in days (server default when omitted)
        #[arg(long, conflicts_with = "perpetual")]
        days: Option<u32>,

        /// Issue licenses that never expire
        #[arg(long)]
        perpetual: bool,

        /// How many licenses to issue
        #[arg(long, default_value = "1")]
        count: u32,

        /// Free-form note stored with the license
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a license
    Remove {
        /// License key or id
        #[arg(long)]
        license: String,
    },
    /// List all licenses
    List {
        /// Show creation date, expiry, state and notes
        #[arg(long)]
        detail: bool,
    },
    /// Release a license from its device
    Reset {
        /// License key or id
        #[arg(long)]
        license: String,
    },
    /// Re-enable a disabled license
    Enable {
        /// License key or id
        #[arg(long)]
        license: String,
    },
    /// Disable a license without deleting it
    Disable {
        /// License key or id
        #[arg(long)]
        license: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let admin = AdminClient::new(&cli.server, cli.key)?;
    let server = admin.base_url().to_string();

    match cli.command {
        Command::Generate {
            days,
            perpetual,
            count,
            description,
        } => {
            let req = IssueRequest {
                duration_days: days,
                expires_at: None,
                perpetual,
                description,
            };
            for _ in 0..count {
                let issued = admin
                    .generate(&req)
                    .await
                    .with_context(|| format!("failed to issue license on {server}"))?;
                print!("{}", render_issued(&issued));
            }
        }
        Command::Remove { license } => {
            let result = admin
                .remove(&parse_target(&license))
                .await
                .context("failed to remove license")?;
            println!("{}", result.message);
        }
        Command::List { detail } => {
            let licenses = admin
                .list()
                .await
                .with_context(|| format!("failed to list licenses on {server}"))?;
            print!("{}", render_list(&licenses, detail));
        }
        Command::Reset { license } => {
            admin
                .reset(&parse_target(&license))
                .await
                .context("failed to reset license")?;
            println!("License reset; it can be activated on a new device.");
        }
        Command::Enable { license } => {
            let result = admin
                .set_active(parse_target(&license), true)
                .await
                .context("failed to enable license")?;
            println!("{}", result.message);
        }
        Command::Disable { license } => {
            let result = admin
                .set_active(parse_target(&license), false)
                .await
                .context("failed to disable license")?;
            println!("{}", result.message);
        }
    }
    Ok(())
}
