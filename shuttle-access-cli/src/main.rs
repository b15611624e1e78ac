//! Shuttle Access CLI - inspect and manage an access session from a terminal.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shuttle_access::config::ENV_BASE_URL;
use shuttle_access::prelude::*;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Shuttle Access CLI
#[derive(Parser, Debug)]
#[command(name = "shuttle-access")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Access server base URL
    #[arg(short, long, env = ENV_BASE_URL)]
    url: Option<String>,

    /// JSON configuration file (overrides --url)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Credential file (defaults to the user config directory)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the login status and granted permissions
    Status,
    /// Log in with a password and persist the session
    Login {
        /// Identity name
        #[arg(short, long)]
        identity: String,

        /// Password
        #[arg(short, long, env = "SHUTTLE_ACCESS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted session
    Logout,
    /// Check one or more permissions; exits non-zero if any is missing
    Check {
        /// Permission names
        #[arg(required = true)]
        permissions: Vec<String>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("shuttle_access=debug,shuttle_access_cli=debug")
    } else {
        EnvFilter::new("shuttle_access=warn,shuttle_access_cli=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<AccessConfig> {
    if let Some(path) = &args.config {
        return AccessConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }

    let url = args
        .url
        .clone()
        .with_context(|| format!("no access server given; use --url or set {ENV_BASE_URL}"))?;
    Ok(AccessConfig::new(url))
}

#[allow(clippy::print_stdout)]
fn print_status(access: &Access) {
    println!("status:   {}", access.login_status());
    if access.has_session() {
        println!("identity: {}", access.identity_name());
    }
    for permission in access.permissions() {
        println!("  [{}] {}", permission.kind(), permission.name());
    }
}

#[tokio::main]
#[allow(clippy::print_stdout)]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    let store = args
        .store
        .clone()
        .map_or_else(FileStore::default_path, FileStore::new);
    debug!(store = %store.path().display(), "using credential store");

    let mut access = Access::from_config(&config, store)?;

    match args.command {
        Command::Status => {
            access.initialize().await?;
            print_status(&access);
        }
        Command::Login { identity, password } => {
            access.initialize().await?;
            access
                .login(&Credentials::password(identity, password))
                .await
                .context("login failed")?;
            print_status(&access);
        }
        Command::Logout => {
            access.logout();
            println!("logged out");
        }
        Command::Check { permissions } => {
            access.initialize().await?;

            let mut missing = 0_usize;
            for permission in &permissions {
                let granted = access.has_permission(permission);
                println!("{} {permission}", if granted { "yes" } else { "no " });
                if !granted {
                    missing += 1;
                }
            }
            if missing > 0 {
                anyhow::bail!("{missing} of {} permission(s) not granted", permissions.len());
            }
        }
    }

    Ok(())
}
