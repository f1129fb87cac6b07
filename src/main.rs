//! # Contact Book server (`contactd`)
//!
//! The `contactd` binary creates the database schema and serves the
//! contact REST API.
//!
//! ## Usage
//!
//! ```bash
//! contactd [--config ./config/contacts.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `contactd init` | Create the SQLite database, the `contacts` table and its indexes |
//! | `contactd serve` | Ensure the schema exists, then serve HTTP until SIGINT/SIGTERM |
//!
//! ## Environment
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `DATABASE_URL` | Overrides `[db].url` |
//! | `PORT` | Overrides the port of `[server].bind` |
//! | `RUST_LOG` | Log filter (default `info`) |
//! | `LOG_FORMAT` | `json` for JSON log lines, anything else for plain text |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contact_book::{config, db, migrate, server};

/// Contact Book: a contact-management REST API backed by SQLite.
#[derive(Parser)]
#[command(name = "contactd", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional: every setting has a default, and `DATABASE_URL` / `PORT`
    /// override whatever the file says.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the database file, the `contacts` table, and its indexes.
    /// Running it more than once is safe.
    Init,

    /// Start the HTTP server.
    Serve,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Any panic is fatal: log it and exit with status 1.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!(panic = %panic_info, "unrecoverable fault, terminating");
        std::process::exit(1);
    }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    install_panic_hook();

    let cfg = config::load_config(cli.config.as_deref()).inspect_err(|e| {
        error!(error = %e, "failed to load configuration");
    })?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            info!(db = %cfg.db.url, bind = %cfg.server.bind, "starting contact book");
            if let Err(e) = server::run_server(&cfg).await {
                error!(error = %e, "server terminated");
                return Err(e);
            }
        }
    }

    Ok(())
}
