use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{load_config, LedgerConfig};
use crate::content_record::VerificationStatus;
use crate::content_store::ContentStore;
use crate::logging::init_tracing;
use crate::web::{content_router, cors_layer};

/// Top-level CLI interface for the content ledger
#[derive(Parser)]
#[command(
    name = "content_ledger",
    version,
    about = "Content integrity and versioning store"
)]
pub struct Cli {
    /// Configuration file (defaults to content_ledger.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP content API
    Serve {
        /// Host/IP to bind, overrides the configured host
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print every record as JSON
    List,

    /// Print one record as JSON
    Show {
        #[arg(short, long)]
        id: u64,
    },

    /// Check that a record's stored hash still matches its content
    Verify {
        #[arg(short, long)]
        id: u64,
    },

    /// Re-validate a record's signature and every trust-chain link
    Audit {
        #[arg(short, long)]
        id: u64,
    },

    /// Permanently remove a record
    Delete {
        #[arg(short, long)]
        id: u64,
    },

    /// Record an approval decision (pending, verified, rejected)
    SetStatus {
        #[arg(short, long)]
        id: u64,
        #[arg(short, long)]
        status: VerificationStatus,
    },
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.log_level)?;

    let store = ContentStore::open_from_config(&config)
        .with_context(|| format!("failed to open store at {}", config.data_path.display()))?;

    match cli.command {
        Commands::Serve { host, port } => serve(store, &config, host, port).await,
        Commands::List => print_json(&store.list()?),
        Commands::Show { id } => print_json(&store.get(id)?),
        Commands::Verify { id } => {
            let valid = store.verify(id)?;
            println!("{}", serde_json::json!({ "id": id, "valid": valid }));
            if !valid {
                anyhow::bail!("content {id} failed verification");
            }
            Ok(())
        }
        Commands::Audit { id } => {
            let audit = store.audit(id)?;
            print_json(&audit)?;
            if !audit.is_intact() {
                anyhow::bail!("trust chain for content {id} is not intact");
            }
            Ok(())
        }
        Commands::Delete { id } => {
            store.delete(id)?;
            println!("deleted content {id}");
            Ok(())
        }
        Commands::SetStatus { id, status } => print_json(&store.set_status(id, status)?),
    }
}

async fn serve(
    store: ContentStore,
    config: &LedgerConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let store = Arc::new(store);
    let app = content_router(store.clone()).layer(cors_layer(config.server.cors_origin.as_deref())?);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "content API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    if let Ok(store) = Arc::try_unwrap(store) {
        store.close();
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
