use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::application::LedgerService;
use crate::io::Exporter;

/// ATM Ledger - banks, ATMs, clients and cash withdrawals
#[derive(Parser)]
#[command(name = "atm-ledger")]
#[command(about = "A REST ledger for banks, ATMs, clients and cash withdrawals")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(
        short,
        long,
        env = "ATM_LEDGER_DATABASE",
        default_value = "atm-ledger.db",
        global = true
    )]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "ATM_LEDGER_BIND", default_value = "127.0.0.1:8000")]
        bind: String,
    },

    /// Export ledger data to CSV or JSON
    Export {
        /// What to export
        #[arg(value_enum)]
        what: ExportTarget,

        /// Output format (a full export is always JSON)
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    Banks,
    Atms,
    Clients,
    Withdrawals,
    /// All four tables as one JSON snapshot
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Serve { bind } => serve(&self.database, &bind).await?,

            Commands::Export {
                what,
                format,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let writer: Box<dyn Write> = match &output {
                    Some(path) => Box::new(BufWriter::new(File::create(path).with_context(
                        || format!("Failed to create output file {}", path.display()),
                    )?)),
                    None => Box::new(io::stdout().lock()),
                };

                let count = export(&service, what, format, writer).await?;
                if let Some(path) = output {
                    println!("Exported {} rows to {}", count, path.display());
                }
            }
        }

        Ok(())
    }
}

async fn export(
    service: &LedgerService,
    what: ExportTarget,
    format: ExportFormat,
    writer: Box<dyn Write>,
) -> Result<usize> {
    let exporter = Exporter::new(service);

    let count = match (what, format) {
        (ExportTarget::Full, ExportFormat::Csv) => {
            bail!("A full export is only available as JSON (use --format json)")
        }
        (ExportTarget::Full, ExportFormat::Json) => {
            let snapshot = exporter.export_full_json(writer).await?;
            snapshot.banks.len()
                + snapshot.atms.len()
                + snapshot.clients.len()
                + snapshot.withdrawals.len()
        }
        (ExportTarget::Banks, ExportFormat::Csv) => exporter.export_banks_csv(writer).await?,
        (ExportTarget::Atms, ExportFormat::Csv) => exporter.export_atms_csv(writer).await?,
        (ExportTarget::Clients, ExportFormat::Csv) => exporter.export_clients_csv(writer).await?,
        (ExportTarget::Withdrawals, ExportFormat::Csv) => {
            exporter.export_withdrawals_csv(writer).await?
        }
        (ExportTarget::Banks, ExportFormat::Json) => {
            Exporter::write_json(writer, &exporter.all_banks().await?)?
        }
        (ExportTarget::Atms, ExportFormat::Json) => {
            Exporter::write_json(writer, &exporter.all_atms().await?)?
        }
        (ExportTarget::Clients, ExportFormat::Json) => {
            Exporter::write_json(writer, &exporter.all_clients().await?)?
        }
        (ExportTarget::Withdrawals, ExportFormat::Json) => {
            Exporter::write_json(writer, &exporter.all_withdrawals().await?)?
        }
    };

    info!(?what, ?format, rows = count, "Export finished");
    Ok(count)
}

async fn serve(database: &str, bind: &str) -> Result<()> {
    let service = LedgerService::init(database).await?;
    let app = api::router(AppState::new(service));

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;
    info!(address = %listener.local_addr()?, database, "Ledger API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
