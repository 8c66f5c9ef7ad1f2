use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::sync::Arc;
use topup_ledger::application::context::WorkflowContext;
use topup_ledger::application::engine::LedgerEngine;
use topup_ledger::config::Cli;
use topup_ledger::domain::ports::LedgerStoreBox;
use topup_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use topup_ledger::infrastructure::timeout::TimeoutLedgerStore;
use topup_ledger::interfaces::csv::event_reader::EventReader;
use topup_ledger::interfaces::json::outbound_writer::OutboundWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.workflow_config();

    let store: LedgerStoreBox = match &cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            let store = topup_ledger::infrastructure::rocksdb::RocksDbLedgerStore::open(db_path)
                .into_diagnostic()?;
            Box::new(store)
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Box::new(InMemoryLedgerStore::new())
        }
        None => Box::new(InMemoryLedgerStore::new()),
    };
    let store: LedgerStoreBox = Box::new(TimeoutLedgerStore::new(store, cli.store_timeout()));

    let admin_group_id = config.admin_group_id;
    let engine = LedgerEngine::new(Arc::new(WorkflowContext::new(store, config)));

    let file = File::open(&cli.input).into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = OutboundWriter::new(stdout.lock(), admin_group_id);

    for (row, event) in EventReader::new(file).events().enumerate() {
        match event {
            Ok(event) => {
                let outbound = engine.handle(event).await;
                writer.write_all(&outbound).into_diagnostic()?;
            }
            Err(e) => {
                tracing::warn!(row = row + 1, error = %e, "skipping unreadable event");
            }
        }
    }

    Ok(())
}
