use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    KeypairWallet, RefreshOutcome, RpcLedgerClient, Session, SessionController, SessionPhase,
    SyncStatus, TransactionReport,
};
use serde::Serialize;
use shared::{domain::CounterDirection, error::ErrorReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Overrides};

#[derive(Parser, Debug)]
#[command(name = "counter_cli", about = "Drive the on-chain counter program from a terminal")]
struct Args {
    /// Config file; `counter.toml` in the working directory is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// RPC endpoint URL or cluster moniker (devnet, testnet, mainnet-beta, localnet).
    #[arg(long)]
    rpc_url: Option<String>,
    /// Keypair file acting as the wallet.
    #[arg(long)]
    keypair: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Print the counter account address. No network access.
    Address,
    /// Connect and show the current session.
    Status,
    /// Create the counter account.
    Init,
    Increment,
    Decrement,
}

#[derive(Debug, Serialize)]
struct SessionView {
    wallet: Option<String>,
    connected: bool,
    counter_account: Option<String>,
    initialized: bool,
    counter: u64,
    sync: &'static str,
    error: Option<ErrorReport>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            wallet: session.wallet_address.map(|key| key.to_string()),
            connected: session.connected,
            counter_account: session.counter_account.map(|key| key.to_string()),
            initialized: session.initialized,
            counter: session.counter,
            sync: match session.sync {
                SyncStatus::Unknown => "unknown",
                SyncStatus::Fresh => "fresh",
                SyncStatus::PendingVisibility => "pending_visibility",
            },
            error: session.error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TransactionView {
    operation: String,
    signature: String,
    visible: bool,
    observed_count: Option<u64>,
}

impl From<&TransactionReport> for TransactionView {
    fn from(report: &TransactionReport) -> Self {
        Self {
            operation: report.operation.to_string(),
            signature: report.signature.to_string(),
            visible: matches!(report.outcome, RefreshOutcome::Visible(_)),
            observed_count: report.outcome.value(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    phase: &'static str,
    session: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction: Option<TransactionView>,
}

fn phase_label(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Disconnected => "disconnected",
        SessionPhase::Connecting => "connecting",
        SessionPhase::Connected { initialized: false } => "connected_uninitialized",
        SessionPhase::Connected { initialized: true } => "connected_initialized",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let overrides = Overrides {
        rpc_url: args.rpc_url.clone(),
        keypair: args.keypair.clone(),
    };
    let settings = load_settings(args.config.as_deref(), &overrides)?;

    if args.command == Command::Address {
        let (address, bump) =
            shared::protocol::derive_counter_address(&settings.program_id);
        println!(
            "{}",
            serde_json::json!({ "counter_account": address.to_string(), "bump": bump })
        );
        return Ok(());
    }

    let wallet = KeypairWallet::from_file(&settings.keypair_path)?;
    let ledger = RpcLedgerClient::new(settings.rpc_url.clone(), settings.commitment.to_config());
    let controller = SessionController::new(
        Arc::new(wallet),
        Arc::new(ledger),
        settings.controller_config(),
    );

    controller.connect(client_core::ConnectMode::Interactive).await?;
    let report = match args.command {
        Command::Address | Command::Status => None,
        Command::Init => Some(controller.initialize_account().await?),
        Command::Increment => Some(
            controller
                .mutate_counter(CounterDirection::Increment)
                .await?,
        ),
        Command::Decrement => Some(
            controller
                .mutate_counter(CounterDirection::Decrement)
                .await?,
        ),
    };
    if let Some(report) = &report {
        info!(operation = %report.operation, signature = %report.signature, "done");
    }

    let session = controller.snapshot().await;
    let output = Output {
        phase: phase_label(controller.phase().await),
        session: SessionView::from(&session),
        transaction: report.as_ref().map(TransactionView::from),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
