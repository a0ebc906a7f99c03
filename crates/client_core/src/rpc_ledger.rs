use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcSendTransactionConfig,
    rpc_request::{RpcError, RpcResponseErrorData},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use tracing::{debug, info};

use crate::{LedgerAccount, LedgerClient, LedgerError};

const DEFAULT_CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

/// Ledger client speaking JSON-RPC to a Solana node.
#[derive(Clone)]
pub struct RpcLedgerClient {
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
    confirm_poll_interval: Duration,
    confirm_timeout: Duration,
}

impl RpcLedgerClient {
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        let rpc_url = rpc_url.into();
        info!(%rpc_url, commitment = ?commitment.commitment, "using RPC endpoint");
        Self {
            rpc: Arc::new(RpcClient::new_with_commitment(rpc_url, commitment)),
            commitment,
            confirm_poll_interval: DEFAULT_CONFIRM_POLL_INTERVAL,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }

    pub fn with_confirmation_timing(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.confirm_poll_interval = poll_interval;
        self.confirm_timeout = timeout;
        self
    }
}

fn ledger_error(err: ClientError) -> LedgerError {
    let logs = match err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError {
            data: RpcResponseErrorData::SendTransactionPreflightFailure(simulation),
            ..
        }) => simulation.logs.clone().unwrap_or_default(),
        _ => Vec::new(),
    };
    LedgerError::rpc(err.to_string(), logs)
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.rpc.get_latest_blockhash().await.map_err(ledger_error)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        let config = RpcSendTransactionConfig {
            preflight_commitment: Some(self.commitment.commitment),
            ..Default::default()
        };
        self.rpc
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(ledger_error)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<(), LedgerError> {
        let started = Instant::now();
        loop {
            let status = self
                .rpc
                .get_signature_status_with_commitment(signature, commitment)
                .await
                .map_err(ledger_error)?;
            match status {
                Some(Ok(())) => return Ok(()),
                Some(Err(err)) => {
                    return Err(LedgerError::transaction_failed(*signature, err.to_string()))
                }
                None if started.elapsed() >= self.confirm_timeout => {
                    return Err(LedgerError::ConfirmationTimeout(*signature));
                }
                None => {
                    debug!(%signature, "waiting for confirmation");
                    tokio::time::sleep(self.confirm_poll_interval).await;
                }
            }
        }
    }

    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<LedgerAccount>, LedgerError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(ledger_error)?;
        Ok(response.value.map(|account| LedgerAccount {
            owner: account.owner,
            data: account.data,
        }))
    }
}

#[cfg(test)]
#[path = "tests/rpc_ledger_tests.rs"]
mod tests;
