use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
    transaction::Transaction,
};
use tracing::debug;

use crate::{WalletError, WalletProvider};

/// Wallet provider backed by a local keypair.
///
/// Mirrors the browser-extension flow: an interactive connect marks the
/// client as trusted, after which silent connects succeed.
pub struct KeypairWallet {
    keypair: Keypair,
    trusted: AtomicBool,
    connected: AtomicBool,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            trusted: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let keypair = read_keypair_file(path)
            .map_err(|err| anyhow!("failed to read keypair '{}': {err}", path.display()))?;
        Ok(Self::new(keypair))
    }

    /// Treats the client as previously approved.
    pub fn trusted(self) -> Self {
        self.trusted.store(true, Ordering::SeqCst);
        self
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for KeypairWallet {
    fn is_available(&self) -> bool {
        true
    }

    async fn connect(&self, silent: bool) -> Result<Pubkey, WalletError> {
        if silent && !self.trusted.load(Ordering::SeqCst) {
            return Err(WalletError::NotTrusted);
        }
        self.trusted.store(true, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, WalletError> {
        if !self.is_connected() {
            return Err(WalletError::Rejected("wallet is not connected".into()));
        }
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|err| WalletError::Signing(err.to_string()))?;
        debug!(signer = %self.keypair.pubkey(), "signed transaction");
        Ok(transaction)
    }
}

pub struct MissingWalletProvider;

#[async_trait]
impl WalletProvider for MissingWalletProvider {
    fn is_available(&self) -> bool {
        false
    }

    async fn connect(&self, _silent: bool) -> Result<Pubkey, WalletError> {
        Err(WalletError::Unavailable)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        Err(WalletError::Unavailable)
    }

    async fn sign_transaction(&self, _transaction: Transaction) -> Result<Transaction, WalletError> {
        Err(WalletError::Unavailable)
    }
}
