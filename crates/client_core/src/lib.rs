use std::{fmt, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{
        CounterDirection, COUNTER_SEED, DEFAULT_MUTATION_FEE_LAMPORTS, MIN_MUTATION_FEE_LAMPORTS,
        PROGRAM_ID,
    },
    error::{ErrorKind, ErrorReport},
    protocol::{self, CounterAccount, CounterProgramError, DecodeError},
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub mod keypair_wallet;
mod refresh;
pub mod rpc_ledger;

pub use keypair_wallet::{KeypairWallet, MissingWalletProvider};
pub use refresh::{RefreshOutcome, RefreshPolicy};
pub use rpc_ledger::RpcLedgerClient;

pub const NOT_INITIALIZED_MESSAGE: &str =
    "Counter is not initialized yet. Run initialize to create it.";

const SESSION_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet provider not found")]
    Unavailable,
    #[error("wallet has not approved this client yet")]
    NotTrusted,
    #[error("wallet rejected the request: {0}")]
    Rejected(String),
    #[error("failed to sign transaction: {0}")]
    Signing(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{message}{}", render_logs(.logs))]
    Rpc { message: String, logs: Vec<String> },
    #[error("transaction {signature} failed: {reason}")]
    TransactionFailed { signature: Signature, reason: String },
    #[error("transaction {0} was not confirmed in time")]
    ConfirmationTimeout(Signature),
}

fn render_logs(logs: &[String]) -> String {
    if logs.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nprogram logs:");
    for line in logs {
        out.push_str("\n  ");
        out.push_str(line);
    }
    out
}

fn with_program_error_name(text: String, logs: &[String]) -> String {
    let found = CounterProgramError::find_in(&text)
        .or_else(|| logs.iter().find_map(|line| CounterProgramError::find_in(line)));
    match found {
        Some(err) => format!("{text} ({})", err.message()),
        None => text,
    }
}

impl LedgerError {
    pub fn rpc(message: impl Into<String>, logs: Vec<String>) -> Self {
        Self::Rpc {
            message: with_program_error_name(message.into(), &logs),
            logs,
        }
    }

    pub fn transaction_failed(signature: Signature, reason: impl Into<String>) -> Self {
        Self::TransactionFailed {
            signature,
            reason: with_program_error_name(reason.into(), &[]),
        }
    }

    pub fn program_error(&self) -> Option<CounterProgramError> {
        match self {
            Self::Rpc { message, logs } => CounterProgramError::find_in(message)
                .or_else(|| logs.iter().find_map(|line| CounterProgramError::find_in(line))),
            Self::TransactionFailed { reason, .. } => CounterProgramError::find_in(reason),
            Self::ConfirmationTimeout(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    Increment,
    Decrement,
}

impl From<CounterDirection> for Operation {
    fn from(direction: CounterDirection) -> Self {
        match direction {
            CounterDirection::Increment => Self::Increment,
            CounterDirection::Decrement => Self::Decrement,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialize => "initialize",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("wallet provider not found")]
    WalletUnavailable,
    #[error("failed to connect wallet: {0}")]
    WalletConnect(#[source] WalletError),
    #[error("wallet is not connected")]
    NotConnected,
    #[error("counter account has not been set up for this session")]
    AccountNotDerived,
    #[error("mutation fee of {configured} lamports is below the program minimum of {minimum}")]
    FeeBelowMinimum { configured: u64, minimum: u64 },
    #[error("another transaction is still in flight")]
    Busy,
    #[error("session was reset while the operation was in flight")]
    SessionReset,
    #[error("{operation} failed: {source}")]
    Wallet {
        operation: Operation,
        #[source]
        source: WalletError,
    },
    #[error("{operation} failed: {source}")]
    Ledger {
        operation: Operation,
        #[source]
        source: LedgerError,
    },
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WalletUnavailable | Self::WalletConnect(_) => ErrorKind::Environment,
            Self::Wallet {
                source: WalletError::Unavailable | WalletError::NotTrusted,
                ..
            } => ErrorKind::Environment,
            Self::NotConnected
            | Self::AccountNotDerived
            | Self::FeeBelowMinimum { .. }
            | Self::Busy
            | Self::SessionReset => ErrorKind::Precondition,
            Self::Wallet { .. } | Self::Ledger { .. } => ErrorKind::Network,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self.kind(), self.to_string())
    }
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("counter account {0} does not exist")]
    Missing(Pubkey),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Raw account as returned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAccount {
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a wallet is present at all. Absence is not an error.
    fn is_available(&self) -> bool;
    /// `silent` only succeeds if the wallet already trusts this client.
    async fn connect(&self, silent: bool) -> Result<Pubkey, WalletError>;
    async fn disconnect(&self) -> Result<(), WalletError>;
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError>;

    async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, WalletError> {
        let mut signed = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            signed.push(self.sign_transaction(transaction).await?);
        }
        Ok(signed)
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    fn derive_program_address(&self, seeds: &[&[u8]], program_id: &Pubkey) -> (Pubkey, u8) {
        protocol::derive_program_address(seeds, program_id)
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError>;
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError>;
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<(), LedgerError>;
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<LedgerAccount>, LedgerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Unknown,
    Fresh,
    /// Transaction confirmed but the new state has not been read back yet.
    PendingVisibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected { initialized: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub wallet_address: Option<Pubkey>,
    pub connected: bool,
    pub connecting: bool,
    pub counter_account: Option<Pubkey>,
    pub initialized: bool,
    pub counter: u64,
    pub sync: SyncStatus,
    pub loading: bool,
    pub error: Option<ErrorReport>,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        if self.connected {
            SessionPhase::Connected {
                initialized: self.initialized,
            }
        } else if self.connecting {
            SessionPhase::Connecting
        } else {
            SessionPhase::Disconnected
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|report| report.message.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    Interactive,
    /// Only succeeds if the wallet previously approved this client.
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Initialized { count: u64 },
    Uninitialized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Value(u64),
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReport {
    pub operation: Operation,
    pub signature: Signature,
    pub outcome: RefreshOutcome,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Changed(Session),
    Submitted {
        operation: Operation,
        signature: Signature,
    },
    Confirmed {
        operation: Operation,
        signature: Signature,
    },
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub program_id: Pubkey,
    pub commitment: CommitmentConfig,
    pub mutation_fee_lamports: u64,
    pub refresh: RefreshPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            program_id: PROGRAM_ID,
            commitment: CommitmentConfig::confirmed(),
            mutation_fee_lamports: DEFAULT_MUTATION_FEE_LAMPORTS,
            refresh: RefreshPolicy::default(),
        }
    }
}

struct ControllerState {
    session: Session,
    /// Bumped whenever the session is torn down; in-flight work compares it after every await.
    epoch: u64,
}

pub struct SessionController {
    wallet: Arc<dyn WalletProvider>,
    ledger: Arc<dyn LedgerClient>,
    config: ControllerConfig,
    state: Mutex<ControllerState>,
    in_flight: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        ledger: Arc<dyn LedgerClient>,
        config: ControllerConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Arc::new(Self {
            wallet,
            ledger,
            config,
            state: Mutex::new(ControllerState {
                session: Session::default(),
                epoch: 0,
            }),
            in_flight: Mutex::new(()),
            events,
        })
    }

    pub fn without_wallet(ledger: Arc<dyn LedgerClient>, config: ControllerConfig) -> Arc<Self> {
        Self::new(Arc::new(MissingWalletProvider), ledger, config)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Session {
        self.state.lock().await.session.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.session.phase()
    }

    /// Program-derived counter address for the configured program. No network access.
    pub fn derive_account_address(&self) -> (Pubkey, u8) {
        self.ledger
            .derive_program_address(&[COUNTER_SEED], &self.config.program_id)
    }

    pub async fn connect(&self, mode: ConnectMode) -> Result<Pubkey, SessionError> {
        if !self.wallet.is_available() {
            let err = SessionError::WalletUnavailable;
            info!("wallet provider not detected");
            self.record_error(&err).await;
            return Err(err);
        }

        let (epoch, existing) = {
            let mut guard = self.state.lock().await;
            let existing = guard.session.wallet_address.filter(|_| guard.session.connected);
            if existing.is_none() {
                guard.session.connecting = true;
                if mode == ConnectMode::Interactive {
                    guard.session.error = None;
                }
            }
            (guard.epoch, existing)
        };
        if let Some(address) = existing {
            return Ok(address);
        }
        self.publish_snapshot().await;

        let silent = mode == ConnectMode::Silent;
        match self.wallet.connect(silent).await {
            Ok(address) => {
                self.apply(epoch, |s| {
                    s.connecting = false;
                    s.connected = true;
                    s.wallet_address = Some(address);
                })
                .await?;
                info!(wallet = %address, silent, "wallet connected");
                self.setup_account().await?;
                Ok(address)
            }
            Err(source) => {
                let err = SessionError::WalletConnect(source);
                let report = err.report();
                self.apply(epoch, |s| {
                    s.connecting = false;
                    if !silent {
                        s.error = Some(report);
                    }
                })
                .await?;
                if silent {
                    debug!(error = %err, "silent wallet connect declined");
                } else {
                    warn!(error = %err, "wallet connect failed");
                }
                Err(err)
            }
        }
    }

    /// Silent reconnect on startup; a declined wallet is not surfaced as an error.
    pub async fn try_reconnect(&self) -> Option<Pubkey> {
        if !self.wallet.is_available() {
            return None;
        }
        self.connect(ConnectMode::Silent).await.ok()
    }

    pub async fn disconnect(&self) {
        {
            let mut guard = self.state.lock().await;
            guard.epoch = guard.epoch.wrapping_add(1);
            guard.session = Session::default();
        }
        self.publish_snapshot().await;

        if let Err(err) = self.wallet.disconnect().await {
            warn!(error = %err, "wallet disconnect failed; session cleared anyway");
        }
        info!("session disconnected");
    }

    pub async fn setup_account(&self) -> Result<AccountStatus, SessionError> {
        let (epoch, ()) = self
            .begin(false, |s| {
                if s.connected {
                    Ok(())
                } else {
                    Err(SessionError::NotConnected)
                }
            })
            .await?;

        let (account, bump) = self.derive_account_address();
        debug!(%account, bump, "derived counter account");
        self.apply(epoch, |s| s.counter_account = Some(account))
            .await?;

        match self.read_counter(&account).await {
            Ok(count) => {
                self.apply(epoch, |s| {
                    s.initialized = true;
                    s.counter = count;
                    s.sync = SyncStatus::Fresh;
                    s.error = None;
                })
                .await?;
                info!(%account, count, "counter account ready");
                Ok(AccountStatus::Initialized { count })
            }
            Err(err) => {
                info!(%account, reason = %err, "counter account not initialized");
                self.apply(epoch, |s| {
                    s.initialized = false;
                    s.counter = 0;
                    s.sync = SyncStatus::Unknown;
                    s.error = Some(not_initialized_report());
                })
                .await?;
                Ok(AccountStatus::Uninitialized)
            }
        }
    }

    pub async fn initialize_account(&self) -> Result<TransactionReport, SessionError> {
        let operation = Operation::Initialize;
        let _slot = self.claim_slot(operation)?;
        let (epoch, payer) = self.begin(true, connected_payer).await?;

        let result: Result<TransactionReport, SessionError> = async {
            let (account, _) = self.derive_account_address();
            let instruction =
                protocol::initialize_instruction(&self.config.program_id, &account, &payer);
            let signature = self.submit(epoch, operation, &payer, instruction).await?;
            self.apply(epoch, |s| s.counter_account = Some(account))
                .await?;

            let outcome = self.await_visibility(epoch, &account, |_| true).await?;
            self.apply(epoch, |s| {
                if matches!(outcome, RefreshOutcome::Visible(_)) {
                    s.initialized = true;
                }
                apply_refresh(s, &outcome);
            })
            .await?;
            Ok(TransactionReport {
                operation,
                signature,
                outcome,
            })
        }
        .await;

        self.finish(epoch, result).await
    }

    pub async fn mutate_counter(
        &self,
        direction: CounterDirection,
    ) -> Result<TransactionReport, SessionError> {
        let operation = Operation::from(direction);
        let _slot = self.claim_slot(operation)?;
        let fee = self.config.mutation_fee_lamports;
        let (epoch, (payer, account, cached)) = self
            .begin(true, |s| {
                let payer = connected_payer(s)?;
                let account = s.counter_account.ok_or(SessionError::AccountNotDerived)?;
                if fee < MIN_MUTATION_FEE_LAMPORTS {
                    return Err(SessionError::FeeBelowMinimum {
                        configured: fee,
                        minimum: MIN_MUTATION_FEE_LAMPORTS,
                    });
                }
                let cached = (s.sync == SyncStatus::Fresh).then_some(s.counter);
                Ok((payer, account, cached))
            })
            .await?;

        let result: Result<TransactionReport, SessionError> = async {
            let baseline = match cached {
                Some(count) => Some(count),
                None => self.read_counter(&account).await.ok(),
            };
            self.ensure_epoch(epoch).await?;

            let instruction = protocol::mutate_instruction(
                &self.config.program_id,
                direction,
                &account,
                &payer,
                fee,
            );
            let signature = self.submit(epoch, operation, &payer, instruction).await?;

            let outcome = self
                .await_visibility(epoch, &account, |count| {
                    baseline.map_or(true, |before| direction.moved(before, count))
                })
                .await?;
            self.apply(epoch, |s| apply_refresh(s, &outcome)).await?;
            Ok(TransactionReport {
                operation,
                signature,
                outcome,
            })
        }
        .await;

        self.finish(epoch, result).await
    }

    /// Reads the counter into the session. Never fails: an unreadable account
    /// resets the displayed value to zero and leaves an advisory message.
    pub async fn fetch_counter_state(&self, account: Pubkey) -> FetchOutcome {
        let epoch = self.state.lock().await.epoch;
        let outcome = match self.read_counter(&account).await {
            Ok(count) => FetchOutcome::Value(count),
            Err(err) => {
                warn!(%account, error = %err, "failed to fetch counter");
                FetchOutcome::Unavailable {
                    reason: err.to_string(),
                }
            }
        };

        let applied = self
            .apply(epoch, |s| match &outcome {
                FetchOutcome::Value(count) => {
                    s.counter = *count;
                    s.sync = SyncStatus::Fresh;
                    s.error = None;
                }
                FetchOutcome::Unavailable { .. } => {
                    s.counter = 0;
                    s.sync = SyncStatus::Unknown;
                    s.error = Some(not_initialized_report());
                }
            })
            .await;
        if applied.is_err() {
            debug!(%account, "session reset during fetch; result discarded");
        }
        outcome
    }

    /// Re-reads the cached counter account.
    pub async fn refresh(&self) -> Result<FetchOutcome, SessionError> {
        let account = self
            .state
            .lock()
            .await
            .session
            .counter_account
            .ok_or(SessionError::AccountNotDerived)?;
        Ok(self.fetch_counter_state(account).await)
    }

    fn claim_slot(&self, operation: Operation) -> Result<MutexGuard<'_, ()>, SessionError> {
        self.in_flight.try_lock().map_err(|_| {
            warn!(%operation, "rejected: another transaction is in flight");
            SessionError::Busy
        })
    }

    /// Validates preconditions and clears the previous error in one step.
    async fn begin<T>(
        &self,
        loading: bool,
        check: impl FnOnce(&Session) -> Result<T, SessionError>,
    ) -> Result<(u64, T), SessionError> {
        let result = {
            let mut guard = self.state.lock().await;
            let epoch = guard.epoch;
            match check(&guard.session) {
                Ok(value) => {
                    guard.session.error = None;
                    guard.session.loading = loading;
                    Ok((epoch, value))
                }
                Err(err) => {
                    guard.session.error = Some(err.report());
                    Err(err)
                }
            }
        };
        self.publish_snapshot().await;
        result
    }

    async fn finish<T>(
        &self,
        epoch: u64,
        result: Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        if let Err(err) = &result {
            if matches!(err, SessionError::SessionReset) {
                info!("operation abandoned after session reset");
            } else {
                warn!(error = %err, kind = ?err.kind(), "operation failed");
                let report = err.report();
                let _ = self
                    .apply(epoch, |s| {
                        s.loading = false;
                        s.error = Some(report);
                    })
                    .await;
            }
        }
        result
    }

    async fn submit(
        &self,
        epoch: u64,
        operation: Operation,
        payer: &Pubkey,
        instruction: Instruction,
    ) -> Result<Signature, SessionError> {
        let blockhash = self
            .ledger
            .latest_blockhash()
            .await
            .map_err(|source| SessionError::Ledger { operation, source })?;
        self.ensure_epoch(epoch).await?;

        let mut transaction = Transaction::new_with_payer(&[instruction], Some(payer));
        transaction.message.recent_blockhash = blockhash;
        let signed = self
            .wallet
            .sign_transaction(transaction)
            .await
            .map_err(|source| SessionError::Wallet { operation, source })?;
        self.ensure_epoch(epoch).await?;

        let signature = self
            .ledger
            .send_transaction(&signed)
            .await
            .map_err(|source| SessionError::Ledger { operation, source })?;
        info!(%operation, %signature, "transaction submitted");
        let _ = self.events.send(SessionEvent::Submitted {
            operation,
            signature,
        });

        self.ledger
            .confirm_transaction(&signature, self.config.commitment)
            .await
            .map_err(|source| SessionError::Ledger { operation, source })?;
        info!(%operation, %signature, commitment = ?self.config.commitment.commitment, "transaction confirmed");
        let _ = self.events.send(SessionEvent::Confirmed {
            operation,
            signature,
        });

        self.ensure_epoch(epoch).await?;
        Ok(signature)
    }

    async fn await_visibility(
        &self,
        epoch: u64,
        account: &Pubkey,
        expected: impl Fn(u64) -> bool,
    ) -> Result<RefreshOutcome, SessionError> {
        let mut last_seen = None;
        let mut last_failure = None;
        for (attempt, delay) in self.config.refresh.delays().enumerate() {
            tokio::time::sleep(delay).await;
            self.ensure_epoch(epoch).await?;
            match self.read_counter(account).await {
                Ok(count) if expected(count) => {
                    debug!(%account, attempt = attempt + 1, count, "counter state visible");
                    return Ok(RefreshOutcome::Visible(count));
                }
                Ok(count) => {
                    debug!(%account, attempt = attempt + 1, count, "counter state not updated yet");
                    last_seen = Some(count);
                    last_failure = None;
                }
                Err(err) => {
                    debug!(%account, attempt = attempt + 1, error = %err, "counter account not readable yet");
                    last_failure = Some(err.to_string());
                }
            }
        }
        if let Some(reason) = last_failure {
            warn!(%account, error = %reason, "counter account unreadable after confirmation");
            return Ok(RefreshOutcome::Unreadable { reason });
        }
        warn!(
            %account,
            max_attempts = self.config.refresh.max_attempts,
            "confirmed state not visible after refresh attempts"
        );
        Ok(RefreshOutcome::Pending { last_seen })
    }

    async fn read_counter(&self, account: &Pubkey) -> Result<u64, FetchError> {
        let fetched = self
            .ledger
            .fetch_account(account)
            .await?
            .ok_or(FetchError::Missing(*account))?;
        let state = CounterAccount::decode_owned(
            account,
            &fetched.owner,
            &self.config.program_id,
            &fetched.data,
        )?;
        Ok(state.count)
    }

    async fn ensure_epoch(&self, epoch: u64) -> Result<(), SessionError> {
        if self.state.lock().await.epoch == epoch {
            Ok(())
        } else {
            Err(SessionError::SessionReset)
        }
    }

    async fn apply(
        &self,
        epoch: u64,
        update: impl FnOnce(&mut Session),
    ) -> Result<(), SessionError> {
        let snapshot = {
            let mut guard = self.state.lock().await;
            if guard.epoch != epoch {
                return Err(SessionError::SessionReset);
            }
            update(&mut guard.session);
            guard.session.clone()
        };
        let _ = self.events.send(SessionEvent::Changed(snapshot));
        Ok(())
    }

    async fn record_error(&self, err: &SessionError) {
        self.state.lock().await.session.error = Some(err.report());
        self.publish_snapshot().await;
    }

    async fn publish_snapshot(&self) {
        let snapshot = self.snapshot().await;
        let _ = self.events.send(SessionEvent::Changed(snapshot));
    }
}

fn connected_payer(session: &Session) -> Result<Pubkey, SessionError> {
    session
        .wallet_address
        .filter(|_| session.connected)
        .ok_or(SessionError::NotConnected)
}

/// Folds the post-confirmation read into the session the same way a plain
/// fetch would: an unreadable account shows as zero with the advisory.
fn apply_refresh(session: &mut Session, outcome: &RefreshOutcome) {
    session.loading = false;
    match outcome {
        RefreshOutcome::Visible(count) => {
            session.counter = *count;
            session.sync = SyncStatus::Fresh;
            session.error = None;
        }
        RefreshOutcome::Pending { .. } => session.sync = SyncStatus::PendingVisibility,
        RefreshOutcome::Unreadable { .. } => {
            session.counter = 0;
            session.sync = SyncStatus::Unknown;
            session.error = Some(not_initialized_report());
        }
    }
}

fn not_initialized_report() -> ErrorReport {
    ErrorReport::new(ErrorKind::StateRead, NOT_INITIALIZED_MESSAGE)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
