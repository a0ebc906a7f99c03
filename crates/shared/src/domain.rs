use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use solana_sdk::{
    commitment_config::CommitmentConfig, native_token::LAMPORTS_PER_SOL, pubkey, pubkey::Pubkey,
};

/// Address of the deployed counter program.
pub const PROGRAM_ID: Pubkey = pubkey!("DGmJsbjsife1p3QoueUruomvJXLaYXMwqEFgE4bV4xrg");
pub const SYSTEM_PROGRAM_ID: Pubkey = pubkey!("11111111111111111111111111111111");

/// Seed of the single program-derived counter account.
pub const COUNTER_SEED: &[u8] = b"counter";

/// Payment attached to every increment/decrement call (0.01 SOL).
pub const DEFAULT_MUTATION_FEE_LAMPORTS: u64 = LAMPORTS_PER_SOL / 100;

/// The program rejects payments below this amount with `InsufficientPayment`.
pub const MIN_MUTATION_FEE_LAMPORTS: u64 = 10_000_000;

/// Observed lag between confirmation and the account becoming readable.
pub const SETTLE_DELAY: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterDirection {
    Increment,
    Decrement,
}

impl CounterDirection {
    pub fn instruction_name(self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
        }
    }

    /// Whether `after` is the value this direction would produce from `before`.
    pub fn moved(self, before: u64, after: u64) -> bool {
        match self {
            Self::Increment => after > before,
            Self::Decrement => after < before,
        }
    }
}

impl fmt::Display for CounterDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.instruction_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn rpc_url(self) -> &'static str {
        match self {
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Self::Localnet => "http://127.0.0.1:8899",
        }
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" | "d" => Ok(Self::Devnet),
            "testnet" | "t" => Ok(Self::Testnet),
            "mainnet-beta" | "mainnet" | "m" => Ok(Self::MainnetBeta),
            "localnet" | "localhost" | "l" => Ok(Self::Localnet),
            other => Err(format!("unknown cluster moniker '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn to_config(self) -> CommitmentConfig {
        match self {
            Self::Processed => CommitmentConfig::processed(),
            Self::Confirmed => CommitmentConfig::confirmed(),
            Self::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(format!("unsupported commitment level '{other}'")),
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fee_is_one_hundredth_sol_and_meets_program_minimum() {
        assert_eq!(DEFAULT_MUTATION_FEE_LAMPORTS, 10_000_000);
        assert!(DEFAULT_MUTATION_FEE_LAMPORTS >= MIN_MUTATION_FEE_LAMPORTS);
    }

    #[test]
    fn direction_movement_matches_instruction() {
        assert!(CounterDirection::Increment.moved(3, 4));
        assert!(!CounterDirection::Increment.moved(3, 3));
        assert!(CounterDirection::Decrement.moved(3, 2));
        assert!(!CounterDirection::Decrement.moved(0, 0));
    }

    #[test]
    fn parses_cluster_monikers() {
        assert_eq!("devnet".parse::<Cluster>(), Ok(Cluster::Devnet));
        assert_eq!("Mainnet-Beta".parse::<Cluster>(), Ok(Cluster::MainnetBeta));
        assert_eq!(Cluster::default().rpc_url(), "https://api.devnet.solana.com");
        assert!("moonnet".parse::<Cluster>().is_err());
    }

    #[test]
    fn commitment_defaults_to_confirmed() {
        assert_eq!(Commitment::default(), Commitment::Confirmed);
        assert_eq!(
            Commitment::default().to_config(),
            CommitmentConfig::confirmed()
        );
        assert_eq!("finalized".parse::<Commitment>(), Ok(Commitment::Finalized));
        assert_eq!(Commitment::Processed.to_string(), "processed");
    }
}
