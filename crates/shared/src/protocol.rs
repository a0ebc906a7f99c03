//! Wire format of the counter program: instruction encoding, account layout
//! and the address derivation shared by every client.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use thiserror::Error;

use crate::domain::{CounterDirection, COUNTER_SEED, SYSTEM_PROGRAM_ID};

pub const DISCRIMINATOR_LEN: usize = 8;
pub const COUNTER_ACCOUNT_LEN: usize = DISCRIMINATOR_LEN + 8;

const CUSTOM_ERROR_MARKER: &str = "custom program error: 0x";

fn sighash(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// First eight bytes of instruction data selecting the program entry point.
pub fn instruction_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    sighash("global", name)
}

pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    sighash("account", name)
}

pub fn derive_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(seeds, program_id)
}

/// The counter account owned by `program_id`. Same inputs, same address.
pub fn derive_counter_address(program_id: &Pubkey) -> (Pubkey, u8) {
    derive_program_address(&[COUNTER_SEED], program_id)
}

pub fn initialize_instruction(program_id: &Pubkey, counter: &Pubkey, payer: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: counter_accounts(counter, payer),
        data: instruction_discriminator("initialize").to_vec(),
    }
}

pub fn mutate_instruction(
    program_id: &Pubkey,
    direction: CounterDirection,
    counter: &Pubkey,
    payer: &Pubkey,
    payment_lamports: u64,
) -> Instruction {
    let mut data = Vec::with_capacity(DISCRIMINATOR_LEN + 8);
    data.extend_from_slice(&instruction_discriminator(direction.instruction_name()));
    data.extend_from_slice(&payment_lamports.to_le_bytes());
    Instruction {
        program_id: *program_id,
        accounts: counter_accounts(counter, payer),
        data,
    }
}

fn counter_accounts(counter: &Pubkey, payer: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*counter, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CounterAccount {
    pub count: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("account {account} is owned by {owner}, not by the counter program")]
    WrongOwner { account: Pubkey, owner: Pubkey },
    #[error("account data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("account discriminator does not match Counter")]
    DiscriminatorMismatch,
    #[error("failed to deserialize counter account: {0}")]
    Borsh(String),
}

impl CounterAccount {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < COUNTER_ACCOUNT_LEN {
            return Err(DecodeError::TooShort {
                expected: COUNTER_ACCOUNT_LEN,
                actual: data.len(),
            });
        }
        let (discriminator, mut body) = data.split_at(DISCRIMINATOR_LEN);
        if discriminator != account_discriminator("Counter") {
            return Err(DecodeError::DiscriminatorMismatch);
        }
        <Self as BorshDeserialize>::deserialize(&mut body)
            .map_err(|err| DecodeError::Borsh(err.to_string()))
    }

    /// Decodes `data` only if the account belongs to `program_id`.
    pub fn decode_owned(
        account: &Pubkey,
        owner: &Pubkey,
        program_id: &Pubkey,
        data: &[u8],
    ) -> Result<Self, DecodeError> {
        if owner != program_id {
            return Err(DecodeError::WrongOwner {
                account: *account,
                owner: *owner,
            });
        }
        Self::decode(data)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(COUNTER_ACCOUNT_LEN);
        data.extend_from_slice(&account_discriminator("Counter"));
        data.extend_from_slice(&self.count.to_le_bytes());
        data
    }
}

/// Custom errors raised by the counter program (Anchor numbering starts at 6000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterProgramError {
    InsufficientPayment,
    CounterUnderflow,
}

impl CounterProgramError {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            6000 => Some(Self::InsufficientPayment),
            6001 => Some(Self::CounterUnderflow),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::InsufficientPayment => "Payment is insufficient",
            Self::CounterUnderflow => "Counter cannot go below zero",
        }
    }

    /// Finds a `custom program error: 0x...` marker in an RPC error string.
    pub fn find_in(text: &str) -> Option<Self> {
        let start = text.find(CUSTOM_ERROR_MARKER)? + CUSTOM_ERROR_MARKER.len();
        let hex: String = text[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        u32::from_str_radix(&hex, 16).ok().and_then(Self::from_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PROGRAM_ID;

    #[test]
    fn discriminators_match_anchor_sighash() {
        assert_eq!(
            instruction_discriminator("initialize"),
            [175, 175, 109, 31, 13, 152, 155, 237]
        );
        assert_eq!(
            instruction_discriminator("increment"),
            [11, 18, 104, 9, 104, 174, 59, 33]
        );
        assert_eq!(
            instruction_discriminator("decrement"),
            [106, 227, 168, 59, 248, 27, 150, 101]
        );
        assert_eq!(
            account_discriminator("Counter"),
            [255, 176, 4, 245, 188, 253, 124, 25]
        );
    }

    #[test]
    fn counter_address_derivation_is_pure() {
        let first = derive_counter_address(&PROGRAM_ID);
        let second = derive_counter_address(&PROGRAM_ID);
        assert_eq!(first, second);
        assert!(!first.0.is_on_curve());
    }

    #[test]
    fn counter_address_depends_on_seed_and_program() {
        let (counter, _) = derive_counter_address(&PROGRAM_ID);
        let (other_seed, _) = derive_program_address(&[b"counters"], &PROGRAM_ID);
        let (other_program, _) = derive_counter_address(&Pubkey::new_unique());
        assert_ne!(counter, other_seed);
        assert_ne!(counter, other_program);
    }

    #[test]
    fn mutate_instruction_carries_payment_and_accounts() {
        let payer = Pubkey::new_unique();
        let (counter, _) = derive_counter_address(&PROGRAM_ID);
        let ix = mutate_instruction(
            &PROGRAM_ID,
            CounterDirection::Decrement,
            &counter,
            &payer,
            10_000_000,
        );

        assert_eq!(ix.program_id, PROGRAM_ID);
        assert_eq!(&ix.data[..8], &instruction_discriminator("decrement"));
        assert_eq!(&ix.data[8..], &10_000_000u64.to_le_bytes());
        assert_eq!(ix.accounts.len(), 3);
        assert_eq!(ix.accounts[0], AccountMeta::new(counter, false));
        assert_eq!(ix.accounts[1], AccountMeta::new(payer, true));
        assert_eq!(
            ix.accounts[2],
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false)
        );
    }

    #[test]
    fn initialize_instruction_has_no_arguments() {
        let payer = Pubkey::new_unique();
        let (counter, _) = derive_counter_address(&PROGRAM_ID);
        let ix = initialize_instruction(&PROGRAM_ID, &counter, &payer);
        assert_eq!(ix.data, instruction_discriminator("initialize").to_vec());
    }

    #[test]
    fn decodes_counter_account_layout() {
        let data = CounterAccount { count: 42 }.encode();
        assert_eq!(data.len(), COUNTER_ACCOUNT_LEN);
        assert_eq!(CounterAccount::decode(&data), Ok(CounterAccount { count: 42 }));
    }

    #[test]
    fn decodes_hand_built_anchor_account() {
        let mut data = account_discriminator("Counter").to_vec();
        data.extend_from_slice(&u64::MAX.to_le_bytes());
        assert_eq!(
            CounterAccount::decode(&data),
            Ok(CounterAccount { count: u64::MAX })
        );
    }

    #[test]
    fn system_program_id_is_all_zero_bytes() {
        assert_eq!(SYSTEM_PROGRAM_ID, Pubkey::default());
    }

    #[test]
    fn rejects_malformed_counter_accounts() {
        assert_eq!(
            CounterAccount::decode(&[0u8; 4]),
            Err(DecodeError::TooShort {
                expected: COUNTER_ACCOUNT_LEN,
                actual: 4
            })
        );
        assert_eq!(
            CounterAccount::decode(&[0u8; COUNTER_ACCOUNT_LEN]),
            Err(DecodeError::DiscriminatorMismatch)
        );

        let account = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let data = CounterAccount { count: 1 }.encode();
        assert!(matches!(
            CounterAccount::decode_owned(&account, &owner, &PROGRAM_ID, &data),
            Err(DecodeError::WrongOwner { .. })
        ));
        assert_eq!(
            CounterAccount::decode_owned(&account, &PROGRAM_ID, &PROGRAM_ID, &data),
            Ok(CounterAccount { count: 1 })
        );
    }

    #[test]
    fn recognizes_custom_program_errors_in_rpc_messages() {
        let message = "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1771";
        assert_eq!(
            CounterProgramError::find_in(message),
            Some(CounterProgramError::CounterUnderflow)
        );
        assert_eq!(
            CounterProgramError::find_in("custom program error: 0x1770"),
            Some(CounterProgramError::InsufficientPayment)
        );
        assert_eq!(CounterProgramError::find_in("custom program error: 0x0"), None);
        assert_eq!(CounterProgramError::find_in("blockhash not found"), None);
    }
}
