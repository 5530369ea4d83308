//! Jito tip instruction and bundle envelope

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::seq::SliceRandom;
use solana_sdk::{
    instruction::Instruction, packet::PACKET_DATA_SIZE, pubkey, pubkey::Pubkey,
    signature::Signature, system_instruction, system_program,
};

use super::output::SignedSwapTransaction;
use crate::errors::SwapError;

/// Mainnet tip accounts published by the Jito block engine
pub const JITO_TIP_ACCOUNTS: [Pubkey; 8] = [
    pubkey!("96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5"),
    pubkey!("HFqU5x63VTqvQss8hp11i4wVV8bD44PvwucfZ2bU7gRe"),
    pubkey!("Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY"),
    pubkey!("ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGPaS49"),
    pubkey!("DfXygSm4jCyNCybVYYK6DwvWqjKee8pbDmJGcLWNDXjh"),
    pubkey!("ADuUkR4vqLUMWXxW9gh6D6L8pMSawimctcNZ5pGwDcEt"),
    pubkey!("DttWaMuVvTiduZRnguLF7jNxTgiMBZ1hyAumKUiL2KRL"),
    pubkey!("3AVi9Tg9Uo68tJfuvoKvqKNWKkC5wPdSSdeBnizKZ6jT"),
];

/// Pick a tip account at random to spread write-lock contention
pub fn random_tip_account() -> Pubkey {
    *JITO_TIP_ACCOUNTS
        .choose(&mut rand::thread_rng())
        .unwrap_or(&JITO_TIP_ACCOUNTS[0])
}

pub fn is_tip_account(key: &Pubkey) -> bool {
    JITO_TIP_ACCOUNTS.contains(key)
}

/// System transfer into one of the tip accounts
pub(crate) fn is_tip_instruction(ix: &Instruction) -> bool {
    ix.program_id == system_program::id()
        && ix.accounts.get(1).is_some_and(|meta| is_tip_account(&meta.pubkey))
}

/// Tip transfer from `payer`; `None` when tipping is disabled
pub fn tip_instruction(payer: &Pubkey, lamports: u64) -> Option<Instruction> {
    (lamports > 0).then(|| system_instruction::transfer(payer, &random_tip_account(), lamports))
}

/// Signed transactions serialized for `sendBundle`
#[derive(Debug, Clone)]
pub struct BundleEnvelope {
    transactions: Vec<String>,
    signatures: Vec<Signature>,
}

impl BundleEnvelope {
    /// Bundle holding a single swap transaction
    pub fn single(tx: &SignedSwapTransaction) -> Result<Self, SwapError> {
        let bytes = bincode::serialize(tx.transaction())
            .map_err(|e| SwapError::Assembly(format!("transaction serialization failed: {}", e)))?;
        if bytes.len() > PACKET_DATA_SIZE {
            return Err(SwapError::Assembly(format!(
                "transaction is {} bytes, limit is {}",
                bytes.len(),
                PACKET_DATA_SIZE
            )));
        }

        Ok(Self {
            transactions: vec![BASE64.encode(&bytes)],
            signatures: vec![*tx.signature()],
        })
    }

    /// Base64 encoded transactions in bundle order
    pub fn encoded_transactions(&self) -> &[String] {
        &self.transactions
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
