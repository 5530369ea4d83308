//! Unsigned/signed swap transaction type-state
//!
//! `UnsignedSwapTransaction::sign` consumes the unsigned value, so a
//! transaction can be signed at most once and a signed transaction exposes
//! no way to mutate its message.

use solana_sdk::{
    message::VersionedMessage,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};

use crate::errors::SwapError;

/// Compiled transaction waiting for the payer signature
#[derive(Debug, Clone)]
pub struct UnsignedSwapTransaction {
    message: VersionedMessage,
    required_signers: Vec<Pubkey>,
}

impl UnsignedSwapTransaction {
    pub fn new(message: VersionedMessage) -> Self {
        let required_signers = crate::compat::get_required_signers(&message).to_vec();
        Self {
            message,
            required_signers,
        }
    }

    pub fn message(&self) -> &VersionedMessage {
        &self.message
    }

    pub fn required_signers(&self) -> &[Pubkey] {
        &self.required_signers
    }

    /// Sign with `keypair`, which must be the only required signer
    pub fn sign(self, keypair: &Keypair) -> Result<SignedSwapTransaction, SwapError> {
        if self.required_signers != [keypair.pubkey()] {
            return Err(SwapError::Signing(format!(
                "message requires signers {:?}, wallet is {}",
                self.required_signers,
                keypair.pubkey()
            )));
        }

        let tx = VersionedTransaction::try_new(self.message, &[keypair])
            .map_err(|e| SwapError::Signing(e.to_string()))?;
        let signature = tx
            .signatures
            .first()
            .copied()
            .ok_or_else(|| SwapError::Signing("transaction has no signatures".to_string()))?;

        Ok(SignedSwapTransaction { tx, signature })
    }
}

/// Fully signed transaction, identified by its first signature
#[derive(Debug, Clone)]
pub struct SignedSwapTransaction {
    tx: VersionedTransaction,
    signature: Signature,
}

impl SignedSwapTransaction {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn transaction(&self) -> &VersionedTransaction {
        &self.tx
    }

    pub fn into_transaction(self) -> VersionedTransaction {
        self.tx
    }
}
