//! Wallet management module

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Wallet manager holding the payer keypair
///
/// Cloning shares the underlying keypair; the secret is never copied out.
#[derive(Clone)]
pub struct WalletManager {
    keypair: Arc<Keypair>,
}

impl WalletManager {
    /// Load a keypair from a Solana CLI JSON file or a raw 64-byte file
    pub fn from_file(path: &str) -> Result<Self> {
        let keypair_bytes = Zeroizing::new(
            std::fs::read(path).with_context(|| format!("Failed to read keypair file: {}", path))?,
        );

        let keypair = if keypair_bytes.len() == 64 {
            Self::keypair_from_bytes(&keypair_bytes).context("Invalid keypair bytes")?
        } else {
            let json: Zeroizing<Vec<u8>> = Zeroizing::new(
                serde_json::from_slice(&keypair_bytes).context("Failed to parse keypair JSON")?,
            );
            Self::keypair_from_bytes(&json).context("Invalid keypair from JSON")?
        };

        Ok(Self::from_keypair(keypair))
    }

    /// Load a keypair from a base58 encoded 64-byte secret key
    pub fn from_base58(secret: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            bs58::decode(secret.trim())
                .into_vec()
                .context("Private key is not valid base58")?,
        );
        let keypair = Self::keypair_from_bytes(&bytes).context("Invalid base58 private key")?;
        Ok(Self::from_keypair(keypair))
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair> {
        if bytes.len() != 64 {
            anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", bytes.len());
        }
        if bytes.iter().all(|&b| b == 0) {
            anyhow::bail!("Invalid keypair: all-zero key rejected");
        }
        Keypair::try_from(bytes).map_err(|e| anyhow::anyhow!("{}", e))
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("pubkey", &self.pubkey())
            .finish()
    }
}
