//! Per-attempt assembly context
//!
//! Holds the chain state one attempt compiles against: the payer, the
//! resolved lookup tables and the recent blockhash. A context is built fresh
//! for every attempt and never reused, so a retried attempt can not compile
//! against a stale blockhash.

use solana_sdk::{hash::Hash, message::AddressLookupTableAccount, pubkey::Pubkey};

pub struct AttemptContext {
    /// 0-based attempt index
    pub attempt: u32,

    pub slippage_bps: u16,

    /// Fee payer and sole signer
    pub payer: Pubkey,

    pub blockhash: Hash,

    /// Lookup tables referenced by the instruction set, already resolved
    pub lookup_tables: Vec<AddressLookupTableAccount>,
}

impl AttemptContext {
    pub fn new(
        attempt: u32,
        slippage_bps: u16,
        payer: Pubkey,
        blockhash: Hash,
        lookup_tables: Vec<AddressLookupTableAccount>,
    ) -> Self {
        Self {
            attempt,
            slippage_bps,
            payer,
            blockhash,
            lookup_tables,
        }
    }

    /// Total addresses available through lookup tables
    pub fn lookup_address_count(&self) -> usize {
        self.lookup_tables.iter().map(|t| t.addresses.len()).sum()
    }
}

// Lookup tables can hold hundreds of addresses; only counts are printed
impl std::fmt::Debug for AttemptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptContext")
            .field("attempt", &self.attempt)
            .field("slippage_bps", &self.slippage_bps)
            .field("payer", &self.payer)
            .field("blockhash", &self.blockhash)
            .field("lookup_tables", &self.lookup_tables.len())
            .field("lookup_addresses", &self.lookup_address_count())
            .finish()
    }
}
