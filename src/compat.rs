//! Uniform accessors over `VersionedMessage`
//!
//! Legacy and V0 messages expose the same information through different
//! structs. The assembler only ever produces V0 messages, but transactions
//! handed back by tests or external tools may be legacy, so accessors here
//! handle both.

use solana_sdk::{message::VersionedMessage, pubkey::Pubkey};

/// Static account keys in the order they appear in the message
#[inline]
#[must_use]
pub fn get_static_account_keys(message: &VersionedMessage) -> &[Pubkey] {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.account_keys,
        VersionedMessage::V0(v0_msg) => &v0_msg.account_keys,
    }
}

#[inline]
#[must_use]
pub fn get_num_required_signatures(message: &VersionedMessage) -> u8 {
    message.header().num_required_signatures
}

/// Accounts that must sign; always the leading static keys
#[must_use]
pub fn get_required_signers(message: &VersionedMessage) -> &[Pubkey] {
    let keys = get_static_account_keys(message);
    let n = (get_num_required_signatures(message) as usize).min(keys.len());
    &keys[..n]
}

/// Number of address lookup tables referenced by the message (0 for legacy)
#[must_use]
pub fn get_lookup_table_count(message: &VersionedMessage) -> usize {
    match message {
        VersionedMessage::Legacy(_) => 0,
        VersionedMessage::V0(v0_msg) => v0_msg.address_table_lookups.len(),
    }
}

/// Program id of every compiled instruction, in execution order
///
/// Program ids can never be loaded through a lookup table, so they always
/// resolve against the static keys.
#[must_use]
pub fn get_instruction_program_ids(message: &VersionedMessage) -> Vec<Pubkey> {
    let keys = get_static_account_keys(message);
    message
        .instructions()
        .iter()
        .filter_map(|ix| keys.get(ix.program_id_index as usize).copied())
        .collect()
}
