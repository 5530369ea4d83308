//! Instruction decoding, planning and ordering validation
//!
//! Payloads from the instruction service are decoded into executable
//! instructions here, then planned into the final order:
//! 1. Compute budget instructions (CU limit, priority fee)
//! 2. Setup instructions
//! 3. The swap instruction
//! 4. Cleanup instruction (if any)
//! 5. Jito tip transfer (if any)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use solana_sdk::{
    compute_budget::{self, ComputeBudgetInstruction},
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use super::bundle::is_tip_instruction;
use crate::errors::SwapError;
use crate::types::{parse_pubkey, InstructionPayload, SwapInstructions};

/// Upper bound on decoded instruction data
pub const MAX_INSTRUCTION_DATA_LEN: usize = 10 * 1024;

/// Decode one payload into an executable instruction.
///
/// Only `payer` may appear as a signer: the transaction is signed by the
/// payer alone, so any other signer account could never be satisfied.
pub fn decode_instruction(
    payload: &InstructionPayload,
    payer: &Pubkey,
) -> Result<Instruction, SwapError> {
    let program_id = parse_pubkey(&payload.program_id).map_err(|e| {
        SwapError::decode_failed(&payload.program_id, format!("invalid program id: {}", e))
    })?;

    let accounts = payload
        .accounts
        .iter()
        .enumerate()
        .map(|(idx, meta)| {
            let pubkey = parse_pubkey(&meta.pubkey).map_err(|e| {
                SwapError::decode_failed(
                    &payload.program_id,
                    format!("account {} has invalid pubkey '{}': {}", idx, meta.pubkey, e),
                )
            })?;
            if meta.is_signer && pubkey != *payer {
                return Err(SwapError::decode_failed(
                    &payload.program_id,
                    format!("account {} ({}) requires a signature from a non-payer", idx, pubkey),
                ));
            }
            Ok(AccountMeta {
                pubkey,
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
            })
        })
        .collect::<Result<Vec<_>, SwapError>>()?;

    let data = BASE64.decode(payload.data.as_bytes()).map_err(|e| {
        SwapError::decode_failed(&payload.program_id, format!("invalid base64 data: {}", e))
    })?;
    if data.len() > MAX_INSTRUCTION_DATA_LEN {
        return Err(SwapError::decode_failed(
            &payload.program_id,
            format!(
                "instruction data is {} bytes, limit is {}",
                data.len(),
                MAX_INSTRUCTION_DATA_LEN
            ),
        ));
    }

    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

/// Decoded instruction set of one attempt
#[derive(Debug, Clone)]
pub struct DecodedSwap {
    pub setup: Vec<Instruction>,
    pub swap: Instruction,
    pub cleanup: Option<Instruction>,
    pub tip: Option<Instruction>,
}

impl DecodedSwap {
    pub fn with_tip(mut self, tip: Option<Instruction>) -> Self {
        self.tip = tip;
        self
    }

    /// Everything except the compute budget, in execution order
    pub fn body(&self) -> Vec<Instruction> {
        let mut body = Vec::with_capacity(self.setup.len() + 3);
        body.extend(self.setup.iter().cloned());
        body.push(self.swap.clone());
        body.extend(self.cleanup.iter().cloned());
        body.extend(self.tip.iter().cloned());
        body
    }
}

/// Decode the full instruction set returned for a quote
pub fn decode_swap_instructions(
    instructions: &SwapInstructions,
    payer: &Pubkey,
) -> Result<DecodedSwap, SwapError> {
    let setup = instructions
        .setup_instructions
        .iter()
        .map(|p| decode_instruction(p, payer))
        .collect::<Result<Vec<_>, _>>()?;
    let swap = decode_instruction(&instructions.swap_instruction, payer)?;
    let cleanup = instructions
        .cleanup_instruction
        .as_ref()
        .map(|p| decode_instruction(p, payer))
        .transpose()?;

    Ok(DecodedSwap {
        setup,
        swap,
        cleanup,
        tip: None,
    })
}

/// Ordered instruction list ready for compilation
#[derive(Debug, Clone)]
pub struct InstructionPlan {
    pub instructions: Vec<Instruction>,
    /// Whether the final instruction is a tip transfer
    pub has_tip: bool,
}

/// Prefix `body` with the compute budget instructions.
///
/// A zero `cu_limit` or `prio_fee` skips the corresponding instruction.
pub fn plan_swap_instructions(
    cu_limit: u32,
    prio_fee: u64,
    body: Vec<Instruction>,
) -> Result<InstructionPlan, SwapError> {
    if body.is_empty() {
        return Err(SwapError::Assembly("no instructions to plan".to_string()));
    }

    let has_tip = body.last().is_some_and(is_tip_instruction);
    let mut instructions = Vec::with_capacity(body.len() + 2);

    if cu_limit > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(cu_limit));
    }
    if prio_fee > 0 {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(prio_fee));
    }
    instructions.extend(body);

    Ok(InstructionPlan {
        instructions,
        has_tip,
    })
}

/// Validate instruction ordering (debug/test builds only)
///
/// Compute budget instructions must form the prefix, and a tip transfer may
/// only appear as the final instruction.
#[cfg(debug_assertions)]
pub fn sanity_check_ix_order(instructions: &[Instruction]) -> Result<(), SwapError> {
    if instructions.is_empty() {
        return Err(SwapError::Assembly("instruction list is empty".to_string()));
    }

    let is_budget = |ix: &Instruction| ix.program_id == compute_budget::id();
    let prefix = instructions.iter().take_while(|ix| is_budget(*ix)).count();

    if prefix > 2 {
        return Err(SwapError::Assembly(format!(
            "expected at most 2 compute budget instructions, found {}",
            prefix
        )));
    }
    if let Some(idx) = instructions.iter().skip(prefix).position(is_budget) {
        return Err(SwapError::Assembly(format!(
            "compute budget instruction at position {} after program instructions",
            idx + prefix
        )));
    }
    if prefix == instructions.len() {
        return Err(SwapError::Assembly(
            "no program instructions after compute budget".to_string(),
        ));
    }

    let last = instructions.len() - 1;
    if let Some(idx) = instructions[..last].iter().position(is_tip_instruction) {
        return Err(SwapError::Assembly(format!(
            "tip transfer at position {} is not the last instruction",
            idx
        )));
    }

    Ok(())
}

#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_ix_order(_instructions: &[Instruction]) -> Result<(), SwapError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx_builder::bundle::tip_instruction;
    use crate::types::AccountPayload;

    fn payload(program: &Pubkey, accounts: Vec<AccountPayload>, data: &[u8]) -> InstructionPayload {
        InstructionPayload {
            program_id: program.to_string(),
            accounts,
            data: BASE64.encode(data),
        }
    }

    fn meta(pubkey: &Pubkey, is_signer: bool, is_writable: bool) -> AccountPayload {
        AccountPayload {
            pubkey: pubkey.to_string(),
            is_signer,
            is_writable,
        }
    }

    fn program_ix() -> Instruction {
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[1, 2, 3],
            vec![AccountMeta::new(Pubkey::new_unique(), false)],
        )
    }

    #[test]
    fn test_decode_instruction() {
        let payer = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let p = payload(
            &program,
            vec![meta(&payer, true, true), meta(&other, false, false)],
            &[9, 8, 7],
        );

        let ix = decode_instruction(&p, &payer).expect("decodes");
        assert_eq!(ix.program_id, program);
        assert_eq!(ix.data, vec![9, 8, 7]);
        assert_eq!(ix.accounts[0], AccountMeta::new(payer, true));
        assert_eq!(ix.accounts[1], AccountMeta::new_readonly(other, false));
    }

    #[test]
    fn test_decode_rejects_foreign_signer() {
        let payer = Pubkey::new_unique();
        let stranger = Pubkey::new_unique();
        let p = payload(&Pubkey::new_unique(), vec![meta(&stranger, true, false)], &[1]);

        let err = decode_instruction(&p, &payer).unwrap_err();
        assert!(matches!(err, SwapError::InstructionDecode { .. }));
        assert!(err.to_string().contains("non-payer"));
    }

    #[test]
    fn test_decode_rejects_bad_encoding() {
        let payer = Pubkey::new_unique();

        let mut p = payload(&Pubkey::new_unique(), vec![], &[1]);
        p.data = "not base64!".to_string();
        assert!(decode_instruction(&p, &payer).is_err());

        let mut p = payload(&Pubkey::new_unique(), vec![], &[1]);
        p.program_id = "xyz".to_string();
        assert!(decode_instruction(&p, &payer).is_err());

        let p = payload(
            &Pubkey::new_unique(),
            vec![],
            &vec![0u8; MAX_INSTRUCTION_DATA_LEN + 1],
        );
        assert!(decode_instruction(&p, &payer).is_err());
    }

    #[test]
    fn test_body_order_with_cleanup_and_tip() {
        let payer = Pubkey::new_unique();
        let setup = program_ix();
        let swap = program_ix();
        let cleanup = program_ix();
        let tip = tip_instruction(&payer, 10_000);

        let decoded = DecodedSwap {
            setup: vec![setup.clone()],
            swap: swap.clone(),
            cleanup: Some(cleanup.clone()),
            tip: None,
        }
        .with_tip(tip.clone());

        let body = decoded.body();
        assert_eq!(body.len(), 4);
        assert_eq!(body[0], setup);
        assert_eq!(body[1], swap);
        assert_eq!(body[2], cleanup);
        assert_eq!(Some(&body[3]), tip.as_ref());
    }

    #[test]
    fn test_plan_prefixes_compute_budget() {
        let payer = Pubkey::new_unique();
        let body = vec![program_ix(), tip_instruction(&payer, 1).unwrap()];

        let plan = plan_swap_instructions(200_000, 10_000, body).expect("plans");
        assert!(plan.has_tip);
        assert_eq!(plan.instructions.len(), 4);
        assert_eq!(plan.instructions[0], ComputeBudgetInstruction::set_compute_unit_limit(200_000));
        assert_eq!(plan.instructions[1], ComputeBudgetInstruction::set_compute_unit_price(10_000));
        assert!(sanity_check_ix_order(&plan.instructions).is_ok());
    }

    #[test]
    fn test_plan_skips_zero_budget_values() {
        let plan = plan_swap_instructions(0, 0, vec![program_ix()]).expect("plans");
        assert_eq!(plan.instructions.len(), 1);
        assert!(!plan.has_tip);
        assert!(plan_swap_instructions(1, 1, vec![]).is_err());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_rejects_misplaced_budget() {
        let instructions = vec![
            program_ix(),
            ComputeBudgetInstruction::set_compute_unit_limit(200_000),
        ];
        assert!(sanity_check_ix_order(&instructions).is_err());
        assert!(sanity_check_ix_order(&[]).is_err());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_sanity_check_rejects_early_tip() {
        let payer = Pubkey::new_unique();
        let instructions = vec![
            ComputeBudgetInstruction::set_compute_unit_limit(200_000),
            tip_instruction(&payer, 10_000).unwrap(),
            program_ix(),
        ];
        let err = sanity_check_ix_order(&instructions).unwrap_err();
        assert!(err.to_string().contains("tip transfer"));
    }
}
