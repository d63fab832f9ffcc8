use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    raffle_state::RaffleConfig,
    utils::{find_raffle_address, find_vault_address},
};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create a raffle with a fixed entrance fee and round interval
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The creator, pays for the raffle account
    /// 1. `[writable]` The raffle account (PDA of `["raffle", creator]`)
    /// 2. `[]` The vault (PDA of `["vault", raffle]`)
    /// 3. `[]` The system program
    Initialize { config: RaffleConfig },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The entrant (pays `amount`)
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The vault
    /// 3. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Read-only: report through return data whether the round may close
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    /// 1. `[]` The vault
    CheckUpkeep { check_data: Vec<u8> },

    /// Close the round and request randomness (anyone may call)
    ///
    /// Accounts expected:
    /// 0. `[writable]` The raffle account
    /// 1. `[]` The vault
    /// 2. `[]` The coordinator program
    /// Remaining accounts are forwarded to the coordinator
    PerformUpkeep { perform_data: Vec<u8> },

    /// Oracle callback settling the round
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle authority
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The vault
    /// 3. `[]` The system program
    /// Remaining accounts: `[writable]` winner candidates
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<u128>,
    },

    /// Replace a request left unanswered for a full interval (anyone may call)
    ///
    /// Accounts expected:
    /// 0. `[writable]` The raffle account
    /// 1. `[]` The coordinator program
    /// Remaining accounts are forwarded to the coordinator
    ReissueRequest {},
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec()
            .map_err(|_| ProgramError::InvalidInstructionData)
    }
}

/// Create initialize instruction; the raffle and vault addresses are derived from `creator`
pub fn initialize(
    program_id: &Pubkey,
    creator: &Pubkey,
    config: RaffleConfig,
) -> Result<Instruction, ProgramError> {
    let (raffle, _) = find_raffle_address(program_id, creator);
    let (vault, _) = find_vault_address(program_id, &raffle);
    let data = RaffleInstruction::Initialize { config }.pack()?;

    let accounts = vec![
        AccountMeta::new(*creator, true),
        AccountMeta::new(raffle, false),
        AccountMeta::new_readonly(vault, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    entrant: &Pubkey,
    raffle: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let (vault, _) = find_vault_address(program_id, raffle);
    let data = RaffleInstruction::EnterRaffle { amount }.pack()?;

    let accounts = vec![
        AccountMeta::new(*entrant, true),
        AccountMeta::new(*raffle, false),
        AccountMeta::new(vault, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(
    program_id: &Pubkey,
    raffle: &Pubkey,
    check_data: Vec<u8>,
) -> Result<Instruction, ProgramError> {
    let (vault, _) = find_vault_address(program_id, raffle);
    let data = RaffleInstruction::CheckUpkeep { check_data }.pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(*raffle, false),
        AccountMeta::new_readonly(vault, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    raffle: &Pubkey,
    coordinator_program: &Pubkey,
    coordinator_accounts: &[AccountMeta],
    perform_data: Vec<u8>,
) -> Result<Instruction, ProgramError> {
    let (vault, _) = find_vault_address(program_id, raffle);
    let data = RaffleInstruction::PerformUpkeep { perform_data }.pack()?;

    let mut accounts = vec![
        AccountMeta::new(*raffle, false),
        AccountMeta::new_readonly(vault, false),
        AccountMeta::new_readonly(*coordinator_program, false),
    ];
    accounts.extend_from_slice(coordinator_accounts);

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction. `candidates` must contain the
/// winner the random words select; passing every player always satisfies it.
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    raffle: &Pubkey,
    request_id: u64,
    random_words: Vec<u128>,
    candidates: &[Pubkey],
) -> Result<Instruction, ProgramError> {
    let (vault, _) = find_vault_address(program_id, raffle);
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack()?;

    let mut accounts = vec![
        AccountMeta::new_readonly(*oracle_authority, true),
        AccountMeta::new(*raffle, false),
        AccountMeta::new(vault, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    let mut seen: Vec<&Pubkey> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !seen.contains(&candidate) {
            seen.push(candidate);
            accounts.push(AccountMeta::new(*candidate, false));
        }
    }

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create reissue_request instruction
pub fn reissue_request(
    program_id: &Pubkey,
    raffle: &Pubkey,
    coordinator_program: &Pubkey,
    coordinator_accounts: &[AccountMeta],
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::ReissueRequest {}.pack()?;

    let mut accounts = vec![
        AccountMeta::new(*raffle, false),
        AccountMeta::new_readonly(*coordinator_program, false),
    ];
    accounts.extend_from_slice(coordinator_accounts);

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_rejects_garbage() {
        assert_eq!(
            RaffleInstruction::unpack(&[42]),
            Err(ProgramError::InvalidInstructionData)
        );
        assert_eq!(
            RaffleInstruction::unpack(&[]),
            Err(ProgramError::InvalidInstructionData)
        );
    }

    #[test]
    fn enter_raffle_targets_the_derived_vault() {
        let program_id = Pubkey::new_unique();
        let entrant = Pubkey::new_unique();
        let (raffle, _) = find_raffle_address(&program_id, &entrant);
        let ix = enter_raffle(&program_id, &entrant, &raffle, 5).unwrap();

        let (vault, _) = find_vault_address(&program_id, &raffle);
        assert_eq!(ix.accounts[2].pubkey, vault);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(
            RaffleInstruction::unpack(&ix.data).unwrap(),
            RaffleInstruction::EnterRaffle { amount: 5 }
        );
    }

    #[test]
    fn fulfil_lists_each_candidate_once() {
        let program_id = Pubkey::new_unique();
        let oracle = Pubkey::new_unique();
        let raffle = Pubkey::new_unique();
        let player = Pubkey::new_unique();
        let other = Pubkey::new_unique();

        let ix = fulfill_random_words(
            &program_id,
            &oracle,
            &raffle,
            9,
            vec![17],
            &[player, other, player],
        )
        .unwrap();

        assert_eq!(ix.accounts.len(), 6);
        assert!(ix.accounts[0].is_signer);
        assert!(ix.accounts[4].is_writable && ix.accounts[5].is_writable);
    }
}
