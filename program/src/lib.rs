// Autoraffle
// A self-running raffle: fixed-fee entries, an upkeep trigger that closes the
// round, and an oracle callback that picks and pays the winner

pub mod constants;
pub mod events;
pub mod raffle_entrypoint;
pub mod raffle_error;
pub mod raffle_instruction;
pub mod raffle_processor;
pub mod raffle_state;
pub mod utils;
pub mod vault;
pub mod vrf;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    raffle_processor::Processor::process(program_id, accounts, instruction_data)
}
