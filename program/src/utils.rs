// Autoraffle - Utility Functions
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::constants::{LAMPORTS_PER_SOL, RAFFLE_SEED, VAULT_SEED};

/// Maps a random value onto an entry index; `None` when nobody entered.
pub fn winner_index(random: u128, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    Some((random % count as u128) as usize)
}

/// Find the program derived address of the raffle created by `creator`
pub fn find_raffle_address(program_id: &Pubkey, creator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED, creator.as_ref()], program_id)
}

/// Find the program derived address of the vault holding a raffle's pool
pub fn find_vault_address(program_id: &Pubkey, raffle: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, raffle.as_ref()], program_id)
}

/// Recreate the vault address from its stored bump
pub fn vault_address(program_id: &Pubkey, raffle: &Pubkey, bump: u8) -> Result<Pubkey, ProgramError> {
    Pubkey::create_program_address(&[VAULT_SEED, raffle.as_ref(), &[bump]], program_id)
        .map_err(|_| ProgramError::InvalidSeeds)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_index_is_plain_modulo() {
        assert_eq!(winner_index(17, 4), Some(1));
        assert_eq!(winner_index(3, 4), Some(3));
        assert_eq!(winner_index(u128::MAX, 1), Some(0));
    }

    #[test]
    fn winner_index_needs_players() {
        assert_eq!(winner_index(5, 0), None);
    }

    #[test]
    fn vault_address_matches_derived_pda() {
        let program_id = Pubkey::new_unique();
        let (raffle, _) = find_raffle_address(&program_id, &Pubkey::new_unique());
        let (vault, bump) = find_vault_address(&program_id, &raffle);
        assert_eq!(vault_address(&program_id, &raffle, bump).unwrap(), vault);
    }

    #[test]
    fn converts_lamports_for_display() {
        assert_eq!(lamports_to_sol(100_000_000), 0.1);
    }
}
