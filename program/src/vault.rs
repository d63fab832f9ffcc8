// Lamport vault holding the prize pool
use solana_program::{
    account_info::AccountInfo, msg, program::invoke, program::invoke_signed, pubkey::Pubkey,
    system_instruction,
};

use crate::{constants::VAULT_SEED, raffle_error::RaffleError, raffle_state::Raffle};

/// Custody of the pool. The balance is whatever the custody actually holds;
/// the raffle keeps no separate counter.
pub trait Treasury {
    fn balance(&self) -> u64;

    /// Moves an entrance payment from `from` into custody
    fn collect(&mut self, from: &Pubkey, amount: u64) -> Result<(), RaffleError>;

    /// Pays `amount` out to `to`. `raffle` is already settled when this runs,
    /// so a payout that calls back into it sees an open, empty round.
    fn pay(&mut self, raffle: &mut Raffle, to: &Pubkey, amount: u64) -> Result<(), RaffleError>;
}

/// System-owned PDA at `["vault", raffle]`, moved with system transfers
pub struct VaultTreasury<'a, 'info> {
    raffle_key: &'a Pubkey,
    vault: &'a AccountInfo<'info>,
    vault_bump: u8,
    system_program: &'a AccountInfo<'info>,
    /// Entrants on `collect`, winner candidates on `pay`
    counterparties: &'a [AccountInfo<'info>],
}

impl<'a, 'info> VaultTreasury<'a, 'info> {
    pub fn new(
        raffle_key: &'a Pubkey,
        vault: &'a AccountInfo<'info>,
        vault_bump: u8,
        system_program: &'a AccountInfo<'info>,
        counterparties: &'a [AccountInfo<'info>],
    ) -> Self {
        Self {
            raffle_key,
            vault,
            vault_bump,
            system_program,
            counterparties,
        }
    }

    fn counterparty(&self, key: &Pubkey) -> Result<&'a AccountInfo<'info>, RaffleError> {
        self.counterparties
            .iter()
            .find(|acc| acc.key == key)
            .ok_or_else(|| {
                msg!("Account {} was not supplied to the instruction", key);
                RaffleError::TransferFailed
            })
    }
}

impl<'a, 'info> Treasury for VaultTreasury<'a, 'info> {
    fn balance(&self) -> u64 {
        self.vault.lamports()
    }

    fn collect(&mut self, from: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        let payer = self.counterparty(from)?;
        invoke(
            &system_instruction::transfer(payer.key, self.vault.key, amount),
            &[payer.clone(), self.vault.clone(), self.system_program.clone()],
        )
        .map_err(|err| {
            msg!("Entrance transfer failed: {}", err);
            RaffleError::TransferFailed
        })
    }

    fn pay(&mut self, _raffle: &mut Raffle, to: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        let recipient = self.counterparty(to)?;
        if !recipient.is_writable {
            msg!("Winner account {} is not writable", to);
            return Err(RaffleError::TransferFailed);
        }
        invoke_signed(
            &system_instruction::transfer(self.vault.key, recipient.key, amount),
            &[self.vault.clone(), recipient.clone(), self.system_program.clone()],
            &[&[VAULT_SEED, self.raffle_key.as_ref(), &[self.vault_bump]]],
        )
        .map_err(|err| {
            msg!("Prize transfer failed: {}", err);
            RaffleError::TransferFailed
        })
    }
}
