// Autoraffle - Events
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

/// Observable raffle events, written to the transaction log as Borsh data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A player bought a slot in the current round
    Entered { player: Pubkey },
    /// The round closed and randomness was requested
    RandomnessRequested { request_id: u64 },
    /// The round settled and the pool went to `winner`
    WinnerPicked { winner: Pubkey },
}

impl RaffleEvent {
    pub fn emit(&self) {
        match self {
            RaffleEvent::Entered { player } => msg!("Entered: {}", player),
            RaffleEvent::RandomnessRequested { request_id } => {
                msg!("RandomnessRequested: {}", request_id)
            }
            RaffleEvent::WinnerPicked { winner } => msg!("WinnerPicked: {}", winner),
        }
        if let Ok(data) = self.try_to_vec() {
            sol_log_data(&[&data]);
        }
    }
}
