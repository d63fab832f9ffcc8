use solana_program::{decode_error::DecodeError, msg, program_error::ProgramError};
use thiserror::Error;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Payment is below the entrance fee
    #[error("Not enough lamports to enter the raffle")]
    InsufficientFee,

    /// Raffle is calculating a winner
    #[error("Raffle is not open")]
    NotOpen,

    /// Close-round trigger fired while the round may not close
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfilment does not match the pending randomness request
    #[error("Unknown randomness request")]
    UnknownRequest,

    /// Payout to the winner failed; settlement was rolled back
    #[error("Transfer to winner failed")]
    TransferFailed,

    /// No player at the requested index
    #[error("Player index out of range")]
    IndexOutOfRange,

    /// A randomness request is already outstanding
    #[error("A randomness request is already pending")]
    AlreadyOpenRequest,

    /// Round reached the account's player capacity
    #[error("Raffle is full")]
    RaffleFull,

    /// Oracle delivered no random words
    #[error("Fulfilment carried no random words")]
    MissingRandomWords,

    /// Settlement attempted with an empty ledger
    #[error("No players in the current round")]
    NoPlayers,

    /// Fulfilment not signed by the configured oracle authority
    #[error("Only the oracle authority can fulfil randomness")]
    UnauthorizedOracle,

    /// Initialize parameters rejected
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// Pending request has not been outstanding long enough to replace
    #[error("Pending request is not stale yet")]
    RequestNotStale,

    /// Coordinator did not hand back a request id
    #[error("Coordinator returned no request id")]
    InvalidCoordinatorResponse,
}

impl RaffleError {
    /// Logs the error and converts it for the runtime
    pub fn reject(self) -> ProgramError {
        msg!("Raffle error: {}", self);
        self.into()
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_stable_custom_codes() {
        assert_eq!(
            ProgramError::from(RaffleError::InsufficientFee),
            ProgramError::Custom(0)
        );
        assert_eq!(
            ProgramError::from(RaffleError::IndexOutOfRange),
            ProgramError::Custom(5)
        );
        assert_eq!(RaffleError::reject(RaffleError::NotOpen), ProgramError::Custom(1));
    }

    #[test]
    fn decode_error_names_the_program() {
        assert_eq!(<RaffleError as DecodeError<RaffleError>>::type_of(), "Raffle Error");
    }
}
