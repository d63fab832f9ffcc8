// Randomness coordinator integration for the raffle program
use arrayref::array_ref;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke},
    pubkey::Pubkey,
};

use crate::{
    constants::{DEFAULT_CALLBACK_COMPUTE_LIMIT, DEFAULT_NUM_WORDS, DEFAULT_REQUEST_CONFIRMATIONS},
    raffle_error::RaffleError,
};

/// Parameters forwarded to the coordinator with every request
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VrfSettings {
    /// Oracle lane identifier (selects the proving key and price tier)
    pub key_hash: [u8; 32],
    /// Billing subscription at the coordinator
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_compute_limit: u32,
    pub num_words: u32,
}

impl VrfSettings {
    pub const LEN: usize = 32 + 8 + 2 + 4 + 4;
}

impl Default for VrfSettings {
    fn default() -> Self {
        Self {
            key_hash: [0u8; 32],
            subscription_id: 0,
            request_confirmations: DEFAULT_REQUEST_CONFIRMATIONS,
            callback_compute_limit: DEFAULT_CALLBACK_COMPUTE_LIMIT,
            num_words: DEFAULT_NUM_WORDS,
        }
    }
}

/// Instruction data sent to the coordinator program
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct CoordinatorRequest {
    /// Raffle account that will receive the fulfilment
    pub consumer: Pubkey,
    pub settings: VrfSettings,
}

/// Source of randomness request ids.
///
/// `request` is the synchronous half of the request/fulfil protocol: it
/// returns an opaque id, and the oracle later answers with that id.
pub trait RandomnessCoordinator {
    fn request(&mut self, settings: &VrfSettings) -> Result<u64, RaffleError>;
}

/// Coordinator reached through a cross-program invocation. The callee
/// answers with the request id as little-endian `u64` return data.
pub struct CpiCoordinator<'a, 'info> {
    program: &'a AccountInfo<'info>,
    consumer: &'a AccountInfo<'info>,
    extra_accounts: &'a [AccountInfo<'info>],
}

impl<'a, 'info> CpiCoordinator<'a, 'info> {
    pub fn new(
        program: &'a AccountInfo<'info>,
        consumer: &'a AccountInfo<'info>,
        extra_accounts: &'a [AccountInfo<'info>],
    ) -> Self {
        Self {
            program,
            consumer,
            extra_accounts,
        }
    }
}

impl<'a, 'info> RandomnessCoordinator for CpiCoordinator<'a, 'info> {
    fn request(&mut self, settings: &VrfSettings) -> Result<u64, RaffleError> {
        let data = CoordinatorRequest {
            consumer: *self.consumer.key,
            settings: settings.clone(),
        }
        .try_to_vec()
        .map_err(|_| RaffleError::InvalidCoordinatorResponse)?;

        let mut metas = vec![AccountMeta::new_readonly(*self.consumer.key, false)];
        metas.extend(self.extra_accounts.iter().map(|acc| AccountMeta {
            pubkey: *acc.key,
            is_signer: acc.is_signer,
            is_writable: acc.is_writable,
        }));

        let mut infos = Vec::with_capacity(self.extra_accounts.len() + 2);
        infos.push(self.consumer.clone());
        infos.extend_from_slice(self.extra_accounts);
        infos.push(self.program.clone());

        invoke(
            &Instruction {
                program_id: *self.program.key,
                accounts: metas,
                data,
            },
            &infos,
        )
        .map_err(|err| {
            msg!("Coordinator request failed: {}", err);
            RaffleError::InvalidCoordinatorResponse
        })?;

        decode_request_id(self.program.key, get_return_data())
    }
}

/// Extracts the request id from CPI return data, accepting it only when the
/// coordinator itself set it.
pub fn decode_request_id(
    coordinator: &Pubkey,
    return_data: Option<(Pubkey, Vec<u8>)>,
) -> Result<u64, RaffleError> {
    match return_data {
        Some((program_id, data)) if program_id == *coordinator && data.len() >= 8 => {
            Ok(u64::from_le_bytes(*array_ref![data, 0, 8]))
        }
        _ => {
            msg!("Coordinator {} set no request id", coordinator);
            Err(RaffleError::InvalidCoordinatorResponse)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_id_from_coordinator_return_data() {
        let coordinator = Pubkey::new_unique();
        let data = 42u64.to_le_bytes().to_vec();
        assert_eq!(decode_request_id(&coordinator, Some((coordinator, data))), Ok(42));
    }

    #[test]
    fn rejects_return_data_from_another_program() {
        let coordinator = Pubkey::new_unique();
        let data = 42u64.to_le_bytes().to_vec();
        assert_eq!(
            decode_request_id(&coordinator, Some((Pubkey::new_unique(), data))),
            Err(RaffleError::InvalidCoordinatorResponse)
        );
    }

    #[test]
    fn rejects_missing_or_short_return_data() {
        let coordinator = Pubkey::new_unique();
        assert_eq!(
            decode_request_id(&coordinator, None),
            Err(RaffleError::InvalidCoordinatorResponse)
        );
        assert_eq!(
            decode_request_id(&coordinator, Some((coordinator, vec![1, 2, 3]))),
            Err(RaffleError::InvalidCoordinatorResponse)
        );
    }

    #[test]
    fn default_settings_request_one_word() {
        let settings = VrfSettings::default();
        assert_eq!(settings.num_words, 1);
        assert_eq!(settings.try_to_vec().unwrap().len(), VrfSettings::LEN);
    }
}
