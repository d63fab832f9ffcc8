use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::IsInitialized,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use crate::{
    constants::RAFFLE_SEED,
    raffle_error::RaffleError,
    raffle_instruction::RaffleInstruction,
    raffle_state::{Raffle, RaffleConfig},
    utils::{self, find_raffle_address, find_vault_address},
    vault::VaultTreasury,
    vrf::CpiCoordinator,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::Initialize { config } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, config, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, check_data, program_id)
            }
            RaffleInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, perform_data, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
            RaffleInstruction::ReissueRequest {} => {
                msg!("Instruction: Reissue Request");
                Self::process_reissue_request(accounts, program_id)
            }
        }
    }

    /// Creates the raffle PDA and writes its initial, open state
    fn process_initialize(
        accounts: &[AccountInfo],
        config: RaffleConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let creator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !creator_info.is_signer {
            msg!("Creator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_raffle, raffle_bump) = find_raffle_address(program_id, creator_info.key);
        if *raffle_info.key != expected_raffle {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidArgument);
        }
        let (expected_vault, vault_bump) = find_vault_address(program_id, raffle_info.key);
        if *vault_info.key != expected_vault {
            msg!("Invalid vault account address");
            return Err(ProgramError::InvalidArgument);
        }
        if raffle_info.owner == program_id {
            msg!("Raffle account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        // The first entry creates the vault, so one fee must cover its rent.
        let rent = Rent::get()?;
        if config.entrance_fee < rent.minimum_balance(0) {
            msg!(
                "Entrance fee must be at least {} lamports",
                rent.minimum_balance(0)
            );
            return Err(RaffleError::InvalidConfig.reject());
        }

        let clock = Clock::get()?;
        let raffle = Raffle::new(*creator_info.key, &config, vault_bump, clock.unix_timestamp)
            .map_err(RaffleError::reject)?;

        invoke_signed(
            &system_instruction::create_account(
                creator_info.key,
                raffle_info.key,
                rent.minimum_balance(Raffle::LEN),
                Raffle::LEN as u64,
                program_id,
            ),
            &[
                creator_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
            &[&[RAFFLE_SEED, creator_info.key.as_ref(), &[raffle_bump]]],
        )?;

        raffle.save(&mut raffle_info.try_borrow_mut_data()?)?;

        msg!(
            "Raffle initialized: Fee={} lamports, Interval={}s, Coordinator={}",
            config.entrance_fee,
            config.interval,
            config.coordinator
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let entrant_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !entrant_info.is_signer {
            msg!("Entrant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_system_program(system_program_info)?;

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        Self::check_vault(&raffle, raffle_info, vault_info, program_id)?;

        let mut treasury = VaultTreasury::new(
            raffle_info.key,
            vault_info,
            raffle.vault_bump(),
            system_program_info,
            std::slice::from_ref(entrant_info),
        );
        let event = raffle
            .enter(*entrant_info.key, amount, &mut treasury)
            .map_err(RaffleError::reject)?;

        raffle.save(&mut raffle_info.try_borrow_mut_data()?)?;
        event.emit();
        msg!(
            "Players: {}, pool: {} lamports",
            raffle.number_of_players(),
            vault_info.lamports()
        );
        Ok(())
    }

    /// Sets return data to the Borsh encoding of `(needed, perform_data)`
    fn process_check_upkeep(
        accounts: &[AccountInfo],
        check_data: Vec<u8>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(raffle_info, program_id)?;
        Self::check_vault(&raffle, raffle_info, vault_info, program_id)?;

        let clock = Clock::get()?;
        let status = raffle.check_upkeep(clock.unix_timestamp, vault_info.lamports());
        msg!("Upkeep status: {:?}", status);

        let data = (status.needed(), check_data).try_to_vec()?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(
        accounts: &[AccountInfo],
        _perform_data: Vec<u8>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let coordinator_accounts = account_info_iter.as_slice();

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        Self::check_vault(&raffle, raffle_info, vault_info, program_id)?;
        Self::check_coordinator(&raffle, coordinator_info)?;

        let clock = Clock::get()?;
        let mut coordinator = CpiCoordinator::new(coordinator_info, raffle_info, coordinator_accounts);
        let event = raffle
            .perform_upkeep(clock.unix_timestamp, vault_info.lamports(), &mut coordinator)
            .map_err(RaffleError::reject)?;

        raffle.save(&mut raffle_info.try_borrow_mut_data()?)?;
        event.emit();
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[u128],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;
        let candidates = account_info_iter.as_slice();

        Self::check_system_program(system_program_info)?;
        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        Self::check_vault(&raffle, raffle_info, vault_info, program_id)?;

        if !oracle_info.is_signer || oracle_info.key != raffle.oracle_authority() {
            msg!("Fulfilment must be signed by {}", raffle.oracle_authority());
            return Err(RaffleError::UnauthorizedOracle.reject());
        }

        let prize = vault_info.lamports();
        let clock = Clock::get()?;
        let mut treasury = VaultTreasury::new(
            raffle_info.key,
            vault_info,
            raffle.vault_bump(),
            system_program_info,
            candidates,
        );
        let event = raffle
            .fulfill_random_words(request_id, random_words, clock.unix_timestamp, &mut treasury)
            .map_err(RaffleError::reject)?;

        raffle.save(&mut raffle_info.try_borrow_mut_data()?)?;
        event.emit();
        msg!("Paid {} SOL", utils::lamports_to_sol(prize));
        Ok(())
    }

    fn process_reissue_request(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let coordinator_accounts = account_info_iter.as_slice();

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        Self::check_coordinator(&raffle, coordinator_info)?;

        let clock = Clock::get()?;
        let mut coordinator = CpiCoordinator::new(coordinator_info, raffle_info, coordinator_accounts);
        let event = raffle
            .reissue_request(clock.unix_timestamp, &mut coordinator)
            .map_err(RaffleError::reject)?;

        raffle.save(&mut raffle_info.try_borrow_mut_data()?)?;
        event.emit();
        Ok(())
    }

    fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let raffle = Raffle::load(&raffle_info.try_borrow_data()?)?;
        if !raffle.is_initialized() {
            msg!("Raffle account is not initialized");
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(raffle)
    }

    fn check_vault(
        raffle: &Raffle,
        raffle_info: &AccountInfo,
        vault_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let expected = utils::vault_address(program_id, raffle_info.key, raffle.vault_bump())?;
        if *vault_info.key != expected {
            msg!("Vault account does not belong to this raffle");
            return Err(ProgramError::InvalidArgument);
        }
        Ok(())
    }

    fn check_coordinator(raffle: &Raffle, coordinator_info: &AccountInfo) -> ProgramResult {
        if coordinator_info.key != raffle.coordinator() || !coordinator_info.executable {
            msg!("Coordinator program does not match {}", raffle.coordinator());
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }

    fn check_system_program(system_program_info: &AccountInfo) -> ProgramResult {
        if *system_program_info.key != system_program::id() {
            msg!("Expected the system program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }
}
