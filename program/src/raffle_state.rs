use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::{
    constants::MAX_PLAYERS,
    events::RaffleEvent,
    raffle_error::RaffleError,
    utils,
    vault::Treasury,
    vrf::{RandomnessCoordinator, VrfSettings},
};

/// Round gate
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Entry closed, waiting for the oracle
    Calculating,
}

/// Parameters fixed when the raffle is created
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum payment in lamports to take one slot
    pub entrance_fee: u64,
    /// Seconds a round stays open before it may close
    pub interval: i64,
    /// Program that issues randomness request ids
    pub coordinator: Pubkey,
    /// Only signer accepted on fulfilment
    pub oracle_authority: Pubkey,
    pub vrf: VrfSettings,
}

impl RaffleConfig {
    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entrance_fee == 0 || self.interval <= 0 || self.vrf.num_words == 0 {
            return Err(RaffleError::InvalidConfig);
        }
        Ok(())
    }
}

/// Why a round may or may not close. Every flag must hold for upkeep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepStatus {
    pub fn needed(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    is_initialized: bool,
    /// Creator of the raffle; holds no privileges over a running round
    authority: Pubkey,
    state: RaffleState,
    entrance_fee: u64,
    interval: i64,
    last_round_start: UnixTimestamp,
    players: Vec<Pubkey>,
    pending_request_id: Option<u64>,
    request_started_at: UnixTimestamp,
    recent_winner: Option<Pubkey>,
    coordinator: Pubkey,
    oracle_authority: Pubkey,
    vrf: VrfSettings,
    /// Settled rounds so far
    round: u64,
    vault_bump: u8,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Account size with a full player list
    pub const LEN: usize = 1
        + 32
        + 1
        + 8
        + 8
        + 8
        + (4 + 32 * MAX_PLAYERS)
        + (1 + 8)
        + 8
        + (1 + 32)
        + 32
        + 32
        + VrfSettings::LEN
        + 8
        + 1;

    pub fn new(
        authority: Pubkey,
        config: &RaffleConfig,
        vault_bump: u8,
        now: UnixTimestamp,
    ) -> Result<Self, RaffleError> {
        config.validate()?;
        Ok(Self {
            is_initialized: true,
            authority,
            state: RaffleState::Open,
            entrance_fee: config.entrance_fee,
            interval: config.interval,
            last_round_start: now,
            players: Vec::new(),
            pending_request_id: None,
            request_started_at: 0,
            recent_winner: None,
            coordinator: config.coordinator,
            oracle_authority: config.oracle_authority,
            vrf: config.vrf.clone(),
            round: 0,
            vault_bump,
        })
    }

    /// Decodes account data; bytes past the encoded player list are ignored.
    pub fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let mut buf = data;
        Self::deserialize(&mut buf).map_err(|_| ProgramError::InvalidAccountData)
    }

    pub fn save(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        let mut buf = dst;
        self.serialize(&mut buf)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    pub fn authority(&self) -> &Pubkey {
        &self.authority
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn raffle_state(&self) -> RaffleState {
        self.state
    }

    pub fn last_round_start(&self) -> UnixTimestamp {
        self.last_round_start
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    pub fn player_at(&self, index: usize) -> Result<Pubkey, RaffleError> {
        self.players
            .get(index)
            .copied()
            .ok_or(RaffleError::IndexOutOfRange)
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request_id
    }

    pub fn request_started_at(&self) -> UnixTimestamp {
        self.request_started_at
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn coordinator(&self) -> &Pubkey {
        &self.coordinator
    }

    pub fn oracle_authority(&self) -> &Pubkey {
        &self.oracle_authority
    }

    pub fn vrf_settings(&self) -> &VrfSettings {
        &self.vrf
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn vault_bump(&self) -> u8 {
        self.vault_bump
    }

    /// Takes one slot in the current round for `player`.
    pub fn enter<T: Treasury>(
        &mut self,
        player: Pubkey,
        amount: u64,
        treasury: &mut T,
    ) -> Result<RaffleEvent, RaffleError> {
        if amount < self.entrance_fee {
            return Err(RaffleError::InsufficientFee);
        }
        if self.state != RaffleState::Open {
            return Err(RaffleError::NotOpen);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RaffleError::RaffleFull);
        }

        treasury.collect(&player, amount)?;
        self.players.push(player);

        Ok(RaffleEvent::Entered { player })
    }

    pub fn has_elapsed(&self, now: UnixTimestamp) -> bool {
        now.saturating_sub(self.last_round_start) >= self.interval
    }

    /// Read-only close-round predicate; `pool_balance` is what the vault holds.
    pub fn check_upkeep(&self, now: UnixTimestamp, pool_balance: u64) -> UpkeepStatus {
        UpkeepStatus {
            is_open: self.state == RaffleState::Open,
            time_passed: self.has_elapsed(now),
            has_players: !self.players.is_empty(),
            has_balance: pool_balance > 0,
        }
    }

    /// Closes the round and requests randomness. Re-evaluates the predicate
    /// itself regardless of what the caller saw.
    pub fn perform_upkeep<C: RandomnessCoordinator>(
        &mut self,
        now: UnixTimestamp,
        pool_balance: u64,
        coordinator: &mut C,
    ) -> Result<RaffleEvent, RaffleError> {
        let status = self.check_upkeep(now, pool_balance);
        if !status.needed() {
            msg!(
                "Upkeep not needed: balance={}, players={}, state={:?}",
                pool_balance,
                self.players.len(),
                self.state
            );
            return Err(RaffleError::UpkeepNotNeeded);
        }
        self.request_randomness(now, coordinator)
    }

    pub(crate) fn request_randomness<C: RandomnessCoordinator>(
        &mut self,
        now: UnixTimestamp,
        coordinator: &mut C,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.pending_request_id.is_some() {
            return Err(RaffleError::AlreadyOpenRequest);
        }

        let request_id = coordinator.request(&self.vrf)?;
        self.pending_request_id = Some(request_id);
        self.request_started_at = now;
        self.state = RaffleState::Calculating;

        Ok(RaffleEvent::RandomnessRequested { request_id })
    }

    /// Replaces a request the oracle has left unanswered for a full interval.
    /// A late answer to the old id is then rejected as unknown.
    pub fn reissue_request<C: RandomnessCoordinator>(
        &mut self,
        now: UnixTimestamp,
        coordinator: &mut C,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.state != RaffleState::Calculating || self.pending_request_id.is_none() {
            return Err(RaffleError::UnknownRequest);
        }
        if now.saturating_sub(self.request_started_at) < self.interval {
            return Err(RaffleError::RequestNotStale);
        }

        let request_id = coordinator.request(&self.vrf)?;
        msg!(
            "Replacing request {:?} with {}",
            self.pending_request_id,
            request_id
        );
        self.pending_request_id = Some(request_id);
        self.request_started_at = now;

        Ok(RaffleEvent::RandomnessRequested { request_id })
    }

    /// Oracle callback. Accepts only the pending id; anything else, including
    /// a replay of an id already consumed, is an unknown request. Either the
    /// round settles completely or the raffle is left exactly as it was.
    pub fn fulfill_random_words<T: Treasury>(
        &mut self,
        request_id: u64,
        random_words: &[u128],
        now: UnixTimestamp,
        treasury: &mut T,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.state != RaffleState::Calculating || self.pending_request_id != Some(request_id) {
            return Err(RaffleError::UnknownRequest);
        }
        let random = *random_words.first().ok_or(RaffleError::MissingRandomWords)?;

        let snapshot = self.clone();
        self.pending_request_id = None;
        match self.settle(random, now, treasury) {
            Ok(event) => Ok(event),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    // Bookkeeping is committed before the payout runs.
    fn settle<T: Treasury>(
        &mut self,
        random: u128,
        now: UnixTimestamp,
        treasury: &mut T,
    ) -> Result<RaffleEvent, RaffleError> {
        let index = utils::winner_index(random, self.players.len()).ok_or(RaffleError::NoPlayers)?;
        let winner = self.players[index];
        let prize = treasury.balance();

        self.players.clear();
        self.last_round_start = now;
        self.state = RaffleState::Open;
        self.recent_winner = Some(winner);
        self.round = self.round.saturating_add(1);

        treasury.pay(self, &winner, prize)?;

        msg!(
            "Round {} settled: winner index {} paid {} SOL",
            self.round,
            index,
            utils::lamports_to_sol(prize)
        );
        Ok(RaffleEvent::WinnerPicked { winner })
    }
}
