// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use linera_sdk::{
    linera_base_types::{AccountOwner, Amount, ApplicationId},
    views::{LogView, View, ViewError},
};
use raffle_abi::{
    Eligibility, GatewayConfig, RaffleStatus, RandomWord, RequestId, WinnerRecord,
};
use serde::{Deserialize, Serialize};

use crate::RaffleError;

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Issues randomness requests on behalf of [`RaffleCore::begin_draw`].
pub trait RandomnessGateway {
    /// Returns the identifier the gateway will echo back with the random word.
    fn request_randomness(&mut self, config: &GatewayConfig) -> Result<RequestId, String>;
}

/// Moves a prize out of the raffle's funds.
pub trait PrizeTransfer {
    fn transfer_prize(&mut self, winner: AccountOwner, amount: Amount) -> Result<(), String>;
}

/// Entries of the current round, in entry order and with duplicates.
#[allow(async_fn_in_trait)]
pub trait EntrantLog {
    fn append(&mut self, participant: AccountOwner);

    async fn entrant(&self, index: usize) -> Result<Option<AccountOwner>, String>;

    /// Drops every entry.
    fn reset(&mut self);
}

impl EntrantLog for LogView<AccountOwner> {
    fn append(&mut self, participant: AccountOwner) {
        self.push(participant);
    }

    async fn entrant(&self, index: usize) -> Result<Option<AccountOwner>, String> {
        self.get(index)
            .await
            .map_err(|e: ViewError| format!("Failed to read entrant {}: {:?}", index, e))
    }

    fn reset(&mut self) {
        self.clear();
    }
}

/// The raffle state machine.
///
/// The entrant list itself lives in an [`EntrantLog`] so that an entry only
/// appends to storage. Timestamps are in microseconds, as returned by the
/// system clock of the runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaffleCore {
    entrance_fee: Amount,
    interval_secs: u64,
    gateway: Option<ApplicationId>,
    gateway_config: GatewayConfig,
    status: RaffleStatus,
    entrant_count: u64,
    pot: Amount,
    last_draw_timestamp: u64,
    pending_request_id: Option<RequestId>,
    recent_winner: Option<AccountOwner>,
    round: u64,
    /// Selected draw whose prize transfer has not gone through yet
    pending_payout: Option<WinnerRecord>,
}

impl RaffleCore {
    pub fn new(
        entrance_fee: Amount,
        interval_secs: u64,
        gateway: ApplicationId,
        gateway_config: GatewayConfig,
        now: u64,
    ) -> Self {
        RaffleCore {
            entrance_fee,
            interval_secs,
            gateway: Some(gateway),
            gateway_config,
            last_draw_timestamp: now,
            ..RaffleCore::default()
        }
    }

    pub fn status(&self) -> RaffleStatus {
        self.status
    }

    pub fn entrance_fee(&self) -> Amount {
        self.entrance_fee
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// The only application allowed to deliver randomness.
    pub fn gateway(&self) -> Option<ApplicationId> {
        self.gateway
    }

    pub fn gateway_config(&self) -> &GatewayConfig {
        &self.gateway_config
    }

    pub fn entrant_count(&self) -> u64 {
        self.entrant_count
    }

    pub fn pot(&self) -> Amount {
        self.pot
    }

    pub fn last_draw_timestamp(&self) -> u64 {
        self.last_draw_timestamp
    }

    pub fn pending_request_id(&self) -> Option<RequestId> {
        self.pending_request_id
    }

    pub fn recent_winner(&self) -> Option<AccountOwner> {
        self.recent_winner
    }

    /// Number of draws completed so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn pending_payout(&self) -> Option<&WinnerRecord> {
        self.pending_payout.as_ref()
    }

    /// Records one entry for `participant`. Funds must already be held by the
    /// caller of this method.
    pub fn enter(
        &mut self,
        participant: AccountOwner,
        contribution: Amount,
        entrants: &mut impl EntrantLog,
    ) -> Result<(), RaffleError> {
        if contribution < self.entrance_fee {
            return Err(RaffleError::InsufficientContribution {
                contribution,
                entrance_fee: self.entrance_fee,
            });
        }
        if self.status != RaffleStatus::Open {
            return Err(RaffleError::RoundNotOpen);
        }
        let pot = self
            .pot
            .try_add(contribution)
            .map_err(|_| RaffleError::PotOverflow { contribution })?;

        self.pot = pot;
        self.entrant_count += 1;
        entrants.append(participant);
        Ok(())
    }

    pub fn check_eligibility(&self, now: u64) -> Eligibility {
        let elapsed = now.saturating_sub(self.last_draw_timestamp);
        let interval = self.interval_secs.saturating_mul(MICROS_PER_SECOND);
        Eligibility::new(
            self.status == RaffleStatus::Open,
            elapsed >= interval,
            self.entrant_count > 0,
            self.pot > Amount::ZERO,
        )
    }

    /// Moves to `Drawing` and asks the gateway for a random word.
    ///
    /// The status changes before the request is issued. If the request
    /// fails, the raffle is put back to `Open` with no request recorded.
    pub fn begin_draw(
        &mut self,
        now: u64,
        gateway: &mut impl RandomnessGateway,
    ) -> Result<RequestId, RaffleError> {
        let eligibility = self.check_eligibility(now);
        if !eligibility.eligible {
            return Err(RaffleError::EligibilityNotMet(eligibility));
        }

        self.status = RaffleStatus::Drawing;
        match gateway.request_randomness(&self.gateway_config) {
            Ok(request_id) => {
                self.pending_request_id = Some(request_id);
                Ok(request_id)
            }
            Err(reason) => {
                self.status = RaffleStatus::Open;
                Err(RaffleError::RandomnessRequestFailed(reason))
            }
        }
    }

    /// Handles the gateway's callback: selects `random_word mod entrants`,
    /// clears the round and pays the whole pot to the winner.
    ///
    /// The round is cleared before the transfer is attempted. On
    /// [`RaffleError::PayoutFailed`] the cleared round is kept and the prize
    /// stays owed until [`RaffleCore::retry_payout`] succeeds.
    pub async fn complete_draw(
        &mut self,
        caller: Option<ApplicationId>,
        request_id: RequestId,
        random_word: &RandomWord,
        now: u64,
        entrants: &mut impl EntrantLog,
        bank: &mut impl PrizeTransfer,
    ) -> Result<WinnerRecord, RaffleError> {
        match (caller, self.gateway) {
            (Some(caller), Some(gateway)) if caller == gateway => {}
            _ => return Err(RaffleError::UnauthorizedCallback),
        }
        if self.pending_request_id != Some(request_id) {
            return Err(RaffleError::UnknownRequest { request_id });
        }
        let entrant_count =
            usize::try_from(self.entrant_count).map_err(|_| RaffleError::NoEntrants)?;
        let winner_index = random_word
            .index_into(entrant_count)
            .ok_or(RaffleError::NoEntrants)?;
        let winner = entrants
            .entrant(winner_index)
            .await
            .map_err(RaffleError::EntrantStorage)?
            .ok_or(RaffleError::NoEntrants)?;

        self.round += 1;
        let record = WinnerRecord {
            round: self.round,
            request_id,
            winner,
            winner_index: winner_index as u64,
            entrant_count: self.entrant_count,
            amount: std::mem::replace(&mut self.pot, Amount::ZERO),
            drawn_at: now,
            paid: false,
        };
        self.entrant_count = 0;
        entrants.reset();
        self.recent_winner = Some(winner);
        self.last_draw_timestamp = now;
        self.pending_request_id = None;
        self.pending_payout = Some(record);

        self.settle_payout(bank)
    }

    /// Transfers the owed prize of the last draw, if any, and reopens.
    pub fn retry_payout(&mut self, bank: &mut impl PrizeTransfer) -> Result<WinnerRecord, RaffleError> {
        self.settle_payout(bank)
    }

    fn settle_payout(&mut self, bank: &mut impl PrizeTransfer) -> Result<WinnerRecord, RaffleError> {
        let Some(record) = self.pending_payout.clone() else {
            return Err(RaffleError::NoPayoutPending);
        };
        match bank.transfer_prize(record.winner, record.amount) {
            Ok(()) => {
                self.pending_payout = None;
                self.status = RaffleStatus::Open;
                Ok(WinnerRecord { paid: true, ..record })
            }
            Err(reason) => Err(RaffleError::PayoutFailed { record, reason }),
        }
    }
}
