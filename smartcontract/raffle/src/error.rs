// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use linera_sdk::linera_base_types::Amount;
use raffle_abi::{Eligibility, RequestId, WinnerRecord};
use thiserror::Error;

/// Errors returned by [`crate::RaffleCore`].
///
/// Every variant except [`RaffleError::PayoutFailed`] is returned before any
/// field is modified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RaffleError {
    #[error("contribution {contribution} is below the entrance fee {entrance_fee}")]
    InsufficientContribution {
        contribution: Amount,
        entrance_fee: Amount,
    },

    #[error("the raffle is not open for entries")]
    RoundNotOpen,

    #[error("adding {contribution} would overflow the pot")]
    PotOverflow { contribution: Amount },

    #[error("draw is not eligible ({0})")]
    EligibilityNotMet(Eligibility),

    #[error("randomness request failed: {0}")]
    RandomnessRequestFailed(String),

    #[error("caller is not the configured randomness gateway")]
    UnauthorizedCallback,

    #[error("request {request_id} is not the pending randomness request")]
    UnknownRequest { request_id: RequestId },

    #[error("pending draw has no entrants")]
    NoEntrants,

    #[error("failed to read the entrants: {0}")]
    EntrantStorage(String),

    /// The winner is selected and the round's state is cleared, but the prize
    /// is still owed. The raffle stays in `Drawing` until a retry succeeds.
    #[error("payout of {} to {} failed: {reason}", .record.amount, .record.winner)]
    PayoutFailed { record: WinnerRecord, reason: String },

    #[error("no payout is pending")]
    NoPayoutPending,
}
