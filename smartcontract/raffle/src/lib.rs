// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! Raffle Application - entry, draw and payout state machine */

pub mod error;
pub mod machine;

pub use error::RaffleError;
pub use machine::{EntrantLog, PrizeTransfer, RaffleCore, RandomnessGateway};

// Re-export the ABI for the contract and service binaries
pub use raffle_abi::{
    Eligibility, GatewayConfig, GatewayOperation, GatewayResponse, RaffleAbi, RaffleEvent,
    RaffleOperation, RaffleParameters, RaffleResponse, RaffleStatus, RandomWord,
    RandomnessGatewayAbi, RequestId, WinnerRecord, RAFFLE_STREAM_NAME,
};
