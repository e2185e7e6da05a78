// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! Shared ABI definitions for the Raffle and its randomness gateway */

use std::{fmt, str::FromStr};

use async_graphql::{Request, Response, SimpleObject};
use linera_sdk::linera_base_types::{AccountOwner, Amount, ApplicationId, ContractAbi, ServiceAbi};
use num_bigint::BigUint;
use num_traits::cast::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Stream the raffle contract emits its [`RaffleEvent`]s on.
pub const RAFFLE_STREAM_NAME: &[u8] = b"raffle";

pub const ONE_DAY_IN_SECONDS: u64 = 24 * 60 * 60;

pub type RequestId = u64;

// ========================================
// Randomness
// ========================================

/// A 256-bit unsigned random value, stored big-endian.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomWord(pub [u8; 32]);

impl RandomWord {
    /// Reduces the word modulo `len`. Returns `None` when there is nothing to index.
    pub fn index_into(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        (self.to_biguint() % BigUint::from(len)).to_usize()
    }

    fn to_biguint(self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }
}

impl From<u64> for RandomWord {
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        RandomWord(bytes)
    }
}

impl FromStr for RandomWord {
    type Err = String;

    /// Parses a decimal integer below 2^256.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<BigUint>()
            .map_err(|e| format!("Invalid random word {:?}: {}", s, e))?;
        let digits = value.to_bytes_be();
        if digits.len() > 32 {
            return Err(format!("Random word {} does not fit in 256 bits", s));
        }
        let mut bytes = [0u8; 32];
        bytes[32 - digits.len()..].copy_from_slice(&digits);
        Ok(RandomWord(bytes))
    }
}

impl fmt::Display for RandomWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

/// Parameters passed through to the randomness gateway with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct GatewayConfig {
    /// Identifier of the key material the oracle signs with
    pub key_hash: String,
    /// Subscription the request is billed to
    pub subscription_id: String,
    pub request_confirmations: u16,
    /// Compute budget for delivering the callback
    pub callback_gas_limit: u64,
    pub num_words: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            key_hash: String::new(),
            subscription_id: String::new(),
            request_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: 1,
        }
    }
}

// ========================================
// Raffle ABI
// ========================================

/// Status of the raffle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, async_graphql::Enum)]
pub enum RaffleStatus {
    /// Accepting entries
    #[default]
    Open,
    /// Waiting for randomness, or for an owed prize to be paid out
    Drawing,
}

/// The individual terms of the draw eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct Eligibility {
    pub open: bool,
    pub interval_elapsed: bool,
    pub has_entrants: bool,
    pub has_funds: bool,
    pub eligible: bool,
}

impl Eligibility {
    pub fn new(open: bool, interval_elapsed: bool, has_entrants: bool, has_funds: bool) -> Self {
        Eligibility {
            open,
            interval_elapsed,
            has_entrants,
            has_funds,
            eligible: open && interval_elapsed && has_entrants && has_funds,
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "open={}, interval_elapsed={}, has_entrants={}, has_funds={}",
            self.open, self.interval_elapsed, self.has_entrants, self.has_funds
        )
    }
}

/// A completed draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct WinnerRecord {
    pub round: u64,
    pub request_id: RequestId,
    pub winner: AccountOwner,
    pub winner_index: u64,
    pub entrant_count: u64,
    pub amount: Amount,
    pub drawn_at: u64,
    /// False while the prize is owed but not yet transferred
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RaffleEvent {
    Entered {
        participant: AccountOwner,
        contribution: Amount,
    },
    DrawRequested {
        round: u64,
        request_id: RequestId,
    },
    WinnerSelected {
        round: u64,
        winner: AccountOwner,
        amount: Amount,
    },
    PayoutFailed {
        round: u64,
        winner: AccountOwner,
        amount: Amount,
        reason: String,
    },
    PayoutSettled {
        round: u64,
        winner: AccountOwner,
        amount: Amount,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RaffleParameters {
    /// Minimum contribution for one entry
    pub entrance_fee: Amount,
    /// Minimum time between the start of a round and the next draw
    pub interval_secs: u64,
    /// The only application allowed to deliver randomness
    pub gateway: ApplicationId,
    pub gateway_config: GatewayConfig,
}

pub struct RaffleAbi;

impl ContractAbi for RaffleAbi {
    type Operation = RaffleOperation;
    type Response = RaffleResponse;
}

impl ServiceAbi for RaffleAbi {
    type Query = Request;
    type QueryResponse = Response;
}

#[derive(Debug, Deserialize, Serialize)]
pub enum RaffleOperation {
    /// Enter the raffle as the authenticated signer
    Enter { contribution: Amount },
    /// Read-only eligibility report, for on-chain pollers
    CheckEligibility,
    /// Start a draw and request randomness from the gateway
    BeginDraw,
    /// Randomness callback, accepted from the gateway only
    CompleteDraw {
        request_id: RequestId,
        random_word: RandomWord,
    },
    /// Re-drive a prize transfer that failed during `CompleteDraw`
    RetryPayout,
}

#[derive(Debug, Deserialize, Serialize)]
pub enum RaffleResponse {
    Entered {
        entrant_count: u64,
        pot: Amount,
    },
    Eligibility(Eligibility),
    DrawRequested {
        request_id: RequestId,
    },
    WinnerSelected(WinnerRecord),
    PayoutFailed {
        record: WinnerRecord,
        reason: String,
    },
}

// ========================================
// Randomness gateway ABI
// ========================================

pub struct RandomnessGatewayAbi;

impl ContractAbi for RandomnessGatewayAbi {
    type Operation = GatewayOperation;
    type Response = GatewayResponse;
}

impl ServiceAbi for RandomnessGatewayAbi {
    type Query = Request;
    type QueryResponse = Response;
}

#[derive(Debug, Deserialize, Serialize)]
pub enum GatewayOperation {
    /// Called by a consumer application; the caller receives the callback
    RequestRandomness { config: GatewayConfig },
    /// Deliver a random word to the consumer of a pending request
    FulfillRandomness {
        request_id: RequestId,
        random_word: RandomWord,
    },
}

#[derive(Debug, Deserialize, Serialize)]
pub enum GatewayResponse {
    Ok,
    RequestId(RequestId),
}

/// A randomness request waiting to be fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub request_id: RequestId,
    /// Application that receives the `CompleteDraw` callback
    pub consumer: ApplicationId,
    pub config: GatewayConfig,
    pub requested_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_into_reduces_modulo_len() {
        let word = RandomWord::from(7u64);
        assert_eq!(word.index_into(3), Some(1));
        assert_eq!(word.index_into(7), Some(0));
        assert_eq!(word.index_into(8), Some(7));
        assert_eq!(word.index_into(0), None);
    }

    #[test]
    fn test_index_into_uses_all_256_bits() {
        // 2^255 mod 3 == 2
        let mut bytes = [0u8; 32];
        bytes[0] = 0x80;
        assert_eq!(RandomWord(bytes).index_into(3), Some(2));

        let max = RandomWord([0xff; 32]);
        for len in 1..50 {
            let index = max.index_into(len).unwrap();
            assert!(index < len);
        }
    }

    #[test]
    fn test_random_word_decimal_round_trip() {
        let word: RandomWord = "115792089237316195423570985008687907853269984665640564039457584007913129639935"
            .parse()
            .unwrap();
        assert_eq!(word, RandomWord([0xff; 32]));
        assert_eq!(RandomWord::from(42u64).to_string(), "42");
        assert_eq!("42".parse::<RandomWord>().unwrap(), RandomWord::from(42u64));
    }

    #[test]
    fn test_random_word_rejects_out_of_range() {
        // 2^256
        let too_big = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(too_big.parse::<RandomWord>().is_err());
        assert!("-1".parse::<RandomWord>().is_err());
        assert!("seven".parse::<RandomWord>().is_err());
    }

    #[test]
    fn test_eligibility_requires_every_term() {
        assert!(Eligibility::new(true, true, true, true).eligible);
        assert!(!Eligibility::new(false, true, true, true).eligible);
        assert!(!Eligibility::new(true, false, true, true).eligible);
        assert!(!Eligibility::new(true, true, false, true).eligible);
        assert!(!Eligibility::new(true, true, true, false).eligible);
    }

    #[test]
    fn test_default_gateway_config_requests_one_word() {
        let config = GatewayConfig::default();
        assert_eq!(config.num_words, 1);
        assert_eq!(config.callback_gas_limit, 500_000);
    }
}
