// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! Randomness Mock Application - local stand-in for a randomness oracle */

pub use raffle_abi::{
    GatewayConfig, GatewayOperation, GatewayResponse, RaffleAbi, RaffleOperation, RaffleResponse,
    RandomWord, RandomnessGatewayAbi, RandomnessRequest, RequestId,
};

/// Largest number of words a single request may ask for.
pub const MAX_NUM_WORDS: u32 = 500;

/// Checks that a request can be fulfilled.
pub fn validate_config(config: &GatewayConfig) -> Result<(), String> {
    if config.num_words == 0 {
        return Err("At least one random word must be requested".to_string());
    }
    if config.num_words > MAX_NUM_WORDS {
        return Err(format!(
            "Requested {} random words, at most {} are allowed",
            config.num_words, MAX_NUM_WORDS
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_matches!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_word_count_bounds() {
        let mut config = GatewayConfig::default();
        config.num_words = 0;
        assert_matches!(validate_config(&config), Err(_));

        config.num_words = MAX_NUM_WORDS;
        assert_matches!(validate_config(&config), Ok(()));

        config.num_words = MAX_NUM_WORDS + 1;
        assert_matches!(validate_config(&config), Err(message) if message.contains("500"));
    }
}
