// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use linera_sdk::{
    linera_base_types::AccountOwner,
    views::{linera_views, LogView, MapView, RegisterView, RootView, ViewError, ViewStorageContext},
};
use raffle::{RaffleCore, WinnerRecord};

/// The application state for the Raffle.
#[derive(RootView)]
#[view(context = ViewStorageContext)]
pub struct RaffleState {
    /// Entry, draw and payout state machine
    pub core: RegisterView<RaffleCore>,
    /// Entries of the current round, one item per entry
    pub entrants: LogView<AccountOwner>,
    /// Completed draws by round number
    pub winners: MapView<u64, WinnerRecord>,
}

#[allow(dead_code)]
impl RaffleState {
    /// Stores or overwrites the record of a draw.
    pub fn record_winner(&mut self, record: WinnerRecord) -> Result<(), String> {
        let round = record.round;
        self.winners
            .insert(&round, record)
            .map_err(|e: ViewError| format!("Failed to record winner: {:?}", e))
    }

    pub async fn get_winner(&self, round: u64) -> Result<Option<WinnerRecord>, String> {
        self.winners
            .get(&round)
            .await
            .map_err(|e: ViewError| format!("Failed to get winner of round {}: {:?}", round, e))
    }

    /// All recorded draws, oldest first.
    pub async fn get_all_winners(&self) -> Result<Vec<WinnerRecord>, String> {
        let rounds = self
            .winners
            .indices()
            .await
            .map_err(|e: ViewError| format!("Failed to list winners: {:?}", e))?;
        let mut winners = Vec::with_capacity(rounds.len());
        for round in rounds {
            if let Some(record) = self.get_winner(round).await? {
                winners.push(record);
            }
        }
        winners.sort_by_key(|record| record.round);
        Ok(winners)
    }
}
