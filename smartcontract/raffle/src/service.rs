// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use std::sync::Arc;

use async_graphql::{EmptySubscription, Object, Request, Response, Schema};
use linera_sdk::{
    linera_base_types::{AccountOwner, Amount, WithServiceAbi},
    views::View,
    Service, ServiceRuntime,
};
use raffle::{
    Eligibility, GatewayConfig, RaffleAbi, RaffleOperation, RaffleParameters, RaffleStatus,
    WinnerRecord,
};
use self::state::RaffleState;

pub struct RaffleService {
    state: Arc<RaffleState>,
    runtime: Arc<ServiceRuntime<Self>>,
}

linera_sdk::service!(RaffleService);

impl WithServiceAbi for RaffleService {
    type Abi = RaffleAbi;
}

impl Service for RaffleService {
    type Parameters = RaffleParameters;

    async fn new(runtime: ServiceRuntime<Self>) -> Self {
        let state = RaffleState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        RaffleService {
            state: Arc::new(state),
            runtime: Arc::new(runtime),
        }
    }

    async fn handle_query(&self, request: Request) -> Response {
        let schema = Schema::build(
            QueryRoot {
                state: self.state.clone(),
                runtime: self.runtime.clone(),
            },
            MutationRoot {
                runtime: self.runtime.clone(),
            },
            EmptySubscription,
        )
        .finish();
        schema.execute(request).await
    }
}

struct QueryRoot {
    state: Arc<RaffleState>,
    runtime: Arc<ServiceRuntime<RaffleService>>,
}

#[Object]
impl QueryRoot {
    /// Whether the raffle accepts entries
    async fn status(&self) -> RaffleStatus {
        self.state.core.get().status()
    }

    /// Draw eligibility evaluated at the current time
    async fn eligibility(&self) -> Eligibility {
        let now = self.runtime.system_time().micros();
        self.state.core.get().check_eligibility(now)
    }

    async fn entrance_fee(&self) -> Amount {
        self.state.core.get().entrance_fee()
    }

    /// Minimum number of seconds between draws
    async fn interval_secs(&self) -> u64 {
        self.state.core.get().interval_secs()
    }

    async fn pot(&self) -> Amount {
        self.state.core.get().pot()
    }

    /// Entrants of the current round in entry order, one item per entry
    async fn entrants(&self) -> Vec<AccountOwner> {
        self.state
            .entrants
            .read(..)
            .await
            .unwrap_or_default()
    }

    async fn entrant(&self, index: u64) -> Option<AccountOwner> {
        let index = usize::try_from(index).ok()?;
        self.state.entrants.get(index).await.ok()?
    }

    async fn entrant_count(&self) -> u64 {
        self.state.core.get().entrant_count()
    }

    /// Microseconds timestamp of the last completed draw, or of creation
    async fn last_draw_timestamp(&self) -> u64 {
        self.state.core.get().last_draw_timestamp()
    }

    async fn pending_request_id(&self) -> Option<u64> {
        self.state.core.get().pending_request_id()
    }

    async fn recent_winner(&self) -> Option<AccountOwner> {
        self.state.core.get().recent_winner()
    }

    /// Number of completed draws
    async fn round(&self) -> u64 {
        self.state.core.get().round()
    }

    /// Prize selected but not yet transferred
    async fn pending_payout(&self) -> Option<WinnerRecord> {
        self.state.core.get().pending_payout().cloned()
    }

    /// All completed draws
    async fn winners(&self) -> Vec<WinnerRecord> {
        self.state.get_all_winners().await.unwrap_or_default()
    }

    async fn winner(&self, round: u64) -> Option<WinnerRecord> {
        self.state.get_winner(round).await.ok()?
    }

    /// Get the configured randomness gateway app ID
    async fn gateway_app_id(&self) -> Option<String> {
        self.state.core.get().gateway().map(|gateway| gateway.to_string())
    }

    async fn gateway_config(&self) -> GatewayConfig {
        self.state.core.get().gateway_config().clone()
    }
}

struct MutationRoot {
    runtime: Arc<ServiceRuntime<RaffleService>>,
}

#[Object]
impl MutationRoot {
    /// Enter the raffle with `contribution` tokens from the signer's account
    async fn enter(&self, contribution: Amount) -> String {
        self.runtime
            .schedule_operation(&RaffleOperation::Enter { contribution });
        format!("Enter operation scheduled with contribution {}", contribution)
    }

    /// Start a draw if the raffle is eligible
    async fn begin_draw(&self) -> String {
        self.runtime.schedule_operation(&RaffleOperation::BeginDraw);
        "BeginDraw operation scheduled".to_string()
    }

    /// Re-attempt the transfer of an owed prize
    async fn retry_payout(&self) -> String {
        self.runtime.schedule_operation(&RaffleOperation::RetryPayout);
        "RetryPayout operation scheduled".to_string()
    }
}
