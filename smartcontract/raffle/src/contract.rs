// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use linera_sdk::{
    linera_base_types::{Account, AccountOwner, Amount, ApplicationId, StreamName, WithContractAbi},
    views::{RootView, View},
    Contract, ContractRuntime,
};
use raffle::{
    GatewayConfig, GatewayOperation, GatewayResponse, PrizeTransfer, RaffleAbi, RaffleCore,
    RaffleError, RaffleEvent, RaffleOperation, RaffleParameters, RaffleResponse,
    RandomnessGateway, RandomnessGatewayAbi, RequestId, WinnerRecord, RAFFLE_STREAM_NAME,
};
use self::state::RaffleState;

pub struct RaffleContract {
    state: RaffleState,
    runtime: ContractRuntime<Self>,
}

linera_sdk::contract!(RaffleContract);

impl WithContractAbi for RaffleContract {
    type Abi = RaffleAbi;
}

impl Contract for RaffleContract {
    type Message = ();
    type Parameters = RaffleParameters;
    type InstantiationArgument = ();
    type EventValue = RaffleEvent;

    async fn load(runtime: ContractRuntime<Self>) -> Self {
        let state = RaffleState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        RaffleContract { state, runtime }
    }

    async fn instantiate(&mut self, _arg: Self::InstantiationArgument) {
        let params = self.runtime.application_parameters();
        assert!(
            params.gateway_config.num_words >= 1,
            "The gateway must be asked for at least one random word"
        );
        let now = self.runtime.system_time().micros();
        log::info!(
            "Raffle created: entrance_fee={}, interval={}s, gateway={}",
            params.entrance_fee,
            params.interval_secs,
            params.gateway
        );
        self.state.core.set(RaffleCore::new(
            params.entrance_fee,
            params.interval_secs,
            params.gateway,
            params.gateway_config,
            now,
        ));
    }

    async fn execute_operation(&mut self, operation: Self::Operation) -> Self::Response {
        match operation {
            RaffleOperation::Enter { contribution } => {
                let participant = self
                    .runtime
                    .authenticated_signer()
                    .expect("Entering the raffle requires an authenticated signer");

                let core = self.state.core.get_mut();
                if let Err(e) = core.enter(participant, contribution, &mut self.state.entrants) {
                    panic!("Failed to enter raffle: {}", e);
                }
                let entrant_count = core.entrant_count();
                let pot = core.pot();

                // A failed transfer aborts the operation, including the entry above.
                self.runtime
                    .check_account_permission(participant)
                    .expect("Permission to spend the contribution");
                let vault = Account {
                    chain_id: self.runtime.chain_id(),
                    owner: self.vault_owner(),
                };
                self.runtime.transfer(participant, vault, contribution);

                log::info!(
                    "Entered: participant={}, contribution={}, entrants={}, pot={}",
                    participant,
                    contribution,
                    entrant_count,
                    pot
                );
                self.emit(RaffleEvent::Entered {
                    participant,
                    contribution,
                });
                RaffleResponse::Entered { entrant_count, pot }
            }

            RaffleOperation::CheckEligibility => {
                let now = self.runtime.system_time().micros();
                RaffleResponse::Eligibility(self.state.core.get().check_eligibility(now))
            }

            RaffleOperation::BeginDraw => {
                let now = self.runtime.system_time().micros();
                let gateway = self
                    .state
                    .core
                    .get()
                    .gateway()
                    .expect("Raffle is not instantiated");
                let mut client = GatewayClient {
                    runtime: &mut self.runtime,
                    gateway,
                };
                let core = self.state.core.get_mut();
                let request_id = match core.begin_draw(now, &mut client) {
                    Ok(request_id) => request_id,
                    Err(e) => panic!("Failed to begin draw: {}", e),
                };
                let round = core.round() + 1;

                log::info!("Draw requested: round={}, request_id={}", round, request_id);
                self.emit(RaffleEvent::DrawRequested { round, request_id });
                RaffleResponse::DrawRequested { request_id }
            }

            RaffleOperation::CompleteDraw {
                request_id,
                random_word,
            } => {
                let caller = self.runtime.authenticated_caller_id();
                let now = self.runtime.system_time().micros();
                let mut vault = PrizeVault {
                    runtime: &mut self.runtime,
                };
                let result = self
                    .state
                    .core
                    .get_mut()
                    .complete_draw(
                        caller,
                        request_id,
                        &random_word,
                        now,
                        &mut self.state.entrants,
                        &mut vault,
                    )
                    .await;
                if let Ok(record) | Err(RaffleError::PayoutFailed { record, .. }) = &result {
                    log::info!(
                        "Winner selected: round={}, request_id={}, random_word={}, index={}/{}",
                        record.round,
                        request_id,
                        random_word,
                        record.winner_index,
                        record.entrant_count
                    );
                    self.emit(RaffleEvent::WinnerSelected {
                        round: record.round,
                        winner: record.winner,
                        amount: record.amount,
                    });
                }
                self.handle_payout(result)
            }

            RaffleOperation::RetryPayout => {
                let mut vault = PrizeVault {
                    runtime: &mut self.runtime,
                };
                let result = self.state.core.get_mut().retry_payout(&mut vault);
                self.handle_payout(result)
            }
        }
    }

    async fn execute_message(&mut self, _message: Self::Message) {
        panic!("The raffle does not receive messages");
    }

    async fn store(mut self) {
        self.state.save().await.expect("Failed to save state");
    }
}

impl RaffleContract {
    fn vault_owner(&mut self) -> AccountOwner {
        AccountOwner::from(self.runtime.application_id().forget_abi())
    }

    fn emit(&mut self, event: RaffleEvent) {
        self.runtime.emit(StreamName::from(RAFFLE_STREAM_NAME), &event);
    }

    /// Records the outcome of a prize transfer. A failed transfer is reported
    /// in the response so that the committed selection is persisted.
    fn handle_payout(&mut self, result: Result<WinnerRecord, RaffleError>) -> RaffleResponse {
        match result {
            Ok(record) => {
                if let Err(e) = self.state.record_winner(record.clone()) {
                    panic!("{}", e);
                }
                log::info!(
                    "Prize paid: round={}, winner={}, amount={}",
                    record.round,
                    record.winner,
                    record.amount
                );
                self.emit(RaffleEvent::PayoutSettled {
                    round: record.round,
                    winner: record.winner,
                    amount: record.amount,
                });
                RaffleResponse::WinnerSelected(record)
            }
            Err(RaffleError::PayoutFailed { record, reason }) => {
                if let Err(e) = self.state.record_winner(record.clone()) {
                    panic!("{}", e);
                }
                log::warn!(
                    "Payout failed: round={}, winner={}, amount={}: {}",
                    record.round,
                    record.winner,
                    record.amount,
                    reason
                );
                self.emit(RaffleEvent::PayoutFailed {
                    round: record.round,
                    winner: record.winner,
                    amount: record.amount,
                    reason: reason.clone(),
                });
                RaffleResponse::PayoutFailed { record, reason }
            }
            Err(e) => {
                log::error!("Payout rejected: {}", e);
                panic!("Failed to settle draw: {}", e);
            }
        }
    }
}

/// Requests randomness from the gateway application.
struct GatewayClient<'a> {
    runtime: &'a mut ContractRuntime<RaffleContract>,
    gateway: ApplicationId,
}

impl RandomnessGateway for GatewayClient<'_> {
    fn request_randomness(&mut self, config: &GatewayConfig) -> Result<RequestId, String> {
        let response = self.runtime.call_application(
            true,
            self.gateway.with_abi::<RandomnessGatewayAbi>(),
            &GatewayOperation::RequestRandomness {
                config: config.clone(),
            },
        );
        match response {
            GatewayResponse::RequestId(request_id) => Ok(request_id),
            other => Err(format!("Unexpected gateway response: {:?}", other)),
        }
    }
}

/// Pays prizes out of the application's own account.
struct PrizeVault<'a> {
    runtime: &'a mut ContractRuntime<RaffleContract>,
}

impl PrizeTransfer for PrizeVault<'_> {
    fn transfer_prize(&mut self, winner: AccountOwner, amount: Amount) -> Result<(), String> {
        let vault = AccountOwner::from(self.runtime.application_id().forget_abi());
        let balance = self.runtime.owner_balance(vault);
        if balance < amount {
            return Err(format!(
                "application account holds {} but {} is owed",
                balance, amount
            ));
        }
        let target = Account {
            chain_id: self.runtime.chain_id(),
            owner: winner,
        };
        self.runtime.transfer(vault, target, amount);
        Ok(())
    }
}
