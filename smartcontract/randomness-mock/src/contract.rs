// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use linera_sdk::{
    linera_base_types::WithContractAbi,
    views::{RootView, View},
    Contract, ContractRuntime,
};
use randomness_mock::{
    validate_config, GatewayOperation, GatewayResponse, RaffleAbi, RaffleOperation,
    RaffleResponse, RandomnessGatewayAbi, RandomnessRequest,
};
use self::state::RandomnessMockState;

pub struct RandomnessMockContract {
    state: RandomnessMockState,
    runtime: ContractRuntime<Self>,
}

linera_sdk::contract!(RandomnessMockContract);

impl WithContractAbi for RandomnessMockContract {
    type Abi = RandomnessGatewayAbi;
}

impl Contract for RandomnessMockContract {
    type Message = ();
    type Parameters = ();
    type InstantiationArgument = ();
    type EventValue = ();

    async fn load(runtime: ContractRuntime<Self>) -> Self {
        let state = RandomnessMockState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        RandomnessMockContract { state, runtime }
    }

    async fn instantiate(&mut self, _arg: Self::InstantiationArgument) {}

    async fn execute_operation(&mut self, operation: Self::Operation) -> Self::Response {
        match operation {
            GatewayOperation::RequestRandomness { config } => {
                let consumer = self
                    .runtime
                    .authenticated_caller_id()
                    .expect("Randomness can only be requested by an application");
                if let Err(e) = validate_config(&config) {
                    panic!("Invalid randomness request: {}", e);
                }

                let request_id = self.state.next_request_id();
                let request = RandomnessRequest {
                    request_id,
                    consumer,
                    config,
                    requested_at: self.runtime.system_time().micros(),
                };
                if let Err(e) = self.state.add_request(request) {
                    panic!("{}", e);
                }
                log::info!("Randomness requested: request_id={}, consumer={}", request_id, consumer);
                GatewayResponse::RequestId(request_id)
            }

            GatewayOperation::FulfillRandomness {
                request_id,
                random_word,
            } => {
                let request = match self.state.take_request(request_id).await {
                    Ok(request) => request,
                    Err(e) => panic!("Failed to fulfill randomness: {}", e),
                };
                log::info!(
                    "Fulfilling request_id={} for {} with {}",
                    request_id,
                    request.consumer,
                    random_word
                );

                let response: RaffleResponse = self.runtime.call_application(
                    true,
                    request.consumer.with_abi::<RaffleAbi>(),
                    &RaffleOperation::CompleteDraw {
                        request_id,
                        random_word,
                    },
                );
                if let RaffleResponse::PayoutFailed { reason, .. } = &response {
                    log::warn!("Consumer accepted request_id={} but its payout failed: {}", request_id, reason);
                }
                GatewayResponse::Ok
            }
        }
    }

    async fn execute_message(&mut self, _message: Self::Message) {
        panic!("The randomness mock does not receive messages");
    }

    async fn store(mut self) {
        self.state.save().await.expect("Failed to save state");
    }
}
