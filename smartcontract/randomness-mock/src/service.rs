// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use std::sync::Arc;

use async_graphql::{EmptySubscription, Object, Request, Response, Schema, SimpleObject};
use linera_sdk::{linera_base_types::WithServiceAbi, views::View, Service, ServiceRuntime};
use randomness_mock::{GatewayOperation, RandomWord, RandomnessGatewayAbi, RandomnessRequest};
use self::state::RandomnessMockState;

pub struct RandomnessMockService {
    state: Arc<RandomnessMockState>,
    runtime: Arc<ServiceRuntime<Self>>,
}

linera_sdk::service!(RandomnessMockService);

impl WithServiceAbi for RandomnessMockService {
    type Abi = RandomnessGatewayAbi;
}

impl Service for RandomnessMockService {
    type Parameters = ();

    async fn new(runtime: ServiceRuntime<Self>) -> Self {
        let state = RandomnessMockState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        RandomnessMockService {
            state: Arc::new(state),
            runtime: Arc::new(runtime),
        }
    }

    async fn handle_query(&self, request: Request) -> Response {
        let schema = Schema::build(
            QueryRoot {
                state: self.state.clone(),
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

/// A pending request as shown to the operator
#[derive(SimpleObject)]
struct PendingRequest {
    request_id: u64,
    consumer: String,
    num_words: u32,
    request_confirmations: u16,
    callback_gas_limit: u64,
    requested_at: u64,
}

fn convert_request(request: RandomnessRequest) -> PendingRequest {
    PendingRequest {
        request_id: request.request_id,
        consumer: format!("{}", request.consumer),
        num_words: request.config.num_words,
        request_confirmations: request.config.request_confirmations,
        callback_gas_limit: request.config.callback_gas_limit,
        requested_at: request.requested_at,
    }
}

struct QueryRoot {
    state: Arc<RandomnessMockState>,
}

#[Object]
impl QueryRoot {
    /// Requests waiting for a random word, oldest first
    async fn pending_requests(&self) -> Vec<PendingRequest> {
        self.state
            .get_pending_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(convert_request)
            .collect()
    }

    async fn request(&self, request_id: u64) -> Option<PendingRequest> {
        let request = self.state.get_request(request_id).await.ok()??;
        Some(convert_request(request))
    }

    /// Last request ID handed out
    async fn request_counter(&self) -> u64 {
        *self.state.request_counter.get()
    }
}

struct MutationRoot {
    runtime: Arc<ServiceRuntime<RandomnessMockService>>,
}

#[Object]
impl MutationRoot {
    /// Deliver `random_word`, a decimal integer below 2^256, to the consumer of a request
    async fn fulfill(&self, request_id: u64, random_word: String) -> String {
        let random_word = match random_word.parse::<RandomWord>() {
            Ok(random_word) => random_word,
            Err(e) => return e,
        };
        self.runtime.schedule_operation(&GatewayOperation::FulfillRandomness {
            request_id,
            random_word,
        });
        format!("FulfillRandomness operation scheduled for request {}", request_id)
    }
}
