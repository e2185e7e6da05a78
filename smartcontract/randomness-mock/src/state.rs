// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use linera_sdk::views::{linera_views, MapView, RegisterView, RootView, ViewError, ViewStorageContext};
use randomness_mock::RandomnessRequest;

/// The application state for the Randomness Mock.
#[derive(RootView)]
#[view(context = ViewStorageContext)]
pub struct RandomnessMockState {
    /// Last request ID handed out
    pub request_counter: RegisterView<u64>,
    /// Requests waiting for a random word
    pub requests: MapView<u64, RandomnessRequest>,
}

#[allow(dead_code)]
impl RandomnessMockState {
    pub fn next_request_id(&mut self) -> u64 {
        let request_id = *self.request_counter.get() + 1;
        self.request_counter.set(request_id);
        request_id
    }

    pub fn add_request(&mut self, request: RandomnessRequest) -> Result<(), String> {
        let request_id = request.request_id;
        self.requests
            .insert(&request_id, request)
            .map_err(|e: ViewError| format!("Failed to store request: {:?}", e))
    }

    pub async fn get_request(&self, request_id: u64) -> Result<Option<RandomnessRequest>, String> {
        self.requests
            .get(&request_id)
            .await
            .map_err(|e: ViewError| format!("Failed to get request {}: {:?}", request_id, e))
    }

    /// Removes and returns a pending request.
    pub async fn take_request(&mut self, request_id: u64) -> Result<RandomnessRequest, String> {
        let request = self
            .get_request(request_id)
            .await?
            .ok_or_else(|| format!("Request {} is not pending", request_id))?;
        self.requests
            .remove(&request_id)
            .map_err(|e: ViewError| format!("Failed to remove request {}: {:?}", request_id, e))?;
        Ok(request)
    }

    /// Pending requests, oldest first.
    pub async fn get_pending_requests(&self) -> Result<Vec<RandomnessRequest>, String> {
        let ids = self
            .requests
            .indices()
            .await
            .map_err(|e: ViewError| format!("Failed to list requests: {:?}", e))?;
        let mut requests = Vec::with_capacity(ids.len());
        for request_id in ids {
            if let Some(request) = self.get_request(request_id).await? {
                requests.push(request);
            }
        }
        requests.sort_by_key(|request| request.request_id);
        Ok(requests)
    }
}
