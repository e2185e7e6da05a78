// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Raffle and randomness gateway running together on one microchain.

#![cfg(not(target_arch = "wasm32"))]

use linera_sdk::{
    linera_base_types::{Account, AccountOwner, Amount, ApplicationId, TimeDelta},
    test::{ActiveChain, QueryOutcome, TestValidator},
};
use raffle::{
    GatewayConfig, GatewayOperation, RaffleAbi, RaffleOperation, RaffleParameters, RandomWord,
    RandomnessGatewayAbi,
};

const INTERVAL_SECS: u64 = 60;

struct Deployment {
    validator: TestValidator,
    chain: ActiveChain,
    raffle_id: ApplicationId<RaffleAbi>,
    gateway_id: ApplicationId<RandomnessGatewayAbi>,
    player: AccountOwner,
}

fn entrance_fee() -> Amount {
    Amount::from_millis(100)
}

/// Creates the gateway and a raffle bound to it, and funds the chain owner's account.
async fn deploy() -> Deployment {
    let (validator, raffle_module) =
        TestValidator::with_current_module::<RaffleAbi, RaffleParameters, ()>().await;
    let mut chain = validator.new_chain().await;

    let gateway_module = chain
        .publish_bytecode_files_in::<RandomnessGatewayAbi, (), ()>("../randomness-mock")
        .await;
    let gateway_id = chain
        .create_application(gateway_module, (), (), vec![])
        .await;

    let parameters = RaffleParameters {
        entrance_fee: entrance_fee(),
        interval_secs: INTERVAL_SECS,
        gateway: gateway_id.forget_abi(),
        gateway_config: GatewayConfig::default(),
    };
    let raffle_id = chain
        .create_application(raffle_module, parameters, (), vec![gateway_id.forget_abi()])
        .await;

    let player = AccountOwner::from(chain.public_key());
    let account = Account {
        chain_id: chain.id(),
        owner: player,
    };
    chain
        .add_block(|block| {
            block.with_native_token_transfer(AccountOwner::CHAIN, account, Amount::ONE);
        })
        .await;

    Deployment {
        validator,
        chain,
        raffle_id,
        gateway_id,
        player,
    }
}

async fn balance(chain: &ActiveChain, owner: AccountOwner) -> Amount {
    chain.owner_balance(&owner).await.unwrap_or(Amount::ZERO)
}

/// Three entries, then a draw once the interval has passed.
async fn enter_three_times_and_draw(deployment: &Deployment) {
    let Deployment {
        validator,
        chain,
        raffle_id,
        ..
    } = deployment;

    chain
        .add_block(|block| {
            for _ in 0..3 {
                block.with_operation(
                    *raffle_id,
                    RaffleOperation::Enter {
                        contribution: entrance_fee(),
                    },
                );
            }
        })
        .await;

    let too_early = chain
        .try_add_block(|block| {
            block.with_operation(*raffle_id, RaffleOperation::BeginDraw);
        })
        .await;
    assert!(too_early.is_err());

    validator.clock().add(TimeDelta::from_secs(INTERVAL_SECS));
    chain
        .add_block(|block| {
            block.with_operation(*raffle_id, RaffleOperation::BeginDraw);
        })
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_entries_fund_the_application_account() {
    let deployment = deploy().await;
    let Deployment {
        chain,
        raffle_id,
        player,
        ..
    } = &deployment;

    enter_three_times_and_draw(&deployment).await;

    let vault = AccountOwner::from(raffle_id.forget_abi());
    assert_eq!(balance(chain, vault).await, Amount::from_millis(300));
    assert_eq!(balance(chain, *player).await, Amount::from_millis(700));

    let QueryOutcome { response, .. } = chain
        .graphql_query(
            *raffle_id,
            "query { status entrantCount pendingRequestId entrants \
             first: entrant(index: 0) missing: entrant(index: 3) }",
        )
        .await;
    assert_eq!(response["status"], "DRAWING");
    assert_eq!(response["entrantCount"], 3);
    assert_eq!(response["pendingRequestId"], 1);
    assert_eq!(response["entrants"].as_array().map(Vec::len), Some(3));
    assert_eq!(response["first"], response["entrants"][0]);
    assert!(response["missing"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_complete_draw_from_a_user_is_rejected() {
    let deployment = deploy().await;
    let Deployment {
        chain,
        raffle_id,
        ..
    } = &deployment;

    enter_three_times_and_draw(&deployment).await;

    let result = chain
        .try_add_block(|block| {
            block.with_operation(
                *raffle_id,
                RaffleOperation::CompleteDraw {
                    request_id: 1,
                    random_word: RandomWord::from(7u64),
                },
            );
        })
        .await;
    assert!(result.is_err());

    let QueryOutcome { response, .. } = chain
        .graphql_query(*raffle_id, "query { status entrantCount pendingRequestId round }")
        .await;
    assert_eq!(response["status"], "DRAWING");
    assert_eq!(response["entrantCount"], 3);
    assert_eq!(response["pendingRequestId"], 1);
    assert_eq!(response["round"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gateway_fulfilment_pays_the_selected_entrant() {
    let deployment = deploy().await;
    let Deployment {
        chain,
        raffle_id,
        gateway_id,
        player,
        ..
    } = &deployment;

    enter_three_times_and_draw(&deployment).await;

    let QueryOutcome { response, .. } = chain
        .graphql_query(*gateway_id, "query { pendingRequests { requestId } }")
        .await;
    assert_eq!(response["pendingRequests"][0]["requestId"], 1);

    chain
        .add_block(|block| {
            block.with_operation(
                *gateway_id,
                GatewayOperation::FulfillRandomness {
                    request_id: 1,
                    random_word: RandomWord::from(7u64),
                },
            );
        })
        .await;

    let QueryOutcome { response, .. } = chain
        .graphql_query(
            *raffle_id,
            "query { status entrantCount round pendingRequestId \
             winner(round: 1) { winnerIndex entrantCount paid } }",
        )
        .await;
    assert_eq!(response["status"], "OPEN");
    assert_eq!(response["entrantCount"], 0);
    assert_eq!(response["round"], 1);
    assert!(response["pendingRequestId"].is_null());
    assert_eq!(response["winner"]["winnerIndex"], 1);
    assert_eq!(response["winner"]["entrantCount"], 3);
    assert_eq!(response["winner"]["paid"], true);

    let vault = AccountOwner::from(raffle_id.forget_abi());
    assert_eq!(balance(chain, vault).await, Amount::ZERO);
    assert_eq!(balance(chain, *player).await, Amount::ONE);

    let QueryOutcome { response, .. } = chain
        .graphql_query(*gateway_id, "query { pendingRequests { requestId } }")
        .await;
    assert_eq!(response["pendingRequests"].as_array().map(Vec::len), Some(0));

    // the request is consumed, so a second delivery has nothing to fulfil
    let redelivery = chain
        .try_add_block(|block| {
            block.with_operation(
                *gateway_id,
                GatewayOperation::FulfillRandomness {
                    request_id: 1,
                    random_word: RandomWord::from(7u64),
                },
            );
        })
        .await;
    assert!(redelivery.is_err());
}
