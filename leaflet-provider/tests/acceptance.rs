//! Acceptance tests for the provider against a scripted transport.
//!
//! These cover the end-to-end query scenarios:
//! 1. Balance sums unspent coins of the requested puzzle hash
//! 2. Balance ignores spent coins
//! 3. A rejected puzzle solution resolves to `None`
//! 4. A block header query resolves to the translated header
//! 5. A request with no response fails with `Timeout` and leaves the registry
//! 6. Closing with a pending request fails it with `Cancelled`
//!
//! plus the correlation invariants: exclusive one-shot consumption,
//! independent subscriptions, late frames discarded after timeout, and
//! null-coercion of invalid inputs.

mod common;

use std::time::Duration;

use common::{coin, connected_provider, frame, unspent, wait_for_sent, MockTransport};

use leaflet_core::types::CoinState as WireCoinState;
use leaflet_core::wallet_protocol::{
    NewPeakWallet, RegisterForPhUpdates, RejectHeaderBlocks, RejectPuzzleSolution,
    RespondAdditions, RespondBlockHeader, RespondChildren, RespondHeaderBlocks, RespondRemovals,
    RespondToCoinUpdates, RespondToPhUpdates,
};
use leaflet_core::types::{HeaderBlock, RewardChainBlock};
use leaflet_core::{codec, ProtocolMessageType};
use leaflet_provider::{BalanceRequest, ProviderError};

const PH: [u8; 32] = [0x11u8; 32];
const OTHER_PH: [u8; 32] = [0x22u8; 32];

fn ph_hex(hash: &[u8; 32]) -> String {
    hex::encode(hash)
}

fn ph_update(puzzle_hashes: Vec<[u8; 32]>, coin_states: Vec<WireCoinState>) -> RespondToPhUpdates {
    RespondToPhUpdates {
        puzzle_hashes,
        min_height: 0,
        coin_states,
    }
}

fn header_block(height: u64) -> HeaderBlock {
    HeaderBlock {
        reward_chain_block: RewardChainBlock { height, weight: 7 },
        header_hash: [0x33u8; 32],
        prev_header_hash: [0x34u8; 32],
        is_transaction_block: true,
        timestamp: Some(1_700_000_000),
        fees: Some(1),
    }
}

#[tokio::test]
async fn test_balance_sums_unspent_coins() {
    let (provider, transport) = connected_provider().await;

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move {
            provider
                .balance(&BalanceRequest {
                    puzzle_hash: Some(ph_hex(&PH)),
                    ..Default::default()
                })
                .await
        })
    };

    wait_for_sent(&transport, 1).await;
    let sent = transport.sent();
    assert_eq!(
        sent[0].msg_type,
        ProtocolMessageType::RegisterInterestInPuzzleHash
    );
    let register: RegisterForPhUpdates = codec::decode(&sent[0].data).unwrap();
    assert_eq!(register.puzzle_hashes, vec![PH]);
    assert_eq!(register.min_height, 0);

    transport.inject(frame(
        ProtocolMessageType::RespondToPhUpdate,
        &ph_update(
            vec![PH],
            vec![unspent(PH, 100), unspent(PH, 250), unspent(OTHER_PH, 999)],
        ),
    ));

    let balance = task.await.unwrap().unwrap();
    assert_eq!(balance, Some(350));
}

#[tokio::test]
async fn test_balance_ignores_spent_coins() {
    let (provider, transport) = connected_provider().await;

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move {
            provider
                .balance(&BalanceRequest {
                    puzzle_hash: Some(ph_hex(&PH)),
                    ..Default::default()
                })
                .await
        })
    };

    wait_for_sent(&transport, 1).await;

    let mut spent = unspent(PH, 100);
    spent.spent_height = Some(42);
    transport.inject(frame(
        ProtocolMessageType::RespondToPhUpdate,
        &ph_update(vec![PH], vec![spent, unspent(PH, 250)]),
    ));

    let balance = task.await.unwrap().unwrap();
    assert_eq!(balance, Some(250));
}

#[tokio::test]
async fn test_balance_invalid_input_returns_none_without_sending() {
    let (provider, transport) = connected_provider().await;

    let balance = provider
        .balance(&BalanceRequest {
            puzzle_hash: Some("not-a-hash".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(balance, None);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_puzzle_solution_rejected_is_none() {
    let (provider, transport) = connected_provider().await;

    let coin_name = [0x55u8; 32];
    let task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.puzzle_solution(&hex::encode(coin_name), 77).await })
    };

    wait_for_sent(&transport, 1).await;
    transport.inject(frame(
        ProtocolMessageType::RejectPuzzleSolution,
        &RejectPuzzleSolution {
            coin_name,
            height: 77,
        },
    ));

    let solution = task.await.unwrap().unwrap();
    assert_eq!(solution, None);
}

#[tokio::test]
async fn test_block_header_at_height() {
    let (provider, transport) = connected_provider().await;

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.block_header(100).await })
    };

    wait_for_sent(&transport, 1).await;
    transport.inject(frame(
        ProtocolMessageType::RespondBlockHeader,
        &RespondBlockHeader {
            header_block: header_block(100),
        },
    ));

    let header = task.await.unwrap().unwrap().unwrap();
    assert_eq!(header.height, 100);
    assert_eq!(header.header_hash, [0x33u8; 32]);
    assert!(header.is_transaction_block);
}

#[tokio::test]
async fn test_block_header_ignores_other_heights() {
    let (provider, transport) = connected_provider().await;

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.block_header(100).await })
    };

    wait_for_sent(&transport, 1).await;

    // A response for a different height is not ours; the request then
    // times out.
    transport.inject(frame(
        ProtocolMessageType::RespondBlockHeader,
        &RespondBlockHeader {
            header_block: header_block(101),
        },
    ));

    let result = task.await.unwrap();
    assert!(matches!(result, Err(ProviderError::Timeout)));
}

#[tokio::test]
async fn test_timeout_removes_filter_and_discards_late_frame() {
    let (provider, transport) = connected_provider().await;

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.block_header(100).await })
    };

    wait_for_sent(&transport, 1).await;
    let result = task.await.unwrap();
    assert!(matches!(result, Err(ProviderError::Timeout)));

    // Registry holds only the peak watcher again.
    assert_eq!(provider.manager().filter_count().await, 1);

    // A late matching frame is unsolicited: discarded without effect.
    transport.inject(frame(
        ProtocolMessageType::RespondBlockHeader,
        &RespondBlockHeader {
            header_block: header_block(100),
        },
    ));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(provider.manager().filter_count().await, 1);
}

#[tokio::test]
async fn test_close_cancels_pending_request() {
    let (provider, transport) = connected_provider().await;

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.block_header(100).await })
    };

    wait_for_sent(&transport, 1).await;
    provider.close().await;

    let result = task.await.unwrap();
    assert!(matches!(result, Err(ProviderError::Cancelled)));
    assert_eq!(provider.manager().filter_count().await, 0);

    // Operations after close fail fast.
    let result = provider.block_header(5).await;
    assert!(matches!(result, Err(ProviderError::NotConnected)));
}

#[tokio::test]
async fn test_transport_failure_surfaces_on_initialize() {
    let transport = MockTransport::new();
    transport.fail_open();

    let config = leaflet_net::ConnectionConfig::new("127.0.0.1", "k");
    let provider = leaflet_provider::LeafletProvider::with_channel(config, transport.channel());

    let result = provider.initialize().await;
    assert!(matches!(result, Err(ProviderError::Transport(_))));
}

#[tokio::test]
async fn test_block_number_follows_peak_updates() {
    let (provider, transport) = connected_provider().await;

    assert_eq!(provider.block_number(), None);

    for height in [100u64, 101, 102] {
        transport.inject(frame(
            ProtocolMessageType::NewPeakWallet,
            &NewPeakWallet {
                header_hash: [9u8; 32],
                height,
                weight: 0,
                fork_point_with_previous_peak: 0,
            },
        ));
    }

    for _ in 0..100 {
        if provider.block_number() == Some(102) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(provider.block_number(), Some(102));
}

#[tokio::test]
async fn test_double_subscription_both_receive_in_order() {
    let (provider, transport) = connected_provider().await;

    let mut first = provider
        .subscribe_to_puzzle_hash_updates(&ph_hex(&PH), 0)
        .await
        .unwrap()
        .unwrap();
    let mut second = provider
        .subscribe_to_puzzle_hash_updates(&ph_hex(&PH), 0)
        .await
        .unwrap()
        .unwrap();

    wait_for_sent(&transport, 2).await;

    for amount in [10u64, 20] {
        transport.inject(frame(
            ProtocolMessageType::RespondToPhUpdate,
            &ph_update(vec![PH], vec![unspent(PH, amount)]),
        ));
    }

    for subscription in [&mut first, &mut second] {
        let batch = subscription.recv().await.unwrap();
        assert_eq!(batch[0].coin.amount, 10);
        let batch = subscription.recv().await.unwrap();
        assert_eq!(batch[0].coin.amount, 20);
    }
}

#[tokio::test]
async fn test_subscription_filters_to_its_key() {
    let (provider, transport) = connected_provider().await;

    let mut subscription = provider
        .subscribe_to_puzzle_hash_updates(&ph_hex(&PH), 0)
        .await
        .unwrap()
        .unwrap();

    wait_for_sent(&transport, 1).await;
    transport.inject(frame(
        ProtocolMessageType::RespondToPhUpdate,
        &ph_update(vec![PH], vec![unspent(PH, 5), unspent(OTHER_PH, 6)]),
    ));

    let batch = subscription.recv().await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].coin.amount, 5);
    assert_eq!(batch[0].coin.puzzle_hash, PH);
}

#[tokio::test]
async fn test_subscription_invalid_hash_is_noop() {
    let (provider, transport) = connected_provider().await;

    let result = provider
        .subscribe_to_puzzle_hash_updates("garbage", 0)
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_coin_update_subscription_matches_by_coin_id() {
    let (provider, transport) = connected_provider().await;

    let target_coin = coin(PH, 123);
    let target_id = target_coin.coin_id();

    let mut subscription = provider
        .subscribe_to_coin_updates(&hex::encode(target_id), 0)
        .await
        .unwrap()
        .unwrap();

    wait_for_sent(&transport, 1).await;
    transport.inject(frame(
        ProtocolMessageType::RespondToCoinUpdate,
        &RespondToCoinUpdates {
            coin_ids: vec![target_id],
            min_height: 0,
            coin_states: vec![
                WireCoinState {
                    coin: target_coin,
                    spent_height: None,
                    created_height: Some(3),
                },
                unspent(OTHER_PH, 1),
            ],
        },
    ));

    let batch = subscription.recv().await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].coin.amount, 123);
}

#[tokio::test]
async fn test_coin_children_empty_is_empty_list() {
    let (provider, transport) = connected_provider().await;

    let coin_name = [0x66u8; 32];
    let task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.coin_children(&hex::encode(coin_name)).await })
    };

    wait_for_sent(&transport, 1).await;
    transport.inject(frame(
        ProtocolMessageType::RespondChildren,
        &RespondChildren {
            coin_states: vec![],
        },
    ));

    let children = task.await.unwrap().unwrap();
    assert!(children.is_empty());
}

#[tokio::test]
async fn test_coin_children_invalid_input_raises() {
    let (provider, _transport) = connected_provider().await;

    let result = provider.coin_children("xyz").await;
    assert!(matches!(result, Err(ProviderError::InvalidInput(_))));
}

#[tokio::test]
async fn test_headers_range_numbers_from_start() {
    let (provider, transport) = connected_provider().await;

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.block_headers_range(50, 51).await })
    };

    wait_for_sent(&transport, 1).await;
    transport.inject(frame(
        ProtocolMessageType::RespondHeaderBlocks,
        &RespondHeaderBlocks {
            start_height: 50,
            end_height: 51,
            header_blocks: vec![header_block(50), header_block(51)],
        },
    ));

    let headers = task.await.unwrap().unwrap().unwrap();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[0].height, 50);
    assert_eq!(headers[1].height, 51);
}

#[tokio::test]
async fn test_headers_range_rejected_is_none() {
    let (provider, transport) = connected_provider().await;

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.block_headers_range(50, 51).await })
    };

    wait_for_sent(&transport, 1).await;
    transport.inject(frame(
        ProtocolMessageType::RejectHeaderBlocks,
        &RejectHeaderBlocks {
            start_height: 50,
            end_height: 51,
        },
    ));

    assert_eq!(task.await.unwrap().unwrap(), None);
}

#[tokio::test]
async fn test_removals_keep_only_present_coins() {
    let (provider, transport) = connected_provider().await;

    let header_hash = [0x77u8; 32];
    let task = {
        let provider = provider.clone();
        tokio::spawn(async move {
            provider
                .coin_removals(9, &hex::encode(header_hash), None)
                .await
        })
    };

    wait_for_sent(&transport, 1).await;
    transport.inject(frame(
        ProtocolMessageType::RespondRemovals,
        &RespondRemovals {
            height: 9,
            header_hash,
            coins: vec![
                ([0x01u8; 32], Some(coin(PH, 11))),
                ([0x02u8; 32], None),
            ],
            proofs: None,
        },
    ));

    let removed = task.await.unwrap().unwrap().unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].amount, 11);
}

#[tokio::test]
async fn test_removals_invalid_coin_id_sends_nothing() {
    let (provider, transport) = connected_provider().await;

    let coin_ids = vec![hex::encode([1u8; 32]), "bad".to_string()];
    let result = provider
        .coin_removals(9, &hex::encode([0x77u8; 32]), Some(coin_ids.as_slice()))
        .await
        .unwrap();

    assert_eq!(result, None);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_additions_flatten_coin_groups() {
    let (provider, transport) = connected_provider().await;

    let header_hash = [0x78u8; 32];
    let task = {
        let provider = provider.clone();
        tokio::spawn(async move {
            provider
                .coin_additions(9, &hex::encode(header_hash), None)
                .await
        })
    };

    wait_for_sent(&transport, 1).await;
    transport.inject(frame(
        ProtocolMessageType::RespondAdditions,
        &RespondAdditions {
            height: 9,
            header_hash,
            coins: vec![
                (PH, vec![coin(PH, 1), coin(PH, 2)]),
                (OTHER_PH, vec![coin(OTHER_PH, 3)]),
            ],
            proofs: None,
        },
    ));

    let added = task.await.unwrap().unwrap().unwrap();
    let amounts: Vec<u128> = added.iter().map(|c| c.amount).collect();
    assert_eq!(amounts, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_concurrent_requests_complete_independently() {
    let (provider, transport) = connected_provider().await;

    let header_task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.block_header(100).await })
    };
    wait_for_sent(&transport, 1).await;

    let balance_task = {
        let provider = provider.clone();
        tokio::spawn(async move {
            provider
                .balance(&BalanceRequest {
                    puzzle_hash: Some(ph_hex(&PH)),
                    ..Default::default()
                })
                .await
        })
    };
    wait_for_sent(&transport, 2).await;

    // Answer in reverse registration order; completions follow frame
    // arrival, not registration.
    transport.inject(frame(
        ProtocolMessageType::RespondToPhUpdate,
        &ph_update(vec![PH], vec![unspent(PH, 42)]),
    ));
    let balance = balance_task.await.unwrap().unwrap();
    assert_eq!(balance, Some(42));

    transport.inject(frame(
        ProtocolMessageType::RespondBlockHeader,
        &RespondBlockHeader {
            header_block: header_block(100),
        },
    ));
    let header = header_task.await.unwrap().unwrap().unwrap();
    assert_eq!(header.height, 100);
}

#[tokio::test]
async fn test_unsupported_operations_fail_typed() {
    let (provider, _transport) = connected_provider().await;

    assert!(matches!(
        provider.get_address(),
        Err(ProviderError::UnsupportedOperation("get_address"))
    ));
    assert!(matches!(
        provider.transfer("xch1abc", 1),
        Err(ProviderError::UnsupportedOperation("transfer"))
    ));
    assert!(matches!(
        provider.transfer_cat("xch1abc", "aa", 1),
        Err(ProviderError::UnsupportedOperation("transfer_cat"))
    ));
    assert!(matches!(
        provider.accept_offer("offer1..."),
        Err(ProviderError::UnsupportedOperation("accept_offer"))
    ));
    assert!(matches!(
        provider.subscribe_to_address_changes(),
        Err(ProviderError::UnsupportedOperation(
            "subscribe_to_address_changes"
        ))
    ));
}

#[tokio::test]
async fn test_disconnect_cancels_subscriptions_and_requests() {
    let (provider, transport) = connected_provider().await;

    let mut subscription = provider
        .subscribe_to_puzzle_hash_updates(&ph_hex(&PH), 0)
        .await
        .unwrap()
        .unwrap();

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.block_header(100).await })
    };
    wait_for_sent(&transport, 2).await;

    transport.disconnect();

    assert!(matches!(
        task.await.unwrap(),
        Err(ProviderError::Cancelled)
    ));
    assert_eq!(subscription.recv().await, None);
    assert_eq!(provider.manager().filter_count().await, 0);
}
