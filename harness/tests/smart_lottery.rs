//! Live scenarios against a local node (`RPC_URL`, default 127.0.0.1:8545).
//!
//! Needs `LOTTERY_ARTIFACT_PATH` to point at the compiled contract and
//! `AGGREGATOR_FEED_PROXY_TEST_ADDRESS` at a price feed. Setup deploys a
//! fresh lottery; the scenarios then share it and run one after another in a
//! single test, so no two transactions from the same account are in flight
//! and player1 stays within its ticket allowance.
//! Run with `cargo test -- --ignored`.

use alloy::primitives::{Address, U256};
use rstest::{fixture, rstest};
use smart_lottery_harness::config::AppConfig;
use smart_lottery_harness::harness::{Harness, Scenario, VALID_TICKET_USD};
use smart_lottery_harness::lottery::TicketRequest;

#[fixture]
async fn harness() -> Harness {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().expect("invalid configuration");
    Harness::setup(&config).await.expect("harness setup failed")
}

#[rstest]
#[tokio::test]
#[ignore = "requires a local node and the compiled SmartLottery artifact"]
async fn smart_lottery_scenarios_in_order(#[future] harness: Harness) {
    let harness = harness.await;

    // Should deploy smart contract properly.
    assert_ne!(harness.lottery().address(), Address::ZERO);
    harness.deploys_properly().await.expect("no lottery bytecode");

    // Player can buy ticket.
    let player1 = harness.accounts.player1;
    let payment = harness.payment_for(VALID_TICKET_USD).unwrap();
    let request = TicketRequest::random(player1, payment);
    let receipt = harness
        .lottery()
        .buy_ticket(&request)
        .await
        .expect("buyTicket failed")
        .into_receipt()
        .expect("buyTicket reverted");
    let buyers = harness.lottery().bought_ticket_buyers(&receipt).unwrap();
    assert!(buyers.contains(&player1), "BoughtTicket buyers: {buyers:?}");

    // Should revert when ticket price is 0.
    let request = TicketRequest::random(player1, U256::ZERO);
    let outcome = harness.lottery().buy_ticket(&request).await.unwrap();
    assert!(outcome.is_reverted(), "{outcome:?}");

    // Should revert when ticket price is less than 10 dollars.
    harness
        .run(Scenario::RevertsBelowTicketPrice)
        .await
        .expect("8 dollar purchase was accepted");

    // Ticket can not be bought twice.
    harness
        .run(Scenario::TicketCannotBeBoughtTwice)
        .await
        .expect("duplicate ticket was accepted");
}

