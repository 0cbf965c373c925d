//! Network-dependent constructor parameters for `SmartLottery`.
//!
//! Test networks get a hard-coded VRF coordinator, key hash and draw interval,
//! with the price-feed proxy taken from configuration. Any other network is
//! passed through with those fields unset and deployment fails downstream.

use alloy::primitives::{Address, B256, address, b256};
use serde::{Deserialize, Serialize};

/// Ticket price in whole US dollars.
pub const TICKET_PRICE_USD: u64 = 10;

/// Maximum number of tickets a single player may hold per round.
pub const MAX_TICKETS_PER_PLAYER: u64 = 3;

/// VRF coordinator on the Mumbai testnet (also used for local development).
pub const TEST_VRF_COORDINATOR: Address = address!("7a1BaC17Ccc5b313516C5E16fb24f7659aA5ebed");

/// Key hash selecting the randomness request gas lane on Mumbai.
pub const TEST_KEY_HASH: B256 =
    b256!("4b09e658ed251bcafeebbc69400383d49f344ace09b9576fe248bb02c003fe9f");

/// Draw interval on test networks.
pub const TEST_INTERVAL_DAYS: u64 = 1;

/// Networks with known oracle addresses.
pub const TEST_NETWORKS: [&str; 2] = ["mumbai", "development"];

/// Constructor arguments for a `SmartLottery` deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentParams {
    pub max_tickets_per_player: u64,
    pub vrf_coordinator: Option<Address>,
    pub price_feed_proxy: Option<Address>,
    pub key_hash: Option<B256>,
    pub interval_days: Option<u64>,
    pub ticket_price_usd: u64,
}

impl DeploymentParams {
    /// Names of the fields left undefined for this network.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.vrf_coordinator.is_none() {
            missing.push("vrfCoordinator");
        }
        if self.price_feed_proxy.is_none() {
            missing.push("priceFeedProxy");
        }
        if self.key_hash.is_none() {
            missing.push("keyHash");
        }
        if self.interval_days.is_none() {
            missing.push("intervalDays");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Whether `network` has hard-coded oracle parameters.
pub fn is_test_network(network: &str) -> bool {
    TEST_NETWORKS.contains(&network)
}

/// Select the constructor arguments for `network`.
///
/// No validation happens here: an unrecognized network, or a test network
/// without a configured feed proxy, yields parameters with unset fields.
pub fn deployment_params(network: &str, feed_proxy: Option<Address>) -> DeploymentParams {
    let mut params = DeploymentParams {
        max_tickets_per_player: MAX_TICKETS_PER_PLAYER,
        vrf_coordinator: None,
        price_feed_proxy: None,
        key_hash: None,
        interval_days: None,
        ticket_price_usd: TICKET_PRICE_USD,
    };

    if is_test_network(network) {
        params.vrf_coordinator = Some(TEST_VRF_COORDINATOR);
        params.key_hash = Some(TEST_KEY_HASH);
        params.price_feed_proxy = feed_proxy;
        params.interval_days = Some(TEST_INTERVAL_DAYS);
    }

    params
}
