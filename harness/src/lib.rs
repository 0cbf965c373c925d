//! SmartLottery deployment and integration harness
//!
//! Deploys the `SmartLottery` contract with network-dependent oracle
//! parameters and drives the deployed instance through a JSON-RPC node:
//!
//! - **Configurator** ([`network`], [`deployer`]) selects constructor
//!   arguments for the target network and submits the deployment.
//! - **Harness** ([`harness`]) reads the price feed, converts dollar ticket
//!   prices to native currency and checks purchases, reverts and events.

pub mod artifact;
pub mod config;
pub mod deployer;
pub mod harness;
pub mod lottery;
pub mod network;
pub mod price;
pub mod report;
pub mod rpc;

use tracing_subscriber::{EnvFilter, fmt};

/// Install the global `fmt` subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,alloy_transport_http=warn,alloy_rpc_client=warn,hyper=warn,reqwest=warn")
        }))
        .with_target(true)
        .with_ansi(true)
        .init();
}
