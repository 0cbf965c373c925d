//! Harness configuration loaded from environment variables.
//!
//! Optional: `RPC_URL`, `NETWORK`, `AGGREGATOR_FEED_PROXY_TEST_ADDRESS`,
//!           `LOTTERY_ARTIFACT_PATH`, `DEPLOYMENTS_DIR`, `DEPLOYER_PRIVATE_KEY`

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable holding the price-feed proxy used on test networks.
pub const FEED_PROXY_ENV: &str = "AGGREGATOR_FEED_PROXY_TEST_ADDRESS";

/// Configuration shared by the `deploy` and `check` binaries.
#[derive(Clone)]
pub struct AppConfig {
    /// Node JSON-RPC endpoint (HTTP).
    pub rpc_url: String,
    /// Target network name, as understood by the deployment configurator.
    pub network: String,
    /// Price-feed proxy address for test/staging networks, if configured.
    pub feed_proxy: Option<Address>,
    /// Compiled `SmartLottery` artifact.
    pub artifact_path: PathBuf,
    /// Directory holding one deployment record per network.
    pub deployments_dir: PathBuf,
    /// Local signer. When absent, transactions are signed by the node's
    /// unlocked accounts.
    pub signer: Option<PrivateKeySigner>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".into());
        let network = std::env::var("NETWORK").unwrap_or_else(|_| "development".into());

        let feed_proxy = match std::env::var(FEED_PROXY_ENV) {
            Ok(s) if !s.trim().is_empty() => Some(
                Address::from_str(s.trim())
                    .with_context(|| format!("invalid {FEED_PROXY_ENV}: {s}"))?,
            ),
            _ => None,
        };

        let artifact_path = std::env::var("LOTTERY_ARTIFACT_PATH")
            .unwrap_or_else(|_| "build/contracts/SmartLottery.json".into());
        let artifact_path = PathBuf::from(shellexpand::tilde(&artifact_path).to_string());

        let deployments_dir =
            std::env::var("DEPLOYMENTS_DIR").unwrap_or_else(|_| "deployments".into());
        let deployments_dir = PathBuf::from(shellexpand::tilde(&deployments_dir).to_string());

        let signer = std::env::var("DEPLOYER_PRIVATE_KEY")
            .ok()
            .map(|key| {
                PrivateKeySigner::from_str(key.trim()).context("invalid DEPLOYER_PRIVATE_KEY")
            })
            .transpose()?;

        Ok(Self {
            rpc_url,
            network,
            feed_proxy,
            artifact_path,
            deployments_dir,
            signer,
        })
    }
}
