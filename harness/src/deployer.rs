//! `SmartLottery` deployment and deployment records.
//!
//! The deployment step is where undefined network parameters surface: the
//! configurator passes them through, and [`constructor_args`] refuses to
//! encode a constructor call with holes in it.

use alloy::hex;
use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, B256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument};

use crate::artifact::Artifact;
use crate::network::DeploymentParams;

/// Where and how a contract was deployed on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub network: String,
    pub chain_id: u64,
    pub contract_name: String,
    pub address: Address,
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub deployer: Address,
    pub parameters: DeploymentParams,
}

impl DeploymentRecord {
    /// Path of the record for `network` inside `dir`.
    pub fn path(dir: &Path, network: &str) -> PathBuf {
        dir.join(format!("{network}.json"))
    }

    /// Write the record to `<dir>/<network>.json`, creating `dir` if needed.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = Self::path(dir, &self.network);
        let json = serde_json::to_string_pretty(self).context("failed to serialize record")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Constructor arguments in declaration order:
/// `(maxTicketsPerPlayer, vrfCoordinator, priceFeed, keyHash, intervalDays, ticketPrice)`.
pub fn constructor_args(params: &DeploymentParams) -> Result<Vec<String>> {
    let missing = params.missing_fields();
    anyhow::ensure!(
        missing.is_empty(),
        "deployment parameters undefined for this network: {}",
        missing.join(", ")
    );

    let coordinator = params.vrf_coordinator.context("vrfCoordinator undefined")?;
    let feed = params.price_feed_proxy.context("priceFeedProxy undefined")?;
    let key_hash = params.key_hash.context("keyHash undefined")?;
    let interval_days = params.interval_days.context("intervalDays undefined")?;

    Ok(vec![
        params.max_tickets_per_player.to_string(),
        coordinator.to_checksum(None),
        feed.to_checksum(None),
        hex::encode_prefixed(key_hash),
        interval_days.to_string(),
        params.ticket_price_usd.to_string(),
    ])
}

/// Deploy `artifact` with `params`, sending the creation transaction from
/// `deployer`, and wait for it to be mined.
#[instrument(skip_all, fields(network = %network, contract = %artifact.contract_name))]
pub async fn deploy<P: Provider>(
    provider: &P,
    artifact: &Artifact,
    params: &DeploymentParams,
    deployer: Address,
    network: &str,
) -> Result<DeploymentRecord> {
    let args = constructor_args(params)?;
    let code = artifact.deploy_code(&args)?;
    let chain_id = provider
        .get_chain_id()
        .await
        .context("failed to fetch chain id")?;

    info!(chain_id, %deployer, ?params, "Deploying");
    let start = Instant::now();

    let tx = TransactionRequest::default()
        .with_from(deployer)
        .with_deploy_code(code);

    let receipt = provider
        .send_transaction(tx)
        .await
        .context("deployment transaction rejected")?
        .get_receipt()
        .await
        .context("failed to fetch deployment receipt")?;

    anyhow::ensure!(
        receipt.status(),
        "deployment transaction {} reverted",
        receipt.transaction_hash
    );
    let address = receipt
        .contract_address
        .context("deployment receipt carries no contract address")?;

    info!(
        %address,
        tx = %receipt.transaction_hash,
        block = ?receipt.block_number,
        latency_ms = start.elapsed().as_millis() as u64,
        "Deployed"
    );

    Ok(DeploymentRecord {
        network: network.to_string(),
        chain_id,
        contract_name: artifact.contract_name.clone(),
        address,
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        deployer,
        parameters: params.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{TEST_VRF_COORDINATOR, deployment_params};
    use alloy::primitives::address;

    const FEED: Address = address!("0715A7794a1dc8e42615F059dD6e406A6594651A");

    #[test]
    fn constructor_args_follow_declaration_order() {
        let args = constructor_args(&deployment_params("development", Some(FEED))).unwrap();
        assert_eq!(args.len(), 6);
        assert_eq!(args[0], "3");
        assert_eq!(args[1].parse::<Address>().unwrap(), TEST_VRF_COORDINATOR);
        assert_eq!(args[2].parse::<Address>().unwrap(), FEED);
        assert_eq!(
            args[3],
            "0x4b09e658ed251bcafeebbc69400383d49f344ace09b9576fe248bb02c003fe9f"
        );
        assert_eq!(args[4], "1");
        assert_eq!(args[5], "10");
    }

    #[test]
    fn undefined_parameters_fail_at_deployment() {
        let err = constructor_args(&deployment_params("goerli", Some(FEED))).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("vrfCoordinator"), "{msg}");
        assert!(msg.contains("intervalDays"), "{msg}");
    }

    #[test]
    fn constructor_args_encode_against_artifact() {
        let artifact = crate::artifact::tests::lottery_artifact();
        let args = constructor_args(&deployment_params("mumbai", Some(FEED))).unwrap();
        assert!(artifact.deploy_code(&args).is_ok());
    }

    #[test]
    fn record_is_written_per_network() {
        let dir = std::env::temp_dir().join(format!("lottery-records-{}", std::process::id()));
        let record = DeploymentRecord {
            network: "development".into(),
            chain_id: 1337,
            contract_name: "SmartLottery".into(),
            address: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            transaction_hash: B256::repeat_byte(0xab),
            block_number: Some(1),
            deployer: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            parameters: deployment_params("development", Some(FEED)),
        };

        let path = record.save(&dir).unwrap();
        assert_eq!(path, dir.join("development.json"));
        let saved: DeploymentRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, record);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
