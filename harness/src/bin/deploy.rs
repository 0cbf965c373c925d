//! Deploy `SmartLottery` to `NETWORK` and record the deployed address.

use anyhow::{Context, Result};
use smart_lottery_harness::artifact::Artifact;
use smart_lottery_harness::config::AppConfig;
use smart_lottery_harness::{deployer, init_tracing, network, rpc};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let params = network::deployment_params(&config.network, config.feed_proxy);
    if !params.is_complete() {
        warn!(
            network = %config.network,
            missing = ?params.missing_fields(),
            "Deployment parameters incomplete"
        );
    }

    let artifact = Artifact::load(&config.artifact_path)?;
    let from = config.signer.as_ref().map(|signer| signer.address());
    let provider = rpc::connect(&config.rpc_url, config.signer.clone())?;

    let from = match from {
        Some(address) => address,
        None => *rpc::node_accounts(&provider)
            .await?
            .first()
            .context("node exposes no accounts to deploy from")?,
    };

    let record = deployer::deploy(&provider, &artifact, &params, from, &config.network).await?;
    let path = record.save(&config.deployments_dir)?;

    info!(address = %record.address, record = %path.display(), "Deployment recorded");
    Ok(())
}
