//! Deploy a fresh lottery and run the integration scenarios against it.

use anyhow::{Context, Result};
use smart_lottery_harness::config::AppConfig;
use smart_lottery_harness::harness::Harness;
use smart_lottery_harness::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let harness = Harness::setup(&config).await?;
    let report = harness.run_all().await;

    println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    info!(passed = report.passed(), failed = report.failed(), "Run complete");

    anyhow::ensure!(report.all_passed(), "{} scenario(s) failed", report.failed());
    Ok(())
}
