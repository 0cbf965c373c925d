//! Integration scenarios against a deployed `SmartLottery`.
//!
//! [`Harness::setup`] connects to the node, reads the price feed once and
//! deploys a fresh lottery, so every run starts with untouched per-player
//! ticket allowances. Each scenario then draws a fresh (number, serial) pair
//! and submits its transactions one at a time.

use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{error, info};

use crate::artifact::Artifact;
use crate::config::{AppConfig, FEED_PROXY_ENV};
use crate::deployer::{self, DeploymentRecord};
use crate::lottery::{Lottery, PurchaseOutcome, TicketRequest};
use crate::network;
use crate::price::{self, PriceSnapshot};
use crate::report::Report;
use crate::rpc;

/// Dollar amount of a valid ticket purchase.
pub const VALID_TICKET_USD: f64 = 10.0;
/// Dollar amount below the contract's ticket price.
pub const BELOW_THRESHOLD_USD: f64 = 8.0;

/// Node accounts used by the scenarios, in the order the node lists them.
#[derive(Debug, Clone, Copy)]
pub struct Accounts {
    pub owner: Address,
    pub player1: Address,
    pub player2: Address,
}

impl Accounts {
    pub fn from_node_order(accounts: &[Address]) -> Result<Self> {
        let [owner, player1, player2, ..] = accounts else {
            anyhow::bail!(
                "node exposes {} accounts, scenarios need at least 3",
                accounts.len()
            );
        };
        Ok(Self {
            owner: *owner,
            player1: *player1,
            player2: *player2,
        })
    }
}

/// The individual checks run by [`Harness::run_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    DeploysProperly,
    PlayerCanBuyTicket,
    RevertsOnZeroPayment,
    RevertsBelowTicketPrice,
    TicketCannotBeBoughtTwice,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::DeploysProperly,
        Scenario::PlayerCanBuyTicket,
        Scenario::RevertsOnZeroPayment,
        Scenario::RevertsBelowTicketPrice,
        Scenario::TicketCannotBeBoughtTwice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::DeploysProperly => "deploys_properly",
            Scenario::PlayerCanBuyTicket => "player_can_buy_ticket",
            Scenario::RevertsOnZeroPayment => "reverts_on_zero_payment",
            Scenario::RevertsBelowTicketPrice => "reverts_below_ticket_price",
            Scenario::TicketCannotBeBoughtTwice => "ticket_cannot_be_bought_twice",
        }
    }

    /// Purchases by player1 that this scenario expects to be mined.
    pub fn player1_purchases(self) -> u64 {
        match self {
            Scenario::PlayerCanBuyTicket | Scenario::TicketCannotBeBoughtTwice => 1,
            Scenario::DeploysProperly
            | Scenario::RevertsOnZeroPayment
            | Scenario::RevertsBelowTicketPrice => 0,
        }
    }
}

/// Mined player1 purchases in one [`Harness::run_all`] pass.
pub fn player1_purchases_per_run() -> u64 {
    Scenario::ALL.iter().map(|s| s.player1_purchases()).sum()
}

/// Connected harness state shared by every scenario.
pub struct Harness {
    pub accounts: Accounts,
    pub snapshot: PriceSnapshot,
    /// Dollars per native unit derived from `snapshot`.
    pub reference_price: f64,
    pub deployment: DeploymentRecord,
    lottery: Lottery<DynProvider>,
}

impl Harness {
    /// Connect to the node, read the price feed and deploy a fresh lottery
    /// from the owner account with the parameters selected for
    /// `config.network`.
    pub async fn setup(config: &AppConfig) -> Result<Self> {
        // Scenarios send from several node accounts, so never sign locally.
        let provider = rpc::connect(&config.rpc_url, None)?;

        let accounts = Accounts::from_node_order(&rpc::node_accounts(&provider).await?)?;

        let feed = config
            .feed_proxy
            .with_context(|| format!("{FEED_PROXY_ENV} must be set to read the price feed"))?;
        let snapshot = price::fetch_snapshot(provider.clone(), feed).await?;
        let reference_price = price::reference_price(&snapshot)?;

        let artifact = Artifact::load(&config.artifact_path)?;
        let params = network::deployment_params(&config.network, config.feed_proxy);
        let deployment =
            deployer::deploy(&provider, &artifact, &params, accounts.owner, &config.network)
                .await
                .context("failed to deploy a fresh lottery")?;
        let lottery = Lottery::new(provider, deployment.address, artifact);

        info!(
            lottery = %deployment.address,
            feed = %feed,
            answer = %snapshot.answer,
            decimals = snapshot.decimals,
            reference_price,
            "Harness ready"
        );

        Ok(Self {
            accounts,
            snapshot,
            reference_price,
            deployment,
            lottery,
        })
    }

    pub fn lottery(&self) -> &Lottery<DynProvider> {
        &self.lottery
    }

    /// Wei equivalent of `dollars` at the reference price.
    pub fn payment_for(&self, dollars: f64) -> Result<U256> {
        price::ticket_cost_wei(dollars, self.reference_price)
    }

    /// Run every scenario in order, recording each outcome.
    pub async fn run_all(&self) -> Report {
        let mut report = Report::default();
        for scenario in Scenario::ALL {
            let start = Instant::now();
            let outcome = self.run(scenario).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &outcome {
                Ok(()) => info!(scenario = scenario.name(), elapsed_ms, "Passed"),
                Err(e) => {
                    let err_str = format!("{e:#}");
                    error!(scenario = scenario.name(), error = %err_str, "Failed");
                }
            }
            report.record(scenario.name(), &outcome, elapsed_ms);
        }
        report
    }

    pub async fn run(&self, scenario: Scenario) -> Result<()> {
        match scenario {
            Scenario::DeploysProperly => self.deploys_properly().await,
            Scenario::PlayerCanBuyTicket => self.player_can_buy_ticket().await,
            Scenario::RevertsOnZeroPayment => self.reverts_on_zero_payment().await,
            Scenario::RevertsBelowTicketPrice => self.reverts_below_ticket_price().await,
            Scenario::TicketCannotBeBoughtTwice => self.ticket_cannot_be_bought_twice().await,
        }
    }

    pub async fn deploys_properly(&self) -> Result<()> {
        let address = self.lottery.address();
        anyhow::ensure!(address != Address::ZERO, "lottery address is empty");
        anyhow::ensure!(self.lottery.has_code().await?, "no bytecode at {address}");
        Ok(())
    }

    pub async fn player_can_buy_ticket(&self) -> Result<()> {
        let player = self.accounts.player1;
        let request = TicketRequest::random(player, self.payment_for(VALID_TICKET_USD)?);

        let receipt = self.lottery.buy_ticket(&request).await?.into_receipt()?;
        let buyers = self.lottery.bought_ticket_buyers(&receipt)?;
        anyhow::ensure!(
            buyers.contains(&player),
            "expected BoughtTicket for {player}, got {buyers:?}"
        );
        Ok(())
    }

    pub async fn reverts_on_zero_payment(&self) -> Result<()> {
        let request = TicketRequest::random(self.accounts.player1, U256::ZERO);
        expect_revert(self.lottery.buy_ticket(&request).await?)
    }

    pub async fn reverts_below_ticket_price(&self) -> Result<()> {
        let payment = self.payment_for(BELOW_THRESHOLD_USD)?;
        let request = TicketRequest::random(self.accounts.player1, payment);
        expect_revert(self.lottery.buy_ticket(&request).await?)
    }

    pub async fn ticket_cannot_be_bought_twice(&self) -> Result<()> {
        let first = TicketRequest::random(self.accounts.player1, self.payment_for(VALID_TICKET_USD)?);
        self.lottery
            .buy_ticket(&first)
            .await?
            .into_receipt()
            .context("first purchase")?;

        let second = first.resold_to(self.accounts.player2);
        expect_revert(self.lottery.buy_ticket(&second).await?)
    }
}

/// Any revert satisfies the check; the reason is not inspected.
pub fn expect_revert(outcome: PurchaseOutcome) -> Result<()> {
    match outcome {
        PurchaseOutcome::Reverted(_) => Ok(()),
        PurchaseOutcome::Confirmed(receipt) => anyhow::bail!(
            "expected revert, but transaction {} succeeded",
            receipt.transaction_hash
        ),
    }
}
