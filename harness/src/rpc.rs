//! Node connection helpers.

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use anyhow::{Context, Result};
use tracing::info;

/// Connect to the node at `rpc_url`.
///
/// With a `signer`, transactions are signed locally; otherwise they are sent
/// through `eth_sendTransaction` and signed by the node's unlocked accounts.
pub fn connect(rpc_url: &str, signer: Option<PrivateKeySigner>) -> Result<DynProvider> {
    let url: Url = rpc_url
        .parse()
        .with_context(|| format!("invalid RPC_URL: {rpc_url}"))?;

    let provider = match signer {
        Some(signer) => {
            info!(rpc = %url, signer = %signer.address(), "Connecting with local signer");
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(url)
                .erased()
        }
        None => {
            info!(rpc = %url, "Connecting with node-managed accounts");
            ProviderBuilder::new().connect_http(url).erased()
        }
    };
    Ok(provider)
}

/// Accounts exposed by the node, in node order.
pub async fn node_accounts<P: Provider>(provider: &P) -> Result<Vec<Address>> {
    provider
        .get_accounts()
        .await
        .context("eth_accounts call failed")
}
