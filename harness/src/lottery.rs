//! Client for a deployed `SmartLottery`.
//!
//! Calls are encoded from the compiled artifact's ABI, so the harness tracks
//! whatever `buyTicket` and `BoughtTicket` signatures the contract declares.

use alloy::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy::json_abi::Event;
use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, LogData, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError, TransportErrorKind};
use anyhow::{Context, Result};
use rand::Rng;
use std::ops::Range;
use tracing::{debug, info, instrument, warn};

use crate::artifact::Artifact;

/// Ticket numbers are drawn from `[1, 99)`.
pub const NUMBER_RANGE: Range<u64> = 1..99;
/// Ticket serials are drawn from `[1, 999)`.
pub const SERIAL_RANGE: Range<u64> = 1..999;

pub const BUY_TICKET: &str = "buyTicket";
pub const BOUGHT_TICKET: &str = "BoughtTicket";

/// JSON-RPC error code geth and anvil use for `execution reverted`.
const EXECUTION_REVERTED_CODE: i64 = 3;

/// A single `buyTicket` transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRequest {
    pub number: u64,
    pub serial: u64,
    pub use_subscription: bool,
    /// Attached value in wei.
    pub payment: U256,
    pub buyer: Address,
}

impl TicketRequest {
    /// Draw a number and serial uniformly from the thread RNG.
    pub fn random(buyer: Address, payment: U256) -> Self {
        Self::random_with(&mut rand::thread_rng(), buyer, payment)
    }

    pub fn random_with<R: Rng + ?Sized>(rng: &mut R, buyer: Address, payment: U256) -> Self {
        Self {
            number: rng.gen_range(NUMBER_RANGE),
            serial: rng.gen_range(SERIAL_RANGE),
            use_subscription: false,
            payment,
            buyer,
        }
    }

    /// The same (number, serial) pair bought by someone else.
    pub fn resold_to(&self, buyer: Address) -> Self {
        Self {
            buyer,
            ..self.clone()
        }
    }

    fn call_args(&self) -> Vec<String> {
        vec![
            self.number.to_string(),
            self.serial.to_string(),
            self.use_subscription.to_string(),
        ]
    }
}

/// Result of submitting a transaction that the contract may refuse.
#[derive(Debug)]
pub enum PurchaseOutcome {
    Confirmed(Box<TransactionReceipt>),
    Reverted(String),
}

impl PurchaseOutcome {
    pub fn is_reverted(&self) -> bool {
        matches!(self, Self::Reverted(_))
    }

    /// The receipt of a confirmed purchase, or an error carrying the revert.
    pub fn into_receipt(self) -> Result<TransactionReceipt> {
        match self {
            Self::Confirmed(receipt) => Ok(*receipt),
            Self::Reverted(reason) => anyhow::bail!("transaction reverted: {reason}"),
        }
    }
}

/// Whether a node error reports a contract revert rather than a transport or
/// request problem. Covers geth/anvil (`execution reverted`, code 3), ganache
/// (`VM Exception while processing transaction: revert`) and hardhat
/// (`reverted with reason string`).
pub fn is_revert_error(code: i64, message: &str) -> bool {
    code == EXECUTION_REVERTED_CODE || message.to_ascii_lowercase().contains("revert")
}

/// `SmartLottery` at a known address.
pub struct Lottery<P> {
    provider: P,
    address: Address,
    artifact: Artifact,
}

impl<P: Provider> Lottery<P> {
    pub fn new(provider: P, address: Address, artifact: Artifact) -> Self {
        Self {
            provider,
            address,
            artifact,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether the node holds bytecode at the lottery address.
    pub async fn has_code(&self) -> Result<bool> {
        let code = self
            .provider
            .get_code_at(self.address)
            .await
            .context("eth_getCode call failed")?;
        Ok(!code.is_empty())
    }

    /// Submit `buyTicket(number, serial, useSubscription)` with the request's
    /// payment attached and wait for it to be mined.
    ///
    /// Reverts come back as [`PurchaseOutcome::Reverted`], whether the node
    /// refused the transaction up front (gas estimation) or mined it with a
    /// failed status. Any other failure is an error.
    #[instrument(skip_all, fields(number = request.number, serial = request.serial, buyer = %request.buyer))]
    pub async fn buy_ticket(&self, request: &TicketRequest) -> Result<PurchaseOutcome> {
        let input = self.artifact.encode_call(BUY_TICKET, &request.call_args())?;
        let tx = TransactionRequest::default()
            .with_from(request.buyer)
            .with_to(self.address)
            .with_value(request.payment)
            .with_input(input);

        debug!(payment = %request.payment, "Submitting buyTicket");

        let pending = match self.provider.send_transaction(tx).await {
            Ok(pending) => pending,
            Err(err) => return classify_send_error(err),
        };

        let receipt = pending
            .get_receipt()
            .await
            .context("failed to fetch buyTicket receipt")?;

        if !receipt.status() {
            warn!(tx = %receipt.transaction_hash, "buyTicket mined with failed status");
            return Ok(PurchaseOutcome::Reverted(format!(
                "transaction {} failed",
                receipt.transaction_hash
            )));
        }

        info!(tx = %receipt.transaction_hash, gas_used = receipt.gas_used, "Ticket bought");
        Ok(PurchaseOutcome::Confirmed(Box::new(receipt)))
    }

    /// Buyers named by every `BoughtTicket` log the lottery emitted in
    /// `receipt`.
    pub fn bought_ticket_buyers(&self, receipt: &TransactionReceipt) -> Result<Vec<Address>> {
        let event = self.artifact.event(BOUGHT_TICKET)?;
        let mut buyers = Vec::new();
        for log in receipt.inner.logs() {
            if log.address() != self.address {
                continue;
            }
            if let Some(buyer) = attributed_buyer(event, log.data())? {
                buyers.push(buyer);
            }
        }
        Ok(buyers)
    }
}

fn classify_send_error(err: RpcError<TransportErrorKind>) -> Result<PurchaseOutcome> {
    if let Some(payload) = err.as_error_resp() {
        if is_revert_error(payload.code, &payload.message) {
            warn!(code = payload.code, reason = %payload.message, "buyTicket reverted");
            return Ok(PurchaseOutcome::Reverted(payload.message.to_string()));
        }
    }
    Err(err).context("buyTicket submission failed")
}

/// Extract the buyer from one log if it is an `event` log.
///
/// The buyer is the input named `buyer`, or failing that the first `address`
/// input, read from the topics when indexed and from the data otherwise.
pub fn attributed_buyer(event: &Event, log: &LogData) -> Result<Option<Address>> {
    let topics = log.topics();
    if event.anonymous || topics.first() != Some(&event.selector()) {
        return Ok(None);
    }

    let position = event
        .inputs
        .iter()
        .position(|input| input.name == "buyer")
        .or_else(|| event.inputs.iter().position(|input| input.ty == "address"))
        .with_context(|| format!("{} declares no buyer input", event.name))?;
    let buyer_input = &event.inputs[position];

    let preceding = &event.inputs[..position];
    if buyer_input.indexed {
        let topic_index = 1 + preceding.iter().filter(|input| input.indexed).count();
        let topic = topics
            .get(topic_index)
            .with_context(|| format!("{} log is missing topic {topic_index}", event.name))?;
        return Ok(Some(Address::from_word(*topic)));
    }

    let body_types = event
        .inputs
        .iter()
        .filter(|input| !input.indexed)
        .map(|input| input.resolve())
        .collect::<std::result::Result<Vec<DynSolType>, _>>()
        .with_context(|| format!("unsupported {} input type", event.name))?;
    let body_index = preceding.iter().filter(|input| !input.indexed).count();

    let decoded = DynSolType::Tuple(body_types)
        .abi_decode_sequence(&log.data)
        .with_context(|| format!("failed to decode {} data", event.name))?;
    let DynSolValue::Tuple(values) = decoded else {
        anyhow::bail!("{} data did not decode to a tuple", event.name);
    };
    values
        .get(body_index)
        .and_then(DynSolValue::as_address)
        .map(Some)
        .with_context(|| format!("{} buyer is not an address", event.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::tests::lottery_artifact;
    use alloy::primitives::{B256, address};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PLAYER1: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const PLAYER2: Address = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

    #[test]
    fn draws_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let request = TicketRequest::random_with(&mut rng, PLAYER1, U256::ZERO);
            assert!(NUMBER_RANGE.contains(&request.number));
            assert!(SERIAL_RANGE.contains(&request.serial));
            assert!(!request.use_subscription);
        }
    }

    #[test]
    fn resold_ticket_keeps_number_and_serial() {
        let first = TicketRequest::random(PLAYER1, U256::from(1));
        let second = first.resold_to(PLAYER2);
        assert_eq!((first.number, first.serial), (second.number, second.serial));
        assert_eq!(second.buyer, PLAYER2);
        assert_eq!(second.payment, first.payment);
    }

    #[test]
    fn classifies_revert_messages() {
        assert!(is_revert_error(3, "execution reverted"));
        assert!(is_revert_error(
            -32000,
            "VM Exception while processing transaction: revert"
        ));
        assert!(is_revert_error(
            -32603,
            "Error: VM Exception while processing transaction: reverted with reason string 'Not enough'"
        ));
        assert!(!is_revert_error(-32000, "insufficient funds for gas * price + value"));
        assert!(!is_revert_error(-32601, "method not found"));
    }

    #[test]
    fn outcome_into_receipt_fails_on_revert() {
        let err = PurchaseOutcome::Reverted("execution reverted".into())
            .into_receipt()
            .unwrap_err();
        assert!(err.to_string().contains("execution reverted"));
    }

    #[test]
    fn buyer_from_indexed_topic() {
        let artifact = lottery_artifact();
        let event = artifact.event(BOUGHT_TICKET).unwrap();
        let body = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(7), 256),
            DynSolValue::Uint(U256::from(421), 256),
        ])
        .abi_encode_params();
        let log = LogData::new_unchecked(
            vec![event.selector(), PLAYER1.into_word()],
            body.into(),
        );

        assert_eq!(attributed_buyer(event, &log).unwrap(), Some(PLAYER1));
    }

    #[test]
    fn buyer_from_data_when_not_indexed() {
        let abi = r#"[{"type":"event","name":"BoughtTicket","anonymous":false,"inputs":[
            {"name":"round","type":"uint256","indexed":true},
            {"name":"number","type":"uint256","indexed":false},
            {"name":"buyer","type":"address","indexed":false}]}]"#;
        let artifact =
            Artifact::from_json(&format!(r#"{{"abi":{abi}}}"#), "SmartLottery").unwrap();
        let event = artifact.event(BOUGHT_TICKET).unwrap();
        let body = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(12), 256),
            DynSolValue::Address(PLAYER2),
        ])
        .abi_encode_params();
        let log = LogData::new_unchecked(
            vec![event.selector(), B256::with_last_byte(1)],
            body.into(),
        );

        assert_eq!(attributed_buyer(event, &log).unwrap(), Some(PLAYER2));
    }

    #[test]
    fn ignores_other_events() {
        let artifact = lottery_artifact();
        let event = artifact.event(BOUGHT_TICKET).unwrap();
        let log = LogData::new_unchecked(vec![B256::repeat_byte(0x11)], Default::default());
        assert_eq!(attributed_buyer(event, &log).unwrap(), None);
    }
}
