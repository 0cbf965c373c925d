//! Price-feed reads and dollar-to-native ticket cost conversion.

use alloy::primitives::utils::{ParseUnits, parse_units};
use alloy::primitives::{Address, I256, U256};
use alloy::providers::Provider;
use alloy::sol;
use anyhow::{Context, Result};
use tracing::{debug, instrument};

/// Decimals of the chain's native currency (MATIC / ETH).
pub const NATIVE_DECIMALS: u8 = 18;

sol! {
    /// Chainlink aggregator proxy interface.
    #[sol(rpc)]
    interface AggregatorV3Interface {
        function decimals() external view returns (uint8);
        function description() external view returns (string memory);
        function version() external view returns (uint256);
        function getRoundData(uint80 _roundId) external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );
        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );
    }
}

/// One round of price-feed data together with the feed's decimals.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    pub round_id: u128,
    pub answer: I256,
    pub started_at: U256,
    pub updated_at: U256,
    pub answered_in_round: u128,
    pub decimals: u8,
}

/// Read the latest round and decimals from the feed proxy at `feed`.
#[instrument(skip(provider))]
pub async fn fetch_snapshot<P: Provider>(provider: P, feed: Address) -> Result<PriceSnapshot> {
    let aggregator = AggregatorV3Interface::new(feed, provider);

    let round = aggregator
        .latestRoundData()
        .call()
        .await
        .context("latestRoundData call failed")?;
    let decimals = aggregator
        .decimals()
        .call()
        .await
        .context("decimals call failed")?;

    let snapshot = PriceSnapshot {
        round_id: round.roundId.to::<u128>(),
        answer: round.answer,
        started_at: round.startedAt,
        updated_at: round.updatedAt,
        answered_in_round: round.answeredInRound.to::<u128>(),
        decimals,
    };
    debug!(?snapshot, "Fetched price feed round");
    Ok(snapshot)
}

/// Scale the feed answer to native-currency decimals and express it in whole
/// dollars per native unit.
pub fn reference_price(snapshot: &PriceSnapshot) -> Result<f64> {
    let answer: f64 = snapshot
        .answer
        .to_string()
        .parse()
        .context("feed answer is not representable as f64")?;
    let shift = i32::from(NATIVE_DECIMALS) - i32::from(snapshot.decimals);
    let one_native = 10f64.powi(i32::from(NATIVE_DECIMALS));
    Ok(answer * 10f64.powi(shift) / one_native)
}

/// Native-currency amount that buys `dollars` worth of tickets at `price`.
///
/// Prices below one are multiplied rather than divided.
pub fn ticket_cost(dollars: f64, price: f64) -> f64 {
    if price < 1.0 {
        dollars * price
    } else {
        dollars / price
    }
}

/// Convert a whole-unit native amount to wei, truncating past 18 decimals.
///
/// Uses the shortest decimal form of `amount`, so `0.1` becomes exactly
/// `10^17` wei rather than picking up binary rounding noise.
pub fn to_wei(amount: f64) -> Result<U256> {
    anyhow::ensure!(
        amount.is_finite() && amount >= 0.0,
        "cannot convert {amount} to wei"
    );
    let shortest = amount.to_string();
    let formatted = truncate_fraction(&shortest, usize::from(NATIVE_DECIMALS));
    let parsed: ParseUnits = parse_units(formatted, NATIVE_DECIMALS)
        .with_context(|| format!("failed to convert {formatted} to wei"))?;
    Ok(parsed.into())
}

/// Drop fractional digits beyond `max_digits`.
fn truncate_fraction(decimal: &str, max_digits: usize) -> &str {
    match decimal.split_once('.') {
        Some((whole, fraction)) if fraction.len() > max_digits => {
            &decimal[..whole.len() + 1 + max_digits]
        }
        _ => decimal,
    }
}

/// Wei required to pay `dollars` at `price`.
pub fn ticket_cost_wei(dollars: f64, price: f64) -> Result<U256> {
    to_wei(ticket_cost(dollars, price))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(answer: i64, decimals: u8) -> PriceSnapshot {
        PriceSnapshot {
            round_id: 1,
            answer: I256::try_from(answer).unwrap(),
            started_at: U256::ZERO,
            updated_at: U256::ZERO,
            answered_in_round: 1,
            decimals,
        }
    }

    #[test]
    fn reference_price_scales_by_feed_decimals() {
        // 0.85 USD with 8 feed decimals.
        let price = reference_price(&snapshot(85_000_000, 8)).unwrap();
        assert!((price - 0.85).abs() < 1e-12);

        // 1843.5 USD with 8 feed decimals.
        let price = reference_price(&snapshot(184_350_000_000, 8)).unwrap();
        assert!((price - 1843.5).abs() < 1e-9);

        // 1.8435 USD with 18 feed decimals.
        let price = reference_price(&snapshot(1_843_500_000_000_000_000, 18)).unwrap();
        assert!((price - 1.8435).abs() < 1e-12);
    }

    #[test]
    fn cost_branches_on_price_below_one() {
        assert!((ticket_cost(10.0, 0.5) - 5.0).abs() < 1e-12);
        assert!((ticket_cost(10.0, 2.0) - 5.0).abs() < 1e-12);
        assert!((ticket_cost(10.0, 1.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn cost_is_monotonic_in_price() {
        let prices_above_one = [1.0, 1.5, 2.0, 10.0, 1843.5];
        for pair in prices_above_one.windows(2) {
            assert!(ticket_cost(10.0, pair[1]) < ticket_cost(10.0, pair[0]));
        }

        let prices_below_one = [0.01, 0.2, 0.5, 0.85, 0.99];
        for pair in prices_below_one.windows(2) {
            assert!(ticket_cost(10.0, pair[1]) > ticket_cost(10.0, pair[0]));
        }
    }

    #[test]
    fn wei_conversion() {
        assert_eq!(to_wei(0.0).unwrap(), U256::ZERO);
        assert_eq!(to_wei(1.0).unwrap(), U256::from(10u64).pow(U256::from(18)));
        assert_eq!(to_wei(8.5).unwrap(), U256::from(8_500_000_000_000_000_000u128));
        assert!(to_wei(-1.0).is_err());
        assert!(to_wei(f64::NAN).is_err());
    }

    #[test]
    fn wei_conversion_uses_shortest_decimal_form() {
        assert_eq!(to_wei(0.1).unwrap(), U256::from(100_000_000_000_000_000u64));
        assert_eq!(to_wei(0.3).unwrap(), U256::from(300_000_000_000_000_000u64));
        // At most 17 significant digits, two of them before the point.
        let wei = to_wei(10.0 / 0.85).unwrap();
        assert_eq!(wei % U256::from(1_000u64), U256::ZERO);
        assert!(wei > U256::from(11_764_705_882_352_000_000u128));
        assert!(wei < U256::from(11_764_705_882_353_000_000u128));
    }

    #[test]
    fn wei_conversion_truncates_past_eighteen_decimals() {
        assert_eq!(truncate_fraction("0.0000000000000000019", 18), "0.000000000000000001");
        assert_eq!(truncate_fraction("12.5", 18), "12.5");
        assert_eq!(truncate_fraction("3", 18), "3");
        assert_eq!(to_wei(1.9e-18).unwrap(), U256::from(1));
    }

    #[test]
    fn eight_dollars_costs_less_than_ten() {
        for price in [0.3, 0.85, 1.2, 1843.5] {
            let eight = ticket_cost_wei(8.0, price).unwrap();
            let ten = ticket_cost_wei(10.0, price).unwrap();
            assert!(eight < ten, "price {price}");
            assert!(eight > U256::ZERO);
        }
    }
}
