//! Worst-case pairwise volatility.
//!
//! For every ordered pair of assets the pairwise price `price(base) / price(quote)`
//! is derived from the joined price matrix, converted to daily log-returns, and
//! reduced to the magnitude of the single worst return over the whole history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Result, RiskError};
use crate::prices::PriceMatrix;
use crate::types::PricePair;

/// A derived value at one matrix timestamp; `None` where it is undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Pairwise price series of `pair`, one entry per matrix row.
///
/// Rows where either asset has no price yield `None`.
pub fn pairwise_prices(matrix: &PriceMatrix, pair: &PricePair) -> Result<Vec<Observation>> {
    let base = matrix
        .column(&pair.base)
        .ok_or_else(|| RiskError::missing(pair, format!("no price series for {}", pair.base)))?;
    let quote = matrix
        .column(&pair.quote)
        .ok_or_else(|| RiskError::missing(pair, format!("no price series for {}", pair.quote)))?;

    Ok(matrix
        .rows()
        .iter()
        .map(|row| Observation {
            timestamp: row.timestamp,
            value: row.prices[base]
                .zip(row.prices[quote])
                .map(|(b, q)| b / q),
        })
        .collect())
}

/// Log-returns between consecutive rows, starting at the second row.
///
/// A return is undefined when either endpoint is undefined; returns never
/// bridge a gap.
pub fn log_returns(series: &[Observation]) -> Vec<Observation> {
    series
        .windows(2)
        .map(|w| Observation {
            timestamp: w[1].timestamp,
            value: w[1]
                .value
                .zip(w[0].value)
                .map(|(current, previous)| (current / previous).ln()),
        })
        .collect()
}

/// Magnitude of the most negative defined return, `None` if no return is defined.
pub fn worst_case_volatility(returns: &[Observation]) -> Option<f64> {
    returns
        .iter()
        .filter_map(|r| r.value)
        .fold(None, |worst: Option<f64>, r| Some(worst.map_or(r, |w| w.min(r))))
        .map(f64::abs)
}

/// Worst-case volatility for every ordered pair of distinct matrix assets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VolatilityTable {
    values: BTreeMap<PricePair, Option<f64>>,
}

impl VolatilityTable {
    /// Runs the estimator over all permutations of the matrix's assets.
    pub fn estimate(matrix: &PriceMatrix) -> Self {
        let mut values = BTreeMap::new();
        for base in matrix.assets() {
            for quote in matrix.assets() {
                if base == quote {
                    continue;
                }
                let pair = PricePair::new(base.clone(), quote.clone());
                let volatility = pairwise_prices(matrix, &pair)
                    .ok()
                    .and_then(|prices| worst_case_volatility(&log_returns(&prices)));
                debug!(%pair, ?volatility, "estimated worst-case volatility");
                values.insert(pair, volatility);
            }
        }
        Self { values }
    }

    /// Volatility of `pair`; undefined or unknown pairs are missing data.
    pub fn get(&self, pair: &PricePair) -> Result<f64> {
        match self.values.get(pair) {
            Some(Some(volatility)) => Ok(*volatility),
            Some(None) => Err(RiskError::missing(
                pair,
                "volatility undefined: fewer than two aligned observations",
            )),
            None => Err(RiskError::missing(pair, "no volatility estimated for pair")),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PricePair, Option<f64>)> {
        self.values.iter().map(|(pair, v)| (pair, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::tests::series;
    use crate::prices::PriceSeries;

    fn matrix(columns: Vec<PriceSeries>) -> PriceMatrix {
        PriceMatrix::outer_join(&columns).unwrap()
    }

    #[test]
    fn constant_ratio_has_zero_volatility() {
        let m = matrix(vec![
            series("eth", &[(1, 100.0), (2, 200.0), (3, 50.0)]),
            series("steth", &[(1, 200.0), (2, 400.0), (3, 100.0)]),
        ]);
        let table = VolatilityTable::estimate(&m);
        let vol = table.get(&PricePair::new("eth", "steth")).unwrap();
        assert!(vol.abs() < 1e-12);
    }

    #[test]
    fn volatility_is_worst_negative_move() {
        let m = matrix(vec![
            series("eth", &[(1, 100.0), (2, 80.0), (3, 90.0), (4, 45.0)]),
            series("usdc", &[(1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0)]),
        ]);
        let table = VolatilityTable::estimate(&m);
        let vol = table.get(&PricePair::new("eth", "usdc")).unwrap();
        assert!((vol - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn pairwise_prices_are_reciprocal_and_volatility_asymmetric() {
        let m = matrix(vec![
            series("eth", &[(1, 1.0), (2, 2.0), (3, 3.0)]),
            series("usdc", &[(1, 1.0), (2, 1.0), (3, 1.0)]),
        ]);
        let forward = PricePair::new("eth", "usdc");
        let up = pairwise_prices(&m, &forward).unwrap();
        let down = pairwise_prices(&m, &forward.inverse()).unwrap();
        for (a, b) in up.iter().zip(&down) {
            assert!((a.value.unwrap() - 1.0 / b.value.unwrap()).abs() < 1e-12);
        }

        let table = VolatilityTable::estimate(&m);
        let eth_usdc = table.get(&forward).unwrap();
        let usdc_eth = table.get(&forward.inverse()).unwrap();
        assert!((eth_usdc - 1.5_f64.ln()).abs() < 1e-12);
        assert!((usdc_eth - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn gaps_are_excluded_not_zeroed() {
        let m = matrix(vec![
            series("eth", &[(1, 100.0), (2, 50.0), (3, 60.0), (4, 66.0)]),
            series("strk", &[(1, 1.0), (3, 1.0), (4, 1.0)]),
        ]);
        let pair = PricePair::new("eth", "strk");
        let returns = log_returns(&pairwise_prices(&m, &pair).unwrap());
        assert_eq!(returns.len(), 3);
        assert_eq!(returns[0].value, None);
        assert_eq!(returns[1].value, None);

        let vol = VolatilityTable::estimate(&m).get(&pair).unwrap();
        assert!((vol - 1.1_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn single_aligned_observation_is_missing_data() {
        let m = matrix(vec![
            series("eth", &[(1, 100.0), (2, 110.0)]),
            series("strk", &[(2, 1.0), (3, 1.2)]),
        ]);
        let table = VolatilityTable::estimate(&m);
        assert_eq!(table.len(), 2);
        let err = table.get(&PricePair::new("strk", "eth")).unwrap_err();
        assert!(matches!(err, RiskError::MissingData { .. }));
        assert!(err.to_string().contains("strk/eth"));
    }

    #[test]
    fn unknown_asset_is_missing_data() {
        let m = matrix(vec![series("eth", &[(1, 1.0), (2, 1.0)])]);
        assert!(VolatilityTable::estimate(&m).is_empty());
        let err = pairwise_prices(&m, &PricePair::new("eth", "dai")).unwrap_err();
        assert!(matches!(err, RiskError::MissingData { .. }));
    }

    #[test]
    fn volatility_is_never_negative() {
        let m = matrix(vec![
            series("a", &[(1, 3.0), (2, 7.0), (3, 2.0), (4, 9.0), (5, 4.0)]),
            series("b", &[(1, 5.0), (2, 1.0), (3, 8.0), (4, 2.0), (5, 6.0)]),
            series("c", &[(1, 1.0), (2, 2.0), (3, 4.0), (4, 8.0), (5, 16.0)]),
        ]);
        let table = VolatilityTable::estimate(&m);
        assert_eq!(table.len(), 6);
        for (_, vol) in table.iter() {
            assert!(vol.unwrap() >= 0.0);
        }
    }
}
