//! DEX liquidity available per lending pair at a given price-impact depth.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::types::LendingPair;

/// One row of the liquidity table as it appears in the pool input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityEntry {
    pub depth: f64,
    pub debt_asset_name: String,
    pub collateral_asset_name: String,
    pub liquidity: f64,
}

impl LiquidityEntry {
    pub fn pair(&self) -> LendingPair {
        LendingPair::new(self.debt_asset_name.clone(), self.collateral_asset_name.clone())
    }
}

/// Bit pattern of a depth in `[0, 1]`. Rows match only on the exact value;
/// `-0.0` folds into `0.0`.
fn depth_key(depth: f64) -> Option<u64> {
    if !(0.0..=1.0).contains(&depth) {
        return None;
    }
    Some((depth + 0.0).to_bits())
}

/// Exact-match lookup table `(debt, collateral, depth) -> liquidity`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiquidityTable {
    rows: BTreeMap<(LendingPair, u64), f64>,
}

impl LiquidityTable {
    pub fn new(entries: &[LiquidityEntry]) -> Result<Self> {
        let mut rows = BTreeMap::new();
        for entry in entries {
            let pair = entry.pair();
            let key = depth_key(entry.depth).ok_or_else(|| {
                RiskError::invalid(
                    &pair,
                    format!("liquidity depth {} is not a fraction in [0, 1]", entry.depth),
                )
            })?;
            if !entry.liquidity.is_finite() || entry.liquidity <= 0.0 {
                return Err(RiskError::invalid(
                    &pair,
                    format!("liquidity {} at depth {} must be positive", entry.liquidity, entry.depth),
                ));
            }
            if rows.insert((pair.clone(), key), entry.liquidity).is_some() {
                return Err(RiskError::invalid(
                    &pair,
                    format!("duplicate liquidity row at depth {}", entry.depth),
                ));
            }
        }
        Ok(Self { rows })
    }

    /// Liquidity of `pair` at exactly `depth`. Never interpolated or defaulted.
    pub fn lookup(&self, pair: &LendingPair, depth: f64) -> Result<f64> {
        depth_key(depth)
            .and_then(|key| self.rows.get(&(pair.clone(), key)).copied())
            .ok_or_else(|| RiskError::missing(pair, format!("no liquidity row at depth {depth}")))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(depth: f64, liquidity: f64) -> LiquidityEntry {
        LiquidityEntry {
            depth,
            debt_asset_name: "ethereum".to_string(),
            collateral_asset_name: "usd-coin".to_string(),
            liquidity,
        }
    }

    fn pair() -> LendingPair {
        LendingPair::new("ethereum", "usd-coin")
    }

    #[test]
    fn rounded_discount_selects_exact_row() {
        let table = LiquidityTable::new(&[entry(0.05, 1_200_000.0), entry(0.1, 1_700_000.0)]).unwrap();
        let depth = utils::round_decimals(1.0 - 0.9, 2);
        assert_eq!(table.lookup(&pair(), depth).unwrap(), 1_700_000.0);
        assert_eq!(table.lookup(&pair(), 0.05).unwrap(), 1_200_000.0);
    }

    #[test]
    fn missing_depth_is_missing_data() {
        let table = LiquidityTable::new(&[entry(0.05, 1_200_000.0), entry(0.1, 1_700_000.0)]).unwrap();
        let err = table.lookup(&pair(), 0.15).unwrap_err();
        assert!(matches!(err, RiskError::MissingData { .. }));
        assert!(err.to_string().contains("collateral=usd-coin"));
    }

    #[test]
    fn nearby_depth_is_not_selected() {
        let table = LiquidityTable::new(&[entry(0.1 + 1e-12, 1_700_000.0)]).unwrap();
        let err = table.lookup(&pair(), 0.1).unwrap_err();
        assert!(matches!(err, RiskError::MissingData { .. }));
    }

    #[test]
    fn zero_depth_row_serves_full_discount() {
        let table = LiquidityTable::new(&[entry(0.0, 900_000.0)]).unwrap();
        let depth = utils::round_decimals(1.0 - 1.0, 2);
        assert_eq!(table.lookup(&pair(), depth).unwrap(), 900_000.0);
        assert_eq!(table.lookup(&pair(), -0.0).unwrap(), 900_000.0);
    }

    #[test]
    fn direction_matters() {
        let table = LiquidityTable::new(&[entry(0.1, 1_700_000.0)]).unwrap();
        let reversed = LendingPair::new("usd-coin", "ethereum");
        assert!(table.lookup(&reversed, 0.1).is_err());
    }

    #[test]
    fn rejects_bad_rows() {
        assert!(matches!(
            LiquidityTable::new(&[entry(0.1, 0.0)]),
            Err(RiskError::InvalidParameter { .. })
        ));
        for depth in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                LiquidityTable::new(&[entry(depth, 1.0)]),
                Err(RiskError::InvalidParameter { .. })
            ));
        }
        assert!(matches!(
            LiquidityTable::new(&[entry(0.1, 1.0), entry(0.1, 2.0)]),
            Err(RiskError::InvalidParameter { .. })
        ));
    }
}
