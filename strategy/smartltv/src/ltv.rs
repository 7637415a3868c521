//! SmartLTV calculator
//!
//! Derives a pair's maximum loan-to-value ratio from the collateral's
//! worst-case volatility against the debt asset, the DEX liquidity available
//! at the liquidation price impact, and the debt asset's cap:
//!
//! ```text
//! discount = round(1 - liquidation_discount, 2)
//! max_ltv  = round(exp(-(1 / r) * sigma / sqrt(l / d)) - discount, 2)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{AssetParameters, PairConfig};
use crate::error::{Result, RiskError};
use crate::liquidity::LiquidityTable;
use crate::types::LendingPair;
use crate::volatility::VolatilityTable;

/// Shutdown threshold written for every pair.
pub const SHUTDOWN_LTV: f64 = 1.0;

const SUBJECT: &str = "smartltv inputs";

/// Inputs of the SmartLTV formula for one lending pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LtvInputs {
    /// Worst-case volatility of collateral priced in debt
    pub volatility: f64,
    /// Fraction of collateral value recovered at liquidation, in (0, 1]
    pub liquidation_discount: f64,
    /// Divisor in the exponent; larger is more conservative
    pub risk_level_factor: f64,
    /// Liquidity available at the price-impact depth
    pub liquidity: f64,
    /// Target total debt of the debt asset
    pub debt_cap: f64,
}

/// Result of the SmartLTV formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LtvOutcome {
    /// Price-impact depth, `round(1 - liquidation_discount, 2)`
    pub discount: f64,
    pub exponent: f64,
    pub max_ltv: f64,
    #[serde(serialize_with = "crate::genesis::integral")]
    pub shutdown_ltv: f64,
}

impl LtvOutcome {
    /// Whether `max_ltv` lies in `[0, liquidation_discount]`.
    pub fn in_range(&self, liquidation_discount: f64) -> bool {
        (0.0..=liquidation_discount).contains(&self.max_ltv)
    }
}

/// Price-impact depth at which liquidity is looked up, rounded to 2 decimals.
pub fn price_impact_depth(liquidation_discount: f64) -> f64 {
    utils::round_decimals(1.0 - liquidation_discount, 2)
}

fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RiskError::invalid(SUBJECT, format!("{name} must be positive, got {value}")))
    }
}

/// Evaluates the SmartLTV formula. The result is not clamped.
pub fn compute_max_ltv(inputs: &LtvInputs) -> Result<LtvOutcome> {
    if !inputs.volatility.is_finite() || inputs.volatility < 0.0 {
        return Err(RiskError::invalid(
            SUBJECT,
            format!("volatility must be a non-negative number, got {}", inputs.volatility),
        ));
    }
    if !(inputs.liquidation_discount > 0.0 && inputs.liquidation_discount <= 1.0) {
        return Err(RiskError::invalid(
            SUBJECT,
            format!("liquidation_discount must be in (0, 1], got {}", inputs.liquidation_discount),
        ));
    }
    ensure_positive("risk_level_factor", inputs.risk_level_factor)?;
    ensure_positive("liquidity", inputs.liquidity)?;
    ensure_positive("debt_cap", inputs.debt_cap)?;

    let discount = price_impact_depth(inputs.liquidation_discount);
    let exponent = (1.0 / inputs.risk_level_factor)
        * (inputs.volatility / (inputs.liquidity / inputs.debt_cap).sqrt());
    let max_ltv = utils::round_decimals((-exponent).exp() - discount, 2);

    Ok(LtvOutcome {
        discount,
        exponent,
        max_ltv,
        shutdown_ltv: SHUTDOWN_LTV,
    })
}

/// A pair's static configuration enriched with the derived thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairParameters {
    #[serde(flatten)]
    pub config: PairConfig,
    pub max_ltv: f64,
    pub shutdown_ltv: f64,
}

/// Advisory: a derived `max_ltv` outside `[0, liquidation_discount]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeWarning {
    pub pair: LendingPair,
    pub max_ltv: f64,
    pub liquidation_discount: f64,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: max_ltv {} outside [0, {}]",
            self.pair, self.max_ltv, self.liquidation_discount
        )
    }
}

/// Enriched pairs in input order plus any range warnings raised along the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Derivation {
    pub pairs: Vec<PairParameters>,
    pub warnings: Vec<RangeWarning>,
}

/// Runs the calculator over every configured pair.
///
/// Fails on the first pair whose volatility, liquidity or debt cap is missing
/// or invalid; there is no partial result.
pub fn derive_pair_parameters(
    pairs: &[PairConfig],
    assets: &[AssetParameters],
    volatility: &VolatilityTable,
    liquidity: &LiquidityTable,
) -> Result<Derivation> {
    let mut derivation = Derivation::default();

    for config in pairs {
        let pair = config.pair();
        let debt_cap = assets
            .iter()
            .find(|a| a.asset_name == pair.debt)
            .map(|a| a.debt_cap)
            .ok_or_else(|| RiskError::missing(&pair, "debt asset has no asset parameters"))?;
        let sigma = volatility
            .get(&pair.collateral_price())
            .map_err(|e| e.for_pair(&pair))?;
        let depth = price_impact_depth(config.liquidation_discount);
        let available = liquidity.lookup(&pair, depth)?;

        let outcome = compute_max_ltv(&LtvInputs {
            volatility: sigma,
            liquidation_discount: config.liquidation_discount,
            risk_level_factor: config.risk_level_factor,
            liquidity: available,
            debt_cap,
        })
        .map_err(|e| e.for_pair(&pair))?;

        info!(
            debt = %pair.debt,
            collateral = %pair.collateral,
            volatility = sigma,
            depth,
            liquidity = available,
            max_ltv = outcome.max_ltv,
            "derived max ltv"
        );
        if !outcome.in_range(config.liquidation_discount) {
            let warning = RangeWarning {
                pair: pair.clone(),
                max_ltv: outcome.max_ltv,
                liquidation_discount: config.liquidation_discount,
            };
            warn!(%warning, "max ltv out of range");
            derivation.warnings.push(warning);
        }

        derivation.pairs.push(PairParameters {
            config: config.clone(),
            max_ltv: outcome.max_ltv,
            shutdown_ltv: outcome.shutdown_ltv,
        });
    }

    Ok(derivation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> LtvInputs {
        LtvInputs {
            volatility: 0.05,
            liquidation_discount: 0.9,
            risk_level_factor: 5.0,
            liquidity: 1_700_000.0,
            debt_cap: 50_000_000.0,
        }
    }

    #[test]
    fn reference_example() {
        let out = compute_max_ltv(&inputs()).unwrap();
        assert_eq!(out.discount, 0.1);
        assert!((out.exponent - 0.0542326).abs() < 1e-6);
        assert_eq!(out.max_ltv, 0.85);
        assert_eq!(out.shutdown_ltv, 1.0);
        assert!(out.in_range(0.9));
    }

    #[test]
    fn deterministic() {
        assert_eq!(compute_max_ltv(&inputs()), compute_max_ltv(&inputs()));
    }

    #[test]
    fn zero_volatility_gives_one_minus_discount() {
        let out = compute_max_ltv(&LtvInputs {
            volatility: 0.0,
            liquidation_discount: 0.95,
            ..inputs()
        })
        .unwrap();
        assert_eq!(out.discount, 0.05);
        assert_eq!(out.max_ltv, 0.95);
    }

    #[test]
    fn zero_liquidity_is_invalid() {
        let err = compute_max_ltv(&LtvInputs {
            liquidity: 0.0,
            ..inputs()
        })
        .unwrap_err();
        assert!(matches!(err, RiskError::InvalidParameter { .. }));
        assert!(err.to_string().contains("liquidity"));
    }

    #[test]
    fn non_positive_parameters_are_invalid() {
        for bad in [
            LtvInputs { debt_cap: 0.0, ..inputs() },
            LtvInputs { debt_cap: -1.0, ..inputs() },
            LtvInputs { risk_level_factor: 0.0, ..inputs() },
            LtvInputs { risk_level_factor: -5.0, ..inputs() },
            LtvInputs { liquidation_discount: 0.0, ..inputs() },
            LtvInputs { liquidation_discount: 1.2, ..inputs() },
            LtvInputs { volatility: f64::NAN, ..inputs() },
        ] {
            assert!(matches!(
                compute_max_ltv(&bad),
                Err(RiskError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn extreme_volatility_is_not_clamped() {
        let out = compute_max_ltv(&LtvInputs {
            volatility: 2.0,
            risk_level_factor: 1.0,
            liquidity: 100_000.0,
            ..inputs()
        })
        .unwrap();
        assert_eq!(out.max_ltv, -0.1);
        assert!(!out.in_range(0.9));
    }

    #[test]
    fn full_recovery_reads_zero_depth_liquidity() {
        use crate::config::tests::{asset, pair_config};
        use crate::liquidity::LiquidityEntry;
        use crate::prices::tests::series;
        use crate::prices::PriceMatrix;

        let config = PairConfig {
            liquidation_discount: 1.0,
            ..pair_config("eth", "usdc")
        };
        let liquidity = LiquidityTable::new(&[LiquidityEntry {
            depth: 0.0,
            debt_asset_name: "eth".to_string(),
            collateral_asset_name: "usdc".to_string(),
            liquidity: 1_700_000.0,
        }])
        .unwrap();
        let prices = PriceMatrix::outer_join(&[
            series("eth", &[(1, 1.0), (2, 1.0)]),
            series("usdc", &[(1, 1.0), (2, 1.0)]),
        ])
        .unwrap();
        let volatility = VolatilityTable::estimate(&prices);

        let derivation = derive_pair_parameters(
            &[config],
            &[asset("eth", "0x49d3"), asset("usdc", "0x53c9")],
            &volatility,
            &liquidity,
        )
        .unwrap();
        assert_eq!(price_impact_depth(1.0), 0.0);
        assert_eq!(derivation.pairs[0].max_ltv, 1.0);
        assert!(derivation.warnings.is_empty());
    }
}
