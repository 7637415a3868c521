//! Pool configuration generator
//!
//! Runs the volatility estimator over the price history, derives every
//! configured pair's max LTV and assembles the genesis artifact.

use tracing::info;

use crate::config::PoolInput;
use crate::error::Result;
use crate::genesis::GenesisConfig;
use crate::liquidity::LiquidityTable;
use crate::ltv::{derive_pair_parameters, RangeWarning};
use crate::prices::PriceMatrix;
use crate::volatility::VolatilityTable;

/// Everything a generation run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub genesis: GenesisConfig,
    pub volatility: VolatilityTable,
    /// Pairs whose max LTV fell outside `[0, liquidation_discount]`
    pub warnings: Vec<RangeWarning>,
}

/// SmartLTV pool configuration generator
///
/// Holds a validated pool input; each run is a pure function of that input
/// and a price matrix.
pub struct SmartLtvGenerator {
    input: PoolInput,
    liquidity: LiquidityTable,
}

impl SmartLtvGenerator {
    /// Validates `input` and prepares its liquidity table.
    pub fn new(input: PoolInput) -> Result<Self> {
        input.validate()?;
        let liquidity = input.liquidity_table()?;
        Ok(Self { input, liquidity })
    }

    pub fn input(&self) -> &PoolInput {
        &self.input
    }

    /// Derives risk parameters from `prices` and builds the genesis artifact.
    ///
    /// Only series of pool assets take part; rows holding nothing but other
    /// assets' prices are dropped before estimation.
    pub fn run(&self, prices: &PriceMatrix) -> Result<GenerationReport> {
        let prices = prices.select(&self.input.asset_names());
        let volatility = VolatilityTable::estimate(&prices);
        info!(
            assets = prices.assets().len(),
            rows = prices.rows().len(),
            pairs = volatility.len(),
            "estimated pairwise volatility"
        );

        let derivation = derive_pair_parameters(
            &self.input.pair_parameters,
            &self.input.asset_parameters,
            &volatility,
            &self.liquidity,
        )?;
        let genesis = GenesisConfig::build(&self.input, &derivation.pairs)?;
        info!(
            pairs = genesis.pair_parameters.len(),
            warnings = derivation.warnings.len(),
            "built genesis config"
        );

        Ok(GenerationReport {
            genesis,
            volatility,
            warnings: derivation.warnings,
        })
    }
}
