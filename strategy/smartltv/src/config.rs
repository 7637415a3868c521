//! Static pool configuration: pool, asset and pair parameters plus the liquidity table.

use std::collections::HashSet;
use std::path::Path;

use alloy::primitives::U256;
use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::liquidity::{LiquidityEntry, LiquidityTable};
use crate::types::LendingPair;

/// Parameters that apply to the entire pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolParameters {
    /// Pool owner address, `0x0` for none
    pub owner: String,
    /// Fee recipient address, `0x0` for none
    pub fee_recipient: String,
    /// Recovery period in seconds
    pub recovery_period: u64,
    /// Subscription period in seconds
    pub subscription_period: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub is_legacy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    pub address: String,
    /// Pragma feed key, e.g. "ETH/USD"
    pub pragma_key: String,
    /// Maximum price age in seconds
    pub timeout: u64,
    pub number_of_sources: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VTokenConfig {
    pub v_token_name: String,
    pub v_token_symbol: String,
}

/// Parameters that apply to one asset in the pool. Rates are per annum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetParameters {
    /// Asset identifier shared with the price history and the pair table
    pub asset_name: String,
    pub token: TokenConfig,
    pub oracle: OracleConfig,
    pub v_token: VTokenConfig,
    /// Targeted total debt denominated in this asset
    pub debt_cap: f64,
    pub floor: f64,
    pub max_utilization: f64,
    pub target_utilization: f64,
    pub min_target_utilization: f64,
    pub max_target_utilization: f64,
    pub min_full_utilization_rate: f64,
    pub max_full_utilization_rate: f64,
    pub initial_full_utilization_rate: f64,
    pub zero_utilization_rate: f64,
    /// Half-life of the rate adjustment in seconds
    pub rate_half_life: u64,
    pub target_rate_percent: f64,
    pub fee_rate: f64,
}

impl AssetParameters {
    /// Token address as a felt.
    pub fn token_address(&self) -> Result<U256> {
        parse_address(&self.asset_name, "token.address", &self.token.address)
    }

    pub fn validate(&self) -> Result<()> {
        let name = &self.asset_name;
        self.token_address()?;
        parse_address(name, "oracle.address", &self.oracle.address)?;

        if !self.debt_cap.is_finite() || self.debt_cap <= 0.0 {
            return Err(RiskError::invalid(
                name,
                format!("debt_cap must be positive, got {}", self.debt_cap),
            ));
        }
        for (field, value) in [
            ("max_utilization", self.max_utilization),
            ("target_utilization", self.target_utilization),
            ("min_target_utilization", self.min_target_utilization),
            ("max_target_utilization", self.max_target_utilization),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RiskError::invalid(
                    name,
                    format!("{field} must be in [0, 1], got {value}"),
                ));
            }
        }
        for (field, value) in [
            ("floor", self.floor),
            ("min_full_utilization_rate", self.min_full_utilization_rate),
            ("max_full_utilization_rate", self.max_full_utilization_rate),
            ("initial_full_utilization_rate", self.initial_full_utilization_rate),
            ("zero_utilization_rate", self.zero_utilization_rate),
            ("target_rate_percent", self.target_rate_percent),
            ("fee_rate", self.fee_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RiskError::invalid(
                    name,
                    format!("{field} must be non-negative, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Static parameters of a lending pair before risk derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    pub debt_asset_name: String,
    pub collateral_asset_name: String,
    /// Fraction of collateral value recovered at liquidation (0.9 = 10% discount)
    pub liquidation_discount: f64,
    /// Divisor in the SmartLTV exponent
    #[serde(serialize_with = "crate::genesis::integral")]
    pub risk_level_factor: f64,
}

impl PairConfig {
    pub fn pair(&self) -> LendingPair {
        LendingPair::new(self.debt_asset_name.clone(), self.collateral_asset_name.clone())
    }
}

/// The full static input of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolInput {
    pub pool_parameters: PoolParameters,
    pub asset_parameters: Vec<AssetParameters>,
    pub pair_parameters: Vec<PairConfig>,
    pub liquidity: Vec<LiquidityEntry>,
}

impl PoolInput {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pool input {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse pool input {}", path.display()))
    }

    pub fn asset(&self, name: &str) -> Option<&AssetParameters> {
        self.asset_parameters.iter().find(|a| a.asset_name == name)
    }

    /// Asset names in declaration order.
    pub fn asset_names(&self) -> Vec<&str> {
        self.asset_parameters
            .iter()
            .map(|a| a.asset_name.as_str())
            .collect()
    }

    pub fn liquidity_table(&self) -> Result<LiquidityTable> {
        LiquidityTable::new(&self.liquidity)
    }

    /// Checks the input as a unit: every asset and pair on its own, plus the
    /// references between them.
    pub fn validate(&self) -> Result<()> {
        parse_address("pool", "owner", &self.pool_parameters.owner)?;
        parse_address("pool", "fee_recipient", &self.pool_parameters.fee_recipient)?;

        let mut names = HashSet::new();
        for asset in &self.asset_parameters {
            if !names.insert(asset.asset_name.as_str()) {
                return Err(RiskError::invalid(&asset.asset_name, "duplicate asset parameters"));
            }
            asset.validate()?;
        }

        let mut pairs = HashSet::new();
        for config in &self.pair_parameters {
            let pair = config.pair();
            if pair.debt == pair.collateral {
                return Err(RiskError::invalid(&pair, "debt and collateral must differ"));
            }
            for asset in [&pair.debt, &pair.collateral] {
                if !names.contains(asset.as_str()) {
                    return Err(RiskError::missing(
                        &pair,
                        format!("asset {asset} has no asset parameters"),
                    ));
                }
            }
            if !(config.liquidation_discount > 0.0 && config.liquidation_discount <= 1.0) {
                return Err(RiskError::invalid(
                    &pair,
                    format!(
                        "liquidation_discount must be in (0, 1], got {}",
                        config.liquidation_discount
                    ),
                ));
            }
            if !config.risk_level_factor.is_finite() || config.risk_level_factor <= 0.0 {
                return Err(RiskError::invalid(
                    &pair,
                    format!(
                        "risk_level_factor must be positive, got {}",
                        config.risk_level_factor
                    ),
                ));
            }
            if !pairs.insert(pair.clone()) {
                return Err(RiskError::invalid(&pair, "duplicate pair parameters"));
            }
        }

        self.liquidity_table()?;
        Ok(())
    }
}

fn parse_address(subject: &str, field: &str, value: &str) -> Result<U256> {
    utils::parse_felt(value).ok_or_else(|| {
        RiskError::invalid(subject, format!("{field} {value:?} is not a valid felt"))
    })
}
