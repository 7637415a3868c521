//! Genesis configuration artifact consumed by the pool deployment scripts.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{AssetParameters, OracleConfig, PoolInput, PoolParameters, TokenConfig, VTokenConfig};
use crate::error::{Result, RiskError};
use crate::ltv::PairParameters;

/// Asset parameters as written to the artifact: rates per second as
/// fixed-point decimal strings, addresses as 64-digit felts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisAsset {
    pub asset_name: String,
    pub token: TokenConfig,
    pub oracle: OracleConfig,
    pub v_token: VTokenConfig,
    #[serde(serialize_with = "integral")]
    pub debt_cap: f64,
    #[serde(serialize_with = "integral")]
    pub floor: f64,
    pub max_utilization: f64,
    pub target_utilization: f64,
    pub min_target_utilization: f64,
    pub max_target_utilization: f64,
    pub min_full_utilization_rate: String,
    pub max_full_utilization_rate: String,
    pub initial_full_utilization_rate: String,
    pub zero_utilization_rate: String,
    pub rate_half_life: u64,
    pub target_rate_percent: f64,
    #[serde(serialize_with = "integral")]
    pub fee_rate: f64,
}

impl GenesisAsset {
    fn from_parameters(asset: &AssetParameters) -> Result<Self> {
        let token = TokenConfig {
            address: normalize(&asset.asset_name, &asset.token.address)?,
            ..asset.token.clone()
        };
        let oracle = OracleConfig {
            address: normalize(&asset.asset_name, &asset.oracle.address)?,
            ..asset.oracle.clone()
        };
        Ok(Self {
            asset_name: asset.asset_name.clone(),
            token,
            oracle,
            v_token: asset.v_token.clone(),
            debt_cap: asset.debt_cap,
            floor: asset.floor,
            max_utilization: asset.max_utilization,
            target_utilization: asset.target_utilization,
            min_target_utilization: asset.min_target_utilization,
            max_target_utilization: asset.max_target_utilization,
            min_full_utilization_rate: utils::per_second_rate_string(asset.min_full_utilization_rate),
            max_full_utilization_rate: utils::per_second_rate_string(asset.max_full_utilization_rate),
            initial_full_utilization_rate: utils::per_second_rate_string(
                asset.initial_full_utilization_rate,
            ),
            zero_utilization_rate: utils::per_second_rate_string(asset.zero_utilization_rate),
            rate_half_life: asset.rate_half_life,
            target_rate_percent: asset.target_rate_percent,
            fee_rate: asset.fee_rate,
        })
    }
}

/// Derived pair parameters with the token addresses of both assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisPair {
    #[serde(flatten)]
    pub parameters: PairParameters,
    pub debt_asset: String,
    pub collateral_asset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub asset_parameters: Vec<GenesisAsset>,
    pub pair_parameters: Vec<GenesisPair>,
    pub pool_parameters: PoolParameters,
}

impl GenesisConfig {
    /// Merges derived pair parameters with the static asset and pool parameters.
    pub fn build(input: &PoolInput, pairs: &[PairParameters]) -> Result<Self> {
        let asset_parameters = input
            .asset_parameters
            .iter()
            .map(GenesisAsset::from_parameters)
            .collect::<Result<Vec<_>>>()?;

        let pair_parameters = pairs
            .iter()
            .map(|parameters| -> Result<GenesisPair> {
                let pair = parameters.config.pair();
                let address_of = |name: &str| {
                    input
                        .asset(name)
                        .ok_or_else(|| {
                            RiskError::missing(&pair, format!("asset {name} has no asset parameters"))
                        })
                        .and_then(|asset| normalize(name, &asset.token.address))
                };
                Ok(GenesisPair {
                    debt_asset: address_of(&pair.debt)?,
                    collateral_asset: address_of(&pair.collateral)?,
                    parameters: parameters.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let pool = &input.pool_parameters;
        let pool_parameters = PoolParameters {
            owner: normalize("pool", &pool.owner)?,
            fee_recipient: normalize("pool", &pool.fee_recipient)?,
            ..pool.clone()
        };

        Ok(Self {
            asset_parameters,
            pair_parameters,
            pool_parameters,
        })
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize genesis config")
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write genesis config {}", path.display()))
    }
}

/// Writes whole numbers below 2^53 as JSON integers, anything else as a float.
pub(crate) fn integral<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn normalize(subject: &str, address: &str) -> Result<String> {
    utils::parse_felt(address)
        .map(utils::format_felt)
        .ok_or_else(|| RiskError::invalid(subject, format!("address {address:?} is not a valid felt")))
}
