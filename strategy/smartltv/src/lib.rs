//! SmartLTV risk parameters for lending pools.
//!
//! Derives maximum loan-to-value ratios from historical prices and DEX
//! liquidity, and assembles the genesis configuration of a lending pool.

pub mod config;
mod error;
mod generator;
pub mod genesis;
pub mod liquidity;
pub mod ltv;
pub mod prices;
mod types;
pub mod volatility;

pub use config::{AssetParameters, PairConfig, PoolInput, PoolParameters};
pub use error::{Result, RiskError};
pub use generator::{GenerationReport, SmartLtvGenerator};
pub use genesis::GenesisConfig;
pub use liquidity::{LiquidityEntry, LiquidityTable};
pub use ltv::{compute_max_ltv, LtvInputs, LtvOutcome, PairParameters, RangeWarning, SHUTDOWN_LTV};
pub use prices::{PriceFile, PriceMatrix, PricePoint, PriceSeries};
pub use types::{LendingPair, PricePair};
pub use volatility::VolatilityTable;
