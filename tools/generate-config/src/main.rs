//! Generate a lending pool genesis configuration with SmartLTV risk parameters.
//!
//! Usage: generate-config --prices <prices.json> [--input <pool.json>] [--output <out.json>]
//!        [--start-date YYYY-MM-DD] [--end-date YYYY-MM-DD] [--deny-range-warnings]

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Parser;
use smartltv::{PoolInput, PriceFile, SmartLtvGenerator};

#[derive(Debug, Parser)]
#[command(name = "generate-config", about = "Derive SmartLTV risk parameters and write a pool genesis config")]
struct Args {
    /// Static pool, asset, pair and liquidity parameters
    #[arg(long, env = "SMARTLTV_INPUT", default_value = "configs/genesis_sn_main.json")]
    input: PathBuf,

    /// Daily price history of every pool asset in a common numeraire
    #[arg(long, env = "SMARTLTV_PRICES")]
    prices: PathBuf,

    /// Destination of the genesis config
    #[arg(long, env = "SMARTLTV_OUTPUT", default_value = "config_genesis_sn_main.json")]
    output: PathBuf,

    /// First day of price history to use (inclusive)
    #[arg(long, env = "SMARTLTV_START_DATE")]
    start_date: Option<NaiveDate>,

    /// Last day of price history to use (inclusive)
    #[arg(long, env = "SMARTLTV_END_DATE")]
    end_date: Option<NaiveDate>,

    /// Fail instead of warning when a max LTV falls outside [0, liquidation_discount]
    #[arg(long, env = "SMARTLTV_DENY_RANGE_WARNINGS")]
    deny_range_warnings: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "generate_config=info,smartltv=info".into()),
        )
        .init();

    let args = Args::parse();

    let input = PoolInput::from_file(&args.input)?;
    let generator = SmartLtvGenerator::new(input)?;

    let prices = PriceFile::from_file(&args.prices)?
        .into_matrix()?
        .window(args.start_date, args.end_date);
    if let (Some(first), Some(last)) = (prices.rows().first(), prices.rows().last()) {
        tracing::info!(from = %first.timestamp, to = %last.timestamp, "loaded price history");
    }

    let report = generator.run(&prices)?;
    if args.deny_range_warnings && !report.warnings.is_empty() {
        for warning in &report.warnings {
            tracing::error!(%warning, "max ltv out of range");
        }
        bail!("{} pair(s) have max ltv out of range", report.warnings.len());
    }

    report.genesis.write_to(&args.output)?;
    tracing::info!(output = %args.output.display(), "wrote genesis config");
    Ok(())
}
