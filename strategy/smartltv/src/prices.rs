//! Price history inputs: per-asset series and the joined price matrix.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// One observation of an asset's price in the common numeraire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Price history of a single asset, ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub asset: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Creates a validated series.
    pub fn new(asset: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let series = Self {
            asset: asset.into(),
            points,
        };
        series.validate()?;
        Ok(series)
    }

    /// Checks that timestamps strictly ascend and every price is finite and positive.
    pub fn validate(&self) -> Result<()> {
        for point in &self.points {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(RiskError::invalid(
                    &self.asset,
                    format!("price {} at {} is not a positive number", point.price, point.timestamp),
                ));
            }
        }
        for window in self.points.windows(2) {
            if window[1].timestamp <= window[0].timestamp {
                return Err(RiskError::invalid(
                    &self.asset,
                    format!(
                        "timestamps must strictly ascend, found {} after {}",
                        window[1].timestamp, window[0].timestamp
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// A matrix row: one timestamp and a price slot per asset column.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub timestamp: DateTime<Utc>,
    pub prices: Vec<Option<f64>>,
}

/// Outer join of several price series on timestamp.
///
/// Columns follow the order of the input series. A timestamp present in any
/// series yields a row; assets without an observation there hold `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    assets: Vec<String>,
    rows: Vec<PriceRow>,
}

impl PriceMatrix {
    pub fn outer_join(series: &[PriceSeries]) -> Result<Self> {
        let mut seen = HashSet::new();
        for s in series {
            if !seen.insert(s.asset.as_str()) {
                return Err(RiskError::invalid(&s.asset, "duplicate price series"));
            }
            s.validate()?;
        }

        let width = series.len();
        let mut joined: BTreeMap<DateTime<Utc>, Vec<Option<f64>>> = BTreeMap::new();
        for (column, s) in series.iter().enumerate() {
            for point in &s.points {
                joined
                    .entry(point.timestamp)
                    .or_insert_with(|| vec![None; width])[column] = Some(point.price);
            }
        }

        Ok(Self {
            assets: series.iter().map(|s| s.asset.clone()).collect(),
            rows: joined
                .into_iter()
                .map(|(timestamp, prices)| PriceRow { timestamp, prices })
                .collect(),
        })
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    /// Column index of an asset.
    pub fn column(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    /// Keeps only the named assets' columns, in the given order, and drops
    /// rows left without any price. Names absent from the matrix are skipped.
    pub fn select(&self, assets: &[&str]) -> Self {
        let columns: Vec<usize> = assets.iter().filter_map(|a| self.column(a)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| PriceRow {
                timestamp: row.timestamp,
                prices: columns.iter().map(|&c| row.prices[c]).collect(),
            })
            .filter(|row| row.prices.iter().any(Option::is_some))
            .collect();
        Self {
            assets: columns.iter().map(|&c| self.assets[c].clone()).collect(),
            rows,
        }
    }

    /// Restricts the matrix to rows with `start 00:00 <= timestamp <= end 00:00` (UTC).
    pub fn window(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let start = start.map(midnight);
        let end = end.map(midnight);
        let rows = self
            .rows
            .iter()
            .filter(|row| {
                start.map_or(true, |s| row.timestamp >= s)
                    && end.map_or(true, |e| row.timestamp <= e)
            })
            .cloned()
            .collect();
        Self {
            assets: self.assets.clone(),
            rows,
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// On-disk price history: `{ "series": [ { "asset": ..., "points": [...] } ] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceFile {
    pub series: Vec<PriceSeries>,
}

impl PriceFile {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read price file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse price file {}", path.display()))
    }

    pub fn into_matrix(self) -> Result<PriceMatrix> {
        PriceMatrix::outer_join(&self.series)
    }
}
