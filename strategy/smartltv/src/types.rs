//! Pair identities with explicit direction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered asset pair whose price is `price(base) / price(quote)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PricePair {
    pub base: String,
    pub quote: String,
}

impl PricePair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// The same two assets priced the other way round.
    pub fn inverse(&self) -> Self {
        Self::new(self.quote.clone(), self.base.clone())
    }
}

impl fmt::Display for PricePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Lending pair: `collateral` is posted to borrow `debt`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LendingPair {
    pub debt: String,
    pub collateral: String,
}

impl LendingPair {
    pub fn new(debt: impl Into<String>, collateral: impl Into<String>) -> Self {
        Self {
            debt: debt.into(),
            collateral: collateral.into(),
        }
    }

    /// Price pair measuring the risk that collateral devalues against debt.
    pub fn collateral_price(&self) -> PricePair {
        PricePair::new(self.collateral.clone(), self.debt.clone())
    }
}

impl fmt::Display for LendingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "debt={} collateral={}", self.debt, self.collateral)
    }
}
