use thiserror::Error;

use crate::types::LendingPair;

/// Failures of the risk-parameter derivation. Every variant names the asset
/// or lending pair at fault together with the input that was missing or invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("missing data for {subject}: {detail}")]
    MissingData { subject: String, detail: String },

    #[error("invalid parameter for {subject}: {detail}")]
    InvalidParameter { subject: String, detail: String },
}

impl RiskError {
    pub fn missing(subject: impl ToString, detail: impl Into<String>) -> Self {
        Self::MissingData {
            subject: subject.to_string(),
            detail: detail.into(),
        }
    }

    pub fn invalid(subject: impl ToString, detail: impl Into<String>) -> Self {
        Self::InvalidParameter {
            subject: subject.to_string(),
            detail: detail.into(),
        }
    }

    /// Re-attributes an error raised for an anonymous computation to a lending pair.
    pub fn for_pair(self, pair: &LendingPair) -> Self {
        match self {
            Self::MissingData { detail, .. } => Self::missing(pair, detail),
            Self::InvalidParameter { detail, .. } => Self::invalid(pair, detail),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
