//! Profit/loss valuation mode for FIFO cost matching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a sales line's profit/loss is derived when its quantity spans
/// several purchase cost layers.
///
/// Deserializes through [`ProfitLossMode::parse`], so configuration values
/// are case-insensitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ProfitLossMode {
    /// Each matched layer overwrites the result, so only the last layer's
    /// margin is kept. Matches the historical ledger figures.
    #[default]
    LastLayer,
    /// Margins of all matched layers are summed.
    Cumulative,
}

impl ProfitLossMode {
    /// Returns the string representation of the mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastLayer => "last_layer",
            Self::Cumulative => "cumulative",
        }
    }

    /// Parses a mode from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "last_layer" => Some(Self::LastLayer),
            "cumulative" => Some(Self::Cumulative),
            _ => None,
        }
    }
}

impl TryFrom<String> for ProfitLossMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| {
            format!("unknown profit/loss mode `{value}`, expected `last_layer` or `cumulative`")
        })
    }
}

impl fmt::Display for ProfitLossMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
