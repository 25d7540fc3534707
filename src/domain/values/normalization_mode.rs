use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How negative (inverse) exposures are treated when rescaling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Drop non-positive exposures, then scale the rest to sum to 1.
    #[default]
    LongOnly,
    /// Keep signs and scale so the absolute weights sum to 1.
    LongShort,
}

impl fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationMode::LongOnly => write!(f, "long_only"),
            NormalizationMode::LongShort => write!(f, "long_short"),
        }
    }
}

impl FromStr for NormalizationMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "long_only" | "long" => Ok(NormalizationMode::LongOnly),
            "long_short" => Ok(NormalizationMode::LongShort),
            _ => Err(format!("Unknown normalization mode: {s}")),
        }
    }
}
