use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldDataError;

/// How a multi-valued field is reduced to one sort key per document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    Min,
    Max,
    Sum,
    Avg,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Min => "min",
            SortMode::Max => "max",
            SortMode::Sum => "sum",
            SortMode::Avg => "avg",
        }
    }

    /// Only the extremes are defined over byte sequences
    pub fn is_supported_for_bytes(&self) -> bool {
        matches!(self, SortMode::Min | SortMode::Max)
    }

    /// Default mode for a sort direction: smallest value ascending, largest descending
    pub fn default_for(reversed: bool) -> Self {
        if reversed {
            SortMode::Max
        } else {
            SortMode::Min
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = FieldDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(SortMode::Min),
            "max" => Ok(SortMode::Max),
            "sum" => Ok(SortMode::Sum),
            "avg" => Ok(SortMode::Avg),
            other => Err(FieldDataError::InvalidSettings(format!(
                "unknown sort mode [{}]",
                other
            ))),
        }
    }
}
