//! BVH build configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported when a BVH build is requested with an invalid configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BvhError {
    #[error("Unknown BVH axis selection: {0:?} (expected \"largest\" or \"random\")")]
    UnknownAxisSelection(String),

    #[error("Unknown BVH axis split: {0:?} (expected \"middle\", \"median\" or \"random\")")]
    UnknownAxisSplit(String),

    #[error("Invalid BVH max leaf size: {0} (must be at least 1)")]
    InvalidMaxLeafSize(usize),
}

/// Result type for BVH operations.
pub type BvhResult<T> = Result<T, BvhError>;

/// How the split axis is chosen when SAH is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSelection {
    /// Axis of the largest node extent
    #[default]
    Largest,
    /// Uniformly random among the three axes
    Random,
}

/// Where on the chosen axis the node is split when SAH is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSplit {
    /// Center of the node box
    #[default]
    Middle,
    /// Median of the primitive box centers
    Median,
    /// Uniformly random point between the node box min and max
    Random,
}

impl FromStr for AxisSelection {
    type Err = BvhError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "largest" => Ok(Self::Largest),
            "random" => Ok(Self::Random),
            _ => Err(BvhError::UnknownAxisSelection(s.to_string())),
        }
    }
}

impl FromStr for AxisSplit {
    type Err = BvhError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "middle" => Ok(Self::Middle),
            "median" => Ok(Self::Median),
            "random" => Ok(Self::Random),
            _ => Err(BvhError::UnknownAxisSplit(s.to_string())),
        }
    }
}

impl fmt::Display for AxisSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Largest => "largest",
            Self::Random => "random",
        })
    }
}

impl fmt::Display for AxisSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Middle => "middle",
            Self::Median => "median",
            Self::Random => "random",
        })
    }
}

/// BVH build configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhBuildInfo {
    /// Sides with at most this many primitives become leaves
    pub max_leaf_size: usize,
    pub axis_selection: AxisSelection,
    pub axis_split: AxisSplit,
    /// Choose axis and split point with the surface area heuristic instead
    pub use_sah: bool,
    /// Regular subdivisions per axis evaluated as extra SAH candidates
    pub regular_sah_splits: usize,
}

impl Default for BvhBuildInfo {
    fn default() -> Self {
        Self {
            max_leaf_size: 4,
            axis_selection: AxisSelection::Largest,
            axis_split: AxisSplit::Middle,
            use_sah: true,
            regular_sah_splits: 0,
        }
    }
}

impl BvhBuildInfo {
    pub fn with_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size;
        self
    }

    /// Disable SAH and split with the given policies.
    pub fn with_policies(mut self, axis_selection: AxisSelection, axis_split: AxisSplit) -> Self {
        self.use_sah = false;
        self.axis_selection = axis_selection;
        self.axis_split = axis_split;
        self
    }

    /// Enable SAH with `regular_sah_splits` extra candidates per axis.
    pub fn with_sah(mut self, regular_sah_splits: usize) -> Self {
        self.use_sah = true;
        self.regular_sah_splits = regular_sah_splits;
        self
    }

    /// Check the configuration before a build starts.
    pub fn validate(&self) -> BvhResult<()> {
        if self.max_leaf_size == 0 {
            return Err(BvhError::InvalidMaxLeafSize(self.max_leaf_size));
        }
        Ok(())
    }
}
