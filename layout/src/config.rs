use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Tunables of the layout engine.
///
/// One immutable value is handed to [`crate::Engine::new`]; nothing is
/// read from ambient state. Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Below this many raw groups the result is flagged as insufficient
    /// so the caller can ask the grouping collaborator again.
    /// Default: 2.
    pub min_groups: usize,

    /// Upper bound on surviving groups. Lower = more forced merging,
    /// higher = more headroom before consolidation kicks in.
    /// Default: 12.
    pub max_groups: usize,

    /// Base scatter radius as a fraction of the median nearest
    /// inter-centroid distance. Higher spreads clouds outward.
    /// Default: 0.35.
    pub scatter_fraction: f64,

    /// How strongly embedding dispersion widens a group's cloud.
    /// Higher = heterogeneous groups spread further. 0 disables.
    /// Default: 2.0.
    pub variance_amplifier: f64,

    /// Multiplier applied to raw MDS coordinates. Higher = larger canvas.
    /// Default: 10.0.
    pub layout_scale: f64,

    /// SMACOF iteration cap. Default: 300.
    pub mds_max_iter: usize,

    /// SMACOF stops once the relative stress improvement drops below
    /// this value. Default: 1e-9.
    pub mds_tolerance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_groups: 2,
            max_groups: 12,
            scatter_fraction: 0.35,
            variance_amplifier: 2.0,
            layout_scale: 10.0,
            mds_max_iter: 300,
            mds_tolerance: 1e-9,
        }
    }
}

impl LayoutConfig {
    pub fn with_group_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_groups = min;
        self.max_groups = max;
        self
    }

    pub fn with_scatter_fraction(mut self, f: f64) -> Self {
        self.scatter_fraction = f;
        self
    }

    pub fn with_variance_amplifier(mut self, v: f64) -> Self {
        self.variance_amplifier = v;
        self
    }

    pub fn with_layout_scale(mut self, scale: f64) -> Self {
        self.layout_scale = scale;
        self
    }

    /// Checks that every tunable is in range.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.min_groups == 0 {
            return Err(LayoutError::InvalidConfig("min_groups must be at least 1".into()));
        }
        if self.min_groups > self.max_groups {
            return Err(LayoutError::InvalidConfig(format!(
                "min_groups {} exceeds max_groups {}",
                self.min_groups, self.max_groups
            )));
        }
        if !(self.scatter_fraction.is_finite() && self.scatter_fraction > 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "scatter_fraction must be positive, got {}",
                self.scatter_fraction
            )));
        }
        if !(self.variance_amplifier.is_finite() && self.variance_amplifier >= 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "variance_amplifier must be non-negative, got {}",
                self.variance_amplifier
            )));
        }
        if !(self.layout_scale.is_finite() && self.layout_scale > 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "layout_scale must be positive, got {}",
                self.layout_scale
            )));
        }
        if !(self.mds_tolerance.is_finite() && self.mds_tolerance >= 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "mds_tolerance must be non-negative, got {}",
                self.mds_tolerance
            )));
        }
        Ok(())
    }
}
