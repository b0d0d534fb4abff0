//! Kernel configuration.
//!
//! Replaces process-wide tolerance and scaling state with an explicit value
//! handed to the converter and carried by each [`Design`](crate::design::Design).

use crate::error::{LaminateError, LaminateResult};
use crate::units::LengthUnit;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Absolute distance below which two points are considered equal.
    pub tolerance: f64,
    /// Multiplier applied to scalar operation arguments (widths, radii,
    /// thicknesses) before they meet geometry.
    pub internal_argument_scaling: f64,
    /// Unit that design coordinates are expressed in.
    pub unit: LengthUnit,
    /// When set, a shape that fails conversion aborts the whole sketch
    /// instead of being skipped with a warning.
    pub strict: bool,
    /// Number of segments used to approximate a full circle.
    pub circle_segments: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            internal_argument_scaling: 1.0,
            unit: LengthUnit::Millimeter,
            strict: false,
            circle_segments: 64,
        }
    }
}

impl KernelConfig {
    pub fn from_json(json: &str) -> LaminateResult<Self> {
        let config: KernelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> LaminateResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LaminateError::Serialization(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> LaminateResult<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(LaminateError::InvalidParameter(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if !self.internal_argument_scaling.is_finite() || self.internal_argument_scaling <= 0.0 {
            return Err(LaminateError::InvalidParameter(format!(
                "internal_argument_scaling must be positive, got {}",
                self.internal_argument_scaling
            )));
        }
        if self.circle_segments < 8 {
            return Err(LaminateError::InvalidParameter(format!(
                "circle_segments must be at least 8, got {}",
                self.circle_segments
            )));
        }
        Ok(())
    }

    /// Scale a user-facing scalar argument into internal units.
    #[inline]
    pub fn scaled(&self, value: f64) -> f64 {
        value * self.internal_argument_scaling
    }
}
