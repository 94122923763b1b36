use serde::{Deserialize, Serialize};

use crate::error::{OperationError, Result};
use crate::math::MIN_WALL_LENGTH;

/// Corner policy used by the joinery resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoineryStyle {
    /// Both walls are trimmed back by half their own thickness.
    #[default]
    Butt,
}

/// Parameters controlling intersection detection and joinery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoineryConfig {
    /// Maximum endpoint distance for two walls to count as meeting.
    pub tolerance: f64,
    /// Lower bound for a wall's adjusted length.
    pub min_length: f64,
    pub style: JoineryStyle,
    /// Wall count above which detection switches to a spatial hash.
    pub spatial_hash_threshold: usize,
}

impl Default for JoineryConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.05,
            min_length: MIN_WALL_LENGTH,
            style: JoineryStyle::Butt,
            spatial_hash_threshold: 256,
        }
    }
}

impl JoineryConfig {
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_min_length(mut self, min_length: f64) -> Self {
        self.min_length = min_length;
        self
    }

    #[must_use]
    pub fn with_spatial_hash_threshold(mut self, threshold: usize) -> Self {
        self.spatial_hash_threshold = threshold;
        self
    }

    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if the tolerance is negative or
    /// not finite, or the minimum length is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            ))
            .into());
        }
        if !self.min_length.is_finite() || self.min_length <= 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "min_length must be finite and positive, got {}",
                self.min_length
            ))
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        JoineryConfig::default().validate().unwrap();
    }

    #[test]
    fn negative_tolerance_fails() {
        assert!(JoineryConfig::default().with_tolerance(-0.1).validate().is_err());
    }

    #[test]
    fn zero_min_length_fails() {
        assert!(JoineryConfig::default().with_min_length(0.0).validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: JoineryConfig = serde_json::from_str(r#"{"tolerance": 0.01}"#).unwrap();
        assert!((config.tolerance - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.style, JoineryStyle::Butt);
        assert_eq!(config.spatial_hash_threshold, 256);
    }
}
