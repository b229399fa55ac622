//! Displacement calibration.
//!
//! Keypoints arrive in normalized image coordinates while velocity is
//! reported in meters per second. The calibration holds the scale
//! between the two, derived from the athlete's body height and the
//! vertical extent their skeleton spans in the frame.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fraction of the frame height a standing athlete is assumed to span
/// when no measured extent is available.
pub const DEFAULT_BODY_EXTENT: f32 = 0.6;

/// Body height in meters assumed by the default calibration.
pub const DEFAULT_BODY_HEIGHT_M: f32 = 1.7;

/// Errors from calibration construction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CalibrationError {
    /// Body height was zero, negative, or not finite.
    #[error("body height must be positive meters, got {value}")]
    InvalidBodyHeight {
        /// The rejected height
        value: f32,
    },

    /// Vertical extent was zero, negative, or not finite.
    #[error("vertical extent must be a positive normalized span, got {value}")]
    InvalidExtent {
        /// The rejected extent
        value: f32,
    },
}

/// Scale between normalized image units and meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    meters_per_unit: f32,
}

impl Calibration {
    /// Derives the scale from a known body height and the measured
    /// vertical extent of the skeleton in normalized coordinates.
    ///
    /// - `height_m`: the athlete's height in meters.
    /// - `vertical_extent`: normalized span between the highest and
    ///   lowest reliable keypoints of a standing pose.
    pub fn from_body_height(height_m: f32, vertical_extent: f32) -> Result<Self, CalibrationError> {
        if !height_m.is_finite() || height_m <= 0.0 {
            return Err(CalibrationError::InvalidBodyHeight { value: height_m });
        }
        if !vertical_extent.is_finite() || vertical_extent <= 0.0 {
            return Err(CalibrationError::InvalidExtent {
                value: vertical_extent,
            });
        }
        Ok(Self {
            meters_per_unit: height_m / vertical_extent,
        })
    }

    /// Meters represented by one normalized image unit.
    #[must_use]
    pub fn meters_per_unit(&self) -> f32 {
        self.meters_per_unit
    }

    /// Converts a normalized displacement to meters.
    #[must_use]
    pub fn to_meters(&self, normalized: f32) -> f32 {
        normalized * self.meters_per_unit
    }
}

impl Default for Calibration {
    /// An average-height athlete spanning 60% of the frame.
    fn default() -> Self {
        Self {
            meters_per_unit: DEFAULT_BODY_HEIGHT_M / DEFAULT_BODY_EXTENT,
        }
    }
}
