use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A logistic curve mapping a raw score onto a confidence in `[0, max]`.
///
/// ```math
/// curve(s) = max / (1 + e^(-steepness * (s - midpoint)))
/// ```
///
/// The curve is strictly increasing, and outputs exactly `max / 2`
/// at the midpoint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreCurve {
    max: f64,
    midpoint: f64,
    steepness: f64,
}

impl ScoreCurve {
    pub fn new(max: f64, midpoint: f64, steepness: f64) -> Result<Self, ConfigError> {
        if !(max.is_finite() && midpoint.is_finite() && steepness.is_finite()) {
            return Err(ConfigError::InvalidCurve("parameters must be finite"));
        }

        if max <= 0.0 {
            return Err(ConfigError::InvalidCurve("maximum must be positive"));
        }

        if steepness <= 0.0 {
            return Err(ConfigError::InvalidCurve("steepness must be positive"));
        }

        Ok(Self {
            max,
            midpoint,
            steepness,
        })
    }

    #[inline]
    pub fn apply(&self, score: f64) -> f64 {
        self.max / (1.0 + (-self.steepness * (score - self.midpoint)).exp())
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn midpoint(&self) -> f64 {
        self.midpoint
    }

    pub fn steepness(&self) -> f64 {
        self.steepness
    }
}
