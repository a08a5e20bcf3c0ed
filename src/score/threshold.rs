use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::config::ConfigError;
use crate::score::ScoreCurve;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display)]
pub enum MatchType {
    Miss,
    Review,
    Match,
}

/// Probabilities carried with each classified match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchClassification {
    pub match_p: f64,
    pub miss_p: f64,
}

impl MatchClassification {
    /// Derives the classification from a confidence output by `curve`.
    pub fn from_confidence(confidence: f64, curve: &ScoreCurve) -> Self {
        let match_p = (confidence / curve.max()).clamp(0.0, 1.0);
        Self {
            match_p,
            miss_p: 1.0 - match_p,
        }
    }
}

/// Three ordered cut-points partitioning confidences into bands.
///
/// A confidence below `review` is a [`MatchType::Miss`], one below
/// `match` a [`MatchType::Review`], and anything else a
/// [`MatchType::Match`]. A value equal to a cut-point belongs to the
/// higher band. The `miss` cut-point is a lower bound of the review band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchThreshold {
    miss: f64,
    review: f64,
    matched: f64,
}

impl MatchThreshold {
    pub fn new(miss: f64, review: f64, matched: f64) -> Result<Self, ConfigError> {
        let finite = miss.is_finite() && review.is_finite() && matched.is_finite();
        if !finite || !(0.0 <= miss && miss <= review && review <= matched) {
            return Err(ConfigError::InvalidThreshold {
                miss,
                review,
                matched,
            });
        }

        Ok(Self {
            miss,
            review,
            matched,
        })
    }

    /// Places `confidence` in its band. Only `review` and `matched` are
    /// read here. The `miss` cut-point is checked by [`MatchThreshold::new`]
    /// but confidences below `review` are a [`MatchType::Miss`] on either
    /// side of it.
    pub fn classify(&self, confidence: f64) -> MatchType {
        if confidence >= self.matched {
            MatchType::Match
        } else if confidence >= self.review {
            MatchType::Review
        } else {
            MatchType::Miss
        }
    }

    pub fn miss(&self) -> f64 {
        self.miss
    }

    pub fn review(&self) -> f64 {
        self.review
    }

    pub fn matched(&self) -> f64 {
        self.matched
    }
}
