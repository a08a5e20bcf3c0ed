//! Run level configuration of the network conflation pipeline.
//!
//! A [`ConflateConfig`] is built once per run, either from its
//! [`Default`] values, deserialized with `serde`, or layered from the
//! environment using [`ConflateConfig::from_env`]. It must pass
//! [`ConflateConfig::validate`] before the run begins; every problem
//! it detects is fatal.

#[cfg(test)]
mod test;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::criterion::{Criterion, CriterionRegistry};
use crate::graph::diagnostics::DEFAULT_WARN_LIMIT;
use crate::matcher::NetworkMatcherKind;
use crate::score::{MatchThreshold, ScoreCurve};

/// Prefix of every environment variable read by [`ConflateConfig::from_env`].
pub const ENV_PREFIX: &str = "CONFLATE_";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("number of iterations must be at least one, got {0}")]
    InvalidIterations(usize),

    #[error("thresholds must satisfy 0 <= miss ({miss}) <= review ({review}) <= match ({matched})")]
    InvalidThreshold { miss: f64, review: f64, matched: f64 },

    #[error("invalid score curve: {0}")]
    InvalidCurve(&'static str),

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("unknown network matcher `{0}`")]
    UnknownMatcher(String),

    #[error("unknown criterion `{0}`")]
    UnknownCriterion(String),

    #[error("criterion `{name}` cannot accept argument `{argument}`")]
    InvalidCriterionArgument { name: String, argument: String },

    #[error("environment variable {key} has invalid value `{value}`")]
    InvalidEnvironment { key: String, value: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflateConfig {
    /// Search radius in metres. When negative, the radius of each pair
    /// is the sum of the circular errors of both edges.
    pub search_radius: f64,

    /// Circular error, in metres, assumed for elements which carry none.
    pub default_circular_error: f64,

    /// Number of support iterations run by the matcher.
    pub num_iterations: usize,

    /// Maximum confidence output by the score curve.
    pub curve_max: f64,
    /// Raw score at which the curve outputs half its maximum.
    pub curve_midpoint: f64,
    pub curve_steepness: f64,

    pub miss_threshold: f64,
    pub review_threshold: f64,
    pub match_threshold: f64,

    /// Raw edge scores at or below this value are never classified.
    pub network_match_threshold: f64,

    /// Name of the network matcher implementation.
    pub matcher: String,

    /// Names of additional criteria, each of which a feature must
    /// satisfy to take part in the network. See [`CriterionRegistry`].
    pub filters: Vec<String>,

    /// Number of circular references logged before the remainder
    /// are counted silently.
    pub warn_limit: usize,
}

impl Default for ConflateConfig {
    fn default() -> Self {
        Self {
            search_radius: -1.0,
            default_circular_error: 15.0,
            num_iterations: 10,
            curve_max: 0.8,
            curve_midpoint: 0.4,
            curve_steepness: 10.0,
            miss_threshold: 0.2,
            review_threshold: 0.4,
            match_threshold: 0.6,
            network_match_threshold: 0.15,
            matcher: NetworkMatcherKind::Assignment.name().to_string(),
            filters: vec![],
            warn_limit: DEFAULT_WARN_LIMIT,
        }
    }
}

impl ConflateConfig {
    /// Loads the default configuration, overridden by any `CONFLATE_*`
    /// variables present in the environment or a `.env` file.
    ///
    /// Filters are given as a `;` separated list of criterion names,
    /// such as `CONFLATE_FILTERS="TagKeyCriterion=bridge;NotCriterion=TagKeyCriterion=tunnel"`.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let mut config = ConflateConfig::default();
        config.override_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides fields from the variables resolved by `lookup`.
    pub(crate) fn override_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        fn apply<T: FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            name: &str,
            field: &mut T,
        ) -> Result<(), ConfigError> {
            let key = format!("{ENV_PREFIX}{name}");
            let Some(value) = lookup(&key) else {
                return Ok(());
            };

            trace!("Overriding {key} from environment");
            *field = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnvironment { key, value })?;
            Ok(())
        }

        apply(&lookup, "SEARCH_RADIUS", &mut self.search_radius)?;
        apply(&lookup, "DEFAULT_CIRCULAR_ERROR", &mut self.default_circular_error)?;
        apply(&lookup, "NUM_ITERATIONS", &mut self.num_iterations)?;
        apply(&lookup, "CURVE_MAX", &mut self.curve_max)?;
        apply(&lookup, "CURVE_MIDPOINT", &mut self.curve_midpoint)?;
        apply(&lookup, "CURVE_STEEPNESS", &mut self.curve_steepness)?;
        apply(&lookup, "MISS_THRESHOLD", &mut self.miss_threshold)?;
        apply(&lookup, "REVIEW_THRESHOLD", &mut self.review_threshold)?;
        apply(&lookup, "MATCH_THRESHOLD", &mut self.match_threshold)?;
        apply(&lookup, "NETWORK_MATCH_THRESHOLD", &mut self.network_match_threshold)?;
        apply(&lookup, "MATCHER", &mut self.matcher)?;
        apply(&lookup, "WARN_LIMIT", &mut self.warn_limit)?;

        if let Some(filters) = lookup(&format!("{ENV_PREFIX}FILTERS")) {
            self.filters = filters
                .split(';')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(())
    }

    /// Checks every value, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("search radius", self.search_radius),
            ("default circular error", self.default_circular_error),
            ("network match threshold", self.network_match_threshold),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }

        if self.num_iterations < 1 {
            return Err(ConfigError::InvalidIterations(self.num_iterations));
        }

        self.curve()?;
        self.threshold()?;
        self.matcher_kind()?;
        self.filter_criteria()?;

        Ok(())
    }

    pub fn curve(&self) -> Result<ScoreCurve, ConfigError> {
        ScoreCurve::new(self.curve_max, self.curve_midpoint, self.curve_steepness)
    }

    pub fn threshold(&self) -> Result<MatchThreshold, ConfigError> {
        MatchThreshold::new(
            self.miss_threshold,
            self.review_threshold,
            self.match_threshold,
        )
    }

    pub fn matcher_kind(&self) -> Result<NetworkMatcherKind, ConfigError> {
        NetworkMatcherKind::from_name(&self.matcher)
    }

    /// Builds each configured filter from the default registry.
    pub fn filter_criteria(&self) -> Result<Vec<Criterion>, ConfigError> {
        let registry = CriterionRegistry::default();
        self.filters
            .iter()
            .map(|name| registry.create(name))
            .collect()
    }
}
