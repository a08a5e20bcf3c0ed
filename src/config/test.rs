use rustc_hash::FxHashMap;

use crate::config::{ConfigError, ConflateConfig};
use crate::matcher::NetworkMatcherKind;

fn environment(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<FxHashMap<_, _>>();

    move |key| vars.get(key).cloned()
}

#[test_log::test]
fn default_is_valid() {
    let config = ConflateConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.num_iterations, 10);
    assert_eq!(config.matcher_kind(), Ok(NetworkMatcherKind::Assignment));
}

#[test_log::test]
fn zero_iterations_rejected() {
    let config = ConflateConfig {
        num_iterations: 0,
        ..ConflateConfig::default()
    };

    assert_eq!(config.validate(), Err(ConfigError::InvalidIterations(0)));
}

#[test_log::test]
fn misordered_thresholds_rejected() {
    let config = ConflateConfig {
        review_threshold: 0.7,
        ..ConflateConfig::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidThreshold { .. })
    ));
}

#[test_log::test]
fn non_finite_rejected() {
    let config = ConflateConfig {
        search_radius: f64::NAN,
        ..ConflateConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::NonFinite { .. })));

    let config = ConflateConfig {
        curve_max: f64::INFINITY,
        ..ConflateConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InvalidCurve(_))));
}

#[test_log::test]
fn unknown_names_rejected() {
    let config = ConflateConfig {
        matcher: "ConflictsNetworkMatcher".to_string(),
        ..ConflateConfig::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::UnknownMatcher("ConflictsNetworkMatcher".to_string()))
    );

    let config = ConflateConfig {
        filters: vec!["BuildingCriterion".to_string()],
        ..ConflateConfig::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::UnknownCriterion("BuildingCriterion".to_string()))
    );
}

#[test_log::test]
fn overrides_from_environment() {
    let mut config = ConflateConfig::default();
    config
        .override_from(environment(&[
            ("CONFLATE_SEARCH_RADIUS", "50"),
            ("CONFLATE_NUM_ITERATIONS", " 3 "),
            ("CONFLATE_MATCHER", "GreedyNetworkMatcher"),
            ("CONFLATE_FILTERS", "TagKeyCriterion=bridge; ;NotCriterion=TagKeyCriterion=tunnel"),
        ]))
        .expect("overrides must apply");

    assert_eq!(config.search_radius, 50.0);
    assert_eq!(config.num_iterations, 3);
    assert_eq!(config.matcher_kind(), Ok(NetworkMatcherKind::Greedy));
    assert_eq!(config.filters.len(), 2);
    assert_eq!(config.filter_criteria().map(|c| c.len()), Ok(2));
}

#[test_log::test]
fn malformed_environment_rejected() {
    let mut config = ConflateConfig::default();
    let result = config.override_from(environment(&[("CONFLATE_NUM_ITERATIONS", "ten")]));

    assert_eq!(
        result,
        Err(ConfigError::InvalidEnvironment {
            key: "CONFLATE_NUM_ITERATIONS".to_string(),
            value: "ten".to_string(),
        })
    );
}

#[test_log::test]
fn deserializes_partial_config() {
    let config: ConflateConfig = serde_json::from_str(r#"{ "search_radius": 25.0 }"#)
        .expect("partial config must deserialize");

    assert_eq!(config.search_radius, 25.0);
    assert_eq!(config.curve_midpoint, ConflateConfig::default().curve_midpoint);
}
