//! Orchestrates a network conflation run over an element graph.
//!
//! The [`NetworkMatchCreator`] extracts the road network of each
//! dataset, matches them with the configured [`NetworkMatcher`], and
//! converts every final edge score clearing the network threshold into
//! a classified [`NetworkMatch`].

#[cfg(test)]
mod test;

use log::{debug, info, warn};
use measure_time::info_time;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strum::{AsRefStr, Display};

use crate::config::{ConfigError, ConflateConfig};
use crate::criterion::Criterion;
use crate::element::{Element, ElementId, Status};
use crate::graph::{Diagnostics, ElementGraph};
use crate::matcher::{MatcherSettings, NetworkEdgeScore, NetworkMatcher};
use crate::network::{NetworkExtractor, NetworkGraph};
use crate::score::{MatchClassification, MatchThreshold, MatchType, ScoreCurve};
use crate::{Error, Result};

#[cfg(feature = "tracing")]
use tracing::Level;

/// Shared flag used to abandon a run between iterations.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Receives snapshots of the pairing as a run progresses, for debugging.
pub trait DiagnosticsSink {
    /// Called with the `stage` reached and the current pairing in WKT.
    fn record(&mut self, stage: &str, wkt: &str);
}

impl<F> DiagnosticsSink for F
where
    F: FnMut(&str, &str),
{
    fn record(&mut self, stage: &str, wkt: &str) {
        self(stage, wkt)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, AsRefStr, Display)]
pub enum BaseFeatureType {
    Highway,
}

/// Describes a match creator to callers choosing amongst them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreatorDescription {
    pub name: &'static str,
    pub description: &'static str,
    pub base_feature_type: BaseFeatureType,
    pub experimental: bool,
}

/// An accepted correspondence between road elements of the two datasets.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetworkMatch {
    /// The element of the first dataset.
    pub a: ElementId,
    /// The elements of the second dataset it corresponds to.
    pub b: SmallVec<[ElementId; 2]>,

    /// The raw edge score, before the curve is applied.
    pub score: f64,
    /// The score passed through the curve.
    pub confidence: f64,

    pub classification: MatchClassification,
    pub match_type: MatchType,
}

impl NetworkMatch {
    fn new(
        edge: &NetworkEdgeScore,
        curve: &ScoreCurve,
        threshold: &MatchThreshold,
    ) -> NetworkMatch {
        let confidence = curve.apply(edge.score);
        NetworkMatch {
            a: edge.a,
            b: edge.b.clone(),
            score: edge.score,
            confidence,
            classification: MatchClassification::from_confidence(confidence, curve),
            match_type: threshold.classify(confidence),
        }
    }

    /// Every element taking part in the match.
    pub fn elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::once(self.a).chain(self.b.iter().copied())
    }
}

pub struct NetworkMatchCreator {
    config: ConflateConfig,
    curve: ScoreCurve,

    /// Features a candidate must be, such as roads.
    criterion: Criterion,
    filters: Vec<Criterion>,

    cancellation: CancellationToken,
    sink: Option<Box<dyn DiagnosticsSink>>,
}

impl NetworkMatchCreator {
    pub const NAME: &'static str = "NetworkMatchCreator";

    /// Validates the configuration and prepares a creator matching roads.
    pub fn new(config: ConflateConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        Ok(NetworkMatchCreator {
            curve: config.curve()?,
            filters: config.filter_criteria()?,
            criterion: Criterion::Highway,
            config,
            cancellation: CancellationToken::default(),
            sink: None,
        })
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_sink(mut self, sink: impl DiagnosticsSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn config(&self) -> &ConflateConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn all_creators() -> Vec<CreatorDescription> {
        vec![CreatorDescription {
            name: Self::NAME,
            description: "Generates matches between roads using network conflation",
            base_feature_type: BaseFeatureType::Highway,
            experimental: false,
        }]
    }

    /// The criterion names a feature must satisfy to be matched.
    pub fn criteria(&self) -> Vec<&'static str> {
        vec!["HighwayCriterion"]
    }

    /// Whether the element may take part in a match. Elements marked
    /// special are temporary, and are never candidates.
    pub fn is_match_candidate(&self, element: &Element, graph: &ElementGraph) -> bool {
        if element.tags().is_special() {
            return false;
        }

        self.filters
            .iter()
            .all(|filter| filter.is_satisfied(element, graph))
            && self.criterion.is_satisfied(element, graph)
    }

    pub fn match_threshold(&self) -> std::result::Result<MatchThreshold, ConfigError> {
        self.config.threshold()
    }

    /// Extracts the network of candidates belonging to `status`.
    fn extract(&self, graph: &ElementGraph, status: Status) -> Result<NetworkGraph> {
        let mut criterion = Criterion::Status(status);
        criterion.add_criterion(self.criterion.clone());
        self.filters
            .iter()
            .for_each(|filter| criterion.add_criterion(filter.clone()));

        let network = NetworkExtractor::new(criterion).extract_network(graph)?;
        debug!("Extracted network of {status:?}: {network:?}");
        Ok(network)
    }

    /// Counts circular references within candidate relations, so that
    /// malformed input is reported once per run.
    fn survey_relations(&self, graph: &ElementGraph) -> Diagnostics {
        let mut diagnostics = Diagnostics::new(self.config.warn_limit);
        graph
            .relations()
            .filter(|relation| {
                graph
                    .element(&relation.element_id())
                    .is_some_and(|element| self.is_match_candidate(element, graph))
            })
            .for_each(|relation| {
                graph.visit_ro(relation.id, &mut |_: &Element| {}, true, &mut diagnostics)
            });

        diagnostics
    }

    fn record(&mut self, stage: &str, matcher: &NetworkMatcher) {
        if let Some(sink) = self.sink.as_mut() {
            sink.record(stage, &matcher.pairing_wkt());
        }
    }

    /// Matches the road networks of both datasets, appending each
    /// accepted match to `matches`.
    ///
    /// Edge scores at or below the matcher's network threshold are
    /// discarded. The remainder pass through the score curve, and are
    /// classified by `threshold`.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::INFO, skip_all))]
    pub fn create_matches(
        &mut self,
        graph: &ElementGraph,
        matches: &mut Vec<NetworkMatch>,
        threshold: &MatchThreshold,
    ) -> Result<()> {
        info_time!("create network matches");
        match self.config.search_radius {
            radius if radius < 0.0 => {
                info!("Looking for matches within a feature dependent search radius")
            }
            radius => info!("Looking for matches within a search radius of {radius:.2}m"),
        }

        let before = matches.len();
        let diagnostics = self.survey_relations(graph);
        if diagnostics.circular_references() > 0 {
            warn!(
                "Found {} circular references amongst candidate relations",
                diagnostics.circular_references()
            );
        }

        let network_a = self.extract(graph, Status::Unknown1)?;
        let network_b = self.extract(graph, Status::Unknown2)?;

        let settings = MatcherSettings::from(&self.config);
        let mut matcher = NetworkMatcher::new(self.config.matcher_kind()?, settings)?;
        matcher.match_networks(graph, network_a, network_b)?;
        self.record("match-initial", &matcher);

        let iterations = settings.num_iterations;
        for iteration in 1..=iterations {
            if self.cancellation.is_cancelled() {
                warn!("Cancelled after {} of {iterations} iterations", iteration - 1);
                return Err(Error::Cancelled);
            }

            matcher.iterate()?;
            debug!("Optimization iteration {iteration}/{iterations} complete");
            self.record(&format!("match-iteration-{iteration}"), &matcher);
        }

        matcher.finalize()?;
        self.record("match-after-final-iteration", &matcher);

        let network_threshold = matcher.match_threshold()?;
        matches.extend(
            matcher
                .all_edge_scores()?
                .iter()
                .filter(|edge| edge.score > network_threshold)
                .map(|edge| NetworkMatch::new(edge, &self.curve, threshold)),
        );

        info!("Found {} total highway matches", matches.len() - before);
        Ok(())
    }
}
