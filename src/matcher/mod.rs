//! Matching of two road networks under geometric and topological uncertainty.
//!
//! The [`NetworkMatcher`] pairs each edge of a first network with an edge,
//! or a chain of two contiguous edges, of a second. Pairs are first scored
//! on their geometric [`Similarity`] alone. Each following iteration blends
//! in the support a pair receives from the pairing of its neighbours, and
//! re-solves the pairing. Once finalized, every pair carries a raw score
//! in `[0, 1]`.
//!
//! A matcher moves through its [`MatchState`]s strictly in order:
//!
//! ```text
//! Created -> Matched -> Iterating(1) -> ... -> Iterating(n) -> Finalized
//! ```

#[doc(hidden)]
pub mod candidate;
#[doc(hidden)]
pub mod costing;
pub mod geometry;
mod pairing;
#[doc(hidden)]
pub mod registry;

#[cfg(test)]
mod test;

#[doc(inline)]
pub use candidate::{EdgeChain, EdgeMatch, NetworkEdgeScore};
#[doc(inline)]
pub use costing::{
    DistanceSimilarity, HeadingSimilarity, LengthSimilarity, Similarity, SimilarityContext,
    SimilarityStrategies, SimilarityStrategy, Strategy,
};
#[doc(inline)]
pub use registry::{MatcherRegistry, NetworkMatcherKind};

use geo::MultiLineString;
use itertools::Itertools;
use log::{debug, info, trace};
use measure_time::{debug_time, info_time};
use rstar::RTree;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use thiserror::Error;
use wkt::ToWkt;

use crate::config::{ConfigError, ConflateConfig};
use crate::graph::ElementGraph;
use crate::matcher::candidate::{IndexedTarget, Target};
use crate::matcher::geometry::expand;
use crate::network::{EdgeIndex, NetworkEdge, NetworkGraph, VertexIndex};

#[cfg(feature = "tracing")]
use tracing::Level;

/// Share of the updated score decided by topological support.
const SUPPORT_WEIGHT: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchState {
    Created,
    Matched,
    /// Holds the number of completed iterations.
    Iterating(usize),
    Finalized,
}

/// Identifies one of the two networks given to the matcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkSide {
    A,
    B,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("network {0:?} has no edges to match")]
    EmptyNetwork(NetworkSide),

    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: MatchState,
    },

    #[error("all {0} configured iterations have already run")]
    IterationsExhausted(usize),

    #[error("cannot finalize after {completed} of {required} iterations")]
    PrematureFinalize { completed: usize, required: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatcherSettings {
    /// Search radius in metres, or negative for a radius derived from
    /// the circular error of each pair.
    pub search_radius: f64,

    /// Circular error of edges whose members carry none.
    pub default_circular_error: f64,

    pub num_iterations: usize,

    /// Raw scores at or below this value do not constitute a match.
    pub match_threshold: f64,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        MatcherSettings::from(&ConflateConfig::default())
    }
}

impl From<&ConflateConfig> for MatcherSettings {
    fn from(config: &ConflateConfig) -> Self {
        MatcherSettings {
            search_radius: config.search_radius,
            default_circular_error: config.default_circular_error,
            num_iterations: config.num_iterations,
            match_threshold: config.network_match_threshold,
        }
    }
}

pub struct NetworkMatcher<S = SimilarityStrategies>
where
    S: Similarity,
{
    kind: NetworkMatcherKind,
    settings: MatcherSettings,
    strategies: S,
    state: MatchState,

    network_a: NetworkGraph,
    network_b: NetworkGraph,

    /// Edges and chains of the second network.
    targets: Vec<Target>,

    /// Plausible pairs, ordered by edge and then target.
    candidates: Vec<EdgeMatch>,

    /// Indices of the currently paired candidates.
    pairing: Vec<usize>,

    scores: Vec<NetworkEdgeScore>,
}

impl NetworkMatcher {
    pub fn new(kind: NetworkMatcherKind, settings: MatcherSettings) -> Result<Self, ConfigError> {
        let strategies: SimilarityStrategies = Default::default();
        Self::with_strategies(kind, settings, strategies)
    }
}

impl<S> NetworkMatcher<S>
where
    S: Similarity,
{
    pub fn with_strategies(
        kind: NetworkMatcherKind,
        settings: MatcherSettings,
        strategies: S,
    ) -> Result<Self, ConfigError> {
        if settings.num_iterations < 1 {
            return Err(ConfigError::InvalidIterations(settings.num_iterations));
        }

        Ok(NetworkMatcher {
            kind,
            settings,
            strategies,
            state: MatchState::Created,
            network_a: NetworkGraph::default(),
            network_b: NetworkGraph::default(),
            targets: vec![],
            candidates: vec![],
            pairing: vec![],
            scores: vec![],
        })
    }

    pub fn kind(&self) -> NetworkMatcherKind {
        self.kind
    }

    pub fn settings(&self) -> &MatcherSettings {
        &self.settings
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn networks(&self) -> (&NetworkGraph, &NetworkGraph) {
        (&self.network_a, &self.network_b)
    }

    /// Every plausible pair found by [`NetworkMatcher::match_networks`].
    pub fn candidates(&self) -> &[EdgeMatch] {
        &self.candidates
    }

    /// The pairs chosen by the most recent round.
    pub fn current_pairing(&self) -> impl Iterator<Item = &EdgeMatch> {
        self.pairing.iter().map(|index| &self.candidates[*index])
    }

    /// Renders the current pairing as a WKT `GEOMETRYCOLLECTION`, one
    /// `MULTILINESTRING` of both geometries per pair.
    pub fn pairing_wkt(&self) -> String {
        let pairs = self
            .current_pairing()
            .filter_map(|candidate| {
                let a = self.network_a.edge(candidate.a)?;
                let target = self.targets.get(candidate.target)?;
                Some(
                    MultiLineString::new(vec![a.geometry.clone(), target.geometry.clone()])
                        .wkt_string(),
                )
            })
            .join(",");

        format!("GEOMETRYCOLLECTION({pairs})")
    }

    /// The largest circular error of the edge's members.
    fn circular_error(&self, graph: &ElementGraph, edge: &NetworkEdge) -> f64 {
        edge.members
            .iter()
            .filter_map(|member| graph.element(member))
            .filter_map(|element| element.circular_error())
            .reduce(f64::max)
            .unwrap_or(self.settings.default_circular_error)
    }

    fn ensure(&self, operation: &'static str, expected: MatchState) -> Result<(), MatchError> {
        if self.state != expected {
            return Err(MatchError::InvalidState {
                operation,
                state: self.state,
            });
        }

        Ok(())
    }

    /// Every edge of the second network, and every chain of two edges
    /// meeting at a vertex. Loops do not take part in chains.
    fn build_targets(&self, graph: &ElementGraph) -> Vec<Target> {
        let network = &self.network_b;
        let errors = network
            .edges()
            .map(|(index, edge)| (index, self.circular_error(graph, edge)))
            .collect::<FxHashMap<_, _>>();

        let singles = network.edges().map(|(index, _)| EdgeChain::single(index));

        let is_loop = |edge: &EdgeIndex| {
            network
                .endpoints(*edge)
                .map_or(true, |(start, end)| start == end)
        };

        let mut seen = FxHashSet::default();
        let chains = (0..network.vertex_count())
            .map(VertexIndex::new)
            .flat_map(|vertex| {
                network
                    .edges_at(vertex)
                    .filter(|edge| !is_loop(edge))
                    .sorted()
                    .tuple_combinations()
                    .collect::<Vec<(EdgeIndex, EdgeIndex)>>()
            })
            .filter(|pair| seen.insert(*pair))
            .map(|(first, second)| EdgeChain(SmallVec::from_slice(&[first, second])));

        singles
            .chain(chains)
            .filter_map(|chain| {
                let error = chain
                    .edges()
                    .iter()
                    .filter_map(|edge| errors.get(edge).copied())
                    .fold(0.0, f64::max);

                Target::new(network, chain, error)
            })
            .collect()
    }

    /// Finds and scores every plausible pair between the networks, then
    /// solves the initial pairing on similarity alone.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::INFO, skip_all))]
    pub fn match_networks(
        &mut self,
        graph: &ElementGraph,
        network_a: NetworkGraph,
        network_b: NetworkGraph,
    ) -> Result<(), MatchError> {
        info_time!("match networks");
        self.ensure("match networks", MatchState::Created)?;

        if network_a.is_empty() {
            return Err(MatchError::EmptyNetwork(NetworkSide::A));
        }
        if network_b.is_empty() {
            return Err(MatchError::EmptyNetwork(NetworkSide::B));
        }

        self.network_a = network_a;
        self.network_b = network_b;
        self.targets = self.build_targets(graph);

        let index = RTree::bulk_load(
            self.targets
                .iter()
                .enumerate()
                .map(|(index, target)| IndexedTarget {
                    index,
                    envelope: target.envelope,
                })
                .collect(),
        );

        let largest_error = self
            .targets
            .iter()
            .map(|target| target.circular_error)
            .fold(0.0, f64::max);

        let mut candidates = vec![];
        for (a, edge) in self.network_a.edges() {
            let error = self.circular_error(graph, edge);
            let reach = match self.settings.search_radius {
                radius if radius >= 0.0 => radius,
                _ => error + largest_error,
            };

            let search = expand(&edge.envelope(), reach);
            for entry in index.locate_in_envelope_intersecting(&search) {
                let target = &self.targets[entry.index];
                let radius = match self.settings.search_radius {
                    radius if radius >= 0.0 => radius,
                    _ => error + target.circular_error,
                };

                let similarity = self.strategies.similarity(SimilarityContext {
                    a: &edge.geometry,
                    b: &target.geometry,
                    lengths: (edge.length, target.length),
                    radius,
                });

                if similarity > 0.0 {
                    trace!("Candidate {} ~ {}: {similarity:.4}", a.index(), target.chain);
                    candidates.push(EdgeMatch {
                        a,
                        b: target.chain.clone(),
                        target: entry.index,
                        similarity,
                        score: similarity,
                    });
                }
            }
        }

        candidates.sort_by_key(|candidate| (candidate.a, candidate.target));
        self.candidates = candidates;
        self.pairing = self.pair();
        self.state = MatchState::Matched;

        info!(
            "Matched {} edges onto {} targets, {} candidates, {} paired",
            self.network_a.edge_count(),
            self.targets.len(),
            self.candidates.len(),
            self.pairing.len()
        );

        Ok(())
    }

    /// Blends the topological support of each candidate into its score,
    /// and re-solves the pairing.
    ///
    /// The support of a candidate `(a, t)` is the fraction of edges
    /// neighbouring `a` whose current pair touches `t`. Edges without
    /// neighbours take their similarity as support.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip_all))]
    pub fn iterate(&mut self) -> Result<(), MatchError> {
        debug_time!("iterate network match");
        let completed = match self.state {
            MatchState::Matched => 0,
            MatchState::Iterating(completed) => completed,
            state => {
                return Err(MatchError::InvalidState {
                    operation: "iterate",
                    state,
                })
            }
        };

        if completed >= self.settings.num_iterations {
            return Err(MatchError::IterationsExhausted(self.settings.num_iterations));
        }

        let paired = self
            .pairing
            .iter()
            .map(|index| (self.candidates[*index].a, self.candidates[*index].target))
            .collect::<FxHashMap<_, _>>();

        let neighbours = self
            .candidates
            .iter()
            .map(|candidate| candidate.a)
            .unique()
            .map(|a| (a, self.network_a.adjacent_edges(a)))
            .collect::<FxHashMap<_, _>>();

        for candidate in self.candidates.iter_mut() {
            let adjacent = neighbours
                .get(&candidate.a)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let support = match adjacent.len() {
                0 => candidate.similarity,
                total => {
                    let target = &self.targets[candidate.target];
                    let supporting = adjacent
                        .iter()
                        .filter_map(|neighbour| paired.get(neighbour))
                        .filter(|other| self.targets[**other].touches(target))
                        .count();

                    supporting as f64 / total as f64
                }
            };

            candidate.score =
                (1.0 - SUPPORT_WEIGHT) * candidate.similarity + SUPPORT_WEIGHT * support;
        }

        self.pairing = self.pair();
        self.state = MatchState::Iterating(completed + 1);
        debug!(
            "Iteration {} of {} paired {} edges",
            completed + 1,
            self.settings.num_iterations,
            self.pairing.len()
        );

        Ok(())
    }

    /// Fixes the scores of the final pairing. Only permitted once every
    /// configured iteration has run.
    pub fn finalize(&mut self) -> Result<(), MatchError> {
        let required = self.settings.num_iterations;
        match self.state {
            MatchState::Iterating(completed) if completed == required => {}
            MatchState::Iterating(completed) => {
                return Err(MatchError::PrematureFinalize {
                    completed,
                    required,
                })
            }
            MatchState::Matched => {
                return Err(MatchError::PrematureFinalize {
                    completed: 0,
                    required,
                })
            }
            state => {
                return Err(MatchError::InvalidState {
                    operation: "finalize",
                    state,
                })
            }
        }

        self.scores = self
            .current_pairing()
            .filter_map(|candidate| {
                let a = self.network_a.edge(candidate.a)?.element;
                let b = candidate
                    .b
                    .edges()
                    .iter()
                    .map(|edge| self.network_b.edge(*edge).map(|edge| edge.element))
                    .collect::<Option<SmallVec<_>>>()?;

                Some(NetworkEdgeScore::new(a, b, candidate.score))
            })
            .collect();

        self.state = MatchState::Finalized;
        debug!("Finalized {} edge scores", self.scores.len());
        Ok(())
    }

    /// The score of every final pair.
    pub fn all_edge_scores(&self) -> Result<&[NetworkEdgeScore], MatchError> {
        self.ensure("read edge scores", MatchState::Finalized)?;
        Ok(&self.scores)
    }

    /// Raw score a pair must exceed to be considered a match.
    pub fn match_threshold(&self) -> Result<f64, MatchError> {
        self.ensure("read match threshold", MatchState::Finalized)?;
        Ok(self.settings.match_threshold)
    }

    fn pair(&self) -> Vec<usize> {
        debug_time!("pair candidates");
        match self.kind {
            NetworkMatcherKind::Assignment => pairing::assignment(&self.candidates, &self.targets),
            NetworkMatcherKind::Greedy => pairing::greedy(&self.candidates, &self.targets),
        }
    }
}
