use geo::{LineString, Point};
use itertools::Itertools;
use log::{debug, trace};
use measure_time::debug_time;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{smallvec, SmallVec};
use thiserror::Error;

use crate::criterion::Criterion;
use crate::element::{ElementId, ElementKind, Relation, Way};
use crate::graph::ElementGraph;
use crate::network::graph::position_key;
use crate::network::{NetworkEdge, NetworkGraph};

#[cfg(feature = "tracing")]
use tracing::Level;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("no criterion was set on the extractor")]
    MissingCriterion,
}

/// A path through the element graph which becomes a single edge.
struct EdgePath {
    element: ElementId,
    members: SmallVec<[ElementId; 1]>,
    nodes: Vec<i64>,
    positions: Vec<Point>,
    oneway: bool,
}

/// Builds a [`NetworkGraph`] from the elements satisfying a criterion.
///
/// Each satisfying way with at least two resolvable nodes becomes an
/// edge. So does each satisfying relation whose members are all ways
/// joined end to end, the ways of which are then not extracted again
/// on their own. Where a path passes through a position another path
/// also uses, it is split so both meet at a shared vertex.
#[derive(Clone, Debug, Default)]
pub struct NetworkExtractor {
    criterion: Option<Criterion>,
}

impl NetworkExtractor {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion: Some(criterion),
        }
    }

    pub fn set_criterion(&mut self, criterion: Criterion) {
        self.criterion = Some(criterion);
    }

    /// Extracts the network of elements satisfying the criterion.
    ///
    /// Elements are visited in identifier order, ways before relations,
    /// so the same graph always yields the same vertex and edge indices.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::INFO, skip_all))]
    pub fn extract_network(&self, graph: &ElementGraph) -> Result<NetworkGraph, ExtractionError> {
        debug_time!("extract network");
        let criterion = self
            .criterion
            .as_ref()
            .ok_or(ExtractionError::MissingCriterion)?;

        let satisfying = graph
            .elements()
            .filter(|element| criterion.is_satisfied(element, graph))
            .collect::<Vec<_>>();

        let relations = satisfying
            .iter()
            .filter_map(|element| element.as_relation())
            .filter_map(|relation| Self::relation_path(relation, graph))
            .collect::<Vec<_>>();

        let subsumed = relations
            .iter()
            .flat_map(|path| path.members.iter().copied())
            .collect::<FxHashSet<_>>();

        let ways = satisfying
            .iter()
            .filter_map(|element| element.as_way())
            .filter(|way| !subsumed.contains(&way.element_id()))
            .filter_map(|way| Self::way_path(way, graph))
            .collect::<Vec<_>>();

        let paths = ways.into_iter().chain(relations).collect::<Vec<_>>();

        let mut usage = FxHashMap::<(u64, u64), usize>::default();
        for path in &paths {
            for key in path.positions.iter().map(position_key).unique() {
                *usage.entry(key).or_default() += 1;
            }
        }

        let mut network = NetworkGraph::new();
        for path in paths {
            let Some(last) = path.nodes.len().checked_sub(1) else {
                continue;
            };
            let mut start = 0;

            for index in 1..=last {
                let junction = usage
                    .get(&position_key(&path.positions[index]))
                    .is_some_and(|count| *count > 1);
                if index != last && !junction {
                    continue;
                }

                let from = network.vertex_at(path.nodes[start], path.positions[start]);
                let to = network.vertex_at(path.nodes[index], path.positions[index]);

                let geometry = LineString::from(path.positions[start..=index].to_vec());
                let edge =
                    NetworkEdge::new(path.element, path.members.clone(), geometry, path.oneway);
                network.add_edge(from, to, edge);
                start = index;
            }
        }

        debug!("Extracted {network:?}");
        Ok(network)
    }

    fn way_path(way: &Way, graph: &ElementGraph) -> Option<EdgePath> {
        if way.nodes.len() < 2 {
            trace!("Skipping way {}, fewer than two nodes", way.id);
            return None;
        }

        let Some(positions) = graph.way_positions(way) else {
            trace!("Skipping way {}, nodes could not be resolved", way.id);
            return None;
        };

        Some(EdgePath {
            element: way.element_id(),
            members: smallvec![way.element_id()],
            nodes: way.nodes.clone(),
            positions,
            oneway: way.meta.tags.one_way(),
        })
    }

    /// The path through a relation's ways, if every member is a way
    /// present in the graph, and each joins onto the one before it.
    fn relation_path(relation: &Relation, graph: &ElementGraph) -> Option<EdgePath> {
        let ways = relation
            .members()
            .iter()
            .map(|member| match member.id.kind {
                ElementKind::Way => graph.way(member.id.id),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;

        let Some(nodes) = Self::join(&ways) else {
            trace!("Skipping relation {}, not a contiguous path of ways", relation.id);
            return None;
        };

        let Some(positions) = nodes
            .iter()
            .map(|node| graph.node(*node).map(|node| node.position))
            .collect::<Option<Vec<_>>>()
        else {
            trace!("Skipping relation {}, nodes could not be resolved", relation.id);
            return None;
        };

        Some(EdgePath {
            element: relation.element_id(),
            members: ways.iter().map(|way| way.element_id()).collect(),
            nodes,
            positions,
            oneway: ways.iter().all(|way| way.meta.tags.one_way()),
        })
    }

    /// Joins ways end to end into one sequence of nodes. The first way
    /// may be reversed to meet the second, any later way may be
    /// reversed to meet the path so far.
    fn join(ways: &[&Way]) -> Option<Vec<i64>> {
        let (first, rest) = ways.split_first()?;
        if first.nodes.len() < 2 {
            return None;
        }

        let mut nodes = first.nodes.clone();
        for (index, way) in rest.iter().enumerate() {
            let (start, end) = (way.first_node()?, way.last_node()?);
            let (head, tail) = (*nodes.first()?, *nodes.last()?);

            if index == 0 && tail != start && tail != end && (head == start || head == end) {
                nodes.reverse();
            }

            let tail = *nodes.last()?;
            if tail == start {
                nodes.extend(way.nodes.iter().skip(1));
            } else if tail == end {
                nodes.extend(way.nodes.iter().rev().skip(1));
            } else {
                return None;
            }
        }

        Some(nodes)
    }
}
