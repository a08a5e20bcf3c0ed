use geo::{Distance, Haversine, LineString, Point};
use itertools::Itertools;
use rstar::RTreeObject;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

use crate::element::{ElementId, Envelope};
use crate::network::{EdgeIndex, NetworkGraph, VertexIndex};

/// One edge, or two contiguous edges, of the second network.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeChain(pub SmallVec<[EdgeIndex; 2]>);

impl EdgeChain {
    pub fn single(edge: EdgeIndex) -> Self {
        EdgeChain(SmallVec::from_elem(edge, 1))
    }

    pub fn edges(&self) -> &[EdgeIndex] {
        &self.0
    }

    pub fn contains(&self, edge: &EdgeIndex) -> bool {
        self.0.contains(edge)
    }
}

impl Display for EdgeChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.iter().map(|edge| edge.index()).join(","))
    }
}

/// A chain of the second network, with its joined geometry.
#[derive(Clone, Debug)]
pub(crate) struct Target {
    pub chain: EdgeChain,
    pub geometry: LineString,
    pub length: f64,
    pub circular_error: f64,
    pub envelope: Envelope,

    /// Every vertex the chain touches.
    pub vertices: SmallVec<[VertexIndex; 3]>,
}

impl Target {
    /// Joins the edges of `chain` end to end, through the vertex they
    /// share. Returns `None` if the edges do not meet.
    pub fn new(network: &NetworkGraph, chain: EdgeChain, circular_error: f64) -> Option<Self> {
        let (geometry, vertices) = match chain.edges() {
            [edge] => {
                let (start, end) = network.endpoints(*edge)?;
                let geometry = network.edge(*edge)?.geometry.clone();
                (geometry, SmallVec::from_slice(&[start, end]))
            }
            [first, second] => {
                let shared = network.shared_vertex(*first, *second)?;
                let (first_start, first_end) = network.endpoints(*first)?;
                let (second_start, second_end) = network.endpoints(*second)?;

                // Orient the first edge to finish, and the second to start, on the shared vertex.
                let mut points = Self::oriented(network, *first, first_end == shared)?;
                let tail = Self::oriented(network, *second, second_start == shared)?;
                points.extend(tail.into_iter().skip(1));

                let outer = |start, end| if start == shared { end } else { start };
                let vertices = SmallVec::from_slice(&[
                    outer(first_start, first_end),
                    shared,
                    outer(second_start, second_end),
                ]);

                (LineString::from(points), vertices)
            }
            _ => return None,
        };

        let length = geometry
            .lines()
            .map(|line| Haversine.distance(Point::from(line.start), Point::from(line.end)))
            .sum();
        let envelope = Envelope::from_points(geometry.points().collect::<Vec<_>>().iter());

        Some(Target {
            chain,
            geometry,
            length,
            circular_error,
            envelope,
            vertices,
        })
    }

    fn oriented(network: &NetworkGraph, edge: EdgeIndex, forward: bool) -> Option<Vec<Point>> {
        let mut points = network.edge(edge)?.geometry.points().collect::<Vec<_>>();
        if !forward {
            points.reverse();
        }

        Some(points)
    }

    /// Whether the chains meet or overlap.
    pub fn touches(&self, other: &Target) -> bool {
        self.vertices
            .iter()
            .any(|vertex| other.vertices.contains(vertex))
    }
}

/// Entry of the target spatial index.
pub(crate) struct IndexedTarget {
    pub index: usize,
    pub envelope: Envelope,
}

impl RTreeObject for IndexedTarget {
    type Envelope = Envelope;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A plausible correspondence between an edge of the first network and
/// a chain of the second.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeMatch {
    pub a: EdgeIndex,
    pub b: EdgeChain,

    /// Index of the chain amongst the matcher's targets.
    pub(crate) target: usize,

    /// Geometric similarity, fixed once matched.
    pub similarity: f64,

    /// Similarity blended with topological support, updated by each iteration.
    pub score: f64,
}

/// The final score of a paired edge, as emitted by the matcher.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetworkEdgeScore {
    /// Identifies the pair, stable across runs over the same input.
    pub uid: String,

    /// The element abstracted by the edge of the first network.
    pub a: ElementId,

    /// The elements abstracted by the chain of the second network.
    pub b: SmallVec<[ElementId; 2]>,

    pub score: f64,
}

impl NetworkEdgeScore {
    pub fn new(a: ElementId, b: SmallVec<[ElementId; 2]>, score: f64) -> Self {
        let uid = format!("{a}|{}", b.iter().join(";"));
        Self { uid, a, b, score }
    }
}
