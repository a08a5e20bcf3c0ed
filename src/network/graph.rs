use geo::{Distance, Haversine, LineString, Point};
use itertools::Itertools;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::AABB;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};
use wkt::ToWkt;

use crate::element::{ElementId, Envelope};

/// Key identifying an exact position.
pub(crate) fn position_key(position: &Point) -> (u64, u64) {
    (position.x().to_bits(), position.y().to_bits())
}

/// A junction or terminus of the network.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkVertex {
    /// The nodes bound to this vertex. Nodes sharing a position
    /// collapse into a single vertex.
    pub nodes: SmallVec<[i64; 2]>,
    pub position: Point,
}

/// One way, or a relation of contiguous ways, between two vertices.
/// A path crossed by another at an interior node is split there, each
/// piece becoming its own edge of the same element.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkEdge {
    /// The element this edge abstracts.
    pub element: ElementId,

    /// The ways composing the edge, in travel order.
    pub members: SmallVec<[ElementId; 1]>,

    /// Geometry from the start vertex to the end vertex.
    pub geometry: LineString,

    /// Haversine length of the geometry, in metres.
    pub length: f64,

    pub oneway: bool,
}

impl NetworkEdge {
    pub fn new(
        element: ElementId,
        members: SmallVec<[ElementId; 1]>,
        geometry: LineString,
        oneway: bool,
    ) -> Self {
        let length = geometry
            .lines()
            .map(|line| Haversine.distance(Point::from(line.start), Point::from(line.end)))
            .sum();

        Self {
            element,
            members,
            geometry,
            length,
            oneway,
        }
    }

    pub fn envelope(&self) -> Envelope {
        AABB::from_points(self.geometry.points().collect::<Vec<_>>().iter())
    }
}

/// A road network of a single dataset.
#[derive(Clone, Default)]
pub struct NetworkGraph {
    graph: UnGraph<NetworkVertex, NetworkEdge>,

    /// Vertex bound to each node.
    vertices: FxHashMap<i64, NodeIndex>,
    /// Vertex at each exact position.
    positions: FxHashMap<(u64, u64), NodeIndex>,
}

impl Debug for NetworkGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NetworkGraph with Vertices: {}, Edges: {}",
            self.graph.node_count(),
            self.graph.edge_count()
        )
    }
}

impl NetworkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// A network without any edge cannot be matched.
    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// Returns the vertex for `node`, creating one at `position` if
    /// no vertex yet binds the node or occupies the position.
    pub(crate) fn vertex_at(&mut self, node: i64, position: Point) -> NodeIndex {
        if let Some(vertex) = self.vertices.get(&node) {
            return *vertex;
        }

        let key = position_key(&position);
        let vertex = match self.positions.get(&key) {
            Some(vertex) => {
                self.graph[*vertex].nodes.push(node);
                *vertex
            }
            None => {
                let vertex = self.graph.add_node(NetworkVertex {
                    nodes: SmallVec::from_elem(node, 1),
                    position,
                });
                self.positions.insert(key, vertex);
                vertex
            }
        };

        self.vertices.insert(node, vertex);
        vertex
    }

    pub(crate) fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        edge: NetworkEdge,
    ) -> EdgeIndex {
        self.graph.add_edge(from, to, edge)
    }

    pub fn vertex(&self, index: NodeIndex) -> Option<&NetworkVertex> {
        self.graph.node_weight(index)
    }

    pub fn vertex_of_node(&self, node: i64) -> Option<NodeIndex> {
        self.vertices.get(&node).copied()
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&NetworkEdge> {
        self.graph.edge_weight(index)
    }

    /// The (start, end) vertices of an edge.
    pub fn endpoints(&self, index: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(index)
    }

    /// Every edge, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &NetworkEdge)> {
        self.graph
            .edge_references()
            .map(|edge| (edge.id(), edge.weight()))
    }

    pub fn edges_at(&self, vertex: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(vertex).map(|edge| edge.id()).unique()
    }

    /// Edges sharing a vertex with `index`, excluding itself.
    pub fn adjacent_edges(&self, index: EdgeIndex) -> Vec<EdgeIndex> {
        let Some((start, end)) = self.endpoints(index) else {
            return vec![];
        };

        self.edges_at(start)
            .chain(self.edges_at(end))
            .filter(|edge| *edge != index)
            .unique()
            .sorted()
            .collect()
    }

    /// The vertex shared by two distinct edges, if any.
    pub fn shared_vertex(&self, a: EdgeIndex, b: EdgeIndex) -> Option<NodeIndex> {
        let (a_start, a_end) = self.endpoints(a)?;
        let (b_start, b_end) = self.endpoints(b)?;

        [a_start, a_end]
            .into_iter()
            .find(|vertex| *vertex == b_start || *vertex == b_end)
    }

    /// Renders the network as a WKT `GEOMETRYCOLLECTION` of its edges.
    pub fn to_wkt(&self) -> String {
        let lines = self
            .edges()
            .map(|(_, edge)| edge.geometry.wkt_string())
            .join(",");

        format!("GEOMETRYCOLLECTION({lines})")
    }
}
