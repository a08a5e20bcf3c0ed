use approx::assert_relative_eq;
use conflate_fixtures::{BLOCK_A, BLOCK_B, SINGLE_EDGE};
use geo::Point;

use crate::criterion::Criterion;
use crate::element::*;
use crate::graph::ElementGraph;
use crate::network::*;
use crate::util::fixture::{graph_of, lines};

fn highways_of(status: Status) -> NetworkExtractor {
    let mut criterion = Criterion::Status(status);
    criterion.add_criterion(Criterion::Highway);
    NetworkExtractor::new(criterion)
}

#[test_log::test]
fn missing_criterion() {
    let graph = ElementGraph::new();

    assert_eq!(
        NetworkExtractor::default().extract_network(&graph).err(),
        Some(ExtractionError::MissingCriterion)
    );
}

#[test_log::test]
fn single_edge() {
    let graph = graph_of(&[(Status::Unknown1, lines(&[SINGLE_EDGE]))]);
    let network = highways_of(Status::Unknown1)
        .extract_network(&graph)
        .expect("extraction must succeed");

    assert_eq!(network.edge_count(), 1);
    assert_eq!(network.vertex_count(), 2);

    let (index, edge) = network.edges().next().expect("edge must exist");
    assert_eq!(edge.element, ElementId::way(1));
    assert_eq!(edge.members.as_slice(), &[ElementId::way(1)]);
    assert_relative_eq!(edge.length, 92.4, epsilon = 1.0);
    assert!(network.adjacent_edges(index).is_empty());
}

#[test_log::test]
fn block_topology() {
    let graph = graph_of(&[(Status::Unknown2, lines(&BLOCK_B))]);
    let network = highways_of(Status::Unknown2)
        .extract_network(&graph)
        .expect("extraction must succeed");

    assert_eq!(network.edge_count(), 5);
    assert_eq!(network.vertex_count(), 5);

    let edges = network.edges().map(|(index, _)| index).collect::<Vec<_>>();

    // The two northern halves share the midpoint vertex.
    let midpoint = network.shared_vertex(edges[0], edges[1]);
    assert!(midpoint.is_some());
    assert_eq!(network.adjacent_edges(edges[0]), vec![edges[1], edges[2]]);
    assert_eq!(network.adjacent_edges(edges[4]), vec![edges[2], edges[3]]);
}

#[test_log::test]
fn other_dataset_not_extracted() {
    let a = lines(&BLOCK_A);
    let b = lines(&BLOCK_B);
    let graph = graph_of(&[(Status::Unknown1, a), (Status::Unknown2, b)]);

    let network_a = highways_of(Status::Unknown1)
        .extract_network(&graph)
        .expect("extraction must succeed");
    let network_b = highways_of(Status::Unknown2)
        .extract_network(&graph)
        .expect("extraction must succeed");

    assert_eq!(network_a.edge_count(), 4);
    assert_eq!(network_b.edge_count(), 5);
    assert!(highways_of(Status::Conflated)
        .extract_network(&graph)
        .expect("extraction must succeed")
        .is_empty());
}

#[test_log::test]
fn unresolvable_way_skipped() {
    let mut graph = graph_of(&[(Status::Unknown1, lines(&[SINGLE_EDGE]))]);
    let mut way = Way::new(2, Status::Unknown1, vec![1, 404]);
    way.meta.tags.insert("highway", "primary");
    graph.add_element(way);

    let network = highways_of(Status::Unknown1)
        .extract_network(&graph)
        .expect("extraction must succeed");

    assert_eq!(network.edge_count(), 1);
}

#[test_log::test]
fn coincident_nodes_share_a_vertex() {
    let mut graph = graph_of(&[(Status::Unknown1, lines(&[SINGLE_EDGE]))]);

    // A second road starting on a distinct node at the same position.
    graph.add_element(Node::new(10, Status::Unknown1, Point::new(151.201, -33.87)));
    graph.add_element(Node::new(11, Status::Unknown1, Point::new(151.202, -33.87)));
    let mut way = Way::new(2, Status::Unknown1, vec![10, 11]);
    way.meta.tags.insert("highway", "primary");
    graph.add_element(way);

    let network = highways_of(Status::Unknown1)
        .extract_network(&graph)
        .expect("extraction must succeed");

    assert_eq!(network.edge_count(), 2);
    assert_eq!(network.vertex_count(), 3);

    let shared = network
        .vertex_of_node(10)
        .and_then(|vertex| network.vertex(vertex))
        .expect("vertex must exist");
    assert_eq!(shared.nodes.as_slice(), &[2, 10]);
}

#[test_log::test]
fn contiguous_relation_becomes_one_edge() {
    let mut graph = graph_of(&[(Status::Unknown2, lines(&BLOCK_B))]);

    // The northern halves, with the first reversed.
    let mut route = Relation::new(1, Status::Unknown2, "route");
    route.add_member("", ElementId::way(2));
    route.add_member("", ElementId::way(1));
    route.meta_mut().tags.insert("highway", "residential");
    graph.add_element(route);

    let network = highways_of(Status::Unknown2)
        .extract_network(&graph)
        .expect("extraction must succeed");

    assert_eq!(network.edge_count(), 4);

    let (_, edge) = network
        .edges()
        .find(|(_, edge)| edge.element.is_relation())
        .expect("relation edge must exist");

    assert_eq!(edge.members.as_slice(), &[ElementId::way(2), ElementId::way(1)]);
    assert_eq!(edge.geometry.0.len(), 3);
    assert_relative_eq!(edge.length, 184.8, epsilon = 2.0);
}

#[test_log::test]
fn disjoint_relation_not_extracted() {
    let mut graph = graph_of(&[(Status::Unknown2, lines(&BLOCK_B))]);

    // The northern and southern roads never meet.
    let mut route = Relation::new(1, Status::Unknown2, "route");
    route.add_member("", ElementId::way(1));
    route.add_member("", ElementId::way(5));
    graph.add_element(route);

    let network = highways_of(Status::Unknown2)
        .extract_network(&graph)
        .expect("extraction must succeed");

    assert_eq!(network.edge_count(), 5);
    assert!(network.edges().all(|(_, edge)| !edge.element.is_relation()));
}

#[test_log::test]
fn renders_wkt() {
    let graph = graph_of(&[(Status::Unknown1, lines(&[SINGLE_EDGE]))]);
    let network = highways_of(Status::Unknown1)
        .extract_network(&graph)
        .expect("extraction must succeed");

    let wkt = network.to_wkt();
    assert!(wkt.starts_with("GEOMETRYCOLLECTION(LINESTRING"));
}

/// A road ending on the interior node of another.
const T_JUNCTION: [&str; 2] = [
    "LINESTRING(151.2 -33.87,151.201 -33.87,151.202 -33.87)",
    "LINESTRING(151.201 -33.87,151.201 -33.871)",
];

#[test_log::test]
fn interior_junction_splits_way() {
    let graph = graph_of(&[(Status::Unknown1, lines(&T_JUNCTION))]);
    let network = highways_of(Status::Unknown1)
        .extract_network(&graph)
        .expect("extraction must succeed");

    assert_eq!(network.edge_count(), 3);
    assert_eq!(network.vertex_count(), 4);

    let edges = network.edges().collect::<Vec<_>>();
    let elements = edges.iter().map(|(_, edge)| edge.element).collect::<Vec<_>>();
    assert_eq!(
        elements,
        vec![ElementId::way(1), ElementId::way(1), ElementId::way(2)]
    );
    assert!(edges.iter().all(|(_, edge)| edge.geometry.0.len() == 2));
    assert_relative_eq!(edges[0].1.length + edges[1].1.length, 184.8, epsilon = 2.0);

    let (west, east, stem) = (edges[0].0, edges[1].0, edges[2].0);
    let junction = network.vertex_of_node(2).expect("junction must be a vertex");
    assert_eq!(network.shared_vertex(west, stem), Some(junction));
    assert_eq!(network.shared_vertex(east, stem), Some(junction));
    assert_eq!(network.adjacent_edges(stem), vec![west, east]);
    assert_eq!(network.adjacent_edges(west), vec![east, stem]);
}

#[test_log::test]
fn extraction_is_deterministic() {
    let graph = graph_of(&[
        (Status::Unknown2, lines(&BLOCK_B)),
        (Status::Unknown1, lines(&T_JUNCTION)),
    ]);

    // The same elements, inserted in reverse.
    let mut reversed = ElementGraph::new();
    let elements = graph.elements().cloned().collect::<Vec<_>>();
    for element in elements.into_iter().rev() {
        reversed.add_element(element);
    }

    let summary = |graph: &ElementGraph, status: Status| {
        let network = highways_of(status)
            .extract_network(graph)
            .expect("extraction must succeed");
        let edges = network
            .edges()
            .map(|(index, edge)| (edge.element, network.endpoints(index)))
            .collect::<Vec<_>>();
        (network.to_wkt(), edges)
    };

    for status in [Status::Unknown1, Status::Unknown2] {
        let first = summary(&graph, status);
        assert_eq!(first, summary(&graph, status));
        assert_eq!(first, summary(&reversed, status));
    }
}
