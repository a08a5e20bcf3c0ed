use geo::LineString;
use rustc_hash::FxHashMap;

use crate::element::{ElementMeta, Node, Status, Tags, Way};
use crate::graph::ElementGraph;

/// Builds an element graph holding one road per linestring. Within a
/// dataset, repeated positions become the same node.
pub(crate) fn graph_of(datasets: &[(Status, Vec<LineString>)]) -> ElementGraph {
    let mut graph = ElementGraph::new();
    let (mut next_node, mut next_way) = (1, 1);

    for (status, lines) in datasets {
        let mut nodes = FxHashMap::<(u64, u64), i64>::default();

        for line in lines.iter() {
            let refs = line
                .points()
                .map(|point| {
                    *nodes
                        .entry((point.x().to_bits(), point.y().to_bits()))
                        .or_insert_with(|| {
                            let id = next_node;
                            next_node += 1;
                            graph.add_element(Node::new(id, *status, point));
                            id
                        })
                })
                .collect::<Vec<_>>();

            let tags = [("highway", "residential")].into_iter().collect::<Tags>();
            graph.add_element(
                Way::new(next_way, *status, refs).with_meta(ElementMeta::with_tags(tags)),
            );
            next_way += 1;
        }
    }

    graph
}

pub(crate) fn lines(scenario: &[&str]) -> Vec<LineString> {
    conflate_fixtures::linestrings(scenario).expect("fixture must parse")
}
