use approx::assert_relative_eq;
use conflate_fixtures::{BLOCK_A, BLOCK_B, BLOCK_FAR, SINGLE_EDGE};
use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ConflateConfig;
use crate::creator::*;
use crate::element::{ElementId, Status, Tags};
use crate::graph::ElementGraph;
use crate::matcher::{MatchError, NetworkSide};
use crate::score::MatchType;
use crate::util::fixture::{graph_of, lines};
use crate::Error;

/// [`SINGLE_EDGE`] moved roughly 22m to the north.
const PARALLEL_EDGE: &str = "LINESTRING(151.2 -33.8698,151.201 -33.8698)";

fn creator(config: ConflateConfig) -> NetworkMatchCreator {
    NetworkMatchCreator::new(config).expect("configuration must be valid")
}

fn config(iterations: usize) -> ConflateConfig {
    ConflateConfig {
        num_iterations: iterations,
        ..ConflateConfig::default()
    }
}

fn run(creator: &mut NetworkMatchCreator, graph: &ElementGraph) -> crate::Result<Vec<NetworkMatch>> {
    let threshold = creator.match_threshold().expect("threshold must be valid");
    let mut matches = vec![];
    creator.create_matches(graph, &mut matches, &threshold)?;
    Ok(matches)
}

#[test_log::test]
fn identical_edge_matches() {
    let graph = graph_of(&[
        (Status::Unknown1, lines(&[SINGLE_EDGE])),
        (Status::Unknown2, lines(&[SINGLE_EDGE])),
    ]);
    let config = ConflateConfig {
        search_radius: 50.0,
        ..config(3)
    };

    let matches = run(&mut creator(config), &graph).expect("run must succeed");
    assert_eq!(matches.len(), 1);

    let found = &matches[0];
    assert_eq!(found.match_type, MatchType::Match);
    assert_eq!(
        found.elements().collect::<Vec<_>>(),
        vec![ElementId::way(1), ElementId::way(2)]
    );
    assert_relative_eq!(found.score, 1.0, epsilon = 1e-9);
    assert_relative_eq!(found.confidence, 0.8 / (1.0 + (-6.0f64).exp()), epsilon = 1e-9);
    assert_relative_eq!(
        found.classification.match_p + found.classification.miss_p,
        1.0
    );
}

#[test_log::test]
fn appends_to_existing_matches() {
    let graph = graph_of(&[
        (Status::Unknown1, lines(&[SINGLE_EDGE])),
        (Status::Unknown2, lines(&[SINGLE_EDGE])),
    ]);
    let mut roads = creator(config(1));
    let threshold = roads.match_threshold().expect("threshold must be valid");

    let mut matches = vec![];
    roads
        .create_matches(&graph, &mut matches, &threshold)
        .expect("run must succeed");
    roads
        .create_matches(&graph, &mut matches, &threshold)
        .expect("run must succeed");

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0], matches[1]);
}

#[test_log::test]
fn distant_parallel_edge_is_miss() {
    let graph = graph_of(&[
        (Status::Unknown1, lines(&[SINGLE_EDGE])),
        (Status::Unknown2, lines(&[PARALLEL_EDGE])),
    ]);

    // Within the 30m feature dependent radius, but a poor fit.
    let matches = run(&mut creator(config(2)), &graph).expect("run must succeed");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_type, MatchType::Miss);
    assert!(matches[0].score > 0.15);
}

#[test_log::test]
fn block_matches_every_road() {
    let graph = graph_of(&[
        (Status::Unknown1, lines(&BLOCK_A)),
        (Status::Unknown2, lines(&BLOCK_B)),
    ]);

    let matches = run(&mut creator(config(5)), &graph).expect("run must succeed");
    assert_eq!(matches.len(), 4);
    assert!(matches
        .iter()
        .all(|found| found.match_type == MatchType::Match));
}

#[test_log::test]
fn far_apart_no_matches() {
    let graph = graph_of(&[
        (Status::Unknown1, lines(&BLOCK_A)),
        (Status::Unknown2, lines(&BLOCK_FAR)),
    ]);

    let matches = run(&mut creator(config(2)), &graph).expect("run must succeed");
    assert!(matches.is_empty());
}

#[test_log::test]
fn missing_dataset_is_error() {
    let graph = graph_of(&[(Status::Unknown1, lines(&[SINGLE_EDGE]))]);

    assert_eq!(
        run(&mut creator(config(1)), &graph),
        Err(Error::Match(MatchError::EmptyNetwork(NetworkSide::B)))
    );
}

#[test_log::test]
fn cancelled_before_iterating() {
    let graph = graph_of(&[
        (Status::Unknown1, lines(&[SINGLE_EDGE])),
        (Status::Unknown2, lines(&[SINGLE_EDGE])),
    ]);

    let token = CancellationToken::new();
    let mut cancelled = creator(config(2)).with_cancellation(token.clone());
    token.cancel();

    assert!(cancelled.cancellation().is_cancelled());
    assert_eq!(run(&mut cancelled, &graph), Err(Error::Cancelled));
}

#[test_log::test]
fn sink_receives_every_stage() {
    let graph = graph_of(&[
        (Status::Unknown1, lines(&[SINGLE_EDGE])),
        (Status::Unknown2, lines(&[SINGLE_EDGE])),
    ]);

    let stages = Rc::new(RefCell::new(vec![]));
    let recorded = stages.clone();
    let mut recording = creator(config(2)).with_sink(move |stage: &str, wkt: &str| {
        assert!(wkt.starts_with("GEOMETRYCOLLECTION"));
        recorded.borrow_mut().push(stage.to_string());
    });

    run(&mut recording, &graph).expect("run must succeed");
    assert_eq!(
        *stages.borrow(),
        vec![
            "match-initial",
            "match-iteration-1",
            "match-iteration-2",
            "match-after-final-iteration"
        ]
    );
}

#[test_log::test]
fn special_and_filtered_elements_excluded() {
    let mut graph = graph_of(&[(Status::Unknown1, lines(&[SINGLE_EDGE, PARALLEL_EDGE]))]);
    graph
        .way_mut(2)
        .expect("way must exist")
        .meta
        .tags
        .insert(Tags::SPECIAL, "yes");

    let roads = creator(config(1));
    let way = |id| graph.element(&ElementId::way(id)).expect("way must exist");
    assert!(roads.is_match_candidate(way(1), &graph));
    assert!(!roads.is_match_candidate(way(2), &graph));

    let node = graph.element(&ElementId::node(1)).expect("node must exist");
    assert!(!roads.is_match_candidate(node, &graph));

    let bridges = creator(ConflateConfig {
        filters: vec!["TagKeyCriterion=bridge".to_string()],
        ..config(1)
    });
    assert!(!bridges.is_match_candidate(way(1), &graph));
}

#[test_log::test]
fn describes_itself() {
    let creators = NetworkMatchCreator::all_creators();

    assert_eq!(creators.len(), 1);
    assert_eq!(creators[0].name, "NetworkMatchCreator");
    assert_eq!(creators[0].base_feature_type, BaseFeatureType::Highway);
    assert!(!creators[0].experimental);
    assert_eq!(creator(config(1)).criteria(), vec!["HighwayCriterion"]);
}
