use approx::assert_relative_eq;
use conflate_fixtures::{BLOCK_A, BLOCK_B, BLOCK_FAR, SINGLE_EDGE};
use itertools::Itertools;

use crate::config::ConfigError;
use crate::criterion::Criterion;
use crate::element::{ElementId, Status};
use crate::graph::ElementGraph;
use crate::matcher::*;
use crate::network::{NetworkExtractor, NetworkGraph};
use crate::util::fixture::{graph_of, lines};

fn networks(a: &[&str], b: &[&str]) -> (ElementGraph, NetworkGraph, NetworkGraph) {
    let graph = graph_of(&[(Status::Unknown1, lines(a)), (Status::Unknown2, lines(b))]);

    let extract = |status| {
        let mut criterion = Criterion::Status(status);
        criterion.add_criterion(Criterion::Highway);
        NetworkExtractor::new(criterion)
            .extract_network(&graph)
            .expect("extraction must succeed")
    };

    let (network_a, network_b) = (extract(Status::Unknown1), extract(Status::Unknown2));
    (graph, network_a, network_b)
}

fn settings(iterations: usize) -> MatcherSettings {
    MatcherSettings {
        num_iterations: iterations,
        ..MatcherSettings::default()
    }
}

/// Runs every stage of the matcher through to finalization.
fn run(kind: NetworkMatcherKind, settings: MatcherSettings, a: &[&str], b: &[&str]) -> NetworkMatcher {
    let (graph, network_a, network_b) = networks(a, b);
    let mut matcher = NetworkMatcher::new(kind, settings).expect("settings must be valid");

    matcher
        .match_networks(&graph, network_a, network_b)
        .expect("networks must match");
    for _ in 0..settings.num_iterations {
        matcher.iterate().expect("iteration must succeed");
    }
    matcher.finalize().expect("must finalize");

    matcher
}

fn pairs(matcher: &NetworkMatcher) -> Vec<(ElementId, Vec<ElementId>)> {
    matcher
        .all_edge_scores()
        .expect("matcher must be finalized")
        .iter()
        .map(|score| (score.a, score.b.to_vec()))
        .sorted()
        .collect()
}

#[test_log::test]
fn zero_iterations_rejected() {
    let result = NetworkMatcher::new(NetworkMatcherKind::Assignment, settings(0));
    assert_eq!(result.err(), Some(ConfigError::InvalidIterations(0)));
}

#[test_log::test]
fn empty_network_rejected() {
    let (graph, network_a, _) = networks(&[SINGLE_EDGE], &[]);
    let mut matcher =
        NetworkMatcher::new(NetworkMatcherKind::Assignment, settings(1)).expect("valid");

    assert_eq!(
        matcher.match_networks(&graph, NetworkGraph::new(), network_a.clone()),
        Err(MatchError::EmptyNetwork(NetworkSide::A))
    );
    assert_eq!(
        matcher.match_networks(&graph, network_a, NetworkGraph::new()),
        Err(MatchError::EmptyNetwork(NetworkSide::B))
    );
    assert_eq!(matcher.state(), MatchState::Created);
}

#[test_log::test]
fn stages_out_of_order_rejected() {
    let (graph, network_a, network_b) = networks(&[SINGLE_EDGE], &[SINGLE_EDGE]);
    let mut matcher =
        NetworkMatcher::new(NetworkMatcherKind::Assignment, settings(1)).expect("valid");

    assert!(matches!(
        matcher.iterate(),
        Err(MatchError::InvalidState { state: MatchState::Created, .. })
    ));
    assert!(matcher.all_edge_scores().is_err());

    matcher
        .match_networks(&graph, network_a.clone(), network_b.clone())
        .expect("networks must match");
    assert!(matches!(
        matcher.match_networks(&graph, network_a, network_b),
        Err(MatchError::InvalidState { state: MatchState::Matched, .. })
    ));
    assert!(matcher.match_threshold().is_err());
}

#[test_log::test]
fn early_finalize_rejected() {
    let (graph, network_a, network_b) = networks(&[SINGLE_EDGE], &[SINGLE_EDGE]);
    let mut matcher =
        NetworkMatcher::new(NetworkMatcherKind::Assignment, settings(3)).expect("valid");

    matcher
        .match_networks(&graph, network_a, network_b)
        .expect("networks must match");
    assert_eq!(
        matcher.finalize(),
        Err(MatchError::PrematureFinalize {
            completed: 0,
            required: 3
        })
    );

    matcher.iterate().expect("iteration must succeed");
    assert_eq!(
        matcher.finalize(),
        Err(MatchError::PrematureFinalize {
            completed: 1,
            required: 3
        })
    );
    assert_eq!(matcher.state(), MatchState::Iterating(1));

    matcher.iterate().expect("iteration must succeed");
    matcher.iterate().expect("iteration must succeed");
    assert_eq!(matcher.finalize(), Ok(()));
}

#[test_log::test]
fn iterations_exhausted() {
    let (graph, network_a, network_b) = networks(&[SINGLE_EDGE], &[SINGLE_EDGE]);
    let mut matcher =
        NetworkMatcher::new(NetworkMatcherKind::Greedy, settings(1)).expect("valid");

    matcher
        .match_networks(&graph, network_a, network_b)
        .expect("networks must match");
    matcher.iterate().expect("iteration must succeed");
    assert_eq!(matcher.iterate(), Err(MatchError::IterationsExhausted(1)));
    assert_eq!(matcher.state(), MatchState::Iterating(1));

    matcher.finalize().expect("must finalize");
    assert_eq!(
        matcher.finalize(),
        Err(MatchError::InvalidState {
            operation: "finalize",
            state: MatchState::Finalized
        })
    );
}

#[test_log::test]
fn identical_edge() {
    let settings = MatcherSettings {
        search_radius: 50.0,
        ..settings(2)
    };
    let matcher = run(
        NetworkMatcherKind::Assignment,
        settings,
        &[SINGLE_EDGE],
        &[SINGLE_EDGE],
    );

    let scores = matcher.all_edge_scores().expect("finalized");
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].a, ElementId::way(1));
    assert_eq!(scores[0].b.as_slice(), &[ElementId::way(2)]);
    assert_relative_eq!(scores[0].score, 1.0, epsilon = 1e-9);
    assert_eq!(matcher.match_threshold(), Ok(0.15));
}

#[test_log::test]
fn block_pairs_split_road_with_chain() {
    let matcher = run(
        NetworkMatcherKind::Assignment,
        settings(3),
        &BLOCK_A,
        &BLOCK_B,
    );

    // Ways 1 through 4 are of the first block, 5 through 9 of the second.
    let expected = vec![
        (ElementId::way(1), vec![ElementId::way(5), ElementId::way(6)]),
        (ElementId::way(2), vec![ElementId::way(7)]),
        (ElementId::way(3), vec![ElementId::way(8)]),
        (ElementId::way(4), vec![ElementId::way(9)]),
    ];
    assert_eq!(pairs(&matcher), expected);

    for score in matcher.all_edge_scores().expect("finalized") {
        assert!(score.score > 0.8, "{} scored {}", score.uid, score.score);
        assert!(score.score <= 1.0);
    }
}

#[test_log::test]
fn support_raises_connected_scores() {
    let (graph, network_a, network_b) = networks(&BLOCK_A, &BLOCK_B);
    let mut matcher =
        NetworkMatcher::new(NetworkMatcherKind::Assignment, settings(1)).expect("valid");
    matcher
        .match_networks(&graph, network_a, network_b)
        .expect("networks must match");

    let before = matcher
        .current_pairing()
        .map(|candidate| candidate.score)
        .collect::<Vec<_>>();
    matcher.iterate().expect("iteration must succeed");

    // Every neighbour is paired onto a touching chain, so support is full.
    for (candidate, before) in matcher.current_pairing().zip(before) {
        assert_relative_eq!(candidate.similarity, before);
        assert_relative_eq!(candidate.score, 0.5 * before + 0.5, epsilon = 1e-12);
    }
}

#[test_log::test]
fn far_apart_yields_no_scores() {
    let matcher = run(
        NetworkMatcherKind::Assignment,
        settings(2),
        &BLOCK_A,
        &BLOCK_FAR,
    );

    assert!(matcher.candidates().is_empty());
    assert!(matcher.all_edge_scores().expect("finalized").is_empty());
}

#[test_log::test]
fn radius_bounds_candidates() {
    let settings = MatcherSettings {
        search_radius: 1.0,
        ..settings(1)
    };
    let matcher = run(NetworkMatcherKind::Assignment, settings, &BLOCK_A, &BLOCK_B);

    // The blocks lie roughly 3m apart.
    assert!(matcher.candidates().is_empty());
}

#[test_log::test]
fn greedy_agrees_with_assignment() {
    let assignment = run(
        NetworkMatcherKind::Assignment,
        settings(2),
        &BLOCK_A,
        &BLOCK_B,
    );
    let greedy = run(NetworkMatcherKind::Greedy, settings(2), &BLOCK_A, &BLOCK_B);

    assert_eq!(pairs(&assignment), pairs(&greedy));
}

#[test_log::test]
fn pairing_rendered_as_wkt() {
    let matcher = run(
        NetworkMatcherKind::Greedy,
        settings(1),
        &[SINGLE_EDGE],
        &[SINGLE_EDGE],
    );

    let wkt = matcher.pairing_wkt();
    assert!(wkt.starts_with("GEOMETRYCOLLECTION(MULTILINESTRING("));
    assert_eq!(wkt.matches("MULTILINESTRING").count(), 1);
}

#[test_log::test]
fn registry_names() {
    let registry = MatcherRegistry::default();
    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec!["AssignmentNetworkMatcher", "GreedyNetworkMatcher"]
    );

    let matcher = registry
        .create("GreedyNetworkMatcher", MatcherSettings::default())
        .expect("registered");
    assert_eq!(matcher.kind(), NetworkMatcherKind::Greedy);
    assert_eq!(
        registry.kind("ConflictsNetworkMatcher"),
        Err(ConfigError::UnknownMatcher("ConflictsNetworkMatcher".to_string()))
    );
}
