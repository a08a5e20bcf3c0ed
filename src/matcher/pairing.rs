//! Selection of a one-to-one pairing amongst scored candidates.
//!
//! Both rules return indices into the candidate list, in ascending
//! order. No edge of the first network appears twice, nor does any
//! edge of the second, whether alone or within a chain.

use itertools::Itertools;
use log::trace;
use petgraph::unionfind::UnionFind;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

use crate::assign::AssignmentSolver;
use crate::matcher::candidate::{EdgeMatch, Target};
use crate::network::EdgeIndex;

/// Orders candidates best first, ties broken by position for stability.
fn by_score(candidates: &[EdgeMatch], a: usize, b: usize) -> Ordering {
    candidates[b]
        .score
        .total_cmp(&candidates[a].score)
        .then(a.cmp(&b))
}

/// Keeps the best of the chosen candidates whose chains overlap.
fn claim_edges(candidates: &[EdgeMatch], targets: &[Target], chosen: Vec<usize>) -> Vec<usize> {
    let mut claimed = FxHashSet::<EdgeIndex>::default();

    chosen
        .into_iter()
        .sorted_by(|a, b| by_score(candidates, *a, *b))
        .filter(|index| {
            let edges = targets[candidates[*index].target].chain.edges();
            if edges.iter().any(|edge| claimed.contains(edge)) {
                trace!("Dropped candidate {index}, chain overlaps a better pair");
                return false;
            }

            claimed.extend(edges.iter().copied());
            true
        })
        .sorted()
        .collect()
}

/// Takes candidates highest score first, skipping any whose edges
/// are already taken.
pub(crate) fn greedy(candidates: &[EdgeMatch], targets: &[Target]) -> Vec<usize> {
    let mut actors = FxHashSet::<EdgeIndex>::default();
    let mut tasks = FxHashSet::<usize>::default();

    let chosen = (0..candidates.len())
        .sorted_by(|a, b| by_score(candidates, *a, *b))
        .filter(|index| {
            let candidate = &candidates[*index];
            if actors.contains(&candidate.a) || tasks.contains(&candidate.target) {
                return false;
            }

            actors.insert(candidate.a);
            tasks.insert(candidate.target);
            true
        })
        .collect();

    claim_edges(candidates, targets, chosen)
}

/// Solves the pairing of least total inverse score. Candidates which
/// share no edge, directly or transitively, are solved independently.
pub(crate) fn assignment(candidates: &[EdgeMatch], targets: &[Target]) -> Vec<usize> {
    let actors = candidates.iter().map(|c| c.a).unique().collect::<Vec<_>>();
    let actor_slot = actors
        .iter()
        .enumerate()
        .map(|(slot, edge)| (*edge, slot))
        .collect::<FxHashMap<_, _>>();

    let lookup = candidates
        .iter()
        .enumerate()
        .map(|(index, c)| ((c.a, c.target), index))
        .collect::<FxHashMap<_, _>>();

    // Slots are actors first, followed by targets.
    let mut components = UnionFind::<usize>::new(actors.len() + targets.len());
    for candidate in candidates {
        components.union(actor_slot[&candidate.a], actors.len() + candidate.target);
    }

    let grouped = candidates
        .iter()
        .into_group_map_by(|candidate| components.find(actor_slot[&candidate.a]));

    let mut chosen = vec![];
    for (_, members) in grouped.into_iter().sorted_by_key(|(root, _)| *root) {
        let mut solver = AssignmentSolver::new(|a: &EdgeIndex, t: &usize| {
            lookup
                .get(&(*a, *t))
                .map_or(f64::INFINITY, |index| 1.0 / candidates[*index].score)
        });

        members.iter().map(|c| c.a).unique().for_each(|a| solver.add_actor(a));
        members
            .iter()
            .map(|c| c.target)
            .unique()
            .for_each(|t| solver.add_task(t));

        chosen.extend(
            solver
                .calculate_pairing()
                .into_iter()
                .filter_map(|pair| lookup.get(&pair).copied()),
        );
    }

    claim_edges(candidates, targets, chosen)
}
