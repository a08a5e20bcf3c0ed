//! A weighted bipartite assignment solver.
//!
//! Actors are paired one-to-one with tasks such that the total cost of
//! the pairing is minimal. The cost of each pair is given by a function
//! supplied on construction.
//!
//! ```rust
//! use conflate::assign::AssignmentSolver;
//!
//! let mut solver = AssignmentSolver::new(|a: &f64, t: &f64| (a - t).abs());
//! solver.add_actor(1.0);
//! solver.add_actor(5.0);
//! solver.add_task(4.0);
//! solver.add_task(2.0);
//!
//! assert_eq!(solver.calculate_pairing(), vec![(1.0, 2.0), (5.0, 4.0)]);
//! ```


use log::{debug, trace};
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;

#[cfg(feature = "tracing")]
use tracing::Level;

/// Resolution of the fixed point representation of costs.
///
/// Each cost is rounded to the nearest multiple, so the total cost of a
/// pairing over `n` pairs is within `n * RESOLUTION / 2` of the exact
/// optimum.
pub const RESOLUTION: f64 = 1e-6;

/// Largest magnitude of a single finite cost. Larger costs saturate,
/// keeping every total within the range of the fixed point type.
const COST_LIMIT: f64 = 1e4;

pub struct AssignmentSolver<A, T, F>
where
    F: Fn(&A, &T) -> f64,
{
    actors: Vec<A>,
    tasks: Vec<T>,
    cost: F,
}

impl<A, T, F> AssignmentSolver<A, T, F>
where
    A: Clone,
    T: Clone,
    F: Fn(&A, &T) -> f64,
{
    pub fn new(cost: F) -> Self {
        Self {
            actors: vec![],
            tasks: vec![],
            cost,
        }
    }

    pub fn add_actor(&mut self, actor: A) {
        self.actors.push(actor);
    }

    pub fn add_task(&mut self, task: T) {
        self.tasks.push(task);
    }

    pub fn actors(&self) -> &[A] {
        &self.actors
    }

    pub fn tasks(&self) -> &[T] {
        &self.tasks
    }

    /// Calculates the pairing of least total cost, covering the smaller
    /// of the two sides. Pairs of non-finite cost are forbidden, and are
    /// left out of the result. Pairs are ordered by actor insertion.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip_all))]
    pub fn calculate_pairing(&self) -> Vec<(A, T)> {
        if self.actors.is_empty() || self.tasks.is_empty() {
            return vec![];
        }

        // The solver requires no more rows than columns.
        let transposed = self.actors.len() > self.tasks.len();
        let (rows, columns) = match transposed {
            false => (self.actors.len(), self.tasks.len()),
            true => (self.tasks.len(), self.actors.len()),
        };

        let cost = |row: usize, column: usize| match transposed {
            false => (self.cost)(&self.actors[row], &self.tasks[column]),
            true => (self.cost)(&self.actors[column], &self.tasks[row]),
        };

        let mut costs = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                let value = cost(row, column);
                costs.push(value.is_finite().then(|| fixed_point(value)));
            }
        }

        // A forbidden pair costs more than the spread of any assignment
        // of permitted pairs, so is never chosen while an alternative exists.
        let largest = costs.iter().flatten().map(|c| c.unsigned_abs()).max().unwrap_or(0);
        let forbidden = i64::try_from(largest)
            .unwrap_or(i64::MAX)
            .saturating_mul(2)
            .saturating_mul(rows as i64)
            .saturating_add(1)
            .min(i64::MAX / (rows as i64 + 1));

        let mut matrix = Matrix::new(rows, columns, 0i64);
        for (index, value) in costs.iter().enumerate() {
            matrix[(index / columns, index % columns)] = value.unwrap_or(forbidden);
        }

        let (total, assignment) = kuhn_munkres_min(&matrix);
        debug!(
            "Solved {rows}x{columns} assignment, total cost {:.6}",
            total as f64 * RESOLUTION
        );

        let mut pairing = assignment
            .into_iter()
            .enumerate()
            .filter(|(row, column)| costs[row * columns + column].is_some())
            .map(|(row, column)| match transposed {
                false => (row, column),
                true => (column, row),
            })
            .collect::<Vec<_>>();

        pairing.sort_unstable();
        trace!("Pairing: {pairing:?}");

        pairing
            .into_iter()
            .map(|(actor, task)| (self.actors[actor].clone(), self.tasks[task].clone()))
            .collect()
    }
}

#[inline]
fn fixed_point(cost: f64) -> i64 {
    (cost.clamp(-COST_LIMIT, COST_LIMIT) / RESOLUTION).round() as i64
}
