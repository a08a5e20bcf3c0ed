//! Strategies judging how alike two edges are.
//!
//! Each strategy implements [`Strategy`] over the [`SimilarityContext`]
//! of a candidate pair, returning a value in `[0, 1]`. The aggregate
//! [`SimilarityStrategies`] combines them into a single similarity.
//!
//! ```rust
//! use conflate::matcher::{SimilarityContext, Strategy};
//!
//! /// Considers every pair of edges alike.
//! struct Indifferent;
//!
//! impl<'a> Strategy<SimilarityContext<'a>> for Indifferent {
//!     const INFLUENCE: f64 = 0.0;
//!
//!     fn calculate(&self, _: SimilarityContext<'a>) -> f64 {
//!         1.0
//!     }
//! }
//! ```
//!
//! ### Default Strategies:
//! - [`DistanceSimilarity`]: How far apart the edges lie.
//! - [`LengthSimilarity`]: How alike their lengths are.
//! - [`HeadingSimilarity`]: How parallel they run.

use geo::LineString;

use crate::matcher::geometry::{end_to_end_bearing, hausdorff};

pub trait Strategy<Ctx> {
    /// The share of the similarity this strategy decides. A strategy of
    /// influence `1` can veto a pair outright, one of `0` is ignored.
    const INFLUENCE: f64;

    /// The similarity you must implement, in `[0, 1]`.
    fn calculate(&self, context: Ctx) -> f64;

    /// The calculated similarity, weighted by the strategy's influence.
    ///
    /// ```math
    /// weighted(value) = (1 - influence) + influence * value
    /// ```
    #[inline(always)]
    fn weighted(&self, context: Ctx) -> f64 {
        (1.0 - Self::INFLUENCE) + Self::INFLUENCE * self.calculate(context).clamp(0.0, 1.0)
    }
}

pub trait SimilarityStrategy: for<'a> Strategy<SimilarityContext<'a>> {}
impl<T> SimilarityStrategy for T where T: for<'a> Strategy<SimilarityContext<'a>> {}

/// Anything able to score the similarity of a candidate pair.
pub trait Similarity {
    fn similarity(&self, context: SimilarityContext) -> f64;
}

#[derive(Clone, Copy, Debug)]
pub struct SimilarityContext<'a> {
    /// Geometry of the edge of the first network.
    pub a: &'a LineString,

    /// Geometry of the edge, or chain of edges, of the second network.
    pub b: &'a LineString,

    /// Lengths, in metres, of `a` and `b`.
    pub lengths: (f64, f64),

    /// Distance, in metres, beyond which two edges cannot correspond.
    pub radius: f64,
}

/// The Hausdorff distance between the edges relative to the radius.
/// Edges further apart than the radius are entirely dissimilar.
#[derive(Clone, Copy, Debug, Default)]
pub struct DistanceSimilarity;

impl<'a> Strategy<SimilarityContext<'a>> for DistanceSimilarity {
    const INFLUENCE: f64 = 1.0;

    fn calculate(&self, context: SimilarityContext<'a>) -> f64 {
        if context.radius <= 0.0 {
            return 0.0;
        }

        1.0 - hausdorff(context.a, context.b) / context.radius
    }
}

/// Ratio of the shorter length to the longer.
#[derive(Clone, Copy, Debug, Default)]
pub struct LengthSimilarity;

impl<'a> Strategy<SimilarityContext<'a>> for LengthSimilarity {
    const INFLUENCE: f64 = 0.5;

    fn calculate(&self, context: SimilarityContext<'a>) -> f64 {
        let (a, b) = context.lengths;
        let longest = a.max(b);
        if longest <= 0.0 {
            return 1.0;
        }

        a.min(b) / longest
    }
}

/// Magnitude of the cosine between the end-to-end bearings. Edges
/// are undirected, so antiparallel edges are as alike as parallel ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadingSimilarity;

impl<'a> Strategy<SimilarityContext<'a>> for HeadingSimilarity {
    const INFLUENCE: f64 = 0.5;

    fn calculate(&self, context: SimilarityContext<'a>) -> f64 {
        match (end_to_end_bearing(context.a), end_to_end_bearing(context.b)) {
            (Some(a), Some(b)) => (a - b).to_radians().cos().abs(),
            // Loops carry no heading to compare
            _ => 1.0,
        }
    }
}

/// Product of the weighted distance, length and heading similarities.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimilarityStrategies<
    D = DistanceSimilarity,
    L = LengthSimilarity,
    H = HeadingSimilarity,
> where
    D: SimilarityStrategy,
    L: SimilarityStrategy,
    H: SimilarityStrategy,
{
    pub distance: D,
    pub length: L,
    pub heading: H,
}

impl<D, L, H> SimilarityStrategies<D, L, H>
where
    D: SimilarityStrategy,
    L: SimilarityStrategy,
    H: SimilarityStrategy,
{
    pub fn new(distance: D, length: L, heading: H) -> Self {
        Self {
            distance,
            length,
            heading,
        }
    }
}

impl<D, L, H> Similarity for SimilarityStrategies<D, L, H>
where
    D: SimilarityStrategy,
    L: SimilarityStrategy,
    H: SimilarityStrategy,
{
    #[inline]
    fn similarity(&self, context: SimilarityContext) -> f64 {
        let distance = self.distance.weighted(context);
        if distance <= 0.0 {
            return 0.0;
        }

        distance * self.length.weighted(context) * self.heading.weighted(context)
    }
}
