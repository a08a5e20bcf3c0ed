use geo::{
    Bearing, Destination, Distance, Geodesic, Haversine, InterpolatableLine, LineString, Point,
};
use rstar::AABB;

use crate::element::Envelope;

/// Spacing, in metres, between samples taken along a linestring.
pub const SAMPLE_SPACING: f64 = 5.0;

/// Points along the linestring, no further than `spacing` metres apart,
/// including every vertex.
pub fn sample(line: &LineString, spacing: f64) -> Vec<Point> {
    let mut samples = vec![];
    for segment in line.lines() {
        let length = Haversine.distance(Point::from(segment.start), Point::from(segment.end));
        let steps = (length / spacing).ceil().max(1.0) as usize;

        samples.extend((0..steps).map(|step| {
            segment.point_at_ratio_from_start(&Haversine, step as f64 / steps as f64)
        }));
    }

    if let Some(last) = line.points().last() {
        samples.push(last);
    }

    samples
}

/// The largest distance, in metres, from a point of `from` to the
/// nearest point of `to`.
fn directed_hausdorff(from: &[Point], to: &[Point]) -> f64 {
    from.iter()
        .map(|a| {
            to.iter()
                .map(|b| Haversine.distance(*a, *b))
                .fold(f64::INFINITY, f64::min)
        })
        .fold(0.0, f64::max)
}

/// The discrete Hausdorff distance between two linestrings, in metres.
pub fn hausdorff(a: &LineString, b: &LineString) -> f64 {
    let (a, b) = (sample(a, SAMPLE_SPACING), sample(b, SAMPLE_SPACING));
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }

    directed_hausdorff(&a, &b).max(directed_hausdorff(&b, &a))
}

/// Bearing from the first to the last point, relative to due north.
/// Undefined for linestrings whose ends (nearly) meet.
pub fn end_to_end_bearing(line: &LineString) -> Option<f64> {
    let start = line.points().next()?;
    let end = line.points().last()?;

    // Bearings cannot be calculated for overlapping points
    if Haversine.distance(start, end) < 1.0 {
        return None;
    }

    Some(Haversine.bearing(start, end))
}

/// The envelope grown by `distance` metres in every direction.
pub fn expand(envelope: &Envelope, distance: f64) -> Envelope {
    let diagonal = distance * std::f64::consts::SQRT_2;

    let bottom_left = Geodesic.destination(envelope.lower(), 225.0, diagonal);
    let top_right = Geodesic.destination(envelope.upper(), 45.0, diagonal);

    AABB::from_corners(bottom_left, top_right)
}
