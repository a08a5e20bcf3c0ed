//! Road network scenarios shared by the tests and benchmarks of `conflate`.
//!
//! Each scenario is a set of WKT linestrings in WGS84 (longitude,
//! latitude), one per way. Positions repeated between linestrings of
//! the same set are the same node.

use geo::LineString;
use wkt::TryFromWkt;

/// A single road, roughly 92m long.
pub const SINGLE_EDGE: &str = "LINESTRING(151.2 -33.87,151.201 -33.87)";

/// A city block, bounded by four roads.
/// The northern road passes through an unconnected midpoint.
pub const BLOCK_A: [&str; 4] = [
    "LINESTRING(151.2 -33.87,151.201 -33.87,151.202 -33.87)",
    "LINESTRING(151.2 -33.87,151.2 -33.871)",
    "LINESTRING(151.202 -33.87,151.202 -33.871)",
    "LINESTRING(151.2 -33.871,151.202 -33.871)",
];

/// [`BLOCK_A`] as surveyed by a second source, offset by roughly 2m,
/// with the northern road split in two at its midpoint.
pub const BLOCK_B: [&str; 5] = [
    "LINESTRING(151.20002 -33.86998,151.20102 -33.86998)",
    "LINESTRING(151.20102 -33.86998,151.20202 -33.86998)",
    "LINESTRING(151.20002 -33.86998,151.20002 -33.87098)",
    "LINESTRING(151.20202 -33.86998,151.20202 -33.87098)",
    "LINESTRING(151.20002 -33.87098,151.20202 -33.87098)",
];

/// [`BLOCK_A`] moved roughly 4.5km to the east.
pub const BLOCK_FAR: [&str; 4] = [
    "LINESTRING(151.25 -33.87,151.251 -33.87,151.252 -33.87)",
    "LINESTRING(151.25 -33.87,151.25 -33.871)",
    "LINESTRING(151.252 -33.87,151.252 -33.871)",
    "LINESTRING(151.25 -33.871,151.252 -33.871)",
];

/// Parses a fixture linestring.
pub fn linestring(wkt: &str) -> Result<LineString, String> {
    LineString::try_from_wkt_str(wkt).map_err(|err| format!("{wkt}: {err}"))
}

/// Parses every linestring of a scenario.
pub fn linestrings(scenario: &[&str]) -> Result<Vec<LineString>, String> {
    scenario.iter().map(|wkt| linestring(wkt)).collect()
}

/// A grid of `size` by `size` blocks, `spacing` degrees apart, and
/// offset by `offset` degrees. Each road spans a single block.
pub fn grid(size: usize, spacing: f64, offset: (f64, f64)) -> Vec<LineString> {
    let (x0, y0) = (151.2 + offset.0, -33.87 + offset.1);
    let position = |i: usize, j: usize| (x0 + i as f64 * spacing, y0 - j as f64 * spacing);

    let mut lines = vec![];
    for i in 0..=size {
        for j in 0..=size {
            if i < size {
                lines.push(LineString::from(vec![position(i, j), position(i + 1, j)]));
            }
            if j < size {
                lines.push(LineString::from(vec![position(i, j), position(i, j + 1)]));
            }
        }
    }

    lines
}
