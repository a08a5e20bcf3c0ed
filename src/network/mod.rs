//! Road networks abstracted from the element graph.
//!
//! A [`NetworkGraph`] holds one [`NetworkEdge`] per extracted way (or
//! contiguous relation of ways), joined at [`NetworkVertex`]es placed
//! on their endpoints and intersections. Networks are produced by the [`NetworkExtractor`]
//! and are immutable once extracted.

#[doc(hidden)]
pub mod extractor;
#[doc(hidden)]
pub mod graph;

#[cfg(test)]
mod test;

#[doc(inline)]
pub use extractor::{ExtractionError, NetworkExtractor};
#[doc(inline)]
pub use graph::{NetworkEdge, NetworkGraph, NetworkVertex};

pub use petgraph::graph::{EdgeIndex, NodeIndex as VertexIndex};
