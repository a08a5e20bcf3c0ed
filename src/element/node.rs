//! Describes a point element. Positions are given in WGS84,
//! with the x-coordinate as longitude and the y-coordinate as latitude.

use geo::Point;
use rstar::AABB;

use super::{ElementId, ElementMeta, Envelope, Status};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub status: Status,
    pub position: Point,
    pub meta: ElementMeta,
}

impl Node {
    /// Constructs an untagged `Node` at the given `position`.
    pub fn new(id: i64, status: Status, position: Point) -> Self {
        Node {
            id,
            status,
            position,
            meta: ElementMeta::default(),
        }
    }

    pub fn with_meta(self, meta: ElementMeta) -> Self {
        Self { meta, ..self }
    }

    /// Returns the identifier for the node
    pub fn element_id(&self) -> ElementId {
        ElementId::node(self.id)
    }

    pub fn envelope(&self) -> Envelope {
        AABB::from_point(self.position)
    }
}
