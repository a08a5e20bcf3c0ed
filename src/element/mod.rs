//! Elements are the atomic unit of the map graph. There are three
//! variants, [`Node`], [`Way`] and [`Relation`], joined under the
//! [`Element`] sum type.
//!
//! Elements never hold references to one another, they refer to
//! other elements by their [`ElementId`] and are resolved through
//! the owning [`ElementGraph`](crate::graph::ElementGraph).

#[doc(hidden)]
pub mod id;
#[doc(hidden)]
pub mod node;
#[doc(hidden)]
pub mod relation;
#[doc(hidden)]
pub mod tags;
#[doc(hidden)]
pub mod way;


#[doc(inline)]
pub use id::*;
#[doc(inline)]
pub use node::Node;
#[doc(inline)]
pub use relation::{Member, Relation, RelationData};
#[doc(inline)]
pub use tags::*;
#[doc(inline)]
pub use way::Way;

use geo::Point;
use rstar::AABB;

/// The bounding box of an element, in WGS84 degrees.
pub type Envelope = AABB<Point>;

#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::Node(node) => node.element_id(),
            Element::Way(way) => way.element_id(),
            Element::Relation(relation) => relation.element_id(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.id().kind
    }

    pub fn status(&self) -> Status {
        match self {
            Element::Node(node) => node.status,
            Element::Way(way) => way.status,
            Element::Relation(relation) => relation.status,
        }
    }

    pub fn set_status(&mut self, status: Status) {
        match self {
            Element::Node(node) => node.status = status,
            Element::Way(way) => way.status = status,
            Element::Relation(relation) => relation.status = status,
        }
    }

    pub fn meta(&self) -> &ElementMeta {
        match self {
            Element::Node(node) => &node.meta,
            Element::Way(way) => &way.meta,
            Element::Relation(relation) => relation.meta(),
        }
    }

    /// Mutable access to the shared attributes. For relations this
    /// copies the payload if it is currently shared.
    pub fn meta_mut(&mut self) -> &mut ElementMeta {
        match self {
            Element::Node(node) => &mut node.meta,
            Element::Way(way) => &mut way.meta,
            Element::Relation(relation) => relation.meta_mut(),
        }
    }

    pub fn tags(&self) -> &Tags {
        &self.meta().tags
    }

    pub fn circular_error(&self) -> Option<f64> {
        self.meta().circular_error
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Element::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_way(&self) -> Option<&Way> {
        match self {
            Element::Way(way) => Some(way),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            Element::Relation(relation) => Some(relation),
            _ => None,
        }
    }
}

impl From<Node> for Element {
    fn from(value: Node) -> Self {
        Element::Node(value)
    }
}

impl From<Way> for Element {
    fn from(value: Way) -> Self {
        Element::Way(value)
    }
}

impl From<Relation> for Element {
    fn from(value: Relation) -> Self {
        Element::Relation(value)
    }
}
