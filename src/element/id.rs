use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum::{AsRefStr, EnumString};

/// The variant of an element within the map graph.
///
/// The ordering (`Node < Way < Relation`) is relied upon by the
/// [`ElementGraph`](crate::graph::ElementGraph) to range over
/// a single kind of element.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    EnumString,
)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

/// Identity of an element, a composite of its kind and identifier.
///
/// Two elements of differing kinds may share the same numeric
/// identifier, they are distinct elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId {
    pub kind: ElementKind,
    pub id: i64,
}

impl ElementId {
    pub const fn new(kind: ElementKind, id: i64) -> Self {
        ElementId { kind, id }
    }

    #[inline]
    pub const fn node(id: i64) -> Self {
        ElementId::new(ElementKind::Node, id)
    }

    #[inline]
    pub const fn way(id: i64) -> Self {
        ElementId::new(ElementKind::Way, id)
    }

    #[inline]
    pub const fn relation(id: i64) -> Self {
        ElementId::new(ElementKind::Relation, id)
    }

    /// The smallest and largest identifiers of the given kind, used
    /// to range over an ordered collection of identifiers.
    pub(crate) const fn bounds(kind: ElementKind) -> (Self, Self) {
        (ElementId::new(kind, i64::MIN), ElementId::new(kind, i64::MAX))
    }

    pub fn is_relation(&self) -> bool {
        self.kind == ElementKind::Relation
    }
}

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind.as_ref(), self.id)
    }
}

/// Marks which dataset an element originated from.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    EnumString,
)]
pub enum Status {
    /// Belongs to the first (reference) dataset.
    Unknown1,
    /// Belongs to the second dataset.
    Unknown2,
    /// The product of merging elements from both datasets.
    Conflated,
    #[default]
    Invalid,
}

impl Status {
    /// Both input datasets, in the order they are conflated.
    pub const INPUTS: [Status; 2] = [Status::Unknown1, Status::Unknown2];

    pub fn is_input(&self) -> bool {
        Status::INPUTS.contains(self)
    }
}
