//! Predicates selecting which elements take part in a network.
//!
//! A [`Criterion`] is a closed set of predicates, composed with
//! [`Criterion::Chain`], [`Criterion::Or`] and [`Criterion::Not`].
//! Some predicates consider only the element, others (such as
//! [`Criterion::DisconnectedWay`]) inspect the surrounding graph.
//!
//! Criteria named in configuration are created through the
//! [`CriterionRegistry`].

#[doc(hidden)]
pub mod registry;


#[doc(inline)]
pub use registry::CriterionRegistry;

use log::trace;
use std::collections::BTreeSet;
use strum::{AsRefStr, EnumString};

use crate::element::{Element, ElementId, Relation, Status, Way};
use crate::graph::ElementGraph;

const AREA_KEYS: [&str; 6] = ["building", "landuse", "natural", "leisure", "amenity", "area:highway"];

const LINEAR_RELATIONS: [&str; 4] = ["route", "route_master", "multilinestring", "road"];
const AREA_RELATIONS: [&str; 2] = ["multipolygon", "boundary"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, EnumString)]
pub enum GeometryType {
    Point,
    Line,
    Polygon,
}

impl GeometryType {
    /// The geometry an element would be rendered as.
    ///
    /// A closed way is a polygon only if tagged as an area, as roads
    /// such as roundabouts are commonly closed.
    pub fn of(element: &Element) -> GeometryType {
        match element {
            Element::Node(_) => GeometryType::Point,
            Element::Way(way) if GeometryType::is_area(way) => GeometryType::Polygon,
            Element::Way(_) => GeometryType::Line,
            Element::Relation(relation) if AREA_RELATIONS.contains(&relation.kind()) => {
                GeometryType::Polygon
            }
            Element::Relation(_) => GeometryType::Line,
        }
    }

    fn is_area(way: &Way) -> bool {
        if !way.is_closed() {
            return false;
        }

        let tags = &way.meta.tags;
        match tags.value("area") {
            Some("yes") => true,
            Some("no") => false,
            _ => AREA_KEYS.iter().any(|key| tags.contains_key(*key)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Criterion {
    /// Elements of the given status.
    Status(Status),

    /// Ways and linear relations tagged as a drivable road.
    Highway,

    GeometryType(GeometryType),

    /// Elements carrying the tag key, with any value.
    TagKey(String),

    Tag { key: String, value: String },

    ElementIds(BTreeSet<ElementId>),

    /// Ways sharing no node with any other way in the graph.
    DisconnectedWay,

    /// Satisfied when every contained criterion is. An empty chain
    /// is satisfied by all elements.
    Chain(Vec<Criterion>),

    /// Satisfied when any contained criterion is.
    Or(Vec<Criterion>),

    Not(Box<Criterion>),
}

impl Criterion {
    pub fn tag(key: impl Into<String>, value: impl Into<String>) -> Self {
        Criterion::Tag {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn not(criterion: Criterion) -> Self {
        Criterion::Not(Box::new(criterion))
    }

    /// Appends a conjunct. Any criterion other than a chain is first
    /// wrapped into a chain holding it.
    pub fn add_criterion(&mut self, criterion: Criterion) {
        match self {
            Criterion::Chain(criteria) => criteria.push(criterion),
            _ => {
                let current = std::mem::replace(self, Criterion::Chain(vec![]));
                *self = Criterion::Chain(vec![current, criterion]);
            }
        }
    }

    pub fn is_satisfied(&self, element: &Element, graph: &ElementGraph) -> bool {
        match self {
            Criterion::Status(status) => element.status() == *status,
            Criterion::Highway => Criterion::is_highway(element, graph),
            Criterion::GeometryType(kind) => GeometryType::of(element) == *kind,
            Criterion::TagKey(key) => element.tags().contains_key(key),
            Criterion::Tag { key, value } => element.tags().value(key) == Some(value.as_str()),
            Criterion::ElementIds(ids) => ids.contains(&element.id()),
            Criterion::DisconnectedWay => match element {
                Element::Way(way) => Criterion::is_disconnected(way, graph),
                _ => false,
            },
            Criterion::Chain(criteria) => criteria
                .iter()
                .all(|criterion| criterion.is_satisfied(element, graph)),
            Criterion::Or(criteria) => criteria
                .iter()
                .any(|criterion| criterion.is_satisfied(element, graph)),
            Criterion::Not(criterion) => !criterion.is_satisfied(element, graph),
        }
    }

    fn is_highway(element: &Element, graph: &ElementGraph) -> bool {
        match element {
            Element::Node(_) => false,
            Element::Way(way) => way.meta.tags.road_tag().is_some(),
            Element::Relation(relation) => Criterion::is_highway_relation(relation, graph),
        }
    }

    /// A linear relation is a highway if tagged as one itself, or if it
    /// groups only highway ways.
    fn is_highway_relation(relation: &Relation, graph: &ElementGraph) -> bool {
        if !LINEAR_RELATIONS.contains(&relation.kind()) {
            return false;
        }

        if relation.meta().tags.road_tag().is_some() {
            return true;
        }

        !relation.members().is_empty()
            && relation.members().iter().all(|member| {
                graph
                    .element(&member.id)
                    .and_then(Element::as_way)
                    .is_some_and(|way| way.meta.tags.road_tag().is_some())
            })
    }

    fn is_disconnected(way: &Way, graph: &ElementGraph) -> bool {
        let connected = way.nodes.iter().any(|node| {
            graph
                .ways_containing_node(*node)
                .iter()
                .any(|other| *other != way.id)
        });

        trace!("Way {} connected={connected}", way.id);
        !connected
    }
}
