//! The element graph owns every element of a conflation run, and
//! provides traversal, containment and envelope queries over them.

#[doc(hidden)]
pub mod diagnostics;
#[doc(hidden)]
pub mod envelope;
#[doc(hidden)]
pub mod guard;
#[doc(hidden)]
pub mod visit;


#[doc(inline)]
pub use diagnostics::Diagnostics;
#[doc(inline)]
pub use guard::{NodeMut, RelationMut, WayMut};
#[doc(inline)]
pub use visit::{ElementVisitor, ElementVisitorMut, OpenRelations};

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use crate::element::{Element, ElementId, ElementKind, Envelope, Node, Relation, Way};

/// Ways referencing a node, keyed by the node identifier.
type NodeWayIndex = FxHashMap<i64, SmallVec<[i64; 2]>>;

/// State derived from the elements which must be dropped whenever
/// an element changes.
#[derive(Default)]
pub(crate) struct DerivedCache {
    envelopes: RefCell<FxHashMap<ElementId, Option<Envelope>>>,
    node_ways: RefCell<Option<NodeWayIndex>>,
}

impl DerivedCache {
    pub(crate) fn invalidate(&self) {
        self.envelopes.borrow_mut().clear();
        self.node_ways.borrow_mut().take();
    }
}

/// The mutable collection of nodes, ways and relations.
///
/// Elements are held in identifier order, such that every iteration
/// over the graph is deterministic across runs.
#[derive(Default)]
pub struct ElementGraph {
    elements: BTreeMap<ElementId, Element>,
    cache: DerivedCache,
}

impl Debug for ElementGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ElementGraph with Elements: {}", self.elements.len())
    }
}

impl Clone for ElementGraph {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            cache: DerivedCache::default(),
        }
    }
}

impl FromIterator<Element> for ElementGraph {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        let mut graph = ElementGraph::new();
        iter.into_iter().for_each(|element| {
            graph.add_element(element);
        });
        graph
    }
}

impl ElementGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Inserts an element, returning the element it replaced, if any.
    pub fn add_element(&mut self, element: impl Into<Element>) -> Option<Element> {
        let element = element.into();
        self.cache.invalidate();
        self.elements.insert(element.id(), element)
    }

    /// Removes the element and every reference to it held by the
    /// remaining ways (node references) and relations (members).
    pub fn remove_element(&mut self, id: &ElementId) -> Option<Element> {
        let removed = self.remove_element_only(id)?;

        let mut stripped = 0;
        for element in self.elements.values_mut() {
            match (element, id.kind) {
                (Element::Relation(relation), _) if relation.contains(id) => {
                    stripped += relation.remove_member(id);
                }
                (Element::Way(way), ElementKind::Node) => {
                    stripped += way.remove_node(id.id);
                }
                _ => {}
            }
        }

        debug!("Removed {id}, stripping {stripped} reference(s) to it");
        Some(removed)
    }

    /// Removes the element without touching elements referencing it.
    /// The caller is responsible for any references left dangling.
    pub fn remove_element_only(&mut self, id: &ElementId) -> Option<Element> {
        let removed = self.elements.remove(id)?;
        self.cache.invalidate();
        Some(removed)
    }

    #[inline]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    #[inline]
    pub fn contains_element(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn node(&self, id: i64) -> Option<&Node> {
        self.element(&ElementId::node(id)).and_then(Element::as_node)
    }

    pub fn way(&self, id: i64) -> Option<&Way> {
        self.element(&ElementId::way(id)).and_then(Element::as_way)
    }

    pub fn relation(&self, id: i64) -> Option<&Relation> {
        self.element(&ElementId::relation(id))
            .and_then(Element::as_relation)
    }

    /// All elements, ordered by kind and then identifier.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        let (lower, upper) = ElementId::bounds(kind);
        self.elements.range(lower..=upper).map(|(_, element)| element)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.of_kind(ElementKind::Node).filter_map(Element::as_node)
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.of_kind(ElementKind::Way).filter_map(Element::as_way)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.of_kind(ElementKind::Relation)
            .filter_map(Element::as_relation)
    }

    /// Relations holding `id` as a direct member.
    pub fn relations_containing<'a>(
        &'a self,
        id: &'a ElementId,
    ) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations().filter(move |relation| relation.contains(id))
    }

    /// Identifiers of the ways referencing the node `node`, built
    /// lazily and retained until the graph next changes.
    pub fn ways_containing_node(&self, node: i64) -> SmallVec<[i64; 2]> {
        if let Some(index) = self.cache.node_ways.borrow().as_ref() {
            return index.get(&node).cloned().unwrap_or_default();
        }

        let mut index = NodeWayIndex::default();
        for way in self.ways() {
            // A closed way references its first node twice.
            let distinct = way.nodes.iter().collect::<FxHashSet<_>>();
            for node in distinct {
                index.entry(*node).or_default().push(way.id);
            }
        }

        trace!("Built node-way index over {} nodes", index.len());
        let ways = index.get(&node).cloned().unwrap_or_default();
        self.cache.node_ways.replace(Some(index));
        ways
    }

    /// The positions of a way's nodes, or `None` if any node is missing.
    pub fn way_positions(&self, way: &Way) -> Option<Vec<geo::Point>> {
        way.nodes
            .iter()
            .map(|node| self.node(*node).map(|n| n.position))
            .collect()
    }

    pub fn node_mut(&mut self, id: i64) -> Option<NodeMut<'_>> {
        let cache = &self.cache;
        match self.elements.get_mut(&ElementId::node(id))? {
            Element::Node(node) => Some(NodeMut::new(node, cache)),
            _ => None,
        }
    }

    pub fn way_mut(&mut self, id: i64) -> Option<WayMut<'_>> {
        let cache = &self.cache;
        match self.elements.get_mut(&ElementId::way(id))? {
            Element::Way(way) => Some(WayMut::new(way, cache)),
            _ => None,
        }
    }

    /// Exclusive access to a relation. Derived state (such as cached
    /// envelopes) is invalidated once the handle is dropped, if the
    /// relation was changed through it.
    pub fn relation_mut(&mut self, id: i64) -> Option<RelationMut<'_>> {
        let cache = &self.cache;
        match self.elements.get_mut(&ElementId::relation(id))? {
            Element::Relation(relation) => Some(RelationMut::new(relation, cache)),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    pub(crate) fn cache(&self) -> &DerivedCache {
        &self.cache
    }
}
