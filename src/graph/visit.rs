//! Cycle-safe visitation of relations and their members.
//!
//! Relations may reference one another in cycles of any length,
//! including (pathologically) themselves. Each walk tracks the chain
//! of relations currently open using [`OpenRelations`], and prunes any
//! branch that would re-enter one of them.

use log::Level;
use std::ops::{Deref, DerefMut};

use super::{Diagnostics, ElementGraph};
use crate::element::{Element, ElementId, ElementKind};

/// Read-only element visitor.
pub trait ElementVisitor {
    fn visit(&mut self, element: &Element);
}

/// Element visitor permitted to modify the elements it visits.
pub trait ElementVisitorMut {
    fn visit(&mut self, element: &mut Element);
}

impl<F> ElementVisitor for F
where
    F: FnMut(&Element),
{
    fn visit(&mut self, element: &Element) {
        self(element)
    }
}

impl<F> ElementVisitorMut for F
where
    F: FnMut(&mut Element),
{
    fn visit(&mut self, element: &mut Element) {
        self(element)
    }
}

/// The relations open in the current call chain.
#[derive(Debug, Default)]
pub struct OpenRelations {
    chain: Vec<i64>,
}

impl OpenRelations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, relation: i64) -> bool {
        self.chain.contains(&relation)
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// Opens `relation` for the lifetime of the returned guard. Returns
    /// `None` if it is already open, meaning the caller is in a cycle.
    pub fn enter(&mut self, relation: i64) -> Option<OpenRelation<'_>> {
        if self.is_open(relation) {
            return None;
        }

        self.chain.push(relation);
        Some(OpenRelation {
            open: self,
            relation,
        })
    }
}

/// Holds a relation open, closing it again when dropped on every exit path.
pub struct OpenRelation<'a> {
    open: &'a mut OpenRelations,
    relation: i64,
}

impl Deref for OpenRelation<'_> {
    type Target = OpenRelations;

    fn deref(&self) -> &Self::Target {
        self.open
    }
}

impl DerefMut for OpenRelation<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.open
    }
}

impl Drop for OpenRelation<'_> {
    fn drop(&mut self) {
        let closed = self.open.chain.pop();
        debug_assert_eq!(closed, Some(self.relation));
    }
}

impl ElementGraph {
    /// Visits the relation `relation` and, if `recursive`, each of its
    /// members present in the graph, depth first. Circular references
    /// are pruned and recorded in `diagnostics`.
    pub fn visit_ro(
        &self,
        relation: i64,
        visitor: &mut impl ElementVisitor,
        recursive: bool,
        diagnostics: &mut Diagnostics,
    ) {
        let mut open = OpenRelations::new();
        self.visit_relation_ro(relation, visitor, recursive, &mut open, diagnostics);
    }

    fn visit_relation_ro(
        &self,
        id: i64,
        visitor: &mut impl ElementVisitor,
        recursive: bool,
        open: &mut OpenRelations,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(element) = self.element(&ElementId::relation(id)) else {
            return;
        };

        let Some(mut open) = open.enter(id) else {
            diagnostics.circular_reference(id, Level::Trace);
            return;
        };

        visitor.visit(element);

        if !recursive {
            return;
        }

        let Element::Relation(relation) = element else {
            return;
        };

        for member in relation.members() {
            match member.id.kind {
                ElementKind::Node => {
                    if let Some(element) = self.element(&member.id) {
                        visitor.visit(element);
                    }
                }
                ElementKind::Way => self.visit_way_ro(member.id.id, visitor),
                ElementKind::Relation => {
                    self.visit_relation_ro(member.id.id, visitor, recursive, &mut open, diagnostics)
                }
            }
        }
    }

    /// Visits a way followed by each of its nodes present in the graph.
    fn visit_way_ro(&self, id: i64, visitor: &mut impl ElementVisitor) {
        let Some(element) = self.element(&ElementId::way(id)) else {
            return;
        };

        visitor.visit(element);

        if let Element::Way(way) = element {
            way.nodes
                .iter()
                .filter_map(|node| self.element(&ElementId::node(*node)))
                .for_each(|node| visitor.visit(node));
        }
    }

    /// As [`ElementGraph::visit_ro`], handing out mutable access to each
    /// visited element. Members are taken from the snapshot of each
    /// relation as it was when visited, mutations made by the visitor
    /// apply to the graph but do not alter the walk in progress.
    pub fn visit_rw(
        &mut self,
        relation: i64,
        visitor: &mut impl ElementVisitorMut,
        recursive: bool,
        diagnostics: &mut Diagnostics,
    ) {
        let mut open = OpenRelations::new();
        self.visit_relation_rw(relation, visitor, recursive, &mut open, diagnostics);
        self.cache().invalidate();
    }

    fn visit_relation_rw(
        &mut self,
        id: i64,
        visitor: &mut impl ElementVisitorMut,
        recursive: bool,
        open: &mut OpenRelations,
        diagnostics: &mut Diagnostics,
    ) {
        let element_id = ElementId::relation(id);
        if !self.contains_element(&element_id) {
            return;
        }

        let Some(mut open) = open.enter(id) else {
            diagnostics.circular_reference(id, Level::Warn);
            return;
        };

        let Some(element) = self.element_mut(&element_id) else {
            return;
        };

        visitor.visit(element);

        if !recursive {
            return;
        }

        let snapshot = match self.element(&element_id) {
            Some(Element::Relation(relation)) => relation.snapshot(),
            _ => return,
        };

        for member in &snapshot.members {
            match member.id.kind {
                ElementKind::Node => {
                    if let Some(element) = self.element_mut(&member.id) {
                        visitor.visit(element);
                    }
                }
                ElementKind::Way => self.visit_way_rw(member.id.id, visitor),
                ElementKind::Relation => {
                    self.visit_relation_rw(member.id.id, visitor, recursive, &mut open, diagnostics)
                }
            }
        }
    }

    fn visit_way_rw(&mut self, id: i64, visitor: &mut impl ElementVisitorMut) {
        let Some(element) = self.element_mut(&ElementId::way(id)) else {
            return;
        };

        visitor.visit(element);

        let nodes = match self.element(&ElementId::way(id)) {
            Some(Element::Way(way)) => way.nodes.clone(),
            _ => return,
        };

        for node in nodes {
            if let Some(element) = self.element_mut(&ElementId::node(node)) {
                visitor.visit(element);
            }
        }
    }
}
