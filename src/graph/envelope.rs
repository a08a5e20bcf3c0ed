use log::trace;
use rstar::{Envelope as _, AABB};

use super::{ElementGraph, OpenRelations};
use crate::element::{Element, ElementId, Envelope, Relation, Way};

impl ElementGraph {
    /// The bounding box of the element `id`.
    ///
    /// Returns `None` when the element does not exist, or its envelope
    /// is null. A way's envelope is null if any of its nodes are missing.
    /// A relation's envelope is null when it has no members, any member is
    /// missing or has a null envelope itself, or a member re-enters a
    /// relation open higher in the same chain. A null member never yields
    /// a partial envelope.
    ///
    /// Results are cached until the graph next changes.
    pub fn envelope(&self, id: &ElementId) -> Option<Envelope> {
        if let Some(cached) = self.cache().envelopes.borrow().get(id) {
            return *cached;
        }

        let mut open = OpenRelations::new();
        let envelope = self.element_envelope(id, &mut open);

        self.cache().envelopes.borrow_mut().insert(*id, envelope);
        envelope
    }

    fn element_envelope(&self, id: &ElementId, open: &mut OpenRelations) -> Option<Envelope> {
        match self.element(id)? {
            Element::Node(node) => Some(node.envelope()),
            Element::Way(way) => self.way_envelope(way),
            Element::Relation(relation) => self.relation_envelope(relation, open),
        }
    }

    fn way_envelope(&self, way: &Way) -> Option<Envelope> {
        let positions = self.way_positions(way)?;
        if positions.is_empty() {
            return None;
        }

        Some(AABB::from_points(positions.iter()))
    }

    fn relation_envelope(&self, relation: &Relation, open: &mut OpenRelations) -> Option<Envelope> {
        let Some(mut open) = open.enter(relation.id) else {
            trace!("Relation {} re-entered, envelope is null", relation.id);
            return None;
        };

        let mut envelope: Option<Envelope> = None;
        for member in relation.members() {
            if !self.contains_element(&member.id) {
                trace!("{} missing. Envelope of relation {} is null", member.id, relation.id);
                return None;
            }

            let Some(child) = self.element_envelope(&member.id, &mut open) else {
                trace!(
                    "Child envelope for {} null. Envelope of relation {} is null",
                    member.id,
                    relation.id
                );
                return None;
            };

            envelope = Some(match envelope {
                Some(current) => current.merged(&child),
                None => child,
            });
        }

        envelope
    }
}
