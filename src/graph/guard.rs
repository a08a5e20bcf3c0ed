//! Exclusive handles onto elements held by the [`ElementGraph`](super::ElementGraph).
//!
//! Acquiring a handle is the pre-change signal, dropping it is the
//! post-change signal, on which any state derived from the element
//! (envelopes, node-way indices) is discarded.

use log::trace;
use std::ops::{Deref, DerefMut};

use super::DerivedCache;
use crate::element::{Node, Relation, Way};

pub struct NodeMut<'a> {
    node: &'a mut Node,
    cache: &'a DerivedCache,
}

impl<'a> NodeMut<'a> {
    pub(crate) fn new(node: &'a mut Node, cache: &'a DerivedCache) -> Self {
        trace!("Acquired node {} for writing", node.id);
        Self { node, cache }
    }
}

impl Deref for NodeMut<'_> {
    type Target = Node;

    fn deref(&self) -> &Self::Target {
        self.node
    }
}

impl DerefMut for NodeMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.node
    }
}

impl Drop for NodeMut<'_> {
    fn drop(&mut self) {
        self.cache.invalidate();
    }
}

pub struct WayMut<'a> {
    way: &'a mut Way,
    cache: &'a DerivedCache,
}

impl<'a> WayMut<'a> {
    pub(crate) fn new(way: &'a mut Way, cache: &'a DerivedCache) -> Self {
        trace!("Acquired way {} for writing", way.id);
        Self { way, cache }
    }
}

impl Deref for WayMut<'_> {
    type Target = Way;

    fn deref(&self) -> &Self::Target {
        self.way
    }
}

impl DerefMut for WayMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.way
    }
}

impl Drop for WayMut<'_> {
    fn drop(&mut self) {
        self.cache.invalidate();
    }
}

pub struct RelationMut<'a> {
    relation: &'a mut Relation,
    cache: &'a DerivedCache,

    /// Revision of the relation on acquisition.
    acquired: u64,
}

impl<'a> RelationMut<'a> {
    pub(crate) fn new(relation: &'a mut Relation, cache: &'a DerivedCache) -> Self {
        trace!("Acquired relation {} for writing", relation.id);
        let acquired = relation.revision();
        Self {
            relation,
            cache,
            acquired,
        }
    }
}

impl Deref for RelationMut<'_> {
    type Target = Relation;

    fn deref(&self) -> &Self::Target {
        self.relation
    }
}

impl DerefMut for RelationMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.relation
    }
}

impl Drop for RelationMut<'_> {
    fn drop(&mut self) {
        if self.relation.revision() != self.acquired {
            self.cache.invalidate();
        }
    }
}
