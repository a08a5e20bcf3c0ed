//! Relations group other elements, including other relations, as
//! an ordered list of role-tagged members.
//!
//! The member payload of a relation is held as a shared snapshot,
//! [`RelationData`]. Cloning a [`Relation`] is therefore cheap, and
//! the snapshot is only copied once one of the holders mutates it
//! (see [`Relation::make_unique_before_write`]).

use log::trace;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::{ElementId, ElementKind, ElementMeta, Status};

/// A single member of a relation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Member {
    pub role: String,
    pub id: ElementId,
}

impl Member {
    pub fn new(role: impl Into<String>, id: ElementId) -> Self {
        Member {
            role: role.into(),
            id,
        }
    }
}

/// The copy-on-write payload of a relation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationData {
    /// The relation type, such as `multilinestring` or `route`.
    pub kind: String,
    pub members: Vec<Member>,
    pub meta: ElementMeta,
}

#[derive(Clone, Debug)]
pub struct Relation {
    pub id: i64,
    pub status: Status,

    data: Arc<RelationData>,

    /// Incremented by every completed mutation, allowing holders
    /// of derived state to detect staleness.
    revision: u64,
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.status == other.status && self.data == other.data
    }
}

impl Relation {
    pub fn new(id: i64, status: Status, kind: impl Into<String>) -> Self {
        Relation {
            id,
            status,
            data: Arc::new(RelationData {
                kind: kind.into(),
                ..RelationData::default()
            }),
            revision: 0,
        }
    }

    pub fn with_meta(mut self, meta: ElementMeta) -> Self {
        self.make_unique_before_write().meta = meta;
        self
    }

    pub fn element_id(&self) -> ElementId {
        ElementId::relation(self.id)
    }

    pub fn kind(&self) -> &str {
        &self.data.kind
    }

    pub fn members(&self) -> &[Member] {
        &self.data.members
    }

    pub fn meta(&self) -> &ElementMeta {
        &self.data.meta
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// A shared handle to the current payload. Holding the handle does not
    /// prevent mutation of the relation, it forces the next mutation to copy.
    pub fn snapshot(&self) -> Arc<RelationData> {
        Arc::clone(&self.data)
    }

    /// Whether the payload is currently shared with another holder.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.data) > 1
    }

    /// Ensures this relation is the sole owner of its payload, cloning
    /// it only when another holder exists, and returns it for writing.
    pub fn make_unique_before_write(&mut self) -> &mut RelationData {
        Arc::make_mut(&mut self.data)
    }

    pub fn meta_mut(&mut self) -> &mut ElementMeta {
        &mut self.make_unique_before_write().meta
    }

    fn is_self_reference(&self, id: &ElementId) -> bool {
        id.kind == ElementKind::Relation && id.id == self.id
    }

    fn pre_change(&self) {
        trace!("Relation {} changing (revision {})", self.id, self.revision);
    }

    fn post_change(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Applies `change` to the payload, signalling the change hooks around it.
    fn change<R>(&mut self, change: impl FnOnce(&mut RelationData) -> R) -> R {
        self.pre_change();
        let result = change(self.make_unique_before_write());
        self.post_change();
        result
    }

    /// Appends a member. Self-references are dropped silently.
    pub fn add_member(&mut self, role: impl Into<String>, id: ElementId) {
        if self.is_self_reference(&id) {
            trace!("Dropping self-reference of relation {}", self.id);
            return;
        }

        let member = Member::new(role, id);
        self.change(|data| data.members.push(member));
    }

    /// Inserts a member at `position`, clamped to the member count.
    /// Self-references are dropped silently.
    pub fn insert_member(&mut self, role: impl Into<String>, id: ElementId, position: usize) {
        if self.is_self_reference(&id) {
            trace!("Dropping self-reference of relation {}", self.id);
            return;
        }

        let member = Member::new(role, id);
        self.change(|data| {
            let position = position.min(data.members.len());
            data.members.insert(position, member);
        });
    }

    /// Removes every member referencing `id`, returning the number removed.
    pub fn remove_member(&mut self, id: &ElementId) -> usize {
        self.change(|data| {
            let before = data.members.len();
            data.members.retain(|m| m.id != *id);
            before - data.members.len()
        })
    }

    /// Removes members referencing `id` only where they hold `role`.
    pub fn remove_member_with_role(&mut self, role: &str, id: &ElementId) -> usize {
        self.change(|data| {
            let before = data.members.len();
            data.members.retain(|m| !(m.id == *id && m.role == role));
            before - data.members.len()
        })
    }

    /// Substitutes every reference to `from` with `to`, keeping roles.
    /// A substitution which would make the relation reference itself
    /// removes the member instead.
    pub fn replace_member(&mut self, from: &ElementId, to: ElementId) {
        self.replace_member_with_many(from, &[to]);
    }

    /// Substitutes every reference to `from` with the sequence `to`, each
    /// inheriting the role of the member it replaces.
    pub fn replace_member_with_many(&mut self, from: &ElementId, to: &[ElementId]) {
        let own = self.element_id();
        self.change(|data| {
            data.members = std::mem::take(&mut data.members)
                .into_iter()
                .flat_map(|member| {
                    if member.id == *from {
                        to.iter()
                            .filter(|id| **id != own)
                            .map(|id| Member::new(member.role.clone(), *id))
                            .collect::<Vec<_>>()
                    } else {
                        vec![member]
                    }
                })
                .collect();
        });
    }

    /// Replaces all members. Self-references are dropped silently.
    pub fn set_members(&mut self, members: Vec<Member>) {
        let own = self.element_id();
        self.change(|data| {
            data.members = members.into_iter().filter(|m| m.id != own).collect();
        });
    }

    pub fn clear(&mut self) {
        self.change(|data| data.members.clear());
    }

    pub fn set_kind(&mut self, kind: impl Into<String>) {
        let kind = kind.into();
        self.change(|data| data.kind = kind);
    }

    pub fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.members().iter().position(|m| m.id == *id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn member(&self, id: &ElementId) -> Option<&Member> {
        self.index_of(id).map(|index| &self.members()[index])
    }

    /// The role of the first member referencing `id`, if any.
    pub fn role(&self, id: &ElementId) -> Option<&str> {
        self.member(id).map(|m| m.role.as_str())
    }

    pub fn member_id_at(&self, index: usize) -> Option<ElementId> {
        self.members().get(index).map(|m| m.id)
    }

    pub fn is_first_member(&self, id: &ElementId) -> bool {
        self.index_of(id) == Some(0)
    }

    pub fn is_last_member(&self, id: &ElementId) -> bool {
        !self.members().is_empty() && self.index_of(id) == Some(self.members().len() - 1)
    }

    pub fn members_by_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Member> + 'a {
        self.members().iter().filter(move |m| m.role == role)
    }

    pub fn count_by_role(&self, role: &str) -> usize {
        self.members_by_role(role).count()
    }

    /// The distinct member identifiers, optionally limited to one kind.
    pub fn member_ids(&self, kind: Option<ElementKind>) -> BTreeSet<ElementId> {
        self.members()
            .iter()
            .map(|m| m.id)
            .filter(|id| kind.is_none_or(|kind| id.kind == kind))
            .collect()
    }

    /// The members immediately before and after the first occurrence of `id`.
    pub fn adjoining_member_ids(&self, id: &ElementId) -> Vec<ElementId> {
        let Some(index) = self.index_of(id) else {
            return vec![];
        };

        let before = index.checked_sub(1).and_then(|i| self.member_id_at(i));
        let after = self.member_id_at(index + 1);

        before.into_iter().chain(after).collect()
    }
}
