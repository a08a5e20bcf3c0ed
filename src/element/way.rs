use super::{ElementId, ElementMeta, Status};

/// An ordered sequence of node references.
///
/// A way does not own the nodes it references, these are resolved
/// through the [`ElementGraph`](crate::graph::ElementGraph) it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub status: Status,
    pub nodes: Vec<i64>,
    pub meta: ElementMeta,
}

impl Way {
    pub fn new(id: i64, status: Status, nodes: Vec<i64>) -> Self {
        Way {
            id,
            status,
            nodes,
            meta: ElementMeta::default(),
        }
    }

    pub fn with_meta(self, meta: ElementMeta) -> Self {
        Self { meta, ..self }
    }

    pub fn element_id(&self) -> ElementId {
        ElementId::way(self.id)
    }

    pub fn first_node(&self) -> Option<i64> {
        self.nodes.first().copied()
    }

    pub fn last_node(&self) -> Option<i64> {
        self.nodes.last().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 2 && self.first_node() == self.last_node()
    }

    pub fn contains_node(&self, node: i64) -> bool {
        self.nodes.contains(&node)
    }

    /// Removes every reference to `node`, returning the number removed.
    pub fn remove_node(&mut self, node: i64) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| *n != node);
        before - self.nodes.len()
    }
}
