use std::ops::Range;

use tracing::{debug, error, trace};

use crate::{
    error::TickError,
    nodes::{CompositeNode, SequenceNode, SequenceStarNode},
    Context, LeafNode, NodeId, NodeParameters, NodeStatus,
};

pub(crate) enum NodeKind {
    Leaf(Box<dyn LeafNode>),
    Sequence(SequenceNode),
    SequenceStar(SequenceStarNode),
}

impl NodeKind {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "Leaf",
            Self::Sequence(_) => "Sequence",
            Self::SequenceStar(_) => "SequenceStar",
        }
    }
}

/// One slot of the tree arena.
///
/// Children always live at lower indices than their parent, which lets a
/// composite borrow its children mutably by splitting the arena at its own
/// index.
pub(crate) struct NodeContainer {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) params: NodeParameters,
    pub(crate) children: Vec<NodeId>,
    pub(crate) status: NodeStatus,
}

impl NodeContainer {
    pub(crate) fn new(
        name: String,
        kind: NodeKind,
        params: NodeParameters,
        children: Vec<NodeId>,
    ) -> Self {
        Self {
            name,
            kind,
            params,
            children,
            status: NodeStatus::Idle,
        }
    }
}

pub(crate) fn tick_node(
    nodes: &mut [NodeContainer],
    index: usize,
    ctx: &mut Context,
) -> Result<NodeStatus, TickError> {
    let (below, rest) = nodes.split_at_mut(index);
    let node = &mut rest[0];

    let status = match &mut node.kind {
        NodeKind::Leaf(leaf) => {
            std::mem::swap(&mut ctx.params, &mut node.params);
            let res = leaf.tick(ctx);
            std::mem::swap(&mut ctx.params, &mut node.params);
            res
        }
        NodeKind::Sequence(seq) => {
            let mut children = ChildNodes::new(&node.name, &node.children, below);
            children.ensure_not_empty()?;
            node.status = NodeStatus::Running;
            seq.tick(&mut children, ctx)?
        }
        NodeKind::SequenceStar(seq) => {
            let mut children = ChildNodes::new(&node.name, &node.children, below);
            children.ensure_not_empty()?;
            node.status = NodeStatus::Running;
            seq.tick(&mut children, ctx)?
        }
    };

    trace!(node = %node.name, %status, "tick");
    node.status = status;
    Ok(status)
}

/// Cancels the node at `index` and everything below it, leaving it `Idle`.
///
/// A leaf only sees [`LeafNode::halt`] if it is `Running`; a composite always
/// propagates to its children.
pub(crate) fn halt_node(nodes: &mut [NodeContainer], index: usize) {
    let (below, rest) = nodes.split_at_mut(index);
    let node = &mut rest[0];

    match &mut node.kind {
        NodeKind::Leaf(leaf) => {
            if node.status == NodeStatus::Running {
                debug!(node = %node.name, "halt");
                leaf.halt();
            }
        }
        NodeKind::Sequence(seq) => {
            seq.halt(&mut ChildNodes::new(&node.name, &node.children, below));
        }
        NodeKind::SequenceStar(seq) => {
            seq.halt(&mut ChildNodes::new(&node.name, &node.children, below));
        }
    }
    node.status = NodeStatus::Idle;
}

/// The children of one composite, borrowed out of the arena for the duration
/// of a tick or a halt.
pub(crate) struct ChildNodes<'a> {
    parent: &'a str,
    ids: &'a [NodeId],
    nodes: &'a mut [NodeContainer],
}

impl<'a> ChildNodes<'a> {
    fn new(parent: &'a str, ids: &'a [NodeId], nodes: &'a mut [NodeContainer]) -> Self {
        Self { parent, ids, nodes }
    }

    fn ensure_not_empty(&self) -> Result<(), TickError> {
        if self.ids.is_empty() {
            error!(node = %self.parent, "composite ticked without children");
            return Err(TickError::NoChildren {
                node: self.parent.to_owned(),
            });
        }
        Ok(())
    }

    pub fn parent(&self) -> &str {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn tick(&mut self, child: usize, ctx: &mut Context) -> Result<NodeStatus, TickError> {
        tick_node(self.nodes, self.ids[child].0, ctx)
    }

    pub fn set_status(&mut self, child: usize, status: NodeStatus) {
        self.nodes[self.ids[child].0].status = status;
    }

    /// Sets the children in `range` back to `Idle` without halting them.
    pub fn reset_statuses(&mut self, range: Range<usize>) {
        for child in range {
            self.set_status(child, NodeStatus::Idle);
        }
    }

    /// Halts every child from `from` to the end.
    pub fn halt_children(&mut self, from: usize) {
        for &id in &self.ids[from.min(self.ids.len())..] {
            halt_node(self.nodes, id.0);
        }
    }

    /// Builds the error for a child that returned `Idle` from its tick.
    pub fn idle_violation(&self, child: usize) -> TickError {
        let child = &self.nodes[self.ids[child].0].name;
        error!(parent = %self.parent, %child, "child returned Idle from tick");
        TickError::IdleChild {
            parent: self.parent.to_owned(),
            child: child.clone(),
        }
    }
}
