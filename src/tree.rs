use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::{
    container::{halt_node, tick_node, NodeContainer, NodeKind},
    error::{BuildError, TickError},
    nodes::{SequenceNode, SequenceStarNode, RESET_PARAM},
    Context, FromParam, LeafNode, NodeParameters, NodeStatus,
};

/// Index of a node in the arena of a [`TreeBuilder`] and of the
/// [`BehaviorTree`] built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Assembles a tree bottom-up.
///
/// Every composite takes its children at construction, so children are added
/// first and the root last. A node can be adopted by one composite only.
#[derive(Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeContainer>,
    parents: Vec<Option<NodeId>>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_leaf(&mut self, name: impl Into<String>, leaf: impl LeafNode + 'static) -> NodeId {
        self.add_leaf_with_params(name, leaf, NodeParameters::new())
    }

    /// Adds a leaf whose parameters can be read with [`Context::get_param`]
    /// while it is ticked.
    pub fn add_leaf_with_params(
        &mut self,
        name: impl Into<String>,
        leaf: impl LeafNode + 'static,
        params: NodeParameters,
    ) -> NodeId {
        self.push(NodeContainer::new(
            name.into(),
            NodeKind::Leaf(Box::new(leaf)),
            params,
            vec![],
        ))
    }

    pub fn add_sequence(
        &mut self,
        name: impl Into<String>,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, BuildError> {
        let children = self.adoptable(children)?;
        Ok(self.adopt(
            name.into(),
            NodeKind::Sequence(SequenceNode),
            NodeParameters::new(),
            children,
        ))
    }

    pub fn add_sequence_star(
        &mut self,
        name: impl Into<String>,
        reset_on_failure: bool,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, BuildError> {
        let children = self.adoptable(children)?;
        let mut params = NodeParameters::new();
        params.insert(RESET_PARAM.as_str(), reset_on_failure.to_string());
        Ok(self.adopt(
            name.into(),
            NodeKind::SequenceStar(SequenceStarNode::new(reset_on_failure)),
            params,
            children,
        ))
    }

    /// Adds a `SequenceStar` configured by `params`, which must contain
    /// [`RESET_PARAM`] either as a boolean literal or as a `${key}` binding.
    pub fn add_sequence_star_with_params(
        &mut self,
        name: impl Into<String>,
        params: NodeParameters,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, BuildError> {
        let name = name.into();
        let node = SequenceStarNode::from_params(&name, &params)?;
        let children = self.adoptable(children)?;
        Ok(self.adopt(name, NodeKind::SequenceStar(node), params, children))
    }

    /// Finishes the tree. Every node other than `root` must have a parent.
    pub fn build(self, root: NodeId) -> Result<BehaviorTree, BuildError> {
        if self.nodes.is_empty() {
            return Err(BuildError::EmptyTree);
        }
        match self.parents.get(root.0) {
            None => return Err(BuildError::UnknownNode(root)),
            Some(Some(_)) => return Err(BuildError::RootHasParent),
            Some(None) => (),
        }
        // Parents always come after their children, so the only parentless
        // node of a connected tree is the last one.
        if let Some((index, _)) = self
            .parents
            .iter()
            .enumerate()
            .find(|(index, parent)| parent.is_none() && *index != root.0)
        {
            return Err(BuildError::Detached {
                node: self.nodes[index].name.clone(),
            });
        }
        Ok(BehaviorTree { nodes: self.nodes })
    }

    fn push(&mut self, node: NodeContainer) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.parents.push(None);
        id
    }

    /// Validates a child list without changing anything, so a rejected
    /// composite leaves the builder untouched.
    fn adoptable(
        &self,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<Vec<NodeId>, BuildError> {
        let children: Vec<NodeId> = children.into_iter().collect();
        for (i, &child) in children.iter().enumerate() {
            match self.parents.get(child.0) {
                None => return Err(BuildError::UnknownNode(child)),
                Some(Some(parent)) => {
                    return Err(BuildError::AlreadyAdopted {
                        child,
                        parent: self.nodes[parent.0].name.clone(),
                    })
                }
                Some(None) if children[..i].contains(&child) => {
                    return Err(BuildError::AlreadyAdopted {
                        child,
                        parent: "the same composite".to_owned(),
                    })
                }
                Some(None) => (),
            }
        }
        Ok(children)
    }

    fn adopt(
        &mut self,
        name: String,
        kind: NodeKind,
        params: NodeParameters,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        for child in &children {
            self.parents[child.0] = Some(id);
        }
        self.push(NodeContainer::new(name, kind, params, children))
    }
}

/// A status record of one node, in depth-first order from the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub kind: &'static str,
    pub depth: usize,
    pub status: NodeStatus,
}

/// A fully assembled tree, ticked through its root.
pub struct BehaviorTree {
    nodes: Vec<NodeContainer>,
}

impl BehaviorTree {
    pub fn root(&self) -> NodeId {
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ticks the root once. Call this once per control cycle.
    ///
    /// Only the root is ticked from outside; every other node is ticked by
    /// its parent.
    pub fn tick_root(&mut self, ctx: &mut Context) -> Result<NodeStatus, TickError> {
        let root = self.root().0;
        tick_node(&mut self.nodes, root, ctx)
    }

    /// Cancels the whole tree.
    pub fn halt_root(&mut self) {
        let root = self.root().0;
        halt_node(&mut self.nodes, root);
    }

    /// Cancels the subtree under `id`. Safe to call on an idle node.
    pub fn halt(&mut self, id: NodeId) {
        halt_node(&mut self.nodes, id.0);
    }

    pub fn status(&self, id: NodeId) -> NodeStatus {
        self.nodes[id.0].status
    }

    pub fn set_status(&mut self, id: NodeId, status: NodeStatus) {
        self.nodes[id.0].status = status;
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn params(&self, id: NodeId) -> &NodeParameters {
        &self.nodes[id.0].params
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    /// Resolves a parameter of `id`, reading the blackboard in `ctx` if the
    /// parameter is bound to it.
    pub fn get_param<T>(&self, id: NodeId, key: &str, ctx: &Context) -> Option<T>
    where
        T: FromParam + Clone + 'static,
    {
        self.nodes[id.0].params.binding(key)?.resolve(ctx)
    }

    /// Visits every node depth-first from the root, with its depth.
    pub fn visit(&self, mut f: impl FnMut(NodeId, usize)) {
        fn recurse(tree: &BehaviorTree, id: NodeId, depth: usize, f: &mut impl FnMut(NodeId, usize)) {
            f(id, depth);
            for &child in tree.children(id) {
                recurse(tree, child, depth + 1, f);
            }
        }
        recurse(self, self.root(), 0, &mut f);
    }

    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        let mut ret = vec![];
        self.visit(|id, depth| {
            let node = &self.nodes[id.0];
            ret.push(NodeSnapshot {
                name: node.name.clone(),
                kind: node.kind.type_name(),
                depth,
                status: node.status,
            });
        });
        ret
    }

    #[cfg(test)]
    pub(crate) fn sequence_star_cursor(&self, id: NodeId) -> Option<usize> {
        match &self.nodes[id.0].kind {
            NodeKind::SequenceStar(seq) => Some(seq.current_child_idx()),
            _ => None,
        }
    }
}

impl Display for BehaviorTree {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        for snapshot in self.snapshot() {
            writeln!(
                fmt,
                "{:indent$}{} ({}): {}",
                "",
                snapshot.name,
                snapshot.kind,
                snapshot.status,
                indent = snapshot.depth * 2
            )?;
        }
        Ok(())
    }
}
