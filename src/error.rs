use thiserror::Error;

use crate::NodeId;

/// A node configuration that cannot be accepted.
///
/// Raised while the tree is being assembled, so a tree with a bad parameter is
/// never built.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Missing parameter [{param}] in {node}")]
    MissingParameter { node: String, param: String },
    #[error("Parameter [{param}] of {node} cannot be parsed from {value:?}")]
    InvalidParameter {
        node: String,
        param: String,
        value: String,
    },
    #[error("Parameter [{param}] must be a scalar")]
    UnsupportedValue { param: String },
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("Node {0:?} does not exist in this builder")]
    UnknownNode(NodeId),
    #[error("Node {child:?} is already a child of {parent}")]
    AlreadyAdopted { child: NodeId, parent: String },
    #[error("The root node is a child of another node")]
    RootHasParent,
    #[error("Node {node} is not reachable from the root")]
    Detached { node: String },
    #[error("The tree has no nodes")]
    EmptyTree,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A fatal condition that aborts the current tick.
///
/// These are programming errors in the tree or its leaves. Ordinary branch
/// failure is reported as [`crate::NodeStatus::Failure`], never as a `TickError`.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TickError {
    #[error("{child} returned Idle from tick while ticked by {parent}")]
    IdleChild { parent: String, child: String },
    #[error("Composite {node} has no children to tick")]
    NoChildren { node: String },
    #[error("Parameter [{param}] of {node} is not resolvable from the blackboard")]
    UnresolvedParameter { node: String, param: String },
}
