//! # behavior-tree-core (Rust crate)
//!
//! The execution core of a behavior tree: a tick-driven scheduler for
//! sequence composites, with and without memory.
//!
//!
//! ## Overview
//!
//! An external driver ticks the root of a [`BehaviorTree`] once per control
//! cycle. Every tick walks down the tree, and each node answers with a
//! [`NodeStatus`]:
//!
//! * `Running` - not done yet, tick me again next cycle
//! * `Success` / `Failure` - the branch is resolved
//! * `Idle` - the node has not been ticked in this cycle. A node never returns it.
//!
//! Leaves (actions and conditions) are supplied by the application through the
//! [`LeafNode`] trait. The crate provides two composites:
//!
//! * `Sequence` ticks its children left to right from the first child on every
//!   tick. It fails as soon as a child fails and halts the rest.
//! * `SequenceStar` remembers which children already succeeded in the current
//!   attempt and resumes from the first one that did not. What happens to that
//!   progress on failure is decided by the `reset_on_failure` parameter.
//!
//!
//! ## How it looks like
//!
//! ```rust
//! use ::behavior_tree_core::{Context, LeafNode, NodeStatus, TreeBuilder};
//!
//! struct OpenDoor;
//!
//! impl LeafNode for OpenDoor {
//!     fn tick(&mut self, _ctx: &mut Context) -> NodeStatus {
//!         NodeStatus::Success
//!     }
//! }
//!
//! struct WalkThrough;
//!
//! impl LeafNode for WalkThrough {
//!     fn tick(&mut self, _ctx: &mut Context) -> NodeStatus {
//!         NodeStatus::Success
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = TreeBuilder::new();
//! let open = builder.add_leaf("OpenDoor", OpenDoor);
//! let walk = builder.add_leaf("WalkThrough", WalkThrough);
//! let root = builder.add_sequence_star("EnterRoom", false, [open, walk])?;
//! let mut tree = builder.build(root)?;
//!
//! let mut ctx = Context::default();
//! assert_eq!(tree.tick_root(&mut ctx)?, NodeStatus::Success);
//! # Ok(())
//! # }
//! ```
//!
//! Children must be added before the composite that owns them, and each node
//! can be adopted by one parent only. `build` rejects nodes that are not
//! reachable from the root.
//!
//!
//! ## Binding parameters to the blackboard
//!
//! Node parameters are strings. A value of the form `${key}` is a reference to
//! the blackboard entry `key` and is re-read on every tick; anything else is a
//! literal, parsed once when the node is constructed.
//!
//! ```rust
//! # use ::behavior_tree_core::*;
//! # struct Step;
//! # impl LeafNode for Step { fn tick(&mut self, _: &mut Context) -> NodeStatus { NodeStatus::Success } }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = TreeBuilder::new();
//! let step = builder.add_leaf("Step", Step);
//! let root = builder.add_sequence_star_with_params(
//!     "Checklist",
//!     params! { "reset_on_failure" => "${strict}" },
//!     [step],
//! )?;
//! let mut tree = builder.build(root)?;
//!
//! let mut ctx = Context::default();
//! ctx.set("strict", true);
//! tree.tick_root(&mut ctx)?;
//! # Ok(())
//! # }
//! ```
//!
//! The same parameters can be read from YAML with [`NodeParameters::from_yaml`].
//!
//!
//! ## Errors
//!
//! `Failure` is an ordinary outcome and is never reported as an error.
//! Errors are reserved for programming mistakes:
//!
//! * [`error::ConfigError`] - a required parameter is missing or malformed.
//!   The tree is not built.
//! * [`error::TickError`] - e.g. a leaf returned `Idle` from `tick`. The
//!   current tick is aborted.
//!
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: node ticks at `TRACE`, halts and cursor
//! rewinds at `DEBUG`. Install any subscriber to see them.

mod container;
mod context;
pub mod error;
mod nodes;
mod params;
mod parser;
mod symbol;
mod tree;

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use crate::context::Context;
pub use crate::nodes::RESET_PARAM;
pub use crate::params::{BlackboardValue, FromParam, NodeParameters};
pub use crate::symbol::Symbol;
pub use crate::tree::{BehaviorTree, NodeId, NodeSnapshot, TreeBuilder};
pub use ::once_cell::sync::Lazy;

#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Not ticked yet in the current cycle, or reset after its branch resolved
    #[default]
    Idle,
    /// The node should keep running in the next tick
    Running,
    Success,
    Failure,
}

impl NodeStatus {
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl Display for NodeStatus {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        let s = match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Failure => "Failure",
        };
        fmt.write_str(s)
    }
}

/// Blackboard is a mapping of a variable names and their values.
/// The value is wrapped in an `Any` trait object, so it can be any type.
pub type Blackboard = HashMap<Symbol, Rc<dyn Any>>;

/// An action or condition ticked by its parent composite.
///
/// A leaf must return `Running`, `Success` or `Failure` from `tick`.
/// Returning `Idle` is a contract violation and aborts the parent's tick with
/// [`error::TickError::IdleChild`].
pub trait LeafNode {
    fn tick(&mut self, ctx: &mut Context) -> NodeStatus;

    /// Called when the leaf is cancelled while `Running`.
    fn halt(&mut self) {}
}

/// Builds [`NodeParameters`] from `key => value` pairs.
#[macro_export]
macro_rules! params {
    () => {
        $crate::NodeParameters::new()
    };
    ($($name: expr => $val: expr),+ $(,)?) => {{
        let mut ret = $crate::NodeParameters::new();
        $(ret.insert($name, $val);)+
        ret
    }};
}
