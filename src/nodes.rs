use tracing::{debug, warn};

use crate::{
    container::ChildNodes, error::ConfigError, error::TickError, params::BoundParam, Context,
    Lazy, NodeParameters, NodeStatus, Symbol,
};

/// Name of the parameter that selects the failure policy of a `SequenceStar`.
pub static RESET_PARAM: Lazy<Symbol> = Lazy::new(|| "reset_on_failure".into());

/// The algorithm of a node that owns children.
///
/// The arena has already checked that there is at least one child and has
/// set the composite's own status to `Running` before `tick` is called.
pub(crate) trait CompositeNode {
    fn tick(
        &mut self,
        children: &mut ChildNodes,
        ctx: &mut Context,
    ) -> Result<NodeStatus, TickError>;

    fn halt(&mut self, children: &mut ChildNodes) {
        children.halt_children(0);
    }
}

/// Ticks every child from the first one on each tick, without memory.
#[derive(Default)]
pub(crate) struct SequenceNode;

impl CompositeNode for SequenceNode {
    fn tick(
        &mut self,
        children: &mut ChildNodes,
        ctx: &mut Context,
    ) -> Result<NodeStatus, TickError> {
        for index in 0..children.len() {
            match children.tick(index, ctx)? {
                NodeStatus::Running => return Ok(NodeStatus::Running),
                NodeStatus::Failure => {
                    children.reset_statuses(0..index + 1);
                    // Children after this one may still be running from a previous tick
                    children.halt_children(index + 1);
                    return Ok(NodeStatus::Failure);
                }
                NodeStatus::Success => (),
                NodeStatus::Idle => return Err(children.idle_violation(index)),
            }
        }

        children.reset_statuses(0..children.len());
        Ok(NodeStatus::Success)
    }
}

/// A sequence that remembers the children that already succeeded.
pub(crate) struct SequenceStarNode {
    current_child_idx: usize,
    reset_on_failure: BoundParam<bool>,
}

impl SequenceStarNode {
    pub fn new(reset_on_failure: bool) -> Self {
        Self {
            current_child_idx: 0,
            reset_on_failure: BoundParam::fixed(
                *RESET_PARAM,
                reset_on_failure,
                reset_on_failure.to_string(),
            ),
        }
    }

    pub fn from_params(name: &str, params: &NodeParameters) -> Result<Self, ConfigError> {
        Ok(Self {
            current_child_idx: 0,
            reset_on_failure: BoundParam::from_params(name, params, *RESET_PARAM)?,
        })
    }

    fn resolve_reset_policy(&mut self, node: &str, ctx: &Context) -> Result<bool, TickError> {
        // A blackboard binding may change between ticks, so it is read every time
        let refreshed = self.reset_on_failure.refresh(ctx);
        match self.reset_on_failure.get() {
            Some(&reset) => {
                if !refreshed {
                    warn!(
                        node,
                        param = %self.reset_on_failure.key(),
                        reset,
                        "blackboard value unavailable, keeping the previous setting"
                    );
                }
                Ok(reset)
            }
            None => Err(TickError::UnresolvedParameter {
                node: node.to_owned(),
                param: self.reset_on_failure.key().to_string(),
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn current_child_idx(&self) -> usize {
        self.current_child_idx
    }
}

impl CompositeNode for SequenceStarNode {
    fn tick(
        &mut self,
        children: &mut ChildNodes,
        ctx: &mut Context,
    ) -> Result<NodeStatus, TickError> {
        let reset_on_failure = self.resolve_reset_policy(children.parent(), ctx)?;

        while self.current_child_idx < children.len() {
            let index = self.current_child_idx;
            match children.tick(index, ctx)? {
                NodeStatus::Running => return Ok(NodeStatus::Running),
                NodeStatus::Failure => {
                    if reset_on_failure {
                        children.reset_statuses(0..index + 1);
                        self.current_child_idx = 0;
                        debug!(node = children.parent(), failed = index, "rewind to first child");
                    } else {
                        // Only the failed child is retried on the next tick
                        children.set_status(index, NodeStatus::Idle);
                    }
                    return Ok(NodeStatus::Failure);
                }
                NodeStatus::Success => self.current_child_idx += 1,
                NodeStatus::Idle => return Err(children.idle_violation(index)),
            }
        }

        children.reset_statuses(0..children.len());
        self.current_child_idx = 0;
        Ok(NodeStatus::Success)
    }

    fn halt(&mut self, children: &mut ChildNodes) {
        if self.current_child_idx != 0 {
            debug!(
                node = children.parent(),
                cursor = self.current_child_idx,
                "halt discards progress"
            );
        }
        self.current_child_idx = 0;
        children.halt_children(0);
    }
}

#[cfg(test)]
mod test;
