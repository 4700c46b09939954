use std::{cell::RefCell, rc::Rc};

use crate::{
    error::{BuildError, ConfigError, TickError},
    params, BehaviorTree, Context, LeafNode, NodeId, NodeStatus, TreeBuilder,
};

use NodeStatus::*;

type Log = Rc<RefCell<Vec<String>>>;

/// Returns the statuses of `script` in order, repeating the last one forever.
struct Scripted {
    name: &'static str,
    script: Vec<NodeStatus>,
    next: usize,
    log: Log,
}

impl LeafNode for Scripted {
    fn tick(&mut self, _ctx: &mut Context) -> NodeStatus {
        self.log.borrow_mut().push(format!("tick {}", self.name));
        let status = self.script[self.next.min(self.script.len() - 1)];
        self.next += 1;
        status
    }

    fn halt(&mut self) {
        self.log.borrow_mut().push(format!("halt {}", self.name));
    }
}

fn leaf(builder: &mut TreeBuilder, log: &Log, name: &'static str, script: &[NodeStatus]) -> NodeId {
    builder.add_leaf(
        name,
        Scripted {
            name,
            script: script.to_vec(),
            next: 0,
            log: log.clone(),
        },
    )
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

fn statuses(tree: &BehaviorTree, ids: &[NodeId]) -> Vec<NodeStatus> {
    ids.iter().map(|&id| tree.status(id)).collect()
}

#[test]
fn test_sequence() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Success]),
        leaf(&mut builder, &log, "b", &[Success]),
        leaf(&mut builder, &log, "c", &[Success]),
    ];
    let root = builder.add_sequence("seq", children).unwrap();
    let mut tree = builder.build(root).unwrap();

    assert_eq!(tree.tick_root(&mut Context::default()), Ok(Success));
    assert_eq!(take(&log), vec!["tick a", "tick b", "tick c"]);
    assert_eq!(statuses(&tree, &children), vec![Idle; 3]);
    assert_eq!(tree.status(root), Success);
}

#[test]
fn test_sequence_failure_halts_the_rest() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Success]),
        leaf(&mut builder, &log, "b", &[Success, Failure]),
        leaf(&mut builder, &log, "c", &[Running]),
    ];
    let root = builder.add_sequence("seq", children).unwrap();
    let mut tree = builder.build(root).unwrap();
    let mut ctx = Context::default();

    assert_eq!(tree.tick_root(&mut ctx), Ok(Running));
    assert_eq!(statuses(&tree, &children), vec![Success, Success, Running]);
    take(&log);

    // c is still running from the previous tick, so it gets halted
    assert_eq!(tree.tick_root(&mut ctx), Ok(Failure));
    assert_eq!(take(&log), vec!["tick a", "tick b", "halt c"]);
    assert_eq!(statuses(&tree, &children), vec![Idle; 3]);
}

#[test]
fn test_sequence_failure_does_not_halt_idle_leaves() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Failure]),
        leaf(&mut builder, &log, "b", &[Success]),
    ];
    let root = builder.add_sequence("seq", children).unwrap();
    let mut tree = builder.build(root).unwrap();

    assert_eq!(tree.tick_root(&mut Context::default()), Ok(Failure));
    assert_eq!(take(&log), vec!["tick a"]);
    assert_eq!(statuses(&tree, &children), vec![Idle, Idle]);
}

#[test]
fn test_sequence_suspend() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Success]),
        leaf(&mut builder, &log, "b", &[Running]),
        leaf(&mut builder, &log, "c", &[Success]),
    ];
    let root = builder.add_sequence("seq", children).unwrap();
    let mut tree = builder.build(root).unwrap();
    let mut ctx = Context::default();

    assert_eq!(tree.tick_root(&mut ctx), Ok(Running));
    assert_eq!(take(&log), vec!["tick a", "tick b"]);
    assert_eq!(tree.status(root), Running);
    assert_eq!(tree.status(children[2]), Idle);

    // Without memory, the next tick starts over from the first child
    assert_eq!(tree.tick_root(&mut ctx), Ok(Running));
    assert_eq!(take(&log), vec!["tick a", "tick b"]);
}

#[test]
fn test_sequence_star_keeps_progress() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Success]),
        leaf(&mut builder, &log, "b", &[Failure, Success]),
        leaf(&mut builder, &log, "c", &[Running, Success]),
    ];
    let root = builder.add_sequence_star("star", false, children).unwrap();
    let mut tree = builder.build(root).unwrap();
    let mut ctx = Context::default();

    assert_eq!(tree.tick_root(&mut ctx), Ok(Failure));
    assert_eq!(take(&log), vec!["tick a", "tick b"]);
    assert_eq!(statuses(&tree, &children), vec![Success, Idle, Idle]);
    assert_eq!(tree.sequence_star_cursor(root), Some(1));

    assert_eq!(tree.tick_root(&mut ctx), Ok(Running));
    assert_eq!(take(&log), vec!["tick b", "tick c"]);
    assert_eq!(tree.sequence_star_cursor(root), Some(2));

    assert_eq!(tree.tick_root(&mut ctx), Ok(Success));
    assert_eq!(take(&log), vec!["tick c"]);
    assert_eq!(statuses(&tree, &children), vec![Idle; 3]);
    assert_eq!(tree.sequence_star_cursor(root), Some(0));
}

#[test]
fn test_sequence_star_reset_on_failure() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Success]),
        leaf(&mut builder, &log, "b", &[Failure, Success]),
        leaf(&mut builder, &log, "c", &[Success]),
    ];
    let root = builder.add_sequence_star("star", true, children).unwrap();
    let mut tree = builder.build(root).unwrap();
    let mut ctx = Context::default();

    assert_eq!(tree.tick_root(&mut ctx), Ok(Failure));
    assert_eq!(take(&log), vec!["tick a", "tick b"]);
    assert_eq!(statuses(&tree, &children), vec![Idle; 3]);
    assert_eq!(tree.sequence_star_cursor(root), Some(0));

    assert_eq!(tree.tick_root(&mut ctx), Ok(Success));
    assert_eq!(take(&log), vec!["tick a", "tick b", "tick c"]);
}

#[test]
fn test_sequence_star_dynamic_reset_policy() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Success]),
        leaf(&mut builder, &log, "b", &[Failure, Failure, Success]),
    ];
    let root = builder
        .add_sequence_star_with_params(
            "star",
            params! { "reset_on_failure" => "${reset}" },
            children,
        )
        .unwrap();
    let mut tree = builder.build(root).unwrap();
    let mut ctx = Context::default();

    ctx.set("reset", false);
    assert_eq!(tree.tick_root(&mut ctx), Ok(Failure));
    assert_eq!(tree.sequence_star_cursor(root), Some(1));
    take(&log);

    // Same node, different policy: this failure rewinds to the first child
    ctx.set("reset", "true".to_string());
    assert_eq!(tree.tick_root(&mut ctx), Ok(Failure));
    assert_eq!(take(&log), vec!["tick b"]);
    assert_eq!(tree.sequence_star_cursor(root), Some(0));

    assert_eq!(tree.tick_root(&mut ctx), Ok(Success));
    assert_eq!(take(&log), vec!["tick a", "tick b"]);
}

#[test]
fn test_sequence_star_keeps_last_resolved_policy() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Success]),
        leaf(&mut builder, &log, "b", &[Failure]),
    ];
    let root = builder
        .add_sequence_star_with_params(
            "star",
            params! { "reset_on_failure" => "${reset}" },
            children,
        )
        .unwrap();
    let mut tree = builder.build(root).unwrap();
    let mut ctx = Context::default();

    ctx.set("reset", true);
    assert_eq!(tree.tick_root(&mut ctx), Ok(Failure));
    assert!(ctx.remove("reset"));
    assert_eq!(tree.tick_root(&mut ctx), Ok(Failure));
    assert_eq!(tree.sequence_star_cursor(root), Some(0));
}

#[test]
fn test_sequence_star_unresolved_binding() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let a = leaf(&mut builder, &log, "a", &[Success]);
    let root = builder
        .add_sequence_star_with_params(
            "star",
            params! { "reset_on_failure" => "${reset}" },
            [a],
        )
        .unwrap();
    let mut tree = builder.build(root).unwrap();

    assert_eq!(
        tree.tick_root(&mut Context::default()),
        Err(TickError::UnresolvedParameter {
            node: "star".to_owned(),
            param: "reset_on_failure".to_owned(),
        })
    );
    assert!(take(&log).is_empty());
}

#[test]
fn test_sequence_star_literal_params() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Success]),
        leaf(&mut builder, &log, "b", &[Failure]),
    ];
    let root = builder
        .add_sequence_star_with_params("star", params! { "reset_on_failure" => "0" }, children)
        .unwrap();
    let mut tree = builder.build(root).unwrap();
    let mut ctx = Context::default();

    // A literal is never looked up in the blackboard
    ctx.set("reset_on_failure", true);
    assert_eq!(tree.tick_root(&mut ctx), Ok(Failure));
    assert_eq!(tree.sequence_star_cursor(root), Some(1));
}

#[test]
fn test_sequence_star_missing_param() {
    let mut builder = TreeBuilder::new();
    let a = builder.add_leaf("a", Scripted { name: "a", script: vec![Success], next: 0, log: Log::default() });
    let res = builder.add_sequence_star_with_params("star", params! {}, [a]);
    assert!(matches!(
        res,
        Err(BuildError::Config(ConfigError::MissingParameter { ref node, ref param }))
            if node == "star" && param == "reset_on_failure"
    ));

    // The rejected composite did not adopt `a`
    let root = builder.add_sequence("seq", [a]).unwrap();
    assert!(builder.build(root).is_ok());
}

#[test]
fn test_sequence_star_invalid_param() {
    let mut builder = TreeBuilder::new();
    let a = builder.add_leaf("a", Scripted { name: "a", script: vec![Success], next: 0, log: Log::default() });
    let res = builder.add_sequence_star_with_params(
        "star",
        params! { "reset_on_failure" => "sometimes" },
        [a],
    );
    assert!(matches!(
        res,
        Err(BuildError::Config(ConfigError::InvalidParameter { ref value, .. })) if value == "sometimes"
    ));
}

#[test]
fn test_idle_child_is_fatal() {
    let log = Log::default();

    let mut builder = TreeBuilder::new();
    let a = leaf(&mut builder, &log, "a", &[Success]);
    let broken = leaf(&mut builder, &log, "broken", &[Idle]);
    let root = builder.add_sequence("seq", [a, broken]).unwrap();
    let mut tree = builder.build(root).unwrap();
    assert_eq!(
        tree.tick_root(&mut Context::default()),
        Err(TickError::IdleChild {
            parent: "seq".to_owned(),
            child: "broken".to_owned(),
        })
    );

    let mut builder = TreeBuilder::new();
    let broken = leaf(&mut builder, &log, "broken", &[Idle]);
    let root = builder.add_sequence_star("star", false, [broken]).unwrap();
    let mut tree = builder.build(root).unwrap();
    assert_eq!(
        tree.tick_root(&mut Context::default()),
        Err(TickError::IdleChild {
            parent: "star".to_owned(),
            child: "broken".to_owned(),
        })
    );
}

#[test]
fn test_halt_resets_cursor() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let children = [
        leaf(&mut builder, &log, "a", &[Success]),
        leaf(&mut builder, &log, "b", &[Running]),
    ];
    let root = builder.add_sequence_star("star", false, children).unwrap();
    let mut tree = builder.build(root).unwrap();
    let mut ctx = Context::default();

    assert_eq!(tree.tick_root(&mut ctx), Ok(Running));
    assert_eq!(tree.sequence_star_cursor(root), Some(1));
    take(&log);

    tree.halt_root();
    assert_eq!(take(&log), vec!["halt b"]);
    assert_eq!(tree.sequence_star_cursor(root), Some(0));
    assert_eq!(statuses(&tree, &[children[0], children[1], root]), vec![Idle; 3]);

    assert_eq!(tree.tick_root(&mut ctx), Ok(Running));
    assert_eq!(take(&log), vec!["tick a", "tick b"]);

    // Halting an idle tree is harmless
    tree.halt_root();
    tree.halt_root();
    assert_eq!(take(&log), vec!["halt b"]);
}

#[test]
fn test_halt_propagates_through_idle_composite() {
    let log = Log::default();
    let mut builder = TreeBuilder::new();
    let inner_leaf = leaf(&mut builder, &log, "inner", &[Running]);
    let inner = builder.add_sequence("inner_seq", [inner_leaf]).unwrap();
    let root = builder.add_sequence_star("star", true, [inner]).unwrap();
    let mut tree = builder.build(root).unwrap();

    assert_eq!(tree.tick_root(&mut Context::default()), Ok(Running));
    take(&log);

    tree.set_status(inner, Idle);
    tree.halt_root();
    assert_eq!(take(&log), vec!["halt inner"]);
    assert_eq!(tree.status(inner_leaf), Idle);
}

#[test]
fn test_composite_without_children() {
    let mut builder = TreeBuilder::new();
    let root = builder.add_sequence("empty", []).unwrap();
    let mut tree = builder.build(root).unwrap();
    assert_eq!(
        tree.tick_root(&mut Context::default()),
        Err(TickError::NoChildren {
            node: "empty".to_owned()
        })
    );
}
