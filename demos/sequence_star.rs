//! Drives a small patrol tree for a fixed number of cycles.
//!
//! Run with `RUST_LOG=trace` to see every tick.

use ::behavior_tree_core::{
    params, BehaviorTree, Context, LeafNode, Lazy, NodeStatus, Symbol, TreeBuilder,
};
use tracing_subscriber::EnvFilter;

static BATTERY_SYM: Lazy<Symbol> = Lazy::new(|| "battery".into());
static STRICT_SYM: Lazy<Symbol> = Lazy::new(|| "strict".into());

struct CheckBattery;

impl LeafNode for CheckBattery {
    fn tick(&mut self, ctx: &mut Context) -> NodeStatus {
        let minimum = ctx.get_param::<u32>("minimum").unwrap_or(0);
        match ctx.get::<u32>(*BATTERY_SYM) {
            Some(&level) if level >= minimum => NodeStatus::Success,
            _ => NodeStatus::Failure,
        }
    }
}

/// Takes `ticks` cycles to reach its waypoint.
struct MoveTo {
    waypoint: &'static str,
    ticks: u32,
    elapsed: u32,
}

impl MoveTo {
    fn new(waypoint: &'static str, ticks: u32) -> Self {
        Self {
            waypoint,
            ticks,
            elapsed: 0,
        }
    }
}

impl LeafNode for MoveTo {
    fn tick(&mut self, ctx: &mut Context) -> NodeStatus {
        let battery = ctx.get::<u32>(*BATTERY_SYM).copied().unwrap_or(0);
        ctx.set(*BATTERY_SYM, battery.saturating_sub(7));
        self.elapsed += 1;
        if self.elapsed < self.ticks {
            println!("MoveTo {}: {}/{}", self.waypoint, self.elapsed, self.ticks);
            return NodeStatus::Running;
        }
        println!("MoveTo {}: arrived", self.waypoint);
        self.elapsed = 0;
        NodeStatus::Success
    }

    fn halt(&mut self) {
        println!("MoveTo {}: interrupted", self.waypoint);
        self.elapsed = 0;
    }
}

fn build() -> Result<BehaviorTree, Box<dyn std::error::Error>> {
    let mut builder = TreeBuilder::new();
    let check = builder.add_leaf_with_params("CheckBattery", CheckBattery, params! { "minimum" => "20" });
    let a = builder.add_leaf("MoveToA", MoveTo::new("A", 2));
    let leg_a = builder.add_sequence("LegA", [check, a])?;
    let b = builder.add_leaf("MoveToB", MoveTo::new("B", 3));
    let c = builder.add_leaf("MoveToC", MoveTo::new("C", 2));
    let root = builder.add_sequence_star_with_params(
        "Patrol",
        params! { "reset_on_failure" => "${strict}" },
        [leg_a, b, c],
    )?;
    Ok(builder.build(root)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tree = build()?;
    let mut ctx = Context::default();
    ctx.set(*BATTERY_SYM, 100u32);
    ctx.set(*STRICT_SYM, false);

    for cycle in 0..12 {
        let status = tree.tick_root(&mut ctx)?;
        println!("cycle {}: {}", cycle, status);
        print!("{}", tree);
        if status == NodeStatus::Failure {
            println!("recharging");
            ctx.set(*BATTERY_SYM, 100u32);
        }
    }

    tree.halt_root();
    println!("Total symbols: {}", Symbol::count());
    Ok(())
}
