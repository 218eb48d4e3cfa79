//! Copy split arithmetic
//!
//! When a replica crosses a contact, the sender's credits and whatever the
//! receiver already holds for the same message form a pool. The pool is
//! divided between the two hosts:
//!
//! - **Even**: between two ordinary hosts the receiver gets `pool / 2`
//!   (floor) and the sender keeps the rest, so an odd pool leaves the
//!   larger half with the sender.
//! - **Hub-favoring**: when exactly one endpoint is a community center, the
//!   hub takes everything but one credit, and the roaming host keeps one so
//!   it can still hand the message over on a direct encounter.
//!
//! Two hubs meeting use the even split.

use tracing::warn;

use crate::role::NodeRole;

/// Which endpoint of a contact a credit count belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The host receiving the replica
    Local,
    /// The host the replica arrives from
    Source,
}

/// How a pool is divided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitStrategy {
    /// Floor half to the receiver, remainder to the sender
    Even,
    /// Everything but one credit to the hub side
    HubFavoring { hub: Side },
}

impl SplitStrategy {
    /// Pick the strategy for a contact between two roles
    ///
    /// Hub-favoring applies only when exactly one endpoint is a hub; two
    /// hubs meeting split evenly.
    pub fn for_roles(source: NodeRole, local: NodeRole) -> Self {
        match (source.is_hub(), local.is_hub()) {
            (false, true) => SplitStrategy::HubFavoring { hub: Side::Local },
            (true, false) => SplitStrategy::HubFavoring { hub: Side::Source },
            _ => SplitStrategy::Even,
        }
    }
}

/// Outcome of dividing a pool between the two endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan {
    /// Strategy that produced the plan
    pub strategy: SplitStrategy,
    /// Credits offered by the sender
    pub incoming: u32,
    /// Credits the receiver held before the split
    pub existing: u32,
    /// Credits the receiver holds after the split
    pub local: u32,
    /// Credits the sender holds after the split
    pub source: u32,
}

impl SplitPlan {
    /// Total credits divided by this plan
    pub fn pool(&self) -> u32 {
        self.local + self.source
    }
}

/// Divide `incoming + existing` credits between the two endpoints
///
/// A pool above `u32::MAX` means credits were minted somewhere. Debug
/// builds treat that as an assertion failure; release builds log it and
/// saturate the pool.
pub fn plan_split(incoming: u32, existing: u32, source: NodeRole, local: NodeRole) -> SplitPlan {
    let strategy = SplitStrategy::for_roles(source, local);
    let pool = incoming.checked_add(existing).unwrap_or_else(|| {
        warn!(incoming, existing, "Copy pool overflow, credits lost");
        debug_assert!(false, "copy pool overflow: {} + {}", incoming, existing);
        u32::MAX
    });

    let (local_copies, source_copies) = match strategy {
        SplitStrategy::Even => {
            let half = pool / 2;
            (half, pool - half)
        }
        SplitStrategy::HubFavoring { hub } => {
            let roamer = pool.min(1);
            match hub {
                Side::Local => (pool - roamer, roamer),
                Side::Source => (roamer, pool - roamer),
            }
        }
    };

    SplitPlan {
        strategy,
        incoming,
        existing,
        local: local_copies,
        source: source_copies,
    }
}
