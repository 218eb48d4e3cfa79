//! # Multicopy Simulation
//!
//! A tick-driven contact simulator for the community-aware multi-copy
//! router in `multicopy-dtn`.
//!
//! ## Overview
//!
//! Hosts carry replicas of messages, each with a number of replication
//! credits. Contacts between pairs of hosts come up and go down over time;
//! while a contact is up, the router decides how credits move across it:
//!
//! - **Ordinary hosts** split the pooled credits evenly
//! - **Community centers** (`CC*` hosts) keep all but one credit
//! - **One transfer per contact** until the contact changes state
//! - **Capacity counters** track every host's credits across messages
//!
//! ## Architecture
//!
//! - **World** (`world.rs`): Hosts, their stores, contacts and the ledger
//! - **Trace** (`trace.rs`): JSON contact traces and the random contact model
//! - **Simulation** (`simulation.rs`): Discrete-time forwarding engine
//! - **Scenarios** (`scenarios.rs`): Pre-built scenarios
//!
//! ## Example
//!
//! ```rust,ignore
//! use multicopy_simulation::*;
//!
//! let world = WorldBuilder::new().ordinary(3).hubs(1).build()?;
//! let mut sim = Simulation::new(world, MulticopyConfig { copies: 8 }, SimConfig::default());
//!
//! sim.create_message(MessageId::new("M1")?, &n1, [n3.clone()], 100)?;
//! sim.connect(&n1, &cc1)?;
//! sim.run_ticks(1)?;
//!
//! // The hub kept seven copies and left n1 with one
//! assert_eq!(sim.world.copies_of(&cc1, &MessageId::new("M1")?), 7);
//! ```

pub mod error;
pub mod scenarios;
pub mod simulation;
pub mod trace;
pub mod world;

#[cfg(test)]
mod integration_scenarios;

// Re-export main types
pub use error::{SimError, SimResult};

pub use simulation::{SimConfig, SimStats, Simulation};

pub use trace::{ContactTrace, RandomContacts, TraceAction, TraceEvent};

pub use world::{HostState, World, WorldBuilder};
