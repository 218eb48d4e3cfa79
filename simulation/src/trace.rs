//! Contact traces
//!
//! A trace is a JSON document listing the hosts of a run, the router
//! configuration and a timed list of contact and message-creation events:
//!
//! ```json
//! {
//!   "router": { "copies": 8 },
//!   "hosts": ["n1", "n2", "CC1"],
//!   "ticks": 20,
//!   "events": [
//!     { "tick": 0, "kind": "create", "id": "M1", "from": "n1", "to": ["n2"], "size": 100, "response_size": 20 },
//!     { "tick": 1, "kind": "up", "a": "n1", "b": "CC1" },
//!     { "tick": 3, "kind": "down", "a": "n1", "b": "CC1" }
//!   ]
//! }
//! ```
//!
//! Traces can also be generated from a [`RandomContacts`] model.

use std::collections::BTreeSet;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use multicopy_core::{HostId, MessageId};
use multicopy_dtn::MulticopyConfig;

use crate::error::{SimError, SimResult};

/// Something that happens at a given tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceAction {
    /// Contact between `a` and `b` comes up
    Up { a: HostId, b: HostId },
    /// Contact between `a` and `b` goes down
    Down { a: HostId, b: HostId },
    /// Host `from` originates message `id`
    Create {
        id: MessageId,
        from: HostId,
        to: Vec<HostId>,
        #[serde(default)]
        size: u64,
        /// Requested response size, 0 for none
        #[serde(default)]
        response_size: u64,
    },
}

impl TraceAction {
    /// Hosts named by this action
    pub fn hosts(&self) -> Vec<&HostId> {
        match self {
            TraceAction::Up { a, b } | TraceAction::Down { a, b } => vec![a, b],
            TraceAction::Create { from, to, .. } => std::iter::once(from).chain(to).collect(),
        }
    }
}

/// A trace entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub tick: u64,
    #[serde(flatten)]
    pub action: TraceAction,
}

/// A complete contact trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactTrace {
    #[serde(default)]
    pub router: MulticopyConfig,
    pub hosts: Vec<HostId>,
    /// Run length; defaults to one past the last event
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

impl ContactTrace {
    /// Parse and validate a trace
    pub fn from_json(json: &str) -> SimResult<Self> {
        let trace: ContactTrace = serde_json::from_str(json)?;
        trace.validate()?;
        Ok(trace)
    }

    /// Read and validate a trace file
    pub fn from_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of ticks to run
    pub fn duration(&self) -> u64 {
        self.ticks.unwrap_or_else(|| {
            self.events
                .iter()
                .map(|e| e.tick + 1)
                .max()
                .unwrap_or(0)
        })
    }

    /// Check that every event names known hosts and is well formed
    pub fn validate(&self) -> SimResult<()> {
        if self.hosts.is_empty() {
            return Err(SimError::InvalidTrace("no hosts".into()));
        }

        let hosts: BTreeSet<&HostId> = self.hosts.iter().collect();
        if hosts.len() != self.hosts.len() {
            return Err(SimError::InvalidTrace("duplicate host".into()));
        }

        let mut created = BTreeSet::new();
        for event in &self.events {
            if let Some(unknown) = event.action.hosts().into_iter().find(|h| !hosts.contains(h)) {
                return Err(SimError::InvalidTrace(format!(
                    "tick {}: unknown host {}",
                    event.tick, unknown
                )));
            }

            match &event.action {
                TraceAction::Up { a, b } | TraceAction::Down { a, b } if a == b => {
                    return Err(SimError::InvalidTrace(format!(
                        "tick {}: contact of {} with itself",
                        event.tick, a
                    )));
                }
                TraceAction::Create { id, to, .. } => {
                    if to.is_empty() {
                        return Err(SimError::InvalidTrace(format!(
                            "tick {}: message {} has no destinations",
                            event.tick, id
                        )));
                    }
                    if !created.insert(id) {
                        return Err(SimError::InvalidTrace(format!(
                            "tick {}: message {} created twice",
                            event.tick, id
                        )));
                    }
                }
                _ => {}
            }
        }

        if let Some(ticks) = self.ticks {
            let late = self.events.iter().filter(|e| e.tick >= ticks).count();
            if late > 0 {
                warn!(late, ticks, "Trace events past the end of the run are ignored");
            }
        }

        for warning in self.router.validate() {
            warn!(%warning, "Router configuration");
        }

        Ok(())
    }
}

/// Random contact model
///
/// Every tick each idle pair of hosts meets with `meet_probability`, each
/// live contact breaks with `break_probability`, and with
/// `message_probability` a random host originates a message to a random
/// other host.
#[derive(Debug, Clone)]
pub struct RandomContacts {
    pub ticks: u64,
    pub meet_probability: f64,
    pub break_probability: f64,
    pub message_probability: f64,
    pub message_size: u64,
    /// Seed for reproducible traces; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for RandomContacts {
    fn default() -> Self {
        Self {
            ticks: 200,
            meet_probability: 0.05,
            break_probability: 0.5,
            message_probability: 0.1,
            message_size: 100,
            seed: None,
        }
    }
}

impl RandomContacts {
    /// Generate a trace over `hosts`
    pub fn generate(&self, hosts: Vec<HostId>, router: MulticopyConfig) -> SimResult<ContactTrace> {
        if hosts.len() < 2 {
            return Err(SimError::InvalidTrace(
                "random contacts need at least two hosts".into(),
            ));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut pairs = Vec::new();
        for i in 0..hosts.len() {
            for j in (i + 1)..hosts.len() {
                pairs.push((i, j));
            }
        }

        let mut live = vec![false; pairs.len()];
        let mut events = Vec::new();
        let mut next_message = 1u64;

        for tick in 0..self.ticks {
            if rng.random::<f64>() < self.message_probability {
                let from = rng.random_range(0..hosts.len());
                let mut to = rng.random_range(0..hosts.len() - 1);
                if to >= from {
                    to += 1;
                }
                events.push(TraceEvent {
                    tick,
                    action: TraceAction::Create {
                        id: MessageId::new(format!("M{}", next_message))?,
                        from: hosts[from].clone(),
                        to: vec![hosts[to].clone()],
                        size: self.message_size,
                        response_size: 0,
                    },
                });
                next_message += 1;
            }

            for (idx, &(i, j)) in pairs.iter().enumerate() {
                let (a, b) = (hosts[i].clone(), hosts[j].clone());
                if live[idx] {
                    if rng.random::<f64>() < self.break_probability {
                        live[idx] = false;
                        events.push(TraceEvent {
                            tick,
                            action: TraceAction::Down { a, b },
                        });
                    }
                } else if rng.random::<f64>() < self.meet_probability {
                    live[idx] = true;
                    events.push(TraceEvent {
                        tick,
                        action: TraceAction::Up { a, b },
                    });
                }
            }
        }

        debug!(
            hosts = hosts.len(),
            events = events.len(),
            messages = next_message - 1,
            "Generated random contact trace"
        );

        Ok(ContactTrace {
            router,
            hosts,
            ticks: Some(self.ticks),
            events,
        })
    }
}
