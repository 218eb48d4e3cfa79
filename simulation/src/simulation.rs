//! Simulation engine for the multicopy router
//!
//! Implements a discrete-time forwarding engine:
//! - Scheduled contact up/down transitions and message creations
//! - Per-tick transfer attempts planned by the router
//! - Copy splitting and capacity bookkeeping on every accepted transfer
//! - Delivery tracking and latency statistics

use std::collections::BTreeMap;

use tracing::{debug, info, trace};

use multicopy_core::{HostId, MessageId, MessageStore, NetworkEvent, RejectReason, StoreError};
use multicopy_dtn::{
    ArrivalContext, ContactRouter, LedgerDrift, MulticopyConfig, MulticopyRouter, ReceiveOutcome,
};

use crate::error::{SimError, SimResult};
use crate::trace::{ContactTrace, TraceAction};
use crate::world::World;

/// Configuration for the simulation
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Maximum simulation ticks
    pub max_ticks: u64,
    /// Log every transfer attempt at debug level
    pub trace_routing: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_ticks: 100,
            trace_routing: true,
        }
    }
}

/// Simulation statistics
#[derive(Debug, Clone, Default)]
pub struct SimStats {
    pub messages_created: u64,
    /// Sum of destination counts over all created messages
    pub destinations_expected: u64,
    pub transfers_accepted: u64,
    pub rejected_stale: u64,
    pub rejected_insufficient: u64,
    pub messages_delivered: u64,
    pub contacts_up: u64,
    pub contacts_down: u64,
    /// Total delivery latency (ticks from creation to delivery)
    pub total_delivery_latency: u64,
}

impl SimStats {
    /// Fraction of (message, destination) pairs reached
    pub fn delivery_ratio(&self) -> f64 {
        if self.destinations_expected == 0 {
            0.0
        } else {
            self.messages_delivered as f64 / self.destinations_expected as f64
        }
    }

    pub fn average_latency(&self) -> Option<f64> {
        (self.messages_delivered > 0)
            .then(|| self.total_delivery_latency as f64 / self.messages_delivered as f64)
    }
}

/// The simulation state
#[derive(Debug)]
pub struct Simulation {
    /// Hosts, contacts and capacity counters
    pub world: World,
    /// Current simulation tick
    pub tick: u64,
    /// Configuration
    pub config: SimConfig,
    /// Global event log (all events)
    pub event_log: Vec<NetworkEvent>,
    /// Statistics
    pub stats: SimStats,
    router: MulticopyRouter,
    /// Actions waiting for their tick
    schedule: BTreeMap<u64, Vec<TraceAction>>,
}

impl Simulation {
    /// Create a new simulation over `world`
    pub fn new(world: World, router: MulticopyConfig, config: SimConfig) -> Self {
        Self {
            world,
            tick: 0,
            config,
            event_log: Vec::new(),
            stats: SimStats::default(),
            router: MulticopyRouter::new(router),
            schedule: BTreeMap::new(),
        }
    }

    /// Create a simulation that replays `trace`
    pub fn from_trace(trace: ContactTrace, config: SimConfig) -> SimResult<Self> {
        trace.validate()?;
        let max_ticks = trace.duration();
        let world = World::with_hosts(trace.hosts);

        let mut sim = Self::new(world, trace.router, SimConfig { max_ticks, ..config });
        for event in trace.events {
            sim.schedule(event.tick, event.action);
        }
        Ok(sim)
    }

    pub fn router(&self) -> &MulticopyRouter {
        &self.router
    }

    /// Queue an action for `tick`
    pub fn schedule(&mut self, tick: u64, action: TraceAction) {
        self.schedule.entry(tick).or_default().push(action);
    }

    /// Number of actions not yet applied
    pub fn pending_actions(&self) -> usize {
        self.schedule.values().map(Vec::len).sum()
    }

    /// Run a single simulation tick
    ///
    /// Applies the actions due at the current tick, lets every host try its
    /// live contacts, then advances the clock.
    pub fn step(&mut self) -> SimResult<()> {
        trace!("=== Tick {} ===", self.tick);

        // 1. Scheduled contact changes and message creations
        let later = self.schedule.split_off(&(self.tick + 1));
        let due = std::mem::replace(&mut self.schedule, later);
        for action in due.into_values().flatten() {
            self.apply(action)?;
        }

        // 2. Forwarding over live contacts
        self.forward()?;

        self.tick += 1;
        Ok(())
    }

    /// Run simulation until max_ticks
    pub fn run(&mut self) -> SimResult<()> {
        while self.tick < self.config.max_ticks {
            self.step()?;
        }

        info!("Simulation complete at tick {}", self.tick);
        info!("Stats: {:?}", self.stats);
        Ok(())
    }

    /// Run for a specific number of ticks
    pub fn run_ticks(&mut self, ticks: u64) -> SimResult<()> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    fn apply(&mut self, action: TraceAction) -> SimResult<()> {
        match action {
            TraceAction::Up { a, b } => self.connect(&a, &b),
            TraceAction::Down { a, b } => self.disconnect(&a, &b),
            TraceAction::Create {
                id,
                from,
                to,
                size,
                response_size,
            } => self
                .create_message_with_response(id, &from, to, size, response_size)
                .map(|_| ()),
        }
    }

    /// Bring the contact between `a` and `b` up
    pub fn connect(&mut self, a: &HostId, b: &HostId) -> SimResult<()> {
        self.set_contact(a, b, true)
    }

    /// Take the contact between `a` and `b` down
    pub fn disconnect(&mut self, a: &HostId, b: &HostId) -> SimResult<()> {
        self.set_contact(a, b, false)
    }

    fn set_contact(&mut self, a: &HostId, b: &HostId, up: bool) -> SimResult<()> {
        self.world.host(a)?;
        self.world.host(b)?;
        self.router
            .on_connection_changed(&mut self.world.contacts, a, b, up, self.tick)?;

        let (a, b, tick) = (a.clone(), b.clone(), self.tick);
        if up {
            self.stats.contacts_up += 1;
            debug!("Contact {} <-> {} up at tick {}", a, b, tick);
            self.emit_event(NetworkEvent::ContactUp { a, b, tick });
        } else {
            self.stats.contacts_down += 1;
            debug!("Contact {} <-> {} down at tick {}", a, b, tick);
            self.emit_event(NetworkEvent::ContactDown { a, b, tick });
        }
        Ok(())
    }

    /// Originate a message at `from` with the router's copy budget
    pub fn create_message(
        &mut self,
        id: MessageId,
        from: &HostId,
        to: impl IntoIterator<Item = HostId>,
        size: u64,
    ) -> SimResult<MessageId> {
        self.create_message_with_response(id, from, to, size, 0)
    }

    /// Originate a message that requests a response of `response_size` bytes
    pub fn create_message_with_response(
        &mut self,
        id: MessageId,
        from: &HostId,
        to: impl IntoIterator<Item = HostId>,
        size: u64,
        response_size: u64,
    ) -> SimResult<MessageId> {
        let to: Vec<HostId> = to.into_iter().collect();
        for host in std::iter::once(from).chain(&to) {
            self.world.host(host)?;
        }
        if self.world.hosts.values().any(|h| h.store.has(&id)) {
            return Err(SimError::DuplicateMessage {
                id: id.to_string(),
                host: from.to_string(),
            });
        }

        let message = self.router.create_message_with_response(
            id,
            from.clone(),
            to,
            size,
            response_size,
            self.tick,
            &mut self.world.ledger,
        )?;

        self.stats.messages_created += 1;
        self.stats.destinations_expected += message.to.len() as u64;
        self.emit_event(NetworkEvent::MessageCreated {
            message_id: message.id.clone(),
            from: message.from.clone(),
            to: message.to.clone(),
            copies: message.copies(),
            tick: self.tick,
        });

        let id = message.id.clone();
        self.world.host_mut(from)?.store.put(message);
        Ok(id)
    }

    fn forward(&mut self) -> SimResult<()> {
        for host in self.world.host_ids() {
            let attempts = {
                let state = self.world.host(&host)?;
                self.router.update(&host, &state.store, &self.world.contacts)
            };

            for attempt in attempts {
                // One transfer per contact; skip the rest once serviced
                if self.world.contacts.is_serviced(&host, &attempt.to) {
                    continue;
                }
                if attempt.deliverable
                    && self.world.host(&attempt.to)?.delivered.contains(&attempt.message_id)
                {
                    continue;
                }
                if self.config.trace_routing {
                    debug!(
                        "Tick {}: {} offers {} to {}{}",
                        self.tick,
                        host,
                        attempt.message_id,
                        attempt.to,
                        if attempt.deliverable { " (deliverable)" } else { "" }
                    );
                }
                self.offer(&host, &attempt.to, &attempt.message_id)?;
            }
        }
        Ok(())
    }

    /// Offer `from`'s replica of `id` to `to` over their contact
    ///
    /// Accepted replicas are stored at both ends with their new credit
    /// counts. Fails if the contact does not exist or is down.
    pub fn offer(&mut self, from: &HostId, to: &HostId, id: &MessageId) -> SimResult<ReceiveOutcome> {
        let mut incoming = self
            .world
            .host(from)?
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::MessageNotFound(id.to_string()))?;

        let outcome = {
            let World {
                hosts,
                contacts,
                ledger,
            } = &mut self.world;
            let local_store = &hosts
                .get(to)
                .ok_or_else(|| multicopy_core::IdentityError::UnknownHost(to.to_string()))?
                .store;

            self.router.receive(
                &mut incoming,
                from,
                ArrivalContext {
                    local: to,
                    local_store,
                    contacts,
                    ledger,
                },
            )?
        };

        match &outcome {
            ReceiveOutcome::Accepted { replica } => {
                self.stats.transfers_accepted += 1;

                self.world.host_mut(to)?.store.put(replica.clone());
                let retained = incoming.copies();
                self.world.host_mut(from)?.store.put(incoming);
                let delivery = self.router.delivered(replica, to, from);

                self.emit_event(NetworkEvent::Transferred {
                    message_id: id.clone(),
                    from: from.clone(),
                    to: to.clone(),
                    received_copies: replica.copies(),
                    retained_copies: retained,
                    tick: self.tick,
                });

                if let Some(delivery) = delivery
                    && self.world.host_mut(to)?.delivered.insert(delivery.message_id.clone())
                {
                    let latency = self.tick.saturating_sub(replica.created_at);
                    self.stats.messages_delivered += 1;
                    self.stats.total_delivery_latency += latency;
                    info!(
                        "Message {} delivered to {} via {} at tick {} (latency: {} ticks)",
                        delivery.message_id, delivery.to, delivery.via, self.tick, latency
                    );
                    self.emit_event(NetworkEvent::Delivered {
                        message_id: delivery.message_id,
                        to: delivery.to,
                        via: delivery.via,
                        tick: self.tick,
                    });
                }
            }
            ReceiveOutcome::Rejected { reason } => {
                match reason {
                    RejectReason::Stale => self.stats.rejected_stale += 1,
                    RejectReason::InsufficientCopies => self.stats.rejected_insufficient += 1,
                }
                self.emit_event(NetworkEvent::Rejected {
                    message_id: id.clone(),
                    from: from.clone(),
                    to: to.clone(),
                    reason: *reason,
                    tick: self.tick,
                });
            }
        }

        Ok(outcome)
    }

    fn emit_event(&mut self, event: NetworkEvent) {
        trace!("Event: {:?}", event);
        self.event_log.push(event);
    }

    /// Events concerning message `id`
    pub fn events_for<'a>(&'a self, id: &'a MessageId) -> impl Iterator<Item = &'a NetworkEvent> + 'a {
        self.event_log
            .iter()
            .filter(move |e| e.message_id() == Some(id))
    }

    /// Ledger drift for every host
    pub fn ledger_report(&self) -> Vec<LedgerDrift> {
        self.world.ledger_report()
    }

    /// Get a summary of the current state
    pub fn state_summary(&self) -> String {
        let held: usize = self.world.hosts.values().map(|h| h.store.len()).sum();

        format!(
            "Tick {}: {} live contacts, {} replicas held, {} credits, {} delivered",
            self.tick,
            self.world.contacts.active_count(),
            held,
            self.world.ledger.total(),
            self.stats.messages_delivered
        )
    }
}
