//! Multi-copy router
//!
//! [`ContactRouter`] is the capability a forwarding engine needs from a
//! routing policy: which transfers to try on each update, what to do with a
//! replica arriving over a contact, and how to react to contacts changing
//! state. [`MulticopyRouter`] implements it with community-aware copy
//! splitting.
//!
//! The router owns no network state. Stores, contacts and the capacity
//! ledger are borrowed from the caller for the duration of one call.

use tracing::{debug, info};

use multicopy_core::{HostId, Message, MessageId, MessageStore, RejectReason};

use crate::MulticopyConfig;
use crate::admission::{Admission, check_admission};
use crate::contacts::ContactTable;
use crate::delivery::{Delivery, detect_delivery};
use crate::error::AllocatorResult;
use crate::ledger::CapacityLedger;
use crate::role::NodeRole;
use crate::split::plan_split;

/// State of the receiving host borrowed for one arrival
pub struct ArrivalContext<'a> {
    /// Host the replica arrives at
    pub local: &'a HostId,
    /// Store of the receiving host
    pub local_store: &'a dyn MessageStore,
    /// Shared contact registry
    pub contacts: &'a mut ContactTable,
    /// Shared capacity ledger
    pub ledger: &'a mut CapacityLedger,
}

/// Result of offering a replica to a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The split ran; `replica` is to be admitted into the local store
    Accepted { replica: Message },
    /// The transfer was turned away and no state changed
    Rejected { reason: RejectReason },
}

impl ReceiveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ReceiveOutcome::Accepted { .. })
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            ReceiveOutcome::Rejected { reason } => Some(*reason),
            ReceiveOutcome::Accepted { .. } => None,
        }
    }

    /// The replica to admit, if accepted
    pub fn into_replica(self) -> Option<Message> {
        match self {
            ReceiveOutcome::Accepted { replica } => Some(replica),
            ReceiveOutcome::Rejected { .. } => None,
        }
    }
}

/// A transfer the engine should attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferAttempt {
    pub message_id: MessageId,
    /// Peer to offer the replica to
    pub to: HostId,
    /// Whether the peer is a final recipient of the message
    pub deliverable: bool,
}

/// Routing capability composed into a forwarding engine
pub trait ContactRouter {
    /// Transfers `host` should attempt on its live, unserviced contacts
    ///
    /// Attempts towards final recipients come first, then every other
    /// held message to every contact.
    fn update(
        &self,
        host: &HostId,
        store: &dyn MessageStore,
        contacts: &ContactTable,
    ) -> Vec<TransferAttempt>;

    /// Handle `incoming` arriving from `from`
    ///
    /// On acceptance `incoming` holds the sender's remaining credits and
    /// the returned replica holds the receiver's.
    fn receive(
        &self,
        incoming: &mut Message,
        from: &HostId,
        ctx: ArrivalContext<'_>,
    ) -> AllocatorResult<ReceiveOutcome>;

    /// Divide credits between the sender's replica and a new local replica
    ///
    /// `existing` is what `local` already holds for the same message.
    fn split(
        &self,
        incoming: &mut Message,
        from: &HostId,
        local: &HostId,
        existing: u32,
        ledger: &mut CapacityLedger,
    ) -> Message;

    /// React to a contact going up or down
    fn on_connection_changed(
        &self,
        contacts: &mut ContactTable,
        a: &HostId,
        b: &HostId,
        up: bool,
        tick: u64,
    ) -> AllocatorResult<()>;

    /// Report a delivery after `replica` has been admitted at `local`
    fn delivered(&self, replica: &Message, local: &HostId, from: &HostId) -> Option<Delivery> {
        detect_delivery(replica, local, from)
    }
}

/// Community-aware spray-and-wait router
#[derive(Debug, Clone, Default)]
pub struct MulticopyRouter {
    config: MulticopyConfig,
}

impl MulticopyRouter {
    /// Create a new router
    pub fn new(config: MulticopyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MulticopyConfig {
        &self.config
    }

    /// Initial credits given to newly created messages
    pub fn copies(&self) -> u32 {
        self.config.copies
    }

    /// Create a message at `from` with the configured credit budget
    ///
    /// The creator's capacity is credited with the budget; the caller puts
    /// the returned message into the creator's store.
    pub fn create_message(
        &self,
        id: MessageId,
        from: HostId,
        to: impl IntoIterator<Item = HostId>,
        size: u64,
        tick: u64,
        ledger: &mut CapacityLedger,
    ) -> AllocatorResult<Message> {
        self.create_message_with_response(id, from, to, size, 0, tick, ledger)
    }

    /// Create a message that requests a response of `response_size` bytes
    #[allow(clippy::too_many_arguments)]
    pub fn create_message_with_response(
        &self,
        id: MessageId,
        from: HostId,
        to: impl IntoIterator<Item = HostId>,
        size: u64,
        response_size: u64,
        tick: u64,
        ledger: &mut CapacityLedger,
    ) -> AllocatorResult<Message> {
        let message = Message::new(id, from, to, size, tick)?
            .with_response_size(response_size)
            .with_copies(self.config.copies);
        ledger.add_capacity(&message.from, message.copies());

        info!(
            message_id = %message.id,
            from = %message.from,
            destinations = message.to.len(),
            copies = message.copies(),
            response_size,
            "Message created"
        );
        Ok(message)
    }
}

impl ContactRouter for MulticopyRouter {
    fn update(
        &self,
        host: &HostId,
        store: &dyn MessageStore,
        contacts: &ContactTable,
    ) -> Vec<TransferAttempt> {
        let peers: Vec<HostId> = contacts
            .active_for(host)
            .filter(|c| !c.is_serviced())
            .filter_map(|c| c.other(host).cloned())
            .collect();

        if peers.is_empty() || store.is_empty() {
            return Vec::new();
        }

        let messages = store.messages();
        let mut attempts = Vec::new();

        for deliverable_pass in [true, false] {
            for peer in &peers {
                for message in &messages {
                    if message.is_destination(peer) == deliverable_pass {
                        attempts.push(TransferAttempt {
                            message_id: message.id.clone(),
                            to: peer.clone(),
                            deliverable: deliverable_pass,
                        });
                    }
                }
            }
        }

        attempts
    }

    fn receive(
        &self,
        incoming: &mut Message,
        from: &HostId,
        ctx: ArrivalContext<'_>,
    ) -> AllocatorResult<ReceiveOutcome> {
        let ArrivalContext {
            local,
            local_store,
            contacts,
            ledger,
        } = ctx;

        match check_admission(contacts, local, from, incoming)? {
            Admission::Reject(reason) => {
                debug!(
                    message_id = %incoming.id,
                    from = %from,
                    to = %local,
                    copies = incoming.copies(),
                    %reason,
                    "Transfer rejected"
                );
                return Ok(ReceiveOutcome::Rejected { reason });
            }
            Admission::Admit => {}
        }

        let existing = local_store.copies_of(&incoming.id);
        let replica = self.split(incoming, from, local, existing, ledger);
        contacts.mark_serviced(local, from)?;

        Ok(ReceiveOutcome::Accepted { replica })
    }

    fn split(
        &self,
        incoming: &mut Message,
        from: &HostId,
        local: &HostId,
        existing: u32,
        ledger: &mut CapacityLedger,
    ) -> Message {
        let mut replica = incoming.replicate();
        let plan = plan_split(
            incoming.copies(),
            existing,
            NodeRole::of(from),
            NodeRole::of(local),
        );

        ledger.reduce_capacity(local, plan.existing);
        ledger.add_capacity(local, plan.local);
        ledger.reduce_capacity(from, plan.incoming);
        ledger.add_capacity(from, plan.source);

        replica.set_copies(plan.local);
        incoming.set_copies(plan.source);

        debug!(
            message_id = %replica.id,
            from = %from,
            to = %local,
            strategy = ?plan.strategy,
            incoming = plan.incoming,
            existing = plan.existing,
            received = plan.local,
            retained = plan.source,
            "Copies split"
        );

        replica
    }

    fn on_connection_changed(
        &self,
        contacts: &mut ContactTable,
        a: &HostId,
        b: &HostId,
        up: bool,
        tick: u64,
    ) -> AllocatorResult<()> {
        contacts.connection_changed(a, b, up, tick)?;
        Ok(())
    }
}
