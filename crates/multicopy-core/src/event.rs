//! Network events

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::identity::HostId;
use crate::message::MessageId;

/// Why a transfer attempt was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// The contact already serviced a transfer in this instance
    Stale,
    /// The offered replica holds fewer than two credits
    InsufficientCopies,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Stale => write!(f, "contact already serviced"),
            RejectReason::InsufficientCopies => write!(f, "not enough copies to split"),
        }
    }
}

/// Events that occur in the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEvent {
    /// Two hosts came into range
    ContactUp { a: HostId, b: HostId, tick: u64 },

    /// Two hosts left each other's range
    ContactDown { a: HostId, b: HostId, tick: u64 },

    /// A host originated a message
    MessageCreated {
        message_id: MessageId,
        from: HostId,
        to: BTreeSet<HostId>,
        copies: u32,
        tick: u64,
    },

    /// A replica was accepted over a contact and its credits split
    Transferred {
        message_id: MessageId,
        from: HostId,
        to: HostId,
        /// Credits now held by the receiving host
        received_copies: u32,
        /// Credits the sending host kept
        retained_copies: u32,
        tick: u64,
    },

    /// A transfer attempt was rejected by the router
    Rejected {
        message_id: MessageId,
        from: HostId,
        to: HostId,
        reason: RejectReason,
        tick: u64,
    },

    /// A replica reached one of its final recipients
    Delivered {
        message_id: MessageId,
        to: HostId,
        via: HostId,
        tick: u64,
    },
}

impl NetworkEvent {
    /// Tick at which the event happened
    pub fn tick(&self) -> u64 {
        match self {
            NetworkEvent::ContactUp { tick, .. }
            | NetworkEvent::ContactDown { tick, .. }
            | NetworkEvent::MessageCreated { tick, .. }
            | NetworkEvent::Transferred { tick, .. }
            | NetworkEvent::Rejected { tick, .. }
            | NetworkEvent::Delivered { tick, .. } => *tick,
        }
    }

    /// The message this event concerns, if any
    pub fn message_id(&self) -> Option<&MessageId> {
        match self {
            NetworkEvent::MessageCreated { message_id, .. }
            | NetworkEvent::Transferred { message_id, .. }
            | NetworkEvent::Rejected { message_id, .. }
            | NetworkEvent::Delivered { message_id, .. } => Some(message_id),
            NetworkEvent::ContactUp { .. } | NetworkEvent::ContactDown { .. } => None,
        }
    }
}
