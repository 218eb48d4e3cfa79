//! Messages and their replicas
//!
//! Every host keeps its own [`Message`] value per message id. Two hosts
//! holding the "same" message hold independent replicas that share the id,
//! sender and destinations but carry their own credit count.

use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::MessageError;
use crate::identity::HostId;

/// Unique identifier for a message
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Create a message id
    pub fn new(id: impl Into<String>) -> Result<Self, MessageError> {
        let id = id.into();
        if id.is_empty() {
            return Err(MessageError::EmptyId);
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message replica held by one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier shared by every replica of this message
    pub id: MessageId,
    /// Host that created the message
    pub from: HostId,
    /// Final recipients (one for unicast, several for multicast)
    pub to: BTreeSet<HostId>,
    /// Size of the message in bytes
    pub size: u64,
    /// Requested response size, 0 if no response is requested
    pub response_size: u64,
    /// Simulation tick at which the message was created
    pub created_at: u64,
    /// Number of replications this replica descends from
    pub hop_count: u32,
    /// Replication credits held by this replica
    copies: u32,
}

impl Message {
    /// Create a message addressed to one or more destinations
    pub fn new(
        id: MessageId,
        from: HostId,
        to: impl IntoIterator<Item = HostId>,
        size: u64,
        tick: u64,
    ) -> Result<Self, MessageError> {
        let to: BTreeSet<HostId> = to.into_iter().collect();
        if to.is_empty() {
            return Err(MessageError::NoDestinations(id.to_string()));
        }

        Ok(Self {
            id,
            from,
            to,
            size,
            response_size: 0,
            created_at: tick,
            hop_count: 0,
            copies: 0,
        })
    }

    /// Set the replication credits (builder form)
    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    /// Request a response of the given size
    pub fn with_response_size(mut self, response_size: u64) -> Self {
        self.response_size = response_size;
        self
    }

    /// Replication credits held by this replica
    pub fn copies(&self) -> u32 {
        self.copies
    }

    /// Overwrite the replication credits of this replica
    pub fn set_copies(&mut self, copies: u32) {
        self.copies = copies;
    }

    /// Produce a new, independent replica of this message
    ///
    /// The replica shares identity and addressing with `self`; its credit
    /// count starts equal to ours and is adjusted by the caller.
    pub fn replicate(&self) -> Self {
        let mut replica = self.clone();
        replica.hop_count = self.hop_count.saturating_add(1);
        replica
    }

    /// Whether `host` is one of the final recipients
    pub fn is_destination(&self, host: &HostId) -> bool {
        self.to.contains(host)
    }

    /// Whether the message has more than one recipient
    pub fn is_multicast(&self) -> bool {
        self.to.len() > 1
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
