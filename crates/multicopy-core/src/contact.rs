//! Contacts between hosts
//!
//! A contact is the link that exists while two hosts are in radio range.
//! It belongs to neither endpoint: both ends observe the same [`Contact`]
//! value through a registry keyed by the normalised endpoint pair.

use serde::{Deserialize, Serialize};

use crate::error::ContactError;
use crate::identity::HostId;

/// Normalised key for the contact between two hosts
pub type ContactKey = (HostId, HostId);

/// Build the normalised key for an unordered host pair
pub fn contact_key(a: &HostId, b: &HostId) -> ContactKey {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// A link between exactly two hosts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Lower endpoint (by identity ordering)
    a: HostId,
    /// Higher endpoint (by identity ordering)
    b: HostId,
    /// Whether the hosts are currently in range
    up: bool,
    /// Whether a transfer has been serviced on this contact instance
    serviced: bool,
    /// Tick at which the current (or last) instance came up
    up_since: Option<u64>,
    /// Number of times this contact has come up
    instances: u32,
}

impl Contact {
    /// Create a contact between two distinct hosts, initially down
    pub fn new(a: HostId, b: HostId) -> Result<Self, ContactError> {
        if a == b {
            return Err(ContactError::SelfContact(a.to_string()));
        }
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self {
            a,
            b,
            up: false,
            serviced: false,
            up_since: None,
            instances: 0,
        })
    }

    /// Normalised key of this contact
    pub fn key(&self) -> ContactKey {
        (self.a.clone(), self.b.clone())
    }

    /// Both endpoints, in normalised order
    pub fn endpoints(&self) -> (&HostId, &HostId) {
        (&self.a, &self.b)
    }

    /// Whether `host` is an endpoint of this contact
    pub fn involves(&self, host: &HostId) -> bool {
        &self.a == host || &self.b == host
    }

    /// The endpoint opposite to `host`
    pub fn other(&self, host: &HostId) -> Option<&HostId> {
        if &self.a == host {
            Some(&self.b)
        } else if &self.b == host {
            Some(&self.a)
        } else {
            None
        }
    }

    pub fn is_up(&self) -> bool {
        self.up
    }

    /// Whether a transfer was already serviced on the current instance
    pub fn is_serviced(&self) -> bool {
        self.serviced
    }

    pub fn up_since(&self) -> Option<u64> {
        self.up_since
    }

    pub fn instances(&self) -> u32 {
        self.instances
    }

    /// Apply an up/down notification
    ///
    /// Every notification starts a new contact instance as far as the
    /// service flag is concerned, so the flag is cleared unconditionally.
    pub fn state_changed(&mut self, up: bool, tick: u64) {
        if up && !self.up {
            self.instances += 1;
            self.up_since = Some(tick);
        }
        self.up = up;
        self.serviced = false;
    }

    /// Record that a transfer has been serviced on this instance
    pub fn mark_serviced(&mut self) {
        self.serviced = true;
    }
}
