//! Contact registry
//!
//! Holds one [`Contact`] per host pair that has ever been in range. Both
//! endpoints look the contact up through the same normalised key, so the
//! service flag set by one side is what the other side sees.

use std::collections::BTreeMap;

use tracing::debug;

use multicopy_core::{Contact, ContactError, ContactKey, HostId, contact_key};

/// Registry of contacts keyed by unordered host pair
#[derive(Debug, Clone, Default)]
pub struct ContactTable {
    contacts: BTreeMap<ContactKey, Contact>,
}

impl ContactTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an up/down notification, creating the contact on first sight
    ///
    /// Clears the service flag of the contact.
    pub fn connection_changed(
        &mut self,
        a: &HostId,
        b: &HostId,
        up: bool,
        tick: u64,
    ) -> Result<&Contact, ContactError> {
        let key = contact_key(a, b);
        let contact = match self.contacts.entry(key) {
            std::collections::btree_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(Contact::new(a.clone(), b.clone())?)
            }
        };
        contact.state_changed(up, tick);
        debug!(a = %a, b = %b, up, tick, "Contact state changed");
        Ok(contact)
    }

    /// Get the contact between two hosts
    pub fn get(&self, a: &HostId, b: &HostId) -> Option<&Contact> {
        self.contacts.get(&contact_key(a, b))
    }

    /// Get the contact between two hosts, mutably
    pub fn get_mut(&mut self, a: &HostId, b: &HostId) -> Option<&mut Contact> {
        self.contacts.get_mut(&contact_key(a, b))
    }

    /// Whether the contact between two hosts is currently up
    pub fn is_up(&self, a: &HostId, b: &HostId) -> bool {
        self.get(a, b).map(Contact::is_up).unwrap_or(false)
    }

    /// Whether the contact between two hosts already serviced a transfer
    pub fn is_serviced(&self, a: &HostId, b: &HostId) -> bool {
        self.get(a, b).map(Contact::is_serviced).unwrap_or(false)
    }

    /// Set the service flag of the contact between two hosts
    pub fn mark_serviced(&mut self, a: &HostId, b: &HostId) -> Result<(), ContactError> {
        let contact = self.get_mut(a, b).ok_or_else(|| ContactError::NotFound {
            a: a.to_string(),
            b: b.to_string(),
        })?;
        contact.mark_serviced();
        Ok(())
    }

    /// Contacts of `host` that are currently up
    pub fn active_for<'a>(&'a self, host: &'a HostId) -> impl Iterator<Item = &'a Contact> + 'a {
        self.contacts
            .values()
            .filter(move |c| c.is_up() && c.involves(host))
    }

    /// Hosts currently in contact with `host`
    pub fn peers_of(&self, host: &HostId) -> Vec<HostId> {
        self.active_for(host)
            .filter_map(|c| c.other(host).cloned())
            .collect()
    }

    /// All known contacts
    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    /// Number of known contacts (up or down)
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Number of contacts currently up
    pub fn active_count(&self) -> usize {
        self.contacts.values().filter(|c| c.is_up()).count()
    }
}
