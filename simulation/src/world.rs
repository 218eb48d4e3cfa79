//! Host registry for the simulation
//!
//! The world owns every piece of network state: one [`HostState`] per host,
//! the shared contact table and the capacity ledger. Everything is keyed by
//! [`HostId`], so hosts, contacts and replicas never reference each other
//! directly.

use std::collections::{BTreeMap, BTreeSet};

use multicopy_core::{HostId, IdentityError, MemoryStore, MessageId, MessageStore};
use multicopy_dtn::{CapacityLedger, ContactTable, LedgerDrift, is_hub};

/// State of one host
#[derive(Debug, Clone)]
pub struct HostState {
    pub id: HostId,
    /// Replicas held by this host
    pub store: MemoryStore,
    /// Messages that reached this host as a final recipient
    pub delivered: BTreeSet<MessageId>,
}

impl HostState {
    pub fn new(id: HostId) -> Self {
        Self {
            id,
            store: MemoryStore::new(),
            delivered: BTreeSet::new(),
        }
    }
}

/// All hosts, contacts and capacity counters of a simulation
#[derive(Debug, Clone, Default)]
pub struct World {
    pub hosts: BTreeMap<HostId, HostState>,
    pub contacts: ContactTable,
    pub ledger: CapacityLedger,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world containing the given hosts
    pub fn with_hosts(hosts: impl IntoIterator<Item = HostId>) -> Self {
        let mut world = Self::new();
        for host in hosts {
            world.add_host(host);
        }
        world
    }

    /// Add a host (no-op if it already exists)
    pub fn add_host(&mut self, id: HostId) {
        if let std::collections::btree_map::Entry::Vacant(e) = self.hosts.entry(id) {
            let id = e.key().clone();
            e.insert(HostState::new(id));
        }
    }

    pub fn contains(&self, id: &HostId) -> bool {
        self.hosts.contains_key(id)
    }

    /// Look up a host
    pub fn host(&self, id: &HostId) -> Result<&HostState, IdentityError> {
        self.hosts
            .get(id)
            .ok_or_else(|| IdentityError::UnknownHost(id.to_string()))
    }

    /// Look up a host mutably
    pub fn host_mut(&mut self, id: &HostId) -> Result<&mut HostState, IdentityError> {
        self.hosts
            .get_mut(id)
            .ok_or_else(|| IdentityError::UnknownHost(id.to_string()))
    }

    /// Get all host IDs
    pub fn host_ids(&self) -> Vec<HostId> {
        self.hosts.keys().cloned().collect()
    }

    /// Community-center hosts
    pub fn hubs(&self) -> Vec<HostId> {
        self.hosts.keys().filter(|h| is_hub(h)).cloned().collect()
    }

    /// Credits `host` holds for message `id`
    pub fn copies_of(&self, host: &HostId, id: &MessageId) -> u32 {
        self.hosts
            .get(host)
            .map(|h| h.store.copies_of(id))
            .unwrap_or(0)
    }

    /// Credits held for message `id` across every host
    pub fn total_copies(&self, id: &MessageId) -> u64 {
        self.hosts
            .values()
            .map(|h| u64::from(h.store.copies_of(id)))
            .sum()
    }

    /// Ledger drift for every host
    pub fn ledger_report(&self) -> Vec<LedgerDrift> {
        self.hosts
            .values()
            .map(|h| self.ledger.reconcile(&h.id, &h.store))
            .collect()
    }

    /// Whether every host's capacity matches its stored credits
    pub fn is_ledger_consistent(&self) -> bool {
        self.ledger_report().iter().all(LedgerDrift::is_consistent)
    }

    /// Print a simple table of hosts, capacities and live contacts
    pub fn visualize(&self) -> String {
        let mut output = String::new();
        output.push_str("Hosts:\n");
        output.push_str(&format!(
            "  Count: {} ({} hubs)\n",
            self.hosts.len(),
            self.hubs().len()
        ));
        output.push_str(&format!("  Live contacts: {}\n\n", self.contacts.active_count()));

        for (id, host) in &self.hosts {
            let peers: Vec<String> = self
                .contacts
                .peers_of(id)
                .iter()
                .map(|p| p.to_string())
                .collect();
            output.push_str(&format!(
                "  {} ccap={} messages={} -> [{}]\n",
                id,
                self.ledger.capacity(id),
                host.store.len(),
                peers.join(", ")
            ));
        }
        output
    }
}

/// Builder for worlds of numbered hosts
///
/// Ordinary hosts are named `n1..nN`, hubs `CC1..CCk`.
#[derive(Debug, Clone, Default)]
pub struct WorldBuilder {
    ordinary: usize,
    hubs: usize,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ordinary hosts
    pub fn ordinary(mut self, count: usize) -> Self {
        self.ordinary = count;
        self
    }

    /// Number of community-center hosts
    pub fn hubs(mut self, count: usize) -> Self {
        self.hubs = count;
        self
    }

    /// Host identities this builder produces
    pub fn host_ids(&self) -> Result<Vec<HostId>, IdentityError> {
        let ordinary = (1..=self.ordinary).map(|i| HostId::new(format!("n{}", i)));
        let hubs = (1..=self.hubs).map(|i| HostId::new(format!("CC{}", i)));
        ordinary.chain(hubs).collect()
    }

    pub fn build(self) -> Result<World, IdentityError> {
        Ok(World::with_hosts(self.host_ids()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multicopy_core::Message;

    fn host(name: &str) -> HostId {
        HostId::new(name).unwrap()
    }

    #[test]
    fn test_builder_names_hosts() {
        let world = WorldBuilder::new().ordinary(3).hubs(2).build().unwrap();
        assert_eq!(world.hosts.len(), 5);
        assert!(world.contains(&host("n3")));
        assert_eq!(world.hubs(), vec![host("CC1"), host("CC2")]);
    }

    #[test]
    fn test_add_host_is_idempotent() {
        let mut world = World::with_hosts([host("a"), host("b")]);
        world
            .host_mut(&host("a"))
            .unwrap()
            .delivered
            .insert(MessageId::new("M1").unwrap());
        world.add_host(host("a"));

        assert_eq!(world.hosts.len(), 2);
        assert_eq!(world.host(&host("a")).unwrap().delivered.len(), 1);
    }

    #[test]
    fn test_unknown_host() {
        let world = World::new();
        assert!(matches!(
            world.host(&host("ghost")),
            Err(IdentityError::UnknownHost(_))
        ));
    }

    #[test]
    fn test_ledger_report() {
        let mut world = World::with_hosts([host("a")]);
        let msg = Message::new(MessageId::new("M1").unwrap(), host("a"), [host("b")], 1, 0)
            .unwrap()
            .with_copies(4);
        world.host_mut(&host("a")).unwrap().store.put(msg);
        assert!(!world.is_ledger_consistent());

        world.ledger.add_capacity(&host("a"), 4);
        assert!(world.is_ledger_consistent());
        assert_eq!(world.total_copies(&MessageId::new("M1").unwrap()), 4);
    }

    #[test]
    fn test_visualize_lists_hosts() {
        let mut world = WorldBuilder::new().ordinary(2).hubs(1).build().unwrap();
        world
            .contacts
            .connection_changed(&host("n1"), &host("CC1"), true, 0)
            .unwrap();

        let picture = world.visualize();
        assert!(picture.contains("1 hubs"));
        assert!(picture.contains("n1 ccap=0 messages=0 -> [CC1]"));
    }
}
