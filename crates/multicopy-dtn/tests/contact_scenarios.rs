//! Contact Scenario Tests
//!
//! End-to-end checks of the copy allocator across realistic contact
//! sequences:
//! - Even splits between ordinary hosts
//! - Merging with replicas the receiver already holds
//! - Hubs absorbing and handing back copies
//! - Stale contacts and the copy floor
//! - Ledger consistency after long contact chains

use std::collections::BTreeMap;

use multicopy_core::{HostId, MemoryStore, Message, MessageId, MessageStore, RejectReason};
use multicopy_dtn::{
    AllocatorError, ArrivalContext, CapacityLedger, ContactRouter, ContactTable, MulticopyConfig,
    MulticopyRouter, ReceiveOutcome,
};

// ============================================================================
// Test Network
// ============================================================================

/// Minimal host registry wired to a router
struct TestNetwork {
    router: MulticopyRouter,
    stores: BTreeMap<HostId, MemoryStore>,
    contacts: ContactTable,
    ledger: CapacityLedger,
    tick: u64,
}

impl TestNetwork {
    fn new(copies: u32) -> Self {
        Self {
            router: MulticopyRouter::new(MulticopyConfig { copies }),
            stores: BTreeMap::new(),
            contacts: ContactTable::new(),
            ledger: CapacityLedger::new(),
            tick: 0,
        }
    }

    fn create(&mut self, id: &str, from: &str, to: &str) {
        let from = host(from);
        let msg = self
            .router
            .create_message(mid(id), from.clone(), [host(to)], 100, self.tick, &mut self.ledger)
            .unwrap();
        self.stores.entry(from).or_default().put(msg);
    }

    /// Place a replica with an arbitrary credit count, keeping the ledger in step
    fn seed(&mut self, id: &str, at: &str, copies: u32) {
        let at = host(at);
        let msg = Message::new(mid(id), host("origin"), [host("far")], 100, 0)
            .unwrap()
            .with_copies(copies);
        self.ledger.add_capacity(&at, copies);
        self.stores.entry(at).or_default().put(msg);
    }

    fn up(&mut self, a: &str, b: &str) {
        self.tick += 1;
        self.router
            .on_connection_changed(&mut self.contacts, &host(a), &host(b), true, self.tick)
            .unwrap();
    }

    fn down(&mut self, a: &str, b: &str) {
        self.tick += 1;
        self.router
            .on_connection_changed(&mut self.contacts, &host(a), &host(b), false, self.tick)
            .unwrap();
    }

    /// Offer `from`'s replica of `id` to `to`, admitting it on acceptance
    fn transfer(&mut self, id: &str, from: &str, to: &str) -> Result<ReceiveOutcome, AllocatorError> {
        let (from, to, id) = (host(from), host(to), mid(id));
        let mut incoming = self.stores[&from].get(&id).unwrap().clone();
        let local_store = self.stores.entry(to.clone()).or_default();

        let outcome = self.router.receive(
            &mut incoming,
            &from,
            ArrivalContext {
                local: &to,
                local_store,
                contacts: &mut self.contacts,
                ledger: &mut self.ledger,
            },
        )?;

        if let ReceiveOutcome::Accepted { replica } = &outcome {
            self.stores.get_mut(&to).unwrap().put(replica.clone());
            self.stores.get_mut(&from).unwrap().put(incoming);
        }
        Ok(outcome)
    }

    fn copies(&self, id: &str, at: &str) -> u32 {
        self.stores
            .get(&host(at))
            .map(|s| s.copies_of(&mid(id)))
            .unwrap_or(0)
    }

    fn capacity(&self, at: &str) -> u64 {
        self.ledger.capacity(&host(at))
    }

    fn assert_ledger_consistent(&self) {
        for (id, store) in &self.stores {
            let drift = self.ledger.reconcile(id, store);
            assert!(drift.is_consistent(), "ledger drift: {:?}", drift);
        }
    }

    fn total_copies(&self, id: &str) -> u32 {
        self.stores.values().map(|s| s.copies_of(&mid(id))).sum()
    }
}

fn host(name: &str) -> HostId {
    HostId::new(name).unwrap()
}

fn mid(id: &str) -> MessageId {
    MessageId::new(id).unwrap()
}

// ============================================================================
// Split Scenarios
// ============================================================================

#[test]
fn test_ordinary_hosts_split_fresh_message() {
    let mut net = TestNetwork::new(2);
    net.create("M1", "x", "z");
    net.up("x", "y");

    let outcome = net.transfer("M1", "x", "y").unwrap();
    assert!(outcome.is_accepted());

    assert_eq!(net.copies("M1", "y"), 1);
    assert_eq!(net.copies("M1", "x"), 1);
    assert_eq!((net.capacity("x"), net.capacity("y")), (1, 1));
    net.assert_ledger_consistent();
}

#[test]
fn test_ordinary_hosts_merge_existing_replica() {
    let mut net = TestNetwork::new(8);
    net.seed("M1", "x", 5);
    net.seed("M1", "y", 3);
    net.up("x", "y");

    assert!(net.transfer("M1", "x", "y").unwrap().is_accepted());

    assert_eq!(net.copies("M1", "y"), 4);
    assert_eq!(net.copies("M1", "x"), 4);
    assert_eq!(net.total_copies("M1"), 8);
    net.assert_ledger_consistent();
}

#[test]
fn test_hub_absorbs_copies() {
    let mut net = TestNetwork::new(4);
    net.create("M1", "x", "z");
    net.up("x", "CC1");

    assert!(net.transfer("M1", "x", "CC1").unwrap().is_accepted());

    assert_eq!(net.copies("M1", "CC1"), 3);
    assert_eq!(net.copies("M1", "x"), 1);
    assert_eq!(net.capacity("CC1"), 3);
    assert_eq!(net.capacity("x"), 1);
    net.assert_ledger_consistent();
}

#[test]
fn test_hub_hands_out_a_single_copy() {
    let mut net = TestNetwork::new(8);
    net.seed("M1", "CC1", 7);
    net.up("CC1", "walker");

    assert!(net.transfer("M1", "CC1", "walker").unwrap().is_accepted());

    assert_eq!(net.copies("M1", "walker"), 1);
    assert_eq!(net.copies("M1", "CC1"), 6);
    net.assert_ledger_consistent();
}

#[test]
fn test_single_copy_rejected_without_side_effects() {
    let mut net = TestNetwork::new(8);
    net.seed("M1", "x", 1);
    net.up("x", "y");

    let outcome = net.transfer("M1", "x", "y").unwrap();
    assert_eq!(outcome.reject_reason(), Some(RejectReason::InsufficientCopies));

    assert_eq!(net.copies("M1", "x"), 1);
    assert_eq!(net.copies("M1", "y"), 0);
    assert_eq!((net.capacity("x"), net.capacity("y")), (1, 0));
    assert!(!net.contacts.is_serviced(&host("x"), &host("y")));
}

#[test]
fn test_serviced_contact_rejects_everything() {
    let mut net = TestNetwork::new(8);
    net.create("M1", "x", "z");
    net.create("M2", "x", "z");
    net.seed("M3", "y", 6);
    net.up("x", "y");

    assert!(net.transfer("M1", "x", "y").unwrap().is_accepted());

    // Neither another message nor the reverse direction gets through
    let outcome = net.transfer("M2", "x", "y").unwrap();
    assert_eq!(outcome.reject_reason(), Some(RejectReason::Stale));
    let outcome = net.transfer("M3", "y", "x").unwrap();
    assert_eq!(outcome.reject_reason(), Some(RejectReason::Stale));

    assert_eq!(net.copies("M2", "x"), 8);
    assert_eq!(net.copies("M3", "y"), 6);
    net.assert_ledger_consistent();
}

#[test]
fn test_contact_reset_allows_new_transfer() {
    let mut net = TestNetwork::new(8);
    net.create("M1", "x", "z");
    net.up("x", "y");
    assert!(net.transfer("M1", "x", "y").unwrap().is_accepted());

    net.down("x", "y");
    assert!(matches!(
        net.transfer("M1", "x", "y"),
        Err(AllocatorError::ContactDown { .. })
    ));

    net.up("x", "y");
    assert!(net.transfer("M1", "x", "y").unwrap().is_accepted());

    // 4 at y merged with x's 4: pool 8, split 4/4 again
    assert_eq!(net.copies("M1", "y"), 4);
    assert_eq!(net.copies("M1", "x"), 4);
    net.assert_ledger_consistent();
}

#[test]
fn test_unknown_contact_is_protocol_violation() {
    let mut net = TestNetwork::new(8);
    net.create("M1", "x", "z");

    let err = net.transfer("M1", "x", "y").unwrap_err();
    assert!(err.is_protocol_violation());
    assert_eq!(net.copies("M1", "x"), 8);
}

// ============================================================================
// Contact Chains
// ============================================================================

#[test]
fn test_spray_chain_conserves_copies() {
    let mut net = TestNetwork::new(16);
    net.create("M1", "a", "z");

    let chain = [
        ("a", "b"),
        ("a", "c"),
        ("b", "CC1"),
        ("c", "d"),
        ("CC1", "e"),
        ("d", "CC1"),
        ("CC1", "f"),
    ];

    for (from, to) in chain {
        net.up(from, to);
        let outcome = net.transfer("M1", from, to).unwrap();
        net.down(from, to);
        if outcome.is_accepted() {
            assert_eq!(net.total_copies("M1"), 16);
        }
        net.assert_ledger_consistent();
    }

    assert_eq!(net.ledger.total(), 16);
    assert!(net.copies("M1", "CC1") > net.copies("M1", "e"));
}

#[test]
fn test_delivery_detected_at_recipient() {
    let mut net = TestNetwork::new(4);
    net.create("M1", "x", "z");
    net.up("x", "z");

    let replica = net
        .transfer("M1", "x", "z")
        .unwrap()
        .into_replica()
        .unwrap();

    let delivery = net.router.delivered(&replica, &host("z"), &host("x")).unwrap();
    assert_eq!(delivery.message_id, mid("M1"));
    assert_eq!(delivery.via, host("x"));
    assert!(net.router.delivered(&replica, &host("x"), &host("z")).is_none());
}
