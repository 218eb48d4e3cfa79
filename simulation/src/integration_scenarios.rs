//! Integration scenarios exercising the full stack
//!
//! These scenarios run the forwarding engine end to end:
//! - multicopy-core types (HostId, Message, MemoryStore, events)
//! - multicopy-dtn (MulticopyRouter, ContactTable, CapacityLedger)
//! - contact traces and the random contact model

use multicopy_core::{HostId, MessageId, MessageStore, NetworkEvent, RejectReason};
use multicopy_dtn::MulticopyConfig;

use crate::scenarios::{self, SCENARIOS};
use crate::simulation::{SimConfig, Simulation};
use crate::trace::{ContactTrace, RandomContacts};

fn host(name: &str) -> HostId {
    HostId::new(name).unwrap()
}

fn mid(id: &str) -> MessageId {
    MessageId::new(id).unwrap()
}

fn replay(json: &str) -> Simulation {
    let trace = ContactTrace::from_json(json).unwrap();
    let mut sim = Simulation::from_trace(trace, SimConfig::default()).unwrap();
    sim.run().unwrap();
    sim
}

/// Every named scenario runs and leaves the ledger consistent
#[test]
fn test_named_scenarios_keep_ledger_consistent() {
    for name in SCENARIOS {
        let sim = scenarios::run_named(name).unwrap().unwrap();
        assert!(sim.world.is_ledger_consistent(), "scenario {}", name);
    }
    assert!(scenarios::run_named("nonexistent").is_none());
}

#[test]
fn test_even_split_scenario() {
    let sim = scenarios::run_even_split_scenario().unwrap();
    assert_eq!(sim.world.copies_of(&host("X"), &mid("M1")), 1);
    assert_eq!(sim.world.copies_of(&host("Y"), &mid("M1")), 1);
}

#[test]
fn test_merge_scenario() {
    let sim = scenarios::run_merge_scenario().unwrap();
    assert_eq!(sim.world.copies_of(&host("X"), &mid("M1")), 4);
    assert_eq!(sim.world.copies_of(&host("Y"), &mid("M1")), 4);
    assert_eq!(sim.world.ledger.capacity(&host("Y")), 4);
}

#[test]
fn test_hub_absorb_scenario() {
    let sim = scenarios::run_hub_absorb_scenario().unwrap();
    assert_eq!(sim.world.copies_of(&host("CC1"), &mid("M1")), 3);
    assert_eq!(sim.world.copies_of(&host("X"), &mid("M1")), 1);
}

#[test]
fn test_copy_floor_scenario() {
    let sim = scenarios::run_copy_floor_scenario().unwrap();
    assert_eq!(sim.stats.rejected_insufficient, 1);
    assert_eq!(sim.stats.transfers_accepted, 0);
    assert_eq!(sim.world.copies_of(&host("X"), &mid("M1")), 1);
    assert_eq!(sim.world.ledger.capacity(&host("Y")), 0);
}

#[test]
fn test_stale_contact_scenario() {
    let sim = scenarios::run_stale_contact_scenario().unwrap();
    assert_eq!(sim.stats.transfers_accepted, 2);
    assert_eq!(sim.stats.rejected_stale, 1);

    let rejected: Vec<_> = sim
        .events_for(&mid("M2"))
        .filter_map(|e| match e {
            NetworkEvent::Rejected { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(rejected, vec![RejectReason::Stale]);
    assert_eq!(sim.world.copies_of(&host("Y"), &mid("M2")), 4);
}

#[test]
fn test_hub_relay_scenario() {
    let sim = scenarios::run_hub_relay_scenario().unwrap();
    let id = mid("M1");

    assert_eq!(sim.stats.messages_delivered, 1);
    for roamer in ["n1", "n2", "n3", "n4"] {
        assert_eq!(sim.world.copies_of(&host(roamer), &id), 1, "{}", roamer);
    }
    assert_eq!(sim.world.copies_of(&host("CC1"), &id), 4);
    assert_eq!(sim.world.total_copies(&id), 8);
}

/// Replay a trace through a hub and check timing and credit flow
#[test]
fn test_trace_replay_through_hub() {
    let sim = replay(
        r#"{
            "router": { "copies": 8 },
            "hosts": ["n1", "n2", "n3", "CC1"],
            "ticks": 6,
            "events": [
                { "tick": 0, "kind": "create", "id": "M1", "from": "n1", "to": ["n3"], "size": 100 },
                { "tick": 1, "kind": "up", "a": "n1", "b": "CC1" },
                { "tick": 2, "kind": "down", "a": "n1", "b": "CC1" },
                { "tick": 3, "kind": "up", "a": "CC1", "b": "n2" },
                { "tick": 4, "kind": "up", "a": "CC1", "b": "n3" }
            ]
        }"#,
    );
    let id = mid("M1");

    assert_eq!(sim.tick, 6);
    assert_eq!(sim.stats.transfers_accepted, 3);
    assert_eq!(sim.stats.messages_delivered, 1);
    assert_eq!(sim.stats.total_delivery_latency, 4);
    assert_eq!(sim.world.copies_of(&host("CC1"), &id), 5);
    assert_eq!(sim.world.copies_of(&host("n3"), &id), 1);
    assert!(sim.world.is_ledger_consistent());

    let delivered = sim
        .events_for(&id)
        .find(|e| matches!(e, NetworkEvent::Delivered { .. }))
        .unwrap();
    assert_eq!(delivered.tick(), 4);
}

/// Multicast messages count one delivery per destination
#[test]
fn test_multicast_trace() {
    let sim = replay(
        r#"{
            "router": { "copies": 4 },
            "hosts": ["n1", "n2", "n3"],
            "ticks": 3,
            "events": [
                { "tick": 0, "kind": "create", "id": "M1", "from": "n1", "to": ["n2", "n3"] },
                { "tick": 1, "kind": "up", "a": "n1", "b": "n2" },
                { "tick": 1, "kind": "up", "a": "n1", "b": "n3" }
            ]
        }"#,
    );

    assert_eq!(sim.stats.destinations_expected, 2);
    assert_eq!(sim.stats.messages_delivered, 2);
    assert_eq!(sim.stats.delivery_ratio(), 1.0);
    assert_eq!(sim.world.copies_of(&host("n2"), &mid("M1")), 2);
    assert_eq!(sim.world.copies_of(&host("n3"), &mid("M1")), 1);
    assert_eq!(sim.world.copies_of(&host("n1"), &mid("M1")), 1);
}

/// Long random runs conserve credits and keep every ledger entry exact
#[test]
fn test_random_run_conserves_credits() {
    let model = RandomContacts {
        ticks: 300,
        seed: Some(42),
        ..Default::default()
    };
    let sim = scenarios::run_random_scenario(8, 2, model, MulticopyConfig { copies: 8 }).unwrap();

    assert!(sim.stats.messages_created > 0);
    assert!(sim.stats.messages_delivered <= sim.stats.destinations_expected);
    assert_eq!(sim.world.ledger.total(), 8 * sim.stats.messages_created);
    assert!(sim.world.is_ledger_consistent());

    for event in &sim.event_log {
        if let NetworkEvent::MessageCreated { message_id, .. } = event {
            assert_eq!(sim.world.total_copies(message_id), 8);
        }
    }
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run = || {
        let model = RandomContacts {
            ticks: 100,
            seed: Some(7),
            ..Default::default()
        };
        scenarios::run_random_scenario(5, 1, model, MulticopyConfig::default()).unwrap()
    };

    let (first, second) = (run(), run());
    assert_eq!(first.event_log, second.event_log);
    assert_eq!(first.stats.transfers_accepted, second.stats.transfers_accepted);
}

/// Requested response sizes survive trace replay and forwarding
#[test]
fn test_trace_response_size_reaches_recipient() {
    let sim = replay(
        r#"{
            "router": { "copies": 4 },
            "hosts": ["n1", "n2"],
            "ticks": 2,
            "events": [
                { "tick": 0, "kind": "create", "id": "M1", "from": "n1", "to": ["n2"], "size": 100, "response_size": 50 },
                { "tick": 1, "kind": "up", "a": "n1", "b": "n2" }
            ]
        }"#,
    );

    let replica = sim.world.host(&host("n2")).unwrap().store.get(&mid("M1")).unwrap();
    assert_eq!(replica.response_size, 50);
    assert_eq!(replica.size, 100);
    assert_eq!(sim.stats.messages_delivered, 1);
}
