//! Pre-defined simulation scenarios
//!
//! The canonical two-host split cases plus longer runs through hubs and
//! random contact traces.

use tracing::info;

use multicopy_core::{HostId, Message, MessageId, MessageStore};
use multicopy_dtn::{MulticopyConfig, ReceiveOutcome};

use crate::error::SimResult;
use crate::simulation::{SimConfig, Simulation};
use crate::trace::RandomContacts;
use crate::world::{World, WorldBuilder};

/// Names accepted by [`run_named`]
pub const SCENARIOS: &[&str] = &["even", "merge", "hub", "floor", "stale", "hub-relay"];

fn host(name: &str) -> SimResult<HostId> {
    Ok(HostId::new(name)?)
}

fn manual(hosts: &[&str], copies: u32) -> SimResult<Simulation> {
    let hosts = hosts.iter().map(|h| host(h)).collect::<SimResult<Vec<_>>>()?;
    Ok(Simulation::new(
        World::with_hosts(hosts),
        MulticopyConfig { copies },
        SimConfig {
            trace_routing: true,
            ..Default::default()
        },
    ))
}

/// Place a replica with `copies` credits at `at`, crediting its capacity
fn seed(sim: &mut Simulation, id: &MessageId, at: &HostId, to: &HostId, copies: u32) -> SimResult<()> {
    let message = Message::new(id.clone(), at.clone(), [to.clone()], 100, sim.tick)?.with_copies(copies);
    sim.world.ledger.add_capacity(at, copies);
    sim.world.host_mut(at)?.store.put(message);
    Ok(())
}

fn report(sim: &Simulation, id: &MessageId, hosts: &[&HostId]) {
    for h in hosts {
        println!(
            "  {}: {} copies, ccap={}",
            h,
            sim.world.copies_of(h, id),
            sim.world.ledger.capacity(h)
        );
    }
}

fn offer_and_report(
    sim: &mut Simulation,
    id: &MessageId,
    from: &HostId,
    to: &HostId,
) -> SimResult<ReceiveOutcome> {
    let outcome = sim.offer(from, to, id)?;
    match &outcome {
        ReceiveOutcome::Accepted { replica } => println!(
            "  {} received by {} from {} with {} copies, {} still has {}",
            id,
            to,
            from,
            replica.copies(),
            from,
            sim.world.copies_of(from, id)
        ),
        ReceiveOutcome::Rejected { reason } => {
            println!("  {} from {} to {} rejected: {}", id, from, to, reason)
        }
    }
    Ok(outcome)
}

/// Two ordinary hosts split a fresh message
///
/// ```text
/// X holds M1 with 2 copies, Y holds nothing
/// X meets Y: Y gets 1, X keeps 1
/// ```
pub fn run_even_split_scenario() -> SimResult<Simulation> {
    info!("=== Running Even Split Scenario ===");
    let mut sim = manual(&["X", "Y", "Z"], 2)?;
    let (x, y, z) = (host("X")?, host("Y")?, host("Z")?);

    let id = sim.create_message(MessageId::new("M1")?, &x, [z], 100)?;
    sim.connect(&x, &y)?;
    offer_and_report(&mut sim, &id, &x, &y)?;
    report(&sim, &id, &[&x, &y]);
    Ok(sim)
}

/// The receiver already holds a replica and merges it into the pool
///
/// ```text
/// X holds 5, Y holds 3: pool 8, both end with 4
/// ```
pub fn run_merge_scenario() -> SimResult<Simulation> {
    info!("=== Running Merge Scenario ===");
    let mut sim = manual(&["X", "Y", "Z"], 8)?;
    let (x, y, z) = (host("X")?, host("Y")?, host("Z")?);
    let id = MessageId::new("M1")?;

    seed(&mut sim, &id, &x, &z, 5)?;
    seed(&mut sim, &id, &y, &z, 3)?;
    sim.connect(&x, &y)?;
    offer_and_report(&mut sim, &id, &x, &y)?;
    report(&sim, &id, &[&x, &y]);
    Ok(sim)
}

/// An ordinary host meets a community center
///
/// ```text
/// X holds 4, hub CC1 holds nothing: CC1 gets 3, X keeps 1
/// ```
pub fn run_hub_absorb_scenario() -> SimResult<Simulation> {
    info!("=== Running Hub Absorb Scenario ===");
    let mut sim = manual(&["X", "CC1", "Z"], 4)?;
    let (x, hub, z) = (host("X")?, host("CC1")?, host("Z")?);

    let id = sim.create_message(MessageId::new("M1")?, &x, [z], 100)?;
    sim.connect(&x, &hub)?;
    offer_and_report(&mut sim, &id, &x, &hub)?;
    report(&sim, &id, &[&x, &hub]);
    Ok(sim)
}

/// A single copy cannot be split
pub fn run_copy_floor_scenario() -> SimResult<Simulation> {
    info!("=== Running Copy Floor Scenario ===");
    let mut sim = manual(&["X", "Y", "Z"], 8)?;
    let (x, y, z) = (host("X")?, host("Y")?, host("Z")?);
    let id = MessageId::new("M1")?;

    seed(&mut sim, &id, &x, &z, 1)?;
    sim.connect(&x, &y)?;
    offer_and_report(&mut sim, &id, &x, &y)?;
    report(&sim, &id, &[&x, &y]);
    Ok(sim)
}

/// A contact services one transfer until it changes state
///
/// ```text
/// X meets Y and hands over M1
/// X offers M2 on the same contact: rejected as stale
/// The contact drops and comes back: M2 goes through
/// ```
pub fn run_stale_contact_scenario() -> SimResult<Simulation> {
    info!("=== Running Stale Contact Scenario ===");
    let mut sim = manual(&["X", "Y", "Z"], 8)?;
    let (x, y, z) = (host("X")?, host("Y")?, host("Z")?);

    let m1 = sim.create_message(MessageId::new("M1")?, &x, [z.clone()], 100)?;
    let m2 = sim.create_message(MessageId::new("M2")?, &x, [z], 100)?;
    sim.connect(&x, &y)?;

    println!("\n--- First transfer on a fresh contact ---");
    offer_and_report(&mut sim, &m1, &x, &y)?;
    println!("\n--- Second transfer on the same contact ---");
    offer_and_report(&mut sim, &m2, &x, &y)?;

    println!("\n--- Contact drops and comes back ---");
    sim.disconnect(&x, &y)?;
    sim.connect(&x, &y)?;
    offer_and_report(&mut sim, &m2, &x, &y)?;
    report(&sim, &m2, &[&x, &y]);
    Ok(sim)
}

/// A hub collects copies from a roaming source and hands one to each
/// host it meets, eventually reaching the destination
pub fn run_hub_relay_scenario() -> SimResult<Simulation> {
    info!("=== Running Hub Relay Scenario ===");
    let world = WorldBuilder::new().ordinary(4).hubs(1).build()?;
    println!("{}", world.visualize());

    let mut sim = Simulation::new(world, MulticopyConfig { copies: 8 }, SimConfig::default());
    let (n1, n2, n3, n4, hub) = (host("n1")?, host("n2")?, host("n3")?, host("n4")?, host("CC1")?);
    let id = sim.create_message(MessageId::new("M1")?, &n1, [n4.clone()], 100)?;

    let legs = [(&n1, &hub), (&hub, &n2), (&hub, &n3), (&hub, &n4)];
    for (i, (a, b)) in legs.into_iter().enumerate() {
        println!("\n--- Step {}: {} meets {} ---", i + 1, a, b);
        sim.connect(a, b)?;
        sim.step()?;
        sim.disconnect(a, b)?;
        println!("  {}", sim.state_summary());
    }

    println!();
    report(&sim, &id, &[&n1, &n2, &n3, &n4, &hub]);
    Ok(sim)
}

/// Random contacts between ordinary hosts and hubs
pub fn run_random_scenario(
    ordinary: usize,
    hubs: usize,
    model: RandomContacts,
    router: MulticopyConfig,
) -> SimResult<Simulation> {
    info!("=== Running Random Contact Scenario ===");
    let hosts = WorldBuilder::new().ordinary(ordinary).hubs(hubs).host_ids()?;
    let trace = model.generate(hosts, router)?;
    let mut sim = Simulation::from_trace(
        trace,
        SimConfig {
            trace_routing: false,
            ..Default::default()
        },
    )?;
    sim.run()?;
    Ok(sim)
}

/// Run a scenario by name
pub fn run_named(name: &str) -> Option<SimResult<Simulation>> {
    let result = match name {
        "even" => run_even_split_scenario(),
        "merge" => run_merge_scenario(),
        "hub" => run_hub_absorb_scenario(),
        "floor" => run_copy_floor_scenario(),
        "stale" => run_stale_contact_scenario(),
        "hub-relay" => run_hub_relay_scenario(),
        _ => return None,
    };
    Some(result)
}
