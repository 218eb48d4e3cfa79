//! Multicopy DTN - Contact Simulation
//!
//! Replays contact traces through the community-aware multi-copy router
//! and reports how credits spread and which messages arrive.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use multicopy_core::{HostId, MessageId};
use multicopy_dtn::MulticopyConfig;
use multicopy_simulation::{
    ContactTrace, RandomContacts, SimConfig, Simulation, World, WorldBuilder, scenarios,
};

#[derive(Parser)]
#[command(
    name = "multicopy-sim",
    about = "Contact simulation for community-aware multi-copy routing",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named scenario (even, merge, hub, floor, stale, hub-relay)
    Scenario { name: String },

    /// Run a random contact simulation
    Random {
        /// Number of ordinary hosts
        #[arg(short, long, default_value = "10")]
        ordinary: usize,

        /// Number of community-center hosts
        #[arg(long, default_value = "2")]
        hubs: usize,

        /// Number of ticks to run
        #[arg(short, long, default_value = "200")]
        ticks: u64,

        /// Initial copies per message
        #[arg(short, long, default_value = "8")]
        copies: u32,

        /// Probability an idle pair meets each tick
        #[arg(long, default_value = "0.05")]
        meet_prob: f64,

        /// Probability a live contact breaks each tick
        #[arg(long, default_value = "0.5")]
        break_prob: f64,

        /// Probability a message is created each tick
        #[arg(long, default_value = "0.1")]
        message_prob: f64,

        /// Seed for a reproducible run
        #[arg(short, long)]
        seed: Option<u64>,

        /// Write the generated trace to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Replay a JSON contact trace
    Trace {
        path: PathBuf,

        /// Print the event log after the run
        #[arg(short, long)]
        events: bool,
    },

    /// Interactive simulation mode
    Interactive {
        /// Number of ordinary hosts
        #[arg(short, long, default_value = "4")]
        ordinary: usize,

        /// Number of community-center hosts
        #[arg(long, default_value = "1")]
        hubs: usize,

        /// Initial copies per message
        #[arg(short, long, default_value = "8")]
        copies: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Scenario { name } => {
            let Some(result) = scenarios::run_named(&name) else {
                bail!(
                    "unknown scenario: {} (available: {})",
                    name,
                    scenarios::SCENARIOS.join(", ")
                );
            };
            let sim = result?;
            print_stats(&sim);
        }
        Commands::Random {
            ordinary,
            hubs,
            ticks,
            copies,
            meet_prob,
            break_prob,
            message_prob,
            seed,
            save,
        } => {
            let router = MulticopyConfig { copies }.validated()?;
            let model = RandomContacts {
                ticks,
                meet_probability: meet_prob,
                break_probability: break_prob,
                message_probability: message_prob,
                seed,
                ..Default::default()
            };

            if let Some(path) = save {
                let hosts = WorldBuilder::new().ordinary(ordinary).hubs(hubs).host_ids()?;
                let trace = model.generate(hosts, router)?;
                std::fs::write(&path, trace.to_json()?)
                    .with_context(|| format!("writing trace to {}", path.display()))?;
                println!("Trace written to {}", path.display());

                let mut sim = Simulation::from_trace(trace, SimConfig::default())?;
                sim.run()?;
                print_stats(&sim);
            } else {
                let sim = scenarios::run_random_scenario(ordinary, hubs, model, router)?;
                print_stats(&sim);
            }
        }
        Commands::Trace { path, events } => {
            let trace = ContactTrace::from_path(&path)
                .with_context(|| format!("loading trace {}", path.display()))?;
            let mut sim = Simulation::from_trace(trace, SimConfig::default())?;
            sim.run()?;

            if events {
                for event in &sim.event_log {
                    println!("{:?}", event);
                }
            }
            print_stats(&sim);
        }
        Commands::Interactive {
            ordinary,
            hubs,
            copies,
        } => {
            let world = WorldBuilder::new().ordinary(ordinary).hubs(hubs).build()?;
            run_interactive(world, MulticopyConfig { copies }.validated()?)?;
        }
    }

    Ok(())
}

fn print_stats(sim: &Simulation) {
    let stats = &sim.stats;
    println!("\n=== Statistics ===");
    println!("  {}", sim.state_summary());
    println!("  Messages created: {}", stats.messages_created);
    println!("  Transfers accepted: {}", stats.transfers_accepted);
    println!("  Rejected (stale contact): {}", stats.rejected_stale);
    println!("  Rejected (too few copies): {}", stats.rejected_insufficient);
    println!(
        "  Delivered: {}/{} ({:.1}%)",
        stats.messages_delivered,
        stats.destinations_expected,
        stats.delivery_ratio() * 100.0
    );
    if let Some(latency) = stats.average_latency() {
        println!("  Average latency: {:.1} ticks", latency);
    }
    println!("  Contacts up/down: {}/{}", stats.contacts_up, stats.contacts_down);

    let drift: Vec<_> = sim
        .ledger_report()
        .into_iter()
        .filter(|d| !d.is_consistent())
        .collect();
    if drift.is_empty() {
        println!("  Ledger: consistent");
    } else {
        for d in drift {
            println!("  Ledger drift at {}: recorded {} vs stored {}", d.host, d.recorded, d.stored);
        }
    }
}

fn run_interactive(world: World, router: MulticopyConfig) -> anyhow::Result<()> {
    use std::io::{self, Write};

    println!("{}", world.visualize());
    let mut sim = Simulation::new(world, router, SimConfig::default());
    let mut next_message = 1u64;

    println!("\nInteractive mode. Commands:");
    println!("  up <a> <b>          - Bring a contact up");
    println!("  down <a> <b>        - Take a contact down");
    println!("  create <from> <to>  - Create a message");
    println!("  offer <from> <to> <id> - Offer one replica over a contact");
    println!("  step [n]            - Advance n ticks (default 1)");
    println!("  status              - Show hosts and contacts");
    println!("  stats               - Show statistics");
    println!("  events              - Show event log");
    println!("  quit                - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match execute(&mut sim, &parts, &mut next_message) {
            Ok(true) => {
                println!("Goodbye!");
                break;
            }
            Ok(false) => {}
            Err(e) => println!("  Error: {:#}", e),
        }
    }

    Ok(())
}

/// Run one interactive command, returning true to quit
fn execute(sim: &mut Simulation, parts: &[&str], next_message: &mut u64) -> anyhow::Result<bool> {
    match parts {
        ["up", a, b] => sim.connect(&HostId::new(*a)?, &HostId::new(*b)?)?,
        ["down", a, b] => sim.disconnect(&HostId::new(*a)?, &HostId::new(*b)?)?,
        ["create", from, to] => {
            let id = MessageId::new(format!("M{}", next_message))?;
            let id = sim.create_message(id, &HostId::new(*from)?, [HostId::new(*to)?], 100)?;
            *next_message += 1;
            println!("  Created {}", id);
        }
        ["offer", from, to, id] => {
            let outcome = sim.offer(&HostId::new(*from)?, &HostId::new(*to)?, &MessageId::new(*id)?)?;
            println!("  {:?}", outcome);
        }
        ["step", rest @ ..] => {
            let n: u64 = rest.first().and_then(|s| s.parse().ok()).unwrap_or(1);
            sim.run_ticks(n)?;
            println!("  Advanced {} tick(s). {}", n, sim.state_summary());
        }
        ["status", ..] => println!("{}", sim.world.visualize()),
        ["stats", ..] => print_stats(sim),
        ["events", ..] => {
            println!("  Event log ({} events):", sim.event_log.len());
            for event in sim.event_log.iter().rev().take(20) {
                println!("    {:?}", event);
            }
            if sim.event_log.len() > 20 {
                println!("    ... ({} more)", sim.event_log.len() - 20);
            }
        }
        ["quit" | "exit" | "q", ..] => return Ok(true),
        _ => println!("  Unknown command: {}", parts.join(" ")),
    }
    Ok(false)
}
