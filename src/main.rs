use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use traffic_control::control::{
    Controller, DemoIncidentFeed, IntersectionId, Network, NetworkSnapshot, Phase, Scheduler,
};

#[derive(Parser)]
#[command(name = "traffic_control")]
#[command(about = "Simulated traffic-network control core")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "120")]
    ticks: u64,

    /// Wall-clock milliseconds per tick (0 runs as fast as possible)
    #[arg(long, default_value = "0")]
    tick_millis: u64,

    /// Run the traffic model every N signal ticks
    #[arg(long, default_value = "5")]
    traffic_every: u64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Disable the randomized demo incident feed
    #[arg(long)]
    no_demo_feed: bool,

    /// Exercise the command surface with a scripted scenario
    #[arg(long)]
    scenario: bool,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Ticks between state summaries (0 disables)
    #[arg(long, default_value = "30")]
    summary_every: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let mut network = match cli.seed {
        Some(seed) => Network::create_demo_network_with_seed(seed),
        None => Network::create_demo_network(),
    };
    if !cli.no_demo_feed {
        let feed = match cli.seed {
            Some(seed) => DemoIncidentFeed::with_seed(seed),
            None => DemoIncidentFeed::new(),
        };
        network.set_incident_source(Box::new(feed));
    }
    let controller = Controller::new(network, Scheduler::new(cli.traffic_every));

    println!("Running traffic control core in headless mode...");
    println!(
        "Ticks: {}, traffic model every {} ticks",
        cli.ticks, cli.traffic_every
    );
    println!();
    print_summary(&controller.snapshot());

    for tick in 1..=cli.ticks {
        controller.tick(1);
        if cli.scenario {
            run_scenario_step(&controller, tick);
        }
        if cli.summary_every > 0 && tick % cli.summary_every == 0 {
            println!("--- After tick {tick} ---");
            print_summary(&controller.snapshot());
        }
        if cli.tick_millis > 0 {
            thread::sleep(Duration::from_millis(cli.tick_millis));
        }
    }

    println!("=== Final State ===");
    let snapshot = controller.snapshot();
    print_summary(&snapshot);

    if cli.json {
        let body =
            serde_json::to_string_pretty(&*snapshot).context("failed to serialize snapshot")?;
        println!("{body}");
    }
    Ok(())
}

/// Scripted command sequence demonstrating the coordination protocols
fn run_scenario_step(controller: &Controller, tick: u64) {
    match tick {
        10 => report(
            "manual light change",
            controller.set_light(IntersectionId(1), Phase::Red, 20),
        ),
        20 => {
            controller.activate_emergency();
            println!("[scenario] emergency override activated");
        }
        // Expected to be rejected: only Red is allowed during the override.
        25 => report(
            "light change during override",
            controller.set_light(IntersectionId(3), Phase::Green, 15),
        ),
        35 => {
            controller.deactivate_emergency();
            println!("[scenario] emergency override lifted");
        }
        50 => match controller.create_green_corridor(&[
            IntersectionId(2),
            IntersectionId(1),
            IntersectionId(5),
        ]) {
            Ok(id) => println!("[scenario] green corridor {id:?} activated"),
            Err(err) => println!("[scenario] corridor rejected: {err}"),
        },
        90 => {
            controller.deactivate_green_corridor();
            println!("[scenario] green corridor released");
        }
        _ => {}
    }
}

fn report(what: &str, result: Result<(), traffic_control::control::CommandError>) {
    match result {
        Ok(()) => println!("[scenario] {what}: ok"),
        Err(err) => println!("[scenario] {what}: {err}"),
    }
}

/// Print a summary of the network state
fn print_summary(snapshot: &NetworkSnapshot) {
    println!("=== Traffic Network Summary ===");
    println!("Tick: {}  Revision: {}", snapshot.time, snapshot.revision);
    println!(
        "Emergency override: {}",
        if snapshot.emergency_active {
            "ACTIVE"
        } else {
            "inactive"
        }
    );
    if let Some(corridor) = &snapshot.corridor {
        let path: Vec<String> = corridor
            .intersections()
            .iter()
            .map(|id| id.to_string())
            .collect();
        println!(
            "Green corridor: {} (since tick {})",
            path.join(" -> "),
            corridor.activated_at
        );
    }

    println!("--- Intersections ---");
    for intersection in &snapshot.intersections {
        println!(
            "  {} {}: {} {}s, {} vehicles, {} congestion, wait {}{}",
            intersection.id,
            intersection.name,
            intersection.phase,
            intersection.phase_remaining,
            intersection.vehicle_count,
            intersection.congestion,
            intersection.waiting_estimate,
            if intersection.override_active {
                " [held]"
            } else {
                ""
            }
        );
    }

    if !snapshot.alerts.is_empty() {
        println!("--- Active Alerts ---");
        for alert in &snapshot.alerts {
            println!("  [{}] {}", alert.severity, alert.message);
        }
    }
    println!("Events logged: {}", snapshot.events.len());
    println!();
}
