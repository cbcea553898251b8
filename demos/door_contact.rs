//! Door Contact Alarm Line
//!
//! This example drives one alarm line with a simulated door contact.
//!
//! Key concepts:
//! - Building a line from stored instance fields
//! - Contact polarity (a normally closed reed switch)
//! - Arming delay: a short opening is forgiven, a long one raises the alarm
//! - Subscribing to announcements on the event bus
//!
//! Run with: cargo run --example door_contact
//! Set ALARMLINE_LOG=debug to see every step of the worker.

use alarmline::builder::{AlarmLineFactory, InstanceDto};
use alarmline::core::AlarmLineState;
use alarmline::effects::BroadcastBus;
use alarmline::ports::{MemoryInput, PortRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env("ALARMLINE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Door Contact Alarm Line ===\n");

    // A closed door holds a normally closed contact at raw `true`.
    let door = Arc::new(MemoryInput::new("gpio-17", true));
    let registry = Arc::new(PortRegistry::new());
    registry.register(door.clone());

    let bus = Arc::new(BroadcastBus::new(32));
    let mut announcements = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(announcement) = announcements.recv().await {
            println!(
                "  [{}] {} -> {} ({:?})",
                announcement.line_name,
                announcement.event.from,
                announcement.event.to,
                announcement.event.cause
            );
        }
    });

    let factory = AlarmLineFactory::new(registry, bus);
    let instance = InstanceDto::new(1)
        .with_field("name", "Front door")
        .with_field("portId", "gpio-17")
        .with_field("inactiveState", "NC")
        .with_field("delayTime", "2s");
    let line = factory.build(&instance)?;

    line.wait_for(AlarmLineState::Disarmed).await?;
    println!("Arming the line");
    line.arm()?;
    line.wait_for(AlarmLineState::Watching).await?;

    println!("\nDoor opened briefly (resident walking in)");
    door.set(false);
    tokio::time::sleep(Duration::from_millis(800)).await;
    door.set(true);
    line.wait_for(AlarmLineState::Watching).await?;

    println!("\nDoor opened and left open (intruder)");
    door.set(false);
    line.wait_for(AlarmLineState::Alarm).await?;

    println!("\nClosing the door does not clear the alarm");
    door.set(true);
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("  state: {}", line.state());

    println!("\nDisarming");
    line.disarm()?;
    line.wait_for(AlarmLineState::Disarmed).await?;

    line.shutdown().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("\n=== Done ===");
    Ok(())
}
