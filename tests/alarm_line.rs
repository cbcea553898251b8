//! End-to-end scenarios for running alarm lines.
//!
//! Every test runs with tokio's clock paused, so arming delays elapse
//! instantly and deterministically once the runtime goes idle.

use alarmline::builder::{AlarmLineFactory, InstanceDto, FIELD_PORT};
use alarmline::core::{AlarmLineConfig, AlarmLineState, Cause, ContactType, StartPolicy, UnitOptions};
use alarmline::effects::{Announcement, BroadcastBus, DeliveryError, EventBus};
use alarmline::ports::{MemoryInput, PortRegistry};
use alarmline::unit::{AlarmLineUnit, UnitError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use AlarmLineState::*;

const PORT: &str = "gpio-4";

struct Rig {
    input: Arc<MemoryInput>,
    bus: Arc<BroadcastBus>,
    registry: Arc<PortRegistry>,
}

impl Rig {
    fn new(level: bool) -> Self {
        let input = Arc::new(MemoryInput::new(PORT, level));
        let registry = Arc::new(PortRegistry::new());
        registry.register(input.clone());
        Self {
            input,
            bus: Arc::new(BroadcastBus::new(64)),
            registry,
        }
    }

    fn factory(&self) -> AlarmLineFactory {
        AlarmLineFactory::new(self.registry.clone(), self.bus.clone())
    }

    fn build(&self, contact: &str, delay: &str) -> AlarmLineUnit {
        self.factory().build(&instance(contact, delay)).unwrap()
    }
}

fn instance(contact: &str, delay: &str) -> InstanceDto {
    InstanceDto::new(1)
        .with_field("name", "Front door")
        .with_field(FIELD_PORT, PORT)
        .with_field("inactiveState", contact)
        .with_field("delayTime", delay)
}

/// Collect the target states of the next `count` announcements.
async fn next_states(
    announcements: &mut broadcast::Receiver<Announcement>,
    count: usize,
) -> Vec<AlarmLineState> {
    let mut states = Vec::with_capacity(count);
    for _ in 0..count {
        let announcement = time::timeout(Duration::from_secs(600), announcements.recv())
            .await
            .expect("announcement did not arrive")
            .expect("bus closed");
        states.push(announcement.event.to);
    }
    states
}

#[tokio::test(start_paused = true)]
async fn normally_closed_line_escalates_only_after_full_delay() {
    // Raw true is the quiescent level of a normally closed contact.
    let rig = Rig::new(true);
    let mut announcements = rig.bus.subscribe();
    let unit = rig.build("NC", "5");

    unit.wait_for(Disarmed).await.unwrap();
    unit.arm().unwrap();
    unit.wait_for(Watching).await.unwrap();

    // Opened and closed again within the delay.
    rig.input.set(false);
    unit.wait_for(Prealarm).await.unwrap();
    time::sleep(Duration::from_secs(2)).await;
    rig.input.set(true);
    unit.wait_for(Watching).await.unwrap();

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(unit.state(), Watching);

    // Opened and left open.
    rig.input.set(false);
    unit.wait_for(Prealarm).await.unwrap();
    let entered = Instant::now();
    unit.wait_for(Alarm).await.unwrap();
    let elapsed = entered.elapsed();
    assert!(elapsed >= Duration::from_secs(5), "alarm after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(6), "alarm after {elapsed:?}");

    assert_eq!(
        next_states(&mut announcements, 6).await,
        vec![Disarmed, Watching, Prealarm, Watching, Prealarm, Alarm]
    );

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn short_pulse_on_normally_open_line_returns_to_watching() {
    let rig = Rig::new(false);
    let mut announcements = rig.bus.subscribe();
    let unit = rig.build("NO", "5");

    unit.arm().unwrap();
    unit.wait_for(Watching).await.unwrap();

    rig.input.set(true);
    unit.wait_for(Prealarm).await.unwrap();
    rig.input.set(false);
    unit.wait_for(Watching).await.unwrap();

    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(unit.state(), Watching);
    assert_eq!(
        next_states(&mut announcements, 4).await,
        vec![Disarmed, Watching, Prealarm, Watching]
    );

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn alarm_is_sticky_until_disarmed() {
    let rig = Rig::new(false);
    let unit = rig.build("NO", "1s");

    unit.arm().unwrap();
    unit.wait_for(Watching).await.unwrap();
    rig.input.set(true);
    unit.wait_for(Alarm).await.unwrap();

    rig.input.set(false);
    unit.arm().unwrap();
    time::sleep(Duration::from_secs(5)).await;
    assert_eq!(unit.state(), Alarm);

    unit.disarm().unwrap();
    unit.wait_for(Disarmed).await.unwrap();

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn disarm_during_prealarm_prevents_a_late_alarm() {
    let rig = Rig::new(false);
    let mut announcements = rig.bus.subscribe();
    let unit = rig.build("NO", "5");

    unit.arm().unwrap();
    rig.input.set(true);
    unit.wait_for(Prealarm).await.unwrap();

    time::sleep(Duration::from_secs(4)).await;
    unit.disarm().unwrap();
    unit.wait_for(Disarmed).await.unwrap();

    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(unit.state(), Disarmed);
    assert_eq!(
        next_states(&mut announcements, 4).await,
        vec![Disarmed, Watching, Prealarm, Disarmed]
    );
    assert!(announcements.try_recv().is_err());

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn zero_delay_passes_through_prealarm() {
    let rig = Rig::new(false);
    let mut announcements = rig.bus.subscribe();
    let unit = rig.build("NO", "0");

    unit.arm().unwrap();
    rig.input.set(true);
    unit.wait_for(Alarm).await.unwrap();

    let states = next_states(&mut announcements, 4).await;
    assert_eq!(states, vec![Disarmed, Watching, Prealarm, Alarm]);

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn arming_with_signal_already_active_waits_for_the_next_edge() {
    let rig = Rig::new(true);
    let unit = rig.build("NO", "5");

    unit.arm().unwrap();
    unit.wait_for(Watching).await.unwrap();
    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(unit.state(), Watching);

    rig.input.set(false);
    rig.input.set(true);
    unit.wait_for(Prealarm).await.unwrap();

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn start_policy_armed_begins_watching() {
    let rig = Rig::new(false);
    let options = UnitOptions {
        start_policy: StartPolicy::Armed,
        ..UnitOptions::default()
    };
    let unit = rig
        .factory()
        .with_options(options)
        .build(&instance("NO", "5"))
        .unwrap();

    unit.wait_for(Watching).await.unwrap();

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn new_delay_applies_from_the_next_countdown() {
    let rig = Rig::new(false);
    let unit = rig.build("NO", "5");

    unit.arm().unwrap();
    rig.input.set(true);
    unit.wait_for(Prealarm).await.unwrap();
    let entered = Instant::now();

    let longer = AlarmLineConfig::new(PORT).with_arming_delay(Duration::from_secs(60));
    unit.reconfigure(longer).await.unwrap();

    unit.wait_for(Alarm).await.unwrap();
    assert!(entered.elapsed() < Duration::from_secs(6));

    unit.disarm().unwrap();
    rig.input.set(false);
    unit.arm().unwrap();
    rig.input.set(true);
    unit.wait_for(Prealarm).await.unwrap();
    let entered = Instant::now();

    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(unit.state(), Prealarm);
    unit.wait_for(Alarm).await.unwrap();
    assert!(entered.elapsed() >= Duration::from_secs(60));

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn polarity_change_reinterprets_current_level() {
    let rig = Rig::new(false);
    let unit = rig.build("NO", "30");

    unit.arm().unwrap();
    unit.wait_for(Watching).await.unwrap();

    let closed = AlarmLineConfig::new(PORT)
        .with_contact_type(ContactType::NormallyClosed)
        .with_arming_delay(Duration::from_secs(30));
    unit.reconfigure(closed.clone()).await.unwrap();
    assert_eq!(unit.state(), Prealarm);

    let open = closed.with_contact_type(ContactType::NormallyOpen);
    unit.reconfigure(open).await.unwrap();
    assert_eq!(unit.state(), Watching);

    time::sleep(Duration::from_secs(60)).await;
    assert_eq!(unit.state(), Watching);

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn changing_the_input_of_a_running_line_is_rejected() {
    let rig = Rig::new(false);
    let unit = rig.build("NO", "5");

    let error = unit
        .reconfigure(AlarmLineConfig::new("gpio-9"))
        .await
        .unwrap_err();
    match error {
        UnitError::Configuration(config) => assert_eq!(config.for_field(FIELD_PORT).count(), 1),
        other => panic!("unexpected error: {other}"),
    }

    // The line keeps running on its original input.
    unit.arm().unwrap();
    rig.input.set(true);
    unit.wait_for(Prealarm).await.unwrap();

    unit.shutdown().await;
}

struct RejectingBus {
    attempts: AtomicUsize,
}

#[async_trait]
impl EventBus for RejectingBus {
    async fn deliver(&self, _announcement: &Announcement) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DeliveryError::Rejected("queue full".to_string()))
    }
}

struct StalledBus;

#[async_trait]
impl EventBus for StalledBus {
    async fn deliver(&self, _announcement: &Announcement) -> Result<(), DeliveryError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn failing_bus_does_not_hold_back_transitions() {
    let rig = Rig::new(false);
    let bus = Arc::new(RejectingBus {
        attempts: AtomicUsize::new(0),
    });
    let unit = AlarmLineFactory::new(rig.registry.clone(), bus.clone())
        .build(&instance("NO", "2"))
        .unwrap();

    unit.arm().unwrap();
    rig.input.set(true);
    unit.wait_for(Alarm).await.unwrap();

    // Deliveries run on their own task; give it a moment to catch up.
    time::sleep(Duration::from_millis(100)).await;
    assert_eq!(bus.attempts.load(Ordering::SeqCst), 4);

    unit.shutdown().await;
}

fn stalled_line(rig: &Rig, delay: &str) -> AlarmLineUnit {
    let options = UnitOptions {
        publish_timeout: Duration::from_secs(2),
        start_policy: StartPolicy::Armed,
    };
    AlarmLineFactory::new(rig.registry.clone(), Arc::new(StalledBus))
        .with_options(options)
        .build(&instance("NO", delay))
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn stalled_bus_does_not_stretch_the_arming_delay() {
    let rig = Rig::new(false);
    let unit = stalled_line(&rig, "60");
    unit.wait_for(Watching).await.unwrap();

    // Contact chatter: every edge is a transition the bus never takes.
    let mut level = false;
    for _ in 0..20 {
        level = !level;
        rig.input.set(level);
        time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(unit.state(), Watching);

    let opened = Instant::now();
    rig.input.set(true);
    unit.wait_for(Prealarm).await.unwrap();
    assert!(opened.elapsed() < Duration::from_secs(1));

    unit.wait_for(Alarm).await.unwrap();
    let elapsed = opened.elapsed();
    assert!(elapsed >= Duration::from_secs(60), "alarm after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(61), "alarm after {elapsed:?}");

    unit.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_does_not_wait_on_a_stalled_bus() {
    let rig = Rig::new(false);
    let unit = stalled_line(&rig, "5");
    unit.wait_for(Watching).await.unwrap();
    rig.input.set(true);
    unit.wait_for(Prealarm).await.unwrap();

    let started = Instant::now();
    unit.shutdown().await;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(rig.input.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_releases_the_input() {
    let rig = Rig::new(false);
    let unit = rig.factory().build_automation_unit(&instance("NO", "5")).unwrap();
    assert_eq!(rig.input.listener_count(), 1);

    unit.shutdown().await;
    assert_eq!(rig.input.listener_count(), 0);

    // Edges after shutdown reach nobody.
    rig.input.set(true);
}

#[tokio::test(start_paused = true)]
async fn state_watch_reports_stop() {
    let rig = Rig::new(false);
    let unit = rig.build("NO", "5");
    unit.wait_for(Disarmed).await.unwrap();
    let mut states = unit.watch_state();
    assert_eq!(*states.borrow_and_update(), Disarmed);

    drop(unit);
    assert!(states.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn announcements_carry_line_identity_and_cause() {
    let rig = Rig::new(false);
    let mut announcements = rig.bus.subscribe();
    let unit = rig.build("NO", "1");

    unit.arm().unwrap();
    rig.input.set(true);
    unit.wait_for(Alarm).await.unwrap();

    let mut causes = Vec::new();
    for _ in 0..4 {
        let announcement = announcements.recv().await.unwrap();
        assert_eq!(announcement.instance_id, 1);
        assert_eq!(announcement.line_name, "Front door");
        causes.push(announcement.event.cause);
    }
    assert_eq!(
        causes,
        vec![Cause::Disarmed, Cause::Armed, Cause::SignalActive, Cause::DelayElapsed]
    );

    unit.shutdown().await;
}
