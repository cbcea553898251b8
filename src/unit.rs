//! Running alarm line units.
//!
//! Each unit owns one worker task. Raw edges, arm/disarm requests, timer
//! expiries and reconfiguration all reach the worker through one command
//! channel, so they are applied strictly in arrival order and never
//! concurrently. The worker commits a transition first and then enqueues
//! it for a separate delivery task, so a slow bus never holds back the
//! machine.

use crate::builder::{ConfigurationError, FieldError, FIELD_PORT};
use crate::core::{
    AlarmLineConfig, AlarmLineState, InputEvent, Signal, StartPolicy, State, StateDescriptor,
    StateId, UnitOptions,
};
use crate::effects::{Announcement, AnnouncementQueue, EventBus, TokioTimer, TransitionPublisher};
use crate::machine::AlarmStateMachine;
use crate::ports::{BinaryInput, ListenerId};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, trace, warn, Instrument};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("alarm line {instance_id} is no longer running")]
    Stopped { instance_id: u64 },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

enum Command {
    Raw(bool),
    Arm,
    Disarm,
    Expired(u64),
    Reconfigure(
        AlarmLineConfig,
        oneshot::Sender<Result<(), ConfigurationError>>,
    ),
}

/// Handle to a running alarm line.
///
/// Dropping the handle tears the line down; [`shutdown`](Self::shutdown)
/// does the same and waits for the worker to finish.
pub struct AlarmLineUnit {
    instance_id: u64,
    name: String,
    states: Vec<StateDescriptor>,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<AlarmLineState>,
    input: Arc<dyn BinaryInput>,
    listener: Option<ListenerId>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl AlarmLineUnit {
    /// Start a line on `input`.
    ///
    /// The unit begins in [`AlarmLineState::Init`] and immediately moves to
    /// `Disarmed` or `Watching` according to `options.start_policy`. Must
    /// be called from within a tokio runtime.
    pub fn spawn(
        bus: Arc<dyn EventBus>,
        instance_id: u64,
        name: impl Into<String>,
        states: Vec<StateDescriptor>,
        input: Arc<dyn BinaryInput>,
        config: AlarmLineConfig,
        options: UnitOptions,
    ) -> Self {
        let name = name.into();
        let (commands, receiver) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AlarmLineState::Init);

        // Subscribe before sampling so no edge falls between the two.
        let raw_tx = commands.clone();
        let listener = input.subscribe(Box::new(move |level| {
            let _ = raw_tx.send(Command::Raw(level));
        }));

        let expiry_tx = commands.clone();
        let timer = TokioTimer::new(move |generation| {
            let _ = expiry_tx.send(Command::Expired(generation));
        });

        let span = info_span!("alarm_line", instance_id, name = %name);
        let (announcements, _delivery) = span.in_scope(|| {
            TransitionPublisher::new(bus, options.publish_timeout).spawn()
        });

        let worker = Worker {
            instance_id,
            name: name.clone(),
            machine: AlarmStateMachine::new(config.arming_delay, timer),
            raw: input.value(),
            config,
            announcements,
            state: state_tx,
        };

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            worker
                .run(receiver, options.start_policy, cancel.clone())
                .instrument(span),
        );

        Self {
            instance_id,
            name,
            states,
            commands,
            state: state_rx,
            input,
            listener: Some(listener),
            cancel,
            worker: Some(handle),
        }
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &[StateDescriptor] {
        &self.states
    }

    /// Current state as last committed by the worker.
    pub fn state(&self) -> AlarmLineState {
        *self.state.borrow()
    }

    /// Receiver that observes every committed state.
    pub fn watch_state(&self) -> watch::Receiver<AlarmLineState> {
        self.state.clone()
    }

    /// Wait until the line is in `target`.
    pub async fn wait_for(&self, target: AlarmLineState) -> Result<AlarmLineState, UnitError> {
        let mut receiver = self.state.clone();
        let reached = receiver
            .wait_for(|state| *state == target)
            .await
            .map(|state| *state);
        reached.map_err(|_| self.stopped())
    }

    pub fn arm(&self) -> Result<(), UnitError> {
        self.send(Command::Arm)
    }

    pub fn disarm(&self) -> Result<(), UnitError> {
        self.send(Command::Disarm)
    }

    /// Replace the line's configuration.
    ///
    /// A new contact type re-interprets the current raw level at once. A
    /// new arming delay applies from the next time the delay starts. The
    /// input source cannot change on a running line.
    pub async fn reconfigure(&self, config: AlarmLineConfig) -> Result<(), UnitError> {
        let (reply, outcome) = oneshot::channel();
        self.send(Command::Reconfigure(config, reply))?;
        outcome.await.map_err(|_| self.stopped())??;
        Ok(())
    }

    /// Tear the line down and wait for its worker to exit.
    ///
    /// Announcements already enqueued are still delivered afterwards, each
    /// bounded by the publish timeout; this call does not wait for them.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }

    fn send(&self, command: Command) -> Result<(), UnitError> {
        self.commands.send(command).map_err(|_| self.stopped())
    }

    fn stopped(&self) -> UnitError {
        UnitError::Stopped {
            instance_id: self.instance_id,
        }
    }

    fn stop(&mut self) {
        if let Some(listener) = self.listener.take() {
            self.input.unsubscribe(listener);
        }
        self.cancel.cancel();
    }
}

impl Drop for AlarmLineUnit {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A running automation unit, tagged by device kind.
pub enum AutomationUnit {
    AlarmLine(AlarmLineUnit),
}

impl AutomationUnit {
    pub fn current_state(&self) -> StateId {
        match self {
            Self::AlarmLine(unit) => unit.state().id(),
        }
    }

    pub fn instance_id(&self) -> u64 {
        match self {
            Self::AlarmLine(unit) => unit.instance_id(),
        }
    }

    pub fn states(&self) -> &[StateDescriptor] {
        match self {
            Self::AlarmLine(unit) => unit.states(),
        }
    }

    pub async fn shutdown(self) {
        match self {
            Self::AlarmLine(unit) => unit.shutdown().await,
        }
    }
}

impl From<AlarmLineUnit> for AutomationUnit {
    fn from(unit: AlarmLineUnit) -> Self {
        Self::AlarmLine(unit)
    }
}

struct Worker {
    instance_id: u64,
    name: String,
    machine: AlarmStateMachine<TokioTimer>,
    config: AlarmLineConfig,
    raw: bool,
    announcements: AnnouncementQueue,
    state: watch::Sender<AlarmLineState>,
}

impl Worker {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        start_policy: StartPolicy,
        cancel: CancellationToken,
    ) {
        info!(
            port = %self.config.source_input_id,
            contact = %self.config.contact_type,
            delay = ?self.config.arming_delay,
            policy = ?start_policy,
            "Alarm line started"
        );

        let start = match start_policy {
            StartPolicy::Armed => InputEvent::Armed,
            StartPolicy::Disarmed => InputEvent::Disarmed,
        };
        self.apply(start);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }

        self.machine.teardown();
        info!(state = %self.machine.current_state(), "Alarm line stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Raw(level) => self.on_raw(level),
            Command::Arm => self.apply(InputEvent::Armed),
            Command::Disarm => self.apply(InputEvent::Disarmed),
            Command::Expired(generation) => {
                self.apply(InputEvent::TimerExpired { generation });
            }
            Command::Reconfigure(config, reply) => {
                let outcome = self.reconfigure(config);
                let _ = reply.send(outcome);
            }
        }
    }

    fn signal(&self) -> Signal {
        self.config.contact_type.normalize(self.raw)
    }

    fn on_raw(&mut self, level: bool) {
        let before = self.signal();
        self.raw = level;
        let after = self.signal();

        if before == after {
            trace!(level, "Raw level unchanged after normalization");
            return;
        }
        self.apply(after.into());
    }

    fn reconfigure(&mut self, config: AlarmLineConfig) -> Result<(), ConfigurationError> {
        if config.source_input_id != self.config.source_input_id {
            warn!(
                current = %self.config.source_input_id,
                requested = %config.source_input_id,
                "Rejected input change on running line"
            );
            return Err(FieldError::new(
                FIELD_PORT,
                "cannot change on a running line; rebuild the unit instead",
            )
            .into());
        }

        let before = self.signal();
        self.machine.set_arming_delay(config.arming_delay);
        self.config = config;
        let after = self.signal();

        info!(
            contact = %self.config.contact_type,
            delay = ?self.config.arming_delay,
            "Alarm line reconfigured"
        );

        if before != after {
            self.apply(after.into());
        }
        Ok(())
    }

    fn apply(&mut self, input: InputEvent) {
        let Some(event) = self.machine.handle_event(input) else {
            return;
        };

        self.state.send_replace(event.to);

        let announcement = Announcement {
            instance_id: self.instance_id,
            line_name: self.name.clone(),
            event,
        };
        if let Err(error) = self.announcements.enqueue(announcement) {
            warn!(%error, "Transition not announced");
        }
    }
}
