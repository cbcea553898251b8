//! Outward notification of committed transitions.
//!
//! Publishing happens after the machine has committed a transition.
//! Delivery is best-effort and runs on its own task: the machine only
//! enqueues. A slow or failing bus is bounded by a timeout per delivery,
//! logged, and never reaches back into the machine.

use crate::core::{AlarmLineState, TransitionEvent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn, Instrument};

/// Errors a bus may report for a single delivery
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("delivery did not complete within {0:?}")]
    Timeout(Duration),

    #[error("bus rejected announcement: {0}")]
    Rejected(String),

    #[error("bus is closed")]
    Closed,
}

/// A transition tagged with the line that made it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub instance_id: u64,
    pub line_name: String,
    pub event: TransitionEvent<AlarmLineState>,
}

/// The host's notification bus.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn deliver(&self, announcement: &Announcement) -> Result<(), DeliveryError>;
}

/// Hands announcements to a bus without letting it stall the caller for
/// longer than `timeout`.
#[derive(Clone)]
pub struct TransitionPublisher {
    bus: Arc<dyn EventBus>,
    timeout: Duration,
}

impl TransitionPublisher {
    pub fn new(bus: Arc<dyn EventBus>, timeout: Duration) -> Self {
        Self { bus, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deliver one announcement.
    ///
    /// The outcome is logged here; callers may ignore the returned result.
    pub async fn publish(&self, announcement: Announcement) -> Result<(), DeliveryError> {
        let outcome =
            match tokio::time::timeout(self.timeout, self.bus.deliver(&announcement)).await {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::Timeout(self.timeout)),
            };

        match &outcome {
            Ok(()) => debug!(
                instance_id = announcement.instance_id,
                event_id = %announcement.event.id,
                to = %announcement.event.to,
                "Transition announced"
            ),
            Err(error) => warn!(
                instance_id = announcement.instance_id,
                event_id = %announcement.event.id,
                to = %announcement.event.to,
                %error,
                "Failed to announce transition"
            ),
        }

        outcome
    }
}

/// Sending side of a running delivery task.
///
/// Enqueueing never waits on the bus. Announcements are delivered in the
/// order they were enqueued.
#[derive(Clone)]
pub struct AnnouncementQueue {
    sender: mpsc::UnboundedSender<Announcement>,
}

impl AnnouncementQueue {
    /// Hand `announcement` to the delivery task.
    ///
    /// Fails with [`DeliveryError::Closed`] once the task has exited.
    pub fn enqueue(&self, announcement: Announcement) -> Result<(), DeliveryError> {
        self.sender
            .send(announcement)
            .map_err(|_| DeliveryError::Closed)
    }
}

impl TransitionPublisher {
    /// Move this publisher onto its own task.
    ///
    /// The task delivers queued announcements one at a time and exits
    /// after every [`AnnouncementQueue`] clone is dropped and the backlog
    /// is drained. Must be called from within a tokio runtime.
    pub fn spawn(self) -> (AnnouncementQueue, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Announcement>();
        let delivery = async move {
            while let Some(announcement) = receiver.recv().await {
                // Failures are logged by `publish`.
                let _ = self.publish(announcement).await;
            }
            trace!("delivery task finished");
        };
        let handle = tokio::spawn(delivery.in_current_span());
        (AnnouncementQueue { sender }, handle)
    }
}

/// In-process bus backed by a tokio broadcast channel.
///
/// Announcements sent while nobody is subscribed are dropped.
#[derive(Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<Announcement>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Announcement> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventBus for BroadcastBus {
    async fn deliver(&self, announcement: &Announcement) -> Result<(), DeliveryError> {
        if self.sender.send(announcement.clone()).is_err() {
            trace!(
                instance_id = announcement.instance_id,
                "No subscribers for announcement"
            );
        }
        Ok(())
    }
}
