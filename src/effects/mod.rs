//! Side-effecting shell around the alarm line machine.
//!
//! # Key Concepts
//!
//! - **Delay timer**: one outstanding countdown, tagged with a generation
//!   so a late expiry can be recognised and dropped
//! - **Publisher**: bounded, best-effort delivery of committed transitions
//!   to the host's bus, on a task of its own
//!
//! Both sit behind small traits ([`DelayTimer`], [`EventBus`]) so the
//! machine can be driven deterministically in tests.

mod publisher;
mod timer;

pub use publisher::{
    Announcement, AnnouncementQueue, BroadcastBus, DeliveryError, EventBus, TransitionPublisher,
};
pub use timer::{DelayTimer, ExpiryCallback, ManualTimer, TokioTimer};
