#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in vsaudit
//!
//! The engine never logs or prints directly: every observable moment of
//! an audit pass (objects skipped, datastores scanned, fallback engaged)
//! is emitted as a structured event over an unbounded tokio channel and
//! rendered by the consumer. Send errors are ignored - a dropped
//! receiver must never abort an audit pass.

pub mod events;

pub use events::{AppEvent, AuditEvent, FallbackEvent, InventoryEvent, ScanEvent, SnapshotEvent};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout the vsaudit system
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // If the receiver is gone we just continue
            let _ = sender.send(event);
        }
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
