//! Typed trap-changed events.
//!
//! A mutation anywhere (create, re-visit update) is announced on this
//! channel so the map layer can re-fetch the affected field's traps. The
//! channel is owned by the application root and handed to whoever needs
//! it; there is no process-global bus. An event without a field id means
//! "refresh every field's traps" (conservative fallback).

use tokio::sync::broadcast;

/// What happened to a trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapAction {
    /// A new trap was created.
    Created,
    /// An existing trap was updated (re-visit workflow).
    Updated,
}

/// A trap-changed announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapEvent {
    /// What happened.
    pub action: TrapAction,
    /// Affected field, when identifiable.
    pub field_id: Option<i64>,
    /// Affected trap, when identifiable.
    pub trap_id: Option<i64>,
}

/// Broadcast channel for [`TrapEvent`]s.
#[derive(Debug, Clone)]
pub struct TrapEvents {
    sender: broadcast::Sender<TrapEvent>,
}

impl Default for TrapEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl TrapEvents {
    /// Creates the channel. Capacity is small; consumers that lag past it
    /// fall back to a full refresh on the next event they do see.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Subscribes a new consumer.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TrapEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn publish(&self, event: TrapEvent) {
        if self.sender.send(event).is_err() {
            log::debug!("Trap event with no subscribers: {event:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_published_events() {
        let events = TrapEvents::new();
        let mut rx = events.subscribe();

        let event = TrapEvent {
            action: TrapAction::Created,
            field_id: Some(7),
            trap_id: Some(3),
        };
        events.publish(event);

        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let events = TrapEvents::new();
        events.publish(TrapEvent {
            action: TrapAction::Updated,
            field_id: None,
            trap_id: None,
        });
    }
}
