//! The live dispatch event feed.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::broadcast;

use lifelink_domain::DispatchEvent;

/// Fan-out of [`DispatchEvent`]s to live subscribers, plus a bounded
/// recent-events buffer for poll-based consumers.
///
/// Publication is best-effort: a lagging subscriber drops its own
/// backlog and an absent one is ignored, so the feed never blocks or
/// fails a dispatch decision.
#[derive(Debug)]
pub struct DispatchFeed {
    tx: broadcast::Sender<DispatchEvent>,
    recent: Mutex<VecDeque<DispatchEvent>>,
    recent_capacity: usize,
}

impl DispatchFeed {
    /// Create a feed keeping `recent_capacity` events for pollers and a
    /// broadcast channel of `channel_capacity` for push subscribers.
    pub fn new(recent_capacity: usize, channel_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            tx,
            recent: Mutex::new(VecDeque::new()),
            recent_capacity,
        }
    }

    /// Publish an event to all subscribers and the recent buffer.
    pub fn publish(&self, event: DispatchEvent) {
        {
            let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
            recent.push_back(event.clone());
            while recent.len() > self.recent_capacity {
                recent.pop_front();
            }
        }
        // No receivers is not an error.
        let _ = self.tx.send(event);
    }

    /// Subscribe to live events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.tx.subscribe()
    }

    /// Up to `limit` recent events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<DispatchEvent> {
        let recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.iter().rev().take(limit).cloned().collect()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
