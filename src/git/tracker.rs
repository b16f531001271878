//! Command lifecycle tracking.
//!
//! Every adapter call runs through `CommandTracker::track`, which emits a
//! `Started` event before dispatch and a `Finished` event after completion,
//! success or failure. Events go out on a broadcast channel so any number
//! of observers can follow along; the tracker itself keeps no state beyond
//! the id counter.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::broadcast;

use crate::models::CommandEvent;

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct CommandTracker {
    next_id: AtomicU64,
    events: broadcast::Sender<CommandEvent>,
}

impl CommandTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            next_id: AtomicU64::new(1),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommandEvent> {
        self.events.subscribe()
    }

    /// Wraps one adapter call with its lifecycle events. The `Finished`
    /// event fires whether the call succeeds or fails; send errors (nobody
    /// listening) are ignored.
    pub async fn track<T, F>(&self, description: &str, call: F) -> T
    where
        F: Future<Output = T>,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let _ = self.events.send(CommandEvent::Started {
            id,
            description: description.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        });
        let result = call.await;
        let _ = self.events.send(CommandEvent::Finished { id });
        result
    }
}

impl Default for CommandTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn track_emits_started_then_finished() {
        let tracker = CommandTracker::new();
        let mut events = tracker.subscribe();

        let result = tracker.track("git status", async { 42 }).await;
        assert_eq!(result, 42);

        let started = events.recv().await.unwrap();
        let finished = events.recv().await.unwrap();
        match started {
            CommandEvent::Started { id, ref description, .. } => {
                assert_eq!(description, "git status");
                assert_eq!(finished, CommandEvent::Finished { id });
            }
            other => panic!("expected Started, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failing_calls_still_finish() {
        let tracker = CommandTracker::new();
        let mut events = tracker.subscribe();

        let result: Result<(), String> =
            tracker.track("git fetch", async { Err("network down".to_string()) }).await;
        assert!(result.is_err());

        let started = events.recv().await.unwrap();
        let finished = events.recv().await.unwrap();
        assert_eq!(finished, CommandEvent::Finished { id: started.id() });
    }

    #[tokio::test]
    async fn concurrent_commands_get_distinct_ids() {
        let tracker = CommandTracker::new();
        let mut events = tracker.subscribe();

        let (_, _) = tokio::join!(
            tracker.track("git branch", async {}),
            tracker.track("git stash list", async {}),
        );

        let mut ids = std::collections::HashSet::new();
        for _ in 0..4 {
            if let CommandEvent::Started { id, .. } = events.recv().await.unwrap() {
                ids.insert(id);
            }
        }
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let tracker = CommandTracker::new();
        let mut first = tracker.subscribe();
        let mut second = tracker.subscribe();

        tracker.track("git status", async {}).await;

        assert!(matches!(first.recv().await.unwrap(), CommandEvent::Started { .. }));
        assert!(matches!(second.recv().await.unwrap(), CommandEvent::Started { .. }));
    }
}
