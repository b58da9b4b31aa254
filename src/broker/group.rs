use std::collections::HashMap;

use super::consumer::{Consumer, ConsumerHandle, Sink};
use super::message::Message;

/// Tracks one stream's subscribers within a single consumer group.
#[derive(Default)]
pub struct SubscriptionView {
    pub members: Vec<u64>,
    pub pending: HashMap<String, u64>,
    pub cursor: usize,
}

/// A named consumer group, owning its consumers and their per-stream
/// subscription views.
#[derive(Default)]
pub struct GroupState {
    next_consumer_id: u64,
    pub consumers: HashMap<u64, Consumer>,
    pub subscriptions: HashMap<String, SubscriptionView>,
}

impl GroupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a consumer id, spawns its worker, and subscribes it
    /// to every named stream.
    pub fn add_consumer(&mut self, name: &str, sink: Sink, streams: &[String]) -> ConsumerHandle {
        self.next_consumer_id += 1;
        let id = self.next_consumer_id;
        let consumer = Consumer::spawn(id, sink);
        let handle = consumer.handle(name);
        self.consumers.insert(id, consumer);
        for stream in streams {
            self.subscriptions
                .entry(stream.clone())
                .or_default()
                .members
                .push(id);
        }
        handle
    }

    /// Detaches a consumer from the group and every subscription view
    /// it belonged to. Stable removal, does not reorder remaining
    /// members. A no-op if `id` is not currently a member.
    pub fn remove_consumer(&mut self, id: u64) {
        if self.consumers.remove(&id).is_none() {
            return;
        }
        self.subscriptions.retain(|_, view| {
            view.members.retain(|&member| member != id);
            !view.members.is_empty()
        });
    }

    /// Round-robin dispatch: records `msg` as pending for its
    /// subscription view, then sends it to the next member in
    /// rotation. Silently does nothing if no view exists or it has no
    /// members.
    pub fn notify(&mut self, msg: &Message) {
        let Some(view) = self.subscriptions.get_mut(&msg.stream) else {
            return;
        };
        if view.members.is_empty() {
            return;
        }
        view.pending.insert(msg.id.clone(), msg.timestamp);
        let target = view.members[view.cursor % view.members.len()];
        view.cursor = view.cursor.wrapping_add(1);
        if let Some(consumer) = self.consumers.get(&target) {
            consumer.send(msg.clone());
        }
    }

    /// Signals stop on every member consumer.
    pub fn shutdown(&self) {
        for consumer in self.consumers.values() {
            consumer.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn sink() -> (Sink, mpsc::Receiver<Vec<u8>>) {
        mpsc::channel(16)
    }

    #[tokio::test]
    async fn round_robin_dispatches_across_members() {
        let mut group = GroupState::new();
        let (sink_a, _rx_a) = sink();
        let (sink_b, _rx_b) = sink();
        group.add_consumer("g", sink_a, &["s".to_string()]);
        group.add_consumer("g", sink_b, &["s".to_string()]);

        let view = group.subscriptions.get("s").unwrap();
        assert_eq!(view.members.len(), 2);
    }

    #[tokio::test]
    async fn remove_consumer_drops_empty_view() {
        let mut group = GroupState::new();
        let (tx, _rx) = sink();
        let handle = group.add_consumer("g", tx, &["s".to_string()]);

        assert!(group.subscriptions.contains_key("s"));
        group.remove_consumer(handle.id);
        assert!(!group.subscriptions.contains_key("s"));
    }

    #[tokio::test]
    async fn notify_without_members_is_noop() {
        let mut group = GroupState::new();
        let msg = Message {
            id: "m1".to_string(),
            timestamp: 1,
            stream: "s".to_string(),
            data: serde_json::json!("hi"),
        };
        group.notify(&msg);
        assert!(group.subscriptions.is_empty());
    }
}
