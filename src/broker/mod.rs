//! The in-memory pub/sub core: streams, consumer groups, and the
//! single mutex that serializes all structural mutation.

pub mod consumer;
pub mod error;
pub mod group;
pub mod message;
pub mod stream;

use std::collections::HashMap;

use parking_lot::Mutex;

pub use consumer::{ConsumerHandle, Sink};
pub use error::BrokerError;
pub use message::Message;

use group::GroupState;
use message::MonotonicClock;
use stream::StreamState;

#[derive(Default)]
struct BrokerInner {
    streams: HashMap<String, StreamState>,
    groups: HashMap<String, GroupState>,
}

/// Process-wide singleton owning every stream and consumer group. A
/// single lock (`inner`) serializes all registry and membership
/// mutation; per-consumer outbound queues are independent bounded
/// channels that never touch this lock from the worker side.
pub struct Broker {
    inner: Mutex<BrokerInner>,
    clock: MonotonicClock,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

/// A single member id within a `get_consumer_group_info` snapshot.
pub struct ConsumerInfo {
    pub id: u64,
}

/// A dispatched-but-unacknowledged message, as returned by
/// `list_pending`.
pub struct PendingEntry {
    pub id: String,
    pub timestamp: u64,
}

impl Broker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BrokerInner::default()),
            clock: MonotonicClock::new(),
        }
    }

    pub fn create_stream(&self, name: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.streams.contains_key(name) {
            return false;
        }
        inner.streams.insert(name.to_string(), StreamState::new());
        true
    }

    /// Removes the stream from the registry. Consumers already
    /// subscribed keep their worker running until they stop via
    /// transport close; they simply stop receiving new dispatches for
    /// it.
    pub fn delete_stream(&self, name: &str) {
        self.inner.lock().streams.remove(name);
    }

    pub fn has_stream(&self, name: &str) -> bool {
        self.inner.lock().streams.contains_key(name)
    }

    pub fn list_streams(&self) -> Vec<String> {
        self.inner.lock().streams.keys().cloned().collect()
    }

    pub fn create_group(&self, name: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.groups.contains_key(name) {
            return false;
        }
        inner.groups.insert(name.to_string(), GroupState::new());
        true
    }

    /// Removes the group from the registry under the lock, detaching
    /// it from every stream it was subscribed to, then stops every
    /// member outside the lock.
    pub fn delete_group(&self, name: &str) {
        let removed = {
            let mut inner = self.inner.lock();
            let removed = inner.groups.remove(name);
            if let Some(group) = &removed {
                for stream in group.subscriptions.keys() {
                    if let Some(stream_state) = inner.streams.get_mut(stream) {
                        stream_state.detach_group(name);
                    }
                }
            }
            removed
        };
        if let Some(group) = removed {
            group.shutdown();
        }
    }

    pub fn get_consumer_group_info(&self, name: &str) -> Result<Vec<ConsumerInfo>, BrokerError> {
        let inner = self.inner.lock();
        let group = inner
            .groups
            .get(name)
            .ok_or_else(|| BrokerError::NoSuchGroup(name.to_string()))?;
        Ok(group
            .consumers
            .keys()
            .map(|&id| ConsumerInfo { id })
            .collect())
    }

    /// Registers a consumer in `group_name` (creating the group if
    /// absent) and subscribes it to every named stream. Every stream
    /// must already exist; if any does not, no state is mutated.
    pub fn register_consumer(
        &self,
        group_name: &str,
        sink: Sink,
        streams: &[String],
    ) -> Result<ConsumerHandle, BrokerError> {
        let mut inner = self.inner.lock();
        for stream in streams {
            if !inner.streams.contains_key(stream) {
                return Err(BrokerError::NoSuchStream(stream.clone()));
            }
        }

        let group = inner
            .groups
            .entry(group_name.to_string())
            .or_insert_with(GroupState::new);
        let handle = group.add_consumer(group_name, sink, streams);

        for stream in streams {
            inner
                .streams
                .get_mut(stream)
                .expect("existence checked above")
                .attach_group(group_name);
        }

        Ok(handle)
    }

    /// Detaches a consumer from its group and every subscription view.
    /// Panics if the group no longer exists (a programming error); a
    /// no-op if the consumer id is already absent from an extant
    /// group.
    pub fn unregister_consumer(&self, group_name: &str, id: u64) {
        let mut inner = self.inner.lock();
        let group = inner
            .groups
            .get_mut(group_name)
            .unwrap_or_else(|| panic!("unregister against missing group `{group_name}`"));
        group.remove_consumer(id);
    }

    /// Allocates a Message with a fresh, strictly monotonic
    /// timestamp. Does not require the lock; the clock is independent
    /// of registry state.
    pub fn new_message(&self, stream: &str, data: serde_json::Value) -> Message {
        Message::new(&self.clock, stream, data)
    }

    /// Appends `msg` to its stream and dispatches it to every
    /// attached group, if the stream exists; otherwise silently drops
    /// it.
    pub fn notify_message(&self, msg: Message) {
        let mut inner = self.inner.lock();
        let Some(stream_state) = inner.streams.get_mut(&msg.stream) else {
            return;
        };
        stream_state.messages.push(msg.clone());
        let group_names: Vec<String> = stream_state.groups.iter().cloned().collect();
        for name in group_names {
            if let Some(group) = inner.groups.get_mut(&name) {
                group.notify(&msg);
            }
        }
    }

    pub fn list_pending(
        &self,
        stream: &str,
        group_name: &str,
    ) -> Result<Vec<PendingEntry>, BrokerError> {
        let inner = self.inner.lock();
        if !inner.streams.contains_key(stream) {
            return Err(BrokerError::NoSuchStream(stream.to_string()));
        }
        let group = inner
            .groups
            .get(group_name)
            .ok_or_else(|| BrokerError::NoSuchGroup(group_name.to_string()))?;
        let Some(view) = group.subscriptions.get(stream) else {
            return Ok(Vec::new());
        };
        Ok(view
            .pending
            .iter()
            .map(|(id, &timestamp)| PendingEntry {
                id: id.clone(),
                timestamp,
            })
            .collect())
    }

    /// Removes the given ids from each stream's pending set for
    /// `group_name`. Unknown ids are silently ignored.
    pub fn ack_messages(
        &self,
        group_name: &str,
        acks: &HashMap<String, Vec<String>>,
    ) -> Result<(), BrokerError> {
        let mut inner = self.inner.lock();
        for stream in acks.keys() {
            if !inner.streams.contains_key(stream) {
                return Err(BrokerError::NoSuchStream(stream.clone()));
            }
        }
        let group = inner
            .groups
            .get_mut(group_name)
            .ok_or_else(|| BrokerError::NoSuchGroup(group_name.to_string()))?;
        for (stream, ids) in acks {
            if let Some(view) = group.subscriptions.get_mut(stream) {
                for id in ids {
                    view.pending.remove(id);
                }
            }
        }
        Ok(())
    }

    /// Stops every consumer in every group. Used during process
    /// shutdown so in-flight subscriptions close promptly.
    pub fn shutdown_all(&self) {
        let inner = self.inner.lock();
        for group in inner.groups.values() {
            group.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_stream_is_idempotent_false_on_conflict() {
        let broker = Broker::new();
        assert!(broker.create_stream("s"));
        assert!(!broker.create_stream("s"));
    }

    #[test]
    fn list_streams_reflects_creates_and_deletes() {
        let broker = Broker::new();
        for i in 0..100 {
            assert!(broker.create_stream(&format!("stream:{i}")));
        }
        assert_eq!(broker.list_streams().len(), 100);
        for i in 0..100 {
            broker.delete_stream(&format!("stream:{i}"));
        }
        assert!(broker.list_streams().is_empty());
    }

    #[test]
    fn publish_to_missing_stream_is_silently_dropped() {
        let broker = Broker::new();
        let msg = broker.new_message("missing", serde_json::json!("hi"));
        broker.notify_message(msg);
    }

    #[tokio::test]
    async fn register_consumer_rejects_missing_stream() {
        let broker = Broker::new();
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        let err = broker
            .register_consumer("g", tx, &["nope".to_string()])
            .unwrap_err();
        assert!(matches!(err, BrokerError::NoSuchStream(_)));
        assert!(!broker
            .get_consumer_group_info("g")
            .map(|_| true)
            .unwrap_or(false));
    }

    #[tokio::test]
    async fn broadcast_delivers_every_message_to_every_anonymous_consumer() {
        let broker = Broker::new();
        broker.create_stream("test");

        let mut receivers = Vec::new();
        for i in 0..3 {
            let (tx, rx) = tokio::sync::mpsc::channel(1024);
            broker
                .register_consumer(&format!("anon-{i}"), tx, &["test".to_string()])
                .unwrap();
            receivers.push(rx);
        }

        for _ in 0..100 {
            let msg = broker.new_message("test", serde_json::json!("ciao"));
            broker.notify_message(msg);
        }

        for mut rx in receivers {
            let mut count = 0;
            while let Ok(Some(_)) =
                tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await
            {
                count += 1;
            }
            assert_eq!(count, 100);
        }
    }

    #[tokio::test]
    async fn group_load_balances_round_robin() {
        let broker = Broker::new();
        broker.create_stream("test-stream");

        let mut receivers = Vec::new();
        for _ in 0..10 {
            let (tx, rx) = tokio::sync::mpsc::channel(1024);
            broker
                .register_consumer("test-group", tx, &["test-stream".to_string()])
                .unwrap();
            receivers.push(rx);
        }

        for _ in 0..100 {
            let msg = broker.new_message("test-stream", serde_json::json!("x"));
            broker.notify_message(msg);
        }

        let mut total = 0;
        for mut rx in receivers {
            let mut count = 0;
            while let Ok(Some(_)) =
                tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await
            {
                count += 1;
            }
            assert_eq!(count, 10);
            total += count;
        }
        assert_eq!(total, 100);
    }

    #[tokio::test]
    async fn ack_removes_pending_entries() {
        let broker = Broker::new();
        broker.create_stream("s");
        let (tx, _rx) = tokio::sync::mpsc::channel(1024);
        broker
            .register_consumer("g", tx, &["s".to_string()])
            .unwrap();

        let msg = broker.new_message("s", serde_json::json!(1));
        let id = msg.id.clone();
        broker.notify_message(msg);

        let pending = broker.list_pending("s", "g").unwrap();
        assert_eq!(pending.len(), 1);

        let mut acks = HashMap::new();
        acks.insert("s".to_string(), vec![id]);
        broker.ack_messages("g", &acks).unwrap();

        let pending = broker.list_pending("s", "g").unwrap();
        assert!(pending.is_empty());

        broker.ack_messages("g", &acks).unwrap();
    }

    #[tokio::test]
    async fn unregister_shrinks_group_snapshot() {
        let broker = Broker::new();
        broker.create_stream("s");
        let (tx, _rx) = tokio::sync::mpsc::channel(1024);
        let handle = broker
            .register_consumer("g", tx, &["s".to_string()])
            .unwrap();

        assert_eq!(broker.get_consumer_group_info("g").unwrap().len(), 1);
        broker.unregister_consumer(&handle.group, handle.id);
        assert_eq!(broker.get_consumer_group_info("g").unwrap().len(), 0);
    }
}
