use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::message::Message;
use crate::core::constants::CONSUMER_QUEUE_CAPACITY;

/// Write-only byte channel the transport drives; not owned by the
/// consumer, closed by the caller when the client disconnects.
pub type Sink = mpsc::Sender<Vec<u8>>;

/// A lightweight, cloneable reference a caller can hold outside the
/// broker's lock to wait for a consumer's worker to exit.
#[derive(Clone)]
pub struct ConsumerHandle {
    pub id: u64,
    pub group: String,
    done_rx: watch::Receiver<bool>,
}

impl ConsumerHandle {
    /// Resolves once the worker has exited (stop signal, sink
    /// closure, or a write/encode failure).
    pub async fn join(&self) {
        let mut rx = self.done_rx.clone();
        let _ = rx.wait_for(|&done| done).await;
    }
}

/// One subscriber within a consumer group. Owns a bounded outbound
/// queue drained by a single worker task spawned at construction time.
pub struct Consumer {
    id: u64,
    outbound_tx: mpsc::Sender<Message>,
    stop_tx: Arc<watch::Sender<bool>>,
    done_rx: watch::Receiver<bool>,
}

impl Consumer {
    /// Allocates the consumer and spawns its worker, which loops until
    /// stopped or the sink closes, dequeuing messages, JSON-encoding
    /// them with a trailing newline, and writing them to `sink`.
    pub fn spawn(id: u64, sink: Sink) -> Self {
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(CONSUMER_QUEUE_CAPACITY);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(false);
        let stop_tx = Arc::new(stop_tx);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = sink.closed() => break,
                    maybe_msg = outbound_rx.recv() => {
                        let Some(msg) = maybe_msg else { break };
                        let mut line = match serde_json::to_vec(&msg) {
                            Ok(bytes) => bytes,
                            Err(error) => {
                                tracing::warn!(consumer_id = id, %error, "failed to encode message");
                                break;
                            }
                        };
                        line.push(b'\n');
                        if sink.send(line).await.is_err() {
                            break;
                        }
                    }
                }
            }
            let _ = done_tx.send(true);
        });

        Self {
            id,
            outbound_tx,
            stop_tx,
            done_rx,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Enqueues a message without blocking the broker-wide mutex. A
    /// full queue drops the message for this consumer (drop-newest)
    /// rather than stalling on a slow transport.
    pub fn send(&self, msg: Message) {
        if self.outbound_tx.try_send(msg).is_err() {
            tracing::debug!(consumer_id = self.id, "outbound queue full, dropping message");
        }
    }

    /// Idempotently signals the worker to stop.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn handle(&self, group: impl Into<String>) -> ConsumerHandle {
        ConsumerHandle {
            id: self.id,
            group: group.into(),
            done_rx: self.done_rx.clone(),
        }
    }
}
