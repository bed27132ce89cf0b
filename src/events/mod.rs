use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// Decisions buffered for the background worker. When the buffer is full the
// newest event is dropped; the audit trail is best-effort by contract.
const EMIT_BUFFER: usize = 1024;

/// One decision, as enqueued for the analytics consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionAuditEvent {
    pub user_id: String,
    pub flag_name: String,
    pub result: bool,
    pub timestamp: DateTime<Utc>,
}

/// One-way, best-effort destination for serialized audit events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, payload: String) -> Result<(), String>;
}

/// Pushes events onto a Redis list drained by the analytics service.
pub struct RedisQueueSink {
    connection: ConnectionManager,
    queue_key: String,
}

impl RedisQueueSink {
    pub fn new(connection: ConnectionManager, queue_key: String) -> Self {
        Self {
            connection,
            queue_key,
        }
    }
}

#[async_trait]
impl EventSink for RedisQueueSink {
    async fn send(&self, payload: String) -> Result<(), String> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .lpush(&self.queue_key, payload)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Hands decision-audit events to a detached worker task. `emit` never
/// blocks and never fails the caller; the request path does not wait for
/// delivery, and in-flight events may be lost on shutdown.
#[derive(Clone)]
pub struct AuditEmitter {
    tx: mpsc::Sender<DecisionAuditEvent>,
}

impl AuditEmitter {
    /// Spawn the worker and return the handle the request path emits through.
    /// With no sink configured, events degrade to a local log line.
    pub fn spawn(sink: Option<Arc<dyn EventSink>>) -> Self {
        let (tx, rx) = mpsc::channel(EMIT_BUFFER);
        tokio::spawn(run_worker(rx, sink));
        Self { tx }
    }

    pub fn emit(&self, user_id: &str, flag_name: &str, result: bool) {
        let event = DecisionAuditEvent {
            user_id: user_id.to_string(),
            flag_name: flag_name.to_string(),
            result,
            timestamp: Utc::now(),
        };

        // Non-blocking: a full buffer drops the event rather than slowing
        // the response down
        if let Err(e) = self.tx.try_send(event) {
            warn!(error = %e, "audit buffer full, dropping decision event");
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<DecisionAuditEvent>,
    sink: Option<Arc<dyn EventSink>>,
) {
    while let Some(event) = rx.recv().await {
        let sink = match &sink {
            Some(sink) => sink,
            None => {
                info!(
                    user_id = %event.user_id,
                    flag_name = %event.flag_name,
                    result = event.result,
                    "audit sink disabled, event logged only"
                );
                continue;
            }
        };

        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to serialize audit event");
                continue;
            }
        };

        // Single best-effort send, failures swallowed
        match sink.send(payload).await {
            Ok(()) => debug!(flag_name = %event.flag_name, "audit event enqueued"),
            Err(e) => warn!(error = %e, "failed to enqueue audit event"),
        }
    }
}
